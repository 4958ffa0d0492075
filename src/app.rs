use std::sync::Arc;
use std::time::Instant;
use winit::application::ApplicationHandler;
use winit::event::WindowEvent;
use winit::event_loop::{ActiveEventLoop, ControlFlow, EventLoop};
use winit::window::{Window, WindowAttributes, WindowId};

use crate::camera::Camera;
use crate::config::{AppConfig, TextureSource};
use crate::dispatch::DrawQueue;
use crate::driver::FanDriver;
use crate::error::FanError;
use crate::fan_pass::FanPass;
use crate::gpu::GpuContext;
use crate::input::{InputAction, KeyBindings};
use crate::material::Color;
use crate::mesh::MeshLibrary;
use crate::texture::Texture;

/// Edge length of the procedural grille texture.
const GRILLE_TEXTURE_SIZE: u32 = 256;

/// Open a window and animate the fan until it is closed.
///
/// # Example
/// ```no_run
/// use fanrig::{AppConfig, run};
///
/// run(AppConfig::new().title("Desk Fan").size(1280, 720))?;
/// # Ok::<(), fanrig::FanError>(())
/// ```
pub fn run(config: AppConfig) -> Result<(), FanError> {
    let event_loop = EventLoop::new()?;
    event_loop.set_control_flow(ControlFlow::Poll);

    let mut app = FanApp {
        state: AppState::Pending { config },
        failure: None,
    };
    event_loop.run_app(&mut app)?;

    match app.failure {
        Some(err) => Err(err),
        None => Ok(()),
    }
}

struct FanApp {
    state: AppState,
    /// Startup error, reported once the event loop has exited.
    failure: Option<FanError>,
}

enum AppState {
    Pending { config: AppConfig },
    Running(Box<Running>),
    Failed,
}

struct Running {
    window: Arc<Window>,
    gpu: GpuContext,
    meshes: MeshLibrary,
    pass: FanPass,
    camera: Camera,
    driver: FanDriver,
    queue: DrawQueue,
    keys: KeyBindings,
    clear_color: Color,
    start_time: Instant,
}

impl Running {
    fn start(event_loop: &ActiveEventLoop, config: &AppConfig) -> Result<Self, FanError> {
        let window_attrs = WindowAttributes::default()
            .with_title(&config.title)
            .with_inner_size(winit::dpi::LogicalSize::new(config.width, config.height));

        let window = Arc::new(event_loop.create_window(window_attrs)?);
        let gpu = GpuContext::new(window.clone())?;

        let meshes = MeshLibrary::new(&gpu, &config.fan.rig);
        let texture = load_texture(&gpu, &config.texture);
        let pass = FanPass::new(&gpu, texture.as_ref());
        let queue = DrawQueue::new(pass.texture_ready());

        log::info!(
            "fan ready: {}x{}, {} rpm",
            gpu.width(),
            gpu.height(),
            config.fan.blade_rpm
        );

        Ok(Self {
            window,
            gpu,
            meshes,
            pass,
            camera: Camera::default(),
            driver: FanDriver::new(config.fan.clone()),
            queue,
            keys: KeyBindings::new(config.fan.pitch_step),
            clear_color: config.clear_color,
            start_time: Instant::now(),
        })
    }

    fn redraw(&mut self, event_loop: &ActiveEventLoop) {
        let now = self.start_time.elapsed().as_secs_f64();

        self.queue.clear();
        self.driver.tick(now, &mut self.queue);

        self.pass.ensure_depth_size(&self.gpu);
        self.pass.prepare(&self.gpu, &self.camera, &self.queue);

        let output = match self.gpu.surface.get_current_texture() {
            Ok(output) => output,
            Err(err @ (wgpu::SurfaceError::Lost | wgpu::SurfaceError::Outdated)) => {
                log::warn!("surface {err}, reconfiguring");
                self.gpu.reconfigure();
                return;
            }
            Err(wgpu::SurfaceError::OutOfMemory) => {
                log::error!("surface out of memory, exiting");
                event_loop.exit();
                return;
            }
            Err(err) => {
                log::warn!("skipping frame: {err}");
                return;
            }
        };
        let view = output
            .texture
            .create_view(&wgpu::TextureViewDescriptor::default());

        let mut encoder = self
            .gpu
            .device
            .create_command_encoder(&wgpu::CommandEncoderDescriptor {
                label: Some("Fan Encoder"),
            });

        {
            let mut render_pass = encoder.begin_render_pass(&wgpu::RenderPassDescriptor {
                label: Some("Fan Pass"),
                color_attachments: &[Some(wgpu::RenderPassColorAttachment {
                    view: &view,
                    resolve_target: None,
                    ops: wgpu::Operations {
                        load: wgpu::LoadOp::Clear(self.clear_color.to_wgpu()),
                        store: wgpu::StoreOp::Store,
                    },
                    depth_slice: None,
                })],
                depth_stencil_attachment: Some(wgpu::RenderPassDepthStencilAttachment {
                    view: self.pass.depth_view(),
                    depth_ops: Some(wgpu::Operations {
                        load: wgpu::LoadOp::Clear(1.0),
                        store: wgpu::StoreOp::Store,
                    }),
                    stencil_ops: None,
                }),
                timestamp_writes: None,
                occlusion_query_set: None,
            });

            self.pass.render(&mut render_pass, &self.queue, &self.meshes);
        }

        self.gpu.queue.submit(std::iter::once(encoder.finish()));
        output.present();
    }
}

fn load_texture(gpu: &GpuContext, source: &TextureSource) -> Option<Texture> {
    match source {
        TextureSource::Procedural => {
            log::info!("using procedural grille texture");
            Some(Texture::grille(gpu, GRILLE_TEXTURE_SIZE))
        }
        TextureSource::File(path) => match Texture::from_file(gpu, path) {
            Ok(texture) => {
                log::info!(
                    "loaded texture {} ({}x{})",
                    path.display(),
                    texture.width,
                    texture.height
                );
                Some(texture)
            }
            Err(err) => {
                log::warn!(
                    "could not load texture {}: {err}; textured parts render untextured",
                    path.display()
                );
                None
            }
        },
        TextureSource::Disabled => {
            log::info!("texturing disabled");
            None
        }
    }
}

impl ApplicationHandler for FanApp {
    fn resumed(&mut self, event_loop: &ActiveEventLoop) {
        let AppState::Pending { config } = &self.state else {
            return;
        };

        match Running::start(event_loop, config) {
            Ok(running) => {
                running.window.request_redraw();
                self.state = AppState::Running(Box::new(running));
            }
            Err(err) => {
                log::error!("startup failed: {err}");
                self.failure = Some(err);
                self.state = AppState::Failed;
                event_loop.exit();
            }
        }
    }

    fn window_event(&mut self, event_loop: &ActiveEventLoop, _id: WindowId, event: WindowEvent) {
        let AppState::Running(running) = &mut self.state else {
            return;
        };

        match event {
            WindowEvent::CloseRequested => {
                event_loop.exit();
            }
            WindowEvent::Resized(size) => {
                running.gpu.resize(size.width, size.height);
            }
            WindowEvent::KeyboardInput { event, .. } => match running.keys.action_for(&event) {
                Some(InputAction::Fan(command)) => running.driver.send(command),
                Some(InputAction::Exit) => event_loop.exit(),
                None => {}
            },
            WindowEvent::RedrawRequested => {
                running.redraw(event_loop);
                running.window.request_redraw();
            }
            _ => {}
        }
    }
}
