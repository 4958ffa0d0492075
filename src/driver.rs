//! Per-frame driver: drains input, advances animation, runs the composer.
//!
//! ```
//! use fanrig::{DrawQueue, FanConfig, FanDriver};
//!
//! let mut driver = FanDriver::new(FanConfig::default());
//! let mut queue = DrawQueue::new(true);
//!
//! let stats = driver.tick(0.0, &mut queue);
//! assert_eq!(stats.dt, 0.0);
//! assert_eq!(stats.draws, queue.draws.len());
//! ```

use crate::animation::{CommandQueue, FanCommand, FanState, Pose, YawOscillator};
use crate::compose::FanComposer;
use crate::config::FanConfig;
use crate::dispatch::{DrawDispatch, DrawTarget};
use crate::material::Lighting;
use crate::rig::FanLayout;

/// Clamps a raw frame delta into `[0, max]`.
pub fn clamp_delta(dt: f64, max: f64) -> f64 {
    if dt.is_nan() { 0.0 } else { dt.clamp(0.0, max) }
}

/// Turns absolute timestamps into clamped frame deltas.
///
/// The first tick yields zero. Later ticks yield `min(now - last, max)`, so
/// a stall (window hidden, debugger break) resumes with one short step
/// instead of a jump.
#[derive(Clone, Debug)]
pub struct FrameClock {
    last: Option<f64>,
    max_dt: f64,
}

impl FrameClock {
    pub fn new(max_dt: f64) -> Self {
        Self { last: None, max_dt }
    }

    pub fn tick(&mut self, now: f64) -> f64 {
        let dt = match self.last {
            Some(last) => clamp_delta(now - last, self.max_dt),
            None => 0.0,
        };
        self.last = Some(now);
        dt
    }
}

/// What a frame did.
#[derive(Clone, Copy, Debug, PartialEq)]
pub struct FrameStats {
    /// Zero-based frame number.
    pub frame: u64,
    pub time: f64,
    pub dt: f64,
    pub pose: Pose,
    pub draws: usize,
    pub translucent_draws: usize,
}

/// Owns the animation state and runs one traversal per frame.
pub struct FanDriver {
    state: FanState,
    commands: CommandQueue,
    oscillator: YawOscillator,
    composer: FanComposer,
    clock: FrameClock,
    max_frame_dt: f64,
    frame: u64,
}

impl FanDriver {
    pub fn new(config: FanConfig) -> Self {
        Self {
            state: FanState::new(config.blade_rpm),
            commands: CommandQueue::new(),
            oscillator: config.oscillator(),
            composer: FanComposer::new(FanLayout::new(&config.rig)),
            clock: FrameClock::new(config.max_frame_dt),
            max_frame_dt: config.max_frame_dt,
            frame: 0,
        }
    }

    pub fn state(&self) -> &FanState {
        &self.state
    }

    /// Mutable access for callers that bypass the command queue, e.g. tests
    /// setting up a scenario.
    pub fn state_mut(&mut self) -> &mut FanState {
        &mut self.state
    }

    pub fn composer(&self) -> &FanComposer {
        &self.composer
    }

    /// Enqueues a command for the next frame.
    pub fn send(&mut self, command: FanCommand) {
        self.commands.push(command);
    }

    pub fn pending_commands(&self) -> usize {
        self.commands.len()
    }

    /// Renders a frame at absolute time `now`, deriving the delta from the
    /// previous tick.
    pub fn tick(&mut self, now: f64, target: &mut dyn DrawTarget) -> FrameStats {
        let dt = self.clock.tick(now);
        self.render_frame(now, dt, target)
    }

    /// Renders a frame at absolute `time` after `dt` seconds.
    pub fn render_frame(&mut self, time: f64, dt: f64, target: &mut dyn DrawTarget) -> FrameStats {
        let dt = clamp_delta(dt, self.max_frame_dt);

        self.commands.drain_into(&mut self.state);
        self.state.advance(dt);
        let pose = Pose::sample(&self.state, &self.oscillator, time);

        target.begin_frame(&Lighting::for_toggle(self.state.lighting_enabled));
        let mut dispatch = DrawDispatch::new(target);
        self.composer.compose(&pose, &mut dispatch);

        let stats = FrameStats {
            frame: self.frame,
            time,
            dt,
            pose,
            draws: dispatch.draws(),
            translucent_draws: dispatch.translucent_draws(),
        };
        log::trace!(
            "frame {} t={:.3} dt={:.4} yaw={:.3} draws={}",
            stats.frame,
            time,
            dt,
            pose.yaw,
            stats.draws
        );
        self.frame += 1;
        stats
    }
}

impl Default for FanDriver {
    fn default() -> Self {
        Self::new(FanConfig::default())
    }
}
