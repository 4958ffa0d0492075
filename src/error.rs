//! Error types.
//!
//! Two families live here. [`TransformError`] is structural: it only fires
//! when a traversal pops more than it pushed, which is a bug in the caller.
//! [`FanError`] covers the fallible startup path (window, surface, adapter,
//! device) and the event loop itself.

use thiserror::Error;

/// A structural fault in transform stack usage.
#[derive(Error, Debug, Clone, Copy, PartialEq, Eq)]
pub enum TransformError {
    /// `pop` was called with no saved transform on the stack.
    #[error("transform stack underflow: pop without matching push")]
    Underflow,
}

/// Errors raised while bringing up or running the windowed application.
#[derive(Error, Debug)]
pub enum FanError {
    #[error("failed to create event loop: {0}")]
    EventLoop(#[from] winit::error::EventLoopError),

    #[error("failed to create window: {0}")]
    Window(#[from] winit::error::OsError),

    #[error("failed to create surface: {0}")]
    Surface(#[from] wgpu::CreateSurfaceError),

    #[error("no suitable GPU adapter: {0}")]
    Adapter(#[from] wgpu::RequestAdapterError),

    #[error("failed to create device: {0}")]
    Device(#[from] wgpu::RequestDeviceError),

    #[error("surface reports no supported formats")]
    NoSurfaceFormat,
}
