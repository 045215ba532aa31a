pub mod config;
pub mod renderer;
#[cfg(windows)]
pub mod direct2d;
#[cfg(windows)]
pub mod window;
#[cfg(test)]
pub mod testing;

pub use config::OverlayConfig;
pub use renderer::OverlayRenderer;

/// Window notifications the UI loop forwards to the renderer.
#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum WindowEvent {
    /// The client area needs repainting.
    Paint,
    /// Display resolution or configuration changed.
    DisplayChanged,
    /// The client area changed size.
    Resized,
    /// The window was destroyed from outside; the loop must end.
    Destroyed,
}
