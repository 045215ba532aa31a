use thiserror::Error;
use tracing::{debug, info, trace, warn};

use crate::error::OverlayResult;

/// Client-area size in physical pixels.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq)]
pub struct SurfaceSize {
    pub width: u32,
    pub height: u32,
}

/// Why a frame could not be presented.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DrawError {
    /// The graphics device went away; every device-dependent resource has
    /// to be rebuilt before the next frame.
    #[error("graphics device lost")]
    DeviceLost,

    #[error("draw failed: {0}")]
    Failed(String),
}

/// Device-dependent resources: the drawing surface and the brushes bound to it.
///
/// Dropping a surface releases all of them at once.
pub trait Surface {
    /// Clear to transparent, fill the client area with the background and
    /// draw `text` centered on top.
    fn draw(&mut self, text: &str) -> Result<(), DrawError>;

    fn resize(&mut self, size: SurfaceSize) -> Result<(), DrawError>;
}

/// Device-independent side of the overlay: the window itself plus the
/// factories and text format that outlive any surface.
pub trait Backend {
    type Surface: Surface;

    fn client_size(&self) -> SurfaceSize;

    fn create_surface(&mut self, size: SurfaceSize) -> OverlayResult<Self::Surface>;

    fn set_window_visible(&mut self, visible: bool);
}

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Visibility {
    Visible,
    Hidden,
}

/// What the overlay currently shows.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct DisplayState {
    pub text: String,
    pub visibility: Visibility,
}

/// Visibility state machine driving a [`Backend`].
///
/// Must stay on the thread that created the window: every method may touch
/// window and graphics handles.
pub struct OverlayRenderer<B: Backend> {
    state: DisplayState,
    // Declared before `backend` so the surface is always released first.
    surface: Option<B::Surface>,
    backend: Option<B>,
}

impl<B: Backend> OverlayRenderer<B> {
    /// Wrap an initialized backend. The overlay starts out `Visible`, but
    /// nothing is drawn until the first [`show`](Self::show) or paint.
    pub fn new(backend: B, initial_text: impl Into<String>) -> Self {
        Self {
            state: DisplayState {
                text: initial_text.into(),
                visibility: Visibility::Visible,
            },
            surface: None,
            backend: Some(backend),
        }
    }

    #[cfg(test)]
    pub fn state(&self) -> &DisplayState {
        &self.state
    }

    #[cfg(test)]
    pub fn backend(&self) -> Option<&B> {
        self.backend.as_ref()
    }

    pub fn show(&mut self) {
        self.state.visibility = Visibility::Visible;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_window_visible(true);
        }
        self.render();
    }

    pub fn hide(&mut self) {
        self.state.visibility = Visibility::Hidden;
        if let Some(backend) = self.backend.as_mut() {
            backend.set_window_visible(false);
        }
    }

    pub fn toggle(&mut self) {
        match self.state.visibility {
            Visibility::Visible => self.hide(),
            Visibility::Hidden => self.show(),
        }
    }

    /// Replace the text. While hidden it is kept for the next `show`.
    pub fn update_text(&mut self, text: String) {
        self.state.text = text;
        if self.state.visibility == Visibility::Visible {
            self.render();
        }
    }

    /// Draw one frame, creating the surface first if needed.
    ///
    /// Never draws while hidden. Failures are absorbed: a surface that cannot
    /// be created is retried on the next call, and device loss drops the
    /// surface so it is rebuilt lazily.
    pub fn render(&mut self) {
        if self.state.visibility == Visibility::Hidden {
            return;
        }
        let Some(backend) = self.backend.as_mut() else {
            return;
        };

        if self.surface.is_none() {
            let size = backend.client_size();
            match backend.create_surface(size) {
                Ok(surface) => {
                    debug!(?size, "created drawing surface");
                    self.surface = Some(surface);
                }
                Err(e) => {
                    debug!(error = %e, "drawing surface unavailable, skipping frame");
                    return;
                }
            }
        }

        let Some(surface) = self.surface.as_mut() else {
            return;
        };
        trace!(len = self.state.text.len(), "rendering overlay");
        match surface.draw(&self.state.text) {
            Ok(()) => {}
            Err(DrawError::DeviceLost) => {
                info!("graphics device lost, discarding device resources");
                self.surface = None;
            }
            Err(e) => warn!(error = %e, "overlay frame failed"),
        }
    }

    /// Follow a change of the client area, then redraw.
    pub fn resize(&mut self) {
        let Some(backend) = self.backend.as_ref() else {
            return;
        };
        let size = backend.client_size();
        if let Some(surface) = self.surface.as_mut() {
            if let Err(e) = surface.resize(size) {
                debug!(error = %e, ?size, "surface resize failed, recreating");
                self.surface = None;
            }
        }
        self.render();
    }

    /// Release the surface, then the backend. Safe to call repeatedly.
    pub fn shutdown(&mut self) {
        if self.surface.take().is_some() {
            debug!("released device resources");
        }
        if self.backend.take().is_some() {
            info!("overlay shut down");
        }
    }
}

impl<B: Backend> Drop for OverlayRenderer<B> {
    fn drop(&mut self) {
        self.shutdown();
    }
}
