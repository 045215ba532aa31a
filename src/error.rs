use thiserror::Error;

/// Fatal failures raised while bringing the overlay up.
///
/// Everything that can go wrong after initialization is handled inside the
/// renderer or the listener and never surfaces as an `OverlayError`.
#[derive(Error, Debug)]
pub enum OverlayError {
    #[error("failed to register overlay window class")]
    ClassRegistration,

    #[error("failed to create overlay window: {0}")]
    WindowCreation(String),

    #[error("failed to create device resources: {0}")]
    DeviceResources(String),

    #[cfg(windows)]
    #[error("Windows API error: {0}")]
    Platform(#[from] windows::core::Error),

    #[cfg(not(windows))]
    #[error("the overlay is only available on Windows")]
    Unsupported,
}

pub type OverlayResult<T> = Result<T, OverlayError>;
