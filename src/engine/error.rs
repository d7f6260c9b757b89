//! Failures the tracking engine can raise from its API calls.

use thiserror::Error;

/// Engine-defined exception set.
///
/// These never leave the session boundary as-is; the lifecycle converts
/// them into [`crate::system::SessionError`].
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum EngineError {
    #[error("tracking service is not installed")]
    NotInstalled,

    #[error("tracking service APK is too old")]
    ApkTooOld,

    #[error("client SDK is too old for the installed service")]
    SdkTooOld,

    #[error("configuration not supported on this device: {0}")]
    UnsupportedConfiguration(String),

    #[error("camera is not available")]
    CameraNotAvailable,

    #[error("session is paused")]
    SessionPaused,

    #[error("frame deadline exceeded")]
    DeadlineExceeded,

    #[error("anchor limit reached")]
    ResourceExhausted,

    #[error("engine failure: {0}")]
    Other(String),
}
