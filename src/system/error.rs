//! Error taxonomy surfaced at the session boundary.

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::engine::{Availability, EngineError};

/// What the screen hosting the session must do about a failure.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum RequiredAction {
    /// Send the user to the store to install the tracking service.
    RedirectToStore,
    /// Ask the user to update the service or the app.
    UpdateApp,
    /// Inform the user; a later resume may succeed.
    None,
    /// Inform the user and close the screen.
    CloseScreen,
}

/// Closed set of session failures reported to the caller.
///
/// Every engine failure is converted into one of these before it leaves
/// the lifecycle, so the render loop never sees engine errors directly.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum SessionError {
    #[error("Please install the AR service")]
    ServiceNotInstalled,

    #[error("Please update the AR service")]
    ServiceApkTooOld,

    #[error("Please update this app")]
    ClientSdkTooOld,

    #[error("This device does not support this AR mode: {0}")]
    UnsupportedConfiguration(String),

    #[error("Camera not available. Try restarting the app.")]
    CameraUnavailable,

    #[error("Failed to create AR session: {0}")]
    Fatal(String),
}

impl SessionError {
    pub fn required_action(&self) -> RequiredAction {
        match self {
            Self::ServiceNotInstalled => RequiredAction::RedirectToStore,
            Self::ServiceApkTooOld | Self::ClientSdkTooOld => RequiredAction::UpdateApp,
            Self::UnsupportedConfiguration(_) | Self::CameraUnavailable => RequiredAction::None,
            Self::Fatal(_) => RequiredAction::CloseScreen,
        }
    }

    /// Message suitable for a toast or snackbar.
    pub fn user_message(&self) -> String {
        self.to_string()
    }

    /// Classify an unavailable engine. `None` when the engine is usable.
    pub fn from_availability(availability: Availability) -> Option<Self> {
        match availability {
            Availability::Supported => None,
            Availability::NotInstalled => Some(Self::ServiceNotInstalled),
            Availability::ApkTooOld => Some(Self::ServiceApkTooOld),
            Availability::SdkTooOld => Some(Self::ClientSdkTooOld),
            Availability::UnsupportedDevice => {
                Some(Self::UnsupportedConfiguration("device not supported".to_string()))
            }
        }
    }
}

impl From<EngineError> for SessionError {
    fn from(err: EngineError) -> Self {
        match err {
            EngineError::NotInstalled => Self::ServiceNotInstalled,
            EngineError::ApkTooOld => Self::ServiceApkTooOld,
            EngineError::SdkTooOld => Self::ClientSdkTooOld,
            EngineError::UnsupportedConfiguration(what) => Self::UnsupportedConfiguration(what),
            EngineError::CameraNotAvailable => Self::CameraUnavailable,
            other @ (EngineError::SessionPaused
            | EngineError::DeadlineExceeded
            | EngineError::ResourceExhausted
            | EngineError::Other(_)) => Self::Fatal(other.to_string()),
        }
    }
}

/// Per-tick failure on the render path. Logged and swallowed by the frame
/// driver; never changes the session state.
#[derive(Debug, Error)]
pub enum FrameError {
    #[error("engine update failed: {0}")]
    Engine(#[from] EngineError),

    #[error("malformed frame: {0}")]
    Malformed(String),
}
