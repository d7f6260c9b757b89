//! Session state machine as seen by the hosting screen.

use super::error::SessionError;

/// State of the AR session. Mutated only by the lifecycle transitions.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SessionState {
    /// No session has been created yet.
    Uninitialized,
    /// Session created, capability configuration in progress.
    Configuring,
    /// Engine running; frames flow to the render loop.
    Resumed,
    /// Engine paused; the session object is kept for a fast resume.
    Paused,
    /// Session stopped and released. Terminal.
    Stopped,
    /// Last transition failed; no session is held.
    Failed(SessionError),
}

impl SessionState {
    pub fn is_resumed(&self) -> bool {
        matches!(self, Self::Resumed)
    }
}

impl Default for SessionState {
    fn default() -> Self {
        Self::Uninitialized
    }
}
