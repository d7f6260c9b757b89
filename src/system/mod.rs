//! Session orchestration: lifecycle state machine, render-thread frame
//! loop, and the UI-facing messaging between them.

mod ar_system;
pub mod error;
pub mod frame_driver;
pub mod lifecycle;
pub mod messages;
pub mod state;

pub use ar_system::{ArSystem, Renderer, Surface};
pub use error::{FrameError, RequiredAction, SessionError};
pub use frame_driver::{FrameDriver, FrameOutput, ImageOutline, ObjectDraw};
pub use lifecycle::{ActiveFrame, FrameAccess, SessionLifecycle};
pub use messages::{UiEvent, UiSender, ui_channel};
pub use state::SessionState;
