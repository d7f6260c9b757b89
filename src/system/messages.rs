//! Events posted from the render thread to the UI thread.
//!
//! The render loop never touches UI state directly; it posts these over an
//! unbounded channel and the UI thread drains them at its own pace.

use crossbeam_channel::{Receiver, Sender, unbounded};
use tracing::trace;

use crate::engine::TrackingMode;
use crate::tracking::TrackableId;

/// Render-to-UI notification.
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    /// Nothing is tracked yet; show a "searching" hint for the mode.
    Searching(TrackingMode),
    /// Something is tracked; hide the hint.
    SearchingDone,
    /// A recognized image or object carries a new label.
    LabelRecognized(String),
    /// A trackable stopped; any UI keyed by it is stale.
    TrackableLost(TrackableId),
    /// A virtual object was placed. `count` is the pool size afterwards.
    ObjectPlaced { count: usize },
    SelectionChanged(usize),
}

impl UiEvent {
    /// Hint text for the searching status, per mode.
    pub fn searching_message(mode: TrackingMode) -> &'static str {
        match mode {
            TrackingMode::World => "Searching for surfaces...",
            TrackingMode::Body => "Searching for body...",
            TrackingMode::Hand => "Searching for hands...",
            TrackingMode::Face => "Searching for face...",
            TrackingMode::Image | TrackingMode::Cloud => "Point the camera at an image",
        }
    }
}

/// Sending half held by the render thread.
#[derive(Debug, Clone)]
pub struct UiSender {
    inner: Sender<UiEvent>,
}

impl UiSender {
    /// Post an event. A closed UI side is not an error for the render loop.
    pub fn post(&self, event: UiEvent) {
        if self.inner.send(event).is_err() {
            trace!("ui receiver gone, event dropped");
        }
    }
}

pub fn ui_channel() -> (UiSender, Receiver<UiEvent>) {
    let (inner, receiver) = unbounded();
    (UiSender { inner }, receiver)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_events_arrive_in_order() {
        let (sender, receiver) = ui_channel();
        sender.post(UiEvent::Searching(TrackingMode::World));
        sender.post(UiEvent::SearchingDone);

        let events: Vec<UiEvent> = receiver.try_iter().collect();
        assert_eq!(
            events,
            vec![UiEvent::Searching(TrackingMode::World), UiEvent::SearchingDone]
        );
    }

    #[test]
    fn test_post_after_receiver_dropped_is_silent() {
        let (sender, receiver) = ui_channel();
        drop(receiver);
        sender.post(UiEvent::ObjectPlaced { count: 1 });
    }
}
