//! Gesture handoff from the UI thread to the render loop.
//!
//! The UI thread must never block on the renderer, so `enqueue` is a
//! `try_send` into a small bounded channel: when the queue is full the new
//! gesture is dropped and counted. The render loop takes at most one
//! gesture per tick.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use crossbeam_channel::{Receiver, Sender, TryRecvError, TrySendError, bounded};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use crate::geometry::ScreenPoint;

/// Queue depth used by every screen.
pub const DEFAULT_GESTURE_CAPACITY: usize = 2;

/// A discrete touch gesture.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub enum GestureEvent {
    SingleTap(ScreenPoint),
    DoubleTap(ScreenPoint),
    /// Drag from `from` to `to`; `dx`/`dy` are the incremental distances.
    Scroll {
        from: ScreenPoint,
        to: ScreenPoint,
        dx: f32,
        dy: f32,
    },
}

impl GestureEvent {
    /// The screen point used for hit testing.
    pub fn point(&self) -> ScreenPoint {
        match self {
            Self::SingleTap(p) | Self::DoubleTap(p) => *p,
            Self::Scroll { to, .. } => *to,
        }
    }
}

/// Create a connected producer/consumer pair with the given capacity.
pub fn gesture_channel(capacity: usize) -> (GestureSender, GestureReceiver) {
    let (tx, rx) = bounded(capacity.max(1));
    let dropped = Arc::new(AtomicU64::new(0));
    (
        GestureSender {
            tx,
            dropped: Arc::clone(&dropped),
        },
        GestureReceiver { rx, dropped },
    )
}

/// UI-thread half.
#[derive(Debug, Clone)]
pub struct GestureSender {
    tx: Sender<GestureEvent>,
    dropped: Arc<AtomicU64>,
}

impl GestureSender {
    /// Offer a gesture without blocking. Returns whether it was queued.
    pub fn enqueue(&self, event: GestureEvent) -> bool {
        match self.tx.try_send(event) {
            Ok(()) => true,
            Err(TrySendError::Full(event)) => {
                let total = self.dropped.fetch_add(1, Ordering::Relaxed) + 1;
                warn!(?event, dropped_total = total, "gesture queue full, dropping gesture");
                false
            }
            Err(TrySendError::Disconnected(_)) => {
                debug!("render loop gone, gesture discarded");
                false
            }
        }
    }

    /// Gestures dropped so far because the queue was full.
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

/// Render-thread half.
#[derive(Debug)]
pub struct GestureReceiver {
    rx: Receiver<GestureEvent>,
    dropped: Arc<AtomicU64>,
}

impl GestureReceiver {
    /// Take the oldest queued gesture, if any. Never blocks.
    pub fn dequeue(&self) -> Option<GestureEvent> {
        match self.rx.try_recv() {
            Ok(event) => Some(event),
            Err(TryRecvError::Empty) | Err(TryRecvError::Disconnected) => None,
        }
    }

    pub fn pending(&self) -> usize {
        self.rx.len()
    }

    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::thread;

    fn tap(x: f32) -> GestureEvent {
        GestureEvent::SingleTap(ScreenPoint::new(x, 0.0))
    }

    #[test]
    fn test_overflow_drops_newest_and_keeps_fifo() {
        let (tx, rx) = gesture_channel(DEFAULT_GESTURE_CAPACITY);

        assert!(tx.enqueue(tap(1.0)));
        assert!(tx.enqueue(GestureEvent::DoubleTap(ScreenPoint::new(2.0, 0.0))));
        assert!(!tx.enqueue(tap(3.0)));
        assert_eq!(tx.dropped(), 1);

        assert_eq!(rx.dequeue(), Some(tap(1.0)));
        assert_eq!(
            rx.dequeue(),
            Some(GestureEvent::DoubleTap(ScreenPoint::new(2.0, 0.0)))
        );
        assert_eq!(rx.dequeue(), None);
    }

    #[test]
    fn test_dequeue_on_empty_does_not_block() {
        let (_tx, rx) = gesture_channel(2);
        assert_eq!(rx.dequeue(), None);
        assert_eq!(rx.pending(), 0);
    }

    #[test]
    fn test_enqueue_after_consumer_dropped() {
        let (tx, rx) = gesture_channel(2);
        drop(rx);
        assert!(!tx.enqueue(tap(1.0)));
        assert_eq!(tx.dropped(), 0);
    }

    #[test]
    fn test_producer_on_other_thread_never_blocks() {
        let (tx, rx) = gesture_channel(2);
        let producer = thread::spawn(move || (0..100).filter(|i| tx.enqueue(tap(*i as f32))).count());

        let accepted = producer.join().expect("producer thread");
        assert_eq!(accepted, 2);
        assert_eq!(rx.dropped(), 98);
        assert_eq!(rx.dequeue(), Some(tap(0.0)));
        assert_eq!(rx.dequeue(), Some(tap(1.0)));
    }

    #[test]
    fn test_scroll_point_is_destination() {
        let event = GestureEvent::Scroll {
            from: ScreenPoint::new(0.0, 0.0),
            to: ScreenPoint::new(5.0, 6.0),
            dx: 5.0,
            dy: 6.0,
        };
        assert_eq!(event.point(), ScreenPoint::new(5.0, 6.0));
    }
}
