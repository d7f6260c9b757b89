//! Touch input crossing from the UI thread into the render loop.

pub mod gesture;

pub use gesture::{
    gesture_channel, GestureEvent, GestureReceiver, GestureSender, DEFAULT_GESTURE_CAPACITY,
};
