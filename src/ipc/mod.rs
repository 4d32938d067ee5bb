//! Line-oriented s-expression control protocol.

pub mod dispatch;

pub use dispatch::{handle_message, ControlState};
