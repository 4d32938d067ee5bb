//! Activity monitor for room-scale VR: travel distance, exercise gesture
//! detection, and a combined activity score.

pub mod activity;
pub mod ipc;
