//! Activity monitoring: travel distance, exercise gestures, and scoring.
//!
//! Provides:
//! - `tracking`: tracked points, pose samples and frames
//! - `distance`: per-point travel distance with teleport filtering
//! - `posture`: calibrated standing-height baseline
//! - `metrics`: per-tick signals shared by every detector
//! - `squat`, `jump`, `jumping_jack`, `side_lean`: gesture detectors
//! - `score`: weighted score and the eased progress meter
//! - `session`: the per-tick transition and `ActivityMonitor`

pub mod config;
pub mod distance;
pub mod events;
pub mod jump;
pub mod jumping_jack;
pub mod metrics;
pub mod posture;
pub mod score;
pub mod session;
pub mod side_lean;
pub mod squat;
pub mod tracking;

pub use config::{ActivityConfig, ConfigError, SessionConfig};
pub use events::ActivityEvent;
pub use score::ScoreBreakdown;
pub use session::{Activation, ActivityMonitor, ActivityState, GestureIndicators, TickReport};
pub use tracking::{PoseFrame, PoseSample, TrackedPoint};
