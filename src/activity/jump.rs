//! Airborne detection.  Supplies landing times to the jumping-jack detector.

use serde::Deserialize;
use tracing::debug;

/// Thresholds for jump detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JumpConfig {
    /// Height (meters) above standing baseline that counts as airborne.
    pub height_threshold_m: f32,
}

impl Default for JumpConfig {
    fn default() -> Self {
        Self {
            height_threshold_m: 0.1,
        }
    }
}

/// Edge reported by the jump detector.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum JumpEdge {
    TakeOff,
    /// Landed at the given session time (seconds).
    Landed { at_s: f64 },
}

/// Binary airborne tracker.  Holds no count of its own.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct JumpDetector {
    airborne: bool,
    last_landing_s: Option<f64>,
}

impl JumpDetector {
    pub fn new() -> Self {
        Self::default()
    }

    /// Whether the player is currently off the ground.
    pub fn is_jumping(&self) -> bool {
        self.airborne
    }

    /// Session time of the most recent landing.
    pub fn last_landing(&self) -> Option<f64> {
        self.last_landing_s
    }

    /// Update from the current height delta at session time `now_s`.
    pub fn update(&mut self, config: &JumpConfig, height_delta: f32, now_s: f64) -> Option<JumpEdge> {
        let airborne = height_delta > config.height_threshold_m;
        let was_airborne = self.airborne;
        self.airborne = airborne;

        match (was_airborne, airborne) {
            (false, true) => {
                debug!("Jump started: delta {:.2}m", height_delta);
                Some(JumpEdge::TakeOff)
            }
            (true, false) => {
                self.last_landing_s = Some(now_s);
                debug!("No longer jumping, landed at {:.2}s", now_s);
                Some(JumpEdge::Landed { at_s: now_s })
            }
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_take_off_and_landing() {
        let config = JumpConfig::default();
        let mut jump = JumpDetector::new();

        assert_eq!(jump.update(&config, 0.0, 0.0), None);
        assert!(!jump.is_jumping());

        assert_eq!(jump.update(&config, 0.15, 0.1), Some(JumpEdge::TakeOff));
        assert!(jump.is_jumping());
        assert_eq!(jump.update(&config, 0.25, 0.2), None);

        assert_eq!(
            jump.update(&config, 0.02, 0.3),
            Some(JumpEdge::Landed { at_s: 0.3 })
        );
        assert!(!jump.is_jumping());
        assert_eq!(jump.last_landing(), Some(0.3));
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let config = JumpConfig::default();
        let mut jump = JumpDetector::new();
        assert_eq!(jump.update(&config, 0.1, 0.0), None);
        assert!(jump.last_landing().is_none());
    }
}
