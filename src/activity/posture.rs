//! Standing-height baseline and its calibration.

use serde::Deserialize;
use tracing::{info, warn};

/// Configuration for the posture baseline.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct PostureConfig {
    /// Headset height (meters) assumed until the player calibrates.
    pub default_standing_height_m: f32,
}

impl Default for PostureConfig {
    fn default() -> Self {
        Self {
            default_standing_height_m: 1.7,
        }
    }
}

/// Calibrated standing height of the player's headset.
#[derive(Debug, Clone, PartialEq)]
pub struct PostureReference {
    standing_height_m: f32,
    calibrated: bool,
}

impl PostureReference {
    pub fn new(config: &PostureConfig) -> Self {
        Self {
            standing_height_m: config.default_standing_height_m,
            calibrated: false,
        }
    }

    /// Current baseline height in meters.
    pub fn standing_height(&self) -> f32 {
        self.standing_height_m
    }

    /// Whether a calibration has been accepted this session.
    pub fn is_calibrated(&self) -> bool {
        self.calibrated
    }

    /// Overwrite the baseline with the current head height.
    ///
    /// Returns the new baseline, or `None` when the reading is not a valid
    /// height (a lost headset reports zero) and the old baseline is kept.
    pub fn calibrate(&mut self, head_height_m: f32) -> Option<f32> {
        if !(head_height_m.is_finite() && head_height_m > 0.0) {
            warn!(
                "Calibration rejected: head height {:.3}m, keeping {:.3}m",
                head_height_m, self.standing_height_m
            );
            return None;
        }
        self.standing_height_m = head_height_m;
        self.calibrated = true;
        info!("Player's height calibrated to {:.3}m", head_height_m);
        Some(head_height_m)
    }

    /// How far the head is from the standing baseline (negative = lower).
    pub fn height_delta(&self, head_height_m: f32) -> f32 {
        head_height_m - self.standing_height_m
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_baseline() {
        let posture = PostureReference::new(&PostureConfig::default());
        assert!((posture.standing_height() - 1.7).abs() < f32::EPSILON);
        assert!(!posture.is_calibrated());
        assert!((posture.height_delta(1.2) + 0.5).abs() < 1e-6);
    }

    #[test]
    fn test_calibrate_overwrites() {
        let mut posture = PostureReference::new(&PostureConfig::default());
        assert_eq!(posture.calibrate(1.55), Some(1.55));
        assert!(posture.is_calibrated());
        assert!((posture.standing_height() - 1.55).abs() < f32::EPSILON);
    }

    #[test]
    fn test_calibrate_rejects_lost_headset() {
        let mut posture = PostureReference::new(&PostureConfig::default());
        posture.calibrate(1.6);
        assert_eq!(posture.calibrate(0.0), None);
        assert_eq!(posture.calibrate(-0.3), None);
        assert_eq!(posture.calibrate(f32::NAN), None);
        assert!((posture.standing_height() - 1.6).abs() < f32::EPSILON);
    }
}
