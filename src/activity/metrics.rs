//! Per-tick signals derived from a pose frame and the posture baseline.

use super::posture::PostureReference;
use super::tracking::{dot, wrap_degrees, PoseFrame, DOWN};

/// Snapshot of the derived signals every detector reads.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DerivedMetrics {
    /// Headset height above the floor (0.0 when tracking is lost).
    pub head_height: f32,
    /// Head height minus the standing baseline.
    pub height_delta: f32,
    /// How far the head faces down: 0 = level, 1 = straight down.
    pub looking_down: f32,
    /// Head roll in degrees, [0, 360).
    pub roll_deg: f32,
    /// Left hand height minus right hand height.  Negative when the right
    /// hand is higher.
    pub hand_height_delta: f32,
    /// Absolute height difference between the hands.
    pub hands_height_difference: f32,
    /// Mean height of both hands.
    pub avg_hand_height: f32,
}

impl DerivedMetrics {
    pub fn compute(frame: &PoseFrame, posture: &PostureReference) -> Self {
        let head = frame.head();
        let left_y = frame.left_hand().height();
        let right_y = frame.right_hand().height();
        let hand_height_delta = left_y - right_y;

        Self {
            head_height: head.height(),
            height_delta: posture.height_delta(head.height()),
            looking_down: dot(&head.forward, &DOWN),
            roll_deg: wrap_degrees(head.roll_deg),
            hand_height_delta,
            hands_height_difference: hand_height_delta.abs(),
            avg_hand_height: (left_y + right_y) / 2.0,
        }
    }

    /// IPC diagnostics plist.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:head-height {:.3} :height-delta {:.3} :looking-down {:.3} :roll {:.1} :hand-height-delta {:.3} :hands-height-difference {:.3})",
            self.head_height,
            self.height_delta,
            self.looking_down,
            self.roll_deg,
            self.hand_height_delta,
            self.hands_height_difference,
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::activity::posture::PostureConfig;
    use crate::activity::tracking::{PoseSample, TrackedPoint};

    #[test]
    fn test_metrics_from_frame() {
        let posture = PostureReference::new(&PostureConfig::default());
        let head = PoseSample::new(TrackedPoint::Head, [0.0, 1.2, 0.0])
            .with_forward([0.0, -1.0, 1.0])
            .with_roll(30.0);
        let frame = PoseFrame::new(0.016, [0.2, 0.8, 0.0], [-0.2, 1.6, 0.0], head);

        let m = DerivedMetrics::compute(&frame, &posture);
        assert!((m.height_delta + 0.5).abs() < 1e-5);
        assert!((m.looking_down - std::f32::consts::FRAC_1_SQRT_2).abs() < 1e-5);
        assert!((m.roll_deg - 30.0).abs() < 1e-5);
        assert!((m.hand_height_delta + 0.8).abs() < 1e-5);
        assert!((m.hands_height_difference - 0.8).abs() < 1e-5);
        assert!((m.avg_hand_height - 1.2).abs() < 1e-5);
    }

    #[test]
    fn test_raw_negative_roll_is_wrapped() {
        let posture = PostureReference::new(&PostureConfig::default());
        let head = PoseSample {
            roll_deg: -20.0,
            ..PoseSample::new(TrackedPoint::Head, [0.0, 1.7, 0.0])
        };
        let frame = PoseFrame::new(0.016, [0.0, 1.0, 0.0], [0.0, 1.0, 0.0], head);

        let m = DerivedMetrics::compute(&frame, &posture);
        assert!((m.roll_deg - 340.0).abs() < 1e-4, "got {}", m.roll_deg);
    }

    #[test]
    fn test_metrics_sexp_parses() {
        let m = DerivedMetrics::default();
        let sexp = m.to_sexp();
        assert!(sexp.contains(":height-delta 0.000"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }
}
