//! Activity score aggregation and the smoothed progress meter.

use serde::Deserialize;

use super::tracking::POINT_COUNT;

// ── Config ─────────────────────────────────────────────────

/// Point weights for each kind of activity.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ScoreConfig {
    /// Points per distance unit travelled by any tracked point.
    pub distance_points_per_unit: f64,
    pub points_per_squat: u32,
    /// Points per jumping-jack half (either counter).
    pub points_per_jumping_jack: u32,
    /// Points per side lean (either side).
    pub points_per_side_lean: u32,
}

impl Default for ScoreConfig {
    fn default() -> Self {
        Self {
            distance_points_per_unit: 1.0,
            points_per_squat: 1000,
            points_per_jumping_jack: 250,
            points_per_side_lean: 250,
        }
    }
}

// ── Breakdown ──────────────────────────────────────────────

/// Counts the score is computed from.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreInputs {
    /// Cumulative distance per tracked point.
    pub distances: [f64; POINT_COUNT],
    pub squats: u32,
    pub jumping_jacks_from_low: u32,
    pub jumping_jacks_from_high: u32,
    pub side_leans_left: u32,
    pub side_leans_right: u32,
}

/// Score split by source.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ScoreBreakdown {
    pub distance_score: f64,
    pub squat_score: f64,
    pub jumping_jack_score: f64,
    pub side_lean_score: f64,
    pub total: f64,
}

impl ScoreBreakdown {
    /// Weighted sum of distances and gesture counts.
    pub fn compute(config: &ScoreConfig, inputs: &ScoreInputs) -> Self {
        let distance_score =
            inputs.distances.iter().sum::<f64>() * config.distance_points_per_unit;
        let squat_score = inputs.squats as f64 * config.points_per_squat as f64;
        let jumping_jack_score = (inputs.jumping_jacks_from_low + inputs.jumping_jacks_from_high)
            as f64
            * config.points_per_jumping_jack as f64;
        let side_lean_score = (inputs.side_leans_left + inputs.side_leans_right) as f64
            * config.points_per_side_lean as f64;

        Self {
            distance_score,
            squat_score,
            jumping_jack_score,
            side_lean_score,
            total: distance_score + squat_score + jumping_jack_score + side_lean_score,
        }
    }

    /// IPC plist.
    pub fn to_sexp(&self) -> String {
        format!(
            "(:distance {:.1} :squat {:.0} :jumping-jack {:.0} :side-lean {:.0} :total {:.1})",
            self.distance_score,
            self.squat_score,
            self.jumping_jack_score,
            self.side_lean_score,
            self.total,
        )
    }
}

// ── Progress meter ─────────────────────────────────────────

/// Activity bar configuration.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct ProgressConfig {
    /// Score that fills the bar completely.
    pub points_for_full_bar: f64,
    /// Easing speed per second towards the target fill.
    pub smoothing_speed: f64,
    /// Snap to the target when this close.
    pub snap_epsilon: f64,
}

impl Default for ProgressConfig {
    fn default() -> Self {
        Self {
            points_for_full_bar: 10_000.0,
            smoothing_speed: 5.0,
            snap_epsilon: 0.001,
        }
    }
}

/// Eased fill fraction for an activity bar.  Not clamped to 1.0: callers
/// decide how to render overflow.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct ProgressMeter {
    fill: f64,
}

impl ProgressMeter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn fill(&self) -> f64 {
        self.fill
    }

    /// Ease the fill towards `total / points_for_full_bar`.
    pub fn update(&mut self, config: &ProgressConfig, total: f64, dt_s: f64) -> f64 {
        let target = if config.points_for_full_bar > 0.0 {
            total / config.points_for_full_bar
        } else {
            0.0
        };
        if (target - self.fill).abs() > config.snap_epsilon {
            let t = (dt_s * config.smoothing_speed).clamp(0.0, 1.0);
            self.fill += (target - self.fill) * t;
        } else {
            self.fill = target;
        }
        self.fill
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_weighted_sum() {
        let config = ScoreConfig::default();
        let inputs = ScoreInputs {
            distances: [120.0, 80.5, 40.0],
            squats: 2,
            jumping_jacks_from_low: 3,
            jumping_jacks_from_high: 1,
            side_leans_left: 1,
            side_leans_right: 2,
        };
        let score = ScoreBreakdown::compute(&config, &inputs);
        assert!((score.distance_score - 240.5).abs() < 1e-9);
        assert!((score.squat_score - 2000.0).abs() < 1e-9);
        assert!((score.jumping_jack_score - 1000.0).abs() < 1e-9);
        assert!((score.side_lean_score - 750.0).abs() < 1e-9);
        assert!((score.total - 3990.5).abs() < 1e-9);
    }

    #[test]
    fn test_inputs_cover_every_tracked_point() {
        use crate::activity::tracking::TrackedPoint;

        let mut inputs = ScoreInputs::default();
        assert_eq!(inputs.distances.len(), TrackedPoint::ALL.len());
        for point in TrackedPoint::ALL {
            inputs.distances[point.index()] = 10.0;
        }
        let score = ScoreBreakdown::compute(&ScoreConfig::default(), &inputs);
        assert!((score.distance_score - 10.0 * TrackedPoint::ALL.len() as f64).abs() < 1e-9);
    }

    #[test]
    fn test_distance_weight_applies() {
        let config = ScoreConfig {
            distance_points_per_unit: 0.5,
            ..Default::default()
        };
        let inputs = ScoreInputs {
            distances: [10.0, 10.0, 20.0],
            ..Default::default()
        };
        let score = ScoreBreakdown::compute(&config, &inputs);
        assert!((score.total - 20.0).abs() < 1e-9);
    }

    #[test]
    fn test_breakdown_sexp() {
        let score = ScoreBreakdown::compute(
            &ScoreConfig::default(),
            &ScoreInputs {
                squats: 1,
                ..Default::default()
            },
        );
        let sexp = score.to_sexp();
        assert!(sexp.contains(":squat 1000"));
        assert!(sexp.contains(":total 1000.0"));
        assert!(lexpr::from_str(&sexp).is_ok());
    }

    #[test]
    fn test_progress_eases_and_snaps() {
        let config = ProgressConfig::default();
        let mut meter = ProgressMeter::new();

        let first = meter.update(&config, 5000.0, 0.1);
        assert!((first - 0.25).abs() < 1e-9, "got {}", first);

        for _ in 0..200 {
            meter.update(&config, 5000.0, 0.1);
        }
        assert_eq!(meter.fill(), 0.5);
    }

    #[test]
    fn test_progress_large_dt_does_not_overshoot() {
        let config = ProgressConfig::default();
        let mut meter = ProgressMeter::new();
        let fill = meter.update(&config, 10_000.0, 2.0);
        assert!((fill - 1.0).abs() < 1e-9);
    }
}
