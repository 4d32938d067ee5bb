//! Activity monitor configuration.
//!
//! Every threshold lives in a per-component config struct with defaults
//! tuned for room-scale play.  The aggregate can be loaded from TOML, where
//! every table and field is optional:
//!
//! ```toml
//! [squat]
//! depth_fraction = 0.25
//!
//! [session]
//! activation_delay_s = 2.0
//! ```

use std::path::Path;

use anyhow::Context;
use serde::Deserialize;
use thiserror::Error;
use tracing::info;

use super::distance::DistanceConfig;
use super::jump::JumpConfig;
use super::jumping_jack::JumpingJackConfig;
use super::posture::PostureConfig;
use super::score::{ProgressConfig, ScoreConfig};
use super::side_lean::SideLeanConfig;
use super::squat::SquatConfig;

// ── Session ────────────────────────────────────────────────

/// Session lifecycle and presentation settings.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SessionConfig {
    /// Seconds after session start during which poses only seed tracking.
    pub activation_delay_s: f64,
    /// Seconds the jumping-jack indicator stays lit after a completion.
    pub jumping_jack_highlight_s: f64,
    /// Log gesture transitions.
    pub log_enabled: bool,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            activation_delay_s: 1.0,
            jumping_jack_highlight_s: 1.0,
            log_enabled: true,
        }
    }
}

// ── Errors ─────────────────────────────────────────────────

/// Rejected configuration value.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum ConfigError {
    #[error("{field} must be positive (got {value})")]
    NotPositive { field: &'static str, value: f64 },
    #[error("{field} must not be negative (got {value})")]
    Negative { field: &'static str, value: f64 },
    #[error("{field} must be within [{min}, {max}] (got {value})")]
    OutOfRange {
        field: &'static str,
        value: f64,
        min: f64,
        max: f64,
    },
    #[error("{lower} ({lower_value}) must be below {upper} ({upper_value})")]
    Ordering {
        lower: &'static str,
        lower_value: f64,
        upper: &'static str,
        upper_value: f64,
    },
}

fn positive(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive { field, value })
    }
}

fn non_negative(field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative { field, value })
    }
}

fn in_range(field: &'static str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    if value >= min && value <= max {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field,
            value,
            min,
            max,
        })
    }
}

fn ordered(
    lower: &'static str,
    lower_value: f64,
    upper: &'static str,
    upper_value: f64,
) -> Result<(), ConfigError> {
    if lower_value < upper_value {
        Ok(())
    } else {
        Err(ConfigError::Ordering {
            lower,
            lower_value,
            upper,
            upper_value,
        })
    }
}

// ── Aggregate ──────────────────────────────────────────────

/// Complete activity monitor configuration.
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
#[serde(default)]
pub struct ActivityConfig {
    pub distance: DistanceConfig,
    pub posture: PostureConfig,
    pub squat: SquatConfig,
    pub jump: JumpConfig,
    pub jumping_jack: JumpingJackConfig,
    pub side_lean: SideLeanConfig,
    pub score: ScoreConfig,
    pub progress: ProgressConfig,
    pub session: SessionConfig,
}

impl ActivityConfig {
    /// Parse and validate a TOML document.
    pub fn from_toml_str(contents: &str) -> anyhow::Result<Self> {
        let config: ActivityConfig = toml::from_str(contents).context("parsing activity config")?;
        config.validate().context("validating activity config")?;
        Ok(config)
    }

    /// Read, parse and validate a TOML file.
    pub fn load(path: &Path) -> anyhow::Result<Self> {
        let contents = std::fs::read_to_string(path)
            .with_context(|| format!("reading config {}", path.display()))?;
        let config = Self::from_toml_str(&contents)
            .with_context(|| format!("loading config {}", path.display()))?;
        info!(?path, "Loaded activity config");
        Ok(config)
    }

    /// Check every threshold for sign and ordering.
    pub fn validate(&self) -> Result<(), ConfigError> {
        let d = &self.distance;
        positive("movement_threshold_m", d.movement_threshold_m as f64)?;
        positive("teleport_threshold_m", d.teleport_threshold_m as f64)?;
        positive("movement_to_distance", d.movement_to_distance)?;
        ordered(
            "movement_threshold_m",
            d.movement_threshold_m as f64,
            "teleport_threshold_m",
            d.teleport_threshold_m as f64,
        )?;

        positive(
            "default_standing_height_m",
            self.posture.default_standing_height_m as f64,
        )?;

        let s = &self.squat;
        in_range("depth_fraction", s.depth_fraction as f64, 0.0, 1.0)?;
        positive("depth_fraction", s.depth_fraction as f64)?;
        in_range("pitch_threshold", s.pitch_threshold as f64, -1.0, 1.0)?;
        positive("reset_band_m", s.reset_band_m as f64)?;
        non_negative("cooldown_s", s.cooldown_s)?;

        positive("height_threshold_m", self.jump.height_threshold_m as f64)?;

        let jj = &self.jumping_jack;
        positive(
            "hands_symmetry_tolerance_m",
            jj.hands_symmetry_tolerance_m as f64,
        )?;
        non_negative("timing_window_s", jj.timing_window_s)?;
        ordered(
            "low_height_cap_m",
            jj.low_height_cap_m as f64,
            "high_height_floor_m",
            jj.high_height_floor_m as f64,
        )?;

        let l = &self.side_lean;
        for (field, value) in [
            ("left_roll_min_deg", l.left_roll_min_deg),
            ("left_roll_max_deg", l.left_roll_max_deg),
            ("right_roll_min_deg", l.right_roll_min_deg),
            ("right_roll_max_deg", l.right_roll_max_deg),
        ] {
            in_range(field, value as f64, 0.0, 360.0)?;
        }
        ordered(
            "left_roll_min_deg",
            l.left_roll_min_deg as f64,
            "left_roll_max_deg",
            l.left_roll_max_deg as f64,
        )?;
        ordered(
            "right_roll_min_deg",
            l.right_roll_min_deg as f64,
            "right_roll_max_deg",
            l.right_roll_max_deg as f64,
        )?;
        in_range("neutral_roll_deg", l.neutral_roll_deg as f64, 0.0, 180.0)?;
        positive("hand_raise_threshold_m", l.hand_raise_threshold_m as f64)?;
        positive("rearm_hand_tolerance_m", l.rearm_hand_tolerance_m as f64)?;

        non_negative(
            "distance_points_per_unit",
            self.score.distance_points_per_unit,
        )?;

        let p = &self.progress;
        positive("points_for_full_bar", p.points_for_full_bar)?;
        positive("smoothing_speed", p.smoothing_speed)?;
        non_negative("snap_epsilon", p.snap_epsilon)?;

        non_negative("activation_delay_s", self.session.activation_delay_s)?;
        non_negative(
            "jumping_jack_highlight_s",
            self.session.jumping_jack_highlight_s,
        )?;
        Ok(())
    }

    /// Generate IPC config s-expression.
    pub fn config_sexp(&self) -> String {
        format!(
            "(:movement-threshold {:.3} :teleport-threshold {:.3} :movement-to-distance {:.1} \
             :default-standing-height {:.3} \
             :squat-depth-fraction {:.3} :squat-pitch-threshold {:.3} :squat-reset-band {:.3} :squat-cooldown {:.2} \
             :jump-height-threshold {:.3} \
             :jj-hands-symmetry {:.3} :jj-low-height-cap {:.3} :jj-high-height-floor {:.3} :jj-timing-window {:.3} \
             :lean-left-min {:.1} :lean-left-max {:.1} :lean-right-min {:.1} :lean-right-max {:.1} \
             :lean-hand-raise {:.3} :lean-neutral {:.1} :lean-rearm-tolerance {:.3} \
             :distance-points {:.3} :squat-points {} :jumping-jack-points {} :side-lean-points {} \
             :points-for-full-bar {:.0} :progress-speed {:.2} \
             :activation-delay {:.2} :jumping-jack-highlight {:.2} :log-enabled {})",
            self.distance.movement_threshold_m,
            self.distance.teleport_threshold_m,
            self.distance.movement_to_distance,
            self.posture.default_standing_height_m,
            self.squat.depth_fraction,
            self.squat.pitch_threshold,
            self.squat.reset_band_m,
            self.squat.cooldown_s,
            self.jump.height_threshold_m,
            self.jumping_jack.hands_symmetry_tolerance_m,
            self.jumping_jack.low_height_cap_m,
            self.jumping_jack.high_height_floor_m,
            self.jumping_jack.timing_window_s,
            self.side_lean.left_roll_min_deg,
            self.side_lean.left_roll_max_deg,
            self.side_lean.right_roll_min_deg,
            self.side_lean.right_roll_max_deg,
            self.side_lean.hand_raise_threshold_m,
            self.side_lean.neutral_roll_deg,
            self.side_lean.rearm_hand_tolerance_m,
            self.score.distance_points_per_unit,
            self.score.points_per_squat,
            self.score.points_per_jumping_jack,
            self.score.points_per_side_lean,
            self.progress.points_for_full_bar,
            self.progress.smoothing_speed,
            self.session.activation_delay_s,
            self.session.jumping_jack_highlight_s,
            if self.session.log_enabled { "t" } else { "nil" },
        )
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_defaults_are_valid() {
        assert_eq!(ActivityConfig::default().validate(), Ok(()));
    }

    #[test]
    fn test_partial_toml_keeps_defaults() {
        let config = ActivityConfig::from_toml_str(
            r#"
            [squat]
            depth_fraction = 0.25

            [session]
            activation_delay_s = 2.0
            log_enabled = false
            "#,
        )
        .unwrap();
        assert!((config.squat.depth_fraction - 0.25).abs() < 1e-6);
        assert!((config.squat.pitch_threshold - 0.5).abs() < 1e-6);
        assert!((config.session.activation_delay_s - 2.0).abs() < 1e-9);
        assert!(!config.session.log_enabled);
        assert_eq!(config.score, ScoreConfig::default());
    }

    #[test]
    fn test_demo_config_loads() {
        let config = ActivityConfig::from_toml_str(include_str!("../../demos/activity.toml")).unwrap();
        assert_eq!(config, ActivityConfig::default());
    }

    #[test]
    fn test_empty_toml_is_default() {
        let config = ActivityConfig::from_toml_str("").unwrap();
        assert_eq!(config, ActivityConfig::default());
    }

    #[test]
    fn test_invalid_toml_rejected() {
        let err = ActivityConfig::from_toml_str("[distance]\nteleport_threshold_m = 0.05\n")
            .unwrap_err();
        let chain = format!("{:#}", err);
        assert!(chain.contains("movement_threshold_m"), "got: {}", chain);
    }

    #[test]
    fn test_validate_names_field() {
        let mut config = ActivityConfig::default();
        config.posture.default_standing_height_m = 0.0;
        assert_eq!(
            config.validate(),
            Err(ConfigError::NotPositive {
                field: "default_standing_height_m",
                value: 0.0
            })
        );

        let mut config = ActivityConfig::default();
        config.jumping_jack.low_height_cap_m = 1.6;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::Ordering {
                lower: "low_height_cap_m",
                ..
            })
        ));

        let mut config = ActivityConfig::default();
        config.side_lean.right_roll_max_deg = 400.0;
        assert!(matches!(
            config.validate(),
            Err(ConfigError::OutOfRange {
                field: "right_roll_max_deg",
                ..
            })
        ));
    }

    #[test]
    fn test_config_sexp_parses() {
        let sexp = ActivityConfig::default().config_sexp();
        assert!(sexp.contains(":squat-cooldown 5.00"));
        assert!(sexp.contains(":log-enabled t"));
        assert!(lexpr::from_str(&sexp).is_ok(), "invalid sexp: {}", sexp);
    }
}
