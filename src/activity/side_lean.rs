//! Side-lean ("side jack") detection from head roll and raised hand.
//!
//! Leaning left means tilting the head left while raising the right hand,
//! and vice versa.  After each lean the player must return to a level head
//! with hands together before the next one counts.

use serde::Deserialize;
use tracing::debug;

use super::metrics::DerivedMetrics;

// ── Config ─────────────────────────────────────────────────

/// Thresholds for side-lean detection.  Angles in degrees, [0, 360).
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SideLeanConfig {
    /// Exclusive roll band for a left lean.
    pub left_roll_min_deg: f32,
    pub left_roll_max_deg: f32,
    /// Exclusive roll band for a right lean.
    pub right_roll_min_deg: f32,
    pub right_roll_max_deg: f32,
    /// How much higher (meters) the opposite hand must be.
    pub hand_raise_threshold_m: f32,
    /// Roll within this many degrees of level counts as neutral.
    pub neutral_roll_deg: f32,
    /// Maximum hand height difference (meters) to re-arm.
    pub rearm_hand_tolerance_m: f32,
}

impl Default for SideLeanConfig {
    fn default() -> Self {
        Self {
            left_roll_min_deg: 20.0,
            left_roll_max_deg: 90.0,
            right_roll_min_deg: 300.0,
            right_roll_max_deg: 340.0,
            hand_raise_threshold_m: 0.6,
            neutral_roll_deg: 10.0,
            rearm_hand_tolerance_m: 0.2,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Lean direction.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeanSide {
    Left,
    Right,
}

impl LeanSide {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Left => "left",
            Self::Right => "right",
        }
    }
}

/// Transition produced by one side-lean update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LeanTransition {
    Detected { side: LeanSide, count: u32 },
    Rearmed,
}

/// Side-lean detector state.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct SideLeanDetector {
    armed: bool,
    count_left: u32,
    count_right: u32,
}

fn in_band(value: f32, min: f32, max: f32) -> bool {
    value > min && value < max
}

impl SideLeanDetector {
    /// Starts disarmed; a level head with hands together arms it.
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_armed(&self) -> bool {
        self.armed
    }

    pub fn count_left(&self) -> u32 {
        self.count_left
    }

    pub fn count_right(&self) -> u32 {
        self.count_right
    }

    pub fn total(&self) -> u32 {
        self.count_left + self.count_right
    }

    /// Advance by one tick.  At most one transition fires, checked in the
    /// order left lean, right lean, re-arm.
    pub fn update(&mut self, config: &SideLeanConfig, m: &DerivedMetrics) -> Option<LeanTransition> {
        let roll = m.roll_deg;
        let hand = m.hand_height_delta;

        if self.armed
            && in_band(roll, config.left_roll_min_deg, config.left_roll_max_deg)
            && hand < -config.hand_raise_threshold_m
        {
            self.armed = false;
            self.count_left += 1;
            debug!("Side lean left detected: roll {:.1}, total {}", roll, self.count_left);
            return Some(LeanTransition::Detected {
                side: LeanSide::Left,
                count: self.count_left,
            });
        }

        if self.armed
            && in_band(roll, config.right_roll_min_deg, config.right_roll_max_deg)
            && hand > config.hand_raise_threshold_m
        {
            self.armed = false;
            self.count_right += 1;
            debug!("Side lean right detected: roll {:.1}, total {}", roll, self.count_right);
            return Some(LeanTransition::Detected {
                side: LeanSide::Right,
                count: self.count_right,
            });
        }

        let level = roll < config.neutral_roll_deg || roll > 360.0 - config.neutral_roll_deg;
        if !self.armed && level && hand.abs() < config.rearm_hand_tolerance_m {
            self.armed = true;
            debug!("Side lean re-armed");
            return Some(LeanTransition::Rearmed);
        }

        None
    }
}

// ── Tests ──────────────────────────────────────────────────
