//! Jumping-jack detection from hand height and jump timing.
//!
//! A repetition has two halves: hands low on the ground, then hands high in
//! the air (`from_low`), and hands high in the air, then low again shortly
//! after landing (`from_high`).  The two halves are counted separately.
//! Hands must move together; if they are too far apart the machine holds.

use serde::Deserialize;
use tracing::debug;

use super::metrics::DerivedMetrics;

// ── Config ─────────────────────────────────────────────────

/// Thresholds for jumping-jack detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct JumpingJackConfig {
    /// Maximum height difference (meters) between hands.
    pub hands_symmetry_tolerance_m: f32,
    /// Average hand height (meters) below which hands are "low" (waist).
    pub low_height_cap_m: f32,
    /// Average hand height (meters) above which hands are "high" (overhead).
    pub high_height_floor_m: f32,
    /// Seconds after landing in which hands coming down complete a rep.
    pub timing_window_s: f64,
}

impl Default for JumpingJackConfig {
    fn default() -> Self {
        Self {
            hands_symmetry_tolerance_m: 0.2,
            low_height_cap_m: 1.0,
            high_height_floor_m: 1.5,
            timing_window_s: 0.5,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Jumping-jack state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JackPhase {
    Neutral,
    /// Hands low while grounded.
    HandsLowReady,
    /// Hands high while airborne.
    HandsHighReady,
}

impl JackPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Neutral => "neutral",
            Self::HandsLowReady => "hands-low",
            Self::HandsHighReady => "hands-high",
        }
    }
}

/// Which half of the repetition was completed.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum JackEntry {
    /// Low → high.
    FromLow,
    /// High → low after landing.
    FromHigh,
}

impl JackEntry {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::FromLow => "from-low",
            Self::FromHigh => "from-high",
        }
    }
}

/// A counted half-repetition with the new counter value.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct JackCompletion {
    pub entry: JackEntry,
    pub count: u32,
}

/// Jumping-jack detector state.
#[derive(Debug, Clone, PartialEq)]
pub struct JumpingJackDetector {
    phase: JackPhase,
    count_from_low: u32,
    count_from_high: u32,
}

impl JumpingJackDetector {
    pub fn new() -> Self {
        Self {
            phase: JackPhase::Neutral,
            count_from_low: 0,
            count_from_high: 0,
        }
    }

    pub fn phase(&self) -> JackPhase {
        self.phase
    }

    pub fn count_from_low(&self) -> u32 {
        self.count_from_low
    }

    pub fn count_from_high(&self) -> u32 {
        self.count_from_high
    }

    /// Both halves combined.
    pub fn total(&self) -> u32 {
        self.count_from_low + self.count_from_high
    }

    /// Advance by one tick.
    ///
    /// `airborne` and `last_landing_s` come from the jump detector, already
    /// updated for this tick.
    pub fn update(
        &mut self,
        config: &JumpingJackConfig,
        m: &DerivedMetrics,
        airborne: bool,
        last_landing_s: Option<f64>,
        now_s: f64,
    ) -> Option<JackCompletion> {
        if m.hands_height_difference >= config.hands_symmetry_tolerance_m {
            return None;
        }

        if !airborne && m.avg_hand_height < config.low_height_cap_m {
            let previous = self.phase;
            self.phase = JackPhase::HandsLowReady;

            let within_window = last_landing_s
                .map(|landed| now_s - landed < config.timing_window_s)
                .unwrap_or(false);
            if previous == JackPhase::HandsHighReady && within_window {
                self.count_from_high += 1;
                debug!("Jumping jack (from high) detected, total {}", self.count_from_high);
                return Some(JackCompletion {
                    entry: JackEntry::FromHigh,
                    count: self.count_from_high,
                });
            }
            return None;
        }

        if airborne && m.avg_hand_height > config.high_height_floor_m {
            let previous = self.phase;
            self.phase = JackPhase::HandsHighReady;

            if previous == JackPhase::HandsLowReady {
                self.count_from_low += 1;
                debug!("Jumping jack (from low) detected, total {}", self.count_from_low);
                return Some(JackCompletion {
                    entry: JackEntry::FromLow,
                    count: self.count_from_low,
                });
            }
        }

        None
    }
}

impl Default for JumpingJackDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    fn hands(left_y: f32, right_y: f32) -> DerivedMetrics {
        DerivedMetrics {
            hand_height_delta: left_y - right_y,
            hands_height_difference: (left_y - right_y).abs(),
            avg_hand_height: (left_y + right_y) / 2.0,
            ..Default::default()
        }
    }

    #[test]
    fn test_low_to_high_counts_from_low() {
        let config = JumpingJackConfig::default();
        let mut jj = JumpingJackDetector::new();

        assert_eq!(jj.update(&config, &hands(0.8, 0.8), false, None, 0.0), None);
        assert_eq!(jj.phase(), JackPhase::HandsLowReady);

        let done = jj.update(&config, &hands(1.8, 1.8), true, None, 0.2);
        assert_eq!(
            done,
            Some(JackCompletion {
                entry: JackEntry::FromLow,
                count: 1
            })
        );
        assert_eq!(jj.phase(), JackPhase::HandsHighReady);

        // Staying high does not count again.
        assert_eq!(jj.update(&config, &hands(1.8, 1.8), true, None, 0.3), None);
        assert_eq!(jj.count_from_low(), 1);
    }

    #[test]
    fn test_high_to_low_within_window_counts_from_high() {
        let config = JumpingJackConfig::default();
        let mut jj = JumpingJackDetector::new();
        jj.update(&config, &hands(1.8, 1.8), true, None, 0.0);
        assert_eq!(jj.phase(), JackPhase::HandsHighReady);
        assert_eq!(jj.count_from_low(), 0);

        let done = jj.update(&config, &hands(0.8, 0.8), false, Some(1.0), 1.3);
        assert_eq!(
            done,
            Some(JackCompletion {
                entry: JackEntry::FromHigh,
                count: 1
            })
        );
        assert_eq!(jj.phase(), JackPhase::HandsLowReady);
        assert_eq!(jj.total(), 1);
    }

    #[test]
    fn test_high_to_low_after_window_not_counted() {
        let config = JumpingJackConfig::default();
        let mut jj = JumpingJackDetector::new();
        jj.update(&config, &hands(1.8, 1.8), true, None, 0.0);

        assert_eq!(jj.update(&config, &hands(0.8, 0.8), false, Some(1.0), 1.6), None);
        assert_eq!(jj.count_from_high(), 0);
        // The low posture still primes the next low → high half.
        assert_eq!(jj.phase(), JackPhase::HandsLowReady);
    }

    #[test]
    fn test_asymmetric_hands_hold_state() {
        let config = JumpingJackConfig::default();
        let mut jj = JumpingJackDetector::new();
        jj.update(&config, &hands(0.8, 0.8), false, None, 0.0);

        // One arm up, one down while airborne: ignored entirely.
        assert_eq!(jj.update(&config, &hands(2.0, 1.0), true, None, 0.1), None);
        assert_eq!(jj.phase(), JackPhase::HandsLowReady);
        assert_eq!(jj.total(), 0);
    }

    #[test]
    fn test_full_cycles() {
        let config = JumpingJackConfig::default();
        let mut jj = JumpingJackDetector::new();
        let mut now = 0.0;
        for _ in 0..3 {
            jj.update(&config, &hands(0.8, 0.8), false, None, now);
            now += 0.2;
            jj.update(&config, &hands(1.8, 1.8), true, None, now);
            now += 0.2;
            // Landed this tick.
            jj.update(&config, &hands(0.9, 0.9), false, Some(now), now);
            now += 0.2;
        }
        assert_eq!(jj.count_from_low(), 3);
        assert_eq!(jj.count_from_high(), 3);
    }
}
