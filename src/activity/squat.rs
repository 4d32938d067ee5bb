//! Squat detection with standing-height hysteresis and cooldown.
//!
//! A squat counts when the head drops a configured fraction of the standing
//! height while the player is not bowing forward.  After a squat the
//! detector waits in `AwaitingReset` until the head is back near standing
//! height, so one crouch is never counted twice.

use serde::Deserialize;
use tracing::debug;

use super::metrics::DerivedMetrics;

// ── Config ─────────────────────────────────────────────────

/// Thresholds for squat detection.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct SquatConfig {
    /// Fraction of standing height the head must drop (0.3 = 30%).
    pub depth_fraction: f32,
    /// Maximum `looking_down` (0 = level, 1 = straight down) during a squat.
    pub pitch_threshold: f32,
    /// Half-width (meters) of the band around standing height that re-arms.
    pub reset_band_m: f32,
    /// Seconds after a squat before it may re-arm without a full reset.
    pub cooldown_s: f64,
}

impl Default for SquatConfig {
    fn default() -> Self {
        Self {
            depth_fraction: 0.3,
            pitch_threshold: 0.5,
            reset_band_m: 0.1,
            cooldown_s: 5.0,
        }
    }
}

// ── State ──────────────────────────────────────────────────

/// Squat state machine phase.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquatPhase {
    /// A new squat may be registered.
    ArmedLow,
    /// The player must stand back up (or wait out the cooldown) first.
    AwaitingReset,
}

impl SquatPhase {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::ArmedLow => "armed",
            Self::AwaitingReset => "awaiting-reset",
        }
    }
}

/// Transition produced by one squat update.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SquatTransition {
    /// Head returned to the standing band.
    Reset,
    /// Cooldown elapsed with the head above squat depth.
    CooldownRearm,
    /// A squat was counted.  Carries the new total.
    Detected { count: u32 },
}

/// Squat detector state.
#[derive(Debug, Clone, PartialEq)]
pub struct SquatDetector {
    phase: SquatPhase,
    cooldown_elapsed_s: f64,
    count: u32,
}

impl SquatDetector {
    pub fn new() -> Self {
        Self {
            phase: SquatPhase::AwaitingReset,
            cooldown_elapsed_s: 0.0,
            count: 0,
        }
    }

    pub fn phase(&self) -> SquatPhase {
        self.phase
    }

    pub fn count(&self) -> u32 {
        self.count
    }

    pub fn cooldown_elapsed(&self) -> f64 {
        self.cooldown_elapsed_s
    }

    /// Whether the head is below squat depth, ignoring pitch and tracking.
    fn at_squat_depth(config: &SquatConfig, m: &DerivedMetrics, standing_height: f32) -> bool {
        m.height_delta < 0.0 && m.height_delta.abs() > standing_height * config.depth_fraction
    }

    /// Whether the head is low enough, level enough, and actually tracked.
    fn in_squat_posture(config: &SquatConfig, m: &DerivedMetrics, standing_height: f32) -> bool {
        m.head_height > 0.0
            && Self::at_squat_depth(config, m, standing_height)
            && m.looking_down < config.pitch_threshold
    }

    /// Advance the state machine by one tick.
    pub fn update(
        &mut self,
        config: &SquatConfig,
        m: &DerivedMetrics,
        standing_height: f32,
        dt_s: f64,
    ) -> Option<SquatTransition> {
        match self.phase {
            SquatPhase::AwaitingReset => {
                if m.height_delta.abs() < config.reset_band_m {
                    self.phase = SquatPhase::ArmedLow;
                    debug!("Squat reset");
                    return Some(SquatTransition::Reset);
                }

                self.cooldown_elapsed_s = (self.cooldown_elapsed_s + dt_s).min(config.cooldown_s);
                // A glance down or a dropped headset frame is not standing up.
                if self.cooldown_elapsed_s >= config.cooldown_s
                    && m.head_height > 0.0
                    && !Self::at_squat_depth(config, m, standing_height)
                {
                    self.phase = SquatPhase::ArmedLow;
                    debug!("Squat re-armed after {:.1}s cooldown", config.cooldown_s);
                    return Some(SquatTransition::CooldownRearm);
                }
                None
            }
            SquatPhase::ArmedLow => {
                if !Self::in_squat_posture(config, m, standing_height) {
                    return None;
                }
                self.phase = SquatPhase::AwaitingReset;
                self.cooldown_elapsed_s = 0.0;
                self.count += 1;
                debug!(
                    "Squat detected: delta {:.2}m, looking down {:.2}, total {}",
                    m.height_delta, m.looking_down, self.count
                );
                Some(SquatTransition::Detected { count: self.count })
            }
        }
    }
}

impl Default for SquatDetector {
    fn default() -> Self {
        Self::new()
    }
}

// ── Tests ──────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;

    const STANDING: f32 = 1.7;
    const DT: f64 = 1.0 / 60.0;

    fn metrics(head_height: f32, looking_down: f32) -> DerivedMetrics {
        DerivedMetrics {
            head_height,
            height_delta: head_height - STANDING,
            looking_down,
            ..Default::default()
        }
    }

    fn run(detector: &mut SquatDetector, config: &SquatConfig, heights: &[f32]) -> u32 {
        let mut detected = 0;
        for &h in heights {
            if let Some(SquatTransition::Detected { .. }) =
                detector.update(config, &metrics(h, 0.0), STANDING, DT)
            {
                detected += 1;
            }
        }
        detected
    }

    fn armed() -> SquatDetector {
        let mut detector = SquatDetector::new();
        let t = detector.update(&SquatConfig::default(), &metrics(STANDING, 0.0), STANDING, DT);
        assert_eq!(t, Some(SquatTransition::Reset));
        detector
    }

    #[test]
    fn test_starts_awaiting_reset() {
        let detector = SquatDetector::new();
        assert_eq!(detector.phase(), SquatPhase::AwaitingReset);
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_single_squat_over_many_ticks() {
        let config = SquatConfig::default();
        let mut detector = armed();

        // Slow descent, long hold, slow return: one squat.
        let mut path: Vec<f32> = (0..60).map(|i| STANDING - i as f32 * 0.012).collect();
        path.extend(std::iter::repeat(1.0).take(120));
        path.extend((0..60).map(|i| 1.0 + i as f32 * 0.012));
        path.push(STANDING);

        assert_eq!(run(&mut detector, &config, &path), 1);
        assert_eq!(detector.count(), 1);
        assert_eq!(detector.phase(), SquatPhase::ArmedLow);
    }

    #[test]
    fn test_shallow_dip_not_counted() {
        let config = SquatConfig::default();
        let mut detector = armed();
        // 0.3 * 1.7 = 0.51m required; 0.4m is not enough.
        assert_eq!(run(&mut detector, &config, &[1.5, 1.3, 1.5, STANDING]), 0);
    }

    #[test]
    fn test_bowing_forward_rejected() {
        let config = SquatConfig::default();
        let mut detector = armed();
        let t = detector.update(&config, &metrics(1.0, 0.8), STANDING, DT);
        assert_eq!(t, None);
        assert_eq!(detector.count(), 0);
    }

    #[test]
    fn test_lost_headset_rejected() {
        let config = SquatConfig::default();
        let mut detector = armed();
        let t = detector.update(&config, &metrics(0.0, 0.0), STANDING, DT);
        assert_eq!(t, None);
        assert_eq!(detector.phase(), SquatPhase::ArmedLow);
    }

    #[test]
    fn test_holding_crouch_never_recounts() {
        let config = SquatConfig::default();
        let mut detector = armed();
        // Ten seconds low: well past the cooldown.
        let hold = vec![1.0f32; 600];
        assert_eq!(run(&mut detector, &config, &hold), 1);
        assert_eq!(detector.phase(), SquatPhase::AwaitingReset);
    }

    #[test]
    fn test_glance_or_dropout_in_held_crouch_never_rearms() {
        let config = SquatConfig::default();
        let dt = 0.1;
        let mut detector = armed();
        let low = metrics(1.0, 0.0);

        // Six seconds in the crouch: cooldown fully elapsed.
        for _ in 0..60 {
            detector.update(&config, &low, STANDING, dt);
        }
        assert_eq!(detector.count(), 1);
        assert!(detector.cooldown_elapsed() >= config.cooldown_s);

        // One tick looking at the floor, one tick with tracking lost.
        assert_eq!(detector.update(&config, &metrics(1.0, 0.8), STANDING, dt), None);
        assert_eq!(detector.update(&config, &metrics(0.0, 0.0), STANDING, dt), None);
        assert_eq!(detector.phase(), SquatPhase::AwaitingReset);

        for _ in 0..10 {
            detector.update(&config, &low, STANDING, dt);
        }
        assert_eq!(detector.count(), 1, "held crouch counted twice");
    }

    #[test]
    fn test_reset_bypasses_cooldown() {
        let config = SquatConfig::default();
        let mut detector = armed();
        // Down, up, down again well within 5 seconds.
        let path = [1.0, 1.0, STANDING, 1.0, STANDING];
        assert_eq!(run(&mut detector, &config, &path), 2);
    }

    #[test]
    fn test_no_reset_within_cooldown_counts_once() {
        let config = SquatConfig::default();
        let mut detector = armed();
        // Rise only halfway (outside the reset band) and drop again quickly.
        let path = [1.0, 1.0, 1.4, 1.4, 1.0, 1.0];
        assert_eq!(run(&mut detector, &config, &path), 1);
    }

    #[test]
    fn test_cooldown_rearms_above_depth() {
        let config = SquatConfig {
            cooldown_s: 1.0,
            ..Default::default()
        };
        let mut detector = armed();
        assert_eq!(run(&mut detector, &config, &[1.0]), 1);

        // Partly up for more than the cooldown, never inside the reset band.
        let mut rearmed = false;
        for _ in 0..70 {
            if detector.update(&config, &metrics(1.4, 0.0), STANDING, DT)
                == Some(SquatTransition::CooldownRearm)
            {
                rearmed = true;
            }
        }
        assert!(rearmed, "expected cooldown re-arm");
        assert_eq!(detector.phase(), SquatPhase::ArmedLow);
        assert_eq!(run(&mut detector, &config, &[1.0]), 1);
        assert_eq!(detector.count(), 2);
    }

    #[test]
    fn test_cooldown_timer_restarts_on_detection() {
        let config = SquatConfig::default();
        let mut detector = armed();
        run(&mut detector, &config, &[1.0, 1.4, 1.4]);
        assert!(detector.cooldown_elapsed() > 0.0);
        run(&mut detector, &config, &[STANDING, 1.0]);
        assert_eq!(detector.cooldown_elapsed(), 0.0);
    }
}
