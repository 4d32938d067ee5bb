//! Activity session: one tick of distance tracking, calibration, gesture
//! detection and scoring.
//!
//! `ActivityState::advance` is a pure transition from one state to the next
//! for a given frame.  `ActivityMonitor` owns the current state together
//! with the configuration and a latched calibration request, and is what
//! callers normally drive.
//!
//! A session starts `Settling`: for `activation_delay_s` poses only seed
//! the per-point reference positions, so the jump from wherever tracking
//! started to the play area is never scored.  Calibration requests are
//! rejected until the session is `Active`, and detection begins on the tick
//! after activation.

use tracing::{debug, info, warn};

use super::config::{ActivityConfig, ConfigError};
use super::distance::DistanceAccumulator;
use super::events::ActivityEvent;
use super::jump::{JumpDetector, JumpEdge};
use super::jumping_jack::JumpingJackDetector;
use super::metrics::DerivedMetrics;
use super::posture::PostureReference;
use super::score::{ProgressMeter, ScoreBreakdown, ScoreInputs};
use super::side_lean::{LeanSide, LeanTransition, SideLeanDetector};
use super::squat::{SquatDetector, SquatTransition};
use super::tracking::{PoseFrame, TrackedPoint, POINT_COUNT};

// ── Activation ─────────────────────────────────────────────

/// Session lifecycle gate.
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Activation {
    /// Seeding reference positions; nothing is scored yet.
    Settling { elapsed_s: f64 },
    Active,
}

impl Activation {
    pub fn is_active(&self) -> bool {
        matches!(self, Self::Active)
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Settling { .. } => "settling",
            Self::Active => "active",
        }
    }
}

// ── Indicators ─────────────────────────────────────────────

/// Highlight state for a gesture HUD.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct GestureIndicators {
    /// Lit from a squat until the detector re-arms.
    pub squat: bool,
    /// Seconds left on the jumping-jack highlight.
    pub jumping_jack_remaining_s: f64,
    /// Side of the last lean, cleared on re-arm.
    pub side_lean: Option<LeanSide>,
}

impl GestureIndicators {
    pub fn jumping_jack(&self) -> bool {
        self.jumping_jack_remaining_s > 0.0
    }

    /// Apply one tick's events after decaying timers by `dt_s`.
    fn apply(&mut self, events: &[ActivityEvent], highlight_s: f64, dt_s: f64) {
        self.jumping_jack_remaining_s = (self.jumping_jack_remaining_s - dt_s).max(0.0);
        for event in events {
            match event {
                ActivityEvent::Squat { .. } => self.squat = true,
                ActivityEvent::SquatRearmed => self.squat = false,
                ActivityEvent::JumpingJack { .. } => self.jumping_jack_remaining_s = highlight_s,
                ActivityEvent::SideLean { side, .. } => self.side_lean = Some(*side),
                ActivityEvent::SideLeanRearmed => self.side_lean = None,
                _ => {}
            }
        }
    }

    pub fn to_sexp(&self) -> String {
        format!(
            "(:squat {} :jumping-jack {} :side-lean {})",
            if self.squat { "t" } else { "nil" },
            if self.jumping_jack() { "t" } else { "nil" },
            match self.side_lean {
                Some(side) => format!(":{}", side.as_str()),
                None => "nil".to_string(),
            },
        )
    }
}

// ── Tick report ────────────────────────────────────────────

/// Everything a caller needs from one tick.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    pub events: Vec<ActivityEvent>,
    pub score: ScoreBreakdown,
    pub metrics: DerivedMetrics,
    /// Distance added this tick per tracked point.
    pub distance_added: [f64; POINT_COUNT],
    /// Eased activity-bar fill.
    pub progress: f64,
    pub is_jumping: bool,
    pub active: bool,
}

impl TickReport {
    pub fn events_sexp(&self) -> String {
        let events: Vec<String> = self.events.iter().map(|e| e.to_sexp()).collect();
        format!("({})", events.join(" "))
    }
}

// ── State ──────────────────────────────────────────────────

/// Complete per-session state.  Cloned and replaced each tick.
#[derive(Debug, Clone, PartialEq)]
pub struct ActivityState {
    activation: Activation,
    /// Session clock: sum of all frame deltas.
    clock_s: f64,
    distance: DistanceAccumulator,
    posture: PostureReference,
    squat: SquatDetector,
    jump: JumpDetector,
    jumping_jack: JumpingJackDetector,
    side_lean: SideLeanDetector,
    progress: ProgressMeter,
    indicators: GestureIndicators,
    metrics: DerivedMetrics,
    score: ScoreBreakdown,
}

/// Frame deltas from untrusted sources: negative or non-finite becomes zero.
fn sanitize_dt(dt_s: f64) -> f64 {
    if dt_s.is_finite() && dt_s > 0.0 {
        dt_s
    } else {
        0.0
    }
}

impl ActivityState {
    pub fn new(config: &ActivityConfig) -> Self {
        Self {
            activation: Activation::Settling { elapsed_s: 0.0 },
            clock_s: 0.0,
            distance: DistanceAccumulator::new(),
            posture: PostureReference::new(&config.posture),
            squat: SquatDetector::new(),
            jump: JumpDetector::new(),
            jumping_jack: JumpingJackDetector::new(),
            side_lean: SideLeanDetector::new(),
            progress: ProgressMeter::new(),
            indicators: GestureIndicators::default(),
            metrics: DerivedMetrics::default(),
            score: ScoreBreakdown::default(),
        }
    }

    pub fn activation(&self) -> Activation {
        self.activation
    }

    pub fn is_active(&self) -> bool {
        self.activation.is_active()
    }

    pub fn clock(&self) -> f64 {
        self.clock_s
    }

    pub fn distance(&self) -> &DistanceAccumulator {
        &self.distance
    }

    pub fn posture(&self) -> &PostureReference {
        &self.posture
    }

    pub fn squat(&self) -> &SquatDetector {
        &self.squat
    }

    pub fn jump(&self) -> &JumpDetector {
        &self.jump
    }

    pub fn jumping_jack(&self) -> &JumpingJackDetector {
        &self.jumping_jack
    }

    pub fn side_lean(&self) -> &SideLeanDetector {
        &self.side_lean
    }

    pub fn indicators(&self) -> &GestureIndicators {
        &self.indicators
    }

    /// Metrics from the most recent tick.
    pub fn metrics(&self) -> &DerivedMetrics {
        &self.metrics
    }

    /// Score as of the most recent tick.
    pub fn score(&self) -> &ScoreBreakdown {
        &self.score
    }

    pub fn progress(&self) -> f64 {
        self.progress.fill()
    }

    /// Inputs for the score aggregator.
    pub fn score_inputs(&self) -> ScoreInputs {
        let mut distances = [0.0; POINT_COUNT];
        for point in TrackedPoint::ALL {
            distances[point.index()] = self.distance.cumulative(point);
        }
        ScoreInputs {
            distances,
            squats: self.squat.count(),
            jumping_jacks_from_low: self.jumping_jack.count_from_low(),
            jumping_jacks_from_high: self.jumping_jack.count_from_high(),
            side_leans_left: self.side_lean.count_left(),
            side_leans_right: self.side_lean.count_right(),
        }
    }

    /// Compute the state after `frame`.  `self` is left untouched.
    pub fn advance(&self, config: &ActivityConfig, frame: &PoseFrame) -> (ActivityState, TickReport) {
        let mut next = self.clone();
        let dt_s = sanitize_dt(frame.dt_s);
        next.clock_s += dt_s;

        let mut events = Vec::new();
        let mut distance_added = [0.0; POINT_COUNT];

        match next.activation {
            Activation::Settling { elapsed_s } => {
                for point in TrackedPoint::ALL {
                    next.distance.seed(point, frame.sample(point).position);
                }
                next.metrics = DerivedMetrics::compute(frame, &next.posture);

                if frame.calibrate {
                    let head_height_m = frame.head().height();
                    warn!("Calibration ignored: session still settling");
                    events.push(ActivityEvent::CalibrationRejected { head_height_m });
                }

                let elapsed_s = elapsed_s + dt_s;
                if elapsed_s >= config.session.activation_delay_s {
                    next.activation = Activation::Active;
                    info!("Activity monitor active after {:.2}s", elapsed_s);
                    events.push(ActivityEvent::Activated);
                } else {
                    next.activation = Activation::Settling { elapsed_s };
                }
            }
            Activation::Active => {
                next.step_active(config, frame, dt_s, &mut events, &mut distance_added);
            }
        }

        next.indicators
            .apply(&events, config.session.jumping_jack_highlight_s, dt_s);
        next.score = ScoreBreakdown::compute(&config.score, &next.score_inputs());
        next.progress.update(&config.progress, next.score.total, dt_s);

        if config.session.log_enabled {
            for event in events.iter().filter(|e| e.is_gesture()) {
                info!(
                    "Gesture {} (score {:.0})",
                    event.name(),
                    next.score.total
                );
            }
        }

        let report = TickReport {
            events,
            score: next.score,
            metrics: next.metrics,
            distance_added,
            progress: next.progress.fill(),
            is_jumping: next.jump.is_jumping(),
            active: next.is_active(),
        };
        (next, report)
    }

    fn step_active(
        &mut self,
        config: &ActivityConfig,
        frame: &PoseFrame,
        dt_s: f64,
        events: &mut Vec<ActivityEvent>,
        distance_added: &mut [f64; POINT_COUNT],
    ) {
        for point in TrackedPoint::ALL {
            let step = self
                .distance
                .update(&config.distance, point, frame.sample(point).position);
            distance_added[point.index()] = step.added;
            if let Some(teleport) = step.teleport {
                events.push(ActivityEvent::Teleport {
                    point: teleport.point,
                    displacement_m: teleport.displacement_m,
                });
            }
        }

        if frame.calibrate {
            let head_height_m = frame.head().height();
            match self.posture.calibrate(head_height_m) {
                Some(standing_height_m) => {
                    events.push(ActivityEvent::Calibrated { standing_height_m })
                }
                None => events.push(ActivityEvent::CalibrationRejected { head_height_m }),
            }
        }

        let m = DerivedMetrics::compute(frame, &self.posture);
        self.metrics = m;

        match self
            .squat
            .update(&config.squat, &m, self.posture.standing_height(), dt_s)
        {
            Some(SquatTransition::Detected { count }) => events.push(ActivityEvent::Squat { count }),
            Some(SquatTransition::Reset) | Some(SquatTransition::CooldownRearm) => {
                events.push(ActivityEvent::SquatRearmed)
            }
            None => {}
        }

        match self.jump.update(&config.jump, m.height_delta, self.clock_s) {
            Some(JumpEdge::TakeOff) => events.push(ActivityEvent::JumpStarted),
            Some(JumpEdge::Landed { at_s }) => events.push(ActivityEvent::JumpLanded { at_s }),
            None => {}
        }

        if let Some(done) = self.jumping_jack.update(
            &config.jumping_jack,
            &m,
            self.jump.is_jumping(),
            self.jump.last_landing(),
            self.clock_s,
        ) {
            events.push(ActivityEvent::JumpingJack {
                entry: done.entry,
                count: done.count,
            });
        }

        match self.side_lean.update(&config.side_lean, &m) {
            Some(LeanTransition::Detected { side, count }) => {
                events.push(ActivityEvent::SideLean { side, count })
            }
            Some(LeanTransition::Rearmed) => events.push(ActivityEvent::SideLeanRearmed),
            None => {}
        }
    }

    /// Generate IPC status s-expression.
    pub fn status_sexp(&self) -> String {
        format!(
            "(:activation :{} :clock {:.3} :standing-height {:.3} :calibrated {} \
             :distance (:left-hand {:.1} :right-hand {:.1} :head {:.1}) \
             :squat (:phase :{} :count {} :cooldown {:.2}) \
             :jumping {} \
             :jumping-jack (:phase :{} :from-low {} :from-high {}) \
             :side-lean (:armed {} :left {} :right {}) \
             :indicators {} :progress {:.3} :metrics {} :score {})",
            self.activation.as_str(),
            self.clock_s,
            self.posture.standing_height(),
            if self.posture.is_calibrated() { "t" } else { "nil" },
            self.distance.cumulative(TrackedPoint::LeftHand),
            self.distance.cumulative(TrackedPoint::RightHand),
            self.distance.cumulative(TrackedPoint::Head),
            self.squat.phase().as_str(),
            self.squat.count(),
            self.squat.cooldown_elapsed(),
            if self.jump.is_jumping() { "t" } else { "nil" },
            self.jumping_jack.phase().as_str(),
            self.jumping_jack.count_from_low(),
            self.jumping_jack.count_from_high(),
            if self.side_lean.is_armed() { "t" } else { "nil" },
            self.side_lean.count_left(),
            self.side_lean.count_right(),
            self.indicators.to_sexp(),
            self.progress.fill(),
            self.metrics.to_sexp(),
            self.score.to_sexp(),
        )
    }
}

// ── Monitor ────────────────────────────────────────────────

/// Stateful driver around `ActivityState::advance`.
pub struct ActivityMonitor {
    config: ActivityConfig,
    state: ActivityState,
    /// Calibration requested out of band, applied on the next tick.
    pending_calibration: bool,
}

impl ActivityMonitor {
    /// Create a monitor.  The config is assumed valid; see
    /// `ActivityConfig::validate`.
    pub fn new(config: ActivityConfig) -> Self {
        let state = ActivityState::new(&config);
        Self {
            config,
            state,
            pending_calibration: false,
        }
    }

    pub fn config(&self) -> &ActivityConfig {
        &self.config
    }

    pub fn state(&self) -> &ActivityState {
        &self.state
    }

    pub fn is_active(&self) -> bool {
        self.state.is_active()
    }

    pub fn score(&self) -> &ScoreBreakdown {
        self.state.score()
    }

    /// Run one tick.
    pub fn update(&mut self, frame: &PoseFrame) -> TickReport {
        let frame = frame.with_calibrate(frame.calibrate || self.pending_calibration);
        self.pending_calibration = false;
        let (next, report) = self.state.advance(&self.config, &frame);
        self.state = next;
        report
    }

    /// Latch a calibration for the next tick.
    pub fn request_calibration(&mut self) {
        debug!("Calibration requested");
        self.pending_calibration = true;
    }

    pub fn has_pending_calibration(&self) -> bool {
        self.pending_calibration
    }

    /// Start a new session with the current config.
    pub fn reset(&mut self) {
        info!(
            "Activity session reset (final score {:.0})",
            self.state.score().total
        );
        self.state = ActivityState::new(&self.config);
        self.pending_calibration = false;
    }

    /// Replace the config if it validates; the session continues.
    pub fn set_config(&mut self, config: ActivityConfig) -> Result<(), ConfigError> {
        config.validate()?;
        self.config = config;
        info!("Activity config updated");
        Ok(())
    }

    pub fn status_sexp(&self) -> String {
        self.state.status_sexp()
    }

    pub fn config_sexp(&self) -> String {
        self.config.config_sexp()
    }
}

impl Default for ActivityMonitor {
    fn default() -> Self {
        Self::new(ActivityConfig::default())
    }
}

// ── Tests ──────────────────────────────────────────────────
