//! Events emitted by the activity monitor for presentation layers.

use super::jumping_jack::JackEntry;
use super::side_lean::LeanSide;
use super::tracking::TrackedPoint;

/// Everything observable that happened during one tick.
#[derive(Debug, Clone, PartialEq)]
pub enum ActivityEvent {
    /// Settle interval elapsed; scoring begins next tick.
    Activated,
    /// Standing height baseline overwritten.
    Calibrated { standing_height_m: f32 },
    /// Calibration trigger ignored (head not tracked, or still settling).
    CalibrationRejected { head_height_m: f32 },
    /// A tracked point jumped further than physically plausible.
    Teleport {
        point: TrackedPoint,
        displacement_m: f32,
    },
    Squat { count: u32 },
    /// Squat detector ready for another squat.
    SquatRearmed,
    JumpStarted,
    JumpLanded { at_s: f64 },
    JumpingJack { entry: JackEntry, count: u32 },
    SideLean { side: LeanSide, count: u32 },
    SideLeanRearmed,
}

impl ActivityEvent {
    /// Event name used in IPC.
    pub fn name(&self) -> &'static str {
        match self {
            Self::Activated => "activity-activated",
            Self::Calibrated { .. } => "activity-calibrated",
            Self::CalibrationRejected { .. } => "activity-calibration-rejected",
            Self::Teleport { .. } => "activity-teleport",
            Self::Squat { .. } => "squat",
            Self::SquatRearmed => "squat-rearmed",
            Self::JumpStarted => "jump-started",
            Self::JumpLanded { .. } => "jump-landed",
            Self::JumpingJack { .. } => "jumping-jack",
            Self::SideLean { .. } => "side-lean",
            Self::SideLeanRearmed => "side-lean-rearmed",
        }
    }

    /// Whether this event changed a gesture count.
    pub fn is_gesture(&self) -> bool {
        matches!(
            self,
            Self::Squat { .. } | Self::JumpingJack { .. } | Self::SideLean { .. }
        )
    }

    /// Convert the event to an IPC s-expression.
    pub fn to_sexp(&self) -> String {
        let head = format!("(:type :event :event :{}", self.name());
        match self {
            Self::Activated
            | Self::SquatRearmed
            | Self::JumpStarted
            | Self::SideLeanRearmed => format!("{})", head),
            Self::Calibrated { standing_height_m } => {
                format!("{} :standing-height {:.3})", head, standing_height_m)
            }
            Self::CalibrationRejected { head_height_m } => {
                format!("{} :head-height {:.3})", head, head_height_m)
            }
            Self::Teleport {
                point,
                displacement_m,
            } => format!(
                "{} :point :{} :displacement {:.3})",
                head,
                point.as_str(),
                displacement_m
            ),
            Self::Squat { count } => format!("{} :count {})", head, count),
            Self::JumpLanded { at_s } => format!("{} :at {:.3})", head, at_s),
            Self::JumpingJack { entry, count } => {
                format!("{} :entry :{} :count {})", head, entry.as_str(), count)
            }
            Self::SideLean { side, count } => {
                format!("{} :side :{} :count {})", head, side.as_str(), count)
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_event_sexp() {
        let evt = ActivityEvent::Teleport {
            point: TrackedPoint::Head,
            displacement_m: 2.5,
        };
        let sexp = evt.to_sexp();
        assert!(sexp.contains(":event :activity-teleport"));
        assert!(sexp.contains(":point :head"));
        assert!(sexp.contains(":displacement 2.500"));

        let evt = ActivityEvent::JumpingJack {
            entry: JackEntry::FromHigh,
            count: 4,
        };
        let sexp = evt.to_sexp();
        assert!(sexp.contains(":event :jumping-jack"));
        assert!(sexp.contains(":entry :from-high :count 4"));

        assert_eq!(
            ActivityEvent::Activated.to_sexp(),
            "(:type :event :event :activity-activated)"
        );
    }

    #[test]
    fn test_every_event_is_valid_sexp() {
        let events = vec![
            ActivityEvent::Activated,
            ActivityEvent::Calibrated {
                standing_height_m: 1.62,
            },
            ActivityEvent::CalibrationRejected { head_height_m: 0.0 },
            ActivityEvent::Teleport {
                point: TrackedPoint::LeftHand,
                displacement_m: 1.2,
            },
            ActivityEvent::Squat { count: 1 },
            ActivityEvent::SquatRearmed,
            ActivityEvent::JumpStarted,
            ActivityEvent::JumpLanded { at_s: 3.25 },
            ActivityEvent::JumpingJack {
                entry: JackEntry::FromLow,
                count: 1,
            },
            ActivityEvent::SideLean {
                side: LeanSide::Right,
                count: 2,
            },
            ActivityEvent::SideLeanRearmed,
        ];
        for evt in &events {
            let sexp = evt.to_sexp();
            assert!(lexpr::from_str(&sexp).is_ok(), "invalid sexp: {}", sexp);
        }
        assert_eq!(events.iter().filter(|e| e.is_gesture()).count(), 3);
    }
}
