//! Per-point travel distance with noise filtering and teleport rejection.
//!
//! Each tracked point accumulates the distance between consecutive accepted
//! positions.  Steps under the noise floor are ignored without moving the
//! reference position, so slow motion is still counted once it adds up.
//! Steps over the teleport threshold are reported and dropped.

use serde::Deserialize;
use tracing::warn;

use super::tracking::{point_distance, TrackedPoint, POINT_COUNT};

// ── Config ─────────────────────────────────────────────────

/// Thresholds for distance accrual.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(default)]
pub struct DistanceConfig {
    /// Minimum single-step displacement (meters) counted as movement.
    pub movement_threshold_m: f32,
    /// Displacement (meters) above which a step is treated as a teleport.
    pub teleport_threshold_m: f32,
    /// Tracking meters to reported distance units (100.0 = centimeters).
    pub movement_to_distance: f64,
}

impl Default for DistanceConfig {
    fn default() -> Self {
        Self {
            movement_threshold_m: 0.1,
            teleport_threshold_m: 1.0,
            movement_to_distance: 100.0,
        }
    }
}

// ── Teleport guard ─────────────────────────────────────────

/// Diagnostic for a non-physical jump of a tracked point.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct TeleportEvent {
    pub point: TrackedPoint,
    /// Single-step displacement in meters.
    pub displacement_m: f32,
}

/// Classifies single-step displacements as teleports.
#[derive(Debug, Clone, Copy)]
pub struct TeleportGuard {
    pub threshold_m: f32,
}

impl TeleportGuard {
    pub fn new(threshold_m: f32) -> Self {
        Self { threshold_m }
    }

    /// Report a teleport if `displacement_m` is above the threshold.
    pub fn check(&self, point: TrackedPoint, displacement_m: f32) -> Option<TeleportEvent> {
        if displacement_m > self.threshold_m {
            Some(TeleportEvent {
                point,
                displacement_m,
            })
        } else {
            None
        }
    }
}

// ── Per-point state ────────────────────────────────────────

/// Reference position and running distance for one tracked point.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct PointTrackingState {
    /// Last accepted position, `None` until seeded.
    pub previous_position: Option<[f32; 3]>,
    /// Accumulated distance in configured units.  Never decreases.
    pub cumulative_distance: f64,
}

/// Result of feeding one position to the accumulator.
#[derive(Debug, Clone, Copy, Default, PartialEq)]
pub struct DistanceStep {
    /// Distance units added this tick.
    pub added: f64,
    pub teleport: Option<TeleportEvent>,
}

// ── Accumulator ────────────────────────────────────────────

/// Travel distance for all tracked points.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DistanceAccumulator {
    points: [PointTrackingState; POINT_COUNT],
}

impl DistanceAccumulator {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the reference position without accruing anything.
    pub fn seed(&mut self, point: TrackedPoint, position: [f32; 3]) {
        self.points[point.index()].previous_position = Some(position);
    }

    /// Measure the step from the reference position to `position`.
    pub fn update(
        &mut self,
        config: &DistanceConfig,
        point: TrackedPoint,
        position: [f32; 3],
    ) -> DistanceStep {
        let state = &mut self.points[point.index()];
        let prev = match state.previous_position {
            Some(p) => p,
            None => {
                state.previous_position = Some(position);
                return DistanceStep::default();
            }
        };

        let displacement = point_distance(&prev, &position);

        let guard = TeleportGuard::new(config.teleport_threshold_m);
        if let Some(teleport) = guard.check(point, displacement) {
            // Measure the next tick from the new location.
            state.previous_position = Some(position);
            warn!(
                "Teleport: {} moved {:.2}m in one tick",
                point.as_str(),
                displacement
            );
            return DistanceStep {
                added: 0.0,
                teleport: Some(teleport),
            };
        }

        if displacement > config.movement_threshold_m {
            let added = displacement as f64 * config.movement_to_distance;
            state.cumulative_distance += added;
            state.previous_position = Some(position);
            return DistanceStep {
                added,
                teleport: None,
            };
        }

        DistanceStep::default()
    }

    /// Tracking state for one point.
    pub fn state(&self, point: TrackedPoint) -> &PointTrackingState {
        &self.points[point.index()]
    }

    /// Accumulated distance for one point.
    pub fn cumulative(&self, point: TrackedPoint) -> f64 {
        self.points[point.index()].cumulative_distance
    }

    /// Sum over all points.
    pub fn total(&self) -> f64 {
        self.points.iter().map(|p| p.cumulative_distance).sum()
    }
}

// ── Tests ──────────────────────────────────────────────────
