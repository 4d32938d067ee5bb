//! Tracked body points and per-tick pose samples.
//!
//! Models the three points a VR rig reports every frame (left controller,
//! right controller, headset) and the small amount of vector math the
//! detectors need.  Positions are in tracking-space meters, Y up.

// ── Tracked points ─────────────────────────────────────────

/// One of the three monitored body locations.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrackedPoint {
    LeftHand,
    RightHand,
    Head,
}

/// Total number of tracked points.
pub const POINT_COUNT: usize = 3;

impl TrackedPoint {
    /// All points in index order.
    pub const ALL: [TrackedPoint; POINT_COUNT] =
        [Self::LeftHand, Self::RightHand, Self::Head];

    /// Convert point enum to array index (0-2).
    pub fn index(&self) -> usize {
        *self as usize
    }

    /// String representation for IPC and logging.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::LeftHand => "left-hand",
            Self::RightHand => "right-hand",
            Self::Head => "head",
        }
    }

    /// Parse a point from its string representation.
    pub fn from_str(s: &str) -> Option<Self> {
        match s {
            "left-hand" => Some(Self::LeftHand),
            "right-hand" => Some(Self::RightHand),
            "head" => Some(Self::Head),
            _ => None,
        }
    }
}

// ── Pose sample ────────────────────────────────────────────

/// World "down" direction.
pub const DOWN: [f32; 3] = [0.0, -1.0, 0.0];

/// Forward direction of a level, untilted head.
pub const FORWARD: [f32; 3] = [0.0, 0.0, 1.0];

/// Pose of a single tracked point captured at one tick.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseSample {
    /// Which point this sample belongs to.
    pub point: TrackedPoint,
    /// Position in meters (x, y, z).
    pub position: [f32; 3],
    /// Unit forward direction.
    pub forward: [f32; 3],
    /// Heading (roll) angle in degrees, wrapped to [0, 360).
    pub roll_deg: f32,
}

impl PoseSample {
    /// Sample at `position`, facing forward with zero roll.
    pub fn new(point: TrackedPoint, position: [f32; 3]) -> Self {
        Self {
            point,
            position,
            forward: FORWARD,
            roll_deg: 0.0,
        }
    }

    /// Set the forward direction.  Normalized on the way in.
    pub fn with_forward(mut self, forward: [f32; 3]) -> Self {
        self.forward = normalize(forward);
        self
    }

    /// Set the roll angle.  Any value is wrapped to [0, 360).
    pub fn with_roll(mut self, roll_deg: f32) -> Self {
        self.roll_deg = wrap_degrees(roll_deg);
        self
    }

    /// Height above the tracking floor.
    pub fn height(&self) -> f32 {
        self.position[1]
    }
}

// ── Pose frame ─────────────────────────────────────────────

/// Everything the monitor consumes for one discrete time step.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PoseFrame {
    /// Seconds elapsed since the previous frame.
    pub dt_s: f64,
    /// Samples indexed by `TrackedPoint::index`.
    pub samples: [PoseSample; POINT_COUNT],
    /// Calibration button pressed during this frame.
    pub calibrate: bool,
}

impl PoseFrame {
    pub fn new(dt_s: f64, left_hand: [f32; 3], right_hand: [f32; 3], head: PoseSample) -> Self {
        Self {
            dt_s,
            samples: [
                PoseSample::new(TrackedPoint::LeftHand, left_hand),
                PoseSample::new(TrackedPoint::RightHand, right_hand),
                PoseSample {
                    point: TrackedPoint::Head,
                    ..head
                },
            ],
            calibrate: false,
        }
    }

    /// Mark this frame as carrying a calibration trigger.
    pub fn with_calibrate(mut self, calibrate: bool) -> Self {
        self.calibrate = calibrate;
        self
    }

    /// Sample for a given point.
    pub fn sample(&self, point: TrackedPoint) -> &PoseSample {
        &self.samples[point.index()]
    }

    pub fn head(&self) -> &PoseSample {
        self.sample(TrackedPoint::Head)
    }

    pub fn left_hand(&self) -> &PoseSample {
        self.sample(TrackedPoint::LeftHand)
    }

    pub fn right_hand(&self) -> &PoseSample {
        self.sample(TrackedPoint::RightHand)
    }
}

// ── Vector helpers ─────────────────────────────────────────

/// Euclidean distance between two 3D points.
pub fn point_distance(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    let dx = b[0] - a[0];
    let dy = b[1] - a[1];
    let dz = b[2] - a[2];
    (dx * dx + dy * dy + dz * dz).sqrt()
}

/// Dot product of two 3D vectors.
pub fn dot(a: &[f32; 3], b: &[f32; 3]) -> f32 {
    a[0] * b[0] + a[1] * b[1] + a[2] * b[2]
}

/// Unit vector in the direction of `v`, or `v` unchanged if degenerate.
pub fn normalize(v: [f32; 3]) -> [f32; 3] {
    let len = dot(&v, &v).sqrt();
    if len <= f32::EPSILON {
        return v;
    }
    [v[0] / len, v[1] / len, v[2] / len]
}

/// Wrap an angle in degrees to [0, 360).
pub fn wrap_degrees(deg: f32) -> f32 {
    let wrapped = deg.rem_euclid(360.0);
    // rem_euclid can round up to exactly 360.0 for tiny negative inputs
    if wrapped >= 360.0 {
        0.0
    } else {
        wrapped
    }
}

// ── Tests ──────────────────────────────────────────────────
