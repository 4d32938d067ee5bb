//! IPC message dispatch: parse s-expressions and route to handlers.

use lexpr::Value;
use tracing::{debug, warn};

use crate::activity::{ActivityMonitor, PoseFrame, PoseSample, TrackedPoint};

/// Protocol version spoken by this server.
pub const PROTOCOL_VERSION: i64 = 1;

/// Monitor plus per-stream bookkeeping.
pub struct ControlState {
    pub monitor: ActivityMonitor,
    /// Pose frames processed since startup.
    pub frames: u64,
    /// Events emitted since startup.
    pub events: u64,
    /// Events produced by the most recent message.
    pub last_message_events: usize,
}

impl ControlState {
    pub fn new(monitor: ActivityMonitor) -> Self {
        Self {
            monitor,
            frames: 0,
            events: 0,
            last_message_events: 0,
        }
    }
}

/// Parse an s-expression message and dispatch to the appropriate handler.
/// Returns an optional response string (s-expression).
pub fn handle_message(state: &mut ControlState, raw: &str) -> Option<String> {
    state.last_message_events = 0;

    let value = match lexpr::from_str(raw) {
        Ok(v) => v,
        Err(e) => {
            warn!("malformed s-expression: {}", e);
            return Some(error_response(0, &format!("malformed s-expression: {e}")));
        }
    };

    let msg_type = get_keyword(&value, "type");
    let msg_id = get_int(&value, "id").unwrap_or(0);

    match msg_type.as_deref() {
        Some("hello") => handle_hello(msg_id, &value),
        Some("pose-frame") => handle_pose_frame(state, msg_id, &value),
        Some("activity-calibrate") => handle_activity_calibrate(state, msg_id),
        Some("activity-status") => handle_activity_status(state, msg_id),
        Some("activity-score") => handle_activity_score(state, msg_id),
        Some("activity-config") => handle_activity_config(state, msg_id, &value),
        Some("activity-reset") => handle_activity_reset(state, msg_id),
        Some(other) => {
            debug!("unknown message type: {}", other);
            Some(error_response(msg_id, &format!("unknown message type: {other}")))
        }
        None => Some(error_response(msg_id, "missing :type")),
    }
}

fn handle_hello(msg_id: i64, value: &Value) -> Option<String> {
    let version = get_int(value, "version").unwrap_or(PROTOCOL_VERSION);
    if version != PROTOCOL_VERSION {
        return Some(error_response(
            msg_id,
            &format!("unsupported protocol version: {version}"),
        ));
    }
    let client_name = get_string(value, "client").unwrap_or_else(|| "unknown".to_string());
    debug!(client = %client_name, "hello handshake");

    Some(format!(
        "(:type :hello :id {} :version {} :server \"activity-monitor\" :server-version \"{}\")",
        msg_id,
        PROTOCOL_VERSION,
        env!("CARGO_PKG_VERSION")
    ))
}

fn handle_pose_frame(state: &mut ControlState, msg_id: i64, value: &Value) -> Option<String> {
    let frame = match parse_pose_frame(value) {
        Ok(f) => f,
        Err(reason) => return Some(error_response(msg_id, &reason)),
    };

    let report = state.monitor.update(&frame);
    state.frames += 1;
    state.events += report.events.len() as u64;
    state.last_message_events = report.events.len();

    Some(format!(
        "(:type :response :id {} :status :ok :active {} :jumping {} :progress {:.3} :events {} :score {})",
        msg_id,
        if report.active { "t" } else { "nil" },
        if report.is_jumping { "t" } else { "nil" },
        report.progress,
        report.events_sexp(),
        report.score.to_sexp()
    ))
}

/// Build a `PoseFrame` from a `pose-frame` plist.
fn parse_pose_frame(value: &Value) -> Result<PoseFrame, String> {
    let dt_s = get_float(value, "dt").ok_or("missing :dt")?;
    let left = get_vec3(value, "left").ok_or("missing or malformed :left")?;
    let right = get_vec3(value, "right").ok_or("missing or malformed :right")?;
    let head_position = get_vec3(value, "head").ok_or("missing or malformed :head")?;

    let mut head = PoseSample::new(TrackedPoint::Head, head_position);
    if get_value(value, "head-forward").is_some() {
        let forward = get_vec3(value, "head-forward").ok_or("malformed :head-forward")?;
        head = head.with_forward(forward);
    }
    if let Some(roll) = get_float(value, "head-roll") {
        head = head.with_roll(roll as f32);
    }
    let calibrate = get_bool(value, "calibrate").unwrap_or(false);

    Ok(PoseFrame::new(dt_s, left, right, head).with_calibrate(calibrate))
}

fn handle_activity_calibrate(state: &mut ControlState, msg_id: i64) -> Option<String> {
    state.monitor.request_calibration();
    Some(format!(
        "(:type :response :id {} :status :ok :pending t :active {})",
        msg_id,
        if state.monitor.is_active() { "t" } else { "nil" }
    ))
}

fn handle_activity_status(state: &mut ControlState, msg_id: i64) -> Option<String> {
    let status = state.monitor.status_sexp();
    Some(format!(
        "(:type :response :id {} :status :ok :activity {})",
        msg_id, status
    ))
}

fn handle_activity_score(state: &mut ControlState, msg_id: i64) -> Option<String> {
    Some(format!(
        "(:type :response :id {} :status :ok :score {} :progress {:.3})",
        msg_id,
        state.monitor.score().to_sexp(),
        state.monitor.state().progress()
    ))
}

fn handle_activity_config(state: &mut ControlState, msg_id: i64, value: &Value) -> Option<String> {
    let mut config = state.monitor.config().clone();

    if let Some(v) = get_float(value, "movement-threshold") {
        config.distance.movement_threshold_m = v as f32;
    }
    if let Some(v) = get_float(value, "teleport-threshold") {
        config.distance.teleport_threshold_m = v as f32;
    }
    if let Some(v) = get_float(value, "movement-to-distance") {
        config.distance.movement_to_distance = v;
    }
    if let Some(v) = get_float(value, "default-standing-height") {
        config.posture.default_standing_height_m = v as f32;
    }
    if let Some(v) = get_float(value, "squat-depth-fraction") {
        config.squat.depth_fraction = v as f32;
    }
    if let Some(v) = get_float(value, "squat-pitch-threshold") {
        config.squat.pitch_threshold = v as f32;
    }
    if let Some(v) = get_float(value, "squat-reset-band") {
        config.squat.reset_band_m = v as f32;
    }
    if let Some(v) = get_float(value, "squat-cooldown") {
        config.squat.cooldown_s = v;
    }
    if let Some(v) = get_float(value, "jump-height-threshold") {
        config.jump.height_threshold_m = v as f32;
    }
    if let Some(v) = get_float(value, "jj-hands-symmetry") {
        config.jumping_jack.hands_symmetry_tolerance_m = v as f32;
    }
    if let Some(v) = get_float(value, "jj-low-height-cap") {
        config.jumping_jack.low_height_cap_m = v as f32;
    }
    if let Some(v) = get_float(value, "jj-high-height-floor") {
        config.jumping_jack.high_height_floor_m = v as f32;
    }
    if let Some(v) = get_float(value, "jj-timing-window") {
        config.jumping_jack.timing_window_s = v;
    }
    if let Some(v) = get_float(value, "lean-left-min") {
        config.side_lean.left_roll_min_deg = v as f32;
    }
    if let Some(v) = get_float(value, "lean-left-max") {
        config.side_lean.left_roll_max_deg = v as f32;
    }
    if let Some(v) = get_float(value, "lean-right-min") {
        config.side_lean.right_roll_min_deg = v as f32;
    }
    if let Some(v) = get_float(value, "lean-right-max") {
        config.side_lean.right_roll_max_deg = v as f32;
    }
    if let Some(v) = get_float(value, "lean-hand-raise") {
        config.side_lean.hand_raise_threshold_m = v as f32;
    }
    if let Some(v) = get_float(value, "lean-neutral") {
        config.side_lean.neutral_roll_deg = v as f32;
    }
    if let Some(v) = get_float(value, "lean-rearm-tolerance") {
        config.side_lean.rearm_hand_tolerance_m = v as f32;
    }
    if let Some(v) = get_float(value, "distance-points") {
        config.score.distance_points_per_unit = v;
    }
    if let Some(v) = get_int(value, "squat-points") {
        match u32::try_from(v) {
            Ok(points) => config.score.points_per_squat = points,
            Err(_) => return Some(error_response(msg_id, &format!(":squat-points out of range: {v}"))),
        }
    }
    if let Some(v) = get_int(value, "jumping-jack-points") {
        match u32::try_from(v) {
            Ok(points) => config.score.points_per_jumping_jack = points,
            Err(_) => return Some(error_response(msg_id, &format!(":jumping-jack-points out of range: {v}"))),
        }
    }
    if let Some(v) = get_int(value, "side-lean-points") {
        match u32::try_from(v) {
            Ok(points) => config.score.points_per_side_lean = points,
            Err(_) => return Some(error_response(msg_id, &format!(":side-lean-points out of range: {v}"))),
        }
    }
    if let Some(v) = get_float(value, "points-for-full-bar") {
        config.progress.points_for_full_bar = v;
    }
    if let Some(v) = get_float(value, "progress-speed") {
        config.progress.smoothing_speed = v;
    }
    if let Some(v) = get_float(value, "activation-delay") {
        config.session.activation_delay_s = v;
    }
    if let Some(v) = get_float(value, "jumping-jack-highlight") {
        config.session.jumping_jack_highlight_s = v;
    }
    if let Some(v) = get_bool(value, "log-enabled") {
        config.session.log_enabled = v;
    }

    if let Err(e) = state.monitor.set_config(config) {
        warn!("activity-config rejected: {}", e);
        return Some(error_response(msg_id, &e.to_string()));
    }

    Some(format!(
        "(:type :response :id {} :status :ok :config {})",
        msg_id,
        state.monitor.config_sexp()
    ))
}

fn handle_activity_reset(state: &mut ControlState, msg_id: i64) -> Option<String> {
    state.monitor.reset();
    Some(ok_response(msg_id))
}

// ── Helpers ────────────────────────────────────────────────

fn ok_response(id: i64) -> String {
    format!("(:type :response :id {} :status :ok)", id)
}

fn error_response(id: i64, reason: &str) -> String {
    format!(
        "(:type :response :id {} :status :error :reason \"{}\")",
        id,
        escape_string(reason)
    )
}

/// Escape a string for s-expression output.
fn escape_string(s: &str) -> String {
    s.replace('\\', "\\\\").replace('"', "\\\"")
}

/// Find the value following `:key` in an s-expression plist.
/// Handles both `Value::Keyword("key")` (elisp parser) and
/// `Value::Symbol(":key")` (default parser) forms.
fn get_value<'a>(value: &'a Value, key: &str) -> Option<&'a Value> {
    let prefixed = format!(":{}", key);
    let mut current = value;
    while let Value::Cons(pair) = current {
        let is_key = match pair.car() {
            Value::Keyword(k) => k.as_ref() == key,
            Value::Symbol(s) => s.as_ref() == prefixed,
            _ => false,
        };
        if is_key {
            return match pair.cdr() {
                Value::Cons(next) => Some(next.car()),
                _ => None,
            };
        }
        current = pair.cdr();
    }
    None
}

/// Extract a keyword value from an s-expression plist as a string.
fn get_keyword(value: &Value, key: &str) -> Option<String> {
    let val = get_value(value, key)?;
    Some(match val {
        Value::Keyword(v) => v.to_string(),
        Value::Symbol(v) => {
            let s = v.to_string();
            s.strip_prefix(':').unwrap_or(&s).to_string()
        }
        Value::String(v) => v.to_string(),
        Value::Number(n) => n.to_string(),
        Value::Bool(b) => (if *b { "t" } else { "nil" }).to_string(),
        Value::Null => "nil".to_string(),
        _ => val.to_string(),
    })
}

/// Extract an integer value from an s-expression plist.
fn get_int(value: &Value, key: &str) -> Option<i64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a string value from an s-expression plist.
fn get_string(value: &Value, key: &str) -> Option<String> {
    get_keyword(value, key)
}

/// Extract a boolean value from an s-expression plist.
/// Treats "t" as true, "nil" as false.
fn get_bool(value: &Value, key: &str) -> Option<bool> {
    get_keyword(value, key).map(|s| s != "nil")
}

/// Extract a floating-point value from an s-expression plist.
fn get_float(value: &Value, key: &str) -> Option<f64> {
    get_keyword(value, key).and_then(|s| s.parse().ok())
}

/// Extract a three-element numeric list such as `(0.1 1.6 -0.2)`.
fn get_vec3(value: &Value, key: &str) -> Option<[f32; 3]> {
    let list = get_value(value, key)?;
    let items = flatten_list(list);
    if items.len() != 3 {
        return None;
    }
    let mut out = [0.0f32; 3];
    for (slot, item) in out.iter_mut().zip(items) {
        *slot = item.as_f64()? as f32;
    }
    Some(out)
}

/// Flatten a possibly nested list/cons structure into a Vec of leaf values.
fn flatten_list(value: &Value) -> Vec<&Value> {
    let mut result = Vec::new();
    fn walk<'a>(v: &'a Value, out: &mut Vec<&'a Value>) {
        match v {
            Value::Cons(pair) => {
                walk(pair.car(), out);
                walk(pair.cdr(), out);
            }
            Value::Null => {} // end of list
            other => out.push(other),
        }
    }
    walk(value, &mut result);
    result
}
