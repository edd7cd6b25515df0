//! Shared timestamp/event helpers.

use serde_json::Value as JsonValue;
use ulid::Ulid;

/// Returns unix-epoch seconds with `Z` suffix (e.g. `1771220592Z`).
pub fn now_epoch_z() -> String {
    format!("{}Z", now_secs())
}

fn now_secs() -> u64 {
    use std::time::{SystemTime, UNIX_EPOCH};
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap_or_default()
        .as_secs()
}

/// Parse an `<secs>Z` timestamp. Other formats yield `None`.
pub fn parse_epoch_z(ts: &str) -> Option<u64> {
    ts.strip_suffix('Z')?.parse().ok()
}

/// Timestamp for a new write: now, but never earlier than `prev`.
pub fn next_timestamp(prev: Option<&str>) -> String {
    let now = now_secs();
    let floor = prev.and_then(parse_epoch_z).unwrap_or(0);
    format!("{}Z", now.max(floor))
}

pub fn new_event_id() -> String {
    Ulid::new().to_string()
}

/// Standard command response envelope used by `--format json` surfaces.
pub fn command_envelope(cmd: &str, status: &str, extra: JsonValue) -> JsonValue {
    let mut base = serde_json::json!({
        "envelope_version": "1.0.0",
        "ts": now_epoch_z(),
        "event_id": new_event_id(),
        "cmd": cmd,
        "status": status
    });
    if let (Some(base_obj), Some(extra_obj)) = (base.as_object_mut(), extra.as_object()) {
        for (k, v) in extra_obj {
            base_obj.insert(k.clone(), v.clone());
        }
    }
    base
}
