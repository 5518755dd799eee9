//! Shared time and id helpers.

use std::time::{SystemTime, UNIX_EPOCH};

/// Timestamp in milliseconds since UNIX epoch.
#[inline]
pub(crate) fn now_ms() -> i64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_millis() as i64)
        .unwrap_or(0)
}

/// Timestamp in fractional seconds since UNIX epoch.
/// Used for broadcast event and request timestamps.
#[inline]
pub(crate) fn now_secs() -> f64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs_f64())
        .unwrap_or(0.0)
}

/// Generate a simple unique id based on current time in nanoseconds.
/// Sufficient for tagging speech requests and subscriptions.
#[inline]
pub(crate) fn gen_id() -> String {
    let nanos = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos())
        .unwrap_or(0);
    format!("{:x}", nanos)
}
