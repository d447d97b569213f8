// ── Expiry arithmetic ──
//
// All pass time math happens on absolute UTC instants. Display layers
// localize the rendered string, never the arithmetic.

use chrono::{DateTime, SecondsFormat, TimeDelta, Utc};

/// Validity window of every visitor pass, in seconds.
pub const PASS_VALIDITY_SECS: i64 = 1800;

/// Validity window of every visitor pass.
pub fn pass_validity() -> TimeDelta {
    TimeDelta::seconds(PASS_VALIDITY_SECS)
}

/// The expiry instant of a pass created at `created_at`.
pub fn expires_at(created_at: DateTime<Utc>) -> DateTime<Utc> {
    created_at + pass_validity()
}

/// Render an instant as RFC 3339 with a `Z` designator.
///
/// Whole seconds print without a fraction (`2024-01-01T00:30:00Z`);
/// sub-second precision is kept when present so the value round-trips.
pub fn format_instant(instant: DateTime<Utc>) -> String {
    instant.to_rfc3339_opts(SecondsFormat::AutoSi, true)
}

/// Parse an RFC 3339 instant in any offset, normalized to UTC.
///
/// Returns `None` on anything unparseable; callers treat that as expired.
pub fn parse_instant(raw: &str) -> Option<DateTime<Utc>> {
    DateTime::parse_from_rfc3339(raw.trim())
        .ok()
        .map(|t| t.with_timezone(&Utc))
}

/// Time left until `expires_at`, clamped at zero.
pub fn remaining(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> TimeDelta {
    (expires_at - now).max(TimeDelta::zero())
}

/// Whole seconds left until `expires_at`, rounded up.
///
/// Rounding up keeps the display and the expiry check in agreement: the
/// value is `0` exactly when `now >= expires_at`.
pub fn remaining_secs(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> u64 {
    let left = remaining(expires_at, now);
    let whole = left.num_seconds();
    let ceil = if left.subsec_nanos() > 0 { whole + 1 } else { whole };
    u64::try_from(ceil).unwrap_or(0)
}

/// Seconds left for a persisted expiry string. Malformed input is expired.
pub fn remaining_secs_str(expires_at: &str, now: DateTime<Utc>) -> u64 {
    parse_instant(expires_at).map_or(0, |t| remaining_secs(t, now))
}

/// Returns `true` once `now` has reached `expires_at`.
pub fn is_expired(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> bool {
    now >= expires_at
}
