// ── Countdown / status engine ──
//
// Every view is re-derived from `expires_at` and the current instant.
// Nothing counts down a stored number, so a suspended or backgrounded
// process shows the right value on its next tick.

use chrono::{DateTime, Utc};
use futures_core::Stream;
use serde::{Deserialize, Serialize};

use super::expiry::{parse_instant, remaining_secs};
use crate::ticker::TickReceiver;

/// Token shown instead of `MM:SS` once a pass has run out.
pub const EXPIRED_LABEL: &str = "Expired";

/// At or above this many seconds left, a pass is [`UrgencyTier::Success`].
pub const SUCCESS_THRESHOLD_SECS: u64 = 10 * 60;

/// At or above this many seconds left (and below success), a pass is
/// [`UrgencyTier::Warning`].
pub const WARNING_THRESHOLD_SECS: u64 = 5 * 60;

/// Colour-coding tier of a running pass.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
    strum::EnumString,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum UrgencyTier {
    Success,
    Warning,
    Danger,
}

/// Lifecycle phase of a running pass. Only ever moves forward.
#[derive(
    Debug,
    Clone,
    Copy,
    PartialEq,
    Eq,
    PartialOrd,
    Ord,
    Hash,
    Serialize,
    Deserialize,
    strum::Display,
)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Phase {
    Counting,
    Warning,
    Danger,
    Expired,
}

/// Everything a display needs for one pass at one instant.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CountdownView {
    pub remaining_seconds: u64,
    pub display: String,
    pub tier: UrgencyTier,
    pub phase: Phase,
}

impl CountdownView {
    pub fn is_expired(&self) -> bool {
        self.phase == Phase::Expired
    }
}

/// Tier for a number of seconds left.
pub fn urgency_tier(remaining_secs: u64) -> UrgencyTier {
    if remaining_secs >= SUCCESS_THRESHOLD_SECS {
        UrgencyTier::Success
    } else if remaining_secs >= WARNING_THRESHOLD_SECS {
        UrgencyTier::Warning
    } else {
        UrgencyTier::Danger
    }
}

/// Phase for a number of seconds left.
pub fn phase(remaining_secs: u64) -> Phase {
    if remaining_secs == 0 {
        return Phase::Expired;
    }
    match urgency_tier(remaining_secs) {
        UrgencyTier::Success => Phase::Counting,
        UrgencyTier::Warning => Phase::Warning,
        UrgencyTier::Danger => Phase::Danger,
    }
}

/// `MM:SS`, or [`EXPIRED_LABEL`] at zero.
pub fn format_remaining(remaining_secs: u64) -> String {
    if remaining_secs == 0 {
        return EXPIRED_LABEL.to_owned();
    }
    format!("{:02}:{:02}", remaining_secs / 60, remaining_secs % 60)
}

/// View for a known number of seconds left.
pub fn view_for_secs(remaining_seconds: u64) -> CountdownView {
    CountdownView {
        remaining_seconds,
        display: format_remaining(remaining_seconds),
        tier: urgency_tier(remaining_seconds),
        phase: phase(remaining_seconds),
    }
}

/// View of a pass expiring at `expires_at`, observed at `now`.
pub fn countdown(expires_at: DateTime<Utc>, now: DateTime<Utc>) -> CountdownView {
    view_for_secs(remaining_secs(expires_at, now))
}

/// View for a persisted expiry string. Unparseable input shows as expired.
pub fn countdown_str(expires_at: &str, now: DateTime<Utc>) -> CountdownView {
    parse_instant(expires_at).map_or_else(|| view_for_secs(0), |t| countdown(t, now))
}

// ── Latching tracker ─────────────────────────────────────────────────

/// Countdown state for one displayed pass.
///
/// The pure functions above follow the wall clock wherever it goes. A
/// tracker additionally never reports more time than it already reported,
/// so a clock stepped backwards cannot revive an expired pass or move a
/// pass to a calmer tier.
#[derive(Debug, Clone)]
pub struct CountdownTracker {
    expires_at: Option<DateTime<Utc>>,
    floor: Option<u64>,
}

impl CountdownTracker {
    /// Track a pass expiring at `expires_at`. `None` means the expiry was
    /// unreadable; such a tracker starts and stays expired.
    pub fn new(expires_at: Option<DateTime<Utc>>) -> Self {
        Self {
            expires_at,
            floor: None,
        }
    }

    pub fn expires_at(&self) -> Option<DateTime<Utc>> {
        self.expires_at
    }

    /// Recompute the view at `now`.
    pub fn observe(&mut self, now: DateTime<Utc>) -> CountdownView {
        let fresh = self.expires_at.map_or(0, |t| remaining_secs(t, now));
        let secs = self.floor.map_or(fresh, |floor| fresh.min(floor));
        self.floor = Some(secs);
        view_for_secs(secs)
    }

    /// Returns `true` once the tracker has reported expiry.
    pub fn is_expired(&self) -> bool {
        self.floor == Some(0)
    }
}

/// Stream of views for one pass, one per tick, ending with the expired view.
///
/// Many passes can share one [`Ticker`](crate::ticker::Ticker); each stream
/// only holds a receiver, so dropping the stream releases the subscription.
pub fn countdown_stream(
    expires_at: Option<DateTime<Utc>>,
    mut ticks: TickReceiver,
) -> impl Stream<Item = CountdownView> {
    async_stream::stream! {
        let mut tracker = CountdownTracker::new(expires_at);
        let mut now = ticks.latest();
        loop {
            let view = tracker.observe(now);
            let done = view.is_expired();
            yield view;
            if done {
                break;
            }
            match ticks.next().await {
                Some(t) => now = t,
                None => break,
            }
        }
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lifecycle::expiry::expires_at;
    use chrono::TimeDelta;

    fn at(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).unwrap()
    }

    #[test]
    fn tier_boundaries() {
        assert_eq!(urgency_tier(10 * 60), UrgencyTier::Success);
        assert_eq!(urgency_tier(9 * 60 + 59), UrgencyTier::Warning);
        assert_eq!(urgency_tier(5 * 60), UrgencyTier::Warning);
        assert_eq!(urgency_tier(4 * 60 + 59), UrgencyTier::Danger);
        assert_eq!(urgency_tier(0), UrgencyTier::Danger);
    }

    #[test]
    fn display_format() {
        assert_eq!(format_remaining(1800), "30:00");
        assert_eq!(format_remaining(300), "05:00");
        assert_eq!(format_remaining(61), "01:01");
        assert_eq!(format_remaining(1), "00:01");
        assert_eq!(format_remaining(0), EXPIRED_LABEL);
    }

    #[test]
    fn scenario_from_creation_to_expiry() {
        let created = at("2024-01-01T00:00:00Z");
        let exp = expires_at(created);

        let fresh = countdown(exp, created);
        assert_eq!(fresh.display, "30:00");
        assert_eq!(fresh.phase, Phase::Counting);

        let late = countdown(exp, at("2024-01-01T00:25:00Z"));
        assert_eq!(late.display, "05:00");
        assert_eq!(late.tier, UrgencyTier::Warning);

        let later = countdown(exp, at("2024-01-01T00:25:01Z"));
        assert_eq!(later.display, "04:59");
        assert_eq!(later.tier, UrgencyTier::Danger);

        let gone = countdown(exp, at("2024-01-01T00:30:01Z"));
        assert_eq!(gone.display, EXPIRED_LABEL);
        assert_eq!(gone.tier, UrgencyTier::Danger);
        assert!(gone.is_expired());
    }

    #[test]
    fn phases_only_move_forward() {
        let created = at("2024-01-01T00:00:00Z");
        let exp = expires_at(created);
        let mut last = Phase::Counting;
        for s in 0..=1810 {
            let p = countdown(exp, created + TimeDelta::seconds(s)).phase;
            assert!(p >= last, "phase went from {last} back to {p} at {s}s");
            last = p;
        }
        assert_eq!(last, Phase::Expired);
    }

    #[test]
    fn malformed_expiry_renders_expired() {
        let view = countdown_str("2024-13-45T99:00:00Z", at("2024-01-01T00:00:00Z"));
        assert!(view.is_expired());
        assert_eq!(view.tier, UrgencyTier::Danger);
    }

    #[test]
    fn tracker_ignores_backwards_clock_steps() {
        let created = at("2024-01-01T00:00:00Z");
        let mut tracker = CountdownTracker::new(Some(expires_at(created)));

        assert_eq!(tracker.observe(at("2024-01-01T00:31:00Z")).display, EXPIRED_LABEL);
        assert!(tracker.is_expired());

        let after_step_back = tracker.observe(at("2024-01-01T00:10:00Z"));
        assert!(after_step_back.is_expired());
    }

    #[test]
    fn tracker_without_expiry_is_expired() {
        let mut tracker = CountdownTracker::new(None);
        assert!(tracker.observe(at("2024-01-01T00:00:00Z")).is_expired());
    }

    #[test]
    fn tier_parses_from_its_display_name() {
        assert_eq!("warning".parse::<UrgencyTier>().unwrap(), UrgencyTier::Warning);
        assert_eq!(UrgencyTier::Danger.to_string(), "danger");
    }
}
