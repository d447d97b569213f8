// ── Shared display ticker ──
//
// One timer for every displayed pass. The tick task stamps the current
// instant into a `watch` channel; subscribers wake, read the instant, and
// re-derive their views. Subscribing is cheap and dropping the receiver is
// the whole unsubscribe.

use std::sync::{Arc, Mutex, PoisonError};
use std::time::Duration;

use chrono::{DateTime, TimeDelta, Utc};
use tokio::sync::watch;
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::trace;

/// Source of "now" for everything time-dependent in this crate.
pub trait Clock: Send + Sync + 'static {
    fn now(&self) -> DateTime<Utc>;
}

/// Wall clock.
#[derive(Debug, Clone, Copy, Default)]
pub struct SystemClock;

impl Clock for SystemClock {
    fn now(&self) -> DateTime<Utc> {
        Utc::now()
    }
}

/// A clock that only moves when told to. Clones share the same instant.
#[derive(Debug, Clone)]
pub struct ManualClock {
    now: Arc<Mutex<DateTime<Utc>>>,
}

impl ManualClock {
    pub fn new(start: DateTime<Utc>) -> Self {
        Self {
            now: Arc::new(Mutex::new(start)),
        }
    }

    pub fn set(&self, instant: DateTime<Utc>) {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner) = instant;
    }

    pub fn advance(&self, by: TimeDelta) {
        let mut guard = self.now.lock().unwrap_or_else(PoisonError::into_inner);
        *guard += by;
    }
}

impl Clock for ManualClock {
    fn now(&self) -> DateTime<Utc> {
        *self.now.lock().unwrap_or_else(PoisonError::into_inner)
    }
}

// ── Ticker ───────────────────────────────────────────────────────────

/// Broadcasts the current instant to any number of subscribers.
pub struct Ticker {
    clock: Arc<dyn Clock>,
    tx: watch::Sender<DateTime<Utc>>,
}

impl Ticker {
    pub fn new(clock: Arc<dyn Clock>) -> Self {
        let (tx, _) = watch::channel(clock.now());
        Self { clock, tx }
    }

    /// Subscribe to ticks. The receiver starts at the latest stamped instant.
    pub fn subscribe(&self) -> TickReceiver {
        TickReceiver {
            rx: self.tx.subscribe(),
        }
    }

    /// Number of live subscriptions.
    pub fn subscriber_count(&self) -> usize {
        self.tx.receiver_count()
    }

    /// Stamp the clock's current instant and wake every subscriber.
    pub fn tick(&self) -> DateTime<Utc> {
        let now = self.clock.now();
        // `send_replace` updates unconditionally, even with zero receivers.
        self.tx.send_replace(now);
        now
    }

    /// The last stamped instant.
    pub fn last(&self) -> DateTime<Utc> {
        *self.tx.borrow()
    }

    /// Spawn the tick loop. It stops when `cancel` fires.
    pub fn spawn(self: &Arc<Self>, period: Duration, cancel: CancellationToken) -> JoinHandle<()> {
        let ticker = Arc::clone(self);
        tokio::spawn(async move {
            let mut interval = tokio::time::interval(period);
            interval.set_missed_tick_behavior(tokio::time::MissedTickBehavior::Skip);

            loop {
                tokio::select! {
                    biased;
                    () = cancel.cancelled() => break,
                    _ = interval.tick() => {
                        let now = ticker.tick();
                        trace!(%now, subscribers = ticker.subscriber_count(), "tick");
                    }
                }
            }
        })
    }
}

/// One subscription to a [`Ticker`].
#[derive(Debug, Clone)]
pub struct TickReceiver {
    rx: watch::Receiver<DateTime<Utc>>,
}

impl TickReceiver {
    /// The most recent tick, without waiting.
    pub fn latest(&self) -> DateTime<Utc> {
        *self.rx.borrow()
    }

    /// Wait for the next tick. Returns `None` once the ticker is gone.
    pub async fn next(&mut self) -> Option<DateTime<Utc>> {
        self.rx.changed().await.ok()?;
        Some(*self.rx.borrow_and_update())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lifecycle::{countdown_stream, expires_at, parse_instant};
    use futures_util::StreamExt;

    fn start() -> DateTime<Utc> {
        parse_instant("2024-01-01T00:00:00Z").unwrap()
    }

    #[test]
    fn manual_clock_clones_share_time() {
        let clock = ManualClock::new(start());
        let other = clock.clone();
        clock.advance(TimeDelta::seconds(90));
        assert_eq!(other.now(), parse_instant("2024-01-01T00:01:30Z").unwrap());
    }

    #[tokio::test]
    async fn subscribers_see_each_tick() {
        let clock = ManualClock::new(start());
        let ticker = Ticker::new(Arc::new(clock.clone()));
        let mut a = ticker.subscribe();
        let mut b = ticker.subscribe();
        assert_eq!(ticker.subscriber_count(), 2);

        clock.advance(TimeDelta::seconds(1));
        ticker.tick();

        let expected = parse_instant("2024-01-01T00:00:01Z").unwrap();
        assert_eq!(a.next().await, Some(expected));
        assert_eq!(b.next().await, Some(expected));

        drop(b);
        assert_eq!(ticker.subscriber_count(), 1);
    }

    #[tokio::test]
    async fn receiver_ends_when_ticker_drops() {
        let ticker = Ticker::new(Arc::new(ManualClock::new(start())));
        let mut rx = ticker.subscribe();
        drop(ticker);
        assert_eq!(rx.next().await, None);
    }

    #[tokio::test(start_paused = true)]
    async fn spawned_ticker_stops_on_cancel() {
        let ticker = Arc::new(Ticker::new(Arc::new(SystemClock)));
        let cancel = CancellationToken::new();
        let handle = ticker.spawn(Duration::from_secs(1), cancel.clone());

        let mut rx = ticker.subscribe();
        tokio::time::advance(Duration::from_secs(3)).await;
        assert!(rx.next().await.is_some());

        cancel.cancel();
        handle.await.unwrap();
    }

    #[tokio::test]
    async fn countdown_stream_runs_to_expiry_and_stops() {
        let created = start();
        let clock = ManualClock::new(created + TimeDelta::seconds(1797));
        let ticker = Ticker::new(Arc::new(clock.clone()));
        ticker.tick();

        let stream = countdown_stream(Some(expires_at(created)), ticker.subscribe());
        tokio::pin!(stream);

        assert_eq!(stream.next().await.unwrap().display, "00:03");

        clock.advance(TimeDelta::seconds(2));
        ticker.tick();
        assert_eq!(stream.next().await.unwrap().display, "00:01");

        clock.advance(TimeDelta::seconds(5));
        ticker.tick();
        let last = stream.next().await.unwrap();
        assert!(last.is_expired());

        assert!(stream.next().await.is_none(), "stream ends after expiry");
    }
}
