// ── Reactive pass streams ──
//
// Subscription handle for consuming pass list changes from the PassStore.

use std::pin::Pin;
use std::sync::Arc;
use std::task::{Context, Poll};

use chrono::{DateTime, Utc};
use futures_core::Stream;
use tokio::sync::watch;
use tokio_stream::wrappers::WatchStream;

use crate::model::VisitorPass;

type Snapshot = Arc<Vec<Arc<VisitorPass>>>;

/// A subscription to the held pass list.
///
/// Provides both point-in-time snapshot access and change notification
/// via [`changed()`](Self::changed) or by converting to a `Stream`.
pub struct PassStream {
    current: Snapshot,
    receiver: watch::Receiver<Snapshot>,
}

impl PassStream {
    pub(crate) fn new(receiver: watch::Receiver<Snapshot>) -> Self {
        let current = receiver.borrow().clone();
        Self { current, receiver }
    }

    /// The snapshot captured at creation (or the last `changed()`).
    pub fn current(&self) -> &Snapshot {
        &self.current
    }

    /// The latest snapshot (may have changed since creation).
    pub fn latest(&self) -> Snapshot {
        self.receiver.borrow().clone()
    }

    /// Passes in the latest snapshot that are still active at `now`.
    pub fn active_at(&self, now: DateTime<Utc>) -> Vec<Arc<VisitorPass>> {
        self.latest().iter().filter(|p| p.is_active(now)).cloned().collect()
    }

    /// Wait for the next change, returning the new snapshot.
    /// Returns `None` if the store has been dropped.
    pub async fn changed(&mut self) -> Option<Snapshot> {
        self.receiver.changed().await.ok()?;
        let snap = self.receiver.borrow_and_update().clone();
        self.current = snap.clone();
        Some(snap)
    }

    /// Convert into a `Stream` for use with `StreamExt` combinators.
    pub fn into_stream(self) -> PassWatchStream {
        PassWatchStream {
            inner: WatchStream::new(self.receiver),
        }
    }
}

/// `Stream` adapter yielding a new snapshot each time the store mutates.
pub struct PassWatchStream {
    inner: WatchStream<Snapshot>,
}

impl Stream for PassWatchStream {
    type Item = Snapshot;

    fn poll_next(mut self: Pin<&mut Self>, cx: &mut Context<'_>) -> Poll<Option<Self::Item>> {
        Pin::new(&mut self.inner).poll_next(cx)
    }
}
