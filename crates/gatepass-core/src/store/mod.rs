// ── Local pass store ──
//
// A cache of server truth. Local changes (create, cancel, expiry sweep)
// apply immediately; `reconcile` folds in the backend's active list.

mod collection;
mod reconcile;

use std::sync::Arc;

use chrono::{DateTime, Utc};
use dashmap::DashMap;
use tracing::debug;

use crate::model::{PassId, VisitorPass};
use crate::stream::PassStream;

use collection::PassCollection;
pub use reconcile::ReconcileReport;

/// Reactive store of the passes this client is displaying.
pub struct PassStore {
    passes: PassCollection,
    /// Passes cancelled locally, kept until the backend stops listing them
    /// so a refresh cannot resurrect them.
    cancelled: DashMap<PassId, DateTime<Utc>>,
}

impl PassStore {
    pub fn new() -> Self {
        Self {
            passes: PassCollection::new(),
            cancelled: DashMap::new(),
        }
    }

    /// Insert or replace a pass. Returns `true` if it was new.
    pub fn insert(&self, pass: VisitorPass) -> bool {
        self.passes.upsert(pass)
    }

    pub fn remove(&self, id: &PassId) -> Option<Arc<VisitorPass>> {
        self.passes.remove(id)
    }

    /// Optimistic cancel: drop the pass and remember it was cancelled.
    pub fn mark_cancelled(&self, id: &PassId, now: DateTime<Utc>) -> Option<Arc<VisitorPass>> {
        self.cancelled.insert(id.clone(), now);
        self.passes.remove(id)
    }

    pub fn is_cancelled(&self, id: &PassId) -> bool {
        self.cancelled.contains_key(id)
    }

    pub fn get(&self, id: &PassId) -> Option<Arc<VisitorPass>> {
        self.passes.get(id)
    }

    pub fn find_by_code(&self, code: &str) -> Option<Arc<VisitorPass>> {
        self.passes.get_by_code(code)
    }

    /// Resolve a user-supplied identifier: an id first, then a code.
    pub fn resolve(&self, identifier: &str) -> Option<Arc<VisitorPass>> {
        self.get(&PassId::from(identifier))
            .or_else(|| self.find_by_code(identifier))
    }

    /// Every held pass, soonest expiry first.
    pub fn snapshot(&self) -> Arc<Vec<Arc<VisitorPass>>> {
        self.passes.snapshot()
    }

    /// Passes still active at `now`, soonest expiry first.
    pub fn active(&self, now: DateTime<Utc>) -> Vec<Arc<VisitorPass>> {
        self.snapshot()
            .iter()
            .filter(|p| p.is_active(now))
            .cloned()
            .collect()
    }

    pub fn subscribe(&self) -> PassStream {
        PassStream::new(self.passes.subscribe())
    }

    /// Drop every pass whose computed status is no longer active.
    /// Returns the ids removed.
    pub fn sweep_expired(&self, now: DateTime<Utc>) -> Vec<PassId> {
        let stale: Vec<PassId> = self
            .snapshot()
            .iter()
            .filter(|p| !p.is_active(now))
            .map(|p| p.id.clone())
            .collect();

        if !stale.is_empty() {
            self.passes.apply(Vec::new(), &stale);
            debug!(removed = stale.len(), "swept expired passes");
        }
        stale
    }

    pub fn len(&self) -> usize {
        self.passes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.passes.is_empty()
    }

    pub fn clear(&self) {
        self.passes.clear();
        self.cancelled.clear();
    }
}

impl Default for PassStore {
    fn default() -> Self {
        Self::new()
    }
}
