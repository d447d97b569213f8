// ── Reactive pass collection ──
//
// Lock-free concurrent storage with O(1) lookups by id and by code, and
// push-based change notification via `watch` channels.

use std::sync::Arc;

use dashmap::DashMap;
use tokio::sync::watch;

use crate::model::{PassId, VisitorPass};

/// Every mutation bumps a version counter and rebuilds the snapshot that
/// subscribers receive.
pub(crate) struct PassCollection {
    /// Primary storage.
    by_id: DashMap<PassId, Arc<VisitorPass>>,

    /// Secondary index: upper-case code -> id.
    code_to_id: DashMap<String, PassId>,

    /// Version counter, bumped on every mutation.
    version: watch::Sender<u64>,

    /// Full snapshot, rebuilt on mutation, ordered by expiry (soonest first).
    snapshot: watch::Sender<Arc<Vec<Arc<VisitorPass>>>>,
}

impl PassCollection {
    pub(crate) fn new() -> Self {
        let (version, _) = watch::channel(0u64);
        let (snapshot, _) = watch::channel(Arc::new(Vec::new()));

        Self {
            by_id: DashMap::new(),
            code_to_id: DashMap::new(),
            version,
            snapshot,
        }
    }

    /// Insert or update a pass. Returns `true` if the id was new.
    pub(crate) fn upsert(&self, pass: VisitorPass) -> bool {
        let is_new = self.upsert_quiet(pass);
        self.publish();
        is_new
    }

    /// Apply a batch of upserts and removals, notifying subscribers once.
    pub(crate) fn apply(&self, upserts: Vec<VisitorPass>, removals: &[PassId]) {
        for pass in upserts {
            self.upsert_quiet(pass);
        }
        for id in removals {
            self.remove_quiet(id);
        }
        self.publish();
    }

    /// Remove a pass by id. Returns the removed pass if it existed.
    pub(crate) fn remove(&self, id: &PassId) -> Option<Arc<VisitorPass>> {
        let removed = self.remove_quiet(id);
        if removed.is_some() {
            self.publish();
        }
        removed
    }

    pub(crate) fn get(&self, id: &PassId) -> Option<Arc<VisitorPass>> {
        self.by_id.get(id).map(|r| Arc::clone(r.value()))
    }

    /// Look up a pass by its access code (case-insensitive).
    pub(crate) fn get_by_code(&self, code: &str) -> Option<Arc<VisitorPass>> {
        let id = self.code_to_id.get(&code.to_ascii_uppercase())?;
        self.get(id.value())
    }

    /// Get the current snapshot (cheap `Arc` clone).
    pub(crate) fn snapshot(&self) -> Arc<Vec<Arc<VisitorPass>>> {
        self.snapshot.borrow().clone()
    }

    /// Subscribe to snapshot changes via a `watch::Receiver`.
    pub(crate) fn subscribe(&self) -> watch::Receiver<Arc<Vec<Arc<VisitorPass>>>> {
        self.snapshot.subscribe()
    }

    pub(crate) fn version(&self) -> u64 {
        *self.version.borrow()
    }

    /// Remove all passes.
    pub(crate) fn clear(&self) {
        self.by_id.clear();
        self.code_to_id.clear();
        self.publish();
    }

    pub(crate) fn len(&self) -> usize {
        self.by_id.len()
    }

    pub(crate) fn is_empty(&self) -> bool {
        self.by_id.is_empty()
    }

    /// All current ids.
    pub(crate) fn ids(&self) -> Vec<PassId> {
        self.by_id.iter().map(|r| r.key().clone()).collect()
    }

    // ── Private helpers ──────────────────────────────────────────────

    fn upsert_quiet(&self, pass: VisitorPass) -> bool {
        let code = pass.code.to_ascii_uppercase();

        // Clean up the stale code mapping if this id used to carry another code.
        if let Some(old) = self.by_id.get(&pass.id) {
            let old_code = old.code.to_ascii_uppercase();
            if old_code != code {
                self.code_to_id.remove(&old_code);
            }
        }

        let id = pass.id.clone();
        let is_new = self.by_id.insert(id.clone(), Arc::new(pass)).is_none();
        self.code_to_id.insert(code, id);
        is_new
    }

    fn remove_quiet(&self, id: &PassId) -> Option<Arc<VisitorPass>> {
        let (_, removed) = self.by_id.remove(id)?;
        self.code_to_id
            .remove_if(&removed.code.to_ascii_uppercase(), |_, mapped| mapped == id);
        Some(removed)
    }

    /// Rebuild the ordered snapshot, broadcast it, and bump the version.
    fn publish(&self) {
        let mut values: Vec<Arc<VisitorPass>> =
            self.by_id.iter().map(|r| Arc::clone(r.value())).collect();
        // Unparseable expiries sort first: they are already expired.
        values.sort_by(|a, b| a.expires_at.cmp(&b.expires_at).then_with(|| a.code.cmp(&b.code)));
        // `send_modify` updates unconditionally, even with zero receivers.
        self.snapshot.send_modify(|snap| *snap = Arc::new(values));
        self.version.send_modify(|v| *v += 1);
    }
}
