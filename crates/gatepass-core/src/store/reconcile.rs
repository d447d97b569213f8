// ── Reconciliation with server truth ──
//
// Upsert everything the backend lists, then prune what it no longer
// lists. This avoids the brief empty state a clear-then-insert causes.

use std::collections::HashSet;

use chrono::{DateTime, Utc};
use tracing::debug;

use super::PassStore;
use crate::model::{PassId, VisitorPass};

/// What a reconcile pass changed.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct ReconcileReport {
    pub upserted: usize,
    pub removed: usize,
    /// Listed by the backend but skipped because they were cancelled here.
    pub suppressed: usize,
}

impl PassStore {
    /// Replace local state with the backend's active list.
    ///
    /// Locally cancelled passes stay hidden until the backend drops them.
    /// Incoming passes that are already expired at `now` are not inserted.
    /// A local pass without a backend id is replaced by the listed pass
    /// with the same code.
    pub fn reconcile(&self, incoming: Vec<VisitorPass>, now: DateTime<Utc>) -> ReconcileReport {
        let mut report = ReconcileReport::default();
        let listed: HashSet<PassId> = incoming.iter().map(|p| p.id.clone()).collect();

        // Tombstones the backend has caught up with are no longer needed.
        self.cancelled.retain(|id, _| listed.contains(id));

        let mut upserts = Vec::with_capacity(incoming.len());
        let mut keep: HashSet<PassId> = HashSet::with_capacity(incoming.len());
        for pass in incoming {
            if self.cancelled.contains_key(&pass.id) {
                report.suppressed += 1;
                continue;
            }
            if !pass.is_active(now) {
                continue;
            }
            keep.insert(pass.id.clone());
            upserts.push(pass);
        }

        let removals: Vec<PassId> = self
            .passes
            .ids()
            .into_iter()
            .filter(|id| !keep.contains(id))
            .collect();

        report.upserted = upserts.len();
        report.removed = removals.len();
        self.passes.apply(upserts, &removals);

        debug!(
            upserted = report.upserted,
            removed = report.removed,
            suppressed = report.suppressed,
            "reconciled pass store"
        );
        report
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::lifecycle::parse_instant;

    fn t(raw: &str) -> DateTime<Utc> {
        parse_instant(raw).unwrap()
    }

    fn remote(id: &str, code: &str) -> VisitorPass {
        let mut p = VisitorPass::draft(code, None, t("2024-01-01T00:00:00Z")).unwrap();
        p.id = PassId::from(id);
        p
    }

    #[test]
    fn upserts_listed_and_prunes_missing() {
        let store = PassStore::new();
        store.insert(remote("a", "AAAAAA"));
        store.insert(remote("b", "BBBBBB"));

        let report = store.reconcile(
            vec![remote("b", "BBBBBB"), remote("c", "CCCCCC")],
            t("2024-01-01T00:05:00Z"),
        );

        assert_eq!(report, ReconcileReport { upserted: 2, removed: 1, suppressed: 0 });
        assert!(store.get(&PassId::from("a")).is_none());
        assert!(store.get(&PassId::from("c")).is_some());
    }

    #[test]
    fn cancelled_passes_are_not_resurrected() {
        let store = PassStore::new();
        store.insert(remote("a", "AAAAAA"));
        store.mark_cancelled(&PassId::from("a"), t("2024-01-01T00:01:00Z"));

        let report = store.reconcile(vec![remote("a", "AAAAAA")], t("2024-01-01T00:02:00Z"));
        assert_eq!(report.suppressed, 1);
        assert!(store.is_empty());

        // Backend caught up: the tombstone is released.
        store.reconcile(Vec::new(), t("2024-01-01T00:03:00Z"));
        assert!(!store.is_cancelled(&PassId::from("a")));
    }

    #[test]
    fn expired_listings_are_skipped() {
        let store = PassStore::new();
        let report = store.reconcile(vec![remote("a", "AAAAAA")], t("2024-01-01T00:45:00Z"));
        assert_eq!(report.upserted, 0);
        assert!(store.is_empty());
    }

    #[test]
    fn local_draft_is_replaced_by_listed_pass_with_same_code() {
        let store = PassStore::new();
        let draft = VisitorPass::draft("K7P2QX", None, t("2024-01-01T00:00:00Z")).unwrap();
        store.insert(draft);

        store.reconcile(vec![remote("p1", "K7P2QX")], t("2024-01-01T00:01:00Z"));
        assert_eq!(store.len(), 1);
        assert_eq!(store.find_by_code("K7P2QX").unwrap().id, PassId::from("p1"));
    }
}
