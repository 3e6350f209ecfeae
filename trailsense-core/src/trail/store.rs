use std::sync::Arc;

use arc_swap::ArcSwap;

use super::Snapshot;

/// Process-wide, read-mostly trail dictionary.
///
/// Many readers, one writer, no locks on the read path: readers take a
/// single atomic load ([`TrailStore::current`]) and hold that `Arc` for the
/// duration of one packet's processing, so a concurrent [`TrailStore::install`]
/// never tears a reader's view — they simply keep using the snapshot they
/// already loaded.
#[derive(Debug)]
pub struct TrailStore {
    current: ArcSwap<Snapshot>,
}

impl Default for TrailStore {
    fn default() -> Self {
        Self::new()
    }
}

impl TrailStore {
    pub fn new() -> Self {
        Self { current: ArcSwap::from_pointee(Snapshot::default()) }
    }

    /// Install `snapshot` as the current snapshot. Never mutates the
    /// previous snapshot in place — old readers keep their own `Arc`.
    pub fn install(&self, snapshot: Snapshot) {
        self.current.store(Arc::new(snapshot));
    }

    /// One atomic load. Callers should hold the returned `Arc` for the
    /// duration of processing a single frame and not reload mid-packet.
    pub fn current(&self) -> Arc<Snapshot> {
        self.current.load_full()
    }

    pub fn is_installed(&self) -> bool {
        !self.current().is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::trail::{SnapshotBuilder, Trail, TrailKind};

    #[test]
    fn starts_empty() {
        let store = TrailStore::new();
        assert!(!store.is_installed());
        assert!(store.current().is_empty());
    }

    #[test]
    fn install_is_visible_to_new_readers() {
        let store = TrailStore::new();
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Ip, "1.2.3.4", Trail::new("badhost", "feedA"));
        store.install(b.build());

        let snap = store.current();
        assert!(snap.contains(TrailKind::Ip, "1.2.3.4"));
        assert!(!snap.contains(TrailKind::Ip, "9.9.9.9"));
    }

    #[test]
    fn reader_holding_old_snapshot_is_unaffected_by_later_install() {
        let store = TrailStore::new();
        let mut b1 = SnapshotBuilder::new();
        b1.insert(TrailKind::Ip, "1.1.1.1", Trail::new("old", "old-src"));
        store.install(b1.build());

        let held = store.current();

        let mut b2 = SnapshotBuilder::new();
        b2.insert(TrailKind::Ip, "2.2.2.2", Trail::new("new", "new-src"));
        store.install(b2.build());

        // `held` is untouched: still the first snapshot.
        assert!(held.contains(TrailKind::Ip, "1.1.1.1"));
        assert!(!held.contains(TrailKind::Ip, "2.2.2.2"));

        let fresh = store.current();
        assert!(fresh.contains(TrailKind::Ip, "2.2.2.2"));
        assert!(!fresh.contains(TrailKind::Ip, "1.1.1.1"));
    }

    #[test]
    fn installing_equal_snapshot_is_observationally_a_noop() {
        let store = TrailStore::new();
        let mut b = SnapshotBuilder::new();
        b.insert(TrailKind::Dns, "bad.example", Trail::new("pY", "sY"));
        store.install(b.build());

        let mut b2 = SnapshotBuilder::new();
        b2.insert(TrailKind::Dns, "bad.example", Trail::new("pY", "sY"));
        store.install(b2.build());

        let snap = store.current();
        assert!(snap.contains(TrailKind::Dns, "bad.example"));
        assert_eq!(snap.len(), 1);
    }
}
