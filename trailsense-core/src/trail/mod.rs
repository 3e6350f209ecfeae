//! The trail store: an immutable, atomically-swappable snapshot of known-bad
//! IPs, DNS names, and URLs, plus the periodic updater that refreshes it.

mod snapshot;
mod store;
mod updater;

pub use snapshot::{Snapshot, SnapshotBuilder, Trail, TrailKind};
pub use store::TrailStore;
pub use updater::{load_trails, update, TrailUpdater};
