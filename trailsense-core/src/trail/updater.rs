use std::path::Path;
use std::time::Duration;

use tracing::{debug, error, warn};

use super::snapshot::{Snapshot, SnapshotBuilder, Trail, TrailKind};
use super::store::TrailStore;

/// Classify a raw trail key into its namespace the same way the feed format
/// does: a dotted-quad is `IP`, a key containing `/` (or starting with one)
/// is `URL`, anything else is `DNS`. This mirrors the heuristic used by the
/// feed files this sensor's collaborators produce; the feed format itself
/// is out of scope (spec §6) — only this in-memory classification matters.
fn classify_key(key: &str) -> TrailKind {
    if key.parse::<std::net::Ipv4Addr>().is_ok() {
        TrailKind::Ip
    } else if key.starts_with('/') || key.contains('/') {
        TrailKind::Url
    } else {
        TrailKind::Dns
    }
}

/// Parse a trail table in the simple `key,indicator,source` line format
/// shared by [`update`] and [`load_trails`]. Blank lines and lines starting
/// with `#` are ignored. Malformed lines are skipped, not fatal.
fn parse_table(text: &str) -> Snapshot {
    let mut builder = SnapshotBuilder::new();
    for line in text.lines() {
        let line = line.trim();
        if line.is_empty() || line.starts_with('#') {
            continue;
        }
        let mut parts = line.splitn(3, ',');
        let (Some(key), Some(indicator), Some(source)) =
            (parts.next(), parts.next(), parts.next())
        else {
            continue;
        };
        let kind = classify_key(key);
        builder.insert(kind, key.to_string(), Trail::new(indicator, source));
    }
    builder.build()
}

/// Fetch a fresh trail table from `server`. Returns `None` (never an error)
/// on any network/parse failure or an empty table — per spec §4.1/§7, TU
/// fetch failures are silently retried on the next tick, never fatal.
pub async fn update(server: &str) -> Option<Snapshot> {
    let resp = match reqwest::get(server).await {
        Ok(r) => r,
        Err(e) => {
            warn!(error = %e, server, "trail update fetch failed");
            return None;
        }
    };
    let text = match resp.text().await {
        Ok(t) => t,
        Err(e) => {
            warn!(error = %e, server, "trail update body read failed");
            return None;
        }
    };
    let snapshot = parse_table(&text);
    if snapshot.is_empty() {
        debug!(server, "trail update returned an empty table");
        return None;
    }
    Some(snapshot)
}

/// Load a locally cached trail table. Used as the fallback when [`update`]
/// yields nothing and no snapshot is currently installed (spec §4.1 step 3).
pub fn load_trails(cache_path: &Path) -> Snapshot {
    match std::fs::read_to_string(cache_path) {
        Ok(text) => parse_table(&text),
        Err(e) => {
            warn!(error = %e, path = %cache_path.display(), "failed to read local trail cache");
            Snapshot::default()
        }
    }
}

/// Periodic task that keeps a [`TrailStore`] up to date.
///
/// Each tick: fetch from `server`; if non-empty, install it. Otherwise, if
/// no snapshot is currently installed, fall back to the local cache. Never
/// mutates a published snapshot in place — always builds a fresh one and
/// swaps it in.
pub struct TrailUpdater {
    server: String,
    cache_path: std::path::PathBuf,
    period: Duration,
}

impl TrailUpdater {
    pub fn new(server: impl Into<String>, cache_path: impl Into<std::path::PathBuf>, period: Duration) -> Self {
        Self { server: server.into(), cache_path: cache_path.into(), period }
    }

    /// Run one refresh tick against `store`. Exposed separately from
    /// [`Self::run`] so tests can drive a single tick deterministically.
    pub async fn tick(&self, store: &TrailStore) {
        match update(&self.server).await {
            Some(snapshot) => {
                debug!(count = snapshot.len(), "installing freshly fetched trail snapshot");
                store.install(snapshot);
            }
            None => {
                if !store.is_installed() {
                    let snapshot = load_trails(&self.cache_path);
                    if snapshot.is_empty() {
                        error!("no trail snapshot available from update server or local cache");
                    } else {
                        debug!(count = snapshot.len(), "installing local cached trail snapshot");
                        store.install(snapshot);
                    }
                }
            }
        }
    }

    /// Run forever, ticking every `period`. Intended to be spawned on a
    /// `tokio` runtime as a background task; cancellation is cooperative via
    /// dropping the `JoinHandle`/task.
    pub async fn run(self, store: std::sync::Arc<TrailStore>) {
        let mut interval = tokio::time::interval(self.period);
        loop {
            interval.tick().await;
            self.tick(&store).await;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classifies_ip_dns_url() {
        assert_eq!(classify_key("1.2.3.4"), TrailKind::Ip);
        assert_eq!(classify_key("bad.example"), TrailKind::Dns);
        assert_eq!(classify_key("/evil.php"), TrailKind::Url);
        assert_eq!(classify_key("example.com/evil.php"), TrailKind::Url);
    }

    #[test]
    fn parse_table_skips_blank_and_comment_lines() {
        let text = "\n# comment\n1.2.3.4,badhost,feedA\n\nbad.example,pY,sY\n";
        let snap = parse_table(text);
        assert_eq!(snap.len(), 2);
        assert!(snap.contains(TrailKind::Ip, "1.2.3.4"));
        assert!(snap.contains(TrailKind::Dns, "bad.example"));
    }

    #[test]
    fn parse_table_skips_malformed_lines() {
        let text = "this-line-has-no-commas\n1.2.3.4,only-two-fields";
        let snap = parse_table(text);
        assert!(snap.is_empty());
    }

    #[tokio::test]
    async fn tick_falls_back_to_local_cache_when_update_fails() {
        let dir = tempfile::tempdir().expect("tempdir");
        let cache_path = dir.path().join("trails.csv");
        std::fs::write(&cache_path, "1.2.3.4,badhost,feedA\n").expect("write cache");

        // Port 0 on localhost never accepts; the fetch will fail quickly.
        let updater = TrailUpdater::new(
            "http://127.0.0.1:0/trails",
            cache_path,
            Duration::from_secs(3600),
        );
        let store = TrailStore::new();
        updater.tick(&store).await;

        let snap = store.current();
        assert!(snap.contains(TrailKind::Ip, "1.2.3.4"));
    }
}
