use std::collections::HashMap;

/// Per-domain hourly NXDOMAIN response counter.
///
/// Single-writer by construction: in multi-worker mode each worker thread
/// owns its own `NxdomainCounters` (spec §5's "shard HS by worker" choice,
/// see `SPEC_FULL.md` §5), so thresholds are evaluated per worker lane. In
/// inline mode there is exactly one instance, recovering the original's
/// globally-accurate counting.
#[derive(Debug, Default)]
pub struct NxdomainCounters {
    entries: HashMap<String, (u32, u32)>,
}

impl NxdomainCounters {
    pub fn new() -> Self {
        Self::default()
    }

    /// Record one NXDOMAIN response for `domain` observed at unix time
    /// `sec`. Returns `true` exactly when the per-hour count just crossed
    /// `threshold` (strictly greater than), signaling the caller to emit
    /// the synthetic heuristic alert (spec §4.3).
    pub fn observe(&mut self, domain: &str, sec: u32, threshold: u32) -> bool {
        let bucket = sec / 3600;
        let entry = self.entries.entry(domain.to_string()).or_insert((bucket, 0));
        if entry.0 != bucket {
            *entry = (bucket, 1);
            return false;
        }
        entry.1 += 1;
        entry.1 > threshold
    }

    /// Drop entries whose bucket is more than one hour behind
    /// `current_bucket`. Bounds HS memory growth (spec §9 open question),
    /// intended to be called once per `UPDATE_PERIOD` tick.
    pub fn sweep(&mut self, current_bucket: u32) {
        self.entries
            .retain(|_, (bucket, _)| current_bucket.saturating_sub(*bucket) <= 1);
    }

    #[cfg(test)]
    pub fn count_for(&self, domain: &str) -> Option<(u32, u32)> {
        self.entries.get(domain).copied()
    }
}
