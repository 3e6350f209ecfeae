use std::fmt;

use ahash::AHashMap;

/// Which of the three disjoint key namespaces a trail belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TrailKind {
    Ip,
    Dns,
    Url,
}

impl fmt::Display for TrailKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            TrailKind::Ip => "IP",
            TrailKind::Dns => "DNS",
            TrailKind::Url => "URL",
        };
        f.write_str(s)
    }
}

/// One `(indicator, source)` pair describing why a key is flagged.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Trail {
    pub indicator: String,
    pub source: String,
}

impl Trail {
    pub fn new(indicator: impl Into<String>, source: impl Into<String>) -> Self {
        Self { indicator: indicator.into(), source: source.into() }
    }
}

/// Immutable, fully-built set of trails addressable by kind and key.
///
/// A `Snapshot` never mutates after construction — [`TrailStore`](super::TrailStore)
/// swaps one `Arc<Snapshot>` for another rather than mutating fields in place.
#[derive(Debug, Default)]
pub struct Snapshot {
    ip: AHashMap<String, Trail>,
    dns: AHashMap<String, Trail>,
    url: AHashMap<String, Trail>,
}

impl Snapshot {
    pub fn is_empty(&self) -> bool {
        self.ip.is_empty() && self.dns.is_empty() && self.url.is_empty()
    }

    pub fn len(&self) -> usize {
        self.ip.len() + self.dns.len() + self.url.len()
    }

    pub fn get(&self, kind: TrailKind, key: &str) -> Option<&Trail> {
        match kind {
            TrailKind::Ip => self.ip.get(key),
            TrailKind::Dns => self.dns.get(key),
            TrailKind::Url => self.url.get(key),
        }
    }

    pub fn contains(&self, kind: TrailKind, key: &str) -> bool {
        self.get(kind, key).is_some()
    }
}

/// Builder used by [`crate::trail::update`]/[`crate::trail::load_trails`] and
/// by tests to assemble a `Snapshot` without exposing mutable maps on the
/// published type.
#[derive(Debug, Default)]
pub struct SnapshotBuilder {
    ip: AHashMap<String, Trail>,
    dns: AHashMap<String, Trail>,
    url: AHashMap<String, Trail>,
}

impl SnapshotBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn insert(&mut self, kind: TrailKind, key: impl Into<String>, trail: Trail) -> &mut Self {
        let map = match kind {
            TrailKind::Ip => &mut self.ip,
            TrailKind::Dns => &mut self.dns,
            TrailKind::Url => &mut self.url,
        };
        map.insert(key.into(), trail);
        self
    }

    pub fn build(self) -> Snapshot {
        Snapshot { ip: self.ip, dns: self.dns, url: self.url }
    }
}
