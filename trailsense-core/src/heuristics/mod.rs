//! Per-domain NXDOMAIN-flood heuristic state.

mod nxdomain;

pub use nxdomain::NxdomainCounters;
