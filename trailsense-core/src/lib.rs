#![forbid(unsafe_code)]

//! Core of a passive network intrusion-detection sensor: a capture→dispatch
//! pipeline, a packet decoder/matcher for IP/TCP/UDP/ICMP with HTTP and DNS
//! extraction, and the atomically-swapped trail store the decoder reads
//! against.

pub mod capture;
pub mod config;
pub mod decode;
pub mod error;
pub mod heuristics;
pub mod sink;
pub mod trail;

pub use config::{load_from_path, Config};
pub use error::{Result, SensorError};
pub use sink::{AlertRecord, EventSink};
pub use trail::{TrailStore, TrailUpdater};
