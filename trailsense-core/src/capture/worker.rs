use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;
use std::time::{Duration, Instant, SystemTime, UNIX_EPOCH};

use super::ring::{RingBuffer, Taken};
use crate::decode::{decode_frame, LinkType};
use crate::heuristics::NxdomainCounters;
use crate::sink::EventSink;
use crate::trail::TrailStore;

const SPIN_BACKOFF: Duration = Duration::from_micros(200);

/// One worker's lane of the ring buffer (spec §4.4): it owns every slot
/// index `i` with `i mod lane_count == lane`, decodes each frame with its
/// own [`NxdomainCounters`] — the sharded-HS resolution of spec §5's Open
/// Question, see `SPEC_FULL.md` §5 — and logs any alert PD produces to a
/// shared [`EventSink`]. Exits when it reads an `END` marker.
#[allow(clippy::too_many_arguments)]
pub fn run(
    lane: usize,
    lane_count: usize,
    ring: Arc<RingBuffer>,
    published: Arc<AtomicU64>,
    store: Arc<TrailStore>,
    sink: Arc<EventSink>,
    nxdomain_threshold: u32,
    link_type: LinkType,
    sweep_period: Duration,
) {
    let mut hs = NxdomainCounters::new();
    let mut last_seen = lane as u64;
    let mut last_sweep = Instant::now();

    loop {
        let published_count = published.load(Ordering::Acquire);
        if last_seen >= published_count {
            std::thread::sleep(SPIN_BACKOFF);
            maybe_sweep(&mut hs, &mut last_sweep, sweep_period);
            continue;
        }

        while last_seen < published_count {
            match ring.take(last_seen) {
                None => break,
                Some(Taken::End) => return,
                Some(Taken::Data { sec, usec, frame }) => {
                    let snapshot = store.current();
                    let mut alerts = Vec::new();
                    decode_frame(
                        &frame,
                        sec,
                        usec,
                        link_type,
                        &snapshot,
                        &mut hs,
                        nxdomain_threshold,
                        &mut alerts,
                    );
                    for alert in &alerts {
                        sink.log_event(alert);
                    }
                }
            }
            last_seen += lane_count as u64;
        }

        maybe_sweep(&mut hs, &mut last_sweep, sweep_period);
    }
}

/// Bound HS memory growth (spec §9 open question) by sweeping stale
/// entries roughly once per `TU` tick, tied to the same cadence TU uses to
/// refresh trails — there is no dedicated schedule for this in the spec.
fn maybe_sweep(hs: &mut NxdomainCounters, last_sweep: &mut Instant, sweep_period: Duration) {
    if last_sweep.elapsed() < sweep_period {
        return;
    }
    *last_sweep = Instant::now();
    let bucket = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| (d.as_secs() / 3600) as u32)
        .unwrap_or(0);
    hs.sweep(bucket);
}
