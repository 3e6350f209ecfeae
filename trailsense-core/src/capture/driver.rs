use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::sync::Arc;
use std::thread;
use std::time::Duration;

use pcap::{Active, Capture, Linktype};

use super::ring::RingBuffer;
use super::worker;
use crate::config::Config;
use crate::decode::{decode_frame, LinkType};
use crate::error::{Result, SensorError};
use crate::heuristics::NxdomainCounters;
use crate::sink::EventSink;
use crate::trail::TrailStore;

/// Read timeout passed to the capture handle. libpcap's default (no
/// timeout set, i.e. `0`) blocks `next_packet()` forever on an idle
/// interface, which would only let the shutdown flag (checked between
/// calls) be observed once the next packet arrives. A short timeout makes
/// `next_packet()` return `Err(TimeoutExpired)` periodically even with no
/// traffic, so Ctrl-C is honored promptly (spec §4.2/§5's cooperative
/// shutdown).
const CAPTURE_POLL_TIMEOUT_MS: i32 = 200;

/// Open `device` in promiscuous mode at `snap_len`, apply `filter` if
/// present, and verify the reported link type is one of the two supported
/// (spec §4.2, §6).
pub fn open(device: &str, snap_len: i32, filter: Option<&str>) -> Result<(Capture<Active>, LinkType)> {
    let mut cap = Capture::from_device(device)
        .map_err(SensorError::Capture)?
        .promisc(true)
        .snaplen(snap_len)
        .timeout(CAPTURE_POLL_TIMEOUT_MS)
        .open()
        .map_err(SensorError::Capture)?;

    if let Some(expr) = filter {
        cap.filter(expr, true).map_err(SensorError::Capture)?;
    }

    let link_type = match cap.get_datalink() {
        Linktype::ETHERNET => LinkType::Ethernet,
        Linktype::LINUX_SLL => LinkType::LinuxSll,
        other => return Err(SensorError::UnsupportedLinkType(other)),
    };

    Ok((cap, link_type))
}

/// Run the capture→dispatch pipeline until `shutdown` is set (spec §4.2,
/// §5). Picks inline mode when `use_multiprocessing` is off or the host is
/// single-core, multi-worker mode otherwise.
pub fn run(
    cfg: &Config,
    mut cap: Capture<Active>,
    link_type: LinkType,
    store: Arc<TrailStore>,
    sink: Arc<EventSink>,
    shutdown: Arc<AtomicBool>,
) -> Result<()> {
    let cpu_count = thread::available_parallelism().map(|n| n.get()).unwrap_or(1);

    if !cfg.use_multiprocessing || cpu_count <= 1 {
        return run_inline(cfg, &mut cap, link_type, &store, &sink, &shutdown);
    }

    run_multi_worker(cfg, &mut cap, link_type, store, sink, shutdown, cpu_count - 1)
}

fn run_inline(
    cfg: &Config,
    cap: &mut Capture<Active>,
    link_type: LinkType,
    store: &TrailStore,
    sink: &EventSink,
    shutdown: &AtomicBool,
) -> Result<()> {
    let mut hs = NxdomainCounters::new();
    loop {
        if shutdown.load(Ordering::Relaxed) {
            return Ok(());
        }
        match cap.next_packet() {
            Ok(packet) => {
                let sec = packet.header.ts.tv_sec as u32;
                let usec = packet.header.ts.tv_usec as u32;
                let snapshot = store.current();
                let mut alerts = Vec::new();
                decode_frame(
                    packet.data,
                    sec,
                    usec,
                    link_type,
                    &snapshot,
                    &mut hs,
                    cfg.no_such_name_per_hour_threshold,
                    &mut alerts,
                );
                for alert in &alerts {
                    sink.log_event(alert);
                }
            }
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => return Ok(()),
            Err(err) => return Err(SensorError::Capture(err)),
        }
    }
}

#[allow(clippy::too_many_arguments)]
fn run_multi_worker(
    cfg: &Config,
    cap: &mut Capture<Active>,
    link_type: LinkType,
    store: Arc<TrailStore>,
    sink: Arc<EventSink>,
    shutdown: Arc<AtomicBool>,
    lane_count: usize,
) -> Result<()> {
    let ring = Arc::new(RingBuffer::new(cfg.buffer_length));
    let published = Arc::new(AtomicU64::new(0));
    let sweep_period = Duration::from_secs(cfg.update_period_secs.max(1));

    let handles: Vec<_> = (0..lane_count)
        .map(|lane| {
            let ring = Arc::clone(&ring);
            let published = Arc::clone(&published);
            let store = Arc::clone(&store);
            let sink = Arc::clone(&sink);
            let threshold = cfg.no_such_name_per_hour_threshold;
            thread::spawn(move || {
                worker::run(
                    lane,
                    lane_count,
                    ring,
                    published,
                    store,
                    sink,
                    threshold,
                    link_type,
                    sweep_period,
                )
            })
        })
        .collect();

    let mut count: u64 = 0;
    loop {
        if shutdown.load(Ordering::Relaxed) {
            break;
        }
        match cap.next_packet() {
            Ok(packet) => {
                let sec = packet.header.ts.tv_sec as u32;
                let usec = packet.header.ts.tv_usec as u32;
                ring.publish_data(count, sec, usec, packet.data);
                count += 1;
                published.store(count, Ordering::Release);
            }
            Err(pcap::Error::TimeoutExpired) => continue,
            Err(pcap::Error::NoMorePackets) => break,
            Err(err) => {
                tracing::warn!(error = %err, "capture read failed, shutting down workers");
                break;
            }
        }
    }

    // Successive indices starting at `count` necessarily cover every lane
    // exactly once (spec §4.2 "Shutdown").
    for lane in 0..lane_count {
        ring.publish_end(count + lane as u64);
    }
    published.store(count + lane_count as u64, Ordering::Release);

    for (lane, handle) in handles.into_iter().enumerate() {
        if let Err(panic) = handle.join() {
            let reason = panic
                .downcast_ref::<&str>()
                .copied()
                .or_else(|| panic.downcast_ref::<String>().map(String::as_str))
                .unwrap_or("worker panicked with a non-string payload");
            tracing::error!(lane, reason, "worker thread panicked during shutdown join");
        }
    }

    let dropped = ring.dropped();
    if dropped > 0 {
        tracing::warn!(dropped, "ring buffer overran during this run");
    }
    Ok(())
}
