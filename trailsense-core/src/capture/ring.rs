use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Mutex, MutexGuard};

use tracing::warn;

/// State of one ring slot (spec §3 "Ring slot" / §4.2).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Marker {
    Empty,
    Data,
    End,
}

struct SlotState {
    marker: Marker,
    sec: u32,
    usec: u32,
    frame: Vec<u8>,
}

impl Default for SlotState {
    fn default() -> Self {
        Self { marker: Marker::Empty, sec: 0, usec: 0, frame: Vec::new() }
    }
}

struct Slot {
    state: Mutex<SlotState>,
}

/// A frame handed from [`super::driver`] to a worker, or a lane shutdown
/// signal.
pub enum Taken {
    Data { sec: u32, usec: u32, frame: Vec<u8> },
    End,
}

/// Fixed-size ring of slots shared between the capture thread and the
/// worker pool (spec §3 "Ring slot", §4.2, §5 "RB").
///
/// The spec models each slot's marker byte as a lock-free publication flag:
/// written last by the producer, read first by the consumer, with no other
/// synchronization. Since each slot has exactly one writer and one reader
/// for its lifetime (`i mod (N-1)` partitions lanes deterministically), the
/// same guarantee is available in safe Rust by guarding the marker and the
/// slot body together with one [`Mutex`] per slot — the critical section
/// plays the role the spec gives to the marker's write/read ordering,
/// without reaching for raw atomics or `unsafe`.
pub struct RingBuffer {
    slots: Vec<Slot>,
    dropped: AtomicU64,
}

impl RingBuffer {
    pub fn new(len: usize) -> Self {
        let len = len.max(1);
        let slots = (0..len).map(|_| Slot { state: Mutex::new(SlotState::default()) }).collect();
        Self { slots, dropped: AtomicU64::new(0) }
    }

    pub fn len(&self) -> usize {
        self.slots.len()
    }

    /// Number of `DATA` slots overwritten before a worker ever read them
    /// (spec §9's "RB overrun has no accounting" open question, answered).
    pub fn dropped(&self) -> u64 {
        self.dropped.load(Ordering::Relaxed)
    }

    fn slot(&self, index: u64) -> &Slot {
        &self.slots[(index as usize) % self.slots.len()]
    }

    /// Lock a slot's state, recovering the inner guard on poisoning instead
    /// of panicking the calling thread — a panic while another slot's lock
    /// was held must not permanently kill this lane too (same
    /// lock-and-recover discipline as the teacher's
    /// `security::rate_limit::RateLimitManager::check`/`is_enabled`).
    fn lock(slot: &Slot) -> MutexGuard<'_, SlotState> {
        slot.state.lock().unwrap_or_else(|poisoned| {
            warn!("ring slot mutex poisoned, recovering inner state");
            poisoned.into_inner()
        })
    }

    /// Write a `DATA` slot at `index` (capture-thread side). If the
    /// previous occupant of this physical slot was never read, it is
    /// silently overwritten — the documented drop behavior for a worker
    /// that falls more than [`Self::len`] frames behind (spec §7) — and
    /// counted in [`Self::dropped`].
    pub fn publish_data(&self, index: u64, sec: u32, usec: u32, frame: &[u8]) {
        let mut state = Self::lock(self.slot(index));
        if state.marker == Marker::Data {
            self.dropped.fetch_add(1, Ordering::Relaxed);
        }
        state.marker = Marker::Data;
        state.sec = sec;
        state.usec = usec;
        state.frame.clear();
        state.frame.extend_from_slice(frame);
    }

    /// Write an `END` slot at `index` (capture-thread shutdown path).
    pub fn publish_end(&self, index: u64) {
        let mut state = Self::lock(self.slot(index));
        state.marker = Marker::End;
    }

    /// Worker-thread side: take ownership of the slot at `index` if it
    /// carries `DATA` or `END`, resetting it to empty. Returns `None` if
    /// the producer has not published this index yet — the caller should
    /// back off briefly and retry (spec §4.4 step 1's spin-wait).
    pub fn take(&self, index: u64) -> Option<Taken> {
        let mut state = Self::lock(self.slot(index));
        match state.marker {
            Marker::Empty => None,
            Marker::End => {
                state.marker = Marker::Empty;
                Some(Taken::End)
            }
            Marker::Data => {
                let frame = std::mem::take(&mut state.frame);
                let sec = state.sec;
                let usec = state.usec;
                state.marker = Marker::Empty;
                Some(Taken::Data { sec, usec, frame })
            }
        }
    }
}
