// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Lock-free circular event buffer, ported from
//! `original_source/framework/core/src/profiler/circular_buffer.hpp`.
//!
//! The ring is oversized by `margin` so the tail writer never has to wait
//! on a reader that is still touching a slot the writer wants to reuse.
//! Each slot carries an atomic "lap" marker: `BUSY` while a writer or
//! reader owns the slot, otherwise the lap count (mod 128) that last wrote
//! it. Do not replace this with a mutex-guarded deque: the hot path is one
//! push per frame per stage per start/end, which can reach tens of
//! thousands of events per second (see the workspace design notes).

use std::sync::atomic::{AtomicU64, AtomicU8, Ordering};

use parking_lot::RwLock;

const BUSY: u8 = 0xFF;
const LAP_MASK: u8 = 0x7F;
const LAP_MODULUS: u8 = 128;
const DEFAULT_MARGIN: f64 = 0.2;

/// `u >= v` under mod-128 lap ordering.
fn lap_ge(u: u8, v: u8) -> bool {
    let diff = u.wrapping_sub(v) & LAP_MASK;
    diff <= 63
}

struct Slot<T> {
    value: RwLock<Option<T>>,
    marker: AtomicU8,
}

/// A fixed-capacity ring of slots, built for many concurrent writers and
/// occasional bulk readers.
pub struct CircularBuffer<T> {
    slots: Vec<Slot<T>>,
    capacity: usize,
    size: usize,
    /// Next absolute index to be written.
    current: AtomicU64,
}

impl<T: Clone> CircularBuffer<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "circular buffer capacity must be > 0");
        let size = ((capacity as f64) * (1.0 + DEFAULT_MARGIN)).ceil() as usize;
        let size = size.max(capacity + 1);
        let mut slots = Vec::with_capacity(size);
        for _ in 0..size {
            slots.push(Slot {
                value: RwLock::new(None),
                marker: AtomicU8::new(0),
            });
        }
        CircularBuffer {
            slots,
            capacity,
            size,
            current: AtomicU64::new(0),
        }
    }

    fn slot_and_lap(&self, i: u64) -> (usize, u8) {
        let slot = (i as usize) % self.size;
        let lap = (((i / self.size as u64) + 1) % LAP_MODULUS as u64) as u8;
        (slot, lap)
    }

    /// Push a value, never blocking on a reader — only spins if another
    /// writer or reader is actively touching the same slot.
    pub fn push(&self, value: T) -> u64 {
        let i = self.current.fetch_add(1, Ordering::AcqRel);
        let (slot_idx, lap) = self.slot_and_lap(i);
        let slot = &self.slots[slot_idx];
        loop {
            let current_marker = slot.marker.load(Ordering::Acquire);
            if current_marker == BUSY {
                std::hint::spin_loop();
                continue;
            }
            if slot
                .marker
                .compare_exchange(current_marker, BUSY, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                *slot.value.write() = Some(value);
                let new_marker = if lap_ge(lap, current_marker) { lap } else { current_marker };
                slot.marker.store(new_marker, Ordering::Release);
                break;
            }
        }
        i
    }

    /// Read the value stored at absolute index `i`, if it is still the
    /// current occupant of its slot (i.e. hasn't been overwritten by a
    /// later lap).
    pub fn read(&self, i: u64) -> Option<T> {
        let (slot_idx, lap) = self.slot_and_lap(i);
        let slot = &self.slots[slot_idx];
        loop {
            let current_marker = slot.marker.load(Ordering::Acquire);
            if current_marker == BUSY {
                std::hint::spin_loop();
                continue;
            }
            if !lap_ge(current_marker, lap) {
                return None;
            }
            if slot
                .marker
                .compare_exchange(current_marker, BUSY, Ordering::AcqRel, Ordering::Acquire)
                .is_ok()
            {
                let value = slot.value.read().clone();
                slot.marker.store(current_marker, Ordering::Release);
                return value;
            }
        }
    }

    /// Oldest still-valid absolute index.
    pub fn begin(&self) -> u64 {
        let current = self.current.load(Ordering::Acquire);
        current.saturating_sub(self.capacity as u64)
    }

    /// One-past-the-newest absolute index.
    pub fn end(&self) -> u64 {
        self.current.load(Ordering::Acquire)
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    /// Snapshot every surviving value in `[begin(), end())`, in push order.
    /// Single-threaded callers only (the tracer's `get_trace` scan).
    pub fn snapshot(&self) -> Vec<T> {
        let begin = self.begin();
        let end = self.end();
        let mut out = Vec::with_capacity((end - begin) as usize);
        for i in begin..end {
            if let Some(v) = self.read(i) {
                out.push(v);
            }
        }
        out
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retains_at_most_capacity_most_recent_events() {
        let buf = CircularBuffer::new(100);
        for i in 0..200u32 {
            buf.push(i);
        }
        let snapshot = buf.snapshot();
        assert_eq!(snapshot.len(), 100);
        assert_eq!(snapshot.last().copied(), Some(199));
        assert_eq!(snapshot.first().copied(), Some(100));
    }

    #[test]
    fn push_order_is_preserved_within_capacity() {
        let buf = CircularBuffer::new(8);
        for i in 0..5u32 {
            buf.push(i);
        }
        assert_eq!(buf.snapshot(), vec![0, 1, 2, 3, 4]);
    }

    #[test]
    fn lap_ge_handles_wraparound() {
        assert!(lap_ge(5, 3));
        assert!(!lap_ge(3, 5));
        assert!(lap_ge(1, 126));
        assert!(!lap_ge(126, 1));
    }
}
