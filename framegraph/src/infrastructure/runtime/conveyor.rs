// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A bounded, per-edge FIFO queue between two stages, grounded on
//! `modules/core/include/conveyor.hpp`. Producers never block: `push`
//! returns `false` immediately if the queue is full, leaving backpressure
//! policy (retry, sleep, drop) to the caller. Consumers block up to a
//! timeout via a condvar.

use std::collections::VecDeque;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Condvar, Mutex};
use std::time::Duration;

/// A bounded FIFO queue of `T`, typically `Arc<Frame<P>>`.
pub struct Conveyor<T> {
    capacity: usize,
    queue: Mutex<VecDeque<T>>,
    not_empty: Condvar,
    /// Consecutive failed `push` attempts since the last success; the
    /// pipeline controller logs every Nth failure rather than every one.
    fail_count: AtomicU64,
}

impl<T> Conveyor<T> {
    pub fn new(capacity: usize) -> Self {
        assert!(capacity > 0, "conveyor capacity must be > 0");
        Conveyor {
            capacity,
            queue: Mutex::new(VecDeque::with_capacity(capacity)),
            not_empty: Condvar::new(),
            fail_count: AtomicU64::new(0),
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn len(&self) -> usize {
        self.queue.lock().unwrap().len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Non-blocking push. Returns `false` (and bumps `fail_count`) if the
    /// queue is at capacity.
    pub fn push(&self, value: T) -> bool {
        let mut queue = self.queue.lock().unwrap();
        if queue.len() >= self.capacity {
            self.fail_count.fetch_add(1, Ordering::Relaxed);
            return false;
        }
        queue.push_back(value);
        self.fail_count.store(0, Ordering::Relaxed);
        drop(queue);
        self.not_empty.notify_one();
        true
    }

    /// Consecutive push failures since the last success, for the
    /// every-Nth-failure debug log.
    pub fn fail_count(&self) -> u64 {
        self.fail_count.load(Ordering::Relaxed)
    }

    /// Blocks up to `timeout` for an item, returning `None` on timeout.
    pub fn pop(&self, timeout: Duration) -> Option<T> {
        let mut queue = self.queue.lock().unwrap();
        if let Some(v) = queue.pop_front() {
            return Some(v);
        }
        let (mut guard, result) = self.not_empty.wait_timeout(queue, timeout).unwrap();
        if result.timed_out() {
            return None;
        }
        guard.pop_front()
    }

    /// Drains every queued item, e.g. during shutdown.
    pub fn drain(&self) -> Vec<T> {
        self.queue.lock().unwrap().drain(..).collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn push_fails_at_capacity_and_resets_on_success() {
        let c: Conveyor<u32> = Conveyor::new(2);
        assert!(c.push(1));
        assert!(c.push(2));
        assert!(!c.push(3));
        assert_eq!(c.fail_count(), 1);
        assert_eq!(c.pop(Duration::from_millis(1)), Some(1));
        assert!(c.push(3));
        assert_eq!(c.fail_count(), 0);
    }

    #[test]
    fn pop_times_out_on_empty_queue() {
        let c: Conveyor<u32> = Conveyor::new(4);
        assert_eq!(c.pop(Duration::from_millis(5)), None);
    }

    #[test]
    fn fifo_order_is_preserved() {
        let c: Conveyor<u32> = Conveyor::new(4);
        c.push(1);
        c.push(2);
        c.push(3);
        assert_eq!(c.drain(), vec![1, 2, 3]);
    }
}
