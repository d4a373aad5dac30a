// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A process-wide monotonic clock, expressed as nanoseconds since an
//! arbitrary epoch fixed at first use. `Instant` has no public
//! representation as an integer, but the profiler's trace events and
//! ongoing-record bookkeeping need a plain `i64` to store, replay, and
//! diff — so everything downstream of this module works in "monotonic
//! nanos" rather than `Instant` directly.

use std::sync::OnceLock;
use std::time::Instant;

static EPOCH: OnceLock<Instant> = OnceLock::new();

/// Nanoseconds elapsed since this process's profiler epoch (fixed at the
/// first call to `now_nanos` anywhere in the process).
pub fn now_nanos() -> i64 {
    let epoch = EPOCH.get_or_init(Instant::now);
    epoch.elapsed().as_nanos() as i64
}
