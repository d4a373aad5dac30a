// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Profiler accumulators and snapshot DTOs.
//!
//! [`StreamProfiler`] is the pure, non-thread-safe accumulator described in
//! the stream-profiler component: callers (the owning Process Profiler, in
//! the `framegraph` crate) serialize access via their own lock. Everything
//! else here (`StreamProfile`, `ProcessProfile`, `ModuleProfile`,
//! `PipelineProfile`) is an immutable snapshot returned by `get_profile()`.

use std::time::Duration;

use serde::{Deserialize, Serialize};

/// Sentinel returned by `fps`/`latency` when there isn't enough data yet.
pub const NO_DATA: f64 = -1.0;

/// Per-(process, stream) counters and latency accumulators. A fluent
/// builder matching the original `StreamProfiler::AddLatency` /
/// `UpdatePhysicalTime` / `AddDropped` / `AddCompleted` chain.
#[derive(Debug, Clone, Default)]
pub struct StreamProfiler {
    completed: u64,
    dropped: u64,
    latency_count: u64,
    latency_sum: Duration,
    latency_min: Duration,
    latency_max: Duration,
    /// Overwritten (not accumulated) by the caller with a cumulative value;
    /// see the open-question note on shared-clock fps in the design notes.
    wall_time: Duration,
}

impl StreamProfiler {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_latency(&mut self, d: Duration) -> &mut Self {
        if self.latency_count == 0 {
            self.latency_min = d;
            self.latency_max = d;
        } else {
            self.latency_min = self.latency_min.min(d);
            self.latency_max = self.latency_max.max(d);
        }
        self.latency_sum += d;
        self.latency_count += 1;
        self
    }

    /// Overwrites the cumulative wall-time figure; the caller is expected
    /// to provide an already-cumulative value (see `ProcessProfiler`).
    pub fn update_wall_time(&mut self, d: Duration) -> &mut Self {
        self.wall_time = d;
        self
    }

    pub fn add_dropped(&mut self, n: u64) -> &mut Self {
        self.dropped += n;
        self
    }

    pub fn add_completed(&mut self) -> &mut Self {
        self.completed += 1;
        self
    }

    pub fn completed(&self) -> u64 {
        self.completed
    }

    pub fn dropped(&self) -> u64 {
        self.dropped
    }

    pub fn get_profile(&self, stream_id: impl Into<String>) -> StreamProfile {
        let counter = self.completed + self.dropped;
        let wall_time_ms = self.wall_time.as_secs_f64() * 1000.0;
        let fps = if wall_time_ms > 0.0 {
            1000.0 * counter as f64 / wall_time_ms
        } else {
            NO_DATA
        };
        let latency = if self.latency_count > 0 {
            (self.latency_sum.as_secs_f64() * 1000.0) / self.latency_count as f64
        } else {
            NO_DATA
        };
        let (min_latency, max_latency) = if self.latency_count > 0 {
            (
                self.latency_min.as_secs_f64() * 1000.0,
                self.latency_max.as_secs_f64() * 1000.0,
            )
        } else {
            (0.0, 0.0)
        };
        StreamProfile {
            stream_id: stream_id.into(),
            completed: self.completed,
            dropped: self.dropped,
            counter,
            fps,
            latency_ms: latency,
            min_latency_ms: min_latency,
            max_latency_ms: max_latency,
        }
    }
}

/// Snapshot of one stream's accumulators within one process region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StreamProfile {
    pub stream_id: String,
    pub completed: u64,
    pub dropped: u64,
    pub counter: u64,
    pub fps: f64,
    pub latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
}

/// Snapshot of one process region, aggregated across all its streams.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProcessProfile {
    pub process_name: String,
    pub module_name: Option<String>,
    pub completed: u64,
    pub dropped: u64,
    pub counter: u64,
    pub fps: f64,
    pub latency_ms: f64,
    pub min_latency_ms: f64,
    pub max_latency_ms: f64,
    pub per_stream: Vec<StreamProfile>,
}

/// Snapshot of one module (stage), folding all of its process regions.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ModuleProfile {
    pub module_name: String,
    pub processes: Vec<ProcessProfile>,
}

/// Whole-pipeline snapshot: every module in topological order plus the
/// standalone overall (end-to-end) process region.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineProfile {
    pub overall: ProcessProfile,
    pub modules: Vec<ModuleProfile>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn empty_stream_profiler_reports_no_data_sentinels() {
        let sp = StreamProfiler::new();
        let profile = sp.get_profile("s1");
        assert_eq!(profile.fps, NO_DATA);
        assert_eq!(profile.latency_ms, NO_DATA);
        assert_eq!(profile.min_latency_ms, 0.0);
        assert_eq!(profile.max_latency_ms, 0.0);
    }

    #[test]
    fn add_latency_tracks_min_max_and_mean() {
        let mut sp = StreamProfiler::new();
        sp.add_latency(Duration::from_millis(150));
        sp.add_latency(Duration::from_millis(200));
        sp.add_completed();
        sp.add_completed();
        sp.update_wall_time(Duration::from_millis(250));
        let profile = sp.get_profile("s1");
        assert_eq!(profile.completed, 2);
        assert_eq!(profile.min_latency_ms, 150.0);
        assert_eq!(profile.max_latency_ms, 200.0);
        assert!((profile.latency_ms - 175.0).abs() < 1e-9);
        assert!((profile.fps - 8.0).abs() < 1e-9);
    }
}
