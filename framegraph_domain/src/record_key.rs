// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! [`RecordKey`] and the trace event taxonomy, grounded on
//! `profiler/trace.hpp` in the original source: `RecordKey` there is a
//! `pair<string, int64_t>`; we keep the same two fields.

use serde::{Deserialize, Serialize};

/// Identifies a frame for profiling purposes across trace events and
/// ongoing-records: `(stream_id, timestamp)`. Two frames sharing a key in
/// the same process region are considered the same frame.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RecordKey {
    pub stream_id: String,
    pub timestamp: i64,
}

impl RecordKey {
    pub fn new(stream_id: impl Into<String>, timestamp: i64) -> Self {
        RecordKey {
            stream_id: stream_id.into(),
            timestamp,
        }
    }
}

/// Whether a trace event was recorded at whole-pipeline or single-module
/// granularity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceLevel {
    Pipeline,
    Module,
}

/// Start or end of a process region.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum TraceEventType {
    Start,
    End,
}
