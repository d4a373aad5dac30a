// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Trace event and query-result data model, grounded on
//! `profiler/trace.hpp`: a `TraceEvent` carries module/process names and a
//! level; a `Trace` buckets stripped-down `TraceElem`s by process (pipeline
//! level) or by module then process (module level).

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use crate::record_key::{RecordKey, TraceEventType, TraceLevel};

/// One event recorded by the tracer.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceEvent {
    pub key: RecordKey,
    pub module_name: String,
    pub process_name: String,
    /// Monotonic nanoseconds.
    pub time: i64,
    pub level: TraceLevel,
    pub event_type: TraceEventType,
}

/// A `TraceEvent` with its module/process context stripped, as stored in a
/// [`Trace`] query result.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TraceElem {
    pub key: RecordKey,
    pub time: i64,
    pub event_type: TraceEventType,
}

/// Ordered events for one process region.
pub type ProcessTrace = Vec<TraceElem>;

/// Per-process traces for one module.
pub type ModuleTrace = HashMap<String, ProcessTrace>;

/// Result of [`crate::trace::Trace`]'s time-window query: pipeline-level
/// events bucketed by process name, module-level events bucketed by module
/// then process name.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Trace {
    pub process_traces: HashMap<String, ProcessTrace>,
    pub module_traces: HashMap<String, ModuleTrace>,
}

impl Trace {
    pub fn is_empty(&self) -> bool {
        self.process_traces.is_empty() && self.module_traces.is_empty()
    }

    pub(crate) fn record(&mut self, event: &TraceEvent) {
        let elem = TraceElem {
            key: event.key.clone(),
            time: event.time,
            event_type: event.event_type,
        };
        match event.level {
            TraceLevel::Pipeline => self
                .process_traces
                .entry(event.process_name.clone())
                .or_default()
                .push(elem),
            TraceLevel::Module => self
                .module_traces
                .entry(event.module_name.clone())
                .or_default()
                .entry(event.process_name.clone())
                .or_default()
                .push(elem),
        }
    }
}
