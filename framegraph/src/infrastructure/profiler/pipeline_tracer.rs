// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline tracer: a thin wrapper over [`CircularBuffer`] that
//! assembles trace events and serves time-window queries, grounded on
//! `profiler/pipeline_tracer.{hpp,cpp}`.

use framegraph_domain::record_key::{TraceEventType, TraceLevel};
use framegraph_domain::trace::{Trace, TraceEvent};

use super::circular_buffer::CircularBuffer;

pub struct Tracer {
    buffer: CircularBuffer<TraceEvent>,
}

impl Tracer {
    pub fn new(capacity: usize) -> Self {
        Tracer {
            buffer: CircularBuffer::new(capacity),
        }
    }

    /// Push an event. Never fails or blocks on readers; may silently
    /// discard the oldest event if the ring is full.
    pub fn record(&self, event: TraceEvent) {
        self.buffer.push(event);
    }

    pub fn record_raw(
        &self,
        key: framegraph_domain::record_key::RecordKey,
        module_name: impl Into<String>,
        process_name: impl Into<String>,
        time: i64,
        level: TraceLevel,
        event_type: TraceEventType,
    ) {
        self.record(TraceEvent {
            key,
            module_name: module_name.into(),
            process_name: process_name.into(),
            time,
            level,
            event_type,
        });
    }

    /// Scan the buffer's current range, keeping events with
    /// `start < time <= end`, bucketed by level.
    pub fn get_trace(&self, start: i64, end: i64) -> Trace {
        let mut trace = Trace::default();
        if end <= start {
            return trace;
        }
        for event in self.buffer.snapshot() {
            if event.time > start && event.time <= end {
                trace.record(&event);
            }
        }
        trace
    }

    pub fn get_trace_before(&self, end: i64, dur: i64) -> Trace {
        self.get_trace(end - dur, end)
    }

    pub fn get_trace_after(&self, start: i64, dur: i64) -> Trace {
        self.get_trace(start, start + dur)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegraph_domain::record_key::RecordKey;

    fn evt(time: i64, event_type: TraceEventType) -> TraceEvent {
        TraceEvent {
            key: RecordKey::new("s1", time),
            module_name: "mod".into(),
            process_name: "PROCESS".into(),
            time,
            level: TraceLevel::Pipeline,
            event_type,
        }
    }

    #[test]
    fn get_trace_excludes_start_and_includes_end() {
        let tracer = Tracer::new(100);
        for t in 0..10 {
            tracer.record(evt(t, TraceEventType::Start));
        }
        let trace = tracer.get_trace(2, 5);
        let events = &trace.process_traces["PROCESS"];
        assert_eq!(events.iter().map(|e| e.time).collect::<Vec<_>>(), vec![3, 4, 5]);
    }

    #[test]
    fn end_not_after_start_is_empty() {
        let tracer = Tracer::new(100);
        tracer.record(evt(5, TraceEventType::Start));
        assert!(tracer.get_trace(10, 10).is_empty());
        assert!(tracer.get_trace(10, 5).is_empty());
    }
}
