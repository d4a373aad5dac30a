// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The process profiler: drop policy plus aggregation for one named
//! process region inside one stage (or the whole pipeline, for the
//! overall region). Ported from `process_profiler.{hpp,cpp}`.

use std::collections::HashMap;
use std::sync::Arc;
use std::time::Duration;

use parking_lot::Mutex;

use framegraph_domain::profile::{ProcessProfile, StreamProfiler};
use framegraph_domain::record_key::{RecordKey, TraceEventType, TraceLevel};

use super::pipeline_tracer::Tracer;

/// DPB-size bound on how many earlier ongoing starts may remain unmatched
/// before they are retired as dropped. Named for the H.264/H.265 decoded
/// picture buffer this policy imitates.
pub const DEFAULT_MAX_DPB_SIZE: usize = 16;

struct OngoingEntry {
    key: RecordKey,
    start_time: i64,
    skip_count: u32,
}

/// Per-process-profiler configuration.
#[derive(Debug, Clone)]
pub struct ProcessProfilerConfig {
    pub enable_profiling: bool,
    pub enable_tracing: bool,
    pub process_name: String,
    pub trace_level: TraceLevel,
    pub module_name: Option<String>,
    pub max_dpb_size: usize,
}

impl ProcessProfilerConfig {
    pub fn new(process_name: impl Into<String>, trace_level: TraceLevel) -> Self {
        ProcessProfilerConfig {
            enable_profiling: true,
            enable_tracing: true,
            process_name: process_name.into(),
            trace_level,
            module_name: None,
            max_dpb_size: DEFAULT_MAX_DPB_SIZE,
        }
    }

    pub fn with_module(mut self, module_name: impl Into<String>) -> Self {
        self.module_name = Some(module_name.into());
        self
    }
}

struct State {
    ongoing: u64,
    /// `None` is the "never" sentinel: no record has been seen yet.
    last_record_time: Option<i64>,
    total_wall_time: Duration,
    overall: StreamProfiler,
    per_stream: HashMap<String, StreamProfiler>,
    ongoing_records: HashMap<String, Vec<OngoingEntry>>,
    stream_max_dpb: HashMap<String, usize>,
}

impl State {
    fn new() -> Self {
        State {
            ongoing: 0,
            last_record_time: None,
            total_wall_time: Duration::ZERO,
            overall: StreamProfiler::new(),
            per_stream: HashMap::new(),
            ongoing_records: HashMap::new(),
            stream_max_dpb: HashMap::new(),
        }
    }

    fn advance_wall_time(&mut self, now: i64) {
        if let Some(last) = self.last_record_time {
            if now > last {
                self.total_wall_time += Duration::from_nanos((now - last) as u64);
            }
            self.overall.update_wall_time(self.total_wall_time);
            for sp in self.per_stream.values_mut() {
                sp.update_wall_time(self.total_wall_time);
            }
        }
    }

    /// The useless-record sweep: find the start matching `key`, retiring
    /// earlier ongoing entries whose skip counter has exceeded the DPB
    /// bound. Returns `(start_time, removed_count)` where `removed_count`
    /// is `1 + dropped_count`.
    fn sweep(&mut self, stream: &str, key: &RecordKey, max_dpb_size: usize) -> Option<(i64, u32)> {
        let max = *self.stream_max_dpb.get(stream).unwrap_or(&max_dpb_size);
        let list = self.ongoing_records.get_mut(stream)?;
        let idx = list.iter().position(|e| &e.key == key)?;

        let mut removed = 0u32;
        let mut start_time = 0i64;
        let mut survivors = Vec::with_capacity(list.len());
        for (pos, mut entry) in list.drain(..).enumerate() {
            if pos == idx {
                start_time = entry.start_time;
                removed += 1;
                continue;
            }
            if pos < idx {
                entry.skip_count += 1;
                // Reaching the DPB bound (not merely exceeding it) retires
                // the entry: with MAX_DPB_SIZE = 16, the 16th skip is the
                // one that sweeps it away, matching the seed scenario's
                // `dropped = 2` after exactly 16 end events.
                if entry.skip_count as usize >= max {
                    removed += 1;
                    continue;
                }
            }
            survivors.push(entry);
        }
        *list = survivors;
        Some((start_time, removed))
    }
}

/// Owns the drop policy and aggregation for one named process region.
pub struct ProcessProfiler {
    config: ProcessProfilerConfig,
    tracer: Option<Arc<Tracer>>,
    state: Mutex<State>,
}

impl ProcessProfiler {
    pub fn new(config: ProcessProfilerConfig, tracer: Option<Arc<Tracer>>) -> Self {
        ProcessProfiler {
            config,
            tracer,
            state: Mutex::new(State::new()),
        }
    }

    pub fn process_name(&self) -> &str {
        &self.config.process_name
    }

    /// Override the DPB bound for one stream (analogous to the reference's
    /// `OnStreamStart`).
    pub fn on_stream_start(&self, stream_id: impl Into<String>, max_dpb_size: usize) {
        self.state.lock().stream_max_dpb.insert(stream_id.into(), max_dpb_size);
    }

    fn emit_trace(&self, key: &RecordKey, now: i64, event_type: TraceEventType) {
        if !self.config.enable_tracing {
            return;
        }
        if let Some(tracer) = &self.tracer {
            let module = self.config.module_name.clone().unwrap_or_default();
            tracer.record_raw(key.clone(), module, self.config.process_name.clone(), now, self.config.trace_level, event_type);
        }
    }

    pub fn record_start(&self, key: &RecordKey, now: i64) {
        self.emit_trace(key, now, TraceEventType::Start);
        if !self.config.enable_profiling {
            return;
        }
        let mut state = self.state.lock();
        if state.ongoing > 0 {
            state.advance_wall_time(now);
        }
        state
            .ongoing_records
            .entry(key.stream_id.clone())
            .or_default()
            .push(OngoingEntry {
                key: key.clone(),
                start_time: now,
                skip_count: 0,
            });
        state.last_record_time = Some(now);
        state.ongoing += 1;
        state.per_stream.entry(key.stream_id.clone()).or_insert_with(StreamProfiler::new);
    }

    pub fn record_end(&self, key: &RecordKey, now: i64) {
        self.emit_trace(key, now, TraceEventType::End);
        if !self.config.enable_profiling {
            return;
        }
        let mut state = self.state.lock();
        let max_dpb = self.config.max_dpb_size;
        let found = state.sweep(&key.stream_id, key, max_dpb);

        match found {
            None => {
                if state.last_record_time.is_some() {
                    state.advance_wall_time(now);
                }
                state.overall.add_completed();
                state
                    .per_stream
                    .entry(key.stream_id.clone())
                    .or_insert_with(StreamProfiler::new)
                    .add_completed();
            }
            Some((start_time, removed_count)) => {
                if state.ongoing > 0 {
                    state.advance_wall_time(now);
                }
                let latency = Duration::from_nanos((now - start_time).max(0) as u64);
                state.overall.add_latency(latency);
                state
                    .per_stream
                    .entry(key.stream_id.clone())
                    .or_insert_with(StreamProfiler::new)
                    .add_latency(latency);
                state.ongoing = state.ongoing.saturating_sub(removed_count as u64);
                if removed_count > 1 {
                    let dropped = (removed_count - 1) as u64;
                    state.overall.add_dropped(dropped);
                    state.per_stream.get_mut(&key.stream_id).unwrap().add_dropped(dropped);
                }
                state.overall.add_completed();
                state.per_stream.get_mut(&key.stream_id).unwrap().add_completed();
            }
        }
        state.last_record_time = Some(now);
    }

    /// Every remaining ongoing record for `stream_id` is counted as
    /// dropped and the stream's accumulators are removed; subsequent
    /// `get_profile` calls no longer return it.
    pub fn on_stream_eos(&self, stream_id: &str) {
        let mut state = self.state.lock();
        if let Some(ongoing) = state.ongoing_records.remove(stream_id) {
            let n = ongoing.len() as u64;
            state.ongoing = state.ongoing.saturating_sub(n);
            state.overall.add_dropped(n);
        }
        state.per_stream.remove(stream_id);
        state.stream_max_dpb.remove(stream_id);
    }

    pub fn get_profile(&self) -> ProcessProfile {
        let state = self.state.lock();
        let overall = state.overall.get_profile(self.config.process_name.clone());
        let mut per_stream: Vec<_> = state
            .per_stream
            .iter()
            .map(|(id, sp)| sp.get_profile(id.clone()))
            .collect();
        per_stream.sort_by(|a, b| a.stream_id.cmp(&b.stream_id));
        ProcessProfile {
            process_name: self.config.process_name.clone(),
            module_name: self.config.module_name.clone(),
            completed: overall.completed,
            dropped: overall.dropped,
            counter: overall.counter,
            fps: overall.fps,
            latency_ms: overall.latency_ms,
            min_latency_ms: overall.min_latency_ms,
            max_latency_ms: overall.max_latency_ms,
            per_stream,
        }
    }

    /// Pure replay: construct a fresh, empty profiler (profiling on,
    /// tracing off) and feed it every element of `trace` in order.
    pub fn get_profile_from_trace(
        process_name: impl Into<String>,
        trace_level: TraceLevel,
        trace: &framegraph_domain::trace::ProcessTrace,
        max_dpb_size: usize,
    ) -> ProcessProfile {
        let mut config = ProcessProfilerConfig::new(process_name, trace_level);
        config.enable_tracing = false;
        config.max_dpb_size = max_dpb_size;
        let replay = ProcessProfiler::new(config, None);
        for elem in trace {
            match elem.event_type {
                TraceEventType::Start => replay.record_start(&elem.key, elem.time),
                TraceEventType::End => replay.record_end(&elem.key, elem.time),
            }
        }
        replay.get_profile()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegraph_domain::record_key::RecordKey;

    fn config() -> ProcessProfilerConfig {
        let mut c = ProcessProfilerConfig::new("PROCESS", TraceLevel::Pipeline);
        c.enable_tracing = false;
        c
    }

    /// Scenario A: 2 starts without ends, then 16 start/end pairs.
    #[test]
    fn scenario_a_drop_accounting() {
        let p = ProcessProfiler::new(config(), None);
        p.record_start(&RecordKey::new("s1", 0), 0);
        p.record_start(&RecordKey::new("s1", 1), 1);
        for ts in 2..18i64 {
            p.record_start(&RecordKey::new("s1", ts), ts);
            p.record_end(&RecordKey::new("s1", ts), ts);
        }
        let profile = p.get_profile();
        assert_eq!(profile.dropped, 2);
        assert_eq!(profile.completed, 16);
    }

    /// Scenario B: replay [start(0,50ms) start(1,100ms) end(0,200ms) end(1,300ms)].
    #[test]
    fn scenario_b_replay() {
        use framegraph_domain::record_key::TraceEventType as T;
        use framegraph_domain::trace::TraceElem;

        let trace: framegraph_domain::trace::ProcessTrace = vec![
            TraceElem { key: RecordKey::new("s1", 0), time: 50_000_000, event_type: T::Start },
            TraceElem { key: RecordKey::new("s1", 1), time: 100_000_000, event_type: T::Start },
            TraceElem { key: RecordKey::new("s1", 0), time: 200_000_000, event_type: T::End },
            TraceElem { key: RecordKey::new("s1", 1), time: 300_000_000, event_type: T::End },
        ];
        let profile = ProcessProfiler::get_profile_from_trace("PROCESS", TraceLevel::Pipeline, &trace, DEFAULT_MAX_DPB_SIZE);
        assert_eq!(profile.completed, 2);
        assert_eq!(profile.dropped, 0);
        assert!((profile.latency_ms - 175.0).abs() < 1e-6);
        assert!((profile.min_latency_ms - 150.0).abs() < 1e-6);
        assert!((profile.max_latency_ms - 200.0).abs() < 1e-6);
        assert!((profile.fps - 8.0).abs() < 1e-6);
    }

    #[test]
    fn eos_drops_ongoing_and_forgets_stream() {
        let p = ProcessProfiler::new(config(), None);
        p.record_start(&RecordKey::new("s1", 0), 0);
        p.record_start(&RecordKey::new("s1", 1), 1);
        p.on_stream_eos("s1");
        let profile = p.get_profile();
        assert_eq!(profile.dropped, 2);
        assert!(profile.per_stream.is_empty());
    }

    #[test]
    fn end_without_start_still_counts_completed_with_no_latency() {
        let p = ProcessProfiler::new(config(), None);
        p.record_end(&RecordKey::new("s1", 0), 100);
        let profile = p.get_profile();
        assert_eq!(profile.completed, 1);
        assert_eq!(profile.dropped, 0);
    }
}
