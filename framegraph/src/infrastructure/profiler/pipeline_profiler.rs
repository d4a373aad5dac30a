// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline profiler: one [`ModuleProfiler`] per stage, a standalone
//! "overall" process region spanning the whole pipeline, and the shared
//! [`Tracer`]. Ported from `profiler/pipeline_profiler.{hpp,cpp}`.

use std::collections::HashMap;
use std::sync::Arc;

use framegraph_domain::profile::PipelineProfile;
use framegraph_domain::record_key::{RecordKey, TraceLevel};
use framegraph_domain::topology::Topology;

use super::pipeline_tracer::Tracer;
use super::process_profiler::{ProcessProfiler, ProcessProfilerConfig, DEFAULT_MAX_DPB_SIZE};
use super::module_profiler::ModuleProfiler;

const OVERALL_PROCESS_NAME: &str = "OVERALL";
const INPUT_QUEUE: &str = "INPUT_QUEUE";
const PROCESS: &str = "PROCESS";

/// Owns the whole pipeline's profiling state: per-stage module profilers,
/// the standalone end-to-end region, and the shared tracer every region
/// writes events into.
pub struct PipelineProfiler {
    tracer: Arc<Tracer>,
    overall: Arc<ProcessProfiler>,
    modules: HashMap<String, Arc<ModuleProfiler>>,
    stage_order: Vec<String>,
}

impl PipelineProfiler {
    /// Builds one `ModuleProfiler` per stage in `topology`, registering
    /// `"INPUT_QUEUE"` for every non-head stage (a head has nothing feeding
    /// its queue) and `"PROCESS"` for every stage, plus the standalone
    /// pipeline-level `"OVERALL"` region.
    pub fn new(topology: &Topology, tracer_capacity: usize) -> Self {
        let tracer = Arc::new(Tracer::new(tracer_capacity));
        let overall_config = ProcessProfilerConfig::new(OVERALL_PROCESS_NAME, TraceLevel::Pipeline);
        let overall = Arc::new(ProcessProfiler::new(overall_config, Some(tracer.clone())));

        let mut modules = HashMap::new();
        let mut stage_order = Vec::with_capacity(topology.stages.len());
        for stage in &topology.stages {
            let module = Arc::new(ModuleProfiler::new(stage.name.clone(), Some(tracer.clone())));
            if !stage.is_head() {
                module.register_process(INPUT_QUEUE);
            }
            module.register_process(PROCESS);
            stage_order.push(stage.name.clone());
            modules.insert(stage.name.clone(), module);
        }

        PipelineProfiler {
            tracer,
            overall,
            modules,
            stage_order,
        }
    }

    pub fn tracer(&self) -> &Arc<Tracer> {
        &self.tracer
    }

    pub fn module(&self, stage_name: &str) -> Option<&Arc<ModuleProfiler>> {
        self.modules.get(stage_name)
    }

    /// Record one frame entering `stage_name`'s input queue.
    pub fn record_input_start(&self, stage_name: &str, key: &RecordKey, now: i64) {
        if let Some(module) = self.modules.get(stage_name) {
            if let Some(process) = module.process(INPUT_QUEUE) {
                process.record_start(key, now);
            }
        }
    }

    pub fn record_input_end(&self, stage_name: &str, key: &RecordKey, now: i64) {
        if let Some(module) = self.modules.get(stage_name) {
            if let Some(process) = module.process(INPUT_QUEUE) {
                process.record_end(key, now);
            }
        }
    }

    /// Record `stage_name::process(frame)`, also feeding the standalone
    /// overall region when this stage is the pipeline's head.
    pub fn record_process_start(&self, stage_name: &str, key: &RecordKey, now: i64, is_head: bool) {
        if is_head {
            self.overall.record_start(key, now);
        }
        if let Some(module) = self.modules.get(stage_name) {
            if let Some(process) = module.process(PROCESS) {
                process.record_start(key, now);
            }
        }
    }

    pub fn record_process_end(&self, stage_name: &str, key: &RecordKey, now: i64, is_tail: bool) {
        if let Some(module) = self.modules.get(stage_name) {
            if let Some(process) = module.process(PROCESS) {
                process.record_end(key, now);
            }
        }
        if is_tail {
            self.overall.record_end(key, now);
        }
    }

    pub fn on_stream_eos(&self, stream_id: &str) {
        self.overall.on_stream_eos(stream_id);
        for module in self.modules.values() {
            module.on_stream_eos(stream_id);
        }
    }

    /// Fold live state across every registered region into one snapshot.
    pub fn get_profile(&self) -> PipelineProfile {
        let modules = self
            .stage_order
            .iter()
            .filter_map(|name| self.modules.get(name))
            .map(|m| m.get_profile())
            .collect();
        PipelineProfile {
            overall: self.overall.get_profile(),
            modules,
        }
    }

    /// Replay a time-windowed query against the tracer instead of live
    /// state. Returns an empty profile (with a warning logged) if tracing
    /// was disabled pipeline-wide, since no trace exists to replay.
    pub fn get_profile_windowed(&self, start: i64, end: i64) -> PipelineProfile {
        let trace = self.tracer.get_trace(start, end);
        if trace.is_empty() {
            tracing::warn!(start, end, "trace window is empty; no events to replay");
        }
        let overall_trace = trace.process_traces.get(OVERALL_PROCESS_NAME).cloned().unwrap_or_default();
        let overall = ProcessProfiler::get_profile_from_trace(OVERALL_PROCESS_NAME, TraceLevel::Pipeline, &overall_trace, DEFAULT_MAX_DPB_SIZE);
        let modules = self
            .stage_order
            .iter()
            .map(|name| match trace.module_traces.get(name) {
                Some(module_trace) => ModuleProfiler::get_profile_from_trace(name.clone(), module_trace),
                None => framegraph_domain::profile::ModuleProfile {
                    module_name: name.clone(),
                    processes: Vec::new(),
                },
            })
            .collect();
        PipelineProfile { overall, modules }
    }
}
