// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The module profiler: one stage's named process regions, keyed by
//! `process_name`. Ported from `profiler/module_profiler.{hpp,cpp}`.

use std::collections::HashMap;
use std::sync::Arc;

use parking_lot::RwLock;

use framegraph_domain::profile::ModuleProfile;
use framegraph_domain::record_key::TraceLevel;
use framegraph_domain::trace::ModuleTrace;

use super::pipeline_tracer::Tracer;
use super::process_profiler::{ProcessProfiler, ProcessProfilerConfig, DEFAULT_MAX_DPB_SIZE};

/// Owns every named process region ("INPUT_QUEUE", "PROCESS", ...) for one
/// stage.
pub struct ModuleProfiler {
    module_name: String,
    tracer: Option<Arc<Tracer>>,
    processes: RwLock<HashMap<String, Arc<ProcessProfiler>>>,
}

impl ModuleProfiler {
    pub fn new(module_name: impl Into<String>, tracer: Option<Arc<Tracer>>) -> Self {
        ModuleProfiler {
            module_name: module_name.into(),
            tracer,
            processes: RwLock::new(HashMap::new()),
        }
    }

    pub fn module_name(&self) -> &str {
        &self.module_name
    }

    /// Create a process region owned by this module. Returns `false` if one
    /// already exists under `process_name`, leaving the existing one alone.
    pub fn register_process(&self, process_name: impl Into<String>) -> bool {
        let process_name = process_name.into();
        let mut processes = self.processes.write();
        if processes.contains_key(&process_name) {
            return false;
        }
        let config = ProcessProfilerConfig::new(process_name.clone(), TraceLevel::Module).with_module(self.module_name.clone());
        processes.insert(process_name, Arc::new(ProcessProfiler::new(config, self.tracer.clone())));
        true
    }

    pub fn process(&self, process_name: &str) -> Option<Arc<ProcessProfiler>> {
        self.processes.read().get(process_name).cloned()
    }

    pub fn on_stream_eos(&self, stream_id: &str) {
        for process in self.processes.read().values() {
            process.on_stream_eos(stream_id);
        }
    }

    /// Fold every owned process region into one module-level snapshot.
    pub fn get_profile(&self) -> ModuleProfile {
        let mut processes: Vec<_> = self.processes.read().values().map(|p| p.get_profile()).collect();
        processes.sort_by(|a, b| a.process_name.cmp(&b.process_name));
        ModuleProfile {
            module_name: self.module_name.clone(),
            processes,
        }
    }

    /// Replay this module's recorded trace instead of live state: one
    /// process region per key in `module_trace`, each reconstructed from its
    /// own `ProcessTrace`.
    pub fn get_profile_from_trace(module_name: impl Into<String>, module_trace: &ModuleTrace) -> ModuleProfile {
        let module_name = module_name.into();
        let mut processes: Vec<_> = module_trace
            .iter()
            .map(|(process_name, trace)| {
                ProcessProfiler::get_profile_from_trace(process_name.clone(), TraceLevel::Module, trace, DEFAULT_MAX_DPB_SIZE)
            })
            .collect();
        processes.sort_by(|a, b| a.process_name.cmp(&b.process_name));
        ModuleProfile { module_name, processes }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use framegraph_domain::record_key::RecordKey;

    #[test]
    fn register_process_rejects_duplicate() {
        let mp = ModuleProfiler::new("decode", None);
        assert!(mp.register_process("PROCESS"));
        assert!(!mp.register_process("PROCESS"));
    }

    #[test]
    fn get_profile_folds_all_registered_processes() {
        let mp = ModuleProfiler::new("decode", None);
        mp.register_process("INPUT_QUEUE");
        mp.register_process("PROCESS");
        mp.process("PROCESS").unwrap().record_start(&RecordKey::new("s1", 0), 0);
        mp.process("PROCESS").unwrap().record_end(&RecordKey::new("s1", 0), 1_000_000);
        let profile = mp.get_profile();
        assert_eq!(profile.module_name, "decode");
        assert_eq!(profile.processes.len(), 2);
        let process = profile.processes.iter().find(|p| p.process_name == "PROCESS").unwrap();
        assert_eq!(process.completed, 1);
    }
}
