// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Lock-free tracing and drop-aware profiling for the pipeline runtime.

pub mod circular_buffer;
pub mod clock;
pub mod module_profiler;
pub mod pipeline_profiler;
pub mod pipeline_tracer;
pub mod process_profiler;

pub use module_profiler::ModuleProfiler;
pub use pipeline_profiler::PipelineProfiler;
pub use pipeline_tracer::Tracer;
pub use process_profiler::{ProcessProfiler, ProcessProfilerConfig, DEFAULT_MAX_DPB_SIZE};
