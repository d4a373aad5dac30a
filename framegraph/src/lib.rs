// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Framegraph
//!
//! A modular streaming pipeline framework: stages are wired into a DAG,
//! frames flow through bounded per-edge queues on a fixed worker pool, and
//! a lock-free tracer feeds a hierarchical profiler (per-stream, per-stage,
//! whole-pipeline) without ever blocking the hot path.
//!
//! ## Layout
//!
//! - [`framegraph_domain`] (re-exported as `domain` facilities below) holds
//!   the pure data model: frames, topology, the `Stage`/`Source` traits,
//!   and the profiler/trace DTOs.
//! - [`infrastructure::runtime`] is the DAG scheduler: conveyors, the
//!   connector, the event bus, and the pipeline controller.
//! - [`infrastructure::profiler`] is the lock-free tracer plus the
//!   process/module/pipeline profiler hierarchy.
//! - [`infrastructure::config`], [`infrastructure::logging`], and
//!   [`infrastructure::metrics`] are the ambient stack: TOML configuration,
//!   structured logging, and Prometheus metrics.
//!
//! Concrete stages (decoders, encoders, inference, rendering) are not part
//! of this crate; only the scheduler and its contracts are.

pub mod infrastructure;

pub use framegraph_domain::{
    error::PipelineError,
    event::{Event, EventHandleFlag, EventType, StreamMsg},
    frame::{Frame, FrameFlags},
    ids::{StageId, StreamIndex, MAX_MODULES, MAX_STREAMS},
    profile::{ModuleProfile, PipelineProfile, ProcessProfile, StreamProfile},
    record_key::{RecordKey, TraceEventType, TraceLevel},
    stage::{Source, SourceHandler, Stage},
    topology::{StageNode, StageSpec, Topology, TopologyError},
};

pub use infrastructure::config::{ConfigLoader, PipelineConfig, ProfilerConfig, StageConfig};
pub use infrastructure::profiler::{ModuleProfiler, PipelineProfiler, ProcessProfiler, Tracer};
pub use infrastructure::runtime::{Connector, Conveyor, EventBus, PipelineController, StreamIdAllocator, StreamMsgQueue};
