// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Framegraph Domain
//!
//! Pure data model and traits for the streaming pipeline framework: frames,
//! DAG topology, stage/source contracts, and the profiler/tracer data model.
//!
//! ## Design Principles
//!
//! - **No I/O, no runtime.** This crate has no `tokio`, no `tracing`, no
//!   `anyhow`. Logging is an infrastructure concern; errors are reported
//!   through [`error::PipelineError`] alone.
//! - **Everything here is pure data or a trait.** The lock-free ring, the
//!   worker threads, and the event bus live in the `framegraph` crate.

pub mod error;
pub mod event;
pub mod frame;
pub mod ids;
pub mod profile;
pub mod record_key;
pub mod stage;
pub mod topology;
pub mod trace;

pub use error::PipelineError;
pub use frame::{Frame, FrameFlags};
pub use ids::{StageId, StreamIndex, MAX_MODULES, MAX_STREAMS};
pub use record_key::{RecordKey, TraceEventType, TraceLevel};
pub use stage::{Source, SourceHandler, Stage};
pub use topology::{StageNode, Topology, TopologyError};
