// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Domain error taxonomy.
//!
//! Mirrors the four error classes a pipeline can produce: build, process,
//! frame, and stream level (see the error handling design in the workspace
//! README). Workers never panic to the caller; they translate failures into
//! one of these variants and post a bus event.

use thiserror::Error;

/// The error type threaded through build, start, routing, and config.
#[derive(Debug, Error)]
pub enum PipelineError {
    /// Topology invalid, duplicate stage names, or a stage's `open()` failed.
    #[error("pipeline build failed: {0}")]
    Build(String),

    #[error("stage '{stage}' has invalid parallelism {value} (must be >= 1)")]
    InvalidParallelism { stage: String, value: u32 },

    #[error("stage '{stage}' has invalid queue capacity {value} (must be >= 1)")]
    InvalidQueueCapacity { stage: String, value: u32 },

    #[error("stream capacity exceeded (max {max})")]
    StreamCapacityExceeded { max: u32 },

    #[error("module capacity exceeded (max {max})")]
    ModuleCapacityExceeded { max: u32 },

    /// A stage's `process()` returned a negative code.
    #[error("stage '{stage}' process failed with code {code}")]
    ProcessFailed { stage: String, code: i32 },

    /// Frame arrived flagged invalid.
    #[error("invalid frame on stream '{stream_id}' at pts {pts}")]
    FrameInvalid { stream_id: String, pts: i64 },

    /// A source handed `provide_data` a frame that isn't freshly minted.
    #[error("frame provided on stream '{stream_id}' already has a non-zero modules_mask")]
    FrameNotFresh { stream_id: String },

    /// Source adapter reported a stream died.
    #[error("stream '{stream_id}' error: {reason}")]
    StreamError { stream_id: String, reason: String },

    #[error("configuration error: {0}")]
    Config(String),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl PipelineError {
    /// Whether this error is fatal to the whole pipeline by default policy.
    ///
    /// Mirrors the default event-bus watch: process-level and build-level
    /// failures stop the pipeline; frame- and stream-level failures are
    /// recoverable (the pipeline drops the frame or removes the stream and
    /// continues).
    pub fn is_fatal(&self) -> bool {
        matches!(
            self,
            PipelineError::Build(_)
                | PipelineError::InvalidParallelism { .. }
                | PipelineError::InvalidQueueCapacity { .. }
                | PipelineError::StreamCapacityExceeded { .. }
                | PipelineError::ModuleCapacityExceeded { .. }
                | PipelineError::ProcessFailed { .. }
        )
    }

    /// Whether the pipeline should continue running after this error,
    /// merely excising the affected stream or frame.
    pub fn is_recoverable(&self) -> bool {
        !self.is_fatal()
    }
}
