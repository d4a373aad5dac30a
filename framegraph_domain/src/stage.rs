// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Stage and source contracts: the interfaces external collaborators
//! (concrete decoders, inference, rendering stages, source adapters)
//! implement. Concrete implementations are out of scope for this crate;
//! only these traits are.

use std::sync::Arc;

use crate::frame::Frame;

/// A processing node in the DAG.
///
/// `open`/`close` bracket the stage's lifetime; `process` is invoked once
/// per frame off a dedicated worker thread and must not block indefinitely.
pub trait Stage<P>: Send + Sync {
    /// Called once before any `process` call. Returning `false` aborts
    /// pipeline start; stages already opened are closed in open order.
    fn open(&self) -> bool {
        true
    }

    /// Called once after all processing, only if `open` returned `true`.
    fn close(&self) {}

    /// `0` on success (the frame may have been transmitted, dropped, or
    /// held for later), negative to signal failure. A negative return
    /// causes the pipeline to post an `ERROR` event with this stage's name
    /// and the returned code.
    fn process(&self, frame: Arc<Frame<P>>) -> i32;

    /// Fired by the pipeline when a frame has cleared this stage (after
    /// `on_process_end`, before routing to children).
    fn on_frame_done(&self, _frame: &Frame<P>) {}
}

/// Head-stage contract: sources additionally manage stream handlers instead
/// of draining a Conveyor; they call `provide_data` to inject fresh frames.
pub trait Source<P>: Stage<P> {
    fn add_source(&self, handler: Arc<dyn SourceHandler<P>>);
    fn remove_source(&self, stream_id: &str, force: bool);
    fn remove_sources(&self, force: bool);
}

/// One stream's feed into a `Source` stage.
pub trait SourceHandler<P>: Send + Sync {
    fn open(&self) -> bool;
    fn close(&self);
    fn stream_id(&self) -> &str;
}
