// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The DAG runtime: conveyors, the connector, stream id allocation, the
//! event bus, and the pipeline controller that ties them together.

pub mod connector;
pub mod conveyor;
pub mod event_bus;
pub mod id_allocator;
pub mod pipeline_controller;

pub use connector::Connector;
pub use conveyor::Conveyor;
pub use event_bus::{EventBus, StreamMsgQueue};
pub use id_allocator::StreamIdAllocator;
pub use pipeline_controller::PipelineController;
