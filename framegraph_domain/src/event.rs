// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Event bus data model, grounded on
//! `modules/core/include/cnstream_eventbus.hpp` and the `DefaultBusWatch`
//! policy in `cnstream_pipeline.cpp`.

use serde::{Deserialize, Serialize};

/// Bus event categories. `Invalid` is a sentinel never posted by the
/// pipeline itself; the `User(_)` range is reserved for application-defined
/// events, matching the original header's reserved end-of-enum range.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum EventType {
    Invalid,
    Error,
    Warning,
    Eos,
    StreamError,
    StreamFrameError,
    Stop,
    User(u32),
}

/// A watcher's verdict after observing an event, mirroring
/// `EventHandleFlag` in the reference bus.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EventHandleFlag {
    Null,
    Interception,
    Synced,
    Stop,
}

/// One posted bus event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Event {
    pub event_type: EventType,
    pub module_name: String,
    pub stream_id: Option<String>,
    pub message: String,
}

impl Event {
    /// The default bus-watch policy (§4.8 / §7): process-level and
    /// explicit stop events are fatal, everything else is handled and the
    /// pipeline continues.
    pub fn default_handle_flag(&self) -> EventHandleFlag {
        match self.event_type {
            EventType::Error | EventType::Stop => EventHandleFlag::Stop,
            EventType::Warning | EventType::Eos | EventType::StreamError | EventType::StreamFrameError => {
                EventHandleFlag::Synced
            }
            EventType::Invalid | EventType::User(_) => EventHandleFlag::Null,
        }
    }
}

/// Message delivered to the application's `StreamMsgObserver` after the
/// default watch translates a bus event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum StreamMsg {
    Error { stream_id: Option<String>, module_name: String, message: String },
    FrameError { stream_id: String, pts: i64 },
    StreamError { stream_id: String, message: String },
    Eos { stream_id: String },
    Stop,
}
