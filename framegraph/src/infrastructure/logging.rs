// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Process-wide tracing subscriber setup: human-readable for a terminal,
//! JSON for log aggregation, selected by the bootstrap CLI's `--json-logs`
//! flag.

use tracing_subscriber::{fmt, EnvFilter};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LogFormat {
    Human,
    Json,
}

/// Installs the global subscriber. Panics if called more than once per
/// process (mirrors `tracing`'s own behavior); call it exactly once from
/// `main`.
pub fn init_subscriber(format: LogFormat) {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));
    match format {
        LogFormat::Human => fmt().with_env_filter(filter).with_target(true).init(),
        LogFormat::Json => fmt().with_env_filter(filter).json().with_target(true).init(),
    }
}
