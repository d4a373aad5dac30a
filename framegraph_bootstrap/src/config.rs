// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Bootstrap Configuration
//!
//! Runtime settings derived from CLI flags, resolved before the pipeline's
//! own TOML configuration (stages, parallelism, profiler tuning) is loaded
//! via [`framegraph::infrastructure::config::ConfigLoader`]. This struct
//! only carries what the bootstrap layer itself needs to act on before a
//! `PipelineConfig` exists: which log format to install, how long to wait
//! for a graceful stop, and where to persist trace dumps.

use crate::cli::ValidatedCli;
use std::path::PathBuf;
use std::time::Duration;

/// Logging verbosity, independent of `tracing`'s own per-target filtering.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum LogLevel {
    Warn,
    #[default]
    Info,
    Debug,
    Trace,
}

impl LogLevel {
    /// Derives a level from the CLI's `-v`/`-vv` repeat count.
    pub fn from_verbosity(count: u8) -> Self {
        match count {
            0 => LogLevel::Info,
            1 => LogLevel::Debug,
            _ => LogLevel::Trace,
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            LogLevel::Warn => "warn",
            LogLevel::Info => "info",
            LogLevel::Debug => "debug",
            LogLevel::Trace => "trace",
        }
    }
}

/// Bootstrap-layer application settings, assembled from [`ValidatedCli`].
#[derive(Debug, Clone)]
pub struct AppConfig {
    pub config_fname: PathBuf,
    pub data_sources: Vec<PathBuf>,
    pub looped: bool,
    pub src_frame_rate: Option<f64>,
    pub wait_time: Duration,
    pub trace_data_dir: Option<PathBuf>,
    pub json_logs: bool,
    pub log_level: LogLevel,
}

impl From<ValidatedCli> for AppConfig {
    fn from(cli: ValidatedCli) -> Self {
        AppConfig {
            config_fname: cli.config_fname,
            data_sources: cli.data_sources,
            looped: cli.looped,
            src_frame_rate: cli.src_frame_rate,
            wait_time: cli.wait_time,
            trace_data_dir: cli.trace_data_dir,
            json_logs: cli.json_logs,
            log_level: LogLevel::from_verbosity(cli.verbose),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn verbosity_maps_to_increasing_log_levels() {
        assert_eq!(LogLevel::from_verbosity(0), LogLevel::Info);
        assert_eq!(LogLevel::from_verbosity(1), LogLevel::Debug);
        assert_eq!(LogLevel::from_verbosity(5), LogLevel::Trace);
    }

    #[test]
    fn app_config_carries_cli_fields_through() {
        let cli = ValidatedCli {
            config_fname: PathBuf::from("pipeline.toml"),
            data_sources: vec![PathBuf::from("in.bin")],
            looped: true,
            src_frame_rate: Some(30.0),
            wait_time: Duration::from_secs(5),
            trace_data_dir: None,
            json_logs: true,
            verbose: 1,
        };
        let config = AppConfig::from(cli);
        assert!(config.looped);
        assert_eq!(config.log_level, LogLevel::Debug);
        assert_eq!(config.src_frame_rate, Some(30.0));
    }
}
