// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # Exit Code Management
//!
//! Standardized Unix exit codes following BSD `sysexits.h` conventions.
//!
//! ## Exit Code Conventions
//!
//! - **0**: Success
//! - **1**: General error
//! - **64-78**: Specific error conditions (BSD sysexits.h)
//! - **130/143**: Fatal signal (SIGINT/SIGTERM)
//!
//! ## Usage
//!
//! ```rust,no_run
//! use framegraph_bootstrap::exit_code::{result_to_exit_code, ExitCode};
//!
//! fn run_application() -> Result<(), Box<dyn std::error::Error>> {
//!     Ok(())
//! }
//!
//! fn main() {
//!     let code = result_to_exit_code(run_application());
//!     std::process::exit(code.as_i32());
//! }
//! ```

use std::fmt;

/// Exit codes following Unix conventions (BSD sysexits.h).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
#[repr(i32)]
pub enum ExitCode {
    #[default]
    Success = 0,
    Error = 1,
    /// Invalid arguments, missing required arguments, unknown flags.
    UsageError = 64,
    /// Malformed configuration or input data.
    DataError = 65,
    /// Input file not found or unreadable.
    NoInput = 66,
    /// Required external service unreachable.
    Unavailable = 69,
    /// Unexpected internal error (assertion failure, invariant violation).
    Software = 70,
    /// OS-level failure (thread spawn, syscall).
    OsError = 71,
    /// I/O error while reading or writing.
    IoError = 74,
    /// Insufficient privileges.
    NoPerm = 77,
    /// Invalid or missing configuration.
    Config = 78,
    /// SIGINT (Ctrl+C).
    Interrupted = 130,
    /// SIGTERM.
    Terminated = 143,
}

impl ExitCode {
    pub fn as_i32(self) -> i32 {
        self as i32
    }

    /// Maps a [`framegraph_domain::PipelineError`] to its exit code,
    /// mirroring the error's own fatal/recoverable classification: anything
    /// fatal to the pipeline is `Software`, the rest map by variant.
    pub fn from_pipeline_error(error: &framegraph_domain::PipelineError) -> Self {
        use framegraph_domain::PipelineError as E;
        match error {
            E::Build(_) | E::InvalidParallelism { .. } | E::InvalidQueueCapacity { .. } => ExitCode::Config,
            E::StreamCapacityExceeded { .. } | E::ModuleCapacityExceeded { .. } => ExitCode::Software,
            E::ProcessFailed { .. } => ExitCode::Software,
            E::FrameInvalid { .. } | E::FrameNotFresh { .. } | E::StreamError { .. } => ExitCode::DataError,
            E::Config(_) => ExitCode::Config,
            E::Io(_) => ExitCode::IoError,
        }
    }

    /// Falls back to a string-sniffing heuristic for error types this crate
    /// doesn't know about (CLI parse errors, config-loader errors, ...).
    pub fn from_error(error: &dyn std::error::Error) -> Self {
        let text = error.to_string().to_lowercase();
        if text.contains("permission") || text.contains("access denied") {
            ExitCode::NoPerm
        } else if text.contains("not found") || text.contains("no such") {
            ExitCode::NoInput
        } else if text.contains("invalid") || text.contains("argument") {
            ExitCode::UsageError
        } else if text.contains("parse") || text.contains("format") {
            ExitCode::DataError
        } else if text.contains("config") {
            ExitCode::Config
        } else if text.contains("unavailable") {
            ExitCode::Unavailable
        } else if text.contains("io") || text.contains("read") || text.contains("write") {
            ExitCode::IoError
        } else {
            ExitCode::Error
        }
    }

    pub fn description(self) -> &'static str {
        match self {
            ExitCode::Success => "Success",
            ExitCode::Error => "General error",
            ExitCode::UsageError => "Command line usage error",
            ExitCode::DataError => "Data format error",
            ExitCode::NoInput => "Cannot open input",
            ExitCode::Unavailable => "Service unavailable",
            ExitCode::Software => "Internal software error",
            ExitCode::OsError => "System error",
            ExitCode::IoError => "I/O error",
            ExitCode::NoPerm => "Permission denied",
            ExitCode::Config => "Configuration error",
            ExitCode::Interrupted => "Interrupted by signal (SIGINT)",
            ExitCode::Terminated => "Terminated by signal (SIGTERM)",
        }
    }

    pub fn is_success(self) -> bool {
        matches!(self, ExitCode::Success)
    }

    pub fn is_signal(self) -> bool {
        matches!(self, ExitCode::Interrupted | ExitCode::Terminated)
    }
}

impl fmt::Display for ExitCode {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{} ({})", self.description(), self.as_i32())
    }
}

impl From<ExitCode> for i32 {
    fn from(code: ExitCode) -> i32 {
        code.as_i32()
    }
}

/// Maps a generic `Result` to an [`ExitCode`], logging the error (if any)
/// before translating it.
pub fn map_error_to_exit_code<E: std::error::Error>(error: &E) -> ExitCode {
    tracing::error!(error = %error, "application exited with an error");
    ExitCode::from_error(error)
}

pub fn result_to_exit_code<T, E: std::error::Error>(result: Result<T, E>) -> ExitCode {
    match result {
        Ok(_) => ExitCode::Success,
        Err(e) => map_error_to_exit_code(&e),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn exit_code_values_match_sysexits() {
        assert_eq!(ExitCode::Success.as_i32(), 0);
        assert_eq!(ExitCode::UsageError.as_i32(), 64);
        assert_eq!(ExitCode::Config.as_i32(), 78);
        assert_eq!(ExitCode::Interrupted.as_i32(), 130);
        assert_eq!(ExitCode::Terminated.as_i32(), 143);
    }

    #[test]
    fn from_pipeline_error_maps_build_to_config() {
        let err = framegraph_domain::PipelineError::Build("bad topology".into());
        assert_eq!(ExitCode::from_pipeline_error(&err), ExitCode::Config);
    }

    #[test]
    fn from_pipeline_error_maps_process_failed_to_software() {
        let err = framegraph_domain::PipelineError::ProcessFailed {
            stage: "decode".into(),
            code: -1,
        };
        assert_eq!(ExitCode::from_pipeline_error(&err), ExitCode::Software);
    }

    #[test]
    fn result_to_exit_code_maps_ok_to_success() {
        let result: Result<(), std::io::Error> = Ok(());
        assert_eq!(result_to_exit_code(result), ExitCode::Success);
    }
}
