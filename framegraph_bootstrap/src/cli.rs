// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! # CLI Argument Parsing
//!
//! Command-line surface for the pipeline runner binary, plus validation
//! that turns raw [`Cli`] args into a [`ValidatedCli`] the rest of the
//! application can trust (paths exist, numeric ranges are sane).

use clap::Parser;
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Pipeline runner command-line arguments.
#[derive(Debug, Parser)]
#[command(name = "framegraph", version, about = "Runs a framegraph pipeline from a TOML configuration file")]
pub struct Cli {
    /// Path to the pipeline's TOML configuration file (stages, parallelism,
    /// profiler settings).
    #[arg(long, value_name = "PATH")]
    pub config_fname: PathBuf,

    /// One or more input sources to feed the head stage, in order.
    #[arg(long, value_name = "PATH", num_args = 1.., conflicts_with = "data_name")]
    pub data_path: Vec<PathBuf>,

    /// A single named input source; shorthand for `--data-path` with one entry.
    #[arg(long, value_name = "PATH", conflicts_with = "data_path")]
    pub data_name: Option<PathBuf>,

    /// Replay the input source list indefinitely instead of stopping at EOS.
    #[arg(long = "loop")]
    pub looped: bool,

    /// Caps the rate at which frames are injected into the head stage, in
    /// frames per second. Unset means inject as fast as downstream permits.
    #[arg(long, value_name = "FPS")]
    pub src_frame_rate: Option<f64>,

    /// Seconds to wait for a graceful stop after a shutdown signal before
    /// the process exits anyway.
    #[arg(long, value_name = "SECS", default_value_t = 10)]
    pub wait_time: u64,

    /// Directory the tracer's raw trace dumps are written to, for offline
    /// replay via `get_profile_from_trace`. Unset disables trace persistence.
    #[arg(long, value_name = "DIR")]
    pub trace_data_dir: Option<PathBuf>,

    /// Emit structured JSON logs instead of human-readable text.
    #[arg(long)]
    pub json_logs: bool,

    /// Increase log verbosity (-v, -vv); ignored if `RUST_LOG` is set.
    #[arg(short, long, action = clap::ArgAction::Count)]
    pub verbose: u8,
}

/// Errors raised while parsing or validating CLI arguments.
#[derive(Debug, Error)]
pub enum ParseError {
    #[error("clap failed to parse arguments: {0}")]
    Clap(#[from] clap::Error),

    #[error("neither --data-path nor --data-name was given")]
    MissingDataSource,

    #[error("config file does not exist: {0}")]
    ConfigNotFound(PathBuf),

    #[error("input source does not exist: {0}")]
    DataSourceNotFound(PathBuf),

    #[error("--src-frame-rate must be positive, got {0}")]
    InvalidFrameRate(f64),
}

/// CLI arguments after validation: paths are confirmed to exist and the
/// data-source variants are folded into a single ordered list.
#[derive(Debug, Clone)]
pub struct ValidatedCli {
    pub config_fname: PathBuf,
    pub data_sources: Vec<PathBuf>,
    pub looped: bool,
    pub src_frame_rate: Option<f64>,
    pub wait_time: std::time::Duration,
    pub trace_data_dir: Option<PathBuf>,
    pub json_logs: bool,
    pub verbose: u8,
}

impl Cli {
    /// Validates the parsed arguments, checking filesystem existence and
    /// numeric ranges that clap's own value parser can't express.
    pub fn validate(self) -> Result<ValidatedCli, ParseError> {
        if !self.config_fname.exists() {
            return Err(ParseError::ConfigNotFound(self.config_fname));
        }

        let data_sources = resolve_data_sources(&self.data_path, self.data_name.as_deref())?;
        for path in &data_sources {
            if !path.exists() {
                return Err(ParseError::DataSourceNotFound(path.clone()));
            }
        }

        if let Some(rate) = self.src_frame_rate {
            if !(rate > 0.0) {
                return Err(ParseError::InvalidFrameRate(rate));
            }
        }

        Ok(ValidatedCli {
            config_fname: self.config_fname,
            data_sources,
            looped: self.looped,
            src_frame_rate: self.src_frame_rate,
            wait_time: std::time::Duration::from_secs(self.wait_time),
            trace_data_dir: self.trace_data_dir,
            json_logs: self.json_logs,
            verbose: self.verbose,
        })
    }
}

fn resolve_data_sources(data_path: &[PathBuf], data_name: Option<&Path>) -> Result<Vec<PathBuf>, ParseError> {
    if let Some(name) = data_name {
        return Ok(vec![name.to_path_buf()]);
    }
    if data_path.is_empty() {
        return Err(ParseError::MissingDataSource);
    }
    Ok(data_path.to_vec())
}

/// Parses `std::env::args_os()` and validates the result. Clap handles
/// `--help`/`--version` and exits the process on its own.
pub fn parse_and_validate() -> Result<ValidatedCli, ParseError> {
    let cli = Cli::try_parse()?;
    cli.validate()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn base_args(extra: &[&str]) -> Vec<String> {
        let mut args = vec!["framegraph".to_string(), "--config-fname".to_string(), file!().to_string()];
        args.extend(extra.iter().map(|s| s.to_string()));
        args
    }

    #[test]
    fn rejects_missing_data_source() {
        let args = base_args(&[]);
        let cli = Cli::try_parse_from(&args).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(matches!(err, ParseError::MissingDataSource));
    }

    #[test]
    fn data_name_and_data_path_are_mutually_exclusive() {
        let args = base_args(&["--data-name", file!(), "--data-path", file!()]);
        assert!(Cli::try_parse_from(&args).is_err());
    }

    #[test]
    fn validates_config_path_existence() {
        let cli = Cli::try_parse_from(["framegraph", "--config-fname", "/no/such/file.toml", "--data-name", file!()]).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(matches!(err, ParseError::ConfigNotFound(_)));
    }

    #[test]
    fn accepts_valid_minimal_invocation() {
        let args = base_args(&["--data-name", file!()]);
        let cli = Cli::try_parse_from(&args).unwrap();
        let validated = cli.validate().unwrap();
        assert_eq!(validated.data_sources.len(), 1);
        assert_eq!(validated.wait_time, std::time::Duration::from_secs(10));
    }

    #[test]
    fn rejects_non_positive_frame_rate() {
        let args = base_args(&["--data-name", file!(), "--src-frame-rate", "0"]);
        let cli = Cli::try_parse_from(&args).unwrap();
        let err = cli.validate().unwrap_err();
        assert!(matches!(err, ParseError::InvalidFrameRate(_)));
    }
}
