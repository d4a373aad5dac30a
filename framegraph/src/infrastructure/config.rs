// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline configuration: TOML on disk, overridable by `FRAMEGRAPH_*`
//! environment variables, loaded through the `config` crate the same way
//! the bootstrap layer's CLI surface expects.

use serde::{Deserialize, Serialize};

use framegraph_domain::topology::StageSpec;

fn default_tracer_capacity() -> usize {
    100_000
}

fn default_true() -> bool {
    true
}

/// One stage's configuration, as parsed from `[[stage]]` TOML tables before
/// being handed to [`framegraph_domain::topology::Topology::build`].
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageConfig {
    pub name: String,
    #[serde(default = "one")]
    pub parallelism: u32,
    #[serde(default = "default_queue_capacity")]
    pub queue_capacity: u32,
    #[serde(default)]
    pub next: Vec<String>,
}

fn one() -> u32 {
    1
}

fn default_queue_capacity() -> u32 {
    32
}

impl From<StageConfig> for StageSpec {
    fn from(c: StageConfig) -> Self {
        StageSpec {
            name: c.name,
            parallelism: c.parallelism,
            queue_capacity: c.queue_capacity,
            next: c.next,
        }
    }
}

/// Profiler/tracer sizing, independent of any one stage.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ProfilerConfig {
    #[serde(default = "default_true")]
    pub enable_profiling: bool,
    #[serde(default = "default_true")]
    pub enable_tracing: bool,
    #[serde(default = "default_tracer_capacity")]
    pub tracer_capacity: usize,
    #[serde(default = "default_max_dpb_size")]
    pub max_dpb_size: usize,
}

fn default_max_dpb_size() -> usize {
    crate::infrastructure::profiler::DEFAULT_MAX_DPB_SIZE
}

impl Default for ProfilerConfig {
    fn default() -> Self {
        ProfilerConfig {
            enable_profiling: true,
            enable_tracing: true,
            tracer_capacity: default_tracer_capacity(),
            max_dpb_size: default_max_dpb_size(),
        }
    }
}

/// Top-level pipeline configuration, as loaded from a config file.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PipelineConfig {
    #[serde(rename = "stage", default)]
    pub stages: Vec<StageConfig>,
    #[serde(default)]
    pub profiler: ProfilerConfig,
}

/// Loads a [`PipelineConfig`] from a TOML file, letting `FRAMEGRAPH_*`
/// environment variables (e.g. `FRAMEGRAPH_PROFILER__TRACER_CAPACITY`)
/// override individual fields, matching the bootstrap CLI's
/// `--config-fname` flag.
pub struct ConfigLoader;

impl ConfigLoader {
    pub fn load(path: &std::path::Path) -> Result<PipelineConfig, framegraph_domain::PipelineError> {
        let settings = config::Config::builder()
            .add_source(config::File::from(path))
            .add_source(config::Environment::with_prefix("FRAMEGRAPH").separator("__"))
            .build()
            .map_err(|e| framegraph_domain::PipelineError::Config(e.to_string()))?;
        settings
            .try_deserialize()
            .map_err(|e| framegraph_domain::PipelineError::Config(e.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn stage_config_defaults_match_topology_minimums() {
        let toml = r#"
            name = "decode"
        "#;
        let cfg: StageConfig = toml::from_str(toml).unwrap();
        assert_eq!(cfg.parallelism, 1);
        assert_eq!(cfg.queue_capacity, 32);
        assert!(cfg.next.is_empty());
    }

    #[test]
    fn profiler_config_default_tracer_capacity() {
        let cfg = ProfilerConfig::default();
        assert_eq!(cfg.tracer_capacity, 100_000);
        assert_eq!(cfg.max_dpb_size, 16);
    }
}
