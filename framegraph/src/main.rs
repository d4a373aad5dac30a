// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Pipeline runner binary: parses CLI arguments, loads a [`PipelineConfig`],
//! builds the DAG and starts the controller, feeds the configured data
//! sources into the head stage, and drives shutdown on SIGINT/SIGTERM.
//!
//! This binary carries no concrete processing stages of its own (decoders,
//! encoders, inference are out of scope for this crate); each configured
//! stage is wired to a [`RelayStage`] that only counts frames through, so
//! the binary is a runnable smoke test of a topology/config file rather
//! than a real media pipeline.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::Arc;

use framegraph::{ConfigLoader, Frame, PipelineController, PipelineProfiler, Stage, StageId, StageSpec, Topology};
use framegraph_bootstrap::config::AppConfig;
use framegraph_bootstrap::exit_code::ExitCode;
use framegraph_bootstrap::shutdown::ShutdownCoordinator;
use framegraph_bootstrap::signals::create_signal_handler;

/// A stage implementation that does nothing but count the frames it sees.
/// Stands in for whatever real processing a configured stage would do.
struct RelayStage {
    name: String,
    frames_seen: AtomicU64,
}

impl RelayStage {
    fn new(name: impl Into<String>) -> Self {
        RelayStage {
            name: name.into(),
            frames_seen: AtomicU64::new(0),
        }
    }
}

impl Stage<Vec<u8>> for RelayStage {
    fn open(&self) -> bool {
        tracing::info!(stage = %self.name, "stage opened");
        true
    }

    fn close(&self) {
        tracing::info!(stage = %self.name, frames = self.frames_seen.load(Ordering::Relaxed), "stage closed");
    }

    fn process(&self, _frame: Arc<Frame<Vec<u8>>>) -> i32 {
        self.frames_seen.fetch_add(1, Ordering::Relaxed);
        0
    }
}

fn load_topology(config_fname: &std::path::Path) -> Result<(Topology, framegraph::PipelineConfig), ExitCode> {
    let config = ConfigLoader::load(config_fname).map_err(|e| {
        tracing::error!(error = %e, "failed to load pipeline configuration");
        ExitCode::from_pipeline_error(&e)
    })?;
    let specs: Vec<StageSpec> = config.stages.iter().cloned().map(StageSpec::from).collect();
    let topology = Topology::build(&specs).map_err(|e| {
        tracing::error!(error = %e, "failed to build pipeline topology");
        ExitCode::Config
    })?;
    Ok((topology, config))
}

/// Reads each configured data source fully into memory and feeds it as one
/// frame to `head`, followed by an EOS frame; repeats indefinitely if
/// `looped` is set.
fn feed_head(
    controller: &PipelineController<Vec<u8>>,
    head: StageId,
    stream_id: &str,
    stream_index: u32,
    data_sources: &[PathBuf],
    looped: bool,
    stop: &std::sync::atomic::AtomicBool,
) {
    let mut frame_id = 0u64;
    'feed: loop {
        for path in data_sources {
            if stop.load(Ordering::Relaxed) {
                break 'feed;
            }
            let payload = match std::fs::read(path) {
                Ok(bytes) => bytes,
                Err(e) => {
                    tracing::warn!(path = %path.display(), error = %e, "failed to read data source, skipping");
                    continue;
                }
            };
            let timestamp = framegraph::infrastructure::profiler::clock::now_nanos();
            let frame = Arc::new(Frame::new(payload, stream_id, stream_index, timestamp, frame_id));
            frame_id += 1;
            if let Err(e) = controller.transmit(head, frame) {
                tracing::error!(error = %e, "failed to transmit frame");
                break 'feed;
            }
        }
        if !looped {
            break;
        }
    }
    let eos = Arc::new(Frame::eos(stream_id, stream_index));
    let _ = controller.transmit(head, eos);
}

#[tokio::main]
async fn main() -> std::process::ExitCode {
    let code = run().await;
    std::process::ExitCode::from(code.as_i32() as u8)
}

async fn run() -> ExitCode {
    let validated = match framegraph_bootstrap::bootstrap_cli() {
        Ok(cli) => cli,
        Err(e) => {
            eprintln!("CLI error: {e}");
            return ExitCode::UsageError;
        }
    };

    let app_config = AppConfig::from(validated.clone());
    let log_format = if app_config.json_logs {
        framegraph::infrastructure::logging::LogFormat::Json
    } else {
        framegraph::infrastructure::logging::LogFormat::Human
    };
    framegraph::infrastructure::logging::init_subscriber(log_format);
    tracing::info!(log_level = app_config.log_level.as_str(), "bootstrap starting");

    let (topology, config) = match load_topology(&validated.config_fname) {
        Ok(t) => t,
        Err(code) => return code,
    };

    let head = match topology.stages.iter().find(|s| s.is_head()) {
        Some(node) => node.id,
        None => {
            tracing::error!("topology has no head stage to inject data into");
            return ExitCode::Config;
        }
    };

    let stages: HashMap<String, Arc<dyn Stage<Vec<u8>>>> =
        topology.stages.iter().map(|node| (node.name.clone(), Arc::new(RelayStage::new(node.name.clone())) as _)).collect();

    let profiler = Arc::new(PipelineProfiler::new(&topology, config.profiler.tracer_capacity));
    let (event_bus, _stream_msgs) = framegraph::EventBus::start();
    let event_bus = Arc::new(event_bus);

    let controller = match PipelineController::build(topology, stages, profiler.clone(), event_bus) {
        Ok(c) => c,
        Err(e) => {
            tracing::error!(error = %e, "failed to build pipeline controller");
            return ExitCode::from_pipeline_error(&e);
        }
    };

    if let Err(e) = controller.start() {
        tracing::error!(error = %e, "failed to start pipeline");
        return ExitCode::from_pipeline_error(&e);
    }

    let shutdown = ShutdownCoordinator::new(app_config.wait_time);
    let token = shutdown.token();
    tokio::spawn(async move {
        let handler = create_signal_handler();
        let token = token.clone();
        handler.wait_for_signal(Box::new(move || token.cancel())).await;
    });

    let stop_flag = Arc::new(std::sync::atomic::AtomicBool::new(false));
    let feed_controller = controller.clone();
    let feed_data_sources = app_config.data_sources.clone();
    let feed_looped = app_config.looped;
    let feed_stop = stop_flag.clone();
    let feed_handle = std::thread::Builder::new()
        .name("data-feed".to_string())
        .spawn(move || {
            feed_head(&feed_controller, head, "stream-0", 0, &feed_data_sources, feed_looped, &feed_stop);
        })
        .expect("failed to spawn data feed thread");

    // Race the feed thread's natural completion (finite, non-looped input)
    // against a shutdown signal; either way, wait for the thread to actually
    // exit before tearing down the pipeline.
    let mut join_task = tokio::task::spawn_blocking(move || {
        let _ = feed_handle.join();
    });
    tokio::select! {
        _ = shutdown.token().cancelled() => {
            stop_flag.store(true, Ordering::Relaxed);
            let _ = (&mut join_task).await;
        }
        res = &mut join_task => {
            let _ = res;
        }
    }

    let controller_for_stop = controller.clone();
    let _ = tokio::task::spawn_blocking(move || controller_for_stop.stop()).await;

    let profile = profiler.get_profile();
    tracing::info!(stages = profile.modules.len(), "pipeline stopped, final profile captured");

    ExitCode::Success
}
