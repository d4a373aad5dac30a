// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The pipeline controller: builds the worker pool around a [`Topology`],
//! and drives `open -> process -> route -> close`. Grounded on
//! `modules/core/src/cnstream_pipeline.cpp`'s `NodeContext` worker loop and
//! its rollback-on-partial-open-failure behavior.

use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex, OnceLock, Weak};
use std::thread::JoinHandle;
use std::time::Duration;

use framegraph_domain::event::{Event, EventType};
use framegraph_domain::frame::Frame;
use framegraph_domain::ids::StageId;
use framegraph_domain::record_key::RecordKey;
use framegraph_domain::stage::Stage;
use framegraph_domain::topology::Topology;
use framegraph_domain::PipelineError;

use crate::infrastructure::profiler::PipelineProfiler;

use super::connector::Connector;
use super::event_bus::EventBus;

/// How long a worker blocks waiting for its conveyor before re-checking the
/// stop flag.
const WORKER_POLL_TIMEOUT: Duration = Duration::from_millis(20);
/// How often (in consecutive failures) a blocked downstream push logs at
/// debug level instead of silently retrying forever.
const BACKPRESSURE_LOG_EVERY: u64 = 50;

type FrameDoneCallback<P> = Box<dyn Fn(&Frame<P>) + Send + Sync>;

pub struct PipelineController<P> {
    topology: Topology,
    stages: HashMap<StageId, Arc<dyn Stage<P>>>,
    connector: Arc<Connector<Arc<Frame<P>>>>,
    profiler: Arc<PipelineProfiler>,
    event_bus: Arc<EventBus>,
    running: AtomicBool,
    workers: Mutex<Vec<JoinHandle<()>>>,
    opened: Mutex<Vec<StageId>>,
    /// Invoked exactly once per frame, when its `modules_mask` reaches
    /// `all_modules_mask`. Cleared on `stop()`.
    frame_done_callback: Mutex<Option<FrameDoneCallback<P>>>,
    /// Set once, right after construction, so worker threads can be handed
    /// an owned `Arc<Self>` from a plain `&self` method without requiring
    /// every caller to thread an `Arc` through `start`/`stop`.
    weak_self: OnceLock<Weak<Self>>,
}

impl<P: Send + Sync + 'static> PipelineController<P> {
    /// Validates that `stages` covers every node in `topology` by name, then
    /// builds one conveyor per worker of each non-head stage, sized by its
    /// `queue_capacity`.
    pub fn build(
        topology: Topology,
        stages: HashMap<String, Arc<dyn Stage<P>>>,
        profiler: Arc<PipelineProfiler>,
        event_bus: Arc<EventBus>,
    ) -> Result<Arc<Self>, PipelineError> {
        let mut by_id = HashMap::with_capacity(stages.len());
        let mut specs = vec![None; topology.stages.len()];
        for node in &topology.stages {
            let stage = stages
                .get(&node.name)
                .cloned()
                .ok_or_else(|| PipelineError::Build(format!("no stage implementation registered for '{}'", node.name)))?;
            by_id.insert(node.id, stage);
            if !node.is_head() {
                specs[node.id.as_usize()] = Some((node.queue_capacity as usize, node.parallelism as usize));
            }
        }
        let controller = Arc::new(PipelineController {
            topology,
            stages: by_id,
            connector: Arc::new(Connector::new(&specs)),
            profiler,
            event_bus,
            running: AtomicBool::new(false),
            workers: Mutex::new(Vec::new()),
            opened: Mutex::new(Vec::new()),
            frame_done_callback: Mutex::new(None),
            weak_self: OnceLock::new(),
        });
        let _ = controller.weak_self.set(Arc::downgrade(&controller));
        Ok(controller)
    }

    fn arc_self(&self) -> Arc<Self> {
        self.weak_self
            .get()
            .and_then(Weak::upgrade)
            .expect("PipelineController is always constructed via build(), which sets weak_self")
    }

    /// Registers the callback invoked when a frame clears every stage in
    /// `all_modules_mask`. Replaces any previously registered callback.
    pub fn set_frame_done_callback(&self, callback: impl Fn(&Frame<P>) + Send + Sync + 'static) {
        *self.frame_done_callback.lock().unwrap() = Some(Box::new(callback));
    }

    /// Opens every stage in topological order; on the first failure, closes
    /// every already-opened stage in the order it was opened (not reverse)
    /// and returns an error without starting any worker.
    pub fn start(&self) -> Result<(), PipelineError> {
        if self.running.swap(true, Ordering::AcqRel) {
            return Ok(());
        }
        {
            let mut opened = self.opened.lock().unwrap();
            for node in &self.topology.stages {
                let stage = &self.stages[&node.id];
                if stage.open() {
                    opened.push(node.id);
                } else {
                    for id in opened.iter() {
                        self.stages[id].close();
                    }
                    self.running.store(false, Ordering::Release);
                    return Err(PipelineError::Build(format!("stage '{}' failed to open", node.name)));
                }
            }
        }
        self.connector.start();

        let mut workers = self.workers.lock().unwrap();
        for node in &self.topology.stages {
            if node.is_head() {
                continue;
            }
            for worker_idx in 0..node.parallelism as usize {
                let controller = self.arc_self();
                let stage_id = node.id;
                let handle = std::thread::Builder::new()
                    .name(format!("{}-worker-{worker_idx}", node.name))
                    .spawn(move || controller.worker_loop(stage_id, worker_idx))
                    .expect("failed to spawn stage worker thread");
                workers.push(handle);
            }
        }
        Ok(())
    }

    fn worker_loop(self: Arc<Self>, stage_id: StageId, worker_idx: usize) {
        let node = self.topology.stage(stage_id);
        let stage = self.stages[&stage_id].clone();
        let conveyor = self
            .connector
            .conveyor(stage_id, worker_idx)
            .expect("non-head stage worker has no conveyor")
            .clone();

        while !self.connector.is_stopped() {
            let Some(frame) = conveyor.pop(WORKER_POLL_TIMEOUT) else {
                continue;
            };
            let key = RecordKey::new(frame.stream_id.clone(), frame.timestamp);
            self.profiler.record_input_end(&node.name, &key, crate::infrastructure::profiler::clock::now_nanos());
            self.run_frame(stage_id, &node.name, &stage, frame, node.next.clone(), false);
        }
    }

    /// Runs one frame through a stage and, on success, routes it onward:
    /// rejects invalid frames, pre-fills a head-produced frame's mask from
    /// `route_mask`, marks this stage's bit done, and either fires the
    /// frame-done callback (mask now covers every stage) or pushes the
    /// frame to each child whose own parents have all stamped it.
    #[allow(clippy::too_many_arguments)]
    fn run_frame(
        &self,
        stage_id: StageId,
        stage_name: &str,
        stage: &Arc<dyn Stage<P>>,
        frame: Arc<Frame<P>>,
        next: Vec<StageId>,
        is_head: bool,
    ) {
        if frame.is_invalid() {
            self.event_bus.post(Event {
                event_type: EventType::StreamFrameError,
                module_name: stage_name.to_string(),
                stream_id: Some(frame.stream_id.clone()),
                message: format!("invalid frame at pts {}", frame.timestamp),
            });
            return;
        }

        if is_head && frame.modules_mask() == 0 {
            let node = self.topology.stage(stage_id);
            frame.set_modules_mask(self.topology.all_modules_mask ^ node.route_mask);
        }

        let key = RecordKey::new(frame.stream_id.clone(), frame.timestamp);
        self.profiler
            .record_process_start(stage_name, &key, crate::infrastructure::profiler::clock::now_nanos(), is_head);

        let code = stage.process(frame.clone());

        if code < 0 {
            self.profiler
                .record_process_end(stage_name, &key, crate::infrastructure::profiler::clock::now_nanos(), false);
            self.event_bus.post(Event {
                event_type: EventType::Error,
                module_name: stage_name.to_string(),
                stream_id: Some(frame.stream_id.clone()),
                message: format!("process() returned {code}"),
            });
            return;
        }

        let mask = frame.mark_stage_done(stage_id.bit());
        stage.on_frame_done(&frame);

        if frame.is_eos() {
            self.profiler.on_stream_eos(&frame.stream_id);
        }

        let is_tail = mask == self.topology.all_modules_mask;
        self.profiler
            .record_process_end(stage_name, &key, crate::infrastructure::profiler::clock::now_nanos(), is_tail);

        if is_tail {
            if let Some(callback) = self.frame_done_callback.lock().unwrap().as_ref() {
                callback(&frame);
            }
            return;
        }

        for child in next {
            let child_node = self.topology.stage(child);
            if mask & child_node.parents_mask == child_node.parents_mask {
                self.route_to(child, frame.clone());
            }
        }
    }

    /// Non-blocking push with retry-and-backpressure: on a full downstream
    /// queue, sleeps the poll interval and retries, logging every Nth
    /// consecutive failure rather than on every attempt. The conveyor is
    /// chosen by `stream_index mod conveyor_count` so every frame of a
    /// stream always lands on the same worker, preserving per-stream order.
    fn route_to(&self, child: StageId, frame: Arc<Frame<P>>) {
        let conveyor_count = self.connector.conveyor_count(child);
        if conveyor_count == 0 {
            return;
        }
        let worker_idx = frame.stream_index as usize % conveyor_count;
        let Some(conveyor) = self.connector.conveyor(child, worker_idx) else {
            return;
        };
        let node = self.topology.stage(child);
        let key = RecordKey::new(frame.stream_id.clone(), frame.timestamp);
        loop {
            if self.connector.is_stopped() {
                return;
            }
            if conveyor.push(frame.clone()) {
                self.profiler.record_input_start(&node.name, &key, crate::infrastructure::profiler::clock::now_nanos());
                return;
            }
            let failures = conveyor.fail_count();
            if failures % BACKPRESSURE_LOG_EVERY == 0 {
                tracing::debug!(stage = child.as_usize(), failures, "downstream conveyor full, retrying");
            }
            std::thread::sleep(WORKER_POLL_TIMEOUT);
        }
    }

    /// Injects a frame at a head stage: runs `process` inline (sources run
    /// on the caller's thread, not a worker) and routes the result.
    pub fn transmit(&self, head: StageId, frame: Arc<Frame<P>>) -> Result<(), PipelineError> {
        let node = self.topology.stage(head);
        if !node.is_head() {
            return Err(PipelineError::Build(format!("'{}' is not a head stage", node.name)));
        }
        let stage = self.stages[&head].clone();
        self.run_frame(head, &node.name, &stage, frame, node.next.clone(), true);
        Ok(())
    }

    /// A source's entry point: rejects a frame that isn't freshly minted
    /// (non-zero `modules_mask`) before handing it to `transmit`.
    pub fn provide_data(&self, head: StageId, frame: Arc<Frame<P>>) -> Result<(), PipelineError> {
        if frame.modules_mask() != 0 {
            return Err(PipelineError::FrameNotFresh {
                stream_id: frame.stream_id.clone(),
            });
        }
        self.transmit(head, frame)
    }

    /// Stops accepting new work, joins every worker thread, stops the event
    /// bus, closes every opened stage in the order it was opened, and
    /// releases the frame-done callback.
    pub fn stop(&self) {
        if !self.running.swap(false, Ordering::AcqRel) {
            return;
        }
        self.connector.stop();
        let mut workers = self.workers.lock().unwrap();
        for handle in workers.drain(..) {
            let _ = handle.join();
        }
        self.event_bus.stop();
        let opened = self.opened.lock().unwrap();
        for id in opened.iter() {
            self.stages[id].close();
        }
        *self.frame_done_callback.lock().unwrap() = None;
    }

    pub fn topology(&self) -> &Topology {
        &self.topology
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::Acquire)
    }
}
