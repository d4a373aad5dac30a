// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! A downstream stage slower than its upstream, with a queue much smaller
//! than the number of frames injected, must still see every frame: the
//! controller retries on a full conveyor rather than dropping work.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;

use framegraph::{Frame, PipelineController, PipelineProfiler, Stage, StageSpec, Topology};

struct FastHead;
impl Stage<i32> for FastHead {
    fn process(&self, _frame: Arc<Frame<i32>>) -> i32 {
        0
    }
}

struct SlowTail {
    seen: AtomicUsize,
}
impl Stage<i32> for SlowTail {
    fn process(&self, frame: Arc<Frame<i32>>) -> i32 {
        if !frame.is_eos() {
            std::thread::sleep(Duration::from_millis(2));
            self.seen.fetch_add(1, Ordering::SeqCst);
        }
        0
    }
}

#[test]
fn no_frame_is_dropped_under_sustained_backpressure() {
    let specs = vec![
        StageSpec { name: "head".into(), parallelism: 1, queue_capacity: 2, next: vec!["tail".into()] },
        StageSpec { name: "tail".into(), parallelism: 1, queue_capacity: 2, next: vec![] },
    ];
    let topology = Topology::build(&specs).unwrap();
    let head = topology.stage_by_name("head").unwrap().id;

    let tail = Arc::new(SlowTail { seen: AtomicUsize::new(0) });
    let mut stages: HashMap<String, Arc<dyn Stage<i32>>> = HashMap::new();
    stages.insert("head".into(), Arc::new(FastHead));
    stages.insert("tail".into(), tail.clone());

    let profiler = Arc::new(PipelineProfiler::new(&topology, 10_000));
    let (event_bus, _msgs) = framegraph::EventBus::start();
    let controller = PipelineController::build(topology, stages, profiler, Arc::new(event_bus)).unwrap();
    controller.start().unwrap();

    const N: i64 = 30;
    for i in 0..N {
        controller.transmit(head, Arc::new(Frame::new(i as i32, "s1", 0, i, i as u64))).unwrap();
    }

    // Queue capacity (2) is far smaller than N (30); the slow tail forces
    // the head's routing loop to retry repeatedly rather than drop frames.
    std::thread::sleep(Duration::from_millis((N as u64) * 20 + 500));
    controller.stop();

    assert_eq!(tail.seen.load(Ordering::SeqCst), N as usize);
}
