// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Fan-out/fan-in (diamond) routing: a frame pushed through a head that
//! forks into two branches must reach the join stage exactly once, after
//! both branches have stamped the shared frame's completion mask,
//! regardless of which branch finishes first.

use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

use framegraph::{Frame, PipelineController, PipelineProfiler, Stage, StageSpec, Topology};

struct Fork;
impl Stage<i32> for Fork {
    fn process(&self, _frame: Arc<Frame<i32>>) -> i32 {
        0
    }
}

struct Branch {
    delay: Duration,
}
impl Stage<i32> for Branch {
    fn process(&self, _frame: Arc<Frame<i32>>) -> i32 {
        if !self.delay.is_zero() {
            std::thread::sleep(self.delay);
        }
        0
    }
}

struct Join {
    masks_seen: Mutex<Vec<u64>>,
    hits: AtomicUsize,
}
impl Stage<i32> for Join {
    fn process(&self, frame: Arc<Frame<i32>>) -> i32 {
        self.hits.fetch_add(1, Ordering::SeqCst);
        self.masks_seen.lock().unwrap().push(frame.modules_mask());
        0
    }
}

fn diamond() -> Topology {
    // a -> b, a -> c, b -> d, c -> d
    let specs = vec![
        StageSpec { name: "a".into(), parallelism: 1, queue_capacity: 8, next: vec!["b".into(), "c".into()] },
        StageSpec { name: "b".into(), parallelism: 1, queue_capacity: 8, next: vec!["d".into()] },
        StageSpec { name: "c".into(), parallelism: 1, queue_capacity: 8, next: vec!["d".into()] },
        StageSpec { name: "d".into(), parallelism: 1, queue_capacity: 8, next: vec![] },
    ];
    Topology::build(&specs).unwrap()
}

#[test]
fn join_stage_is_visited_exactly_once() {
    let topology = diamond();
    let head = topology.stage_by_name("a").unwrap().id;
    let a_id = topology.stage_by_name("a").unwrap().id;
    let b_id = topology.stage_by_name("b").unwrap().id;
    let c_id = topology.stage_by_name("c").unwrap().id;
    let d_id = topology.stage_by_name("d").unwrap().id;

    let join = Arc::new(Join {
        masks_seen: Mutex::new(Vec::new()),
        hits: AtomicUsize::new(0),
    });

    let mut stages: HashMap<String, Arc<dyn Stage<i32>>> = HashMap::new();
    stages.insert("a".into(), Arc::new(Fork));
    // One branch is deliberately slower so the join is only entered once
    // the last of the two branches stamps the shared frame's mask.
    stages.insert("b".into(), Arc::new(Branch { delay: Duration::from_millis(5) }));
    stages.insert("c".into(), Arc::new(Branch { delay: Duration::ZERO }));
    stages.insert("d".into(), join.clone());

    let profiler = Arc::new(PipelineProfiler::new(&topology, 1_000));
    let (event_bus, _msgs) = framegraph::EventBus::start();
    let controller = PipelineController::build(topology, stages, profiler, Arc::new(event_bus)).unwrap();
    controller.start().unwrap();

    controller.transmit(head, Arc::new(Frame::new(1, "s1", 0, 0, 0))).unwrap();
    std::thread::sleep(Duration::from_millis(100));
    controller.stop();

    assert_eq!(join.hits.load(Ordering::SeqCst), 1, "join stage must see the frame exactly once, not once per incoming branch");
    let masks = join.masks_seen.lock().unwrap();
    assert_eq!(masks.len(), 1);
    assert_eq!(masks[0], a_id.bit() | b_id.bit() | c_id.bit(), "both branches (and the head) must have stamped the mask before the join runs");
    assert_eq!(d_id.bit() & masks[0], 0, "the join stage hasn't marked itself done in its own process() call");
}
