// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! The connector: one [`Conveyor`] per worker of each non-head stage,
//! indexed by [`StageId`], grounded on `modules/core/include/connector.hpp`.
//! Head stages (sources) have no conveyors; frames reach them via
//! `PipelineController::provide_data`. A stage with `parallelism > 1` gets
//! one conveyor per worker so that frames of the same stream, routed by
//! `stream_index mod conveyor_count`, are always popped by the same worker
//! and therefore stay in FIFO order per stream.

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;

use framegraph_domain::ids::{StageId, MAX_MODULES};

use super::conveyor::Conveyor;

pub struct Connector<T> {
    conveyors: Vec<Option<Vec<Arc<Conveyor<T>>>>>,
    stopped: AtomicBool,
}

impl<T> Connector<T> {
    /// Builds `specs.len()` slots indexed by `StageId`. Slot `i` is
    /// `Some((capacity, worker_count))` for a non-head stage, producing
    /// `worker_count` conveyors of `capacity` each, or `None` for a head
    /// stage (no conveyor).
    pub fn new(specs: &[Option<(usize, usize)>]) -> Self {
        assert!(specs.len() <= MAX_MODULES);
        let conveyors = specs
            .iter()
            .map(|spec| {
                spec.map(|(capacity, worker_count)| {
                    (0..worker_count).map(|_| Arc::new(Conveyor::new(capacity))).collect()
                })
            })
            .collect();
        Connector {
            conveyors,
            stopped: AtomicBool::new(false),
        }
    }

    pub fn conveyor(&self, stage: StageId, worker_idx: usize) -> Option<&Arc<Conveyor<T>>> {
        self.conveyors.get(stage.as_usize()).and_then(|c| c.as_ref()).and_then(|v| v.get(worker_idx))
    }

    /// Number of conveyors (equal to the stage's parallelism) feeding a
    /// non-head stage; zero for a head stage.
    pub fn conveyor_count(&self, stage: StageId) -> usize {
        self.conveyors.get(stage.as_usize()).and_then(|c| c.as_ref()).map(Vec::len).unwrap_or(0)
    }

    pub fn start(&self) {
        self.stopped.store(false, Ordering::Release);
    }

    pub fn stop(&self) {
        self.stopped.store(true, Ordering::Release);
    }

    pub fn is_stopped(&self) -> bool {
        self.stopped.load(Ordering::Acquire)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn head_stage_slot_has_no_conveyor() {
        let connector: Connector<u32> = Connector::new(&[None, Some((8, 1))]);
        assert!(connector.conveyor(StageId::new(0), 0).is_none());
        assert!(connector.conveyor(StageId::new(1), 0).is_some());
        assert_eq!(connector.conveyor_count(StageId::new(0)), 0);
        assert_eq!(connector.conveyor_count(StageId::new(1)), 1);
    }

    #[test]
    fn a_stage_gets_one_conveyor_per_worker() {
        let connector: Connector<u32> = Connector::new(&[Some((4, 3))]);
        assert_eq!(connector.conveyor_count(StageId::new(0)), 3);
        for i in 0..3 {
            assert!(connector.conveyor(StageId::new(0), i).is_some());
        }
        assert!(connector.conveyor(StageId::new(0), 3).is_none());
    }

    #[test]
    fn stop_flag_round_trips() {
        let connector: Connector<u32> = Connector::new(&[Some((4, 1))]);
        assert!(!connector.is_stopped());
        connector.stop();
        assert!(connector.is_stopped());
        connector.start();
        assert!(!connector.is_stopped());
    }
}
