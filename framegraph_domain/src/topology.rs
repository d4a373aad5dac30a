// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! DAG topology: stage nodes, dense id assignment, and mask computation.
//!
//! Grounded on `cnstream_pipeline.cpp`'s `GenerateModulesMask`: dense ids
//! are assigned in DFS order, each stage's `parents_mask` is the OR of its
//! parents' single-bit ids, and each head stage's `route_mask` is the set
//! of stage ids reachable by DFS from that head (used to pre-mark stages
//! the head's sub-DAG can never reach as already-done).

use std::collections::{HashMap, HashSet};

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::ids::{StageId, MAX_MODULES};

/// A raw stage description as parsed from configuration, before ids and
/// masks are computed.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StageSpec {
    pub name: String,
    pub parallelism: u32,
    pub queue_capacity: u32,
    pub next: Vec<String>,
}

/// An immutable, built stage node.
#[derive(Debug, Clone)]
pub struct StageNode {
    pub id: StageId,
    pub name: String,
    pub parallelism: u32,
    pub queue_capacity: u32,
    pub parents_mask: u64,
    /// Non-zero only for head stages (no parents): the set of stage ids
    /// reachable from this head.
    pub route_mask: u64,
    pub next: Vec<StageId>,
}

impl StageNode {
    pub fn is_head(&self) -> bool {
        self.parents_mask == 0
    }
}

#[derive(Debug, Error, PartialEq, Eq)]
pub enum TopologyError {
    #[error("duplicate stage name '{0}'")]
    DuplicateName(String),
    #[error("stage '{0}' references unknown next stage '{1}'")]
    UnknownNext(String, String),
    #[error("stage '{stage}' has invalid parallelism {value}")]
    InvalidParallelism { stage: String, value: u32 },
    #[error("stage '{stage}' has invalid queue capacity {value}")]
    InvalidQueueCapacity { stage: String, value: u32 },
    #[error("topology has a cycle reachable from '{0}'")]
    Cycle(String),
    #[error("topology has {0} stages, exceeding the {1}-stage limit")]
    TooManyStages(usize, usize),
}

/// The built, immutable DAG: stage nodes in topological (DFS discovery)
/// order plus the derived `all_modules_mask`.
#[derive(Debug, Clone)]
pub struct Topology {
    pub stages: Vec<StageNode>,
    pub all_modules_mask: u64,
    name_to_id: HashMap<String, StageId>,
}

impl Topology {
    /// Build a topology from stage specs. Fails early on any structural
    /// error (duplicate names, unknown edges, non-positive
    /// parallelism/queue capacity, cycles, or too many stages).
    pub fn build(specs: &[StageSpec]) -> Result<Topology, TopologyError> {
        if specs.len() > MAX_MODULES {
            return Err(TopologyError::TooManyStages(specs.len(), MAX_MODULES));
        }

        let mut name_to_id = HashMap::new();
        let mut order = Vec::new();
        let spec_by_name: HashMap<&str, &StageSpec> = specs.iter().map(|s| (s.name.as_str(), s)).collect();

        for spec in specs {
            if spec.parallelism == 0 {
                return Err(TopologyError::InvalidParallelism {
                    stage: spec.name.clone(),
                    value: spec.parallelism,
                });
            }
            if spec.queue_capacity == 0 {
                return Err(TopologyError::InvalidQueueCapacity {
                    stage: spec.name.clone(),
                    value: spec.queue_capacity,
                });
            }
            for next in &spec.next {
                if !spec_by_name.contains_key(next.as_str()) {
                    return Err(TopologyError::UnknownNext(spec.name.clone(), next.clone()));
                }
            }
        }

        // Assign dense ids by DFS discovery order, starting from every head
        // (a stage nobody points to), matching the reference's traversal.
        let pointed_to: HashSet<&str> = specs.iter().flat_map(|s| s.next.iter().map(|n| n.as_str())).collect();
        let heads: Vec<&StageSpec> = specs.iter().filter(|s| !pointed_to.contains(s.name.as_str())).collect();

        let mut visiting = HashSet::new();
        fn dfs<'a>(
            name: &'a str,
            spec_by_name: &HashMap<&'a str, &'a StageSpec>,
            name_to_id: &mut HashMap<String, StageId>,
            order: &mut Vec<String>,
            visiting: &mut HashSet<String>,
        ) -> Result<(), TopologyError> {
            if name_to_id.contains_key(name) {
                return Ok(());
            }
            if !visiting.insert(name.to_string()) {
                return Err(TopologyError::Cycle(name.to_string()));
            }
            let id = StageId::new(order.len());
            name_to_id.insert(name.to_string(), id);
            order.push(name.to_string());
            let spec = spec_by_name[name];
            for next in &spec.next {
                dfs(next, spec_by_name, name_to_id, order, visiting)?;
            }
            visiting.remove(name);
            Ok(())
        }

        for head in &heads {
            dfs(&head.name, &spec_by_name, &mut name_to_id, &mut order, &mut visiting)?;
        }
        // Any stage unreachable from a detected head (shouldn't happen in a
        // well-formed DAG, but cover it rather than silently drop stages).
        for spec in specs {
            dfs(&spec.name, &spec_by_name, &mut name_to_id, &mut order, &mut visiting)?;
        }

        if name_to_id.len() != specs.len() {
            // A duplicate name collapsed into one id.
            let mut seen = HashSet::new();
            for spec in specs {
                if !seen.insert(spec.name.clone()) {
                    return Err(TopologyError::DuplicateName(spec.name.clone()));
                }
            }
        }

        // parents_mask: walk the adjacency once, OR-ing each stage's id bit
        // into every stage it points to.
        let mut parents_mask = vec![0u64; order.len()];
        for spec in specs {
            let from_id = name_to_id[&spec.name];
            for next in &spec.next {
                let to_id = name_to_id[next];
                parents_mask[to_id.as_usize()] |= from_id.bit();
            }
        }

        // route_mask for head stages: DFS-reachable set of ids from that head.
        let adjacency: HashMap<StageId, Vec<StageId>> = specs
            .iter()
            .map(|s| {
                let id = name_to_id[&s.name];
                let children = s.next.iter().map(|n| name_to_id[n]).collect();
                (id, children)
            })
            .collect();

        fn reachable_mask(start: StageId, adjacency: &HashMap<StageId, Vec<StageId>>) -> u64 {
            let mut mask = 0u64;
            let mut stack = vec![start];
            let mut seen = HashSet::new();
            while let Some(id) = stack.pop() {
                if !seen.insert(id) {
                    continue;
                }
                mask |= id.bit();
                if let Some(children) = adjacency.get(&id) {
                    stack.extend(children.iter().copied());
                }
            }
            mask
        }

        let mut route_mask = vec![0u64; order.len()];
        for head in &heads {
            let head_id = name_to_id[&head.name];
            route_mask[head_id.as_usize()] = reachable_mask(head_id, &adjacency);
        }

        let mut all_modules_mask = 0u64;
        let mut stages = Vec::with_capacity(order.len());
        for name in &order {
            let id = name_to_id[name];
            all_modules_mask |= id.bit();
            let spec = spec_by_name[name.as_str()];
            let next = spec.next.iter().map(|n| name_to_id[n]).collect();
            stages.push(StageNode {
                id,
                name: name.clone(),
                parallelism: spec.parallelism,
                queue_capacity: spec.queue_capacity,
                parents_mask: parents_mask[id.as_usize()],
                route_mask: route_mask[id.as_usize()],
                next,
            });
        }
        stages.sort_by_key(|s| s.id.as_usize());

        Ok(Topology {
            stages,
            all_modules_mask,
            name_to_id,
        })
    }

    pub fn stage_by_name(&self, name: &str) -> Option<&StageNode> {
        self.name_to_id.get(name).map(|id| &self.stages[id.as_usize()])
    }

    pub fn stage(&self, id: StageId) -> &StageNode {
        &self.stages[id.as_usize()]
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn spec(name: &str, next: &[&str]) -> StageSpec {
        StageSpec {
            name: name.to_string(),
            parallelism: 1,
            queue_capacity: 4,
            next: next.iter().map(|s| s.to_string()).collect(),
        }
    }

    #[test]
    fn diamond_join_masks_are_commutative() {
        // 0 -> 1, 0 -> 2, 1 -> 3, 2 -> 3
        let specs = vec![spec("a", &["b", "c"]), spec("b", &["d"]), spec("c", &["d"]), spec("d", &[])];
        let topo = Topology::build(&specs).unwrap();
        let d = topo.stage_by_name("d").unwrap();
        let b = topo.stage_by_name("b").unwrap();
        let c = topo.stage_by_name("c").unwrap();
        assert_eq!(d.parents_mask, b.id.bit() | c.id.bit());
        assert_eq!(topo.all_modules_mask, topo.stages.iter().fold(0u64, |m, s| m | s.id.bit()));
    }

    #[test]
    fn head_route_mask_covers_its_whole_reachable_set() {
        let specs = vec![spec("a", &["b"]), spec("b", &[])];
        let topo = Topology::build(&specs).unwrap();
        let a = topo.stage_by_name("a").unwrap();
        assert_eq!(a.route_mask, topo.all_modules_mask);
        assert_eq!(topo.stage_by_name("b").unwrap().route_mask, 0);
    }

    #[test]
    fn rejects_non_positive_parallelism() {
        let mut s = spec("a", &[]);
        s.parallelism = 0;
        let err = Topology::build(&[s]).unwrap_err();
        assert!(matches!(err, TopologyError::InvalidParallelism { .. }));
    }

    #[test]
    fn rejects_unknown_next() {
        let s = spec("a", &["ghost"]);
        let err = Topology::build(&[s]).unwrap_err();
        assert!(matches!(err, TopologyError::UnknownNext(..)));
    }
}
