// /////////////////////////////////////////////////////////////////////////////
// Adaptive Pipeline
// Copyright (c) 2025 Michael Gardner, A Bit of Help, Inc.
// SPDX-License-Identifier: BSD-3-Clause
// See LICENSE file in the project root.
// /////////////////////////////////////////////////////////////////////////////

//! Property tests for the mask invariants that the DAG scheduler depends
//! on: a topology's `all_modules_mask` is always the union of every
//! stage's own bit, and a frame's completion mask is order-independent
//! under repeated `mark_stage_done` calls (the Mask Law).

use proptest::prelude::*;

use framegraph::{Frame, StageSpec, Topology};

/// Builds a random forest of simple chains (no joins, to keep generation
/// trivial) up to `max_stages` long, guaranteed acyclic by construction.
fn chain_specs() -> impl Strategy<Value = Vec<StageSpec>> {
    (1usize..20).prop_map(|n| {
        (0..n)
            .map(|i| StageSpec {
                name: format!("s{i}"),
                parallelism: 1,
                queue_capacity: 4,
                next: if i + 1 < n { vec![format!("s{}", i + 1)] } else { vec![] },
            })
            .collect()
    })
}

proptest! {
    #[test]
    fn all_modules_mask_is_the_union_of_every_stage_bit(specs in chain_specs()) {
        let topology = Topology::build(&specs).unwrap();
        let union = topology.stages.iter().fold(0u64, |acc, s| acc | s.id.bit());
        prop_assert_eq!(topology.all_modules_mask, union);
    }

    #[test]
    fn mark_stage_done_is_commutative_for_any_bit_permutation(bits in prop::collection::vec(0u8..20, 1..10)) {
        let frame_a: Frame<()> = Frame::new((), "s", 0, 0, 0);
        let frame_b: Frame<()> = Frame::new((), "s", 0, 0, 0);

        for &b in &bits {
            frame_a.mark_stage_done(1u64 << b);
        }
        for &b in bits.iter().rev() {
            frame_b.mark_stage_done(1u64 << b);
        }

        prop_assert_eq!(frame_a.modules_mask(), frame_b.modules_mask());
        let expected = bits.iter().fold(0u64, |acc, &b| acc | (1u64 << b));
        prop_assert_eq!(frame_a.modules_mask(), expected);
    }
}
