//! Property tests: random add/resolve/unclear sequences keep the engine
//! invariants

use proptest::prelude::*;
use respec_artifact::InsertSource;
use respec_conflict::Side;
use respec_core::{ArtifactManager, EngineConfig, SpecificationInput};
use respec_knowledge::{Catalog, KnowledgeGraph, SpecId};
use respec_test_utils::{
    assert_blocked_consistent, assert_cascades_covered, assert_exclusions_covered,
    assert_no_duplicates, industrial_pc_catalog,
};
use std::sync::Arc;

const FIELDS: &[&str] = &[
    "fanless",
    "active_fan",
    "gpu",
    "cpu_tier",
    "psu_150w",
    "psu_300w",
    "ram_16",
    "ram_32",
    "ram_64",
];

#[derive(Debug, Clone)]
enum Op {
    Add(usize, u8),
    Resolve(bool),
    Unclear,
    Promote,
}

fn op() -> impl Strategy<Value = Op> {
    prop_oneof![
        4 => (0..FIELDS.len(), any::<u8>()).prop_map(|(field, value)| Op::Add(field, value)),
        3 => any::<bool>().prop_map(Op::Resolve),
        1 => Just(Op::Unclear),
        1 => Just(Op::Promote),
    ]
}

fn apply(manager: &mut ArtifactManager<Catalog>, op: &Op) {
    match op {
        Op::Add(field, value) => {
            manager
                .add_specification(
                    SpecificationInput::new(FIELDS[*field], u64::from(*value)),
                    InsertSource::UserInput,
                )
                .unwrap();
        }
        Op::Resolve(side_b) => {
            if let Some(id) = manager.current_conflict().map(|c| c.id) {
                let side = if *side_b { Side::B } else { Side::A };
                let outcome = manager.resolve_conflict(id, side).unwrap();

                // losers are gone from both trees, the winner survives
                for loser in outcome.report.removed_ids() {
                    assert!(manager.find(&loser).is_none());
                }
                assert!(manager.find(&outcome.report.winner).is_some());
            }
        }
        Op::Unclear => {
            if let Some(id) = manager.current_conflict().map(|c| c.id) {
                manager.record_unclear_reply(id).unwrap();
            }
        }
        Op::Promote => {
            manager.promote();
        }
    }
}

fn check(manager: &ArtifactManager<Catalog>) {
    assert_blocked_consistent(manager);
    assert_no_duplicates(manager);
    assert_exclusions_covered(manager);
    assert_cascades_covered(manager);
}

proptest! {
    #[test]
    fn prop_invariants_with_default_config(ops in prop::collection::vec(op(), 1..40)) {
        let mut manager = ArtifactManager::new(Arc::new(industrial_pc_catalog()));
        for op in &ops {
            apply(&mut manager, op);
            check(&manager);
        }
    }

    #[test]
    fn prop_invariants_with_auto_promotion(ops in prop::collection::vec(op(), 1..40)) {
        let mut manager = ArtifactManager::with_config(
            Arc::new(industrial_pc_catalog()),
            EngineConfig::new().with_promote_on_add(true),
        );
        for op in &ops {
            apply(&mut manager, op);
            check(&manager);
        }
    }

    #[test]
    fn prop_draining_conflicts_clears_exclusions(
        ops in prop::collection::vec(op(), 1..30),
        sides in prop::collection::vec(any::<bool>(), 20),
    ) {
        let mut manager = ArtifactManager::new(Arc::new(industrial_pc_catalog()));
        for op in &ops {
            apply(&mut manager, op);
        }

        for side_b in sides {
            apply(&mut manager, &Op::Resolve(side_b));
        }
        while manager.status().blocked {
            apply(&mut manager, &Op::Resolve(false));
        }
        check(&manager);

        let present: Vec<SpecId> = manager
            .candidate()
            .spec_ids()
            .into_iter()
            .chain(manager.canonical().spec_ids())
            .collect();
        for x in &present {
            for y in &present {
                prop_assert!(!manager.graph().excludes(x, y), "{} and {} both present", x, y);
            }
        }
    }
}
