//! End-to-end scenarios for the artifact manager

use pretty_assertions::assert_eq;
use respec_artifact::InsertSource;
use respec_conflict::{ConflictKind, ConflictPriority, ResolutionError, ResolvedBy, Side};
use respec_core::{ManagerError, MovementTrigger, SpecificationInput};
use respec_knowledge::SpecId;
use respec_test_utils::{
    add, assert_blocked_consistent, assert_cascades_covered, assert_exclusions_covered,
    assert_no_duplicates, independent_pairs_catalog, industrial_pc_catalog, literal_catalog,
    setup_auto_manager, setup_manager, FailingPostCondition,
};

fn id(raw: &str) -> SpecId {
    SpecId::from(raw)
}

#[test]
fn literal_resolution_keeps_first() {
    let mut manager = setup_manager(literal_catalog());

    assert!(add(&mut manager, "P1", "x").is_empty());
    assert!(!manager.status().blocked);

    let conflicts = add(&mut manager, "P2", "y");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].spec_ids(), &[id("P1"), id("P2")]);
    assert!(manager.status().blocked);

    let outcome = manager.resolve_conflict(conflicts[0].id, Side::A).unwrap();
    assert_eq!(outcome.report.removed_ids(), vec![id("P2")]);
    assert!(!manager.candidate().contains(&id("P2")));
    assert!(!manager.canonical().contains(&id("P2")));
    assert!(manager.find(&id("P1")).is_some());
    assert!(!manager.status().blocked);

    // resolution promotes the survivor
    assert!(manager.canonical().contains(&id("P1")));
    assert_eq!(outcome.movement.trigger, MovementTrigger::ConflictResolved);
    assert_eq!(manager.movements().len(), 1);
}

#[test]
fn default_manager_keeps_additions_in_candidate() {
    let mut manager = setup_manager(literal_catalog());
    assert!(!manager.config().promote_on_add);

    add(&mut manager, "P1", "x");
    assert!(manager.candidate().contains(&id("P1")));
    assert!(manager.canonical().is_empty());
    assert!(manager.movements().is_empty());

    let conflicts = add(&mut manager, "P2", "y");
    assert_eq!(conflicts[0].priority(), ConflictPriority::MutualExclusion);
}

#[test]
fn literal_resolution_with_auto_promotion() {
    let mut manager = setup_auto_manager(literal_catalog());

    assert!(add(&mut manager, "P1", "x").is_empty());
    assert!(manager.canonical().contains(&id("P1")));

    let conflicts = add(&mut manager, "P2", "y");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].spec_ids(), &[id("P1"), id("P2")]);

    manager.resolve_conflict(conflicts[0].id, Side::A).unwrap();
    assert!(!manager.candidate().contains(&id("P2")));
    assert!(manager.canonical().contains(&id("P1")));
    assert!(!manager.status().blocked);
}

#[test]
fn canonical_choice_is_checked() {
    let mut manager = setup_manager(literal_catalog());
    add(&mut manager, "P1", "x");
    let movement = manager.promote();
    assert_eq!(movement.spec_ids, vec![id("P1")]);
    assert!(manager.candidate().is_empty());

    let conflicts = add(&mut manager, "P2", "y");
    assert_eq!(conflicts.len(), 1);
    assert_eq!(
        conflicts[0].kind,
        ConflictKind::MutualExclusion {
            canonical_ids: vec![id("P1")],
        }
    );
    assert_eq!(conflicts[0].priority(), ConflictPriority::CrossArtifact);
    assert!(manager.status().blocked);
}

#[test]
fn option_b_removes_canonical_loser() {
    let mut manager = setup_auto_manager(literal_catalog());
    add(&mut manager, "P1", "x");
    let conflicts = add(&mut manager, "P2", "y");

    manager.resolve_conflict(conflicts[0].id, Side::B).unwrap();
    assert!(!manager.canonical().contains(&id("P1")));
    assert!(manager.canonical().contains(&id("P2")));
    assert_no_duplicates(&manager);
}

#[test]
fn highest_priority_conflict_surfaces_alone() {
    let mut manager = setup_manager(independent_pairs_catalog());

    // Pair A: both members in candidate
    add(&mut manager, "A1", "x");
    let pair_a = add(&mut manager, "A2", "y");
    assert_eq!(pair_a[0].priority(), ConflictPriority::MutualExclusion);

    // Pair B: first member confirmed before the second arrives
    add(&mut manager, "B1", "x");
    manager.promote();
    assert!(manager.canonical().contains(&id("B1")));
    let pair_b = add(&mut manager, "B2", "y");
    assert_eq!(pair_b[0].priority(), ConflictPriority::CrossArtifact);

    let prompts = manager.active_conflicts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].conflict_id, pair_b[0].id);
    assert_eq!(manager.status().active_count, 2);
    assert_eq!(
        manager.status().current_priority,
        Some(ConflictPriority::CrossArtifact)
    );

    manager.resolve_conflict(pair_b[0].id, Side::A).unwrap();
    let prompts = manager.active_conflicts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].conflict_id, pair_a[0].id);
}

#[test]
fn equal_priority_goes_to_earliest() {
    let mut manager = setup_manager(independent_pairs_catalog());
    add(&mut manager, "A1", "x");
    let first = add(&mut manager, "A2", "y");
    add(&mut manager, "B1", "x");
    let second = add(&mut manager, "B2", "y");

    // nothing was confirmed, so neither pair is cross-artifact
    assert_eq!(second[0].priority(), ConflictPriority::MutualExclusion);
    assert_eq!(manager.status().active_count, 2);
    assert_eq!(
        manager.status().current_priority,
        Some(ConflictPriority::MutualExclusion)
    );

    let prompts = manager.active_conflicts();
    assert_eq!(prompts.len(), 1);
    assert_eq!(prompts[0].conflict_id, first[0].id);
}

#[test]
fn unrelated_choices_wait_for_promotion() {
    let mut manager = setup_manager(independent_pairs_catalog());
    add(&mut manager, "A1", "x");
    add(&mut manager, "A2", "y");
    add(&mut manager, "FREE", "z");
    assert!(manager.candidate().contains(&id("FREE")));

    let movement = manager.promote();
    assert_eq!(movement.spec_ids, vec![id("FREE")]);
    assert!(manager.candidate().contains(&id("A1")));
    assert!(manager.candidate().contains(&id("A2")));
}

#[test]
fn unrelated_choices_promote_while_blocked() {
    let mut manager = setup_auto_manager(independent_pairs_catalog());
    add(&mut manager, "A1", "x");
    add(&mut manager, "A2", "y");
    assert!(manager.status().blocked);

    add(&mut manager, "FREE", "z");
    assert!(manager.canonical().contains(&id("FREE")));
    assert!(manager.candidate().contains(&id("A2")));
}

#[test]
fn rollback_restores_exact_state() {
    let mut manager = setup_manager(literal_catalog()).with_post_condition(FailingPostCondition);
    add(&mut manager, "P1", "x");
    let conflicts = add(&mut manager, "P2", "y");

    let candidate_before = manager.candidate().clone();
    let canonical_before = manager.canonical().clone();
    let status_before = manager.status();

    let err = manager.resolve_conflict(conflicts[0].id, Side::A).unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Resolution(ResolutionError::IntegrityViolation { .. })
    ));
    assert!(err.is_retryable());

    assert_eq!(manager.candidate(), &candidate_before);
    assert_eq!(manager.canonical(), &canonical_before);
    assert_eq!(manager.status(), status_before);
    assert_eq!(manager.active_conflicts()[0].conflict_id, conflicts[0].id);
}

#[test]
fn unknown_conflict_is_request_error() {
    let mut manager = setup_manager(literal_catalog());
    let err = manager
        .resolve_conflict(respec_conflict::ConflictId::new(), Side::A)
        .unwrap_err();
    assert!(matches!(
        err,
        ManagerError::Resolution(ResolutionError::ConflictNotFound(_))
    ));
    assert_eq!(manager.status().movement_count, 0);
}

#[test]
fn group_conflict_survivors_rechecked() {
    let mut manager = setup_manager(industrial_pc_catalog());
    add(&mut manager, "ram_16", "16 GB");
    let first = add(&mut manager, "ram_32", "32 GB");
    let group = add(&mut manager, "ram_64", "64 GB");
    assert_eq!(first[0].spec_ids().len(), 2);
    assert_eq!(group[0].spec_ids().len(), 3);

    // keep ram_16 over ram_32; the three-way group loses a member
    let outcome = manager.resolve_conflict(first[0].id, Side::A).unwrap();
    assert_eq!(outcome.retired, vec![group[0].id]);
    assert!(outcome.movement.spec_ids.is_empty());
    assert_eq!(outcome.detected.len(), 1);
    assert_eq!(outcome.detected[0].spec_ids(), &[id("ram_16"), id("ram_64")]);
    assert!(manager.status().blocked);
    assert_exclusions_covered(&manager);

    let history = manager.resolved_conflicts();
    assert_eq!(history.len(), 2);
    assert_eq!(history[1].resolved_by, ResolvedBy::System);

    manager
        .resolve_conflict(outcome.detected[0].id, Side::B)
        .unwrap();
    assert!(!manager.status().blocked);
    assert!(manager.canonical().contains(&id("ram_64")));
    assert_exclusions_covered(&manager);
}

#[test]
fn dependency_cascade_surfaces() {
    let mut manager = setup_manager(industrial_pc_catalog());
    add(&mut manager, "fanless", "yes");
    let conflicts = add(&mut manager, "gpu", "rtx");

    assert_eq!(conflicts.len(), 1);
    assert_eq!(conflicts[0].priority(), ConflictPriority::Dependency);
    assert!(conflicts[0].description.contains("Active fan cooling"));

    // fanless sorts first; B keeps the GPU
    manager.resolve_conflict(conflicts[0].id, Side::B).unwrap();
    assert!(manager.canonical().contains(&id("gpu")));
    assert!(manager.find(&id("fanless")).is_none());
}

#[test]
fn dependency_cascade_found_in_either_order() {
    for (first, second) in [("fanless", "gpu"), ("gpu", "fanless")] {
        let mut manager = setup_manager(industrial_pc_catalog());
        assert!(add(&mut manager, first, "yes").is_empty());
        let conflicts = add(&mut manager, second, "yes");

        assert_eq!(conflicts.len(), 1, "{first} then {second}");
        assert_eq!(conflicts[0].spec_ids(), &[id("fanless"), id("gpu")]);
        assert_eq!(conflicts[0].priority(), ConflictPriority::Dependency);
        assert!(manager.status().blocked);
        assert_cascades_covered(&manager);
    }
}

#[test]
fn confirmed_member_still_triggers_cascade() {
    for (first, second) in [("fanless", "gpu"), ("gpu", "fanless")] {
        let mut manager = setup_auto_manager(industrial_pc_catalog());
        add(&mut manager, first, "yes");
        assert!(manager.canonical().contains(&id(first)));

        let conflicts = add(&mut manager, second, "yes");
        assert_eq!(conflicts.len(), 1, "{first} then {second}");
        assert_eq!(
            conflicts[0].kind,
            ConflictKind::DependencyCascade {
                dependent: id("gpu"),
                required: id("active_fan"),
            }
        );
        assert!(manager.candidate().contains(&id(second)));
        assert!(manager.status().blocked);
        assert_cascades_covered(&manager);
    }
}

#[test]
fn stored_question_used_for_prompt() {
    let mut manager = setup_manager(industrial_pc_catalog());
    add(&mut manager, "fanless", "yes");
    add(&mut manager, "active_fan", "yes");

    let prompt = &manager.active_conflicts()[0];
    assert_eq!(
        prompt.description,
        "Should the system use Active fan cooling or a Fanless chassis?"
    );
    assert_eq!(prompt.options[0].label, "Keep Active fan cooling");
    assert_eq!(prompt.options[1].label, "Keep Fanless chassis");

    // option A is the first placeholder
    let conflict = manager.current_conflict().unwrap();
    assert_eq!(conflict.spec_ids()[0], id("active_fan"));
}

#[test]
fn field_exhausted_outranks_plain_exclusion() {
    let mut manager = setup_manager(industrial_pc_catalog());
    add(&mut manager, "ram_16", "16 GB");
    add(&mut manager, "ram_32", "32 GB");
    add(&mut manager, "cpu_tier", "i7");
    add(&mut manager, "psu_300w", "300 W");

    let raised = manager
        .raise_conflict(
            ConflictKind::FieldExhausted {
                field: id("cpu_tier"),
            },
            [id("cpu_tier"), id("psu_300w")],
            "No CPU tier fits the 300 W budget",
        )
        .unwrap();

    assert_eq!(manager.active_conflicts()[0].conflict_id, raised.id);
    assert_eq!(
        manager.status().current_priority,
        Some(ConflictPriority::Logical)
    );
}

#[test]
fn substitution_note_survives_promotion() {
    let mut manager = setup_manager(industrial_pc_catalog());
    manager
        .add_specification(
            SpecificationInput::new("ram_32", "32 GB")
                .with_substitution("24 GB", "24 GB modules are not offered"),
            InsertSource::UserInput,
        )
        .unwrap();
    assert!(manager.candidate().find(&id("ram_32")).unwrap().is_substituted());

    manager.promote();
    let spec = manager.canonical().find(&id("ram_32")).unwrap();
    assert!(spec.is_substituted());
    assert_eq!(spec.original_request.as_deref(), Some("24 GB"));
}

#[test]
fn status_counts_follow_operations() {
    let mut manager = setup_manager(literal_catalog());
    add(&mut manager, "P1", "x");
    let conflicts = add(&mut manager, "P2", "y");
    assert_blocked_consistent(&manager);

    let status = manager.status();
    assert_eq!(status.active_count, 1);
    assert_eq!(status.candidate_count, 2);
    assert_eq!(status.canonical_count, 0);
    assert_eq!(status.movement_count, 0);

    manager.resolve_conflict(conflicts[0].id, Side::A).unwrap();
    let status = manager.status();
    assert_eq!(status.active_count, 0);
    assert_eq!(status.resolved_count, 1);
    assert_eq!(status.candidate_count, 0);
    assert_eq!(status.canonical_count, 1);
    assert_eq!(status.movement_count, 1);
    assert_eq!(status.current_priority, None);
    assert_blocked_consistent(&manager);
}
