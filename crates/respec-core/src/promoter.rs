//! Candidate → canonical promotion with an audit trail

use chrono::{DateTime, Utc};
use respec_artifact::{ArtifactTree, InsertSource, TreeKind};
use respec_knowledge::SpecId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};
use ulid::Ulid;

/// Unique movement identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct MovementId(pub Ulid);

impl MovementId {
    /// Generate new movement ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for MovementId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for MovementId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// What caused a promotion pass
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum MovementTrigger {
    /// Auto-promotion after an add
    SpecificationAdded,
    /// Promotion closing a resolution
    ConflictResolved,
    /// Explicit promote call
    Manual,
}

/// Audit record of one promotion pass; never mutated
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Movement {
    /// Movement identifier
    pub id: MovementId,
    /// When the pass ran
    pub timestamp: DateTime<Utc>,
    /// Tree the ids left
    pub source: TreeKind,
    /// Tree the ids entered
    pub target: TreeKind,
    /// Promoted ids, empty when nothing moved
    pub spec_ids: Vec<SpecId>,
    /// What caused the pass
    pub trigger: MovementTrigger,
}

impl Movement {
    /// Check if the pass moved nothing
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.spec_ids.is_empty()
    }
}

/// Moves conflict-free candidates into canonical
#[derive(Debug, Clone, Copy, Default)]
pub struct Promoter;

impl Promoter {
    /// Promote every candidate not named by an active conflict
    ///
    /// Canonical reuses its existing scenario and requirement nodes and
    /// creates missing ones from the candidate's metadata. Always returns a
    /// movement, empty when nothing was eligible. No promoted id remains in
    /// candidate.
    pub fn promote_clean(
        &self,
        candidate: &mut ArtifactTree,
        canonical: &mut ArtifactTree,
        blocked_ids: &BTreeSet<SpecId>,
        trigger: MovementTrigger,
    ) -> Movement {
        let eligible: Vec<SpecId> = candidate
            .spec_ids()
            .into_iter()
            .filter(|id| !blocked_ids.contains(id))
            .collect();

        let mut moved = Vec::with_capacity(eligible.len());
        for id in eligible {
            let Some((scenario, requirement)) = candidate.ancestry(&id) else {
                continue;
            };
            let Some(spec) = candidate.remove(&id) else {
                continue;
            };
            canonical.graft(spec, scenario, requirement, InsertSource::UserInput);
            moved.push(id);
        }

        let movement = Movement {
            id: MovementId::new(),
            timestamp: Utc::now(),
            source: candidate.kind(),
            target: canonical.kind(),
            spec_ids: moved,
            trigger,
        };

        if movement.is_empty() {
            tracing::debug!(movement_id = %movement.id, trigger = ?trigger, "nothing to promote");
        } else {
            tracing::info!(
                movement_id = %movement.id,
                trigger = ?trigger,
                count = movement.spec_ids.len(),
                "specifications promoted"
            );
        }
        movement
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use respec_artifact::Specification;
    use respec_knowledge::{Catalog, RequirementId, ScenarioId};

    fn catalog() -> Catalog {
        Catalog::new()
            .with_scenario("s", "Scenario")
            .with_requirement("r", "Requirement", ["s"])
            .with_specification("a", ["r"])
            .with_specification("b", ["r"])
            .with_specification("c", ["r"])
    }

    fn fill(tree: &mut ArtifactTree, ids: &[&str], graph: &Catalog) {
        for id in ids {
            tree.insert(Specification::new(*id, *id, "v"), InsertSource::UserInput, graph)
                .unwrap();
        }
    }

    #[test]
    fn blocked_ids_stay_in_candidate() {
        let graph = catalog();
        let mut candidate = ArtifactTree::candidate();
        let mut canonical = ArtifactTree::canonical();
        fill(&mut candidate, &["a", "b", "c"], &graph);

        let blocked: BTreeSet<SpecId> = [SpecId::from("b")].into_iter().collect();
        let movement =
            Promoter.promote_clean(&mut candidate, &mut canonical, &blocked, MovementTrigger::Manual);

        assert_eq!(movement.spec_ids, vec![SpecId::from("a"), SpecId::from("c")]);
        assert_eq!(movement.source, TreeKind::Candidate);
        assert_eq!(movement.target, TreeKind::Canonical);
        assert_eq!(candidate.spec_ids().len(), 1);
        assert!(candidate.contains(&SpecId::from("b")));
        assert_eq!(canonical.len(), 2);
    }

    #[test]
    fn empty_pass_still_records_movement() {
        let mut candidate = ArtifactTree::candidate();
        let mut canonical = ArtifactTree::canonical();
        let movement = Promoter.promote_clean(
            &mut candidate,
            &mut canonical,
            &BTreeSet::new(),
            MovementTrigger::SpecificationAdded,
        );
        assert!(movement.is_empty());
    }

    #[test]
    fn existing_canonical_nodes_reused() {
        let graph = catalog();
        let mut candidate = ArtifactTree::candidate();
        let mut canonical = ArtifactTree::canonical();
        fill(&mut canonical, &["a"], &graph);
        fill(&mut candidate, &["b"], &graph);

        Promoter.promote_clean(
            &mut candidate,
            &mut canonical,
            &BTreeSet::new(),
            MovementTrigger::ConflictResolved,
        );

        assert!(candidate.is_empty());
        assert_eq!(canonical.scenarios().count(), 1);
        let requirement = canonical
            .scenario(&ScenarioId::from("s"))
            .and_then(|s| s.requirement(&RequirementId::from("r")))
            .unwrap();
        assert_eq!(requirement.len(), 2);
    }

    #[test]
    fn no_id_in_both_trees() {
        let graph = catalog();
        let mut candidate = ArtifactTree::candidate();
        let mut canonical = ArtifactTree::canonical();
        fill(&mut candidate, &["a", "b"], &graph);
        fill(&mut canonical, &["c"], &graph);

        Promoter.promote_clean(&mut candidate, &mut canonical, &BTreeSet::new(), MovementTrigger::Manual);

        let overlap: Vec<_> = candidate
            .spec_ids()
            .intersection(&canonical.spec_ids())
            .cloned()
            .collect();
        assert!(overlap.is_empty());
    }
}
