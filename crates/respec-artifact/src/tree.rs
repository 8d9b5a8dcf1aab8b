//! Hierarchical artifact tree
//!
//! Provides [`ArtifactTree`], the Scenario → Requirement → Specification
//! container used for both the candidate and the canonical side of the
//! working set.
//!
//! Maps are persistent (`im::OrdMap`): cloning a tree shares structure, so a
//! full snapshot for a resolution transaction costs O(1) and restoring it is
//! a plain assignment.

use crate::error::{HierarchyError, HierarchyLevel};
use crate::specification::{InsertSource, Specification};
use chrono::{DateTime, Utc};
use im::OrdMap;
use respec_knowledge::{
    KnowledgeGraph, RequirementId, RequirementMeta, ScenarioId, ScenarioMeta, SpecId,
};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt::{self, Display, Formatter};

/// Which side of the working set a tree holds
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum TreeKind {
    /// Unvalidated choices
    Candidate,

    /// Validated, conflict-free choices
    Canonical,
}

impl Display for TreeKind {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Candidate => f.write_str("candidate"),
            Self::Canonical => f.write_str("canonical"),
        }
    }
}

/// Requirement node: groups specifications
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Requirement {
    /// Requirement identifier
    pub id: RequirementId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    specifications: OrdMap<SpecId, Specification>,
}

impl Requirement {
    fn from_meta(meta: RequirementMeta) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            description: meta.description,
            specifications: OrdMap::new(),
        }
    }

    /// Metadata view of this node
    #[must_use]
    pub fn meta(&self) -> RequirementMeta {
        RequirementMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Specifications in id order
    pub fn specifications(&self) -> impl Iterator<Item = &Specification> {
        self.specifications.values()
    }

    /// Lookup specification
    #[inline]
    #[must_use]
    pub fn get(&self, id: &SpecId) -> Option<&Specification> {
        self.specifications.get(id)
    }

    /// Number of specifications
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.specifications.len()
    }

    /// Check if empty
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.specifications.is_empty()
    }
}

/// Scenario node: groups requirements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Scenario {
    /// Scenario identifier
    pub id: ScenarioId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    requirements: OrdMap<RequirementId, Requirement>,
}

impl Scenario {
    fn from_meta(meta: ScenarioMeta) -> Self {
        Self {
            id: meta.id,
            name: meta.name,
            description: meta.description,
            requirements: OrdMap::new(),
        }
    }

    /// Metadata view of this node
    #[must_use]
    pub fn meta(&self) -> ScenarioMeta {
        ScenarioMeta {
            id: self.id.clone(),
            name: self.name.clone(),
            description: self.description.clone(),
        }
    }

    /// Requirements in id order
    pub fn requirements(&self) -> impl Iterator<Item = &Requirement> {
        self.requirements.values()
    }

    /// Lookup requirement
    #[inline]
    #[must_use]
    pub fn requirement(&self, id: &RequirementId) -> Option<&Requirement> {
        self.requirements.get(id)
    }
}

/// Tree-level bookkeeping
#[derive(Debug, Clone, PartialEq, Default, Serialize, Deserialize)]
pub struct TreeMetadata {
    /// Number of specifications in the tree
    pub total_specifications: usize,

    /// Last mutation time
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub last_modified: Option<DateTime<Utc>>,

    /// Candidate ids not yet checked for conflicts (candidate tree only)
    #[serde(default)]
    pub pending_validation: Vec<SpecId>,
}

/// Scenario → Requirement → Specification container
///
/// # Invariants
/// - A specification id appears at most once in the tree
/// - Scenario and requirement nodes exist only while they hold a specification
/// - `metadata.total_specifications` equals the number of leaves
/// - `pending_validation` is empty for canonical trees
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactTree {
    kind: TreeKind,
    scenarios: OrdMap<ScenarioId, Scenario>,
    metadata: TreeMetadata,
}

impl ArtifactTree {
    /// Create empty tree
    #[inline]
    #[must_use]
    pub fn new(kind: TreeKind) -> Self {
        Self {
            kind,
            scenarios: OrdMap::new(),
            metadata: TreeMetadata::default(),
        }
    }

    /// Create empty candidate tree
    #[inline]
    #[must_use]
    pub fn candidate() -> Self {
        Self::new(TreeKind::Candidate)
    }

    /// Create empty canonical tree
    #[inline]
    #[must_use]
    pub fn canonical() -> Self {
        Self::new(TreeKind::Canonical)
    }

    /// Tree kind
    #[inline]
    #[must_use]
    pub fn kind(&self) -> TreeKind {
        self.kind
    }

    /// Tree metadata
    #[inline]
    #[must_use]
    pub fn metadata(&self) -> &TreeMetadata {
        &self.metadata
    }

    /// Insert or overwrite a specification under its catalog ancestry
    ///
    /// The first parent returned by the graph is authoritative at both
    /// levels. Intermediate nodes are created on first reference with the
    /// graph's display metadata.
    ///
    /// # Errors
    /// `HierarchyError::NoParent` when the graph has no requirement or
    /// scenario ancestry; the tree is left untouched.
    pub fn insert<G>(
        &mut self,
        spec: Specification,
        source: InsertSource,
        graph: &G,
    ) -> Result<(), HierarchyError>
    where
        G: KnowledgeGraph + ?Sized,
    {
        let (scenario, requirement) = resolve_ancestry(&spec.id, graph)?;
        self.place(spec, scenario, requirement, source);
        Ok(())
    }

    /// Insert using ancestry taken from another tree
    ///
    /// Existing nodes keep their metadata; missing ones are created from
    /// the supplied metadata.
    pub fn graft(
        &mut self,
        spec: Specification,
        scenario: ScenarioMeta,
        requirement: RequirementMeta,
        source: InsertSource,
    ) {
        self.place(spec, scenario, requirement, source);
    }

    fn place(
        &mut self,
        spec: Specification,
        scenario: ScenarioMeta,
        requirement: RequirementMeta,
        source: InsertSource,
    ) {
        let id = spec.id.clone();

        // Relocate if the same id sits under a different parent
        if let Some((old_scenario, old_requirement)) = self.location(&id) {
            if old_scenario != scenario.id || old_requirement != requirement.id {
                self.detach(&old_scenario, &old_requirement, &id);
            }
        }

        let scenario_id = scenario.id.clone();
        let requirement_id = requirement.id.clone();

        if !self.scenarios.contains_key(&scenario_id) {
            self.scenarios
                .insert(scenario_id.clone(), Scenario::from_meta(scenario));
        }
        let Some(scenario_node) = self.scenarios.get_mut(&scenario_id) else {
            return;
        };

        if !scenario_node.requirements.contains_key(&requirement_id) {
            scenario_node
                .requirements
                .insert(requirement_id.clone(), Requirement::from_meta(requirement));
        }
        let Some(requirement_node) = scenario_node.requirements.get_mut(&requirement_id) else {
            return;
        };

        let replaced = requirement_node.specifications.insert(id.clone(), spec);
        if replaced.is_none() {
            self.metadata.total_specifications += 1;
        }
        self.touch();

        if self.kind == TreeKind::Candidate
            && !source.bypasses_validation()
            && !self.metadata.pending_validation.contains(&id)
        {
            self.metadata.pending_validation.push(id.clone());
        }

        tracing::debug!(
            tree = %self.kind,
            spec_id = %id,
            scenario = %scenario_id,
            requirement = %requirement_id,
            overwrite = replaced.is_some(),
            "specification placed"
        );
    }

    /// Remove a specification wherever it sits
    ///
    /// Empty requirement and scenario nodes are pruned. Returns the removed
    /// value, or `None` when absent (idempotent).
    pub fn remove(&mut self, id: &SpecId) -> Option<Specification> {
        let (scenario_id, requirement_id) = self.location(id)?;
        let removed = self.detach(&scenario_id, &requirement_id, id);
        if removed.is_some() {
            tracing::debug!(tree = %self.kind, spec_id = %id, "specification removed");
        }
        removed
    }

    fn detach(
        &mut self,
        scenario_id: &ScenarioId,
        requirement_id: &RequirementId,
        id: &SpecId,
    ) -> Option<Specification> {
        let scenario = self.scenarios.get_mut(scenario_id)?;
        let requirement = scenario.requirements.get_mut(requirement_id)?;
        let removed = requirement.specifications.remove(id)?;

        if requirement.specifications.is_empty() {
            scenario.requirements.remove(requirement_id);
        }
        if scenario.requirements.is_empty() {
            self.scenarios.remove(scenario_id);
        }

        self.metadata.total_specifications = self.metadata.total_specifications.saturating_sub(1);
        self.metadata.pending_validation.retain(|pending| pending != id);
        self.touch();
        Some(removed)
    }

    /// Lookup specification
    ///
    /// Walks scenarios × requirements; trees hold dozens of nodes.
    #[must_use]
    pub fn find(&self, id: &SpecId) -> Option<&Specification> {
        self.scenarios
            .values()
            .flat_map(|scenario| scenario.requirements.values())
            .find_map(|requirement| requirement.specifications.get(id))
    }

    /// Check if specification is present
    #[inline]
    #[must_use]
    pub fn contains(&self, id: &SpecId) -> bool {
        self.find(id).is_some()
    }

    /// Scenario and requirement holding the specification
    #[must_use]
    pub fn location(&self, id: &SpecId) -> Option<(ScenarioId, RequirementId)> {
        self.scenarios.values().find_map(|scenario| {
            scenario
                .requirements
                .values()
                .find(|requirement| requirement.specifications.contains_key(id))
                .map(|requirement| (scenario.id.clone(), requirement.id.clone()))
        })
    }

    /// Ancestry metadata of the specification, for grafting elsewhere
    #[must_use]
    pub fn ancestry(&self, id: &SpecId) -> Option<(ScenarioMeta, RequirementMeta)> {
        let (scenario_id, requirement_id) = self.location(id)?;
        let scenario = self.scenarios.get(&scenario_id)?;
        let requirement = scenario.requirements.get(&requirement_id)?;
        Some((scenario.meta(), requirement.meta()))
    }

    /// All specification ids, sorted
    #[must_use]
    pub fn spec_ids(&self) -> BTreeSet<SpecId> {
        self.specifications().map(|spec| spec.id.clone()).collect()
    }

    /// All specifications in scenario/requirement/id order
    pub fn specifications(&self) -> impl Iterator<Item = &Specification> {
        self.scenarios
            .values()
            .flat_map(|scenario| scenario.requirements.values())
            .flat_map(|requirement| requirement.specifications.values())
    }

    /// Materialized scenarios in id order
    pub fn scenarios(&self) -> impl Iterator<Item = &Scenario> {
        self.scenarios.values()
    }

    /// Lookup scenario node
    #[inline]
    #[must_use]
    pub fn scenario(&self, id: &ScenarioId) -> Option<&Scenario> {
        self.scenarios.get(id)
    }

    /// Number of specifications
    #[inline]
    #[must_use]
    pub fn len(&self) -> usize {
        self.metadata.total_specifications
    }

    /// Check if the tree holds no specification
    #[inline]
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.scenarios.is_empty()
    }

    /// Ids awaiting conflict detection
    #[inline]
    #[must_use]
    pub fn pending_validation(&self) -> &[SpecId] {
        &self.metadata.pending_validation
    }

    /// Drain the pending-validation list
    pub fn take_pending(&mut self) -> Vec<SpecId> {
        std::mem::take(&mut self.metadata.pending_validation)
    }

    fn touch(&mut self) {
        self.metadata.last_modified = Some(Utc::now());
    }
}

fn resolve_ancestry<G>(
    spec: &SpecId,
    graph: &G,
) -> Result<(ScenarioMeta, RequirementMeta), HierarchyError>
where
    G: KnowledgeGraph + ?Sized,
{
    let requirement_id = graph
        .parent_requirements(spec)
        .into_iter()
        .next()
        .ok_or_else(|| HierarchyError::NoParent {
            node: spec.to_string(),
            level: HierarchyLevel::Requirement,
        })?
        .id;

    let scenario_id = graph
        .parent_scenarios(&requirement_id)
        .into_iter()
        .next()
        .ok_or_else(|| HierarchyError::NoParent {
            node: requirement_id.to_string(),
            level: HierarchyLevel::Scenario,
        })?
        .id;

    let requirement = graph.requirement(&requirement_id).unwrap_or_else(|| {
        let name = requirement_id.to_string();
        RequirementMeta::new(requirement_id, name)
    });
    let scenario = graph.scenario(&scenario_id).unwrap_or_else(|| {
        let name = scenario_id.to_string();
        ScenarioMeta::new(scenario_id, name)
    });

    Ok((scenario, requirement))
}
