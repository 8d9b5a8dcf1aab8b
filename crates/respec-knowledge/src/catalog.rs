//! In-memory knowledge catalog
//!
//! Provides [`Catalog`], the [`KnowledgeGraph`] implementation backed by
//! insertion-ordered maps. Parent lists keep declaration order so the first
//! declared parent stays authoritative.

use crate::graph::{
    ExclusionEntry, FieldMeta, KnowledgeGraph, QuestionTemplate, RequirementMeta,
    RequirementRef, ScenarioMeta, ScenarioRef,
};
use crate::id::{RequirementId, ScenarioId, SpecId};
use indexmap::IndexMap;

/// Static product catalog
///
/// Built either programmatically (`with_*` / `add_*`) or from a
/// [`CatalogDocument`](crate::CatalogDocument).
#[derive(Debug, Clone, Default)]
pub struct Catalog {
    scenarios: IndexMap<ScenarioId, ScenarioMeta>,
    requirements: IndexMap<RequirementId, RequirementNode>,
    specifications: IndexMap<SpecId, SpecificationNode>,
    exclusions: IndexMap<SpecId, Vec<ExclusionEntry>>,
    exclusion_groups: usize,
}

#[derive(Debug, Clone)]
struct RequirementNode {
    meta: RequirementMeta,
    scenarios: Vec<ScenarioId>,
}

#[derive(Debug, Clone, Default)]
struct SpecificationNode {
    requirements: Vec<RequirementId>,
    field: Option<FieldMeta>,
    requires: Vec<SpecId>,
}

impl Catalog {
    /// Create empty catalog
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With scenario
    #[must_use]
    pub fn with_scenario(mut self, id: &str, name: &str) -> Self {
        self.add_scenario(ScenarioMeta::new(id, name));
        self
    }

    /// With requirement under the given scenarios (first is authoritative)
    #[must_use]
    pub fn with_requirement<'a>(
        mut self,
        id: &str,
        name: &str,
        scenarios: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.add_requirement(
            RequirementMeta::new(id, name),
            scenarios.into_iter().map(ScenarioId::from),
        );
        self
    }

    /// With specification under the given requirements (first is authoritative)
    #[must_use]
    pub fn with_specification<'a>(
        mut self,
        id: &str,
        requirements: impl IntoIterator<Item = &'a str>,
    ) -> Self {
        self.add_specification(
            SpecId::from(id),
            requirements.into_iter().map(RequirementId::from),
            None,
        );
        self
    }

    /// With UI label for an already declared specification
    #[must_use]
    pub fn with_label(mut self, id: &str, label: &str) -> Self {
        self.set_field_meta(&SpecId::from(id), FieldMeta::labeled(label));
        self
    }

    /// With exclusion group
    #[must_use]
    pub fn with_exclusion<'a>(mut self, ids: impl IntoIterator<Item = &'a str>) -> Self {
        self.add_exclusion(ids.into_iter().map(SpecId::from).collect(), None);
        self
    }

    /// With exclusion group carrying a clarification question
    #[must_use]
    pub fn with_exclusion_question<'a>(
        mut self,
        ids: impl IntoIterator<Item = &'a str>,
        template: QuestionTemplate,
    ) -> Self {
        self.add_exclusion(ids.into_iter().map(SpecId::from).collect(), Some(template));
        self
    }

    /// With dependency: `dependent` cannot be chosen without `required`
    #[must_use]
    pub fn with_dependency(mut self, dependent: &str, required: &str) -> Self {
        self.add_dependency(&SpecId::from(dependent), SpecId::from(required));
        self
    }

    /// Register scenario (replaces metadata of an existing id)
    pub fn add_scenario(&mut self, meta: ScenarioMeta) {
        self.scenarios.insert(meta.id.clone(), meta);
    }

    /// Register requirement and its parent scenarios
    pub fn add_requirement(
        &mut self,
        meta: RequirementMeta,
        scenarios: impl IntoIterator<Item = ScenarioId>,
    ) {
        let scenarios = scenarios.into_iter().collect();
        self.requirements
            .insert(meta.id.clone(), RequirementNode { meta, scenarios });
    }

    /// Register specification, its parent requirements and field metadata
    pub fn add_specification(
        &mut self,
        id: SpecId,
        requirements: impl IntoIterator<Item = RequirementId>,
        field: Option<FieldMeta>,
    ) {
        let node = self.specifications.entry(id).or_default();
        node.requirements = requirements.into_iter().collect();
        node.field = field;
    }

    /// Attach field metadata to a declared specification
    ///
    /// Unknown ids are ignored.
    pub fn set_field_meta(&mut self, id: &SpecId, field: FieldMeta) {
        if let Some(node) = self.specifications.get_mut(id) {
            node.field = Some(field);
        }
    }

    /// Register dependency edge
    pub fn add_dependency(&mut self, dependent: &SpecId, required: SpecId) {
        let node = self.specifications.entry(dependent.clone()).or_default();
        if !node.requires.contains(&required) {
            node.requires.push(required);
        }
    }

    /// Register exclusion group
    ///
    /// Every member sees the other members as excluded. Duplicate members
    /// are collapsed; groups with fewer than two distinct members register
    /// nothing.
    pub fn add_exclusion(&mut self, ids: Vec<SpecId>, template: Option<QuestionTemplate>) {
        let mut members: Vec<SpecId> = Vec::with_capacity(ids.len());
        for id in ids {
            if !members.contains(&id) {
                members.push(id);
            }
        }

        if members.len() < 2 {
            tracing::debug!(group = ?members, "skipping exclusion group with fewer than two members");
            return;
        }

        for member in &members {
            let other_ids = members.iter().filter(|id| *id != member).cloned().collect();
            self.exclusions
                .entry(member.clone())
                .or_default()
                .push(ExclusionEntry {
                    other_ids,
                    question_template: template.clone(),
                });
        }
        self.exclusion_groups += 1;
    }

    /// Number of scenarios
    #[inline]
    #[must_use]
    pub fn scenario_count(&self) -> usize {
        self.scenarios.len()
    }

    /// Number of requirements
    #[inline]
    #[must_use]
    pub fn requirement_count(&self) -> usize {
        self.requirements.len()
    }

    /// Number of specifications
    #[inline]
    #[must_use]
    pub fn specification_count(&self) -> usize {
        self.specifications.len()
    }

    /// Number of registered exclusion groups
    #[inline]
    #[must_use]
    pub fn exclusion_count(&self) -> usize {
        self.exclusion_groups
    }

    /// Check if specification is declared
    #[inline]
    #[must_use]
    pub fn contains_specification(&self, id: &SpecId) -> bool {
        self.specifications.contains_key(id)
    }

    /// Declared specification ids in declaration order
    pub fn specification_ids(&self) -> impl Iterator<Item = &SpecId> {
        self.specifications.keys()
    }
}

impl KnowledgeGraph for Catalog {
    fn parent_requirements(&self, spec: &SpecId) -> Vec<RequirementRef> {
        self.specifications
            .get(spec)
            .map(|node| {
                node.requirements
                    .iter()
                    .map(|id| RequirementRef { id: id.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn parent_scenarios(&self, requirement: &RequirementId) -> Vec<ScenarioRef> {
        self.requirements
            .get(requirement)
            .map(|node| {
                node.scenarios
                    .iter()
                    .map(|id| ScenarioRef { id: id.clone() })
                    .collect()
            })
            .unwrap_or_default()
    }

    fn requirement(&self, id: &RequirementId) -> Option<RequirementMeta> {
        self.requirements.get(id).map(|node| node.meta.clone())
    }

    fn scenario(&self, id: &ScenarioId) -> Option<ScenarioMeta> {
        self.scenarios.get(id).cloned()
    }

    fn exclusions_of(&self, spec: &SpecId) -> Vec<ExclusionEntry> {
        self.exclusions.get(spec).cloned().unwrap_or_default()
    }

    fn field_meta(&self, spec: &SpecId) -> Option<FieldMeta> {
        self.specifications
            .get(spec)
            .and_then(|node| node.field.clone())
    }

    fn dependencies_of(&self, spec: &SpecId) -> Vec<SpecId> {
        self.specifications
            .get(spec)
            .map(|node| node.requires.clone())
            .unwrap_or_default()
    }
}
