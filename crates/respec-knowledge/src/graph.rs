//! Knowledge graph query surface
//!
//! Provides the [`KnowledgeGraph`] trait consumed by the artifact engine and
//! the value types it returns. Implementations are read-only; the engine
//! never mutates the catalog.

use crate::id::{RequirementId, ScenarioId, SpecId};
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Read-only hierarchy and constraint queries
///
/// # Contract
/// - Parent lists are ordered; the first entry is authoritative
/// - Exclusion entries for `x` never list `x` itself
/// - All methods are pure lookups (no I/O, O(small-n))
pub trait KnowledgeGraph: Send + Sync + Debug {
    /// Requirements that contain the specification
    fn parent_requirements(&self, spec: &SpecId) -> Vec<RequirementRef>;

    /// Scenarios that contain the requirement
    fn parent_scenarios(&self, requirement: &RequirementId) -> Vec<ScenarioRef>;

    /// Display metadata of a requirement
    fn requirement(&self, id: &RequirementId) -> Option<RequirementMeta>;

    /// Display metadata of a scenario
    fn scenario(&self, id: &ScenarioId) -> Option<ScenarioMeta>;

    /// Exclusion entries that name the specification
    fn exclusions_of(&self, spec: &SpecId) -> Vec<ExclusionEntry>;

    /// UI field metadata for the specification
    ///
    /// Default implementation knows no fields.
    fn field_meta(&self, _spec: &SpecId) -> Option<FieldMeta> {
        None
    }

    /// Specifications the given one cannot be chosen without
    ///
    /// Default implementation declares no dependencies.
    fn dependencies_of(&self, _spec: &SpecId) -> Vec<SpecId> {
        Vec::new()
    }

    /// Human-facing label: field label when known, else the raw id
    fn label_of(&self, spec: &SpecId) -> String {
        self.field_meta(spec)
            .map_or_else(|| spec.to_string(), |meta| meta.label)
    }

    /// Check whether `a` and `b` are declared mutually exclusive
    fn excludes(&self, a: &SpecId, b: &SpecId) -> bool {
        self.exclusions_of(a)
            .iter()
            .any(|entry| entry.other_ids.contains(b))
    }
}

/// Reference to a parent requirement
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct RequirementRef {
    /// Requirement identifier
    pub id: RequirementId,
}

/// Reference to a parent scenario
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ScenarioRef {
    /// Scenario identifier
    pub id: ScenarioId,
}

/// Requirement display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RequirementMeta {
    /// Requirement identifier
    pub id: RequirementId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl RequirementMeta {
    /// Create metadata without description
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<RequirementId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// Scenario display metadata
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScenarioMeta {
    /// Scenario identifier
    pub id: ScenarioId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

impl ScenarioMeta {
    /// Create metadata without description
    #[inline]
    #[must_use]
    pub fn new(id: impl Into<ScenarioId>, name: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            description: None,
        }
    }

    /// With description
    #[inline]
    #[must_use]
    pub fn with_description(mut self, description: impl Into<String>) -> Self {
        self.description = Some(description.into());
        self
    }
}

/// UI metadata for a conversational field
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct FieldMeta {
    /// Label shown to the user
    pub label: String,

    /// Unit suffix (e.g. `W`, `GB`)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,

    /// UI component hint (dropdown, slider, ...)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
}

impl FieldMeta {
    /// Create field metadata with a label only
    #[inline]
    #[must_use]
    pub fn labeled(label: impl Into<String>) -> Self {
        Self {
            label: label.into(),
            ..Self::default()
        }
    }
}

/// One row of the exclusion table, seen from a single member
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExclusionEntry {
    /// Members that cannot coexist with the queried specification
    pub other_ids: Vec<SpecId>,

    /// Stored clarification question for this group
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question_template: Option<QuestionTemplate>,
}

/// Clarification question stored with an exclusion group
///
/// `{first}` and `{second}` are replaced with the labels of the first and
/// second conflicting specifications in ascending id order, which is also the
/// order of option A and option B. The order the group was declared in does
/// not matter, so write the text for id order.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuestionTemplate {
    /// Question text
    pub text: String,

    /// Label for option A (keep the first node)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_a: Option<String>,

    /// Label for option B (keep the second node)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub option_b: Option<String>,
}

impl QuestionTemplate {
    /// Template with question text only
    #[inline]
    #[must_use]
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            option_a: None,
            option_b: None,
        }
    }

    /// With explicit option labels
    #[inline]
    #[must_use]
    pub fn with_options(mut self, option_a: impl Into<String>, option_b: impl Into<String>) -> Self {
        self.option_a = Some(option_a.into());
        self.option_b = Some(option_b.into());
        self
    }

    /// Render question text with node labels
    #[must_use]
    pub fn render_question(&self, first: &str, second: &str) -> String {
        Self::substitute(&self.text, first, second)
    }

    /// Render option A label, if the template carries one
    #[must_use]
    pub fn render_option_a(&self, first: &str, second: &str) -> Option<String> {
        self.option_a
            .as_deref()
            .map(|text| Self::substitute(text, first, second))
    }

    /// Render option B label, if the template carries one
    #[must_use]
    pub fn render_option_b(&self, first: &str, second: &str) -> Option<String> {
        self.option_b
            .as_deref()
            .map(|text| Self::substitute(text, first, second))
    }

    fn substitute(text: &str, first: &str, second: &str) -> String {
        text.replace("{first}", first).replace("{second}", second)
    }
}
