//! Declarative catalog documents
//!
//! Provides [`CatalogDocument`], the serde form of a [`Catalog`], together
//! with JSON/YAML entry points and referential validation.

use crate::catalog::Catalog;
use crate::graph::{FieldMeta, QuestionTemplate, RequirementMeta, ScenarioMeta};
use crate::id::{RequirementId, ScenarioId, SpecId};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::{Path, PathBuf};

/// Catalog loading and validation errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// Malformed JSON document
    #[error("invalid catalog json: {0}")]
    Json(#[from] serde_json::Error),

    /// Malformed YAML document
    #[error("invalid catalog yaml: {0}")]
    Yaml(#[from] serde_yaml::Error),

    /// File could not be read
    #[error("cannot read catalog {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// File extension is neither json nor yaml/yml
    #[error("unsupported catalog format: {0}")]
    UnsupportedFormat(String),

    /// Same id declared twice at one level
    #[error("duplicate {kind} '{id}'")]
    DuplicateNode {
        /// Hierarchy level
        kind: &'static str,
        /// Repeated id
        id: String,
    },

    /// Reference to an undeclared node
    #[error("{from} references unknown {kind} '{target}'")]
    UnknownReference {
        /// Node holding the reference
        from: String,
        /// Level of the missing node
        kind: &'static str,
        /// Missing id
        target: String,
    },

    /// Exclusion group with fewer than two distinct members
    #[error("exclusion #{index} needs at least two distinct specifications")]
    ExclusionTooSmall {
        /// Position in the exclusion list
        index: usize,
    },
}

/// Serialized catalog
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct CatalogDocument {
    /// Scenario entries
    #[serde(default)]
    pub scenarios: Vec<ScenarioDoc>,
    /// Requirement entries
    #[serde(default)]
    pub requirements: Vec<RequirementDoc>,
    /// Specification entries
    #[serde(default)]
    pub specifications: Vec<SpecificationDoc>,
    /// Exclusion groups
    #[serde(default)]
    pub exclusions: Vec<ExclusionDoc>,
}

/// Scenario entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScenarioDoc {
    /// Scenario identifier
    pub id: ScenarioId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
}

/// Requirement entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RequirementDoc {
    /// Requirement identifier
    pub id: RequirementId,
    /// Display name
    pub name: String,
    /// Longer display text
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    /// Parent scenarios, first is authoritative
    #[serde(default)]
    pub scenarios: Vec<ScenarioId>,
}

/// Specification entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationDoc {
    /// Specification identifier
    pub id: SpecId,
    /// Parent requirements, first is authoritative
    #[serde(default)]
    pub requirements: Vec<RequirementId>,
    /// Display label, defaults to the id
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub label: Option<String>,
    /// Unit of the value
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub unit: Option<String>,
    /// Component the value belongs to
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub component: Option<String>,
    /// Specifications this one depends on
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub requires: Vec<SpecId>,
}

/// Exclusion group entry
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ExclusionDoc {
    /// Members, at least two
    pub ids: Vec<SpecId>,
    /// Stored clarification question
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub question: Option<QuestionDoc>,
}

/// Question as written in a document: bare text or text with option labels
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum QuestionDoc {
    /// Question text only
    Text(String),

    /// Question text with option labels
    Full {
        /// Question text
        text: String,
        /// Label for option A
        #[serde(default)]
        option_a: Option<String>,
        /// Label for option B
        #[serde(default)]
        option_b: Option<String>,
    },
}

impl From<QuestionDoc> for QuestionTemplate {
    fn from(doc: QuestionDoc) -> Self {
        match doc {
            QuestionDoc::Text(text) => QuestionTemplate::new(text),
            QuestionDoc::Full {
                text,
                option_a,
                option_b,
            } => QuestionTemplate {
                text,
                option_a,
                option_b,
            },
        }
    }
}

impl CatalogDocument {
    /// Parse JSON document
    ///
    /// # Errors
    /// Returns error if the text is not a valid document
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_json::from_str(text)?)
    }

    /// Parse YAML document
    ///
    /// # Errors
    /// Returns error if the text is not a valid document
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        Ok(serde_yaml::from_str(text)?)
    }

    /// Check referential integrity
    ///
    /// # Errors
    /// - `DuplicateNode` when an id is declared twice at the same level
    /// - `UnknownReference` when a parent, dependency or exclusion member is undeclared
    /// - `ExclusionTooSmall` when a group has fewer than two distinct members
    pub fn validate(&self) -> Result<(), CatalogError> {
        let scenarios = unique_ids(self.scenarios.iter().map(|s| s.id.as_str()), "scenario")?;
        let requirements =
            unique_ids(self.requirements.iter().map(|r| r.id.as_str()), "requirement")?;
        let specifications =
            unique_ids(self.specifications.iter().map(|s| s.id.as_str()), "specification")?;

        for requirement in &self.requirements {
            for scenario in &requirement.scenarios {
                ensure_known(&scenarios, scenario.as_str(), "scenario", || {
                    format!("requirement '{}'", requirement.id)
                })?;
            }
        }

        for spec in &self.specifications {
            for requirement in &spec.requirements {
                ensure_known(&requirements, requirement.as_str(), "requirement", || {
                    format!("specification '{}'", spec.id)
                })?;
            }
            for required in &spec.requires {
                ensure_known(&specifications, required.as_str(), "specification", || {
                    format!("specification '{}'", spec.id)
                })?;
            }
        }

        for (index, exclusion) in self.exclusions.iter().enumerate() {
            let distinct: HashSet<&str> = exclusion.ids.iter().map(SpecId::as_str).collect();
            if distinct.len() < 2 {
                return Err(CatalogError::ExclusionTooSmall { index });
            }
            for id in &exclusion.ids {
                ensure_known(&specifications, id.as_str(), "specification", || {
                    format!("exclusion #{index}")
                })?;
            }
        }

        Ok(())
    }

    /// Validate and build the in-memory catalog
    ///
    /// # Errors
    /// Returns the first validation failure
    pub fn into_catalog(self) -> Result<Catalog, CatalogError> {
        self.validate()?;

        let mut catalog = Catalog::new();
        for scenario in self.scenarios {
            catalog.add_scenario(ScenarioMeta {
                id: scenario.id,
                name: scenario.name,
                description: scenario.description,
            });
        }
        for requirement in self.requirements {
            catalog.add_requirement(
                RequirementMeta {
                    id: requirement.id,
                    name: requirement.name,
                    description: requirement.description,
                },
                requirement.scenarios,
            );
        }
        for spec in self.specifications {
            let field = spec.label.map(|label| FieldMeta {
                label,
                unit: spec.unit,
                component: spec.component,
            });
            for required in spec.requires {
                catalog.add_dependency(&spec.id, required);
            }
            catalog.add_specification(spec.id, spec.requirements, field);
        }
        for exclusion in self.exclusions {
            catalog.add_exclusion(exclusion.ids, exclusion.question.map(Into::into));
        }

        tracing::debug!(
            scenarios = catalog.scenario_count(),
            requirements = catalog.requirement_count(),
            specifications = catalog.specification_count(),
            exclusions = catalog.exclusion_count(),
            "catalog built"
        );
        Ok(catalog)
    }
}

impl Catalog {
    /// Load catalog from JSON text
    ///
    /// # Errors
    /// Returns error on parse or validation failure
    pub fn from_json_str(text: &str) -> Result<Self, CatalogError> {
        CatalogDocument::from_json_str(text)?.into_catalog()
    }

    /// Load catalog from YAML text
    ///
    /// # Errors
    /// Returns error on parse or validation failure
    pub fn from_yaml_str(text: &str) -> Result<Self, CatalogError> {
        CatalogDocument::from_yaml_str(text)?.into_catalog()
    }

    /// Load catalog from a `.json`, `.yaml` or `.yml` file
    ///
    /// # Errors
    /// Returns error on I/O, unknown extension, parse or validation failure
    pub fn from_path(path: impl AsRef<Path>) -> Result<Self, CatalogError> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| CatalogError::Io {
            path: path.to_path_buf(),
            source,
        })?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            other => Err(CatalogError::UnsupportedFormat(
                other.unwrap_or("<none>").to_string(),
            )),
        }
    }
}

fn unique_ids<'a>(
    ids: impl Iterator<Item = &'a str>,
    kind: &'static str,
) -> Result<HashSet<&'a str>, CatalogError> {
    let mut seen = HashSet::new();
    for id in ids {
        if !seen.insert(id) {
            return Err(CatalogError::DuplicateNode {
                kind,
                id: id.to_string(),
            });
        }
    }
    Ok(seen)
}

fn ensure_known(
    known: &HashSet<&str>,
    target: &str,
    kind: &'static str,
    from: impl FnOnce() -> String,
) -> Result<(), CatalogError> {
    if known.contains(target) {
        Ok(())
    } else {
        Err(CatalogError::UnknownReference {
            from: from(),
            kind,
            target: target.to_string(),
        })
    }
}
