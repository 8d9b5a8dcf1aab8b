//! respec Knowledge Graph
//!
//! Read-only catalog of the configurable product: a Scenario → Requirement →
//! Specification hierarchy, a table of mutual-exclusion groups, dependency
//! edges and field display metadata.
//!
//! # Overview
//!
//! - [`KnowledgeGraph`]: query surface consumed by the artifact engine
//! - [`Catalog`]: in-memory implementation
//! - [`CatalogDocument`]: declarative JSON/YAML form loaded into a [`Catalog`]
//!
//! # Example
//!
//! ```rust
//! use respec_knowledge::{Catalog, KnowledgeGraph, SpecId};
//!
//! let catalog = Catalog::new()
//!     .with_scenario("office", "Office deployment")
//!     .with_requirement("cooling", "Cooling", ["office"])
//!     .with_specification("fanless", ["cooling"])
//!     .with_specification("active_fan", ["cooling"])
//!     .with_exclusion(["fanless", "active_fan"]);
//!
//! let fanless = SpecId::from("fanless");
//! assert!(catalog.excludes(&fanless, &SpecId::from("active_fan")));
//! assert_eq!(catalog.parent_requirements(&fanless)[0].id.as_str(), "cooling");
//! ```

#![warn(missing_docs)]

mod catalog;
mod graph;
mod id;
mod loader;

// Re-exports
pub use catalog::Catalog;
pub use graph::{
    ExclusionEntry, FieldMeta, KnowledgeGraph, QuestionTemplate, RequirementMeta,
    RequirementRef, ScenarioMeta, ScenarioRef,
};
pub use id::{RequirementId, ScenarioId, SpecId};
pub use loader::{
    CatalogDocument, CatalogError, ExclusionDoc, QuestionDoc, RequirementDoc, ScenarioDoc,
    SpecificationDoc,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
