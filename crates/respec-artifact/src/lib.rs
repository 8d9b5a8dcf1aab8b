//! respec Artifact Trees
//!
//! Candidate and canonical Scenario → Requirement → Specification trees.
//!
//! # Core Concepts
//!
//! - [`Specification`]: one resolved `(field, value)` choice
//! - [`ArtifactTree`]: hierarchical container, placed via a
//!   [`KnowledgeGraph`](respec_knowledge::KnowledgeGraph)
//! - [`TreeKind`]: candidate ("mapped", unvalidated) or canonical ("respec")
//! - [`InsertSource`]: why a choice is inserted; decides whether it is queued
//!   for conflict detection
//!
//! # Example
//!
//! ```rust
//! use respec_artifact::{ArtifactTree, InsertSource, Specification};
//! use respec_knowledge::{Catalog, SpecId};
//!
//! let catalog = Catalog::new()
//!     .with_scenario("office", "Office deployment")
//!     .with_requirement("cooling", "Cooling", ["office"])
//!     .with_specification("fanless", ["cooling"]);
//!
//! let mut candidate = ArtifactTree::candidate();
//! candidate
//!     .insert(Specification::new("fanless", "Fanless", true), InsertSource::UserInput, &catalog)
//!     .unwrap();
//!
//! assert!(candidate.contains(&SpecId::from("fanless")));
//! assert_eq!(candidate.pending_validation().len(), 1);
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod error;
mod specification;
mod tree;

// Re-exports
pub use error::{HierarchyError, HierarchyLevel};
pub use specification::{Attribution, InsertSource, Specification};
pub use tree::{ArtifactTree, Requirement, Scenario, TreeKind, TreeMetadata};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
