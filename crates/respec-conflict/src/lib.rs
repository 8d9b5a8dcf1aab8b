//! respec Conflict Engine
//!
//! Detection, queueing and transactional resolution of exclusion conflicts
//! between candidate and canonical specifications.
//!
//! # Core Concepts
//!
//! - [`ConflictDetector`]: pairwise scan against the knowledge graph
//! - [`Conflict`]: sorted member list, tagged [`ConflictKind`], two options
//! - [`ConflictQueue`]: one-at-a-time surfacing by [`ConflictPriority`]
//! - [`ConflictResolver`]: applies a [`Side`], rolls back on a failed
//!   [`PostCondition`]
//!
//! # Example
//!
//! ```rust
//! use respec_artifact::{ArtifactTree, InsertSource, Specification};
//! use respec_conflict::{ConflictDetector, ConflictResolver, Side};
//! use respec_knowledge::{Catalog, SpecId};
//!
//! let catalog = Catalog::new()
//!     .with_scenario("s", "Scenario")
//!     .with_requirement("r", "Requirement", ["s"])
//!     .with_specification("p1", ["r"])
//!     .with_specification("p2", ["r"])
//!     .with_exclusion(["p1", "p2"]);
//!
//! let mut candidate = ArtifactTree::candidate();
//! let mut canonical = ArtifactTree::canonical();
//! for id in ["p1", "p2"] {
//!     candidate
//!         .insert(Specification::new(id, id, "x"), InsertSource::UserInput, &catalog)
//!         .unwrap();
//! }
//!
//! let conflicts = ConflictDetector::new().detect(&candidate, &canonical, &catalog);
//! assert_eq!(conflicts.len(), 1);
//!
//! ConflictResolver::new()
//!     .resolve(&conflicts[0], Side::A, &mut candidate, &mut canonical)
//!     .unwrap();
//! assert!(!candidate.contains(&SpecId::from("p2")));
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

mod conflict;
mod detector;
mod queue;
mod resolver;

// Re-exports
pub use conflict::{
    Conflict, ConflictId, ConflictKind, ConflictPriority, ConflictPrompt, PromptOption,
    ResolutionOption, ResolvedBy, ResolvedConflict, Side, SideChoice,
};
pub use detector::ConflictDetector;
pub use queue::ConflictQueue;
pub use resolver::{
    ConflictResolver, PostCondition, RemovedSpec, ResolutionError, ResolutionReport,
    StrictPostCondition,
};

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
