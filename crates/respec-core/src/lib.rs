//! respec Core - Artifact Manager
//!
//! The orchestrator that:
//! - Inserts extracted choices into the candidate tree
//! - Detects and queues exclusion conflicts
//! - Surfaces one binary question at a time
//! - Applies the user's choice transactionally
//! - Promotes clean choices into the canonical tree
//!
//! # Example
//!
//! ```rust
//! use respec_artifact::InsertSource;
//! use respec_core::{ArtifactManager, SpecificationInput};
//! use respec_conflict::Side;
//! use respec_knowledge::{Catalog, SpecId};
//! use std::sync::Arc;
//!
//! # fn main() -> Result<(), respec_core::ManagerError> {
//! let catalog = Arc::new(
//!     Catalog::new()
//!         .with_scenario("s", "Scenario")
//!         .with_requirement("r", "Requirement", ["s"])
//!         .with_specification("p1", ["r"])
//!         .with_specification("p2", ["r"])
//!         .with_exclusion(["p1", "p2"]),
//! );
//! let mut manager = ArtifactManager::new(catalog);
//!
//! manager.add_specification(SpecificationInput::new("p1", "x"), InsertSource::UserInput)?;
//! let conflicts =
//!     manager.add_specification(SpecificationInput::new("p2", "y"), InsertSource::UserInput)?;
//! assert!(manager.status().blocked);
//!
//! manager.resolve_conflict(conflicts[0].id, Side::A)?;
//! assert!(!manager.status().blocked);
//! assert!(manager.canonical().contains(&SpecId::from("p1")));
//! # Ok(())
//! # }
//! ```

#![warn(unreachable_pub)]
#![warn(missing_docs)]

// Core modules
pub mod config;
pub mod dialogue;
pub mod error;
pub mod manager;
pub mod promoter;
pub mod shared;
pub mod snapshot;
pub mod status;

// Re-exports for convenience
pub use config::EngineConfig;
pub use dialogue::{AgentError, ConversationAgent, DialogueError, DialogueSession, TurnOutcome};
pub use error::{ConfigError, ManagerError};
pub use manager::{ArtifactManager, ResolutionOutcome, SpecificationInput};
pub use promoter::{Movement, MovementId, MovementTrigger, Promoter};
pub use shared::SharedArtifactManager;
pub use snapshot::ArtifactSnapshot;
pub use status::SystemStatus;

/// Prelude module for common imports
pub mod prelude {
    //! Common imports for working with respec Core
    pub use crate::{
        ArtifactManager, ConversationAgent, DialogueSession, EngineConfig, ManagerError,
        SharedArtifactManager, SpecificationInput, SystemStatus,
    };
    pub use respec_artifact::{Attribution, InsertSource};
    pub use respec_conflict::{ConflictPrompt, Side, SideChoice};
    pub use respec_knowledge::{Catalog, KnowledgeGraph, SpecId};
}

/// Version of this crate
pub const VERSION: &str = env!("CARGO_PKG_VERSION");
