//! Serializable engine state
//!
//! A plain serde mirror of the data model. The knowledge graph and the
//! configuration are not part of it; they are supplied again on restore.

use crate::error::ManagerError;
use crate::promoter::Movement;
use respec_artifact::ArtifactTree;
use respec_conflict::{Conflict, ResolvedConflict};
use serde::{Deserialize, Serialize};

/// Persisted trees, conflicts and movements
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ArtifactSnapshot {
    /// Crate version that wrote the snapshot
    pub version: String,

    /// Unconfirmed choices
    pub candidate: ArtifactTree,
    /// Confirmed choices
    pub canonical: ArtifactTree,

    /// Open conflicts in queue order
    #[serde(default)]
    pub active_conflicts: Vec<Conflict>,

    /// Closed conflicts, oldest first
    #[serde(default)]
    pub resolved_conflicts: Vec<ResolvedConflict>,

    /// Append-only promotion log
    #[serde(default)]
    pub movements: Vec<Movement>,
}

impl ArtifactSnapshot {
    /// Encode as pretty JSON
    ///
    /// # Errors
    /// Serialization failure (non-finite numbers inside values).
    pub fn to_json(&self) -> Result<String, ManagerError> {
        Ok(serde_json::to_string_pretty(self)?)
    }

    /// Decode from JSON
    ///
    /// # Errors
    /// Malformed or incompatible input.
    pub fn from_json(input: &str) -> Result<Self, ManagerError> {
        Ok(serde_json::from_str(input)?)
    }
}
