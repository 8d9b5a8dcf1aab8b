//! Error types for artifact trees

use std::fmt::{self, Display, Formatter};

/// Hierarchy level whose parent lookup failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum HierarchyLevel {
    /// Specification → Requirement
    Requirement,

    /// Requirement → Scenario
    Scenario,
}

impl Display for HierarchyLevel {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        match self {
            Self::Requirement => f.write_str("requirement"),
            Self::Scenario => f.write_str("scenario"),
        }
    }
}

/// Knowledge graph ancestry errors
///
/// Always a data-integrity failure in the catalog; the insert that hit it
/// is abandoned without touching the tree.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum HierarchyError {
    /// No parent node registered for `node`
    #[error("knowledge graph has no parent {level} for '{node}'")]
    NoParent {
        /// Node whose parent is missing
        node: String,
        /// Level that could not be resolved
        level: HierarchyLevel,
    },
}

impl HierarchyError {
    /// Id of the node whose parent is missing
    #[inline]
    #[must_use]
    pub fn node(&self) -> &str {
        match self {
            Self::NoParent { node, .. } => node,
        }
    }
}
