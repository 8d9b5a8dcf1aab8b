//! Error types for respec Core
//!
//! Provides error handling for:
//! - Knowledge graph ancestry failures (fatal)
//! - Resolution request and integrity errors (state unchanged)
//! - Caller-raised conflicts that are malformed
//! - Snapshot and configuration I/O

use respec_artifact::HierarchyError;
use respec_conflict::ResolutionError;
use std::path::PathBuf;

/// Main manager error type
#[derive(Debug, thiserror::Error)]
pub enum ManagerError {
    /// Knowledge graph has no ancestry for a specification
    #[error("hierarchy error: {0}")]
    Hierarchy(#[from] HierarchyError),

    /// Resolution could not be applied
    #[error("resolution failed: {0}")]
    Resolution(#[from] ResolutionError),

    /// Caller-raised conflict is malformed
    #[error("invalid conflict: {0}")]
    InvalidConflict(String),

    /// Snapshot could not be encoded or decoded
    #[error("snapshot error: {0}")]
    Snapshot(#[from] serde_json::Error),
}

impl ManagerError {
    /// Check if error indicates broken catalog or persisted data
    #[inline]
    #[must_use]
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Hierarchy(_) | Self::Snapshot(_))
    }

    /// Check if the user can simply be asked again
    #[inline]
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Resolution(_) | Self::InvalidConflict(_))
    }

    /// Conversational wording for the surrounding layer
    #[must_use]
    pub fn user_message(&self) -> String {
        match self {
            Self::Hierarchy(err) => format!(
                "I can't place '{}' in the product catalog. Please choose a different option.",
                err.node()
            ),
            Self::Resolution(ResolutionError::ConflictNotFound(_)) => {
                "That question has already been settled. Let's continue.".to_string()
            }
            Self::Resolution(ResolutionError::OptionNotFound { .. }) => {
                "Please answer with one of the two options.".to_string()
            }
            Self::Resolution(ResolutionError::IntegrityViolation { .. }) => {
                "I couldn't apply that choice; nothing was changed. Could you confirm it again?"
                    .to_string()
            }
            Self::InvalidConflict(_) => {
                "Something went wrong while checking your choices. Please try again.".to_string()
            }
            Self::Snapshot(_) => "The saved session could not be restored.".to_string(),
        }
    }
}

/// Configuration loading errors
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// TOML syntax or schema error
    #[error("invalid configuration: {0}")]
    Toml(#[from] toml::de::Error),

    /// File could not be read
    #[error("cannot read {path}: {source}")]
    Io {
        /// File that was read
        path: PathBuf,
        /// Underlying failure
        #[source]
        source: std::io::Error,
    },

    /// Value outside its allowed range
    #[error("invalid value for {field}: {reason}")]
    InvalidValue {
        /// Offending field
        field: &'static str,
        /// Why it was rejected
        reason: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use respec_artifact::HierarchyLevel;
    use respec_conflict::ConflictId;

    #[test]
    fn hierarchy_is_fatal() {
        let err = ManagerError::from(HierarchyError::NoParent {
            node: "psu".to_string(),
            level: HierarchyLevel::Requirement,
        });
        assert!(err.is_fatal());
        assert!(!err.is_retryable());
        assert!(err.user_message().contains("psu"));
    }

    #[test]
    fn resolution_is_retryable() {
        let err = ManagerError::from(ResolutionError::ConflictNotFound(ConflictId::new()));
        assert!(err.is_retryable());
        assert!(!err.is_fatal());
        assert!(err.to_string().starts_with("resolution failed"));
    }

    #[test]
    fn integrity_message_says_unchanged() {
        let err = ManagerError::from(ResolutionError::IntegrityViolation {
            conflict: ConflictId::new(),
            detail: "x".to_string(),
        });
        assert!(err.user_message().contains("nothing was changed"));
    }
}
