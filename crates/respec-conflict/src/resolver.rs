//! Transactional conflict resolution
//!
//! Applying a side removes the losing specifications from both trees, checks
//! the post-condition and, on failure, swaps the pre-transaction trees back.
//! Trees are persistent maps, so the snapshot is a structural-sharing clone
//! and the rollback is an assignment.

use crate::conflict::{Conflict, ConflictId, Side};
use respec_artifact::{ArtifactTree, Specification, TreeKind};
use respec_knowledge::SpecId;
use serde::{Deserialize, Serialize};
use std::fmt::Debug;

/// Resolution errors
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ResolutionError {
    /// No active conflict with this id
    #[error("conflict not found: {0}")]
    ConflictNotFound(ConflictId),

    /// Option id is neither A nor B
    #[error("conflict {conflict} has no option '{option}'")]
    OptionNotFound {
        /// Conflict the option was given for
        conflict: ConflictId,
        /// Option id as received
        option: String,
    },

    /// Post-condition failed; both trees were restored
    #[error("integrity violation while resolving {conflict}: {detail}")]
    IntegrityViolation {
        /// Conflict being resolved
        conflict: ConflictId,
        /// Failed check
        detail: String,
    },
}

impl ResolutionError {
    /// Check if the caller referenced a stale or invalid id
    #[inline]
    #[must_use]
    pub fn is_request_error(&self) -> bool {
        matches!(self, Self::ConflictNotFound(_) | Self::OptionNotFound { .. })
    }
}

/// Check run after removal, before the transaction commits
pub trait PostCondition: Send + Sync + Debug {
    /// Verify the trees after losers were removed
    ///
    /// # Errors
    /// A human-readable detail string; the resolver turns it into
    /// [`ResolutionError::IntegrityViolation`] and rolls back.
    fn check(
        &self,
        winner: &SpecId,
        losers: &[SpecId],
        candidate: &ArtifactTree,
        canonical: &ArtifactTree,
    ) -> Result<(), String>;
}

/// Losers absent from both trees, winner present in one of them
#[derive(Debug, Clone, Copy, Default)]
pub struct StrictPostCondition;

impl PostCondition for StrictPostCondition {
    fn check(
        &self,
        winner: &SpecId,
        losers: &[SpecId],
        candidate: &ArtifactTree,
        canonical: &ArtifactTree,
    ) -> Result<(), String> {
        if let Some(loser) = losers
            .iter()
            .find(|id| candidate.contains(id) || canonical.contains(id))
        {
            return Err(format!("losing specification '{loser}' still present"));
        }
        if !candidate.contains(winner) && !canonical.contains(winner) {
            return Err(format!("winning specification '{winner}' is missing"));
        }
        Ok(())
    }
}

/// Specification removed by a resolution, with the tree it came from
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RemovedSpec {
    /// Tree the specification was removed from
    pub tree: TreeKind,
    /// Removed value, kept for rollback
    pub spec: Specification,
}

/// Outcome of a committed resolution
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionReport {
    /// Resolved conflict
    pub conflict_id: ConflictId,
    /// Side the user picked
    pub side: Side,
    /// Specification that was kept
    pub winner: SpecId,

    /// Journal of removed specifications, in loser order
    pub removed: Vec<RemovedSpec>,
}

impl ResolutionReport {
    /// Ids actually removed
    #[must_use]
    pub fn removed_ids(&self) -> Vec<SpecId> {
        self.removed.iter().map(|entry| entry.spec.id.clone()).collect()
    }
}

/// Applies binary choices to conflicts
#[derive(Debug)]
pub struct ConflictResolver {
    post_condition: Box<dyn PostCondition>,
}

impl Default for ConflictResolver {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictResolver {
    /// Create resolver with the strict post-condition
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            post_condition: Box::new(StrictPostCondition),
        }
    }

    /// With a custom post-condition
    #[must_use]
    pub fn with_post_condition(mut self, post_condition: impl PostCondition + 'static) -> Self {
        self.post_condition = Box::new(post_condition);
        self
    }

    /// Apply `side` to `conflict`
    ///
    /// Absent losers are skipped. Either every loser is gone and the winner
    /// remains, or both trees are exactly as before the call.
    ///
    /// # Errors
    /// [`ResolutionError::IntegrityViolation`] when the post-condition fails;
    /// the trees have been restored when it is returned.
    pub fn resolve(
        &self,
        conflict: &Conflict,
        side: Side,
        candidate: &mut ArtifactTree,
        canonical: &mut ArtifactTree,
    ) -> Result<ResolutionReport, ResolutionError> {
        let (winner, losers) = conflict.partition(side);
        let snapshot = (candidate.clone(), canonical.clone());

        let mut removed = Vec::with_capacity(losers.len());
        for loser in &losers {
            if let Some(spec) = candidate.remove(loser) {
                removed.push(RemovedSpec {
                    tree: TreeKind::Candidate,
                    spec,
                });
            }
            if let Some(spec) = canonical.remove(loser) {
                removed.push(RemovedSpec {
                    tree: TreeKind::Canonical,
                    spec,
                });
            }
        }

        if let Err(detail) = self
            .post_condition
            .check(&winner, &losers, candidate, canonical)
        {
            (*candidate, *canonical) = snapshot;
            tracing::error!(conflict_id = %conflict.id, %detail, "post-condition failed");
            tracing::warn!(
                conflict_id = %conflict.id,
                restored = removed.len(),
                "resolution rolled back"
            );
            return Err(ResolutionError::IntegrityViolation {
                conflict: conflict.id,
                detail,
            });
        }

        tracing::info!(
            conflict_id = %conflict.id,
            side = %side,
            winner = %winner,
            removed = removed.len(),
            "resolution applied"
        );

        Ok(ResolutionReport {
            conflict_id: conflict.id,
            side,
            winner,
            removed,
        })
    }
}
