//! Active and resolved conflict bookkeeping
//!
//! The queue surfaces one conflict at a time: the highest priority tier,
//! earliest detected within a tier.

use crate::conflict::{Conflict, ConflictId, ResolvedBy, ResolvedConflict, Side};
use chrono::Utc;
use respec_knowledge::SpecId;
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

/// Priority-ordered active list plus append-only resolved history
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ConflictQueue {
    active: Vec<Conflict>,
    resolved: Vec<ResolvedConflict>,
}

impl ConflictQueue {
    /// Create empty queue
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Rebuild from persisted lists
    #[must_use]
    pub fn from_parts(active: Vec<Conflict>, resolved: Vec<ResolvedConflict>) -> Self {
        Self { active, resolved }
    }

    /// Queue a conflict unless one with the same member set is active
    ///
    /// Returns `true` when queued.
    pub fn push(&mut self, conflict: Conflict) -> bool {
        let key = conflict.key();
        if self.active.iter().any(|active| active.key() == key) {
            tracing::debug!(key = %key, "conflict already active");
            return false;
        }
        tracing::info!(
            conflict_id = %conflict.id,
            key = %key,
            priority = %conflict.priority(),
            "conflict queued"
        );
        self.active.push(conflict);
        true
    }

    /// Conflict to surface next
    ///
    /// Highest priority wins; ties go to the earliest detection, then to
    /// queue order.
    #[must_use]
    pub fn current(&self) -> Option<&Conflict> {
        let mut best: Option<&Conflict> = None;
        for conflict in &self.active {
            best = match best {
                None => Some(conflict),
                Some(current)
                    if conflict.priority() > current.priority()
                        || (conflict.priority() == current.priority()
                            && conflict.first_detected < current.first_detected) =>
                {
                    Some(conflict)
                }
                keep => keep,
            };
        }
        best
    }

    /// Active conflict by id
    #[must_use]
    pub fn get(&self, id: ConflictId) -> Option<&Conflict> {
        self.active.iter().find(|conflict| conflict.id == id)
    }

    /// Active conflicts in queue order
    #[inline]
    #[must_use]
    pub fn active(&self) -> &[Conflict] {
        &self.active
    }

    /// Resolved history in resolution order
    #[inline]
    #[must_use]
    pub fn resolved(&self) -> &[ResolvedConflict] {
        &self.resolved
    }

    /// Number of active conflicts
    #[inline]
    #[must_use]
    pub fn active_len(&self) -> usize {
        self.active.len()
    }

    /// Number of resolved conflicts
    #[inline]
    #[must_use]
    pub fn resolved_len(&self) -> usize {
        self.resolved.len()
    }

    /// Blocked while any conflict is active
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        !self.active.is_empty()
    }

    /// Every id referenced by an active conflict
    #[must_use]
    pub fn blocked_ids(&self) -> BTreeSet<SpecId> {
        self.active
            .iter()
            .flat_map(|conflict| conflict.spec_ids().iter().cloned())
            .collect()
    }

    /// Count a failed clarification round; returns the new count
    pub fn record_cycle(&mut self, id: ConflictId) -> Option<u32> {
        self.active
            .iter_mut()
            .find(|conflict| conflict.id == id)
            .map(Conflict::record_cycle)
    }

    /// Move a conflict to history after the user picked a side
    pub fn complete(
        &mut self,
        id: ConflictId,
        side: Side,
        removed_ids: Vec<SpecId>,
    ) -> Option<&ResolvedConflict> {
        self.close(id, Some(side), ResolvedBy::User, removed_ids)
    }

    /// Retire active conflicts that name a specification no longer present
    ///
    /// Such conflicts were settled as a side effect of another resolution.
    /// Returns the retired ids.
    pub fn retire_stale(&mut self, is_present: impl Fn(&SpecId) -> bool) -> Vec<ConflictId> {
        let stale: Vec<(ConflictId, Vec<SpecId>)> = self
            .active
            .iter()
            .filter_map(|conflict| {
                let missing: Vec<SpecId> = conflict
                    .spec_ids()
                    .iter()
                    .filter(|id| !is_present(*id))
                    .cloned()
                    .collect();
                (!missing.is_empty()).then_some((conflict.id, missing))
            })
            .collect();

        stale
            .into_iter()
            .filter_map(|(id, missing)| {
                self.close(id, None, ResolvedBy::System, missing)
                    .map(|resolved| resolved.conflict.id)
            })
            .collect()
    }

    fn close(
        &mut self,
        id: ConflictId,
        user_choice: Option<Side>,
        resolved_by: ResolvedBy,
        removed_ids: Vec<SpecId>,
    ) -> Option<&ResolvedConflict> {
        let idx = self.active.iter().position(|conflict| conflict.id == id)?;
        let mut conflict = self.active.remove(idx);
        let now = Utc::now();
        conflict.last_updated = now;

        tracing::info!(
            conflict_id = %id,
            choice = ?user_choice,
            resolved_by = ?resolved_by,
            remaining = self.active.len(),
            "conflict resolved"
        );

        self.resolved.push(ResolvedConflict {
            conflict,
            resolved_at: now,
            user_choice,
            resolved_by,
            removed_ids,
        });
        self.resolved.last()
    }
}
