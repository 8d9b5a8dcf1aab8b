//! Derived system status

use respec_conflict::ConflictPriority;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};

/// Snapshot of the engine state; derived on demand, never stored
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct SystemStatus {
    /// True iff at least one conflict is active
    pub blocked: bool,

    /// Tier of the conflict that would be surfaced next
    pub current_priority: Option<ConflictPriority>,

    /// Open conflicts
    pub active_count: usize,
    /// Closed conflicts
    pub resolved_count: usize,
    /// Specifications in candidate
    pub candidate_count: usize,
    /// Specifications in canonical
    pub canonical_count: usize,
    /// Promotion passes recorded
    pub movement_count: usize,
}

impl Display for SystemStatus {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let state = if self.blocked { "blocked" } else { "clear" };
        write!(
            f,
            "{state}: {} active, {} resolved, {} candidate, {} canonical, {} movements",
            self.active_count,
            self.resolved_count,
            self.candidate_count,
            self.canonical_count,
            self.movement_count
        )?;
        if let Some(priority) = self.current_priority {
            write!(f, " (next: {priority})")?;
        }
        Ok(())
    }
}
