//! Mutex-guarded manager handle
//!
//! Every call takes the lock, runs one manager operation to completion and
//! releases it. The guard never escapes, so it is never held across an
//! `.await` by callers.

use crate::error::ManagerError;
use crate::manager::{ArtifactManager, ResolutionOutcome, SpecificationInput};
use crate::snapshot::ArtifactSnapshot;
use crate::status::SystemStatus;
use parking_lot::Mutex;
use respec_artifact::InsertSource;
use crate::promoter::Movement;
use respec_conflict::{Conflict, ConflictId, ConflictKind, ConflictPrompt, Side};
use respec_knowledge::{KnowledgeGraph, SpecId};
use std::sync::Arc;

/// Cloneable handle to one [`ArtifactManager`]
#[derive(Debug)]
pub struct SharedArtifactManager<G: KnowledgeGraph + ?Sized> {
    inner: Arc<Mutex<ArtifactManager<G>>>,
}

impl<G: KnowledgeGraph + ?Sized> Clone for SharedArtifactManager<G> {
    fn clone(&self) -> Self {
        Self {
            inner: Arc::clone(&self.inner),
        }
    }
}

impl<G: KnowledgeGraph + ?Sized> SharedArtifactManager<G> {
    /// Wrap a manager
    #[must_use]
    pub fn new(manager: ArtifactManager<G>) -> Self {
        Self {
            inner: Arc::new(Mutex::new(manager)),
        }
    }

    /// Run a closure with exclusive access
    pub fn with_manager<R>(&self, f: impl FnOnce(&mut ArtifactManager<G>) -> R) -> R {
        let mut guard = self.inner.lock();
        f(&mut guard)
    }

    /// See [`ArtifactManager::add_specification`]
    ///
    /// # Errors
    /// Same as the wrapped call.
    pub fn add_specification(
        &self,
        input: SpecificationInput,
        source: InsertSource,
    ) -> Result<Vec<Conflict>, ManagerError> {
        self.inner.lock().add_specification(input, source)
    }

    /// See [`ArtifactManager::active_conflicts`]
    #[must_use]
    pub fn active_conflicts(&self) -> Vec<ConflictPrompt> {
        self.inner.lock().active_conflicts()
    }

    /// Prompt for the conflict to ask about next
    #[must_use]
    pub fn current_prompt(&self) -> Option<ConflictPrompt> {
        self.inner.lock().current_conflict().map(Conflict::prompt)
    }

    /// See [`ArtifactManager::resolve_conflict`]
    ///
    /// # Errors
    /// Same as the wrapped call.
    pub fn resolve_conflict(
        &self,
        id: ConflictId,
        side: Side,
    ) -> Result<ResolutionOutcome, ManagerError> {
        self.inner.lock().resolve_conflict(id, side)
    }

    /// See [`ArtifactManager::resolve_conflict_option`]
    ///
    /// # Errors
    /// Same as the wrapped call.
    pub fn resolve_conflict_option(
        &self,
        id: ConflictId,
        option: &str,
    ) -> Result<ResolutionOutcome, ManagerError> {
        self.inner.lock().resolve_conflict_option(id, option)
    }

    /// See [`ArtifactManager::raise_conflict`]
    ///
    /// # Errors
    /// Same as the wrapped call.
    pub fn raise_conflict(
        &self,
        kind: ConflictKind,
        spec_ids: impl IntoIterator<Item = SpecId>,
        description: impl Into<String>,
    ) -> Result<Conflict, ManagerError> {
        self.inner.lock().raise_conflict(kind, spec_ids, description)
    }

    /// See [`ArtifactManager::promote`]
    pub fn promote(&self) -> Movement {
        self.inner.lock().promote()
    }

    /// See [`ArtifactManager::record_unclear_reply`]
    ///
    /// # Errors
    /// Same as the wrapped call.
    pub fn record_unclear_reply(&self, id: ConflictId) -> Result<u32, ManagerError> {
        self.inner.lock().record_unclear_reply(id)
    }

    /// See [`ArtifactManager::needs_escalation`]
    #[must_use]
    pub fn needs_escalation(&self, id: ConflictId) -> bool {
        self.inner.lock().needs_escalation(id)
    }

    /// See [`ArtifactManager::status`]
    #[must_use]
    pub fn status(&self) -> SystemStatus {
        self.inner.lock().status()
    }

    /// See [`ArtifactManager::snapshot`]
    #[must_use]
    pub fn snapshot(&self) -> ArtifactSnapshot {
        self.inner.lock().snapshot()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EngineConfig;
    use respec_conflict::ConflictPriority;
    use respec_knowledge::Catalog;
    use std::thread;

    fn catalog() -> Arc<Catalog> {
        Arc::new(
            Catalog::new()
                .with_scenario("s", "S")
                .with_requirement("r", "R", ["s"])
                .with_specification("a", ["r"])
                .with_specification("b", ["r"])
                .with_specification("c", ["r"])
                .with_specification("d", ["r"])
                .with_specification("e", ["r"])
                .with_exclusion(["a", "e"]),
        )
    }

    fn add(shared: &SharedArtifactManager<Catalog>, id: &str) -> Vec<Conflict> {
        shared
            .add_specification(SpecificationInput::new(id, 1), InsertSource::UserInput)
            .unwrap()
    }

    #[test]
    fn clones_share_state() {
        let shared = SharedArtifactManager::new(ArtifactManager::new(catalog()));
        let other = shared.clone();
        add(&shared, "a");
        assert_eq!(other.status().candidate_count, 1);

        let movement = other.promote();
        assert_eq!(movement.spec_ids, vec![SpecId::from("a")]);
        assert_eq!(shared.status().canonical_count, 1);
    }

    #[test]
    fn option_ids_resolve_through_handle() {
        let shared = SharedArtifactManager::new(ArtifactManager::new(catalog()));
        add(&shared, "a");
        let id = add(&shared, "e")[0].id;

        let err = shared.resolve_conflict_option(id, "option-z").unwrap_err();
        assert!(err.is_retryable());
        assert!(shared.status().blocked);

        let outcome = shared.resolve_conflict_option(id, "option-b").unwrap();
        assert_eq!(outcome.report.winner, SpecId::from("e"));
        assert!(!shared.status().blocked);
        assert!(shared.with_manager(|m| m.canonical().contains(&SpecId::from("e"))));
    }

    #[test]
    fn raised_conflict_blocks_every_clone() {
        let shared = SharedArtifactManager::new(ArtifactManager::new(catalog()));
        let other = shared.clone();
        add(&shared, "c");
        add(&shared, "d");

        let raised = other
            .raise_conflict(
                ConflictKind::FieldExhausted {
                    field: SpecId::from("c"),
                },
                [SpecId::from("c"), SpecId::from("d")],
                "no slot left for d",
            )
            .unwrap();

        let status = shared.status();
        assert!(status.blocked);
        assert_eq!(status.current_priority, Some(ConflictPriority::Logical));
        assert_eq!(shared.current_prompt().map(|p| p.conflict_id), Some(raised.id));
    }

    #[test]
    fn concurrent_adds_serialize() {
        let shared = SharedArtifactManager::new(ArtifactManager::with_config(
            catalog(),
            EngineConfig::new().with_promote_on_add(true),
        ));
        let handles: Vec<_> = ["a", "b", "c", "d"]
            .into_iter()
            .map(|id| {
                let handle = shared.clone();
                thread::spawn(move || {
                    handle
                        .add_specification(SpecificationInput::new(id, 1), InsertSource::UserInput)
                        .unwrap();
                })
            })
            .collect();
        for handle in handles {
            handle.join().unwrap();
        }

        let status = shared.status();
        assert_eq!(status.canonical_count, 4);
        assert_eq!(status.movement_count, 4);
        assert_eq!(shared.with_manager(|m| m.candidate().len()), 0);
    }
}
