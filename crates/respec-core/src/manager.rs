//! Artifact manager
//!
//! Owns both trees, the conflict queue and the movement log, and exposes the
//! contract used by the conversation layer:
//! - add a specification (insert, detect, queue, optionally promote)
//! - surface the single highest-priority conflict
//! - resolve it with a binary choice (resolve, retire stale, promote)
//! - track unclear replies for escalation

use crate::config::EngineConfig;
use crate::error::ManagerError;
use crate::promoter::{Movement, MovementTrigger, Promoter};
use crate::snapshot::ArtifactSnapshot;
use crate::status::SystemStatus;
use respec_artifact::{ArtifactTree, Attribution, InsertSource, Specification};
use respec_conflict::{
    Conflict, ConflictDetector, ConflictId, ConflictKind, ConflictPrompt, ConflictQueue,
    ConflictResolver, PostCondition, ResolutionError, ResolutionReport, ResolvedConflict, Side,
};
use respec_knowledge::{KnowledgeGraph, SpecId};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

/// One `(field, value)` datum from the conversation layer
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SpecificationInput {
    /// Catalog id of the specification
    pub field: SpecId,
    /// Chosen value
    pub value: serde_json::Value,

    /// Who made the choice
    #[serde(default = "default_attribution")]
    pub attribution: Attribution,

    /// Falls back to [`EngineConfig::default_confidence`]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub confidence: Option<f64>,

    /// What the user asked for before substitution
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<String>,

    /// Why the requested value was substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_note: Option<String>,
}

fn default_attribution() -> Attribution {
    Attribution::UserStated
}

impl SpecificationInput {
    /// User-stated value
    #[must_use]
    pub fn new(field: impl Into<SpecId>, value: impl Into<serde_json::Value>) -> Self {
        Self {
            field: field.into(),
            value: value.into(),
            attribution: Attribution::UserStated,
            confidence: None,
            original_request: None,
            substitution_note: None,
        }
    }

    /// Mark as inferred with the given confidence
    #[inline]
    #[must_use]
    pub fn inferred(mut self, confidence: f64) -> Self {
        self.attribution = Attribution::Inferred;
        self.confidence = Some(confidence);
        self
    }

    /// With substitution details
    #[inline]
    #[must_use]
    pub fn with_substitution(
        mut self,
        original_request: impl Into<String>,
        note: impl Into<String>,
    ) -> Self {
        self.original_request = Some(original_request.into());
        self.substitution_note = Some(note.into());
        self
    }
}

/// Everything a committed resolution changed
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolutionOutcome {
    /// What the resolver removed
    pub report: ResolutionReport,

    /// Conflicts closed because a member disappeared
    pub retired: Vec<ConflictId>,

    /// Conflicts found among the survivors of retired ones
    pub detected: Vec<Conflict>,

    /// Promotion run after the resolution
    pub movement: Movement,
    /// Status after everything above
    pub status: SystemStatus,
}

/// Orchestrator over candidate/canonical trees
///
/// Single-writer: every operation takes `&mut self` and runs to completion.
/// Wrap in [`SharedArtifactManager`](crate::SharedArtifactManager) to share
/// across handlers.
#[derive(Debug)]
pub struct ArtifactManager<G: KnowledgeGraph + ?Sized> {
    graph: Arc<G>,
    config: EngineConfig,
    candidate: ArtifactTree,
    canonical: ArtifactTree,
    queue: ConflictQueue,
    movements: Vec<Movement>,
    detector: ConflictDetector,
    resolver: ConflictResolver,
    promoter: Promoter,
}

impl<G: KnowledgeGraph + ?Sized> ArtifactManager<G> {
    /// Create manager with default configuration
    #[must_use]
    pub fn new(graph: Arc<G>) -> Self {
        Self::with_config(graph, EngineConfig::default())
    }

    /// Create manager with configuration
    #[must_use]
    pub fn with_config(graph: Arc<G>, config: EngineConfig) -> Self {
        let detector = ConflictDetector::new().with_dependency_cascades(config.dependency_cascades);
        Self {
            graph,
            config,
            candidate: ArtifactTree::candidate(),
            canonical: ArtifactTree::canonical(),
            queue: ConflictQueue::new(),
            movements: Vec::new(),
            detector,
            resolver: ConflictResolver::new(),
            promoter: Promoter,
        }
    }

    /// Restore from a snapshot
    #[must_use]
    pub fn from_snapshot(graph: Arc<G>, config: EngineConfig, snapshot: ArtifactSnapshot) -> Self {
        let mut manager = Self::with_config(graph, config);
        manager.candidate = snapshot.candidate;
        manager.canonical = snapshot.canonical;
        manager.queue = ConflictQueue::from_parts(snapshot.active_conflicts, snapshot.resolved_conflicts);
        manager.movements = snapshot.movements;
        tracing::info!(status = %manager.status(), "artifact manager restored");
        manager
    }

    /// With a custom resolution post-condition
    #[must_use]
    pub fn with_post_condition(mut self, post_condition: impl PostCondition + 'static) -> Self {
        self.resolver = ConflictResolver::new().with_post_condition(post_condition);
        self
    }

    /// Add a specification to the candidate tree
    ///
    /// Runs detection when the candidate has ids awaiting validation
    /// (conflict-resolution inserts do not), queues new conflicts, then
    /// promotes unblocked candidates when configured to. An id currently in
    /// canonical is superseded by the new candidate value.
    ///
    /// # Errors
    /// [`ManagerError::Hierarchy`] when the catalog cannot place the field;
    /// nothing is changed in that case.
    pub fn add_specification(
        &mut self,
        input: SpecificationInput,
        source: InsertSource,
    ) -> Result<Vec<Conflict>, ManagerError> {
        let spec = self.build_specification(input);
        let id = spec.id.clone();

        self.candidate.insert(spec, source, self.graph.as_ref())?;
        if self.canonical.remove(&id).is_some() {
            tracing::debug!(spec_id = %id, "canonical value superseded by new candidate");
        }
        tracing::debug!(spec_id = %id, source = ?source, "specification added");

        let mut queued = Vec::new();
        if !self.candidate.pending_validation().is_empty() {
            let detected = self
                .detector
                .detect(&self.candidate, &self.canonical, self.graph.as_ref());
            self.candidate.take_pending();

            for conflict in detected {
                if self.queue.push(conflict.clone()) {
                    queued.push(conflict);
                }
            }
        }

        if self.config.promote_on_add {
            self.promote_with(MovementTrigger::SpecificationAdded);
        }

        if self.queue.is_blocked() {
            tracing::info!(
                new = queued.len(),
                active = self.queue.active_len(),
                "system blocked on conflicts"
            );
        }
        Ok(queued)
    }

    fn build_specification(&self, input: SpecificationInput) -> Specification {
        let name = self.graph.label_of(&input.field);
        let confidence = input.confidence.unwrap_or(self.config.default_confidence);
        let mut spec = Specification::new(input.field, name, input.value)
            .with_attribution(input.attribution)
            .with_confidence(confidence);
        spec.original_request = input.original_request;
        spec.substitution_note = input.substitution_note;
        spec
    }

    /// Conflict to ask about next, as a prompt
    ///
    /// Holds at most one entry: the protocol asks one binary question at a
    /// time.
    #[must_use]
    pub fn active_conflicts(&self) -> Vec<ConflictPrompt> {
        self.queue.current().map(Conflict::prompt).into_iter().collect()
    }

    /// Conflict to ask about next
    #[inline]
    #[must_use]
    pub fn current_conflict(&self) -> Option<&Conflict> {
        self.queue.current()
    }

    /// Every active conflict in queue order
    #[inline]
    #[must_use]
    pub fn all_active_conflicts(&self) -> &[Conflict] {
        self.queue.active()
    }

    /// Apply a binary choice
    ///
    /// # Errors
    /// - [`ResolutionError::ConflictNotFound`] for an unknown or resolved id
    /// - [`ResolutionError::IntegrityViolation`] after a rollback; state is
    ///   unchanged
    pub fn resolve_conflict(
        &mut self,
        id: ConflictId,
        side: Side,
    ) -> Result<ResolutionOutcome, ManagerError> {
        let conflict = self
            .queue
            .get(id)
            .cloned()
            .ok_or(ResolutionError::ConflictNotFound(id))?;

        let report = self
            .resolver
            .resolve(&conflict, side, &mut self.candidate, &mut self.canonical)?;

        self.queue.complete(id, side, report.removed_ids());

        let (candidate, canonical) = (&self.candidate, &self.canonical);
        let retired = self
            .queue
            .retire_stale(|spec| candidate.contains(spec) || canonical.contains(spec));

        // A retired group may still hold an exclusive pair among its survivors
        let mut detected = Vec::new();
        if !retired.is_empty() {
            for conflict in self
                .detector
                .detect(&self.candidate, &self.canonical, self.graph.as_ref())
            {
                if self.queue.push(conflict.clone()) {
                    detected.push(conflict);
                }
            }
        }

        let movement = self.promote_with(MovementTrigger::ConflictResolved);
        let status = self.status();
        if !status.blocked {
            tracing::info!("system unblocked");
        }

        Ok(ResolutionOutcome {
            report,
            retired,
            detected,
            movement,
            status,
        })
    }

    /// Apply a choice given as an option id (`A`, `B`, `option-a`, `option-b`)
    ///
    /// # Errors
    /// [`ResolutionError::OptionNotFound`] for any other option id, plus
    /// everything [`ArtifactManager::resolve_conflict`] returns.
    pub fn resolve_conflict_option(
        &mut self,
        id: ConflictId,
        option: &str,
    ) -> Result<ResolutionOutcome, ManagerError> {
        if self.queue.get(id).is_none() {
            return Err(ResolutionError::ConflictNotFound(id).into());
        }
        let side = Side::parse(option).ok_or_else(|| ResolutionError::OptionNotFound {
            conflict: id,
            option: option.to_string(),
        })?;
        self.resolve_conflict(id, side)
    }

    /// Count an unclear reply to the conflict's question
    ///
    /// # Errors
    /// [`ResolutionError::ConflictNotFound`] for an unknown or resolved id.
    pub fn record_unclear_reply(&mut self, id: ConflictId) -> Result<u32, ManagerError> {
        let cycles = self
            .queue
            .record_cycle(id)
            .ok_or(ResolutionError::ConflictNotFound(id))?;
        if cycles >= self.config.max_clarification_cycles {
            tracing::warn!(conflict_id = %id, cycles, "conflict needs escalation");
        } else {
            tracing::debug!(conflict_id = %id, cycles, "unclear reply recorded");
        }
        Ok(cycles)
    }

    /// Check if the conflict reached the clarification limit
    #[must_use]
    pub fn needs_escalation(&self, id: ConflictId) -> bool {
        self.queue
            .get(id)
            .is_some_and(|conflict| conflict.cycle_count >= self.config.max_clarification_cycles)
    }

    /// Queue a conflict detected by the caller (e.g. an exhausted field)
    ///
    /// Returns the active conflict for these ids, which is the existing one
    /// when the same member set is already queued.
    ///
    /// # Errors
    /// [`ManagerError::InvalidConflict`] with fewer than two distinct ids or
    /// an id present in neither tree.
    pub fn raise_conflict(
        &mut self,
        kind: ConflictKind,
        spec_ids: impl IntoIterator<Item = SpecId>,
        description: impl Into<String>,
    ) -> Result<Conflict, ManagerError> {
        let conflict = Conflict::new(kind, spec_ids, description).ok_or_else(|| {
            ManagerError::InvalidConflict("at least two distinct specifications required".into())
        })?;

        if let Some(missing) = conflict
            .spec_ids()
            .iter()
            .find(|id| !self.candidate.contains(id) && !self.canonical.contains(id))
        {
            return Err(ManagerError::InvalidConflict(format!(
                "specification '{missing}' is not present"
            )));
        }

        let labels: Vec<String> = conflict
            .spec_ids()
            .iter()
            .map(|id| self.graph.label_of(id))
            .collect();
        let conflict = conflict.with_member_labels(&labels);
        let key = conflict.key();

        if self.queue.push(conflict.clone()) {
            return Ok(conflict);
        }
        self.queue
            .active()
            .iter()
            .find(|active| active.key() == key)
            .cloned()
            .ok_or_else(|| ManagerError::InvalidConflict(format!("conflict '{key}' not queued")))
    }

    /// Promote unblocked candidates now
    pub fn promote(&mut self) -> Movement {
        self.promote_with(MovementTrigger::Manual)
    }

    fn promote_with(&mut self, trigger: MovementTrigger) -> Movement {
        let blocked = self.queue.blocked_ids();
        let movement =
            self.promoter
                .promote_clean(&mut self.candidate, &mut self.canonical, &blocked, trigger);
        self.movements.push(movement.clone());
        movement
    }

    /// Derived status
    #[must_use]
    pub fn status(&self) -> SystemStatus {
        SystemStatus {
            blocked: self.queue.is_blocked(),
            current_priority: self.queue.current().map(Conflict::priority),
            active_count: self.queue.active_len(),
            resolved_count: self.queue.resolved_len(),
            candidate_count: self.candidate.len(),
            canonical_count: self.canonical.len(),
            movement_count: self.movements.len(),
        }
    }

    /// Check if any conflict is active
    #[inline]
    #[must_use]
    pub fn is_blocked(&self) -> bool {
        self.queue.is_blocked()
    }

    /// Candidate ("mapped") tree
    #[inline]
    #[must_use]
    pub fn candidate(&self) -> &ArtifactTree {
        &self.candidate
    }

    /// Canonical ("respec") tree
    #[inline]
    #[must_use]
    pub fn canonical(&self) -> &ArtifactTree {
        &self.canonical
    }

    /// Look up a specification in either tree, candidate first
    #[must_use]
    pub fn find(&self, id: &SpecId) -> Option<&Specification> {
        self.candidate.find(id).or_else(|| self.canonical.find(id))
    }

    /// Resolved history
    #[inline]
    #[must_use]
    pub fn resolved_conflicts(&self) -> &[ResolvedConflict] {
        self.queue.resolved()
    }

    /// Movement log
    #[inline]
    #[must_use]
    pub fn movements(&self) -> &[Movement] {
        &self.movements
    }

    /// Engine configuration
    #[inline]
    #[must_use]
    pub fn config(&self) -> &EngineConfig {
        &self.config
    }

    /// Knowledge graph
    #[inline]
    #[must_use]
    pub fn graph(&self) -> &Arc<G> {
        &self.graph
    }

    /// Capture the persistable state
    #[must_use]
    pub fn snapshot(&self) -> ArtifactSnapshot {
        ArtifactSnapshot {
            version: crate::VERSION.to_string(),
            candidate: self.candidate.clone(),
            canonical: self.canonical.clone(),
            active_conflicts: self.queue.active().to_vec(),
            resolved_conflicts: self.queue.resolved().to_vec(),
            movements: self.movements.clone(),
        }
    }
}
