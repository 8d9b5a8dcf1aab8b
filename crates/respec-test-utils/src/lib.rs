//! Testing utilities for respec workspace
//!
//! Shared catalogs, manager setup, scripted conversation agents and
//! invariant assertions.

#![allow(missing_docs)]

use parking_lot::Mutex;
use respec_artifact::{ArtifactTree, InsertSource};
use respec_conflict::{Conflict, ConflictPrompt, PostCondition, SideChoice};
use respec_core::{
    AgentError, ArtifactManager, ConversationAgent, EngineConfig, SpecificationInput,
};
use respec_knowledge::{Catalog, KnowledgeGraph, QuestionTemplate, SpecId};
use std::collections::{HashMap, VecDeque};
use std::sync::Arc;

/// `P1` excludes `P2`, nothing else
pub fn literal_catalog() -> Catalog {
    Catalog::new()
        .with_scenario("S1", "Scenario")
        .with_requirement("R1", "Requirement", ["S1"])
        .with_specification("P1", ["R1"])
        .with_specification("P2", ["R1"])
        .with_exclusion(["P1", "P2"])
}

/// Two exclusion pairs that share no member, plus a free field
///
/// `A1`/`A2` and `B1`/`B2` exclude each other; `FREE` excludes nothing.
pub fn independent_pairs_catalog() -> Catalog {
    Catalog::new()
        .with_scenario("S1", "Scenario")
        .with_requirement("RA", "Pair A", ["S1"])
        .with_requirement("RB", "Pair B", ["S1"])
        .with_specification("A1", ["RA"])
        .with_specification("A2", ["RA"])
        .with_specification("B1", ["RB"])
        .with_specification("B2", ["RB"])
        .with_specification("FREE", ["RB"])
        .with_exclusion(["A1", "A2"])
        .with_exclusion(["B1", "B2"])
}

/// Industrial PC configurator
///
/// - `active_fan` excludes `fanless` (with a stored question)
/// - `psu_150w` excludes `gpu`
/// - `gpu` requires `active_fan`
/// - `ram_16`, `ram_32`, `ram_64` exclude each other
pub fn industrial_pc_catalog() -> Catalog {
    Catalog::new()
        .with_scenario("edge", "Edge deployment")
        .with_scenario("office", "Office deployment")
        .with_requirement("cooling", "Cooling", ["edge", "office"])
        .with_requirement("compute", "Compute", ["edge"])
        .with_requirement("power", "Power supply", ["edge"])
        .with_requirement("memory", "Memory", ["office"])
        .with_specification("fanless", ["cooling"])
        .with_specification("active_fan", ["cooling"])
        .with_specification("gpu", ["compute"])
        .with_specification("cpu_tier", ["compute"])
        .with_specification("psu_150w", ["power"])
        .with_specification("psu_300w", ["power"])
        .with_specification("ram_16", ["memory"])
        .with_specification("ram_32", ["memory"])
        .with_specification("ram_64", ["memory"])
        .with_label("fanless", "Fanless chassis")
        .with_label("active_fan", "Active fan cooling")
        .with_label("gpu", "Discrete GPU")
        .with_label("psu_150w", "150 W power supply")
        .with_exclusion_question(
            ["active_fan", "fanless"],
            QuestionTemplate::new("Should the system use {first} or a {second}?")
                .with_options("Keep {first}", "Keep {second}"),
        )
        .with_exclusion(["psu_150w", "gpu"])
        .with_exclusion(["ram_16", "ram_32", "ram_64"])
        .with_dependency("gpu", "active_fan")
}

/// Manager with default configuration
///
/// Additions stay in candidate until a resolution or an explicit promote.
pub fn setup_manager(catalog: Catalog) -> ArtifactManager<Catalog> {
    ArtifactManager::new(Arc::new(catalog))
}

/// Manager that promotes unblocked candidates after every add
pub fn setup_auto_manager(catalog: Catalog) -> ArtifactManager<Catalog> {
    ArtifactManager::with_config(
        Arc::new(catalog),
        EngineConfig::new().with_promote_on_add(true),
    )
}

/// Add a user-stated value, panicking on hierarchy errors
pub fn add(manager: &mut ArtifactManager<Catalog>, field: &str, value: &str) -> Vec<Conflict> {
    manager
        .add_specification(SpecificationInput::new(field, value), InsertSource::UserInput)
        .unwrap()
}

/// Post-condition that always fails (fault injection)
#[derive(Debug, Clone, Copy, Default)]
pub struct FailingPostCondition;

impl PostCondition for FailingPostCondition {
    fn check(
        &self,
        _winner: &SpecId,
        _losers: &[SpecId],
        _candidate: &ArtifactTree,
        _canonical: &ArtifactTree,
    ) -> Result<(), String> {
        Err("injected fault".to_string())
    }
}

/// Conversation agent with canned extractions and replies
///
/// Extractions are keyed by the exact message; replies are consumed in
/// order, `Unknown` once exhausted.
#[derive(Debug, Default)]
pub struct ScriptedAgent {
    extractions: HashMap<String, Vec<SpecificationInput>>,
    replies: Mutex<VecDeque<SideChoice>>,
    seen_prompts: Mutex<Vec<ConflictPrompt>>,
}

impl ScriptedAgent {
    pub fn new() -> Self {
        Self::default()
    }

    /// Message `message` extracts `fields` (`(field, value)` pairs)
    #[must_use]
    pub fn with_extraction(mut self, message: &str, fields: &[(&str, &str)]) -> Self {
        let inputs = fields
            .iter()
            .map(|(field, value)| SpecificationInput::new(*field, *value))
            .collect();
        self.extractions.insert(message.to_string(), inputs);
        self
    }

    /// Next reply is interpreted as `choice`
    #[must_use]
    pub fn with_reply(self, choice: SideChoice) -> Self {
        self.replies.lock().push_back(choice);
        self
    }

    /// Prompts passed to `choose_side` so far
    pub fn seen_prompts(&self) -> Vec<ConflictPrompt> {
        self.seen_prompts.lock().clone()
    }
}

#[async_trait::async_trait]
impl ConversationAgent for ScriptedAgent {
    async fn extract(&self, message: &str) -> Result<Vec<SpecificationInput>, AgentError> {
        Ok(self.extractions.get(message).cloned().unwrap_or_default())
    }

    async fn choose_side(
        &self,
        prompt: &ConflictPrompt,
        _reply: &str,
    ) -> Result<SideChoice, AgentError> {
        self.seen_prompts.lock().push(prompt.clone());
        Ok(self.replies.lock().pop_front().unwrap_or(SideChoice::Unknown))
    }
}

/// Agent whose backend is always down
#[derive(Debug, Clone, Copy, Default)]
pub struct UnavailableAgent;

#[async_trait::async_trait]
impl ConversationAgent for UnavailableAgent {
    async fn extract(&self, _message: &str) -> Result<Vec<SpecificationInput>, AgentError> {
        Err(AgentError::Unavailable("offline".to_string()))
    }

    async fn choose_side(
        &self,
        _prompt: &ConflictPrompt,
        _reply: &str,
    ) -> Result<SideChoice, AgentError> {
        Err(AgentError::Unavailable("offline".to_string()))
    }
}

/// Assert no id sits in both trees
pub fn assert_no_duplicates<G: KnowledgeGraph + ?Sized>(manager: &ArtifactManager<G>) {
    let candidate = manager.candidate().spec_ids();
    let canonical = manager.canonical().spec_ids();
    let overlap: Vec<&SpecId> = candidate.intersection(&canonical).collect();
    assert!(overlap.is_empty(), "ids in both trees: {overlap:?}");
}

/// Assert every present exclusive pair is held by an active conflict
///
/// With no active conflict this means no exclusive pair is present at all.
pub fn assert_exclusions_covered<G: KnowledgeGraph + ?Sized>(manager: &ArtifactManager<G>) {
    let present: Vec<SpecId> = manager
        .candidate()
        .spec_ids()
        .into_iter()
        .chain(manager.canonical().spec_ids())
        .collect();
    let graph = manager.graph();

    for (i, x) in present.iter().enumerate() {
        for y in &present[i + 1..] {
            if !graph.excludes(x, y) {
                continue;
            }
            let covered = manager
                .all_active_conflicts()
                .iter()
                .any(|conflict| conflict.involves(x) && conflict.involves(y));
            assert!(covered, "exclusive pair {x} / {y} present without an active conflict");
        }
    }
}

/// Assert every present dependency cascade is held by an active conflict
///
/// A cascade is a present dependent whose required specification is
/// excluded by another present specification. Pairs living only in
/// canonical were confirmed earlier and are not checked.
pub fn assert_cascades_covered<G: KnowledgeGraph + ?Sized>(manager: &ArtifactManager<G>) {
    if !manager.config().dependency_cascades {
        return;
    }
    let candidate = manager.candidate().spec_ids();
    let present: Vec<SpecId> = candidate
        .iter()
        .cloned()
        .chain(manager.canonical().spec_ids())
        .collect();
    let graph = manager.graph();

    for dependent in &present {
        for required in graph.dependencies_of(dependent) {
            for blocker in &present {
                if blocker == dependent || !graph.excludes(blocker, &required) {
                    continue;
                }
                if !candidate.contains(dependent) && !candidate.contains(blocker) {
                    continue;
                }
                let covered = manager
                    .all_active_conflicts()
                    .iter()
                    .any(|conflict| conflict.involves(dependent) && conflict.involves(blocker));
                assert!(
                    covered,
                    "{dependent} needs {required}, excluded by {blocker}, without an active conflict"
                );
            }
        }
    }
}

/// Assert the blocked flag matches the active list
pub fn assert_blocked_consistent<G: KnowledgeGraph + ?Sized>(manager: &ArtifactManager<G>) {
    let status = manager.status();
    assert_eq!(status.blocked, status.active_count > 0);
    assert_eq!(status.blocked, !manager.active_conflicts().is_empty());
    assert!(manager.active_conflicts().len() <= 1);
}
