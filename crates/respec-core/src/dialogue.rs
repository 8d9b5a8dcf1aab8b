//! Binary-choice dialogue protocol
//!
//! Drives one conversation over a [`SharedArtifactManager`]:
//! - while unblocked, messages are run through [`ConversationAgent::extract`]
//!   and every extracted field is added
//! - while blocked, the message is a reply to the current question and is
//!   mapped to a side with [`ConversationAgent::choose_side`]
//!
//! The agent is awaited before the manager lock is taken.

use crate::error::ManagerError;
use crate::manager::{ResolutionOutcome, SpecificationInput};
use crate::shared::SharedArtifactManager;
use crate::status::SystemStatus;
use respec_artifact::InsertSource;
use respec_conflict::{ConflictPrompt, SideChoice};
use respec_knowledge::KnowledgeGraph;

/// Conversation/LLM collaborator
#[async_trait::async_trait]
pub trait ConversationAgent: Send + Sync {
    /// Extract `(field, value)` data from a user message
    async fn extract(&self, message: &str) -> Result<Vec<SpecificationInput>, AgentError>;

    /// Interpret a reply to a conflict question
    async fn choose_side(
        &self,
        prompt: &ConflictPrompt,
        reply: &str,
    ) -> Result<SideChoice, AgentError>;
}

/// Conversation agent failures
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum AgentError {
    /// Backend could not be reached
    #[error("conversation agent unavailable: {0}")]
    Unavailable(String),

    /// Backend answered with something unusable
    #[error("malformed agent response: {0}")]
    Malformed(String),
}

/// Dialogue errors
#[derive(Debug, thiserror::Error)]
pub enum DialogueError {
    /// Conversation backend failed
    #[error(transparent)]
    Agent(#[from] AgentError),

    /// Manager rejected the operation
    #[error(transparent)]
    Manager(#[from] ManagerError),
}

/// Result of handling one user message
#[derive(Debug, Clone, PartialEq)]
pub enum TurnOutcome {
    /// Extracted fields were added
    Recorded {
        /// Number of specifications added
        added: usize,
        /// Question to ask next, if the additions caused conflicts
        next: Option<ConflictPrompt>,
        /// Status after the additions
        status: SystemStatus,
    },

    /// The reply settled the current conflict
    Resolved {
        /// What the resolution changed
        outcome: Box<ResolutionOutcome>,
        /// Question to ask next, if conflicts remain
        next: Option<ConflictPrompt>,
    },

    /// The reply picked no side; ask again
    Clarify {
        /// Question to repeat
        prompt: ConflictPrompt,
        /// Unclear replies so far
        cycles: u32,
    },

    /// Too many unclear replies; hand over to a human
    Escalate {
        /// Question that could not be settled
        prompt: ConflictPrompt,
        /// Unclear replies so far
        cycles: u32,
    },
}

/// One conversation bound to a shared manager
#[derive(Debug)]
pub struct DialogueSession<A, G>
where
    A: ConversationAgent,
    G: KnowledgeGraph + ?Sized,
{
    agent: A,
    manager: SharedArtifactManager<G>,
}

impl<A, G> DialogueSession<A, G>
where
    A: ConversationAgent,
    G: KnowledgeGraph + ?Sized,
{
    /// Create session
    #[must_use]
    pub fn new(agent: A, manager: SharedArtifactManager<G>) -> Self {
        Self { agent, manager }
    }

    /// Shared manager handle
    #[inline]
    #[must_use]
    pub fn manager(&self) -> &SharedArtifactManager<G> {
        &self.manager
    }

    /// Handle one user message
    ///
    /// # Errors
    /// Agent failures, and manager errors from adding or resolving. A
    /// failed add stops at the failing field; earlier fields stay added.
    pub async fn handle_message(&self, message: &str) -> Result<TurnOutcome, DialogueError> {
        match self.manager.current_prompt() {
            Some(prompt) => self.handle_reply(prompt, message).await,
            None => self.handle_statement(message).await,
        }
    }

    async fn handle_statement(&self, message: &str) -> Result<TurnOutcome, DialogueError> {
        let inputs = self.agent.extract(message).await?;
        let added = inputs.len();

        for input in inputs {
            self.manager
                .add_specification(input, InsertSource::Extraction)?;
        }

        tracing::debug!(added, "message processed");
        Ok(TurnOutcome::Recorded {
            added,
            next: self.manager.current_prompt(),
            status: self.manager.status(),
        })
    }

    async fn handle_reply(
        &self,
        prompt: ConflictPrompt,
        reply: &str,
    ) -> Result<TurnOutcome, DialogueError> {
        let choice = self.agent.choose_side(&prompt, reply).await?;

        if let Some(side) = choice.side() {
            let outcome = self.manager.resolve_conflict(prompt.conflict_id, side)?;
            return Ok(TurnOutcome::Resolved {
                outcome: Box::new(outcome),
                next: self.manager.current_prompt(),
            });
        }

        let cycles = self.manager.record_unclear_reply(prompt.conflict_id)?;
        if self.manager.needs_escalation(prompt.conflict_id) {
            tracing::warn!(conflict_id = %prompt.conflict_id, cycles, "escalating conflict");
            Ok(TurnOutcome::Escalate { prompt, cycles })
        } else {
            Ok(TurnOutcome::Clarify { prompt, cycles })
        }
    }
}
