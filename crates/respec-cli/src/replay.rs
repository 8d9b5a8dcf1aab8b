//! Scripted session replay

use crate::script::{add_input, Script, Step};
use anyhow::{anyhow, Context};
use respec_conflict::ConflictPrompt;
use respec_core::{ArtifactManager, SystemStatus};
use respec_knowledge::KnowledgeGraph;
use serde::Serialize;

/// Result of one replayed step
#[derive(Debug, Clone, PartialEq, Serialize)]
pub(crate) struct StepReport {
    pub(crate) index: usize,
    pub(crate) step: &'static str,
    pub(crate) detail: String,
    pub(crate) status: SystemStatus,

    /// Question the user would be asked next
    #[serde(skip_serializing_if = "Option::is_none")]
    pub(crate) prompt: Option<ConflictPrompt>,
}

/// Run every step against `manager`
///
/// Stops at the first failing step; reports for earlier steps are lost with
/// the error, the manager keeps their effects.
pub(crate) fn replay<G: KnowledgeGraph + ?Sized>(
    manager: &mut ArtifactManager<G>,
    script: &Script,
) -> anyhow::Result<Vec<StepReport>> {
    let mut reports = Vec::with_capacity(script.steps.len());

    for (index, step) in script.steps.iter().enumerate() {
        let detail = run_step(manager, step)
            .with_context(|| format!("step {} ({}) failed", index + 1, step.name()))?;
        tracing::debug!(index, step = step.name(), %detail, "step replayed");

        reports.push(StepReport {
            index: index + 1,
            step: step.name(),
            detail,
            status: manager.status(),
            prompt: manager.active_conflicts().into_iter().next(),
        });
    }

    Ok(reports)
}

fn run_step<G: KnowledgeGraph + ?Sized>(
    manager: &mut ArtifactManager<G>,
    step: &Step,
) -> anyhow::Result<String> {
    match step {
        Step::Add {
            field,
            value,
            source,
            attribution,
            confidence,
        } => {
            let input = add_input(field, value, *attribution, *confidence);
            let conflicts = manager.add_specification(input, *source)?;
            Ok(if conflicts.is_empty() {
                format!("added {field}")
            } else {
                format!("added {field}, {} new conflict(s)", conflicts.len())
            })
        }
        Step::Resolve { choice } => {
            let current = manager
                .current_conflict()
                .map(|conflict| conflict.id)
                .ok_or_else(|| anyhow!("no active conflict to resolve"))?;
            let outcome = manager.resolve_conflict_option(current, choice)?;
            let removed: Vec<String> = outcome
                .report
                .removed_ids()
                .iter()
                .map(ToString::to_string)
                .collect();
            Ok(format!(
                "kept {}, removed {}",
                outcome.report.winner,
                removed.join(", ")
            ))
        }
        Step::Unclear => {
            let current = manager
                .current_conflict()
                .map(|conflict| conflict.id)
                .ok_or_else(|| anyhow!("no active conflict to clarify"))?;
            let cycles = manager.record_unclear_reply(current)?;
            Ok(if manager.needs_escalation(current) {
                format!("unclear reply #{cycles}, escalation needed")
            } else {
                format!("unclear reply #{cycles}")
            })
        }
        Step::Promote => {
            let movement = manager.promote();
            Ok(format!("promoted {} specification(s)", movement.spec_ids.len()))
        }
        Step::Status => Ok(manager.status().to_string()),
    }
}
