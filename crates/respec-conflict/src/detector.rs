//! Exclusion conflict detection
//!
//! Scans the candidate tree against itself and against the canonical tree.
//! Canonical is included so that a new candidate cannot silently invalidate
//! an earlier confirmed choice.

use crate::conflict::{key_of, normalize, Conflict, ConflictKind};
use respec_artifact::ArtifactTree;
use respec_knowledge::{ExclusionEntry, KnowledgeGraph, SpecId};
use std::collections::{BTreeSet, HashSet};

/// Pairwise exclusion scanner
#[derive(Debug, Clone, Copy)]
pub struct ConflictDetector {
    dependency_cascades: bool,
}

impl Default for ConflictDetector {
    fn default() -> Self {
        Self::new()
    }
}

impl ConflictDetector {
    /// Create detector with dependency cascade checks enabled
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self {
            dependency_cascades: true,
        }
    }

    /// Enable or disable dependency cascade checks
    #[inline]
    #[must_use]
    pub fn with_dependency_cascades(mut self, enabled: bool) -> Self {
        self.dependency_cascades = enabled;
        self
    }

    /// Detect conflicts involving at least one candidate specification
    ///
    /// Every candidate id `x` is checked against (other candidates ∪
    /// canonical). Conflicts are deduplicated by their sorted-id key, so a
    /// pair reported from both directions appears once. Output order follows
    /// candidate id order.
    ///
    /// Dependency cascades pair a present dependent with a present blocker of
    /// its requirement, in either tree, as long as one of the two is a
    /// candidate. The order in which they arrived does not matter.
    pub fn detect<G>(
        &self,
        candidate: &ArtifactTree,
        canonical: &ArtifactTree,
        graph: &G,
    ) -> Vec<Conflict>
    where
        G: KnowledgeGraph + ?Sized,
    {
        let candidate_ids = candidate.spec_ids();
        let canonical_ids = canonical.spec_ids();

        let mut seen: HashSet<String> = HashSet::new();
        let mut conflicts = Vec::new();

        for x in &candidate_ids {
            for entry in graph.exclusions_of(x) {
                let hits: Vec<SpecId> = entry
                    .other_ids
                    .iter()
                    .filter(|other| *other != x)
                    .filter(|other| candidate_ids.contains(*other) || canonical_ids.contains(*other))
                    .cloned()
                    .collect();
                if hits.is_empty() {
                    continue;
                }

                let members = normalize(std::iter::once(x.clone()).chain(hits));
                if !seen.insert(key_of(&members)) {
                    continue;
                }

                if let Some(conflict) = exclusion_conflict(&members, &entry, &canonical_ids, graph) {
                    tracing::debug!(
                        key = %conflict.key(),
                        kind = conflict.kind.name(),
                        "exclusion conflict detected"
                    );
                    conflicts.push(conflict);
                }
            }
        }

        if self.dependency_cascades {
            self.detect_cascades(&candidate_ids, &canonical_ids, graph, &mut seen, &mut conflicts);
        }

        conflicts
    }

    fn detect_cascades<G>(
        &self,
        candidate_ids: &BTreeSet<SpecId>,
        canonical_ids: &BTreeSet<SpecId>,
        graph: &G,
        seen: &mut HashSet<String>,
        conflicts: &mut Vec<Conflict>,
    ) where
        G: KnowledgeGraph + ?Sized,
    {
        let present: BTreeSet<&SpecId> = candidate_ids.iter().chain(canonical_ids).collect();

        // Either side may be the new arrival; canonical-only pairs were
        // checked when they were still candidates.
        for dependent in &present {
            for required in graph.dependencies_of(dependent) {
                for blocker in &present {
                    if blocker == dependent || !graph.excludes(blocker, &required) {
                        continue;
                    }
                    if !candidate_ids.contains(*dependent) && !candidate_ids.contains(*blocker) {
                        continue;
                    }

                    let members = normalize([(*dependent).clone(), (*blocker).clone()]);
                    if !seen.insert(key_of(&members)) {
                        continue;
                    }

                    let description = format!(
                        "{} requires {}, which cannot be combined with {}",
                        graph.label_of(dependent),
                        graph.label_of(&required),
                        graph.label_of(blocker),
                    );
                    let kind = ConflictKind::DependencyCascade {
                        dependent: (*dependent).clone(),
                        required: required.clone(),
                    };
                    if let Some(conflict) = Conflict::new(kind, members, description) {
                        let labels = labels_of(conflict.spec_ids(), graph);
                        let conflict = conflict.with_member_labels(&labels);
                        tracing::debug!(key = %conflict.key(), "dependency cascade detected");
                        conflicts.push(conflict);
                    }
                }
            }
        }
    }
}

fn exclusion_conflict<G>(
    members: &[SpecId],
    entry: &ExclusionEntry,
    canonical_ids: &BTreeSet<SpecId>,
    graph: &G,
) -> Option<Conflict>
where
    G: KnowledgeGraph + ?Sized,
{
    let labels = labels_of(members, graph);
    let canonical_members: Vec<SpecId> = members
        .iter()
        .filter(|id| canonical_ids.contains(*id))
        .cloned()
        .collect();

    // Placeholders follow id order so that {first} is always option A
    let description = match &entry.question_template {
        Some(template) => template.render_question(&labels[0], &labels[1]),
        None if canonical_members.is_empty() => {
            format!("{} cannot be combined", labels.join(" and "))
        }
        None => format!(
            "{} cannot be combined (already confirmed: {})",
            labels.join(" and "),
            canonical_members
                .iter()
                .map(|id| graph.label_of(id))
                .collect::<Vec<_>>()
                .join(", "),
        ),
    };

    let kind = ConflictKind::MutualExclusion {
        canonical_ids: canonical_members,
    };
    let mut conflict = Conflict::new(kind, members.iter().cloned(), description)?
        .with_member_labels(&labels);

    if let Some(template) = &entry.question_template {
        let option_a = template.render_option_a(&labels[0], &labels[1]);
        let option_b = template.render_option_b(&labels[0], &labels[1]);
        if let (Some(a), Some(b)) = (option_a, option_b) {
            conflict = conflict.with_option_labels(a, b);
        }
    }

    Some(conflict)
}

fn labels_of<G>(ids: &[SpecId], graph: &G) -> Vec<String>
where
    G: KnowledgeGraph + ?Sized,
{
    ids.iter().map(|id| graph.label_of(id)).collect()
}
