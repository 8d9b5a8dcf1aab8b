//! Conflict records and resolution choices
//!
//! Provides [`Conflict`], the tagged [`ConflictKind`] union, the binary
//! [`Side`] choice and the records produced once a conflict is resolved.

use chrono::{DateTime, Utc};
use respec_knowledge::SpecId;
use serde::{Deserialize, Serialize};
use std::fmt::{self, Display, Formatter};
use std::str::FromStr;
use ulid::Ulid;

/// Unique conflict identifier (ULID for sortability)
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct ConflictId(pub Ulid);

impl ConflictId {
    /// Generate new conflict ID
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self(Ulid::new())
    }
}

impl Default for ConflictId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for ConflictId {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for ConflictId {
    type Err = ulid::DecodeError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ulid::from_string(s).map(Self)
    }
}

/// What kind of rule a conflict violates
///
/// Each variant carries only its own fields.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "kebab-case")]
pub enum ConflictKind {
    /// Members of an exclusion group are present together
    MutualExclusion {
        /// Members already confirmed in the canonical tree
        #[serde(default, skip_serializing_if = "Vec::is_empty")]
        canonical_ids: Vec<SpecId>,
    },

    /// `dependent` needs `required`, which a present choice excludes
    DependencyCascade {
        /// Specification with the unmet dependency
        dependent: SpecId,
        /// Specification it depends on
        required: SpecId,
    },

    /// No admissible value remains for a field
    FieldExhausted {
        /// Field without an admissible value
        field: SpecId,
    },
}

impl ConflictKind {
    /// Plain mutual exclusion inside the candidate tree
    #[inline]
    #[must_use]
    pub fn mutual_exclusion() -> Self {
        Self::MutualExclusion {
            canonical_ids: Vec::new(),
        }
    }

    /// Check if a confirmed choice is involved
    #[inline]
    #[must_use]
    pub fn is_cross_artifact(&self) -> bool {
        matches!(self, Self::MutualExclusion { canonical_ids } if !canonical_ids.is_empty())
    }

    /// Fixed priority tier of this kind
    #[must_use]
    pub fn priority(&self) -> ConflictPriority {
        match self {
            Self::MutualExclusion { canonical_ids } if !canonical_ids.is_empty() => {
                ConflictPriority::CrossArtifact
            }
            Self::MutualExclusion { .. } => ConflictPriority::MutualExclusion,
            Self::DependencyCascade { .. } => ConflictPriority::Dependency,
            Self::FieldExhausted { .. } => ConflictPriority::Logical,
        }
    }

    /// Short kebab-case name for logs
    #[inline]
    #[must_use]
    pub fn name(&self) -> &'static str {
        match self {
            Self::MutualExclusion { .. } => "mutual-exclusion",
            Self::DependencyCascade { .. } => "dependency-cascade",
            Self::FieldExhausted { .. } => "field-exhausted",
        }
    }
}

/// Priority tier; higher variants are surfaced first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ConflictPriority {
    /// Exclusion within candidate
    MutualExclusion,
    /// Dependency cascade
    Dependency,
    /// Caller-raised, e.g. an exhausted field
    Logical,
    /// Exclusion touching a confirmed choice
    CrossArtifact,
}

impl Display for ConflictPriority {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        let name = match self {
            Self::MutualExclusion => "mutual-exclusion",
            Self::Dependency => "dependency",
            Self::Logical => "logical",
            Self::CrossArtifact => "cross-artifact",
        };
        f.write_str(name)
    }
}

/// One of the two resolution options
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Side {
    /// Keep the first member
    #[serde(rename = "option-a")]
    A,

    /// Keep the second member
    #[serde(rename = "option-b")]
    B,
}

impl Side {
    /// Option identifier (`option-a` / `option-b`)
    #[inline]
    #[must_use]
    pub fn option_id(self) -> &'static str {
        match self {
            Self::A => "option-a",
            Self::B => "option-b",
        }
    }

    /// Parse `A`, `B`, `option-a` or `option-b` (case-insensitive)
    #[must_use]
    pub fn parse(input: &str) -> Option<Self> {
        match input.trim().to_ascii_lowercase().as_str() {
            "a" | "option-a" => Some(Self::A),
            "b" | "option-b" => Some(Self::B),
            _ => None,
        }
    }
}

impl Display for Side {
    fn fmt(&self, f: &mut Formatter<'_>) -> fmt::Result {
        f.write_str(self.option_id())
    }
}

/// Reply interpretation returned by the conversation layer
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum SideChoice {
    /// Reply picked option A
    A,
    /// Reply picked option B
    B,
    /// Reply did not pick a side
    Unknown,
}

impl SideChoice {
    /// Decided side, if any
    #[inline]
    #[must_use]
    pub fn side(self) -> Option<Side> {
        match self {
            Self::A => Some(Side::A),
            Self::B => Some(Side::B),
            Self::Unknown => None,
        }
    }
}

impl From<Side> for SideChoice {
    fn from(side: Side) -> Self {
        match side {
            Side::A => Self::A,
            Side::B => Self::B,
        }
    }
}

/// Resolution option shown to the user
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolutionOption {
    /// Side this option keeps
    pub id: Side,
    /// Question-facing label
    pub description: String,
    /// Which ids survive and which are removed
    pub expected_outcome: String,
}

/// Detected violation awaiting a binary decision
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Conflict {
    /// Stable conflict identifier
    pub id: ConflictId,
    /// Rule that was violated
    pub kind: ConflictKind,

    /// Sorted, deduplicated, at least two entries
    spec_ids: Vec<SpecId>,

    /// Question shown to the user
    pub description: String,
    options: [ResolutionOption; 2],

    /// Failed clarification rounds
    pub cycle_count: u32,

    /// When detection first reported it
    pub first_detected: DateTime<Utc>,
    /// Last cycle count change
    pub last_updated: DateTime<Utc>,
}

impl Conflict {
    /// Create conflict with synthesized options
    ///
    /// Ids are sorted and deduplicated. Returns `None` when fewer than two
    /// distinct ids remain.
    #[must_use]
    pub fn new(
        kind: ConflictKind,
        spec_ids: impl IntoIterator<Item = SpecId>,
        description: impl Into<String>,
    ) -> Option<Self> {
        let spec_ids = normalize(spec_ids);
        if spec_ids.len() < 2 {
            return None;
        }

        let labels: Vec<String> = spec_ids.iter().map(ToString::to_string).collect();
        let options = default_options(&spec_ids, &labels);
        let now = Utc::now();

        Some(Self {
            id: ConflictId::new(),
            kind,
            spec_ids,
            description: description.into(),
            options,
            cycle_count: 0,
            first_detected: now,
            last_updated: now,
        })
    }

    /// With option labels (outcomes are kept)
    #[must_use]
    pub fn with_option_labels(mut self, option_a: impl Into<String>, option_b: impl Into<String>) -> Self {
        self.options[0].description = option_a.into();
        self.options[1].description = option_b.into();
        self
    }

    /// With synthesized options using display labels of the members
    ///
    /// `labels` is parallel to [`Conflict::spec_ids`].
    #[must_use]
    pub fn with_member_labels(mut self, labels: &[String]) -> Self {
        if labels.len() == self.spec_ids.len() {
            self.options = default_options(&self.spec_ids, labels);
        }
        self
    }

    /// Members of the conflict (sorted)
    #[inline]
    #[must_use]
    pub fn spec_ids(&self) -> &[SpecId] {
        &self.spec_ids
    }

    /// Both options, A first
    #[inline]
    #[must_use]
    pub fn options(&self) -> &[ResolutionOption; 2] {
        &self.options
    }

    /// Option for a side
    #[inline]
    #[must_use]
    pub fn option(&self, side: Side) -> &ResolutionOption {
        match side {
            Side::A => &self.options[0],
            Side::B => &self.options[1],
        }
    }

    /// Deduplication key: sorted ids joined with `|`
    #[must_use]
    pub fn key(&self) -> String {
        key_of(&self.spec_ids)
    }

    /// Priority tier
    #[inline]
    #[must_use]
    pub fn priority(&self) -> ConflictPriority {
        self.kind.priority()
    }

    /// Winner and losers for a side
    ///
    /// A keeps `[0]` and drops the rest; B keeps `[1]` and drops `[0]` plus
    /// everything from index 2 on.
    #[must_use]
    pub fn partition(&self, side: Side) -> (SpecId, Vec<SpecId>) {
        let keep = match side {
            Side::A => 0,
            Side::B => 1,
        };
        let winner = self.spec_ids[keep].clone();
        let losers = self
            .spec_ids
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != keep)
            .map(|(_, id)| id.clone())
            .collect();
        (winner, losers)
    }

    /// Check if the conflict names the specification
    #[inline]
    #[must_use]
    pub fn involves(&self, id: &SpecId) -> bool {
        self.spec_ids.contains(id)
    }

    /// Count a failed clarification round
    pub fn record_cycle(&mut self) -> u32 {
        self.cycle_count = self.cycle_count.saturating_add(1);
        self.last_updated = Utc::now();
        self.cycle_count
    }

    /// Question surfaced to the conversation layer
    #[must_use]
    pub fn prompt(&self) -> ConflictPrompt {
        let option = |opt: &ResolutionOption| PromptOption {
            id: opt.id,
            label: opt.description.clone(),
            outcome: opt.expected_outcome.clone(),
        };
        ConflictPrompt {
            conflict_id: self.id,
            description: self.description.clone(),
            priority: self.priority(),
            options: [option(&self.options[0]), option(&self.options[1])],
        }
    }
}

/// Sorted, deduplicated id list
pub(crate) fn normalize(ids: impl IntoIterator<Item = SpecId>) -> Vec<SpecId> {
    let mut ids: Vec<SpecId> = ids.into_iter().collect();
    ids.sort();
    ids.dedup();
    ids
}

/// Deduplication key for an already sorted id list
pub(crate) fn key_of(ids: &[SpecId]) -> String {
    ids.iter()
        .map(SpecId::as_str)
        .collect::<Vec<_>>()
        .join("|")
}

fn default_options(ids: &[SpecId], labels: &[String]) -> [ResolutionOption; 2] {
    let outcome = |keep: usize| {
        let dropped: Vec<&str> = ids
            .iter()
            .enumerate()
            .filter(|(idx, _)| *idx != keep)
            .map(|(_, id)| id.as_str())
            .collect();
        format!("keeps {}; removes {}", ids[keep], dropped.join(", "))
    };

    [
        ResolutionOption {
            id: Side::A,
            description: format!("Keep {}", labels[0]),
            expected_outcome: outcome(0),
        },
        ResolutionOption {
            id: Side::B,
            description: format!("Keep {}", labels[1]),
            expected_outcome: outcome(1),
        },
    ]
}

/// Who closed a conflict
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum ResolvedBy {
    /// The user picked a side
    User,

    /// A member disappeared through another resolution
    System,
}

/// Closed conflict kept for history
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedConflict {
    /// Conflict as it was when closed
    pub conflict: Conflict,
    /// When it was closed
    pub resolved_at: DateTime<Utc>,

    /// `None` when retired by the system
    pub user_choice: Option<Side>,

    /// User answer or system retirement
    pub resolved_by: ResolvedBy,
    /// Ids removed from the trees
    pub removed_ids: Vec<SpecId>,
}

/// Binary question for the conversation layer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConflictPrompt {
    /// Conflict this question is about
    pub conflict_id: ConflictId,
    /// Question text
    pub description: String,
    /// Priority tier of the conflict
    pub priority: ConflictPriority,
    /// Option A, then option B
    pub options: [PromptOption; 2],
}

/// One answer of a [`ConflictPrompt`]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PromptOption {
    /// Answer id
    pub id: Side,
    /// Short label
    pub label: String,
    /// What picking it does
    pub outcome: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    fn ids(raw: &[&str]) -> Vec<SpecId> {
        raw.iter().map(|id| SpecId::from(*id)).collect()
    }

    #[test]
    fn ids_are_sorted_and_deduplicated() {
        let conflict = Conflict::new(
            ConflictKind::mutual_exclusion(),
            ids(&["p2", "p1", "p2"]),
            "p1 vs p2",
        )
        .unwrap();
        assert_eq!(conflict.spec_ids(), ids(&["p1", "p2"]).as_slice());
        assert_eq!(conflict.key(), "p1|p2");
    }

    #[test]
    fn single_member_rejected() {
        assert!(Conflict::new(ConflictKind::mutual_exclusion(), ids(&["p1", "p1"]), "x").is_none());
    }

    #[test]
    fn partition_by_index() {
        let conflict = Conflict::new(
            ConflictKind::mutual_exclusion(),
            ids(&["a", "b", "c"]),
            "three-way",
        )
        .unwrap();

        let (winner, losers) = conflict.partition(Side::A);
        assert_eq!(winner.as_str(), "a");
        assert_eq!(losers, ids(&["b", "c"]));

        let (winner, losers) = conflict.partition(Side::B);
        assert_eq!(winner.as_str(), "b");
        assert_eq!(losers, ids(&["a", "c"]));
    }

    #[test]
    fn synthesized_options_describe_outcome() {
        let conflict = Conflict::new(ConflictKind::mutual_exclusion(), ids(&["p1", "p2"]), "x")
            .unwrap()
            .with_member_labels(&["Fanless".to_string(), "GPU".to_string()]);
        let a = conflict.option(Side::A);
        assert_eq!(a.id, Side::A);
        assert_eq!(a.description, "Keep Fanless");
        assert_eq!(a.expected_outcome, "keeps p1; removes p2");
        assert_eq!(conflict.option(Side::B).description, "Keep GPU");
    }

    #[test]
    fn priority_tiers() {
        let cross = ConflictKind::MutualExclusion {
            canonical_ids: ids(&["p1"]),
        };
        let dependency = ConflictKind::DependencyCascade {
            dependent: SpecId::from("gpu"),
            required: SpecId::from("fan"),
        };
        let exhausted = ConflictKind::FieldExhausted {
            field: SpecId::from("ram"),
        };

        assert!(cross.is_cross_artifact());
        assert!(cross.priority() > exhausted.priority());
        assert!(exhausted.priority() > dependency.priority());
        assert!(dependency.priority() > ConflictKind::mutual_exclusion().priority());
    }

    #[test]
    fn side_parsing() {
        assert_eq!(Side::parse("A"), Some(Side::A));
        assert_eq!(Side::parse(" option-b "), Some(Side::B));
        assert_eq!(Side::parse("maybe"), None);
        assert_eq!(SideChoice::Unknown.side(), None);
        assert_eq!(SideChoice::from(Side::B).side(), Some(Side::B));
    }

    #[test]
    fn record_cycle_increments() {
        let mut conflict =
            Conflict::new(ConflictKind::mutual_exclusion(), ids(&["p1", "p2"]), "x").unwrap();
        assert_eq!(conflict.record_cycle(), 1);
        assert_eq!(conflict.record_cycle(), 2);
        assert!(conflict.last_updated >= conflict.first_detected);
    }

    #[test]
    fn kind_serializes_tagged() {
        let json = serde_json::to_value(ConflictKind::FieldExhausted {
            field: SpecId::from("ram"),
        })
        .unwrap();
        assert_eq!(json["type"], "field-exhausted");
        assert_eq!(json["field"], "ram");

        let side = serde_json::to_string(&Side::A).unwrap();
        assert_eq!(side, "\"option-a\"");
    }

    #[test]
    fn prompt_has_two_options() {
        let conflict =
            Conflict::new(ConflictKind::mutual_exclusion(), ids(&["p1", "p2"]), "pick").unwrap();
        let prompt = conflict.prompt();
        assert_eq!(prompt.conflict_id, conflict.id);
        assert_eq!(prompt.options[0].id, Side::A);
        assert_eq!(prompt.options[1].id, Side::B);
        assert_eq!(prompt.description, "pick");
    }

    #[test]
    fn conflict_id_round_trips_through_display() {
        let id = ConflictId::new();
        let parsed: ConflictId = id.to_string().parse().unwrap();
        assert_eq!(parsed, id);
    }
}
