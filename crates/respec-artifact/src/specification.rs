//! Specification leaf records
//!
//! A [`Specification`] is one resolved `(field, value)` choice together with
//! how it was obtained.

use chrono::{DateTime, Utc};
use respec_knowledge::SpecId;
use serde::{Deserialize, Serialize};

/// Leaf choice held by exactly one artifact tree
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Specification {
    /// Stable identifier (the field name)
    pub id: SpecId,

    /// Display name
    pub name: String,

    /// Opaque value (string, number, bool...)
    pub value: serde_json::Value,

    /// Whether the user said it or it was inferred
    pub attribution: Attribution,

    /// Confidence in `0.0..=1.0`
    pub confidence: f64,

    /// What the user originally asked for, when the value was substituted
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub original_request: Option<String>,

    /// Why the value differs from the original request
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub substitution_note: Option<String>,

    /// When the choice was recorded
    pub timestamp: DateTime<Utc>,
}

impl Specification {
    /// Create user-stated specification with full confidence
    #[must_use]
    pub fn new(
        id: impl Into<SpecId>,
        name: impl Into<String>,
        value: impl Into<serde_json::Value>,
    ) -> Self {
        Self {
            id: id.into(),
            name: name.into(),
            value: value.into(),
            attribution: Attribution::UserStated,
            confidence: 1.0,
            original_request: None,
            substitution_note: None,
            timestamp: Utc::now(),
        }
    }

    /// With attribution
    #[inline]
    #[must_use]
    pub fn with_attribution(mut self, attribution: Attribution) -> Self {
        self.attribution = attribution;
        self
    }

    /// With confidence (clamped into `0.0..=1.0`, NaN becomes 0)
    #[inline]
    #[must_use]
    pub fn with_confidence(mut self, confidence: f64) -> Self {
        self.confidence = if confidence.is_nan() {
            0.0
        } else {
            confidence.clamp(0.0, 1.0)
        };
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

    /// With explicit timestamp
    #[inline]
    #[must_use]
    pub fn with_timestamp(mut self, timestamp: DateTime<Utc>) -> Self {
        self.timestamp = timestamp;
        self
    }

    /// Check if the stored value replaced what the user asked for
    #[inline]
    #[must_use]
    pub fn is_substituted(&self) -> bool {
        self.substitution_note.is_some()
    }

    /// Value rendered for prompts (strings without quotes)
    #[must_use]
    pub fn display_value(&self) -> String {
        match &self.value {
            serde_json::Value::String(s) => s.clone(),
            other => other.to_string(),
        }
    }
}

/// Origin of a specification value
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Attribution {
    /// Stated explicitly by the user
    UserStated,

    /// Inferred from context
    Inferred,
}

/// Why a specification is being inserted
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum InsertSource {
    /// Direct user input (form or confirmed answer)
    #[default]
    UserInput,

    /// Extracted from a conversational message
    Extraction,

    /// Inferred by the assistant
    Inference,

    /// Written while applying a conflict decision
    ConflictResolution,
}

impl InsertSource {
    /// Inserts from conflict resolution are not queued for re-detection
    #[inline]
    #[must_use]
    pub fn bypasses_validation(self) -> bool {
        matches!(self, Self::ConflictResolution)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn defaults_to_user_stated() {
        let spec = Specification::new("cpu", "CPU", "i7");
        assert_eq!(spec.attribution, Attribution::UserStated);
        assert!((spec.confidence - 1.0).abs() < f64::EPSILON);
        assert!(!spec.is_substituted());
    }

    #[test]
    fn confidence_is_clamped() {
        let spec = Specification::new("cpu", "CPU", "i7").with_confidence(1.7);
        assert!((spec.confidence - 1.0).abs() < f64::EPSILON);

        let spec = Specification::new("cpu", "CPU", "i7").with_confidence(-0.2);
        assert!(spec.confidence.abs() < f64::EPSILON);

        let spec = Specification::new("cpu", "CPU", "i7").with_confidence(f64::NAN);
        assert!(spec.confidence.abs() < f64::EPSILON);
    }

    #[test]
    fn substitution_recorded() {
        let spec = Specification::new("ram", "Memory", 32)
            .with_substitution("24 GB", "24 GB is not offered; rounded up");
        assert!(spec.is_substituted());
        assert_eq!(spec.original_request.as_deref(), Some("24 GB"));
    }

    #[test]
    fn display_value_unquotes_strings() {
        assert_eq!(Specification::new("cpu", "CPU", "i7").display_value(), "i7");
        assert_eq!(Specification::new("ram", "RAM", 16).display_value(), "16");
    }

    #[test]
    fn serde_uses_kebab_case_enums() {
        let json = serde_json::to_string(&Attribution::UserStated).unwrap();
        assert_eq!(json, "\"user-stated\"");
        let source: InsertSource = serde_json::from_str("\"conflict-resolution\"").unwrap();
        assert!(source.bypasses_validation());
        assert!(!InsertSource::Extraction.bypasses_validation());
    }
}
