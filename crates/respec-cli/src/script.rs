//! Replay scripts
//!
//! A script is a list of steps, tagged by `step`:
//!
//! ```yaml
//! steps:
//!   - step: add
//!     field: fanless
//!     value: "yes"
//!   - step: resolve
//!     choice: A
//!   - step: unclear
//!   - step: status
//! ```

use anyhow::{bail, Context};
use respec_artifact::{Attribution, InsertSource};
use respec_core::SpecificationInput;
use respec_knowledge::SpecId;
use serde::Deserialize;
use std::path::Path;

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub(crate) struct Script {
    pub(crate) steps: Vec<Step>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(tag = "step", rename_all = "kebab-case")]
pub(crate) enum Step {
    Add {
        field: SpecId,
        value: serde_json::Value,
        #[serde(default)]
        source: InsertSource,
        #[serde(default)]
        attribution: Option<Attribution>,
        #[serde(default)]
        confidence: Option<f64>,
    },
    /// Answer the current question with `A`/`B`/`option-a`/`option-b`
    Resolve { choice: String },
    Unclear,
    Promote,
    Status,
}

impl Step {
    pub(crate) fn name(&self) -> &'static str {
        match self {
            Self::Add { .. } => "add",
            Self::Resolve { .. } => "resolve",
            Self::Unclear => "unclear",
            Self::Promote => "promote",
            Self::Status => "status",
        }
    }
}

/// Build the manager input for an `add` step
pub(crate) fn add_input(
    field: &SpecId,
    value: &serde_json::Value,
    attribution: Option<Attribution>,
    confidence: Option<f64>,
) -> SpecificationInput {
    let mut input = SpecificationInput::new(field.clone(), value.clone());
    if let Some(attribution) = attribution {
        input.attribution = attribution;
    }
    input.confidence = confidence;
    input
}

impl Script {
    pub(crate) fn from_yaml_str(text: &str) -> anyhow::Result<Self> {
        serde_yaml::from_str(text).context("invalid YAML script")
    }

    pub(crate) fn from_json_str(text: &str) -> anyhow::Result<Self> {
        serde_json::from_str(text).context("invalid JSON script")
    }

    pub(crate) fn from_path(path: &Path) -> anyhow::Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("failed to read script {}", path.display()))?;

        match path.extension().and_then(|ext| ext.to_str()) {
            Some("json") => Self::from_json_str(&text),
            Some("yaml" | "yml") => Self::from_yaml_str(&text),
            other => bail!(
                "unsupported script format '{}' (expected .json, .yaml or .yml)",
                other.unwrap_or("<none>")
            ),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::io::Write;

    #[test]
    fn yaml_steps_parse() {
        let script = Script::from_yaml_str(
            "steps:\n\
             - step: add\n  field: fanless\n  value: \"yes\"\n  source: extraction\n\
             - step: resolve\n  choice: B\n\
             - step: unclear\n\
             - step: status\n",
        )
        .unwrap();

        assert_eq!(script.steps.len(), 4);
        assert_eq!(
            script.steps[0],
            Step::Add {
                field: SpecId::from("fanless"),
                value: serde_json::json!("yes"),
                source: InsertSource::Extraction,
                attribution: None,
                confidence: None,
            }
        );
        assert_eq!(
            script.steps[1],
            Step::Resolve {
                choice: "B".to_string()
            }
        );
        assert_eq!(script.steps[2].name(), "unclear");
    }

    #[test]
    fn json_add_defaults_to_user_input() {
        let script = Script::from_json_str(
            r#"{"steps": [{"step": "add", "field": "ram_32", "value": 32, "attribution": "inferred", "confidence": 0.6}]}"#,
        )
        .unwrap();

        let Step::Add {
            field,
            value,
            source,
            attribution,
            confidence,
        } = &script.steps[0]
        else {
            panic!("expected add step");
        };
        assert_eq!(*source, InsertSource::UserInput);

        let input = add_input(field, value, *attribution, *confidence);
        assert_eq!(input.attribution, Attribution::Inferred);
        assert_eq!(input.confidence, Some(0.6));
        assert_eq!(input.value, serde_json::json!(32));
    }

    #[test]
    fn unknown_step_rejected() {
        assert!(Script::from_yaml_str("steps:\n- step: undo\n").is_err());
    }

    #[test]
    fn loads_by_extension() {
        let mut file = tempfile::Builder::new().suffix(".yml").tempfile().unwrap();
        writeln!(file, "steps:\n- step: status").unwrap();
        let script = Script::from_path(file.path()).unwrap();
        assert_eq!(script.steps, vec![Step::Status]);

        let other = tempfile::Builder::new().suffix(".txt").tempfile().unwrap();
        let err = Script::from_path(other.path()).unwrap_err();
        assert!(err.to_string().contains("unsupported script format"));
    }
}
