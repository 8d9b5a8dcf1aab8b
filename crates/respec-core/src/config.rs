//! Engine configuration

use crate::error::ConfigError;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Artifact engine configuration
///
/// Every field has a default, so an empty TOML document is valid.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    /// Promote unblocked candidates right after each add
    ///
    /// Off by default: candidates reach canonical only through a resolution
    /// or an explicit promote call.
    pub promote_on_add: bool,

    /// Unclear replies tolerated before a conflict needs escalation
    pub max_clarification_cycles: u32,

    /// Confidence recorded when the input carries none
    pub default_confidence: f64,

    /// Report dependency cascades besides plain exclusions
    pub dependency_cascades: bool,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            promote_on_add: false,
            max_clarification_cycles: 3,
            default_confidence: 1.0,
            dependency_cascades: true,
        }
    }
}

impl EngineConfig {
    /// Create default configuration
    #[inline]
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// With auto-promotion toggled
    #[inline]
    #[must_use]
    pub fn with_promote_on_add(mut self, enabled: bool) -> Self {
        self.promote_on_add = enabled;
        self
    }

    /// With escalation threshold
    #[inline]
    #[must_use]
    pub fn with_max_clarification_cycles(mut self, cycles: u32) -> Self {
        self.max_clarification_cycles = cycles;
        self
    }

    /// With default confidence
    #[inline]
    #[must_use]
    pub fn with_default_confidence(mut self, confidence: f64) -> Self {
        self.default_confidence = confidence;
        self
    }

    /// With dependency cascade detection toggled
    #[inline]
    #[must_use]
    pub fn with_dependency_cascades(mut self, enabled: bool) -> Self {
        self.dependency_cascades = enabled;
        self
    }

    /// Parse from TOML
    ///
    /// # Errors
    /// Syntax errors, unknown value types or out-of-range values.
    pub fn from_toml_str(input: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(input)?;
        config.validate()?;
        Ok(config)
    }

    /// Load from a TOML file
    ///
    /// # Errors
    /// I/O failures and everything [`EngineConfig::from_toml_str`] rejects.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let input = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        let config = Self::from_toml_str(&input)?;
        tracing::debug!(path = %path.display(), ?config, "engine configuration loaded");
        Ok(config)
    }

    /// Check value ranges
    ///
    /// # Errors
    /// `default_confidence` outside `0.0..=1.0`.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if !(0.0..=1.0).contains(&self.default_confidence) {
            return Err(ConfigError::InvalidValue {
                field: "default_confidence",
                reason: format!("{} is not within 0.0..=1.0", self.default_confidence),
            });
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults() {
        let config = EngineConfig::default();
        assert!(!config.promote_on_add);
        assert_eq!(config.max_clarification_cycles, 3);
        assert!(config.dependency_cascades);
    }

    #[test]
    fn empty_toml_is_default() {
        assert_eq!(EngineConfig::from_toml_str("").unwrap(), EngineConfig::default());
    }

    #[test]
    fn partial_toml_overrides() {
        let config = EngineConfig::from_toml_str(
            "promote_on_add = true\nmax_clarification_cycles = 5\n",
        )
        .unwrap();
        assert!(config.promote_on_add);
        assert_eq!(config.max_clarification_cycles, 5);
        assert!((config.default_confidence - 1.0).abs() < f64::EPSILON);
    }

    #[test]
    fn out_of_range_confidence_rejected() {
        let err = EngineConfig::from_toml_str("default_confidence = 1.5").unwrap_err();
        assert!(matches!(err, ConfigError::InvalidValue { field: "default_confidence", .. }));
    }

    #[test]
    fn wrong_type_rejected() {
        assert!(matches!(
            EngineConfig::from_toml_str("promote_on_add = \"yes\""),
            Err(ConfigError::Toml(_))
        ));
    }

    #[test]
    fn load_from_file() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "max_clarification_cycles = 1").unwrap();
        let config = EngineConfig::load(file.path()).unwrap();
        assert_eq!(config.max_clarification_cycles, 1);
    }

    #[test]
    fn missing_file_is_io_error() {
        let err = EngineConfig::load("/nonexistent/respec.toml").unwrap_err();
        assert!(matches!(err, ConfigError::Io { .. }));
    }

    #[test]
    fn builder_chain() {
        let config = EngineConfig::new()
            .with_promote_on_add(true)
            .with_max_clarification_cycles(7)
            .with_default_confidence(0.5)
            .with_dependency_cascades(false);
        assert!(config.promote_on_add);
        assert_eq!(config.max_clarification_cycles, 7);
        assert!(!config.dependency_cascades);
    }
}
