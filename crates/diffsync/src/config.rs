//! Strategy configuration: loading, validation, and the version-column matcher.

use std::path::Path;

use regex::{Regex, RegexBuilder};
use serde::{Deserialize, Serialize};

use crate::error::{Result, SyncError};

fn default_max_batch_size() -> usize {
    100
}

/// Tuning knobs recognized by the differential strategy.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SyncConfig {
    /// Cursor fetch size applied to both SELECTs. 0 keeps the driver default.
    #[serde(default)]
    pub fetch_size: u32,

    /// DML flush bound. Must be at least 1 (default: 100).
    #[serde(default = "default_max_batch_size")]
    pub max_batch_size: usize,

    /// Case-insensitive pattern selecting the version column, when configured.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub version_pattern: Option<String>,
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            fetch_size: 0,
            max_batch_size: default_max_batch_size(),
            version_pattern: None,
        }
    }
}

impl SyncConfig {
    /// Load configuration from a file.
    ///
    /// Automatically detects the format based on file extension:
    /// - `.json` files are parsed as JSON
    /// - `.yaml` or `.yml` files are parsed as YAML
    /// - Other extensions default to YAML
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)?;

        let extension = path
            .extension()
            .and_then(|ext| ext.to_str())
            .map(|ext| ext.to_lowercase());

        match extension.as_deref() {
            Some("json") => Self::from_json(&content),
            _ => Self::from_yaml(&content),
        }
    }

    /// Parse configuration from a YAML string.
    pub fn from_yaml(yaml: &str) -> Result<Self> {
        let config: SyncConfig = serde_yaml::from_str(yaml)?;
        config.validate()?;
        Ok(config)
    }

    /// Parse configuration from a JSON string.
    pub fn from_json(json: &str) -> Result<Self> {
        let config: SyncConfig = serde_json::from_str(json)
            .map_err(|e| SyncError::Config(format!("Failed to parse JSON config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.max_batch_size < 1 {
            return Err(SyncError::Config(
                "max_batch_size must be at least 1".to_string(),
            ));
        }
        if let Some(pattern) = &self.version_pattern {
            VersionMatcher::new(pattern)?;
        }
        Ok(())
    }

    /// Set the cursor fetch size.
    #[must_use]
    pub fn with_fetch_size(mut self, fetch_size: u32) -> Self {
        self.fetch_size = fetch_size;
        self
    }

    /// Set the DML flush bound.
    #[must_use]
    pub fn with_max_batch_size(mut self, max_batch_size: usize) -> Self {
        self.max_batch_size = max_batch_size;
        self
    }

    /// Set the version-column pattern.
    #[must_use]
    pub fn with_version_pattern(mut self, pattern: impl Into<String>) -> Self {
        self.version_pattern = Some(pattern.into());
        self
    }

    /// Compile the configured version pattern, if any.
    pub fn version_matcher(&self) -> Result<Option<VersionMatcher>> {
        self.version_pattern
            .as_deref()
            .map(VersionMatcher::new)
            .transpose()
    }
}

/// Compiled, case-insensitive matcher for version column names.
///
/// A column is a version candidate only when the whole name matches, so a
/// pattern like `rev` does not pick up `revision_note`.
#[derive(Debug, Clone)]
pub struct VersionMatcher {
    regex: Regex,
}

impl VersionMatcher {
    /// Compile a pattern, rejecting invalid syntax as a configuration error.
    pub fn new(pattern: &str) -> Result<Self> {
        let regex = RegexBuilder::new(pattern)
            .case_insensitive(true)
            .build()
            .map_err(|e| {
                SyncError::Config(format!("invalid version pattern {:?}: {}", pattern, e))
            })?;
        Ok(Self { regex })
    }

    /// Whether the whole column name matches the pattern.
    #[must_use]
    pub fn matches(&self, column: &str) -> bool {
        self.regex
            .find(column)
            .is_some_and(|m| m.start() == 0 && m.end() == column.len())
    }

    /// The pattern this matcher was built from.
    #[must_use]
    pub fn pattern(&self) -> &str {
        self.regex.as_str()
    }
}
