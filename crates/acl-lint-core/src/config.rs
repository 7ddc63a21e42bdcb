//! Project configuration (`acl-lint.toml`).

use crate::semantic::NullableContext;
use crate::settings::{SettingsKey, StructuredProvider, ValueKind};
use crate::types::Severity;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Top-level configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct Config {
    /// Preset selecting the base rule set (`recommended` or `all`).
    #[serde(default)]
    pub preset: Option<String>,

    /// Diagnostics at or above this severity fail the run (default: error).
    #[serde(default)]
    pub fail_on: Option<Severity>,

    /// Input discovery and execution settings.
    #[serde(default)]
    pub analyzer: AnalyzerConfig,

    /// Compilation-wide options seen by the semantic model.
    #[serde(default)]
    pub compilation: CompilationConfig,

    /// Per-rule configuration keyed by rule id.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,

    /// Rule options that apply only to files matching a glob.
    #[serde(default)]
    pub overrides: Vec<OverrideConfig>,
}

impl Config {
    /// Creates a new default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Loads configuration from a TOML file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn from_file(path: &Path) -> Result<Self, ConfigError> {
        let content = std::fs::read_to_string(path).map_err(|e| ConfigError::Io {
            path: path.to_path_buf(),
            source: e,
        })?;
        Self::parse(&content)
    }

    /// Parses configuration from a TOML string.
    ///
    /// # Errors
    ///
    /// Returns an error if the TOML is invalid, an override glob does not
    /// compile, or an override sets `enabled` or `severity`.
    pub fn parse(content: &str) -> Result<Self, ConfigError> {
        let config: Self = toml::from_str(content).map_err(|e| ConfigError::Parse {
            message: e.to_string(),
        })?;

        for section in &config.overrides {
            section.validate()?;
        }

        Ok(config)
    }

    /// Whether a rule the preset installed stays enabled.
    ///
    /// Rules without a table, or without an `enabled` key, are enabled.
    #[must_use]
    pub fn is_rule_enabled(&self, rule_id: &str) -> bool {
        self.rules
            .get(rule_id)
            .map_or(true, |c| c.enabled.unwrap_or(true))
    }

    /// Whether the configuration explicitly switches a rule on.
    #[must_use]
    pub fn is_rule_forced_on(&self, rule_id: &str) -> bool {
        self.rules.get(rule_id).and_then(|c| c.enabled) == Some(true)
    }

    /// Gets the severity override for a rule.
    #[must_use]
    pub fn rule_severity(&self, rule_id: &str) -> Option<Severity> {
        self.rules.get(rule_id).and_then(|c| c.severity)
    }

    /// Severity threshold that fails a run.
    #[must_use]
    pub fn fail_on(&self) -> Severity {
        self.fail_on.unwrap_or(Severity::Error)
    }

    /// The compilation's nullable context option.
    #[must_use]
    pub fn nullable_context(&self) -> NullableContext {
        self.compilation.nullable
    }

    /// Builds the structured settings for one analyzed file.
    ///
    /// Rule tables come first; each `[[overrides]]` section whose globs match
    /// `path` is layered on top, later sections winning.
    #[must_use]
    pub fn structured_provider_for(&self, path: &Path) -> StructuredProvider {
        let mut provider = StructuredProvider::new();
        insert_options(&mut provider, &self.rules);

        for section in self.overrides.iter().filter(|o| o.matches(path)) {
            insert_options(&mut provider, &section.rules);
        }

        provider
    }
}

fn insert_options(provider: &mut StructuredProvider, rules: &BTreeMap<String, RuleConfig>) {
    for (rule_id, rule) in rules {
        for (name, value) in &rule.options {
            provider.insert(&SettingsKey::new(rule_id, name), option_text(value));
        }
    }
}

fn option_text(value: &toml::Value) -> String {
    match value {
        toml::Value::String(s) => s.clone(),
        other => other.to_string(),
    }
}

/// Analyzer-level configuration.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct AnalyzerConfig {
    /// Glob patterns of tree dumps to analyze (empty: every `*.tree.json`).
    #[serde(default)]
    pub include: Vec<String>,

    /// Glob patterns to exclude from analysis.
    #[serde(default = "default_exclude")]
    pub exclude: Vec<String>,

    /// Text files scanned as fallback setting sources, in priority order.
    #[serde(default)]
    pub additional_files: Vec<PathBuf>,

    /// Whether to respect .gitignore files.
    #[serde(default = "default_true")]
    pub respect_gitignore: bool,

    /// Maximum number of trees analyzed in parallel.
    #[serde(default)]
    pub parallelism: Option<usize>,
}

impl Default for AnalyzerConfig {
    fn default() -> Self {
        Self {
            include: Vec::new(),
            exclude: default_exclude(),
            additional_files: Vec::new(),
            respect_gitignore: true,
            parallelism: None,
        }
    }
}

fn default_exclude() -> Vec<String> {
    vec!["**/bin/**".to_string(), "**/obj/**".to_string()]
}

fn default_true() -> bool {
    true
}

/// Compilation options.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct CompilationConfig {
    /// Nullable reference type context.
    #[serde(default)]
    pub nullable: NullableContext,
}

/// Per-rule configuration.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RuleConfig {
    /// Whether this rule is enabled.
    #[serde(default)]
    pub enabled: Option<bool>,

    /// Severity override for this rule.
    #[serde(default)]
    pub severity: Option<Severity>,

    /// Rule settings, exposed as `dotnet_diagnostic.<id>.<name>`.
    #[serde(flatten)]
    pub options: BTreeMap<String, toml::Value>,
}

/// Settings scoped to files matching a set of globs.
///
/// Only rule options can be overridden; whether a rule runs and at what
/// severity is decided once for the whole compilation.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(deny_unknown_fields)]
pub struct OverrideConfig {
    /// Globs matched against the analyzed file path.
    pub files: Vec<String>,

    /// Rule option tables applied to matching files.
    #[serde(default)]
    pub rules: BTreeMap<String, RuleConfig>,
}

impl OverrideConfig {
    fn validate(&self) -> Result<(), ConfigError> {
        for pattern in &self.files {
            glob::Pattern::new(pattern).map_err(|e| ConfigError::Parse {
                message: format!("invalid override glob '{pattern}': {e}"),
            })?;
        }

        for (rule_id, rule) in &self.rules {
            let field = if rule.enabled.is_some() {
                "enabled"
            } else if rule.severity.is_some() {
                "severity"
            } else {
                continue;
            };
            return Err(ConfigError::Parse {
                message: format!(
                    "'{field}' cannot be overridden per file (overrides.rules.{rule_id}); \
                     set it under [rules.{rule_id}]"
                ),
            });
        }
        Ok(())
    }

    /// Whether any glob of this section matches `path`.
    #[must_use]
    pub fn matches(&self, path: &Path) -> bool {
        self.files.iter().any(|pattern| {
            glob::Pattern::new(pattern).is_ok_and(|p| p.matches_path(path))
        })
    }
}

/// Configuration errors.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    /// IO error reading a configuration file.
    #[error("Failed to read config file {path}: {source}")]
    Io {
        /// Path that failed to read.
        path: PathBuf,
        /// Underlying IO error.
        source: std::io::Error,
    },

    /// Parse error in config file.
    #[error("Failed to parse config: {message}")]
    Parse {
        /// Parse error message.
        message: String,
    },

    /// A setting was present but could not be coerced to the requested type.
    #[error("Invalid value {value:?} for {key}: expected {expected}")]
    InvalidValue {
        /// Canonical key of the setting.
        key: String,
        /// Raw value found.
        value: String,
        /// Type the caller asked for.
        expected: ValueKind,
    },
}
