//! Setting resolution.
//!
//! A [`SettingsResolver`] answers "what value applies to this rule setting for
//! this file" by consulting one [`StructuredProvider`] and then an ordered chain
//! of fallback sources (usually [`TextFileProvider`]s). The first source with a
//! value wins; nothing is cached, so every query walks the chain afresh.
//!
//! Typed lookups fail hard on malformed values: a setting that says
//! `max_where_clauses = abc` is a configuration bug, not a reason to quietly
//! fall back to the default.

mod overrides;
mod providers;

pub use overrides::{nearest_override, SiteOverride};
pub use providers::{AdditionalText, StructuredProvider, TextFileProvider};

use crate::config::ConfigError;
use serde::{Deserialize, Serialize};
use tracing::trace;

/// Namespace prefix of canonical setting keys.
pub const KEY_PREFIX: &str = "dotnet_diagnostic";

/// Identifies one configurable value: a rule id plus a setting name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct SettingsKey {
    /// Rule id, e.g. `ACL1003`. Case-sensitive.
    pub rule_id: String,
    /// Setting name in lower snake case, e.g. `max_where_clauses`.
    pub name: String,
}

impl SettingsKey {
    /// Creates a key.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, name: impl Into<String>) -> Self {
        Self {
            rule_id: rule_id.into(),
            name: name.into(),
        }
    }

    /// Renders `dotnet_diagnostic.<rule_id>.<name>`.
    #[must_use]
    pub fn canonical(&self) -> String {
        format!("{KEY_PREFIX}.{}.{}", self.rule_id, self.name)
    }
}

impl std::fmt::Display for SettingsKey {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{KEY_PREFIX}.{}.{}", self.rule_id, self.name)
    }
}

/// Type a textual setting is coerced to.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ValueKind {
    /// Signed integer.
    Integer,
    /// `true` / `false`.
    Boolean,
}

impl std::fmt::Display for ValueKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Integer => write!(f, "an integer"),
            Self::Boolean => write!(f, "a boolean"),
        }
    }
}

/// A place configuration values can come from.
pub trait ConfigurationSource: Send + Sync {
    /// Returns the raw value for `key`, or `None` when this source has no match.
    fn lookup(&self, key: &SettingsKey) -> Option<String>;

    /// Short human-readable label used in logs.
    fn describe(&self) -> String;
}

/// Resolves rule settings for one file.
///
/// Built once per analyzed file and never mutated afterwards, so it can be
/// shared by every rule invocation on that file, across threads.
pub struct SettingsResolver {
    structured: StructuredProvider,
    fallbacks: Vec<Box<dyn ConfigurationSource>>,
}

impl Default for SettingsResolver {
    fn default() -> Self {
        Self::new(StructuredProvider::default())
    }
}

impl std::fmt::Debug for SettingsResolver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SettingsResolver")
            .field("structured", &self.structured)
            .field(
                "fallbacks",
                &self.fallbacks.iter().map(|s| s.describe()).collect::<Vec<_>>(),
            )
            .finish()
    }
}

impl SettingsResolver {
    /// Creates a resolver with no fallback sources.
    #[must_use]
    pub fn new(structured: StructuredProvider) -> Self {
        Self {
            structured,
            fallbacks: Vec::new(),
        }
    }

    /// Appends a fallback source; sources are consulted in registration order.
    #[must_use]
    pub fn with_fallback(mut self, source: impl ConfigurationSource + 'static) -> Self {
        self.fallbacks.push(Box::new(source));
        self
    }

    /// Appends a boxed fallback source.
    #[must_use]
    pub fn with_fallback_box(mut self, source: Box<dyn ConfigurationSource>) -> Self {
        self.fallbacks.push(source);
        self
    }

    /// Number of fallback sources.
    #[must_use]
    pub fn fallback_count(&self) -> usize {
        self.fallbacks.len()
    }

    /// Resolves the raw string value of `key`.
    ///
    /// The structured provider short-circuits the chain; otherwise the first
    /// fallback with a value wins. `None` means no source knows the key.
    #[must_use]
    pub fn resolve_string(&self, key: &SettingsKey) -> Option<String> {
        if let Some(value) = self.structured.lookup(key) {
            trace!("{key} = {value:?} (from {})", self.structured.describe());
            return Some(value);
        }

        for source in &self.fallbacks {
            if let Some(value) = source.lookup(key) {
                trace!("{key} = {value:?} (from {})", source.describe());
                return Some(value);
            }
        }

        trace!("{key} is not configured");
        None
    }

    /// Resolves `key` as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a value exists but is not an
    /// integer.
    pub fn resolve_int(&self, key: &SettingsKey) -> Result<Option<i64>, ConfigError> {
        self.resolve_string(key)
            .map(|value| parse_int(key, &value))
            .transpose()
    }

    /// Resolves `key` as a boolean (`true`/`false`, any case).
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] if a value exists but is not a
    /// boolean.
    pub fn resolve_bool(&self, key: &SettingsKey) -> Result<Option<bool>, ConfigError> {
        self.resolve_string(key)
            .map(|value| parse_bool(key, &value))
            .transpose()
    }
}

/// Coerces a raw setting to an integer.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] naming the key and expected type.
pub fn parse_int(key: &SettingsKey, value: &str) -> Result<i64, ConfigError> {
    value
        .trim()
        .parse::<i64>()
        .map_err(|_| invalid(key, value, ValueKind::Integer))
}

/// Coerces a raw setting to a boolean.
///
/// # Errors
///
/// Returns [`ConfigError::InvalidValue`] naming the key and expected type.
pub fn parse_bool(key: &SettingsKey, value: &str) -> Result<bool, ConfigError> {
    let trimmed = value.trim();
    if trimmed.eq_ignore_ascii_case("true") {
        Ok(true)
    } else if trimmed.eq_ignore_ascii_case("false") {
        Ok(false)
    } else {
        Err(invalid(key, value, ValueKind::Boolean))
    }
}

fn invalid(key: &SettingsKey, value: &str, expected: ValueKind) -> ConfigError {
    ConfigError::InvalidValue {
        key: key.canonical(),
        value: value.to_string(),
        expected,
    }
}
