use super::{ConfigurationSource, SettingsKey};
use crate::config::ConfigError;
use std::collections::BTreeMap;
use std::path::{Path, PathBuf};

/// Keyed per-file configuration map.
///
/// Populated from the `[rules.<id>]` tables of `acl-lint.toml` plus any
/// `[[overrides]]` whose globs match the file being analyzed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct StructuredProvider {
    values: BTreeMap<SettingsKey, String>,
}

impl StructuredProvider {
    /// Creates an empty provider.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Sets (or replaces) the value for `key`.
    pub fn insert(&mut self, key: &SettingsKey, value: impl Into<String>) {
        self.values.insert(key.clone(), value.into());
    }

    /// Builder form of [`insert`](Self::insert).
    #[must_use]
    pub fn with(mut self, key: &SettingsKey, value: impl Into<String>) -> Self {
        self.insert(key, value);
        self
    }

    /// Returns `true` if no values are set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

impl ConfigurationSource for StructuredProvider {
    fn lookup(&self, key: &SettingsKey) -> Option<String> {
        self.values.get(key).cloned()
    }

    fn describe(&self) -> String {
        format!("structured config ({} values)", self.values.len())
    }
}

/// An auxiliary text file handed to the analyzer alongside the sources.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdditionalText {
    path: PathBuf,
    content: String,
}

impl AdditionalText {
    /// Wraps in-memory content.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>, content: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            content: content.into(),
        }
    }

    /// Reads a file from disk.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::Io`] if the file cannot be read.
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ConfigError> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Ok(Self::new(path, content))
    }

    /// Path the text was loaded from.
    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    /// Raw content.
    #[must_use]
    pub fn content(&self) -> &str {
        &self.content
    }

    /// Value of the first line starting with `prefix`, if that line has an `=`.
    fn find(&self, prefix: &str) -> Option<String> {
        let line = self
            .content
            .lines()
            .map(str::trim)
            .find(|line| line.starts_with(prefix))?;
        let (_, value) = line.split_once('=')?;
        Some(value.trim().to_string())
    }
}

/// Scans `key = value` lines of auxiliary text files.
///
/// A line matches when, trimmed, it starts with the key's canonical string.
/// The first file with a match answers; a matching line without `=` counts as
/// no value for that file.
#[derive(Debug, Clone, Default)]
pub struct TextFileProvider {
    texts: Vec<AdditionalText>,
}

impl TextFileProvider {
    /// Creates a provider over already-loaded texts, in priority order.
    #[must_use]
    pub fn from_texts(texts: Vec<AdditionalText>) -> Self {
        Self { texts }
    }

    /// Loads every path in order.
    ///
    /// # Errors
    ///
    /// Fails on the first unreadable file.
    pub fn load<P: AsRef<Path>>(paths: &[P]) -> Result<Self, ConfigError> {
        let texts = paths
            .iter()
            .map(AdditionalText::load)
            .collect::<Result<Vec<_>, _>>()?;
        Ok(Self::from_texts(texts))
    }

    /// Files scanned by this provider.
    #[must_use]
    pub fn texts(&self) -> &[AdditionalText] {
        &self.texts
    }
}

impl ConfigurationSource for TextFileProvider {
    fn lookup(&self, key: &SettingsKey) -> Option<String> {
        let prefix = key.canonical();
        self.texts.iter().find_map(|text| text.find(&prefix))
    }

    fn describe(&self) -> String {
        let paths: Vec<_> = self
            .texts
            .iter()
            .map(|t| t.path.display().to_string())
            .collect();
        format!("text files [{}]", paths.join(", "))
    }
}
