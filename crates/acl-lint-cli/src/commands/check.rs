//! Check command implementation.

use anyhow::{Context, Result};
use acl_lint::rules::descriptors;
use acl_lint::{load_trees, CancellationToken, Config, RuleConfig, Session};
use ignore::overrides::OverrideBuilder;
use ignore::WalkBuilder;
use std::path::{Path, PathBuf};

use crate::config_resolver;
use crate::OutputFormat;

/// Default pattern for tree dumps when the config names none.
const DEFAULT_INCLUDE: &str = "**/*.tree.json";

/// Options of the check command.
#[derive(Debug, Clone, Default)]
pub struct CheckOptions {
    /// Output format.
    pub format: OutputFormat,
    /// Comma-separated rule ids or names to run.
    pub rules: Option<String>,
    /// Extra exclude globs.
    pub exclude: Vec<String>,
    /// Preset overriding the configured one.
    pub preset: Option<String>,
}

/// Runs the check command. Returns `true` when the run should fail.
pub fn run(paths: &[PathBuf], options: &CheckOptions, config_path: Option<&Path>) -> Result<bool> {
    let project_dir = project_dir(paths);
    let loaded = config_resolver::load(&project_dir, config_path)?;
    tracing::debug!(origin = ?loaded.origin, "Configuration loaded");
    let mut config = loaded.config;
    config.analyzer.exclude.extend(options.exclude.iter().cloned());

    let mut preset = options.preset.clone();
    if let Some(filter) = &options.rules {
        restrict_rules(&mut config, filter);
        preset = Some("all".to_string());
    }

    let files = discover(paths, &config)?;
    tracing::info!("Analyzing {} tree dump(s)", files.len());
    let trees = load_trees(&files)?;

    let session = Session::with_preset(config, &loaded.base_dir, preset.as_deref())
        .context("Failed to set up analysis")?;
    let result = session
        .check(&trees, &CancellationToken::new())
        .context("Analysis failed")?;

    super::output::print(&result, &trees, options.format)?;

    let fail_on = session.config().fail_on();
    Ok(result.has_violations_at(fail_on) || !result.faults.is_empty())
}

/// Directory used to look up the project configuration.
pub fn project_dir(paths: &[PathBuf]) -> PathBuf {
    let Some(first) = paths.first() else {
        return PathBuf::from(".");
    };
    if first.is_dir() {
        first.clone()
    } else {
        first
            .parent()
            .filter(|p| !p.as_os_str().is_empty())
            .map_or_else(|| PathBuf::from("."), Path::to_path_buf)
    }
}

/// Enables exactly the rules named in `filter` (ids or names, comma-separated).
pub fn restrict_rules(config: &mut Config, filter: &str) {
    let wanted: Vec<&str> = filter
        .split(',')
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect();

    for name in &wanted {
        if !descriptors().iter().any(|d| d.id == *name || d.name == *name) {
            tracing::warn!("Unknown rule: {}", name);
        }
    }

    for descriptor in descriptors() {
        let selected = wanted
            .iter()
            .any(|w| *w == descriptor.id || *w == descriptor.name);
        config
            .rules
            .entry(descriptor.id.to_string())
            .or_insert_with(RuleConfig::default)
            .enabled = Some(selected);
    }
}

/// Finds the tree dumps under `paths`.
///
/// Files named explicitly are always taken; directories are walked with the
/// configured include/exclude globs and `.gitignore` handling.
pub fn discover(paths: &[PathBuf], config: &Config) -> Result<Vec<PathBuf>> {
    let mut files = Vec::new();

    for path in paths {
        if path.is_file() {
            files.push(path.clone());
            continue;
        }

        let mut overrides = OverrideBuilder::new(path);
        if config.analyzer.include.is_empty() {
            overrides.add(DEFAULT_INCLUDE)?;
        }
        for pattern in &config.analyzer.include {
            overrides
                .add(pattern)
                .with_context(|| format!("Invalid include pattern: {pattern}"))?;
        }
        for pattern in &config.analyzer.exclude {
            overrides
                .add(&format!("!{pattern}"))
                .with_context(|| format!("Invalid exclude pattern: {pattern}"))?;
        }

        let walker = WalkBuilder::new(path)
            .git_ignore(config.analyzer.respect_gitignore)
            .overrides(overrides.build()?)
            .build();

        for entry in walker {
            let entry = entry.with_context(|| format!("Failed to walk {}", path.display()))?;
            if entry.file_type().is_some_and(|t| t.is_file()) {
                files.push(entry.into_path());
            }
        }
    }

    files.sort();
    files.dedup();
    tracing::debug!("Discovered {} file(s)", files.len());
    Ok(files)
}
