//! Fix command implementation.
//!
//! Proposals are printed, never applied: the dumps are compiler output and the
//! host owns the edit.

use acl_lint::{load_trees, CancellationToken, Diagnostic, FixProposal, Session};
use anyhow::{Context, Result};
use serde::Serialize;
use std::path::{Path, PathBuf};

use super::check::{discover, project_dir};
use crate::config_resolver;
use crate::FixFormat;

#[derive(Serialize)]
struct FixEntry<'a> {
    diagnostic: &'a Diagnostic,
    fix: &'a FixProposal,
}

/// Runs the fix command.
pub fn run(paths: &[PathBuf], format: FixFormat, config_path: Option<&Path>) -> Result<()> {
    let project_dir = project_dir(paths);
    let loaded = config_resolver::load(&project_dir, config_path)?;
    let config = loaded.config;

    let files = discover(paths, &config)?;
    let trees = load_trees(&files)?;
    let session = Session::new(config, &loaded.base_dir).context("Failed to set up analysis")?;
    let (result, fixes) = session
        .fixes(&trees, &CancellationToken::new())
        .context("Analysis failed")?;

    match format {
        FixFormat::Text => {
            print!("{}", render_text(&fixes));
            println!(
                "{} fix(es) for {} diagnostic(s)",
                fixes.len(),
                result.diagnostics.len()
            );
        }
        FixFormat::Json => println!("{}", render_json(&fixes)?),
    }
    Ok(())
}

fn render_text(fixes: &[(Diagnostic, FixProposal)]) -> String {
    fixes
        .iter()
        .map(|(diagnostic, fix)| format!("{}: {fix}\n", diagnostic.location))
        .collect()
}

fn render_json(fixes: &[(Diagnostic, FixProposal)]) -> Result<String> {
    let entries: Vec<FixEntry<'_>> = fixes
        .iter()
        .map(|(diagnostic, fix)| FixEntry { diagnostic, fix })
        .collect();
    Ok(serde_json::to_string_pretty(&entries)?)
}
