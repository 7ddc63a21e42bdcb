//! Locates and loads `acl-lint.toml` for a run.
//!
//! The first of these wins:
//!
//! 1. the `--config` path,
//! 2. `acl-lint.toml` or `.acl-lint.toml` in the project directory,
//! 3. `config.toml` in the user directory (`$ACL_LINT_CONFIG_DIR`, else `~/.acl-lint`).
//!
//! With none of them the built-in defaults apply. Relative
//! `analyzer.additional_files` entries are anchored to the directory of the
//! file they were read from, so a user-level config can name its own
//! `.globalconfig` regardless of where the run starts.

use acl_lint::Config;
use anyhow::Context;
use std::path::{Path, PathBuf};

/// Project-level file names, checked in order.
const PROJECT_FILES: &[&str] = &["acl-lint.toml", ".acl-lint.toml"];

/// File name inside the user directory.
const USER_FILE: &str = "config.toml";

/// Where the configuration of a run came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Origin {
    /// `--config`.
    Flag,
    /// The project directory.
    Project,
    /// The user directory.
    User,
    /// No file; built-in defaults.
    Builtin,
}

/// Configuration ready for a session.
#[derive(Debug)]
pub struct LoadedConfig {
    /// Parsed configuration with additional files anchored.
    pub config: Config,
    /// Which lookup step produced it.
    pub origin: Origin,
    /// Directory the session resolves remaining relative paths against.
    pub base_dir: PathBuf,
}

/// Loads the configuration for a run rooted at `project_dir`.
///
/// # Errors
///
/// Returns an error if the chosen file cannot be read or parsed. A `--config`
/// path that does not exist is an error, not a fall-through.
pub fn load(project_dir: &Path, explicit: Option<&Path>) -> anyhow::Result<LoadedConfig> {
    load_from(project_dir, explicit, user_dir().as_deref())
}

fn load_from(
    project_dir: &Path,
    explicit: Option<&Path>,
    user_dir: Option<&Path>,
) -> anyhow::Result<LoadedConfig> {
    let Some((origin, file)) = locate(project_dir, explicit, user_dir) else {
        tracing::debug!("No configuration file, using defaults");
        return Ok(LoadedConfig {
            config: Config::default(),
            origin: Origin::Builtin,
            base_dir: project_dir.to_path_buf(),
        });
    };

    let mut config = Config::from_file(&file)
        .with_context(|| format!("Failed to load config: {}", file.display()))?;
    let base_dir = file
        .parent()
        .filter(|p| !p.as_os_str().is_empty())
        .map_or_else(|| project_dir.to_path_buf(), Path::to_path_buf);
    anchor_additional_files(&mut config, &base_dir);

    if origin == Origin::User {
        tracing::info!("Using user config: {}", file.display());
    } else {
        tracing::debug!("Using config: {}", file.display());
    }
    Ok(LoadedConfig {
        config,
        origin,
        base_dir,
    })
}

fn locate(
    project_dir: &Path,
    explicit: Option<&Path>,
    user_dir: Option<&Path>,
) -> Option<(Origin, PathBuf)> {
    if let Some(path) = explicit {
        return Some((Origin::Flag, path.to_path_buf()));
    }
    PROJECT_FILES
        .iter()
        .map(|name| project_dir.join(name))
        .find(|p| p.is_file())
        .map(|p| (Origin::Project, p))
        .or_else(|| {
            user_dir
                .map(|dir| dir.join(USER_FILE))
                .filter(|p| p.is_file())
                .map(|p| (Origin::User, p))
        })
}

fn anchor_additional_files(config: &mut Config, base_dir: &Path) {
    for path in &mut config.analyzer.additional_files {
        if path.is_relative() {
            *path = base_dir.join(&*path);
        }
    }
}

fn user_dir() -> Option<PathBuf> {
    std::env::var_os("ACL_LINT_CONFIG_DIR")
        .map(PathBuf::from)
        .or_else(|| home::home_dir().map(|h| h.join(".acl-lint")))
}
