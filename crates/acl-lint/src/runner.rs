//! Runs the built-in rules over a set of tree dumps.
//!
//! A [`Session`] is built once from a [`Config`]: it resolves the preset,
//! loads the additional text files used as fallback settings, and builds the
//! engine. Each call to [`Session::check`] then analyzes one compilation.

use acl_lint_core::{
    AdditionalText, ArenaTree, CancellationToken, Compilation, Config, ConfigError, Diagnostic,
    EngineError, FixProposal, LintResult, RuleEngine, RuleEngineBuilder, SettingsResolver,
    SyntacticModel, SyntaxTree, TextFileProvider, TreeDump, TreeError,
};
use acl_lint_rules::{install, Preset, UnknownPreset};
use std::path::{Path, PathBuf};
use tracing::{debug, info};

/// Errors raised while preparing or running a session.
#[derive(Debug, thiserror::Error)]
pub enum RunError {
    /// Configuration could not be read or is invalid.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The configured preset does not exist.
    #[error(transparent)]
    Preset(#[from] UnknownPreset),

    /// The engine could not be built or the pass was cancelled.
    #[error(transparent)]
    Engine(#[from] EngineError),

    /// A tree dump could not be read.
    #[error("failed to read tree dump {path}: {source}")]
    Io {
        /// Dump file.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// A tree dump is not valid JSON.
    #[error("failed to decode tree dump {path}: {source}")]
    Decode {
        /// Dump file.
        path: PathBuf,
        /// Underlying error.
        source: serde_json::Error,
    },

    /// A tree dump decodes but does not describe a well-formed tree.
    #[error("invalid tree in {path}: {source}")]
    Tree {
        /// Dump file.
        path: PathBuf,
        /// Underlying error.
        source: TreeError,
    },
}

/// Reads one JSON tree dump.
///
/// # Errors
///
/// Returns an error if the file cannot be read, decoded or built.
pub fn load_tree(path: &Path) -> Result<ArenaTree, RunError> {
    let content = std::fs::read_to_string(path).map_err(|source| RunError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    let dump: TreeDump = serde_json::from_str(&content).map_err(|source| RunError::Decode {
        path: path.to_path_buf(),
        source,
    })?;
    dump.to_tree().map_err(|source| RunError::Tree {
        path: path.to_path_buf(),
        source,
    })
}

/// Reads every dump in `paths`, in order.
///
/// # Errors
///
/// Returns the first load error.
pub fn load_trees<P: AsRef<Path>>(paths: &[P]) -> Result<Vec<ArenaTree>, RunError> {
    paths.iter().map(|p| load_tree(p.as_ref())).collect()
}

/// Resolves the preset from an explicit choice, then the config, then the default.
///
/// # Errors
///
/// Returns an error for an unknown preset name.
pub fn resolve_preset(explicit: Option<&str>, config: &Config) -> Result<Preset, UnknownPreset> {
    match explicit.or(config.preset.as_deref()) {
        Some(name) => name.parse(),
        None => Ok(Preset::default()),
    }
}

/// Builds an engine with the rules `config` selects.
///
/// # Errors
///
/// Returns an error for an unknown preset or when the engine cannot be built.
pub fn build_engine(config: &Config) -> Result<RuleEngine, RunError> {
    let preset = resolve_preset(None, config)?;
    Ok(engine_builder(config, preset).build()?)
}

fn engine_builder(config: &Config, preset: Preset) -> RuleEngineBuilder {
    install(
        RuleEngine::builder().config(config.clone()),
        preset,
        config,
    )
}

/// A configured engine plus the settings sources shared by every file.
pub struct Session {
    config: Config,
    engine: RuleEngine,
    texts: TextFileProvider,
    model: SyntacticModel,
}

impl Session {
    /// Builds a session, reading additional files relative to `base_dir`.
    ///
    /// # Errors
    ///
    /// Returns an error if an additional file cannot be read, the preset is
    /// unknown, or the engine cannot be built.
    pub fn new(config: Config, base_dir: &Path) -> Result<Self, RunError> {
        Self::with_preset(config, base_dir, None)
    }

    /// Like [`Session::new`], with a preset that takes precedence over the config.
    ///
    /// # Errors
    ///
    /// See [`Session::new`].
    pub fn with_preset(
        config: Config,
        base_dir: &Path,
        preset: Option<&str>,
    ) -> Result<Self, RunError> {
        let preset = resolve_preset(preset, &config)?;
        let engine = engine_builder(&config, preset).build()?;

        let paths: Vec<PathBuf> = config
            .analyzer
            .additional_files
            .iter()
            .map(|p| base_dir.join(p))
            .collect();
        let texts = TextFileProvider::load(&paths)?;
        let model = SyntacticModel::new(config.nullable_context());

        info!(
            preset = preset.name(),
            rules = engine.rule_count(),
            additional_files = paths.len(),
            "session ready"
        );
        Ok(Self {
            config,
            engine,
            texts,
            model,
        })
    }

    /// Replaces the additional files with in-memory texts.
    #[must_use]
    pub fn with_texts(mut self, texts: Vec<AdditionalText>) -> Self {
        self.texts = TextFileProvider::from_texts(texts);
        self
    }

    /// The session's configuration.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// The session's engine.
    #[must_use]
    pub fn engine(&self) -> &RuleEngine {
        &self.engine
    }

    /// Settings for one file: the project config, then the additional files.
    #[must_use]
    pub fn settings_for(&self, path: &Path) -> SettingsResolver {
        SettingsResolver::new(self.config.structured_provider_for(path))
            .with_fallback(self.texts.clone())
    }

    /// Analyzes `trees` as one compilation.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] (wrapped) if `cancel` fires.
    pub fn check(
        &self,
        trees: &[ArenaTree],
        cancel: &CancellationToken,
    ) -> Result<LintResult, RunError> {
        let settings = self.settings(trees);
        let compilation = self.compilation(trees, &settings);
        Ok(self.engine.analyze_compilation(&compilation, cancel)?)
    }

    /// Analyzes `trees` and pairs every diagnostic with its fix, if any.
    ///
    /// # Errors
    ///
    /// See [`Session::check`].
    pub fn fixes(
        &self,
        trees: &[ArenaTree],
        cancel: &CancellationToken,
    ) -> Result<(LintResult, Vec<(Diagnostic, FixProposal)>), RunError> {
        let settings = self.settings(trees);
        let compilation = self.compilation(trees, &settings);
        let result = self.engine.analyze_compilation(&compilation, cancel)?;

        let fixes: Vec<(Diagnostic, FixProposal)> = result
            .diagnostics
            .iter()
            .filter_map(|d| {
                self.engine
                    .propose_fix(d, &compilation)
                    .map(|fix| (d.clone(), fix))
            })
            .collect();
        debug!(
            diagnostics = result.diagnostics.len(),
            fixes = fixes.len(),
            "fixes computed"
        );
        Ok((result, fixes))
    }

    fn settings(&self, trees: &[ArenaTree]) -> Vec<SettingsResolver> {
        trees.iter().map(|t| self.settings_for(t.path())).collect()
    }

    fn compilation<'a>(
        &'a self,
        trees: &'a [ArenaTree],
        settings: &'a [SettingsResolver],
    ) -> Compilation<'a> {
        trees
            .iter()
            .zip(settings)
            .fold(Compilation::new(&self.model), |c, (tree, s)| {
                c.with_file(tree, s)
            })
    }
}
