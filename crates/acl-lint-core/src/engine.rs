//! Rule engine: registration, dispatch and fault isolation.

use crate::cancel::CancellationToken;
use crate::config::{Config, ConfigError};
use crate::context::{Compilation, CompilationContext, FileScope, RuleContext};
use crate::fix::{FixProposal, FixRequest};
use crate::rule::{CompilationRule, CompilationRuleBox, Rule, RuleBox};
use crate::syntax::{SyntaxKind, SyntaxNode};
use crate::types::{Diagnostic, LintResult, Location, RuleDescriptor, RuleFault, Severity};

use rayon::prelude::*;
use std::collections::HashMap;
use std::panic::{catch_unwind, AssertUnwindSafe};
use thiserror::Error;
use tracing::{debug, info, warn};

/// Errors that abort an analysis.
#[derive(Debug, Error)]
pub enum EngineError {
    /// The cancellation token fired.
    #[error("Analysis was cancelled")]
    Cancelled,

    /// Configuration error.
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    /// Two rules share an id.
    #[error("Rule {0} is registered twice")]
    DuplicateRule(String),

    /// The worker pool could not be created.
    #[error("Failed to build thread pool: {0}")]
    ThreadPool(String),
}

struct NodeRegistration {
    rule: RuleBox,
    severity: Severity,
}

struct CompilationRegistration {
    rule: CompilationRuleBox,
    severity: Severity,
}

/// Builder for configuring a [`RuleEngine`].
#[derive(Default)]
pub struct RuleEngineBuilder {
    rules: Vec<(RuleBox, Option<Vec<SyntaxKind>>)>,
    compilation_rules: Vec<CompilationRuleBox>,
    config: Option<Config>,
    parallelism: Option<usize>,
}

impl RuleEngineBuilder {
    /// Creates a new builder with default settings.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Adds a node rule, dispatched on the kinds it declares.
    #[must_use]
    pub fn rule<R: Rule + 'static>(mut self, rule: R) -> Self {
        self.rules.push((Box::new(rule), None));
        self
    }

    /// Adds a boxed node rule.
    #[must_use]
    pub fn rule_box(mut self, rule: RuleBox) -> Self {
        self.rules.push((rule, None));
        self
    }

    /// Adds a node rule dispatched on `kinds` instead of its declared kinds.
    #[must_use]
    pub fn rule_for<R: Rule + 'static>(mut self, rule: R, kinds: &[SyntaxKind]) -> Self {
        self.rules.push((Box::new(rule), Some(kinds.to_vec())));
        self
    }

    /// Adds a compilation rule.
    #[must_use]
    pub fn compilation_rule<R: CompilationRule + 'static>(mut self, rule: R) -> Self {
        self.compilation_rules.push(Box::new(rule));
        self
    }

    /// Adds a boxed compilation rule.
    #[must_use]
    pub fn compilation_rule_box(mut self, rule: CompilationRuleBox) -> Self {
        self.compilation_rules.push(rule);
        self
    }

    /// Sets the configuration used for enablement and severity overrides.
    #[must_use]
    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    /// Caps the number of worker threads (default: the config's value, else rayon's).
    #[must_use]
    pub fn parallelism(mut self, threads: usize) -> Self {
        self.parallelism = Some(threads);
        self
    }

    /// Builds the engine.
    ///
    /// # Errors
    ///
    /// Returns an error if two rules share an id or the thread pool cannot be
    /// created.
    pub fn build(self) -> Result<RuleEngine, EngineError> {
        let config = self.config.unwrap_or_default();
        let parallelism = self.parallelism.or(config.analyzer.parallelism);

        let mut engine = RuleEngine::with_config(config);
        if let Some(threads) = parallelism {
            let pool = rayon::ThreadPoolBuilder::new()
                .num_threads(threads)
                .build()
                .map_err(|e| EngineError::ThreadPool(e.to_string()))?;
            engine.pool = Some(pool);
        }

        for (rule, kinds) in self.rules {
            match kinds {
                Some(kinds) => engine.register_box_for(rule, &kinds)?,
                None => engine.register_box(rule)?,
            }
        }
        for rule in self.compilation_rules {
            engine.register_compilation_rule_box(rule)?;
        }

        Ok(engine)
    }
}

/// Diagnostics and faults accumulated by one analysis pass.
///
/// Owned by the pass; nothing is shared between passes.
#[derive(Debug)]
pub struct AnalysisPass {
    cancel: CancellationToken,
    diagnostics: Vec<Diagnostic>,
    faults: Vec<RuleFault>,
}

impl AnalysisPass {
    /// Starts a pass observing `cancel`.
    #[must_use]
    pub fn new(cancel: CancellationToken) -> Self {
        Self {
            cancel,
            diagnostics: Vec::new(),
            faults: Vec::new(),
        }
    }

    /// Diagnostics collected so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Faults collected so far.
    #[must_use]
    pub fn faults(&self) -> &[RuleFault] {
        &self.faults
    }

    /// Converts the pass into a result covering `files_checked` trees.
    #[must_use]
    pub fn into_result(self, files_checked: usize) -> LintResult {
        LintResult {
            diagnostics: self.diagnostics,
            faults: self.faults,
            files_checked,
        }
    }

    fn check_cancelled(&self) -> Result<(), EngineError> {
        if self.cancel.is_cancelled() {
            Err(EngineError::Cancelled)
        } else {
            Ok(())
        }
    }

    fn fault(&mut self, descriptor: &RuleDescriptor, location: Option<Location>, message: String) {
        match &location {
            Some(at) => warn!("Rule {} failed at {}: {}", descriptor.id, at, message),
            None => warn!("Rule {} failed: {}", descriptor.id, message),
        }
        self.faults.push(RuleFault {
            rule_id: descriptor.id.to_string(),
            location,
            message,
        });
    }
}

/// Registry of rules and the dispatcher that runs them.
///
/// Use [`RuleEngine::builder()`] to construct an instance, or
/// [`RuleEngine::new`] and the `register*` methods.
pub struct RuleEngine {
    config: Config,
    rules: Vec<NodeRegistration>,
    by_kind: HashMap<SyntaxKind, Vec<usize>>,
    compilation_rules: Vec<CompilationRegistration>,
    pool: Option<rayon::ThreadPool>,
}

impl Default for RuleEngine {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleEngine {
    /// Creates a new builder for configuring an engine.
    #[must_use]
    pub fn builder() -> RuleEngineBuilder {
        RuleEngineBuilder::new()
    }

    /// Creates an empty engine with the default configuration.
    #[must_use]
    pub fn new() -> Self {
        Self::with_config(Config::default())
    }

    /// Creates an empty engine using `config` for enablement and severity.
    #[must_use]
    pub fn with_config(config: Config) -> Self {
        Self {
            config,
            rules: Vec::new(),
            by_kind: HashMap::new(),
            compilation_rules: Vec::new(),
            pool: None,
        }
    }

    /// Registers a node rule on the kinds it declares.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateRule`] if the id is taken.
    pub fn register<R: Rule + 'static>(&mut self, rule: R) -> Result<(), EngineError> {
        self.register_box(Box::new(rule))
    }

    /// Registers a boxed node rule on the kinds it declares.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateRule`] if the id is taken.
    pub fn register_box(&mut self, rule: RuleBox) -> Result<(), EngineError> {
        let kinds = rule.interests();
        self.register_box_for(rule, kinds)
    }

    /// Registers a node rule on an explicit set of kinds.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateRule`] if the id is taken.
    pub fn register_for<R: Rule + 'static>(
        &mut self,
        rule: R,
        kinds: &[SyntaxKind],
    ) -> Result<(), EngineError> {
        self.register_box_for(Box::new(rule), kinds)
    }

    fn register_box_for(&mut self, rule: RuleBox, kinds: &[SyntaxKind]) -> Result<(), EngineError> {
        let descriptor = rule.descriptor();
        self.ensure_unique(descriptor.id)?;
        if !self.config.is_rule_enabled(descriptor.id) {
            debug!("Skipping disabled rule: {}", descriptor.id);
            return Ok(());
        }

        let severity = self.severity_for(descriptor);
        let index = self.rules.len();
        for &kind in kinds {
            let slots = self.by_kind.entry(kind).or_default();
            if !slots.contains(&index) {
                slots.push(index);
            }
        }
        debug!("Registered {} on {:?}", descriptor.id, kinds);
        self.rules.push(NodeRegistration { rule, severity });
        Ok(())
    }

    /// Registers a compilation rule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateRule`] if the id is taken.
    pub fn register_compilation_rule<R: CompilationRule + 'static>(
        &mut self,
        rule: R,
    ) -> Result<(), EngineError> {
        self.register_compilation_rule_box(Box::new(rule))
    }

    /// Registers a boxed compilation rule.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::DuplicateRule`] if the id is taken.
    pub fn register_compilation_rule_box(
        &mut self,
        rule: CompilationRuleBox,
    ) -> Result<(), EngineError> {
        let descriptor = rule.descriptor();
        self.ensure_unique(descriptor.id)?;
        if !self.config.is_rule_enabled(descriptor.id) {
            debug!("Skipping disabled rule: {}", descriptor.id);
            return Ok(());
        }
        debug!("Registered compilation rule {}", descriptor.id);
        let severity = self.severity_for(descriptor);
        self.compilation_rules
            .push(CompilationRegistration { rule, severity });
        Ok(())
    }

    fn ensure_unique(&self, id: &str) -> Result<(), EngineError> {
        if self.is_registered(id) {
            Err(EngineError::DuplicateRule(id.to_string()))
        } else {
            Ok(())
        }
    }

    fn severity_for(&self, descriptor: &RuleDescriptor) -> Severity {
        self.config
            .rule_severity(descriptor.id)
            .unwrap_or(descriptor.default_severity)
    }

    /// Whether an active rule has `id`.
    #[must_use]
    pub fn is_registered(&self, id: &str) -> bool {
        self.rule_ids().any(|r| r == id)
    }

    /// Ids of the active rules, node rules first.
    pub fn rule_ids(&self) -> impl Iterator<Item = &'static str> + '_ {
        self.rules
            .iter()
            .map(|r| r.rule.code())
            .chain(self.compilation_rules.iter().map(|r| r.rule.code()))
    }

    /// Returns the number of active rules.
    #[must_use]
    pub fn rule_count(&self) -> usize {
        self.rules.len() + self.compilation_rules.len()
    }

    /// The configuration the engine was built with.
    #[must_use]
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Runs every rule interested in `node`'s kind, collecting into `pass`.
    ///
    /// A rule that errors or panics is recorded as a fault and its diagnostics
    /// for this node are dropped; the remaining rules still run.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] if cancellation is requested before
    /// one of the rule invocations.
    pub fn dispatch(
        &self,
        pass: &mut AnalysisPass,
        scope: FileScope<'_>,
        node: SyntaxNode<'_>,
    ) -> Result<(), EngineError> {
        let Some(indices) = self.by_kind.get(&node.kind()) else {
            return Ok(());
        };

        for &index in indices {
            pass.check_cancelled()?;

            let registration = &self.rules[index];
            let descriptor = registration.rule.descriptor();
            let mut ctx = RuleContext::new(node, scope, descriptor, registration.severity);

            let outcome = catch_unwind(AssertUnwindSafe(|| registration.rule.evaluate(&mut ctx)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    pass.diagnostics.extend(ctx.into_diagnostics());
                    continue;
                }
                Ok(Err(error)) => error.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            pass.fault(
                descriptor,
                Some(Location::from_span(scope.tree, node.span())),
                failure,
            );
        }

        Ok(())
    }

    /// Walks one tree in preorder and dispatches every node.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] if cancelled mid-walk.
    pub fn analyze_tree(
        &self,
        scope: FileScope<'_>,
        cancel: &CancellationToken,
    ) -> Result<LintResult, EngineError> {
        debug!("Analyzing {}", scope.path().display());
        let mut pass = AnalysisPass::new(cancel.clone());
        for node in SyntaxNode::root(scope.tree).preorder() {
            self.dispatch(&mut pass, scope, node)?;
        }
        Ok(pass.into_result(1))
    }

    /// Analyzes every tree of `compilation` in parallel, then runs the
    /// compilation rules once.
    ///
    /// # Errors
    ///
    /// Returns [`EngineError::Cancelled`] if cancelled before completion.
    pub fn analyze_compilation(
        &self,
        compilation: &Compilation<'_>,
        cancel: &CancellationToken,
    ) -> Result<LintResult, EngineError> {
        info!(
            "Analyzing {} file(s) with {} rule(s)",
            compilation.files().len(),
            self.rule_count()
        );

        let run = || {
            compilation
                .files()
                .par_iter()
                .map(|scope| self.analyze_tree(*scope, cancel))
                .collect::<Result<Vec<_>, _>>()
        };
        let per_file = match &self.pool {
            Some(pool) => pool.install(run)?,
            None => run()?,
        };

        let mut result = LintResult::new();
        for file_result in per_file {
            result.extend(file_result);
        }

        let mut pass = AnalysisPass::new(cancel.clone());
        self.run_compilation_rules(&mut pass, compilation)?;
        result.extend(pass.into_result(0));
        result.sort();

        info!(
            "Found {} diagnostic(s) and {} fault(s)",
            result.diagnostics.len(),
            result.faults.len()
        );
        Ok(result)
    }

    fn run_compilation_rules(
        &self,
        pass: &mut AnalysisPass,
        compilation: &Compilation<'_>,
    ) -> Result<(), EngineError> {
        for registration in &self.compilation_rules {
            pass.check_cancelled()?;

            let descriptor = registration.rule.descriptor();
            let mut ctx = CompilationContext::new(compilation, descriptor, registration.severity);
            let outcome = catch_unwind(AssertUnwindSafe(|| registration.rule.evaluate(&mut ctx)));
            let failure = match outcome {
                Ok(Ok(())) => {
                    pass.diagnostics.extend(ctx.into_diagnostics());
                    continue;
                }
                Ok(Err(error)) => error.to_string(),
                Err(payload) => panic_message(payload.as_ref()),
            };
            pass.fault(descriptor, None, failure);
        }
        Ok(())
    }

    /// Asks the rule that reported `diagnostic` for a fix.
    ///
    /// Returns `None` when the rule is not registered here or has no fix for
    /// this diagnostic. Nothing is applied.
    #[must_use]
    pub fn propose_fix(
        &self,
        diagnostic: &Diagnostic,
        compilation: &Compilation<'_>,
    ) -> Option<FixProposal> {
        let request = FixRequest::new(diagnostic, compilation);
        let id = diagnostic.rule_id();

        if let Some(registration) = self.rules.iter().find(|r| r.rule.code() == id) {
            return registration.rule.propose_fix(&request);
        }
        self.compilation_rules
            .iter()
            .find(|r| r.rule.code() == id)
            .and_then(|r| r.rule.propose_fix(&request))
    }
}

fn panic_message(payload: &(dyn std::any::Any + Send)) -> String {
    if let Some(message) = payload.downcast_ref::<&str>() {
        format!("panicked: {message}")
    } else if let Some(message) = payload.downcast_ref::<String>() {
        format!("panicked: {message}")
    } else {
        "panicked".to_string()
    }
}
