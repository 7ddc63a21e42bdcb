//! Context types for rule execution.

use crate::config::ConfigError;
use crate::semantic::SemanticModel;
use crate::settings::{nearest_override, parse_bool, parse_int, SettingsKey, SettingsResolver};
use crate::syntax::{SyntaxNode, SyntaxTree, TextSpan};
use crate::types::{Diagnostic, Location, RuleDescriptor, Severity};
use std::path::Path;

/// Everything the engine knows about one analyzed file.
#[derive(Clone, Copy)]
pub struct FileScope<'a> {
    /// The file's syntax tree.
    pub tree: &'a dyn SyntaxTree,
    /// Symbol queries for the compilation the file belongs to.
    pub semantic: &'a dyn SemanticModel,
    /// Settings resolved for this file.
    pub settings: &'a SettingsResolver,
}

impl<'a> FileScope<'a> {
    /// Bundles a tree with its semantic model and settings.
    #[must_use]
    pub fn new(
        tree: &'a dyn SyntaxTree,
        semantic: &'a dyn SemanticModel,
        settings: &'a SettingsResolver,
    ) -> Self {
        Self {
            tree,
            semantic,
            settings,
        }
    }

    /// Path of the tree.
    #[must_use]
    pub fn path(&self) -> &'a Path {
        self.tree.path()
    }
}

impl std::fmt::Debug for FileScope<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FileScope")
            .field("path", &self.tree.path())
            .finish_non_exhaustive()
    }
}

/// The set of files analyzed together, sharing one semantic model.
pub struct Compilation<'a> {
    files: Vec<FileScope<'a>>,
    semantic: &'a dyn SemanticModel,
}

impl<'a> Compilation<'a> {
    /// Creates an empty compilation.
    #[must_use]
    pub fn new(semantic: &'a dyn SemanticModel) -> Self {
        Self {
            files: Vec::new(),
            semantic,
        }
    }

    /// Adds a file analyzed with the compilation's semantic model.
    #[must_use]
    pub fn with_file(mut self, tree: &'a dyn SyntaxTree, settings: &'a SettingsResolver) -> Self {
        self.files.push(FileScope::new(tree, self.semantic, settings));
        self
    }

    /// Files in the order they were added.
    #[must_use]
    pub fn files(&self) -> &[FileScope<'a>] {
        &self.files
    }

    /// The file whose tree has `path`.
    #[must_use]
    pub fn file(&self, path: &Path) -> Option<&FileScope<'a>> {
        self.files.iter().find(|f| f.tree.path() == path)
    }

    /// The compilation's semantic model.
    #[must_use]
    pub fn semantic(&self) -> &'a dyn SemanticModel {
        self.semantic
    }
}

/// Context handed to a [`Rule`](crate::Rule) for one node.
///
/// Collects the rule's diagnostics; the engine takes them with
/// [`into_diagnostics`](Self::into_diagnostics) only if evaluation succeeds.
pub struct RuleContext<'a> {
    node: SyntaxNode<'a>,
    scope: FileScope<'a>,
    descriptor: &'static RuleDescriptor,
    severity: Severity,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> RuleContext<'a> {
    /// Creates a context for evaluating `descriptor`'s rule on `node`.
    #[must_use]
    pub fn new(
        node: SyntaxNode<'a>,
        scope: FileScope<'a>,
        descriptor: &'static RuleDescriptor,
        severity: Severity,
    ) -> Self {
        Self {
            node,
            scope,
            descriptor,
            severity,
            diagnostics: Vec::new(),
        }
    }

    /// The node being analyzed.
    #[must_use]
    pub fn node(&self) -> SyntaxNode<'a> {
        self.node
    }

    /// The tree owning the node.
    #[must_use]
    pub fn tree(&self) -> &'a dyn SyntaxTree {
        self.scope.tree
    }

    /// Symbol queries.
    #[must_use]
    pub fn semantic(&self) -> &'a dyn SemanticModel {
        self.scope.semantic
    }

    /// File-level settings, without per-site overrides.
    #[must_use]
    pub fn settings(&self) -> &'a SettingsResolver {
        self.scope.settings
    }

    /// Descriptor of the rule being evaluated.
    #[must_use]
    pub fn descriptor(&self) -> &'static RuleDescriptor {
        self.descriptor
    }

    /// Location of `span` in this tree.
    #[must_use]
    pub fn location(&self, span: TextSpan) -> Location {
        Location::from_span(self.scope.tree, span)
    }

    /// Reports a diagnostic at `span`.
    pub fn report<I, S>(&mut self, span: TextSpan, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        let location = self.location(span);
        self.report_at(location, args);
    }

    /// Reports a diagnostic at an explicit location.
    pub fn report_at<I, S>(&mut self, location: Location, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diagnostics.push(Diagnostic::new(
            self.descriptor,
            self.severity,
            location,
            args.into_iter().map(Into::into).collect(),
        ));
    }

    /// Raw value of this rule's setting `name`.
    ///
    /// A per-site override on the node or its nearest enclosing declaration
    /// wins over the file's resolver chain.
    #[must_use]
    pub fn setting_string(&self, name: &str) -> Option<String> {
        let key = self.key(name);
        nearest_override(self.node, &key)
            .map(str::to_string)
            .or_else(|| self.scope.settings.resolve_string(&key))
    }

    /// This rule's setting `name` as an integer.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the value is not an integer.
    pub fn setting_int(&self, name: &str) -> Result<Option<i64>, ConfigError> {
        let key = self.key(name);
        match nearest_override(self.node, &key) {
            Some(value) => parse_int(&key, value).map(Some),
            None => self.scope.settings.resolve_int(&key),
        }
    }

    /// This rule's setting `name` as a boolean.
    ///
    /// # Errors
    ///
    /// Returns [`ConfigError::InvalidValue`] when the value is not a boolean.
    pub fn setting_bool(&self, name: &str) -> Result<Option<bool>, ConfigError> {
        let key = self.key(name);
        match nearest_override(self.node, &key) {
            Some(value) => parse_bool(&key, value).map(Some),
            None => self.scope.settings.resolve_bool(&key),
        }
    }

    fn key(&self, name: &str) -> SettingsKey {
        SettingsKey::new(self.descriptor.id, name)
    }

    /// Diagnostics reported so far.
    #[must_use]
    pub fn diagnostics(&self) -> &[Diagnostic] {
        &self.diagnostics
    }

    /// Consumes the context, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}

/// Context handed to a [`CompilationRule`](crate::CompilationRule).
pub struct CompilationContext<'a> {
    compilation: &'a Compilation<'a>,
    descriptor: &'static RuleDescriptor,
    severity: Severity,
    diagnostics: Vec<Diagnostic>,
}

impl<'a> CompilationContext<'a> {
    /// Creates a context for evaluating `descriptor`'s rule once.
    #[must_use]
    pub fn new(
        compilation: &'a Compilation<'a>,
        descriptor: &'static RuleDescriptor,
        severity: Severity,
    ) -> Self {
        Self {
            compilation,
            descriptor,
            severity,
            diagnostics: Vec::new(),
        }
    }

    /// The compilation.
    #[must_use]
    pub fn compilation(&self) -> &'a Compilation<'a> {
        self.compilation
    }

    /// The compilation's semantic model.
    #[must_use]
    pub fn semantic(&self) -> &'a dyn SemanticModel {
        self.compilation.semantic()
    }

    /// Descriptor of the rule being evaluated.
    #[must_use]
    pub fn descriptor(&self) -> &'static RuleDescriptor {
        self.descriptor
    }

    /// Reports a diagnostic.
    pub fn report<I, S>(&mut self, location: Location, args: I)
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.diagnostics.push(Diagnostic::new(
            self.descriptor,
            self.severity,
            location,
            args.into_iter().map(Into::into).collect(),
        ));
    }

    /// Consumes the context, returning its diagnostics.
    #[must_use]
    pub fn into_diagnostics(self) -> Vec<Diagnostic> {
        self.diagnostics
    }
}
