//! # acl-lint-core
//!
//! Core framework for rule-based analysis of C#-shaped syntax trees supplied
//! by a host.
//!
//! This crate provides:
//!
//! - [`SyntaxTree`] and [`SemanticModel`], the capabilities a host implements,
//!   plus [`ArenaTree`] and [`SyntacticModel`] as in-memory defaults
//! - [`SettingsResolver`] for per-file rule settings with fallback sources
//! - [`Rule`] and [`CompilationRule`] traits
//! - [`RuleEngine`] for dispatch, fault isolation and cancellation
//! - [`Diagnostic`] and [`FixProposal`] for findings and suggested edits
//!
//! ## Example
//!
//! ```ignore
//! use acl_lint_core::{CancellationToken, Compilation, RuleEngine, SettingsResolver, SyntacticModel};
//!
//! let engine = RuleEngine::builder()
//!     .rule(MyRule::new())
//!     .build()?;
//!
//! let model = SyntacticModel::default();
//! let settings = SettingsResolver::default();
//! let compilation = Compilation::new(&model).with_file(&tree, &settings);
//! let result = engine.analyze_compilation(&compilation, &CancellationToken::new())?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

mod cancel;
mod config;
mod context;
mod engine;
mod fix;
mod rule;
mod semantic;
mod types;

pub mod settings;
pub mod syntax;

pub use cancel::CancellationToken;
pub use config::{AnalyzerConfig, CompilationConfig, Config, ConfigError, OverrideConfig, RuleConfig};
pub use context::{Compilation, CompilationContext, FileScope, RuleContext};
pub use engine::{AnalysisPass, EngineError, RuleEngine, RuleEngineBuilder};
pub use fix::{CompilationOption, FixEdit, FixProposal, FixRequest};
pub use rule::{CompilationRule, CompilationRuleBox, Rule, RuleBox, RuleError};
pub use semantic::{Accessibility, NullableContext, SemanticModel, Symbol, SymbolKind, SyntacticModel};
pub use settings::{
    AdditionalText, ConfigurationSource, SettingsKey, SettingsResolver, StructuredProvider,
    TextFileProvider,
};
pub use syntax::{
    ArenaTree, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxToken, SyntaxTree, TextSpan, TokenKind,
    TreeBuilder, TreeDump, TreeError,
};
pub use types::{
    format_message, Category, Diagnostic, DiagnosticReport, LintResult, Location, RuleDescriptor,
    RuleFault, Severity,
};
