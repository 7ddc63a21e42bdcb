//! # acl-lint
//!
//! Pluggable static-analysis rule engine for C#-style syntax trees.
//!
//! This is the facade crate: it re-exports the engine and the built-in rules,
//! and adds a [`Session`] that wires a project [`Config`] to them.
//!
//! ## Programmatic Usage
//!
//! ```rust,ignore
//! use acl_lint::{load_trees, CancellationToken, Config, Session};
//!
//! let config = Config::from_file("acl-lint.toml".as_ref())?;
//! let session = Session::new(config, ".".as_ref())?;
//! let trees = load_trees(&["Orders.tree.json"])?;
//! let result = session.check(&trees, &CancellationToken::new())?;
//! println!("{}", result.format_report(session.config().fail_on()));
//! ```
//!
//! ## Hosting
//!
//! Hosts with their own compiler implement [`SyntaxTree`] and
//! [`SemanticModel`] and drive a [`RuleEngine`] directly; the session is
//! only a convenience over [`ArenaTree`] dumps.

#![forbid(unsafe_code)]

// Re-export core types and traits
pub use acl_lint_core::*;

/// Built-in rules and presets.
pub mod rules {
    pub use acl_lint_rules::*;
}

mod runner;

pub use runner::{build_engine, load_tree, load_trees, resolve_preset, RunError, Session};
