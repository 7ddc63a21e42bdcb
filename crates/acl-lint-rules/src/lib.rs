//! # acl-lint-rules
//!
//! Built-in analysis rules for acl-lint.
//!
//! ## Available Rules
//!
//! | Code | Name | Description |
//! |------|------|-------------|
//! | ACL1001 | `no-magic-numbers` | Flags unexplained numeric literals in arithmetic initializers (off by default) |
//! | ACL1002 | `prefer-then-by-descending` | Flags `OrderByDescending` after another ordering call in one chain |
//! | ACL1003 | `where-clause-complexity` | Limits the number of `&&` clauses in a predicate |
//! | ACL1004 | `field-underscore-prefix` | Requires `_` on private instance fields |
//! | ACL1005 | `require-nullable-context` | Requires nullable reference types for the compilation |
//!
//! ## Usage
//!
//! ```ignore
//! use acl_lint_core::{Config, RuleEngine};
//! use acl_lint_rules::{install, Preset};
//!
//! let config = Config::default();
//! let engine = install(RuleEngine::builder().config(config.clone()), Preset::Recommended, &config)
//!     .build()?;
//! ```

#![forbid(unsafe_code)]
#![warn(missing_docs)]

pub mod field_underscore_prefix;
pub mod no_magic_numbers;
pub mod prefer_then_by_descending;
mod presets;
pub mod require_nullable_context;
pub mod where_clause_complexity;

#[cfg(test)]
mod test_support;

pub use field_underscore_prefix::FieldUnderscorePrefix;
pub use no_magic_numbers::NoMagicNumbers;
pub use prefer_then_by_descending::PreferThenByDescending;
pub use presets::{builtin_rules, descriptors, install, BuiltinRule, Preset, UnknownPreset};
pub use require_nullable_context::RequireNullableContext;
pub use where_clause_complexity::WhereClauseComplexity;

/// Re-export core types for convenience.
pub use acl_lint_core::{CompilationRule, Diagnostic, Rule, Severity};
