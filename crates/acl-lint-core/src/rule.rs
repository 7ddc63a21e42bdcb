//! Rule traits for defining lint rules.

use crate::config::ConfigError;
use crate::context::{CompilationContext, RuleContext};
use crate::fix::{FixProposal, FixRequest};
use crate::syntax::SyntaxKind;
use crate::types::RuleDescriptor;

/// A rule evaluated on individual syntax nodes.
///
/// The engine calls [`evaluate`](Rule::evaluate) once for every node whose kind
/// the rule registered for. Rules hold no per-invocation state; anything they
/// find goes through [`RuleContext::report`].
///
/// # Example
///
/// ```ignore
/// use acl_lint_core::{Rule, RuleContext, RuleDescriptor, RuleError, SyntaxKind};
///
/// pub struct NoEmptyBlocks;
///
/// impl Rule for NoEmptyBlocks {
///     fn descriptor(&self) -> &'static RuleDescriptor { &DESCRIPTOR }
///     fn interests(&self) -> &'static [SyntaxKind] { &[SyntaxKind::Block] }
///
///     fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
///         let node = ctx.node();
///         if node.child_nodes().next().is_none() {
///             ctx.report(node.span(), std::iter::empty::<String>());
///         }
///         Ok(())
///     }
/// }
/// ```
pub trait Rule: Send + Sync {
    /// Static descriptor of this rule.
    fn descriptor(&self) -> &'static RuleDescriptor;

    /// Returns the rule id (e.g., "ACL1003").
    fn code(&self) -> &'static str {
        self.descriptor().id
    }

    /// Returns the kebab-case name of this rule.
    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Node kinds this rule is evaluated on.
    fn interests(&self) -> &'static [SyntaxKind];

    /// Evaluates the rule on `ctx.node()`.
    ///
    /// # Errors
    ///
    /// Returns an error when the rule cannot complete, typically because a
    /// setting it needs is malformed. Diagnostics reported before the error
    /// are discarded.
    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError>;

    /// Describes an edit that would resolve `request.diagnostic`.
    fn propose_fix(&self, _request: &FixRequest<'_>) -> Option<FixProposal> {
        None
    }
}

/// Type alias for boxed Rule trait objects.
pub type RuleBox = Box<dyn Rule>;

/// A rule evaluated once per compilation rather than per node.
pub trait CompilationRule: Send + Sync {
    /// Static descriptor of this rule.
    fn descriptor(&self) -> &'static RuleDescriptor;

    /// Returns the rule id.
    fn code(&self) -> &'static str {
        self.descriptor().id
    }

    /// Returns the kebab-case name of this rule.
    fn name(&self) -> &'static str {
        self.descriptor().name
    }

    /// Evaluates the rule against the whole compilation.
    ///
    /// # Errors
    ///
    /// Returns an error when the rule cannot complete.
    fn evaluate(&self, ctx: &mut CompilationContext<'_>) -> Result<(), RuleError>;

    /// Describes an edit that would resolve `request.diagnostic`.
    fn propose_fix(&self, _request: &FixRequest<'_>) -> Option<FixProposal> {
        None
    }
}

/// Type alias for boxed `CompilationRule` trait objects.
pub type CompilationRuleBox = Box<dyn CompilationRule>;

/// Why a rule could not finish evaluating.
#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    /// A setting the rule reads is malformed.
    #[error(transparent)]
    Config(#[from] ConfigError),

    /// The rule hit a state it cannot handle.
    #[error("{0}")]
    Internal(String),
}
