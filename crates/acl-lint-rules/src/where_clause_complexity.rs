//! Rule to limit the number of `&&` clauses in a query predicate.
//!
//! # Rationale
//!
//! A `Where` lambda chaining many conditions is hard to read and hard to
//! test. Splitting it into named predicates or several `Where` calls keeps
//! each condition visible.
//!
//! # Configuration
//!
//! ```toml
//! [rules.ACL1003]
//! max_where_clauses = 3
//! ```
//!
//! The same key is read from additional text files as
//! `dotnet_diagnostic.ACL1003.max_where_clauses = 3`.

use acl_lint_core::{
    Category, Rule, RuleContext, RuleDescriptor, RuleError, Severity, SyntaxElement, SyntaxKind,
    SyntaxNode, TokenKind,
};
use tracing::trace;

/// Rule code for where-clause-complexity.
pub const CODE: &str = "ACL1003";

/// Rule name for where-clause-complexity.
pub const NAME: &str = "where-clause-complexity";

/// Setting holding the largest accepted clause count.
pub const MAX_CLAUSES_SETTING: &str = "max_where_clauses";

/// Clause limit used when no setting is present.
pub const DEFAULT_MAX_CLAUSES: i64 = 3;

/// Descriptor for where-clause-complexity.
pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Where predicate has too many clauses",
    message_template: "Where predicate has {0} clauses (max: {1})",
    category: Category::Maintainability,
    default_severity: Severity::Warning,
    enabled_by_default: true,
};

/// Flags invocations whose predicate joins too many conditions with `&&`.
#[derive(Debug, Clone, Copy, Default)]
pub struct WhereClauseComplexity;

impl WhereClauseComplexity {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for WhereClauseComplexity {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::InvocationExpression]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let invocation = ctx.node();
        let text = invocation.text();
        if !text.contains("Where") && !text.contains("&&") {
            return Ok(());
        }

        let clauses = count_clauses(invocation);
        let max = ctx
            .setting_int(MAX_CLAUSES_SETTING)?
            .unwrap_or(DEFAULT_MAX_CLAUSES);
        trace!(clauses, max, "where clause count");

        if clauses > max {
            ctx.report(invocation.span(), [clauses.to_string(), max.to_string()]);
        }
        Ok(())
    }
}

/// Number of `&&`-joined conditions in the argument predicates of `invocation`.
///
/// Every `&&` is seen twice, once as its logical-and node and once as the
/// operator token inside it.
pub fn count_clauses(invocation: SyntaxNode<'_>) -> i64 {
    let hits = invocation
        .descendant_elements_with(stays_in_predicate)
        .filter(|element| match element {
            SyntaxElement::Node(node) => node.kind() == SyntaxKind::LogicalAndExpression,
            SyntaxElement::Token(token) => token.kind() == TokenKind::AmpersandAmpersand,
        })
        .count();
    i64::try_from(hits / 2).map_or(i64::MAX, |ands| ands.saturating_add(1))
}

fn stays_in_predicate(node: SyntaxNode<'_>) -> bool {
    node.kind().is_lambda()
        || matches!(
            node.kind(),
            SyntaxKind::InvocationExpression
                | SyntaxKind::ArgumentList
                | SyntaxKind::Argument
                | SyntaxKind::LogicalAndExpression
                | SyntaxKind::LogicalOrExpression
                | SyntaxKind::LogicalNotExpression
                | SyntaxKind::ParenthesizedExpression
        )
}
