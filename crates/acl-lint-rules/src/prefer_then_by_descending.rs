//! Rule to flag `OrderByDescending` used where `ThenByDescending` was meant.
//!
//! # Rationale
//!
//! `OrderBy(a).OrderByDescending(b)` sorts twice: the second call throws
//! the first ordering away. A secondary descending key is written
//! `ThenByDescending`.
//!
//! # Detected Patterns
//!
//! In one invocation chain, an `OrderByDescending` call preceded by any other
//! `OrderBy`/`OrderByDescending` call. Calls inside arguments (for example a
//! nested query in a `Select` lambda) belong to their own chain and are not
//! counted. One diagnostic per chain, at the last `OrderByDescending`.

use acl_lint_core::{
    Category, Rule, RuleContext, RuleDescriptor, RuleError, Severity, SyntaxKind, SyntaxNode,
    SyntaxToken, TokenKind,
};

/// Rule code for prefer-then-by-descending.
pub const CODE: &str = "ACL1002";

/// Rule name for prefer-then-by-descending.
pub const NAME: &str = "prefer-then-by-descending";

/// Descriptor for prefer-then-by-descending.
pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Use ThenByDescending after an ordering call",
    message_template: "{0} in '{1}' calls OrderByDescending after an ordering call; use ThenByDescending",
    category: Category::Usage,
    default_severity: Severity::Warning,
    enabled_by_default: true,
};

const ORDER_BY: &str = "OrderBy";
const ORDER_BY_DESCENDING: &str = "OrderByDescending";

/// Flags a chain that re-sorts with `OrderByDescending`.
#[derive(Debug, Clone, Copy, Default)]
pub struct PreferThenByDescending;

impl PreferThenByDescending {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for PreferThenByDescending {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::InvocationExpression]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let invocation = ctx.node();
        if !is_outermost_call(invocation) {
            return Ok(());
        }

        let ordering: Vec<SyntaxToken<'_>> = invocation
            .descendant_tokens_with(|n| n.kind() != SyntaxKind::Argument)
            .filter(|t| {
                t.kind() == TokenKind::Identifier
                    && matches!(t.text(), ORDER_BY | ORDER_BY_DESCENDING)
            })
            .collect();

        let Some(last_descending) = ordering
            .iter()
            .rev()
            .find(|t| t.text() == ORDER_BY_DESCENDING)
        else {
            return Ok(());
        };
        let Some(first) = ordering.first() else {
            return Ok(());
        };

        if first.span().start < last_descending.span().start {
            ctx.report(
                last_descending.span(),
                [invocation.kind().to_string(), enclosing_member_name(invocation)],
            );
        }
        Ok(())
    }
}

/// False for an invocation that is the receiver of a further call
/// (`a.OrderBy(x)` inside `a.OrderBy(x).OrderByDescending(y)`).
fn is_outermost_call(invocation: SyntaxNode<'_>) -> bool {
    let Some(access) = invocation.parent() else {
        return true;
    };
    if access.kind() != SyntaxKind::SimpleMemberAccessExpression {
        return true;
    }
    let is_receiver = access.child_nodes().next() == Some(invocation);
    let access_is_called = access
        .parent()
        .is_some_and(|p| p.kind() == SyntaxKind::InvocationExpression);
    !(is_receiver && access_is_called)
}

/// Name of the member (or field, or type) that contains `node`.
fn enclosing_member_name(node: SyntaxNode<'_>) -> String {
    node.ancestors()
        .find_map(|ancestor| {
            let kind = ancestor.kind();
            if kind.is_member_declaration() || kind.is_type_declaration() {
                ancestor.identifier()
            } else if kind == SyntaxKind::FieldDeclaration {
                ancestor
                    .descendants()
                    .find(|n| n.kind() == SyntaxKind::VariableDeclarator)
                    .and_then(|d| d.identifier())
            } else {
                None
            }
        })
        .map(|token| token.text().to_string())
        .unwrap_or_default()
}
