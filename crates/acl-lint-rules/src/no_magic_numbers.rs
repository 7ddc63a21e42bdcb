//! Rule to flag unexplained numeric literals in local initializers.
//!
//! # Rationale
//!
//! A bare `7` in `var total = price * 7;` says nothing about where the number
//! comes from. Naming it with a `const` documents intent and gives one place
//! to change it.
//!
//! # Detected Patterns
//!
//! Numeric literal operands of a binary-expression initializer of a non-const
//! local declaration, at any depth of nested binary expressions.
//!
//! # Exemptions
//!
//! - `0` and `1`
//! - exact multiples of ten (`10`, `100`, `1_000`, `20.0`)
//! - the other divisors of ten, `2` and `5`
//! - `const` declarations
//! - initializers that are not binary expressions (`var x = 7;`)
//! - literals under anything other than a binary expression (`-7`, `(7)`, `f(7)`)

use acl_lint_core::{
    Category, Rule, RuleContext, RuleDescriptor, RuleError, Severity, SyntaxKind, SyntaxNode,
    TokenKind,
};

/// Rule code for no-magic-numbers.
pub const CODE: &str = "ACL1001";

/// Rule name for no-magic-numbers.
pub const NAME: &str = "no-magic-numbers";

/// Descriptor for no-magic-numbers.
pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Avoid magic numbers in expressions",
    message_template: "Magic number used in the initializer of '{0}'",
    category: Category::Maintainability,
    default_severity: Severity::Warning,
    enabled_by_default: false,
};

/// Flags non-exempt numeric literals in binary-expression initializers.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoMagicNumbers;

impl NoMagicNumbers {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for NoMagicNumbers {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::LocalDeclarationStatement]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let statement = ctx.node();
        if statement.has_keyword("const") {
            return Ok(());
        }
        let Some(declaration) = statement.first_child(SyntaxKind::VariableDeclaration) else {
            return Ok(());
        };

        for declarator in declaration
            .child_nodes()
            .filter(|n| n.kind() == SyntaxKind::VariableDeclarator)
        {
            let Some(name) = declarator.identifier() else {
                continue;
            };
            let Some(value) = declarator
                .first_child(SyntaxKind::EqualsValueClause)
                .and_then(|clause| clause.child_nodes().next())
            else {
                continue;
            };
            if !value.kind().is_binary_expression() {
                continue;
            }

            let mut literals = Vec::new();
            collect_literal_operands(value, &mut literals);
            for literal in literals {
                let Some(token) = literal.first_child_token(TokenKind::NumericLiteral) else {
                    continue;
                };
                if !is_exempt(token.text()) {
                    ctx.report(token.span(), [name.text()]);
                }
            }
        }

        Ok(())
    }
}

/// Pushes the numeric literal operands of `binary`, recursing through nested
/// binary operands in source order.
fn collect_literal_operands<'t>(binary: SyntaxNode<'t>, out: &mut Vec<SyntaxNode<'t>>) {
    for operand in binary.child_nodes() {
        if operand.kind().is_binary_expression() {
            collect_literal_operands(operand, out);
        } else if operand.kind() == SyntaxKind::NumericLiteralExpression {
            out.push(operand);
        }
    }
}

/// Whether a numeric literal is 0, 1, a divisor of ten or an exact multiple
/// of ten.
///
/// Literals that cannot be read, and reals with a fractional part, are not
/// exempt.
fn is_exempt(text: &str) -> bool {
    match literal_value(text) {
        Some(Literal::Integer(n)) => is_exempt_integer(n),
        Some(Literal::Real(x)) => real_as_integer(x).is_some_and(is_exempt_integer),
        None => false,
    }
}

fn is_exempt_integer(n: u128) -> bool {
    n == 0 || n == 1 || n % 10 == 0 || 10 % n == 0
}

#[allow(clippy::cast_possible_truncation, clippy::cast_sign_loss)]
fn real_as_integer(x: f64) -> Option<u128> {
    (x.is_finite() && x >= 0.0 && x.fract() == 0.0 && x < 1e30).then(|| x as u128)
}

#[derive(Debug, PartialEq)]
enum Literal {
    Integer(u128),
    Real(f64),
}

fn literal_value(text: &str) -> Option<Literal> {
    let cleaned: String = text.chars().filter(|&c| c != '_').collect();
    let lower = cleaned.to_ascii_lowercase();

    if let Some(hex) = lower.strip_prefix("0x") {
        let digits = hex.trim_end_matches(['u', 'l']);
        return u128::from_str_radix(digits, 16).ok().map(Literal::Integer);
    }
    if let Some(bin) = lower.strip_prefix("0b") {
        let digits = bin.trim_end_matches(['u', 'l']);
        return u128::from_str_radix(digits, 2).ok().map(Literal::Integer);
    }

    let is_real = lower.ends_with(['f', 'd', 'm']) || lower.contains(['.', 'e']);
    let digits = lower.trim_end_matches(['u', 'l', 'f', 'd', 'm']);
    if is_real {
        digits.parse::<f64>().ok().map(Literal::Real)
    } else {
        digits.parse::<u128>().ok().map(Literal::Integer)
    }
}
