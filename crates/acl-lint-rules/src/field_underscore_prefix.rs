//! Rule to require an underscore prefix on private instance fields.
//!
//! # Rationale
//!
//! A leading `_` separates mutable object state from locals and parameters
//! at the point of use. Constants, `static readonly` values and fields
//! visible across the assembly (`public`, `internal`, `protected internal`) follow the public naming convention instead.
//!
//! # Detected Patterns
//!
//! - `private int count;`
//! - `protected string name;`
//! - `static int instances;`
//!
//! # Configuration
//!
//! `enabled = false` under `dotnet_diagnostic.ACL1004` turns the rule off for
//! the node it is attached to and everything nested in it.

use acl_lint_core::{
    Accessibility, Category, FixEdit, FixProposal, FixRequest, Rule, RuleContext,
    RuleDescriptor, RuleError, Severity, Symbol, SyntaxKind, SyntaxNode,
};

/// Rule code for field-underscore-prefix.
pub const CODE: &str = "ACL1004";

/// Rule name for field-underscore-prefix.
pub const NAME: &str = "field-underscore-prefix";

/// Descriptor for field-underscore-prefix.
pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Private fields start with an underscore",
    message_template: "Field '{0}' is not prefixed with an underscore",
    category: Category::Naming,
    default_severity: Severity::Warning,
    enabled_by_default: true,
};

const PREFIX: char = '_';

/// Flags private instance fields named without a leading underscore.
#[derive(Debug, Clone, Copy, Default)]
pub struct FieldUnderscorePrefix;

impl FieldUnderscorePrefix {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl Rule for FieldUnderscorePrefix {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::FieldDeclaration]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        if ctx.setting_bool("enabled")? == Some(false) {
            return Ok(());
        }

        let declarators: Vec<SyntaxNode<'_>> = ctx
            .node()
            .descendants()
            .filter(|n| n.kind() == SyntaxKind::VariableDeclarator)
            .collect();

        for declarator in declarators {
            let Some(symbol) = ctx.semantic().declared_symbol(declarator) else {
                continue;
            };
            if !applies_to(&symbol) || symbol.name.starts_with(PREFIX) {
                continue;
            }
            let span = declarator
                .identifier()
                .map_or_else(|| declarator.span(), |token| token.span());
            ctx.report(span, [symbol.name]);
        }
        Ok(())
    }

    fn propose_fix(&self, request: &FixRequest<'_>) -> Option<FixProposal> {
        let diagnostic = request.diagnostic;
        let old_name = diagnostic.message_args.first()?;
        if old_name.starts_with(PREFIX) {
            return None;
        }

        // The diagnostic may come from a serialized report; make sure the
        // name still sits where it was reported.
        if let Some(source) = request.tree().and_then(|tree| tree.source_text()) {
            let span = diagnostic.location.span;
            if source.get(span.start..span.end) != Some(old_name.as_str()) {
                return None;
            }
        }

        Some(FixProposal::new(
            CODE,
            format!("Rename '{old_name}' to '{PREFIX}{old_name}'"),
            FixEdit::RenameSymbol {
                location: diagnostic.location.clone(),
                old_name: old_name.clone(),
                new_name: format!("{PREFIX}{old_name}"),
            },
        ))
    }
}

/// Returns true for fields the convention covers.
pub fn applies_to(symbol: &Symbol) -> bool {
    if symbol.is_const || (symbol.is_static && symbol.is_readonly) {
        return false;
    }
    !matches!(
        symbol.accessibility,
        Accessibility::Public | Accessibility::Internal | Accessibility::ProtectedInternal
    )
}
