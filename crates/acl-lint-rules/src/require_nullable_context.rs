//! Rule to require nullable reference types for the whole compilation.
//!
//! # Rationale
//!
//! With the nullable context disabled the compiler cannot tell a possibly
//! null reference from one that is never null, so null checks are either
//! missing or everywhere.
//!
//! This is a compilation-level check: it reports at most once no matter how
//! many files the compilation holds.

use acl_lint_core::{
    Category, Compilation, CompilationContext, CompilationOption, CompilationRule, FixEdit,
    FixProposal, FixRequest, Location, NullableContext, RuleDescriptor, RuleError, Severity,
    SyntaxKind, SyntaxNode,
};
use tracing::debug;

/// Rule code for require-nullable-context.
pub const CODE: &str = "ACL1005";

/// Rule name for require-nullable-context.
pub const NAME: &str = "require-nullable-context";

/// Type name the diagnostic is anchored to when a compilation declares it.
pub const DECLARING_TYPE: &str = "RequireNullableContext";

/// Descriptor for require-nullable-context.
pub static DESCRIPTOR: RuleDescriptor = RuleDescriptor {
    id: CODE,
    name: NAME,
    title: "Enable nullable reference types",
    message_template: "Nullable reference types are disabled for this compilation",
    category: Category::Style,
    default_severity: Severity::Warning,
    enabled_by_default: true,
};

/// Reports a compilation whose nullable context is disabled.
#[derive(Debug, Clone, Copy, Default)]
pub struct RequireNullableContext;

impl RequireNullableContext {
    /// Creates the rule.
    #[must_use]
    pub fn new() -> Self {
        Self
    }
}

impl CompilationRule for RequireNullableContext {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &DESCRIPTOR
    }

    fn evaluate(&self, ctx: &mut CompilationContext<'_>) -> Result<(), RuleError> {
        let nullable = ctx.semantic().nullable_context();
        if nullable != NullableContext::Disabled {
            debug!(%nullable, "nullable context enabled");
            return Ok(());
        }
        let location = anchor(ctx.compilation());
        ctx.report(location, std::iter::empty::<String>());
        Ok(())
    }

    fn propose_fix(&self, request: &FixRequest<'_>) -> Option<FixProposal> {
        let from = request.compilation.semantic().nullable_context();
        if from != NullableContext::Disabled {
            return None;
        }
        Some(FixProposal::new(
            CODE,
            "Enable nullable reference types",
            FixEdit::SetCompilationOption {
                option: CompilationOption::Nullable,
                from,
                to: NullableContext::Enabled,
            },
        ))
    }
}

/// Where to put the diagnostic: the declaring type if some file has it,
/// else the root of the first file.
fn anchor(compilation: &Compilation<'_>) -> Location {
    let files = compilation.files();
    let declaring = files.iter().find_map(|scope| {
        SyntaxNode::root(scope.tree)
            .descendants()
            .find(|n| is_declaring_type(*n))
            .map(|class| {
                let span = class.identifier().map_or_else(|| class.span(), |t| t.span());
                Location::from_span(scope.tree, span)
            })
    });
    declaring
        .or_else(|| {
            files
                .first()
                .map(|scope| Location::from_span(scope.tree, SyntaxNode::root(scope.tree).span()))
        })
        .unwrap_or_else(|| Location::new("", 1, 1))
}

fn is_declaring_type(node: SyntaxNode<'_>) -> bool {
    node.kind() == SyntaxKind::ClassDeclaration
        && node.identifier().is_some_and(|t| t.text() == DECLARING_TYPE)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::test_support::*;
    use acl_lint_core::{
        ArenaTree, CancellationToken, LintResult, RuleEngine, SettingsResolver, SyntacticModel,
    };

    fn analyze(nullable: NullableContext, trees: &[ArenaTree]) -> (RuleEngine, LintResult) {
        let engine = RuleEngine::builder()
            .compilation_rule(RequireNullableContext::new())
            .build()
            .unwrap();
        let settings = SettingsResolver::default();
        let model = SyntacticModel::new(nullable);
        let compilation = trees
            .iter()
            .fold(Compilation::new(&model), |c, t| c.with_file(t, &settings));
        let result = engine
            .analyze_compilation(&compilation, &CancellationToken::new())
            .unwrap();
        (engine, result)
    }

    fn files(n: usize) -> Vec<ArenaTree> {
        (0..n)
            .map(|i| {
                let path = format!("File{i}.cs");
                tree(&path, vec![class("Widget", vec![])])
            })
            .collect()
    }

    #[test]
    fn test_disabled_reports_once_regardless_of_file_count() {
        for n in [1, 2, 7] {
            let (_, result) = analyze(NullableContext::Disabled, &files(n));
            assert_eq!(result.diagnostics.len(), 1, "{n} files");
            assert_eq!(
                result.diagnostics[0].message(),
                "Nullable reference types are disabled for this compilation"
            );
        }
    }

    #[test]
    fn test_other_contexts_are_fine() {
        for nullable in [
            NullableContext::Enabled,
            NullableContext::Warnings,
            NullableContext::Annotations,
        ] {
            let (_, result) = analyze(nullable, &files(3));
            assert!(result.diagnostics.is_empty(), "{nullable}");
        }
    }

    #[test]
    fn test_anchored_at_declaring_type_when_present() {
        let mut trees = files(2);
        trees.push(tree(
            "Analyzers.cs",
            vec![class("Widget", vec![]), class(DECLARING_TYPE, vec![])],
        ));
        let (_, result) = analyze(NullableContext::Disabled, &trees);
        let location = &result.diagnostics[0].location;
        assert_eq!(location.file, std::path::Path::new("Analyzers.cs"));
        assert_eq!(location.line, 3);
        assert_eq!(location.column, 7);
    }

    #[test]
    fn test_anchored_at_first_root_otherwise() {
        let (_, result) = analyze(NullableContext::Disabled, &files(2));
        let location = &result.diagnostics[0].location;
        assert_eq!(location.file, std::path::Path::new("File0.cs"));
        assert_eq!((location.line, location.column), (1, 1));
    }

    #[test]
    fn test_empty_compilation_still_reports() {
        let (_, result) = analyze(NullableContext::Disabled, &[]);
        assert_eq!(result.diagnostics.len(), 1);
        assert_eq!(result.diagnostics[0].location, Location::new("", 1, 1));
    }

    #[test]
    fn test_fix_enables_nullable() {
        let trees = files(1);
        let settings = SettingsResolver::default();
        let model = SyntacticModel::new(NullableContext::Disabled);
        let compilation = Compilation::new(&model).with_file(&trees[0], &settings);
        let (engine, result) = analyze(NullableContext::Disabled, &trees);

        let fix = engine
            .propose_fix(&result.diagnostics[0], &compilation)
            .unwrap();
        assert_eq!(
            fix.edit,
            FixEdit::SetCompilationOption {
                option: CompilationOption::Nullable,
                from: NullableContext::Disabled,
                to: NullableContext::Enabled,
            }
        );
        assert_eq!(
            engine.propose_fix(&result.diagnostics[0], &compilation),
            Some(fix)
        );
    }

    #[test]
    fn test_no_fix_once_enabled() {
        let trees = files(1);
        let (engine, result) = analyze(NullableContext::Disabled, &trees);
        let settings = SettingsResolver::default();
        let model = SyntacticModel::new(NullableContext::Enabled);
        let compilation = Compilation::new(&model).with_file(&trees[0], &settings);
        assert!(engine
            .propose_fix(&result.diagnostics[0], &compilation)
            .is_none());
    }
}
