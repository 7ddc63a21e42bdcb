//! Integration tests: rule registration, dispatch, fault isolation and
//! cancellation through the public engine API.

use acl_lint_core::{
    ArenaTree, CancellationToken, Category, Compilation, CompilationContext, CompilationRule,
    Config, EngineError, FileScope, FixEdit, FixProposal, FixRequest, Location, Rule, RuleContext,
    RuleDescriptor, RuleEngine, RuleError, SettingsResolver, Severity, SyntacticModel, SyntaxKind,
    TokenKind,
};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

const fn descriptor(id: &'static str, name: &'static str) -> RuleDescriptor {
    RuleDescriptor {
        id,
        name,
        title: "test",
        message_template: "saw {0}",
        category: Category::Usage,
        default_severity: Severity::Warning,
        enabled_by_default: true,
    }
}

static IDENTS: RuleDescriptor = descriptor("T001", "identifiers");
static FAILING: RuleDescriptor = descriptor("T002", "failing");
static PANICKING: RuleDescriptor = descriptor("T003", "panicking");
static LIMITED: RuleDescriptor = descriptor("T004", "limited");
static ONCE: RuleDescriptor = descriptor("T005", "once");
static CANCELLING: RuleDescriptor = descriptor("T006", "cancelling");
static COUNTING: RuleDescriptor = descriptor("T007", "counting");

/// Reports every identifier name.
struct Identifiers;

impl Rule for Identifiers {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &IDENTS
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::IdentifierName]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let node = ctx.node();
        let text = node.text().into_owned();
        ctx.report(node.span(), [text]);
        Ok(())
    }

    fn propose_fix(&self, request: &FixRequest<'_>) -> Option<FixProposal> {
        let old_name = request.diagnostic.message_args.first()?.clone();
        Some(FixProposal::new(
            IDENTS.id,
            "Uppercase",
            FixEdit::RenameSymbol {
                location: request.diagnostic.location.clone(),
                new_name: old_name.to_uppercase(),
                old_name,
            },
        ))
    }
}

/// Reports, then fails.
struct Failing;

impl Rule for Failing {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &FAILING
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::IdentifierName]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let node = ctx.node();
        ctx.report(node.span(), ["partial"]);
        Err(RuleError::Internal("unexpected shape".to_string()))
    }
}

struct Panicking;

impl Rule for Panicking {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &PANICKING
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::InvocationExpression]
    }

    fn evaluate(&self, _ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        panic!("index out of range");
    }
}

/// Needs an integer setting.
struct Limited;

impl Rule for Limited {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &LIMITED
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::CompilationUnit]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        let limit = ctx.setting_int("limit")?.unwrap_or(1);
        let node = ctx.node();
        ctx.report(node.span(), [limit.to_string()]);
        Ok(())
    }
}

struct Once {
    runs: AtomicUsize,
}

impl CompilationRule for Once {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &ONCE
    }

    fn evaluate(&self, ctx: &mut CompilationContext<'_>) -> Result<(), RuleError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        let files = ctx.compilation().files().len();
        ctx.report(Location::new("", 1, 1), [files.to_string()]);
        Ok(())
    }
}

/// Requests cancellation while it runs, then finishes normally.
struct Cancelling {
    token: CancellationToken,
    finished: Arc<AtomicUsize>,
}

impl Rule for Cancelling {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &CANCELLING
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::IdentifierName]
    }

    fn evaluate(&self, ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        self.token.cancel();
        let node = ctx.node();
        ctx.report(node.span(), ["cancelled"]);
        self.finished.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// Counts its invocations.
struct Counting {
    runs: Arc<AtomicUsize>,
}

impl Rule for Counting {
    fn descriptor(&self) -> &'static RuleDescriptor {
        &COUNTING
    }

    fn interests(&self) -> &'static [SyntaxKind] {
        &[SyntaxKind::IdentifierName]
    }

    fn evaluate(&self, _ctx: &mut RuleContext<'_>) -> Result<(), RuleError> {
        self.runs.fetch_add(1, Ordering::SeqCst);
        Ok(())
    }
}

/// `items.Where(x)` in file `path`.
fn tree(path: &str) -> ArenaTree {
    let mut b = ArenaTree::builder(path);
    b.start_node(SyntaxKind::CompilationUnit)
        .start_node(SyntaxKind::InvocationExpression)
        .start_node(SyntaxKind::SimpleMemberAccessExpression)
        .start_node(SyntaxKind::IdentifierName)
        .token(TokenKind::Identifier, "items")
        .finish_node()
        .token_with_trivia(TokenKind::Punctuation, ".", "")
        .start_node(SyntaxKind::IdentifierName)
        .token_with_trivia(TokenKind::Identifier, "Where", "")
        .finish_node()
        .finish_node()
        .start_node(SyntaxKind::ArgumentList)
        .token_with_trivia(TokenKind::Punctuation, "(", "")
        .start_node(SyntaxKind::Argument)
        .start_node(SyntaxKind::IdentifierName)
        .token_with_trivia(TokenKind::Identifier, "x", "")
        .finish_node()
        .finish_node()
        .token_with_trivia(TokenKind::Punctuation, ")", "")
        .finish_node()
        .finish_node()
        .finish_node();
    b.finish().expect("tree")
}

fn analyze(engine: &RuleEngine, trees: &[ArenaTree]) -> Result<acl_lint_core::LintResult, EngineError> {
    let model = SyntacticModel::default();
    let settings = SettingsResolver::default();
    let compilation = trees
        .iter()
        .fold(Compilation::new(&model), |c, t| c.with_file(t, &settings));
    engine.analyze_compilation(&compilation, &CancellationToken::new())
}

#[test]
fn dispatches_only_to_interested_rules() {
    let engine = RuleEngine::builder().rule(Identifiers).build().unwrap();
    let result = analyze(&engine, &[tree("A.cs")]).unwrap();

    let names: Vec<_> = result
        .diagnostics
        .iter()
        .map(|d| d.message_args[0].clone())
        .collect();
    assert_eq!(names, vec!["items", "Where", "x"]);
    assert_eq!(result.files_checked, 1);
}

#[test]
fn explicit_kinds_replace_declared_interests() {
    let mut engine = RuleEngine::new();
    engine
        .register_for(Identifiers, &[SyntaxKind::ArgumentList])
        .unwrap();
    let result = analyze(&engine, &[tree("A.cs")]).unwrap();
    assert_eq!(result.diagnostics.len(), 1);
    assert_eq!(result.diagnostics[0].message_args[0], "(x)");
}

#[test]
fn failing_rule_is_isolated() {
    let engine = RuleEngine::builder()
        .rule(Failing)
        .rule(Panicking)
        .rule(Identifiers)
        .build()
        .unwrap();
    let result = analyze(&engine, &[tree("A.cs")]).unwrap();

    // Other rules keep running on the same and later nodes.
    assert_eq!(result.by_rule("T001").count(), 3);
    // Partial output of the failed rule is discarded.
    assert_eq!(result.by_rule("T002").count(), 0);

    let failing: Vec<_> = result.faults.iter().filter(|f| f.rule_id == "T002").collect();
    assert_eq!(failing.len(), 3);
    assert_eq!(failing[0].message, "unexpected shape");

    let panicked: Vec<_> = result.faults.iter().filter(|f| f.rule_id == "T003").collect();
    assert_eq!(panicked.len(), 1);
    assert!(panicked[0].message.contains("index out of range"));
    assert_eq!(panicked[0].location.as_ref().map(|l| l.line), Some(1));
}

#[test]
fn malformed_setting_becomes_a_fault() {
    let engine = RuleEngine::builder().rule(Limited).build().unwrap();
    let tree = tree("A.cs");
    let model = SyntacticModel::default();
    let settings = SettingsResolver::new(
        acl_lint_core::StructuredProvider::new()
            .with(&acl_lint_core::SettingsKey::new("T004", "limit"), "lots"),
    );
    let compilation = Compilation::new(&model).with_file(&tree, &settings);

    let result = engine
        .analyze_compilation(&compilation, &CancellationToken::new())
        .unwrap();
    assert!(result.diagnostics.is_empty());
    assert_eq!(result.faults.len(), 1);
    assert!(result.faults[0].message.contains("dotnet_diagnostic.T004.limit"));
}

#[test]
fn cancellation_stops_before_the_next_rule() {
    let engine = RuleEngine::builder().rule(Identifiers).build().unwrap();
    let tree = tree("A.cs");
    let model = SyntacticModel::default();
    let settings = SettingsResolver::default();
    let compilation = Compilation::new(&model).with_file(&tree, &settings);

    let cancel = CancellationToken::new();
    cancel.cancel();
    let err = engine.analyze_compilation(&compilation, &cancel).unwrap_err();
    assert!(matches!(err, EngineError::Cancelled));
}

#[test]
fn cancelling_inside_a_rule_lets_it_finish_and_stops_later_rules() {
    let cancel = CancellationToken::new();
    let finished = Arc::new(AtomicUsize::new(0));
    let counted = Arc::new(AtomicUsize::new(0));
    let engine = RuleEngine::builder()
        .rule(Cancelling {
            token: cancel.clone(),
            finished: Arc::clone(&finished),
        })
        .rule(Counting {
            runs: Arc::clone(&counted),
        })
        .build()
        .unwrap();

    let tree = tree("A.cs");
    let model = SyntacticModel::default();
    let settings = SettingsResolver::default();
    let err = engine
        .analyze_tree(FileScope::new(&tree, &model, &settings), &cancel)
        .unwrap_err();

    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(finished.load(Ordering::SeqCst), 1);
    assert_eq!(counted.load(Ordering::SeqCst), 0);
}

#[test]
fn cancelling_inside_a_rule_stops_later_nodes() {
    let cancel = CancellationToken::new();
    let finished = Arc::new(AtomicUsize::new(0));
    let counted = Arc::new(AtomicUsize::new(0));
    // Counting runs first, so the first identifier sees both rules.
    let engine = RuleEngine::builder()
        .rule(Counting {
            runs: Arc::clone(&counted),
        })
        .rule(Cancelling {
            token: cancel.clone(),
            finished: Arc::clone(&finished),
        })
        .build()
        .unwrap();

    let tree = tree("A.cs");
    let model = SyntacticModel::default();
    let settings = SettingsResolver::default();
    let err = engine
        .analyze_tree(FileScope::new(&tree, &model, &settings), &cancel)
        .unwrap_err();

    // Three identifiers in the tree; only the first was visited.
    assert!(matches!(err, EngineError::Cancelled));
    assert_eq!(counted.load(Ordering::SeqCst), 1);
    assert_eq!(finished.load(Ordering::SeqCst), 1);
}

#[test]
fn compilation_rules_run_once() {
    let once = Once {
        runs: AtomicUsize::new(0),
    };
    let mut engine = RuleEngine::new();
    engine.register_compilation_rule(once).unwrap();

    let result = analyze(&engine, &[tree("A.cs"), tree("B.cs"), tree("C.cs")]).unwrap();
    let reported: Vec<_> = result.by_rule("T005").collect();
    assert_eq!(reported.len(), 1);
    assert_eq!(reported[0].message(), "saw 3");
    assert_eq!(result.files_checked, 3);
}

#[test]
fn disabled_rules_are_not_registered() {
    let config = Config::parse("[rules.T001]\nenabled = false\n").unwrap();
    let engine = RuleEngine::builder()
        .config(config)
        .rule(Identifiers)
        .rule(Limited)
        .build()
        .unwrap();

    assert!(!engine.is_registered("T001"));
    assert!(engine.is_registered("T004"));
    assert_eq!(engine.rule_count(), 1);
}

#[test]
fn configured_severity_applies_at_report_time() {
    let config = Config::parse("[rules.T001]\nseverity = \"error\"\n").unwrap();
    let engine = RuleEngine::builder()
        .config(config)
        .rule(Identifiers)
        .build()
        .unwrap();
    let result = analyze(&engine, &[tree("A.cs")]).unwrap();
    assert!(result.diagnostics.iter().all(|d| d.severity == Severity::Error));
}

#[test]
fn duplicate_ids_are_rejected() {
    let err = RuleEngine::builder()
        .rule(Identifiers)
        .rule(Identifiers)
        .build()
        .err()
        .expect("duplicate");
    assert!(matches!(err, EngineError::DuplicateRule(id) if id == "T001"));
}

#[test]
fn parallel_and_sequential_agree() {
    let trees: Vec<_> = (0..8).map(|i| tree(&format!("F{i}.cs"))).collect();

    let sequential = RuleEngine::builder()
        .parallelism(1)
        .rule(Identifiers)
        .build()
        .unwrap();
    let parallel = RuleEngine::builder()
        .parallelism(4)
        .rule(Identifiers)
        .build()
        .unwrap();

    let a = analyze(&sequential, &trees).unwrap();
    let b = analyze(&parallel, &trees).unwrap();
    assert_eq!(a.diagnostics, b.diagnostics);
    assert_eq!(a.diagnostics.len(), 24);
}

#[test]
fn repeated_analysis_is_identical() {
    let engine = RuleEngine::builder().rule(Identifiers).build().unwrap();
    let trees = [tree("A.cs")];
    let first = analyze(&engine, &trees).unwrap();
    let second = analyze(&engine, &trees).unwrap();
    assert_eq!(first.diagnostics, second.diagnostics);
}

#[test]
fn fixes_route_to_the_reporting_rule() {
    let engine = RuleEngine::builder()
        .rule(Identifiers)
        .rule(Limited)
        .build()
        .unwrap();
    let tree = tree("A.cs");
    let model = SyntacticModel::default();
    let settings = SettingsResolver::default();
    let compilation = Compilation::new(&model).with_file(&tree, &settings);
    let result = engine
        .analyze_compilation(&compilation, &CancellationToken::new())
        .unwrap();

    let ident = result.by_rule("T001").next().unwrap();
    let fix = engine.propose_fix(ident, &compilation).unwrap();
    assert!(matches!(
        fix.edit,
        FixEdit::RenameSymbol { ref new_name, .. } if new_name == "ITEMS"
    ));
    // Same request, same answer.
    assert_eq!(engine.propose_fix(ident, &compilation), Some(fix));

    let limited = result.by_rule("T004").next().unwrap();
    assert!(engine.propose_fix(limited, &compilation).is_none());
}
