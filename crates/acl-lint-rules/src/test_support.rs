//! C#-shaped fixture trees for rule tests.
//!
//! Fixtures are described with small expression/statement/member values and
//! emitted the way a compiler front end would lay them out, e.g.
//!
//! ```ignore
//! let tree = class("Orders", vec![method("Run", vec![local("total", add(num("5"), num("7")))])]).into_tree();
//! ```

use acl_lint_core::{
    ArenaTree, CancellationToken, Compilation, Diagnostic, LintResult, NullableContext, Rule,
    RuleEngine, SettingsResolver, SyntacticModel, SyntaxKind, TokenKind, TreeBuilder,
};

pub enum Expr {
    Num(&'static str),
    Name(&'static str),
    Str(&'static str),
    Binary(SyntaxKind, &'static str, Box<Expr>, Box<Expr>),
    Neg(Box<Expr>),
    Paren(Box<Expr>),
    Member(Box<Expr>, &'static str),
    Call(Box<Expr>, Vec<Expr>),
    Lambda(&'static str, Box<Expr>),
}

pub fn num(text: &'static str) -> Expr {
    Expr::Num(text)
}

pub fn name(text: &'static str) -> Expr {
    Expr::Name(text)
}

pub fn string(text: &'static str) -> Expr {
    Expr::Str(text)
}

pub fn binary(op: &'static str, left: Expr, right: Expr) -> Expr {
    let kind = match op {
        "+" => SyntaxKind::AddExpression,
        "-" => SyntaxKind::SubtractExpression,
        "*" => SyntaxKind::MultiplyExpression,
        "/" => SyntaxKind::DivideExpression,
        "%" => SyntaxKind::ModuloExpression,
        "&&" => SyntaxKind::LogicalAndExpression,
        "||" => SyntaxKind::LogicalOrExpression,
        "==" => SyntaxKind::EqualsExpression,
        ">" => SyntaxKind::GreaterThanExpression,
        "<" => SyntaxKind::LessThanExpression,
        "??" => SyntaxKind::CoalesceExpression,
        other => panic!("unsupported operator {other}"),
    };
    Expr::Binary(kind, op, Box::new(left), Box::new(right))
}

pub fn add(left: Expr, right: Expr) -> Expr {
    binary("+", left, right)
}

pub fn mul(left: Expr, right: Expr) -> Expr {
    binary("*", left, right)
}

/// Left-associative `a && b && ...`.
pub fn and_all(operands: Vec<Expr>) -> Expr {
    let mut iter = operands.into_iter();
    let first = iter.next().expect("at least one operand");
    iter.fold(first, |acc, next| binary("&&", acc, next))
}

pub fn neg(operand: Expr) -> Expr {
    Expr::Neg(Box::new(operand))
}

pub fn paren(inner: Expr) -> Expr {
    Expr::Paren(Box::new(inner))
}

pub fn member(receiver: Expr, name: &'static str) -> Expr {
    Expr::Member(Box::new(receiver), name)
}

/// `receiver.method(args...)`
pub fn call(receiver: Expr, method: &'static str, args: Vec<Expr>) -> Expr {
    Expr::Call(Box::new(member(receiver, method)), args)
}

pub fn lambda(param: &'static str, body: Expr) -> Expr {
    Expr::Lambda(param, Box::new(body))
}

pub enum Stmt {
    Local {
        is_const: bool,
        ty: &'static str,
        declarators: Vec<(&'static str, Option<Expr>)>,
    },
    Expr(Expr),
    Return(Expr),
}

/// `var name = init;`
pub fn local(name: &'static str, init: Expr) -> Stmt {
    Stmt::Local {
        is_const: false,
        ty: "var",
        declarators: vec![(name, Some(init))],
    }
}

/// `const int name = init;`
pub fn const_local(name: &'static str, init: Expr) -> Stmt {
    Stmt::Local {
        is_const: true,
        ty: "int",
        declarators: vec![(name, Some(init))],
    }
}

pub fn expr_stmt(expr: Expr) -> Stmt {
    Stmt::Expr(expr)
}

pub fn ret(expr: Expr) -> Stmt {
    Stmt::Return(expr)
}

pub enum Member {
    Field {
        modifiers: Vec<&'static str>,
        ty: &'static str,
        names: Vec<&'static str>,
    },
    Method {
        name: &'static str,
        body: Vec<Stmt>,
    },
}

/// `modifiers ty name;`
pub fn field(modifiers: &[&'static str], ty: &'static str, name: &'static str) -> Member {
    Member::Field {
        modifiers: modifiers.to_vec(),
        ty,
        names: vec![name],
    }
}

pub fn method(name: &'static str, body: Vec<Stmt>) -> Member {
    Member::Method { name, body }
}

pub struct Class {
    pub name: &'static str,
    pub members: Vec<Member>,
}

pub fn class(name: &'static str, members: Vec<Member>) -> Class {
    Class { name, members }
}

impl Class {
    pub fn into_tree(self) -> ArenaTree {
        tree("Fixture.cs", vec![self])
    }
}

/// One compilation unit holding `classes`.
pub fn tree(path: &str, classes: Vec<Class>) -> ArenaTree {
    let mut e = Emitter::new(path);
    e.b.start_node(SyntaxKind::CompilationUnit);
    for class in &classes {
        e.class(class);
    }
    e.b.finish_node();
    e.b.finish().expect("fixture tree is well formed")
}

/// A class with one method whose body is `body`.
pub fn in_method(body: Vec<Stmt>) -> ArenaTree {
    class("Fixture", vec![method("Run", body)]).into_tree()
}

/// Writes fixtures with conventional spacing: nothing after `(` or `.`,
/// nothing before `)`, `;`, `,` or `.`, one space elsewhere.
struct Emitter {
    b: TreeBuilder,
    tight: bool,
}

impl Emitter {
    fn new(path: &str) -> Self {
        Self {
            b: ArenaTree::builder(path),
            tight: false,
        }
    }

    fn tok(&mut self, kind: TokenKind, text: &str) {
        if std::mem::take(&mut self.tight) {
            self.b.token_with_trivia(kind, text, "");
        } else {
            self.b.token(kind, text);
        }
    }

    fn punct(&mut self, text: &str) {
        self.tight = false;
        self.b.token_with_trivia(TokenKind::Punctuation, text, "");
        self.tight = matches!(text, "(" | ".");
    }

    fn newline(&mut self) {
        self.tight = false;
        self.b.newline();
    }

    fn class(&mut self, class: &Class) {
        self.b.start_node(SyntaxKind::ClassDeclaration);
        self.tok(TokenKind::Keyword, "class");
        self.tok(TokenKind::Identifier, class.name);
        self.tok(TokenKind::Punctuation, "{");
        self.newline();
        for member in &class.members {
            self.member(member);
            self.newline();
        }
        self.tok(TokenKind::Punctuation, "}");
        self.b.finish_node();
        self.newline();
    }

    fn ty(&mut self, ty: &str) {
        if matches!(ty, "int" | "long" | "double" | "decimal" | "string" | "bool") {
            self.b.start_node(SyntaxKind::PredefinedType);
            self.tok(TokenKind::Keyword, ty);
        } else {
            self.b.start_node(SyntaxKind::IdentifierName);
            self.tok(TokenKind::Identifier, ty);
        }
        self.b.finish_node();
    }

    fn member(&mut self, member: &Member) {
        match member {
            Member::Field {
                modifiers,
                ty,
                names,
            } => {
                self.b.start_node(SyntaxKind::FieldDeclaration);
                for modifier in modifiers {
                    self.tok(TokenKind::Keyword, modifier);
                }
                self.b.start_node(SyntaxKind::VariableDeclaration);
                self.ty(ty);
                for (i, name) in names.iter().enumerate() {
                    if i > 0 {
                        self.punct(",");
                    }
                    self.b.start_node(SyntaxKind::VariableDeclarator);
                    self.tok(TokenKind::Identifier, name);
                    self.b.finish_node();
                }
                self.b.finish_node();
                self.punct(";");
                self.b.finish_node();
            }
            Member::Method { name, body } => {
                self.b.start_node(SyntaxKind::MethodDeclaration);
                self.tok(TokenKind::Keyword, "void");
                self.tok(TokenKind::Identifier, name);
                self.b.start_node(SyntaxKind::ParameterList);
                self.punct("(");
                self.punct(")");
                self.b.finish_node();
                self.b.start_node(SyntaxKind::Block);
                self.tok(TokenKind::Punctuation, "{");
                self.newline();
                for stmt in body {
                    self.stmt(stmt);
                    self.newline();
                }
                self.tok(TokenKind::Punctuation, "}");
                self.b.finish_node();
                self.b.finish_node();
            }
        }
    }

    fn stmt(&mut self, stmt: &Stmt) {
        match stmt {
            Stmt::Local {
                is_const,
                ty,
                declarators,
            } => {
                self.b.start_node(SyntaxKind::LocalDeclarationStatement);
                if *is_const {
                    self.tok(TokenKind::Keyword, "const");
                }
                self.b.start_node(SyntaxKind::VariableDeclaration);
                self.ty(ty);
                for (i, (name, init)) in declarators.iter().enumerate() {
                    if i > 0 {
                        self.punct(",");
                    }
                    self.b.start_node(SyntaxKind::VariableDeclarator);
                    self.tok(TokenKind::Identifier, name);
                    if let Some(init) = init {
                        self.b.start_node(SyntaxKind::EqualsValueClause);
                        self.tok(TokenKind::Operator, "=");
                        self.expr(init);
                        self.b.finish_node();
                    }
                    self.b.finish_node();
                }
                self.b.finish_node();
                self.punct(";");
                self.b.finish_node();
            }
            Stmt::Expr(expr) => {
                self.b.start_node(SyntaxKind::ExpressionStatement);
                self.expr(expr);
                self.punct(";");
                self.b.finish_node();
            }
            Stmt::Return(expr) => {
                self.b.start_node(SyntaxKind::ReturnStatement);
                self.tok(TokenKind::Keyword, "return");
                self.expr(expr);
                self.punct(";");
                self.b.finish_node();
            }
        }
    }

    fn expr(&mut self, expr: &Expr) {
        match expr {
            Expr::Num(text) => {
                self.b.start_node(SyntaxKind::NumericLiteralExpression);
                self.tok(TokenKind::NumericLiteral, text);
                self.b.finish_node();
            }
            Expr::Name(text) => {
                self.b.start_node(SyntaxKind::IdentifierName);
                self.tok(TokenKind::Identifier, text);
                self.b.finish_node();
            }
            Expr::Str(text) => {
                self.b.start_node(SyntaxKind::StringLiteralExpression);
                self.tok(TokenKind::StringLiteral, &format!("\"{text}\""));
                self.b.finish_node();
            }
            Expr::Binary(kind, op, left, right) => {
                let token = if *op == "&&" {
                    TokenKind::AmpersandAmpersand
                } else {
                    TokenKind::Operator
                };
                self.b.start_node(*kind);
                self.expr(left);
                self.tok(token, op);
                self.expr(right);
                self.b.finish_node();
            }
            Expr::Neg(operand) => {
                self.b.start_node(SyntaxKind::UnaryMinusExpression);
                self.tok(TokenKind::Operator, "-");
                self.tight = true;
                self.expr(operand);
                self.b.finish_node();
            }
            Expr::Paren(inner) => {
                self.b.start_node(SyntaxKind::ParenthesizedExpression);
                self.tok(TokenKind::Punctuation, "(");
                self.tight = true;
                self.expr(inner);
                self.punct(")");
                self.b.finish_node();
            }
            Expr::Member(receiver, name) => {
                self.b.start_node(SyntaxKind::SimpleMemberAccessExpression);
                self.expr(receiver);
                self.punct(".");
                self.b.start_node(SyntaxKind::IdentifierName);
                self.tok(TokenKind::Identifier, name);
                self.b.finish_node();
                self.b.finish_node();
            }
            Expr::Call(target, args) => {
                self.b.start_node(SyntaxKind::InvocationExpression);
                self.expr(target);
                self.b.start_node(SyntaxKind::ArgumentList);
                self.punct("(");
                for (i, arg) in args.iter().enumerate() {
                    if i > 0 {
                        self.punct(",");
                    }
                    self.b.start_node(SyntaxKind::Argument);
                    self.expr(arg);
                    self.b.finish_node();
                }
                self.punct(")");
                self.b.finish_node();
                self.b.finish_node();
            }
            Expr::Lambda(param, body) => {
                self.b.start_node(SyntaxKind::SimpleLambdaExpression);
                self.tok(TokenKind::Identifier, param);
                self.tok(TokenKind::Operator, "=>");
                self.expr(body);
                self.b.finish_node();
            }
        }
    }
}

/// Runs `rule` over `trees` with `settings`, returning the full result.
pub fn run_with<R: Rule + 'static>(
    rule: R,
    trees: &[ArenaTree],
    settings: &SettingsResolver,
) -> LintResult {
    let engine = RuleEngine::builder().rule(rule).build().expect("engine");
    let model = SyntacticModel::new(NullableContext::Enabled);
    let compilation = trees
        .iter()
        .fold(Compilation::new(&model), |c, t| c.with_file(t, settings));
    engine
        .analyze_compilation(&compilation, &CancellationToken::new())
        .expect("analysis")
}

/// Runs `rule` over one tree with default settings.
pub fn check<R: Rule + 'static>(rule: R, tree: &ArenaTree) -> Vec<Diagnostic> {
    let result = run_with(rule, std::slice::from_ref(tree), &SettingsResolver::default());
    assert!(result.faults.is_empty(), "unexpected faults: {:?}", result.faults);
    result.diagnostics
}
