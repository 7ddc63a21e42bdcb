//! Syntax tree abstraction.
//!
//! The engine never sees a concrete compiler object model. Hosts expose their
//! trees through the narrow [`SyntaxTree`] capability and rules walk them via
//! the [`SyntaxNode`] / [`SyntaxToken`] handles, which implement traversal once
//! for every tree implementation.
//!
//! [`ArenaTree`] is the in-memory implementation used by the CLI (from JSON
//! dumps) and by tests (from a [`TreeBuilder`]).

mod arena;
mod dump;
mod node;

pub use arena::{ArenaTree, TreeBuilder};
pub use dump::{ElementDump, NodeDump, TokenDump, TreeDump};
pub use node::{Descendants, SyntaxElement, SyntaxNode, SyntaxToken};

use crate::settings::SiteOverride;
use serde::{Deserialize, Serialize};
use std::path::Path;

/// Kind tag of a syntax node.
///
/// Mirrors the node kinds of a C#-like compiler tree. Hosts map anything the
/// built-in rules do not care about to [`SyntaxKind::Other`].
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SyntaxKind {
    CompilationUnit,
    NamespaceDeclaration,
    ClassDeclaration,
    StructDeclaration,
    InterfaceDeclaration,
    RecordDeclaration,
    FieldDeclaration,
    MethodDeclaration,
    PropertyDeclaration,
    ConstructorDeclaration,
    LocalFunctionStatement,
    AttributeList,
    Attribute,
    ParameterList,
    Parameter,
    Block,
    LocalDeclarationStatement,
    ExpressionStatement,
    ReturnStatement,
    VariableDeclaration,
    VariableDeclarator,
    EqualsValueClause,
    InvocationExpression,
    SimpleMemberAccessExpression,
    ArgumentList,
    Argument,
    SimpleLambdaExpression,
    ParenthesizedLambdaExpression,
    ParenthesizedExpression,
    IdentifierName,
    PredefinedType,
    NumericLiteralExpression,
    StringLiteralExpression,
    TrueLiteralExpression,
    FalseLiteralExpression,
    NullLiteralExpression,
    UnaryMinusExpression,
    LogicalNotExpression,
    AddExpression,
    SubtractExpression,
    MultiplyExpression,
    DivideExpression,
    ModuloExpression,
    LogicalAndExpression,
    LogicalOrExpression,
    EqualsExpression,
    NotEqualsExpression,
    LessThanExpression,
    LessThanOrEqualExpression,
    GreaterThanExpression,
    GreaterThanOrEqualExpression,
    CoalesceExpression,
    SimpleAssignmentExpression,
    Other,
}

impl SyntaxKind {
    /// Returns true for every binary expression kind.
    #[must_use]
    pub fn is_binary_expression(self) -> bool {
        matches!(
            self,
            Self::AddExpression
                | Self::SubtractExpression
                | Self::MultiplyExpression
                | Self::DivideExpression
                | Self::ModuloExpression
                | Self::LogicalAndExpression
                | Self::LogicalOrExpression
                | Self::EqualsExpression
                | Self::NotEqualsExpression
                | Self::LessThanExpression
                | Self::LessThanOrEqualExpression
                | Self::GreaterThanExpression
                | Self::GreaterThanOrEqualExpression
                | Self::CoalesceExpression
        )
    }

    /// Returns true for simple and parenthesized lambdas.
    #[must_use]
    pub fn is_lambda(self) -> bool {
        matches!(
            self,
            Self::SimpleLambdaExpression | Self::ParenthesizedLambdaExpression
        )
    }

    /// Returns true for declarations that name a type member.
    #[must_use]
    pub fn is_member_declaration(self) -> bool {
        matches!(
            self,
            Self::MethodDeclaration
                | Self::PropertyDeclaration
                | Self::ConstructorDeclaration
                | Self::LocalFunctionStatement
        )
    }

    /// Returns true for type declarations.
    #[must_use]
    pub fn is_type_declaration(self) -> bool {
        matches!(
            self,
            Self::ClassDeclaration
                | Self::StructDeclaration
                | Self::InterfaceDeclaration
                | Self::RecordDeclaration
        )
    }
}

impl std::fmt::Display for SyntaxKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Kind tag of a syntax token.
#[allow(missing_docs)]
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TokenKind {
    Identifier,
    Keyword,
    NumericLiteral,
    StringLiteral,
    CharacterLiteral,
    /// The `&&` operator.
    AmpersandAmpersand,
    Operator,
    Punctuation,
}

/// Half-open byte range `[start, end)` into the tree's source text.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct TextSpan {
    /// Start offset (inclusive).
    pub start: usize,
    /// End offset (exclusive).
    pub end: usize,
}

impl TextSpan {
    /// Creates a span.
    #[must_use]
    pub fn new(start: usize, end: usize) -> Self {
        Self { start, end }
    }

    /// Length of the span in bytes.
    #[must_use]
    pub fn len(self) -> usize {
        self.end.saturating_sub(self.start)
    }

    /// Returns true for zero-width spans.
    #[must_use]
    pub fn is_empty(self) -> bool {
        self.len() == 0
    }

    /// Returns true if `other` lies entirely within this span.
    #[must_use]
    pub fn contains(self, other: TextSpan) -> bool {
        self.start <= other.start && other.end <= self.end
    }
}

/// Opaque handle of a node within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct NodeId(pub u32);

/// Opaque handle of a token within one tree.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct TokenId(pub u32);

/// A child slot: either a node or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Element {
    /// Child node.
    Node(NodeId),
    /// Child token.
    Token(TokenId),
}

/// Tree-walk capability supplied by the host.
///
/// Implementations must be immutable once handed to the engine; trees from
/// different files are analyzed concurrently.
pub trait SyntaxTree: Send + Sync {
    /// Path of the file this tree was produced from.
    fn path(&self) -> &Path;

    /// The root node (usually a compilation unit).
    fn root(&self) -> NodeId;

    /// Kind of a node.
    fn node_kind(&self, node: NodeId) -> SyntaxKind;

    /// Source span covered by a node.
    fn node_span(&self, node: NodeId) -> TextSpan;

    /// Parent of a node, `None` for the root.
    fn parent(&self, node: NodeId) -> Option<NodeId>;

    /// Children of a node in source order.
    fn children(&self, node: NodeId) -> &[Element];

    /// Kind of a token.
    fn token_kind(&self, token: TokenId) -> TokenKind;

    /// Text of a token, without trivia.
    fn token_text(&self, token: TokenId) -> &str;

    /// Source span of a token.
    fn token_span(&self, token: TokenId) -> TextSpan;

    /// Node owning a token.
    fn token_parent(&self, token: TokenId) -> NodeId;

    /// Full source text, when the host has it.
    fn source_text(&self) -> Option<&str> {
        None
    }

    /// Converts a byte offset to a 1-indexed `(line, column)` pair.
    fn line_col(&self, offset: usize) -> (usize, usize) {
        (1, offset + 1)
    }

    /// Setting overrides attached to a declaration node.
    fn overrides(&self, _node: NodeId) -> &[SiteOverride] {
        &[]
    }
}

/// Errors raised while building or decoding a tree.
#[derive(Debug, thiserror::Error)]
pub enum TreeError {
    /// A token was added while no node was open.
    #[error("token `{text}` has no enclosing node")]
    TokenOutsideNode {
        /// Text of the orphaned token.
        text: String,
    },

    /// `finish_node` was called with no open node.
    #[error("finish_node called without a matching start_node")]
    UnbalancedFinish,

    /// The tree was finished while nodes were still open.
    #[error("node {0} was never finished")]
    Unclosed(SyntaxKind),

    /// A second root node was started.
    #[error("tree already has a root; cannot start another {0}")]
    MultipleRoots(SyntaxKind),

    /// No node was ever started.
    #[error("tree has no root node")]
    Empty,

    /// Override attached while no node was open.
    #[error("setting override {0} has no enclosing node")]
    OverrideOutsideNode(String),
}
