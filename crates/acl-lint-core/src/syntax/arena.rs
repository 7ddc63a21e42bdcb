//! In-memory syntax tree and its builder.

use super::{
    Element, NodeId, SyntaxKind, SyntaxNode, SyntaxTree, TextSpan, TokenId, TokenKind, TreeError,
};
use crate::settings::{SettingsKey, SiteOverride};
use std::path::{Path, PathBuf};

#[derive(Debug, Clone)]
struct NodeData {
    kind: SyntaxKind,
    span: TextSpan,
    parent: Option<NodeId>,
    children: Vec<Element>,
    overrides: Vec<SiteOverride>,
}

#[derive(Debug, Clone)]
struct TokenData {
    kind: TokenKind,
    text: String,
    span: TextSpan,
    parent: NodeId,
}

/// Arena-backed [`SyntaxTree`].
///
/// Source text is reassembled from token text and leading trivia, so spans,
/// line/column positions and rendered node text are always consistent.
#[derive(Debug, Clone)]
pub struct ArenaTree {
    path: PathBuf,
    source: String,
    line_starts: Vec<usize>,
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
}

impl ArenaTree {
    /// Starts building a tree for the file at `path`.
    #[must_use]
    pub fn builder(path: impl Into<PathBuf>) -> TreeBuilder {
        TreeBuilder::new(path)
    }

    /// The root as a node handle.
    #[must_use]
    pub fn root_node(&self) -> SyntaxNode<'_> {
        SyntaxNode::root(self)
    }

    /// The reassembled source text.
    #[must_use]
    pub fn source(&self) -> &str {
        &self.source
    }

    /// Number of nodes in the tree.
    #[must_use]
    pub fn node_count(&self) -> usize {
        self.nodes.len()
    }

    /// Number of tokens in the tree.
    #[must_use]
    pub fn token_count(&self) -> usize {
        self.tokens.len()
    }

    fn node(&self, id: NodeId) -> &NodeData {
        &self.nodes[id.0 as usize]
    }

    fn token(&self, id: TokenId) -> &TokenData {
        &self.tokens[id.0 as usize]
    }
}

impl SyntaxTree for ArenaTree {
    fn path(&self) -> &Path {
        &self.path
    }

    fn root(&self) -> NodeId {
        NodeId(0)
    }

    fn node_kind(&self, node: NodeId) -> SyntaxKind {
        self.node(node).kind
    }

    fn node_span(&self, node: NodeId) -> TextSpan {
        self.node(node).span
    }

    fn parent(&self, node: NodeId) -> Option<NodeId> {
        self.node(node).parent
    }

    fn children(&self, node: NodeId) -> &[Element] {
        &self.node(node).children
    }

    fn token_kind(&self, token: TokenId) -> TokenKind {
        self.token(token).kind
    }

    fn token_text(&self, token: TokenId) -> &str {
        &self.token(token).text
    }

    fn token_span(&self, token: TokenId) -> TextSpan {
        self.token(token).span
    }

    fn token_parent(&self, token: TokenId) -> NodeId {
        self.token(token).parent
    }

    fn source_text(&self) -> Option<&str> {
        Some(&self.source)
    }

    fn line_col(&self, offset: usize) -> (usize, usize) {
        let line = match self.line_starts.binary_search(&offset) {
            Ok(line) => line,
            Err(line) => line.saturating_sub(1),
        };
        let line_start = self.line_starts.get(line).copied().unwrap_or(0);
        (line + 1, offset.saturating_sub(line_start) + 1)
    }

    fn overrides(&self, node: NodeId) -> &[SiteOverride] {
        &self.node(node).overrides
    }
}

/// Start/finish builder for [`ArenaTree`].
///
/// Misuse (tokens outside a node, unbalanced finishes) is recorded and
/// reported by [`TreeBuilder::finish`], so calls can be chained freely.
///
/// ```ignore
/// let mut b = ArenaTree::builder("Program.cs");
/// b.start_node(SyntaxKind::CompilationUnit)
///     .start_node(SyntaxKind::IdentifierName)
///     .token(TokenKind::Identifier, "x")
///     .finish_node()
///     .finish_node();
/// let tree = b.finish()?;
/// ```
#[derive(Debug)]
pub struct TreeBuilder {
    path: PathBuf,
    source: String,
    nodes: Vec<NodeData>,
    tokens: Vec<TokenData>,
    open: Vec<NodeId>,
    error: Option<TreeError>,
}

impl TreeBuilder {
    /// Creates an empty builder.
    #[must_use]
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            source: String::new(),
            nodes: Vec::new(),
            tokens: Vec::new(),
            open: Vec::new(),
            error: None,
        }
    }

    /// Opens a node of `kind` as a child of the current node.
    pub fn start_node(&mut self, kind: SyntaxKind) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let parent = self.open.last().copied();
        if parent.is_none() && !self.nodes.is_empty() {
            self.error = Some(TreeError::MultipleRoots(kind));
            return self;
        }

        let id = NodeId(index_u32(self.nodes.len()));
        let here = self.source.len();
        self.nodes.push(NodeData {
            kind,
            span: TextSpan::new(here, here),
            parent,
            children: Vec::new(),
            overrides: Vec::new(),
        });
        if let Some(parent) = parent {
            self.nodes[parent.0 as usize].children.push(Element::Node(id));
        }
        self.open.push(id);
        self
    }

    /// Closes the current node.
    pub fn finish_node(&mut self) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(id) = self.open.pop() else {
            self.error = Some(TreeError::UnbalancedFinish);
            return self;
        };

        let node = &self.nodes[id.0 as usize];
        if let (Some(&first), Some(&last)) = (node.children.first(), node.children.last()) {
            let span = TextSpan::new(self.element_span(first).start, self.element_span(last).end);
            self.nodes[id.0 as usize].span = span;
        }
        self
    }

    /// Adds a token to the current node, separated from the previous token by
    /// a single space unless the source already ends in whitespace.
    pub fn token(&mut self, kind: TokenKind, text: &str) -> &mut Self {
        let leading = match self.source.chars().last() {
            Some(c) if !c.is_whitespace() => " ",
            _ => "",
        };
        self.token_with_trivia(kind, text, leading)
    }

    /// Adds a token preceded by exactly `leading` trivia.
    pub fn token_with_trivia(&mut self, kind: TokenKind, text: &str, leading: &str) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(&parent) = self.open.last() else {
            self.error = Some(TreeError::TokenOutsideNode {
                text: text.to_string(),
            });
            return self;
        };

        self.source.push_str(leading);
        let start = self.source.len();
        self.source.push_str(text);
        let id = TokenId(index_u32(self.tokens.len()));
        self.tokens.push(TokenData {
            kind,
            text: text.to_string(),
            span: TextSpan::new(start, self.source.len()),
            parent,
        });
        self.nodes[parent.0 as usize]
            .children
            .push(Element::Token(id));
        self
    }

    /// Appends a line break to the source.
    pub fn newline(&mut self) -> &mut Self {
        self.source.push('\n');
        self
    }

    /// Attaches a setting override to the current node.
    pub fn override_setting(
        &mut self,
        key: SettingsKey,
        value: impl Into<String>,
    ) -> &mut Self {
        if self.error.is_some() {
            return self;
        }
        let Some(&current) = self.open.last() else {
            self.error = Some(TreeError::OverrideOutsideNode(key.canonical()));
            return self;
        };
        self.nodes[current.0 as usize]
            .overrides
            .push(SiteOverride::new(key, value));
        self
    }

    /// Finishes the tree.
    ///
    /// # Errors
    ///
    /// Returns the first structural error recorded while building, or an error
    /// if nodes are still open or no node was ever started.
    pub fn finish(self) -> Result<ArenaTree, TreeError> {
        if let Some(error) = self.error {
            return Err(error);
        }
        if let Some(&open) = self.open.last() {
            return Err(TreeError::Unclosed(self.nodes[open.0 as usize].kind));
        }
        if self.nodes.is_empty() {
            return Err(TreeError::Empty);
        }

        let line_starts = std::iter::once(0)
            .chain(
                self.source
                    .bytes()
                    .enumerate()
                    .filter(|&(_, b)| b == b'\n')
                    .map(|(i, _)| i + 1),
            )
            .collect();

        Ok(ArenaTree {
            path: self.path,
            source: self.source,
            line_starts,
            nodes: self.nodes,
            tokens: self.tokens,
        })
    }

    fn element_span(&self, element: Element) -> TextSpan {
        match element {
            Element::Node(id) => self.nodes[id.0 as usize].span,
            Element::Token(id) => self.tokens[id.0 as usize].span,
        }
    }
}

fn index_u32(len: usize) -> u32 {
    u32::try_from(len).unwrap_or(u32::MAX)
}

#[cfg(test)]
mod tests {
    use super::*;

    /// `var total = a && b;` as a tiny compilation unit.
    fn sample() -> ArenaTree {
        let mut b = ArenaTree::builder("Sample.cs");
        b.start_node(SyntaxKind::CompilationUnit)
            .start_node(SyntaxKind::LocalDeclarationStatement)
            .start_node(SyntaxKind::VariableDeclaration)
            .token(TokenKind::Keyword, "var")
            .start_node(SyntaxKind::VariableDeclarator)
            .token(TokenKind::Identifier, "total")
            .start_node(SyntaxKind::EqualsValueClause)
            .token(TokenKind::Operator, "=")
            .start_node(SyntaxKind::LogicalAndExpression)
            .start_node(SyntaxKind::IdentifierName)
            .token(TokenKind::Identifier, "a")
            .finish_node()
            .token(TokenKind::AmpersandAmpersand, "&&")
            .start_node(SyntaxKind::IdentifierName)
            .token(TokenKind::Identifier, "b")
            .finish_node()
            .finish_node()
            .finish_node()
            .finish_node()
            .finish_node()
            .token_with_trivia(TokenKind::Punctuation, ";", "")
            .finish_node()
            .newline()
            .finish_node();
        b.finish().expect("sample tree should build")
    }

    #[test]
    fn reassembles_source_with_default_spacing() {
        let tree = sample();
        assert_eq!(tree.source(), "var total = a && b;\n");
    }

    #[test]
    fn node_spans_cover_their_tokens() {
        let tree = sample();
        let and = tree
            .root_node()
            .descendants()
            .find(|n| n.kind() == SyntaxKind::LogicalAndExpression)
            .expect("and expression");
        assert_eq!(and.text(), "a && b");

        let statement = tree
            .root_node()
            .first_child(SyntaxKind::LocalDeclarationStatement)
            .expect("statement");
        assert_eq!(statement.text(), "var total = a && b;");
    }

    #[test]
    fn line_col_is_one_indexed() {
        let mut b = ArenaTree::builder("Lines.cs");
        b.start_node(SyntaxKind::CompilationUnit)
            .token(TokenKind::Identifier, "first")
            .newline()
            .token_with_trivia(TokenKind::Identifier, "second", "    ")
            .finish_node();
        let tree = b.finish().expect("tree");

        let second = tree.root_node().child_tokens().nth(1).expect("token");
        assert_eq!(tree.line_col(second.span().start), (2, 5));
        assert_eq!(tree.line_col(0), (1, 1));
    }

    #[test]
    fn token_outside_node_is_an_error() {
        let mut b = ArenaTree::builder("Bad.cs");
        b.token(TokenKind::Identifier, "x");
        assert!(matches!(
            b.finish(),
            Err(TreeError::TokenOutsideNode { .. })
        ));
    }

    #[test]
    fn unclosed_node_is_an_error() {
        let mut b = ArenaTree::builder("Bad.cs");
        b.start_node(SyntaxKind::CompilationUnit)
            .start_node(SyntaxKind::Block);
        assert!(matches!(
            b.finish(),
            Err(TreeError::Unclosed(SyntaxKind::Block))
        ));
    }

    #[test]
    fn second_root_is_an_error() {
        let mut b = ArenaTree::builder("Bad.cs");
        b.start_node(SyntaxKind::CompilationUnit)
            .finish_node()
            .start_node(SyntaxKind::CompilationUnit);
        assert!(matches!(b.finish(), Err(TreeError::MultipleRoots(_))));
    }

    #[test]
    fn empty_builder_is_an_error() {
        assert!(matches!(
            ArenaTree::builder("Empty.cs").finish(),
            Err(TreeError::Empty)
        ));
    }

    #[test]
    fn overrides_attach_to_the_open_node() {
        let mut b = ArenaTree::builder("Override.cs");
        b.start_node(SyntaxKind::CompilationUnit)
            .start_node(SyntaxKind::MethodDeclaration)
            .override_setting(SettingsKey::new("ACL1003", "max_where_clauses"), "5")
            .token(TokenKind::Identifier, "Run")
            .finish_node()
            .finish_node();
        let tree = b.finish().expect("tree");

        let method = tree
            .root_node()
            .first_child(SyntaxKind::MethodDeclaration)
            .expect("method");
        assert_eq!(tree.overrides(method.id()).len(), 1);
        assert!(tree.overrides(tree.root()).is_empty());
    }
}
