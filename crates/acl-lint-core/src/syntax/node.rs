//! Borrowed node and token handles.

use super::{Element, NodeId, SyntaxKind, SyntaxTree, TextSpan, TokenId, TokenKind};
use std::borrow::Cow;

/// A node of a [`SyntaxTree`], borrowed for the duration of one analysis.
#[derive(Clone, Copy)]
pub struct SyntaxNode<'t> {
    tree: &'t dyn SyntaxTree,
    id: NodeId,
}

impl<'t> SyntaxNode<'t> {
    /// Wraps a node id of `tree`.
    #[must_use]
    pub fn new(tree: &'t dyn SyntaxTree, id: NodeId) -> Self {
        Self { tree, id }
    }

    /// The root node of `tree`.
    #[must_use]
    pub fn root(tree: &'t dyn SyntaxTree) -> Self {
        Self::new(tree, tree.root())
    }

    /// The owning tree.
    #[must_use]
    pub fn tree(&self) -> &'t dyn SyntaxTree {
        self.tree
    }

    /// The node id.
    #[must_use]
    pub fn id(&self) -> NodeId {
        self.id
    }

    /// Node kind.
    #[must_use]
    pub fn kind(&self) -> SyntaxKind {
        self.tree.node_kind(self.id)
    }

    /// Source span.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        self.tree.node_span(self.id)
    }

    /// Parent node.
    #[must_use]
    pub fn parent(&self) -> Option<Self> {
        self.tree.parent(self.id).map(|id| Self::new(self.tree, id))
    }

    /// Ancestors from the parent up to the root.
    pub fn ancestors(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::successors(self.parent(), SyntaxNode::parent)
    }

    /// Direct children, nodes and tokens, in source order.
    pub fn children(&self) -> impl Iterator<Item = SyntaxElement<'t>> + 't {
        let tree = self.tree;
        tree.children(self.id)
            .iter()
            .map(move |&element| SyntaxElement::new(tree, element))
    }

    /// Direct child nodes.
    pub fn child_nodes(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_node)
    }

    /// Direct child tokens.
    pub fn child_tokens(&self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.children().filter_map(SyntaxElement::into_token)
    }

    /// First direct child node of `kind`.
    #[must_use]
    pub fn first_child(&self, kind: SyntaxKind) -> Option<SyntaxNode<'t>> {
        self.child_nodes().find(|n| n.kind() == kind)
    }

    /// First direct child token of `kind`.
    #[must_use]
    pub fn first_child_token(&self, kind: TokenKind) -> Option<SyntaxToken<'t>> {
        self.child_tokens().find(|t| t.kind() == kind)
    }

    /// The identifier token naming this node, if it has one as a direct child.
    #[must_use]
    pub fn identifier(&self) -> Option<SyntaxToken<'t>> {
        self.first_child_token(TokenKind::Identifier)
    }

    /// Returns true if a direct child token is the keyword `keyword`.
    #[must_use]
    pub fn has_keyword(&self, keyword: &str) -> bool {
        self.child_tokens().any(|t| t.is_keyword(keyword))
    }

    /// Preorder walk over descendant nodes and tokens.
    ///
    /// `descend_into` decides whether the children of a node are visited; it is
    /// applied to this node as well, so returning `false` for it yields nothing.
    /// A node is always yielded before the predicate is asked about it.
    pub fn descendant_elements_with<F>(&self, descend_into: F) -> Descendants<'t, F>
    where
        F: FnMut(SyntaxNode<'t>) -> bool,
    {
        Descendants::new(*self, descend_into)
    }

    /// Preorder walk over all descendant nodes and tokens.
    pub fn descendant_elements(&self) -> Descendants<'t, fn(SyntaxNode<'t>) -> bool> {
        self.descendant_elements_with(always as fn(SyntaxNode<'t>) -> bool)
    }

    /// All descendant nodes in preorder, excluding this node.
    pub fn descendants(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        self.descendant_elements().filter_map(SyntaxElement::into_node)
    }

    /// Descendant nodes, only descending into nodes accepted by `descend_into`.
    pub fn descendants_with<F>(&self, descend_into: F) -> impl Iterator<Item = SyntaxNode<'t>> + 't
    where
        F: FnMut(SyntaxNode<'t>) -> bool + 't,
    {
        self.descendant_elements_with(descend_into)
            .filter_map(SyntaxElement::into_node)
    }

    /// All descendant tokens in source order.
    pub fn descendant_tokens(&self) -> impl Iterator<Item = SyntaxToken<'t>> + 't {
        self.descendant_elements().filter_map(SyntaxElement::into_token)
    }

    /// Descendant tokens, only descending into nodes accepted by `descend_into`.
    pub fn descendant_tokens_with<F>(
        &self,
        descend_into: F,
    ) -> impl Iterator<Item = SyntaxToken<'t>> + 't
    where
        F: FnMut(SyntaxNode<'t>) -> bool + 't,
    {
        self.descendant_elements_with(descend_into)
            .filter_map(SyntaxElement::into_token)
    }

    /// This node followed by all of its descendants.
    pub fn preorder(&self) -> impl Iterator<Item = SyntaxNode<'t>> + 't {
        std::iter::once(*self).chain(self.descendants())
    }

    /// Deepest node at or below this one whose span contains `span`.
    #[must_use]
    pub fn covering_node(&self, span: TextSpan) -> SyntaxNode<'t> {
        let mut current = *self;
        'descend: loop {
            for child in current.child_nodes() {
                if child.span().contains(span) {
                    current = child;
                    continue 'descend;
                }
            }
            return current;
        }
    }

    /// Rendered text of the node.
    ///
    /// Sliced from the source when the tree has it, otherwise the token texts
    /// concatenated without trivia.
    #[must_use]
    pub fn text(&self) -> Cow<'t, str> {
        let span = self.span();
        if let Some(text) = self
            .tree
            .source_text()
            .and_then(|source| source.get(span.start..span.end))
        {
            return Cow::Borrowed(text);
        }
        Cow::Owned(self.descendant_tokens().map(|t| t.text()).collect())
    }
}

fn always(_: SyntaxNode<'_>) -> bool {
    true
}

fn same_tree(a: &dyn SyntaxTree, b: &dyn SyntaxTree) -> bool {
    std::ptr::addr_eq(a, b)
}

impl PartialEq for SyntaxNode<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && same_tree(self.tree, other.tree)
    }
}

impl Eq for SyntaxNode<'_> {}

impl std::fmt::Debug for SyntaxNode<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxNode")
            .field("kind", &self.kind())
            .field("span", &self.span())
            .finish()
    }
}

/// A token of a [`SyntaxTree`].
#[derive(Clone, Copy)]
pub struct SyntaxToken<'t> {
    tree: &'t dyn SyntaxTree,
    id: TokenId,
}

impl<'t> SyntaxToken<'t> {
    /// Wraps a token id of `tree`.
    #[must_use]
    pub fn new(tree: &'t dyn SyntaxTree, id: TokenId) -> Self {
        Self { tree, id }
    }

    /// The owning tree.
    #[must_use]
    pub fn tree(&self) -> &'t dyn SyntaxTree {
        self.tree
    }

    /// The token id.
    #[must_use]
    pub fn id(&self) -> TokenId {
        self.id
    }

    /// Token kind.
    #[must_use]
    pub fn kind(&self) -> TokenKind {
        self.tree.token_kind(self.id)
    }

    /// Token text without trivia.
    #[must_use]
    pub fn text(&self) -> &'t str {
        self.tree.token_text(self.id)
    }

    /// Source span.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        self.tree.token_span(self.id)
    }

    /// Node owning this token.
    #[must_use]
    pub fn parent(&self) -> SyntaxNode<'t> {
        SyntaxNode::new(self.tree, self.tree.token_parent(self.id))
    }

    /// Returns true if this is the keyword `keyword`.
    #[must_use]
    pub fn is_keyword(&self, keyword: &str) -> bool {
        self.kind() == TokenKind::Keyword && self.text() == keyword
    }
}

impl PartialEq for SyntaxToken<'_> {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id && same_tree(self.tree, other.tree)
    }
}

impl Eq for SyntaxToken<'_> {}

impl std::fmt::Debug for SyntaxToken<'_> {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SyntaxToken")
            .field("kind", &self.kind())
            .field("text", &self.text())
            .field("span", &self.span())
            .finish()
    }
}

/// Either a node or a token.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SyntaxElement<'t> {
    /// A node.
    Node(SyntaxNode<'t>),
    /// A token.
    Token(SyntaxToken<'t>),
}

impl<'t> SyntaxElement<'t> {
    /// Wraps a raw child slot of `tree`.
    #[must_use]
    pub fn new(tree: &'t dyn SyntaxTree, element: Element) -> Self {
        match element {
            Element::Node(id) => Self::Node(SyntaxNode::new(tree, id)),
            Element::Token(id) => Self::Token(SyntaxToken::new(tree, id)),
        }
    }

    /// The node, if this is one.
    #[must_use]
    pub fn into_node(self) -> Option<SyntaxNode<'t>> {
        match self {
            Self::Node(node) => Some(node),
            Self::Token(_) => None,
        }
    }

    /// The token, if this is one.
    #[must_use]
    pub fn into_token(self) -> Option<SyntaxToken<'t>> {
        match self {
            Self::Token(token) => Some(token),
            Self::Node(_) => None,
        }
    }

    /// Source span.
    #[must_use]
    pub fn span(&self) -> TextSpan {
        match self {
            Self::Node(node) => node.span(),
            Self::Token(token) => token.span(),
        }
    }
}

/// Preorder iterator returned by [`SyntaxNode::descendant_elements_with`].
pub struct Descendants<'t, F> {
    tree: &'t dyn SyntaxTree,
    stack: Vec<(NodeId, usize)>,
    descend_into: F,
}

impl<'t, F> Descendants<'t, F>
where
    F: FnMut(SyntaxNode<'t>) -> bool,
{
    fn new(start: SyntaxNode<'t>, mut descend_into: F) -> Self {
        let mut stack = Vec::new();
        if descend_into(start) {
            stack.push((start.id, 0));
        }
        Self {
            tree: start.tree,
            stack,
            descend_into,
        }
    }
}

impl<'t, F> Iterator for Descendants<'t, F>
where
    F: FnMut(SyntaxNode<'t>) -> bool,
{
    type Item = SyntaxElement<'t>;

    fn next(&mut self) -> Option<Self::Item> {
        loop {
            let (node, index) = self.stack.last_mut()?;
            let Some(&element) = self.tree.children(*node).get(*index) else {
                self.stack.pop();
                continue;
            };
            *index += 1;

            if let Element::Node(child) = element {
                if (self.descend_into)(SyntaxNode::new(self.tree, child)) {
                    self.stack.push((child, 0));
                }
            }
            return Some(SyntaxElement::new(self.tree, element));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::syntax::ArenaTree;

    /// `items.Where(x => x.A)` with the argument subtree fully populated.
    fn invocation_tree() -> ArenaTree {
        let mut b = ArenaTree::builder("Query.cs");
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
            .start_node(SyntaxKind::SimpleLambdaExpression)
            .token_with_trivia(TokenKind::Identifier, "x", "")
            .token(TokenKind::Operator, "=>")
            .start_node(SyntaxKind::SimpleMemberAccessExpression)
            .start_node(SyntaxKind::IdentifierName)
            .token(TokenKind::Identifier, "x")
            .finish_node()
            .token_with_trivia(TokenKind::Punctuation, ".", "")
            .start_node(SyntaxKind::IdentifierName)
            .token_with_trivia(TokenKind::Identifier, "A", "")
            .finish_node()
            .finish_node()
            .finish_node()
            .finish_node()
            .token_with_trivia(TokenKind::Punctuation, ")", "")
            .finish_node()
            .finish_node()
            .finish_node();
        b.finish().expect("tree")
    }

    fn invocation(tree: &ArenaTree) -> SyntaxNode<'_> {
        tree.root_node()
            .first_child(SyntaxKind::InvocationExpression)
            .expect("invocation")
    }

    #[test]
    fn renders_text_from_source() {
        let tree = invocation_tree();
        assert_eq!(invocation(&tree).text(), "items.Where(x => x.A)");
    }

    #[test]
    fn descendant_tokens_are_in_source_order() {
        let tree = invocation_tree();
        let texts: Vec<&str> = invocation(&tree)
            .descendant_tokens()
            .map(|t| t.text())
            .collect();
        assert_eq!(texts, ["items", ".", "Where", "(", "x", "=>", "x", ".", "A", ")"]);
    }

    #[test]
    fn predicate_stops_descent_but_yields_the_node() {
        let tree = invocation_tree();
        let node = invocation(&tree);

        let kinds: Vec<SyntaxKind> = node
            .descendants_with(|n| n.kind() != SyntaxKind::Argument)
            .map(|n| n.kind())
            .collect();
        assert!(kinds.contains(&SyntaxKind::Argument));
        assert!(!kinds.contains(&SyntaxKind::SimpleLambdaExpression));

        let tokens: Vec<&str> = node
            .descendant_tokens_with(|n| n.kind() != SyntaxKind::Argument)
            .map(|t| t.text())
            .collect();
        assert_eq!(tokens, ["items", ".", "Where", "(", ")"]);
    }

    #[test]
    fn predicate_applies_to_the_start_node() {
        let tree = invocation_tree();
        assert_eq!(invocation(&tree).descendant_elements_with(|_| false).count(), 0);
    }

    #[test]
    fn ancestors_walk_to_the_root() {
        let tree = invocation_tree();
        let lambda = tree
            .root_node()
            .descendants()
            .find(|n| n.kind().is_lambda())
            .expect("lambda");
        let kinds: Vec<SyntaxKind> = lambda.ancestors().map(|n| n.kind()).collect();
        assert_eq!(
            kinds,
            [
                SyntaxKind::Argument,
                SyntaxKind::ArgumentList,
                SyntaxKind::InvocationExpression,
                SyntaxKind::CompilationUnit,
            ]
        );
    }

    #[test]
    fn covering_node_finds_the_deepest_match() {
        let tree = invocation_tree();
        let where_token = invocation(&tree)
            .descendant_tokens()
            .find(|t| t.text() == "Where")
            .expect("token");
        let covering = tree.root_node().covering_node(where_token.span());
        assert_eq!(covering.kind(), SyntaxKind::IdentifierName);
        assert_eq!(covering, where_token.parent());
    }
}
