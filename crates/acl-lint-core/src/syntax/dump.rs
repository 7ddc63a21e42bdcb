//! Serializable tree dumps.
//!
//! Hosts that run out of process hand trees to the engine as JSON:
//!
//! ```json
//! {
//!   "path": "src/Orders.cs",
//!   "root": {
//!     "kind": "CompilationUnit",
//!     "children": [
//!       { "kind": "IdentifierName", "children": [ { "token": "Identifier", "text": "x" } ] }
//!     ]
//!   }
//! }
//! ```

use super::{ArenaTree, SyntaxElement, SyntaxKind, SyntaxNode, SyntaxTree, TokenKind, TreeBuilder, TreeError};
use crate::settings::SiteOverride;
use serde::{Deserialize, Serialize};
use std::path::PathBuf;

/// A whole tree.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TreeDump {
    /// Path of the source file.
    pub path: PathBuf,
    /// Root node.
    pub root: NodeDump,
}

/// A node and its children.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NodeDump {
    /// Node kind.
    pub kind: SyntaxKind,
    /// Children in source order.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub children: Vec<ElementDump>,
    /// Per-site setting overrides carried by this node.
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub overrides: Vec<SiteOverride>,
}

/// A token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenDump {
    /// Token kind.
    pub token: TokenKind,
    /// Token text.
    pub text: String,
    /// Leading trivia; a single separating space when omitted.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub leading: Option<String>,
}

/// Either a node or a token.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(untagged)]
pub enum ElementDump {
    /// A child node.
    Node(NodeDump),
    /// A child token.
    Token(TokenDump),
}

impl TreeDump {
    /// Captures any tree as a dump, preserving trivia when the source is known.
    #[must_use]
    pub fn from_tree(tree: &dyn SyntaxTree) -> Self {
        let mut previous_end = 0;
        let root = dump_node(SyntaxNode::root(tree), &mut previous_end);
        Self {
            path: tree.path().to_path_buf(),
            root,
        }
    }

    /// Builds an [`ArenaTree`] from this dump.
    ///
    /// # Errors
    ///
    /// Returns an error if the dump is structurally invalid.
    pub fn to_tree(&self) -> Result<ArenaTree, TreeError> {
        let mut builder = ArenaTree::builder(self.path.clone());
        build_node(&mut builder, &self.root);
        builder.finish()
    }
}

fn build_node(builder: &mut TreeBuilder, node: &NodeDump) {
    builder.start_node(node.kind);
    for site in &node.overrides {
        builder.override_setting(site.key.clone(), site.value.clone());
    }
    for child in &node.children {
        match child {
            ElementDump::Node(child) => build_node(builder, child),
            ElementDump::Token(token) => match &token.leading {
                Some(leading) => {
                    builder.token_with_trivia(token.token, &token.text, leading);
                }
                None => {
                    builder.token(token.token, &token.text);
                }
            },
        }
    }
    builder.finish_node();
}

fn dump_node(node: SyntaxNode<'_>, previous_end: &mut usize) -> NodeDump {
    let tree = node.tree();
    let children = node
        .children()
        .map(|child| match child {
            SyntaxElement::Node(child) => ElementDump::Node(dump_node(child, previous_end)),
            SyntaxElement::Token(token) => {
                let span = token.span();
                let leading = tree
                    .source_text()
                    .and_then(|source| source.get(*previous_end..span.start))
                    .map(str::to_string);
                *previous_end = span.end;
                ElementDump::Token(TokenDump {
                    token: token.kind(),
                    text: token.text().to_string(),
                    leading,
                })
            }
        })
        .collect();

    NodeDump {
        kind: node.kind(),
        children,
        overrides: tree.overrides(node.id()).to_vec(),
    }
}
