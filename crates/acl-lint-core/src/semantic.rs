//! Symbol queries over a syntax tree.
//!
//! Rules that need more than shape (declared accessibility, compilation
//! options) go through [`SemanticModel`]. Hosts with a real compiler supply
//! their own implementation; [`SyntacticModel`] derives what it can from
//! declaration modifiers alone.

use crate::syntax::{SyntaxKind, SyntaxNode};
use serde::{Deserialize, Serialize};

/// Declared accessibility of a symbol.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Accessibility {
    /// `private`
    Private,
    /// `protected`
    Protected,
    /// `internal`
    Internal,
    /// `protected internal`
    ProtectedInternal,
    /// `private protected`
    PrivateProtected,
    /// `public`
    Public,
}

/// What kind of entity a symbol is.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SymbolKind {
    /// A field of a type.
    Field,
    /// A local variable.
    Local,
    /// A method, constructor or local function.
    Method,
    /// A property.
    Property,
    /// A class, struct, interface or record.
    Type,
}

/// A declared symbol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Symbol {
    /// Declared name.
    pub name: String,
    /// Symbol kind.
    pub kind: SymbolKind,
    /// Declared (or default) accessibility.
    pub accessibility: Accessibility,
    /// `static` modifier present.
    pub is_static: bool,
    /// `readonly` modifier present.
    pub is_readonly: bool,
    /// `const` modifier present.
    pub is_const: bool,
}

/// Nullable reference type context of a compilation.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NullableContext {
    /// Nullable annotations and warnings are off.
    #[default]
    #[serde(rename = "disable")]
    Disabled,
    /// Warnings only.
    #[serde(rename = "warnings")]
    Warnings,
    /// Annotations only.
    #[serde(rename = "annotations")]
    Annotations,
    /// Annotations and warnings.
    #[serde(rename = "enable")]
    Enabled,
}

impl NullableContext {
    /// The option value as written in project files.
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Disabled => "disable",
            Self::Warnings => "warnings",
            Self::Annotations => "annotations",
            Self::Enabled => "enable",
        }
    }
}

impl std::fmt::Display for NullableContext {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

impl std::str::FromStr for NullableContext {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "disable" | "disabled" => Ok(Self::Disabled),
            "warnings" => Ok(Self::Warnings),
            "annotations" => Ok(Self::Annotations),
            "enable" | "enabled" => Ok(Self::Enabled),
            other => Err(format!("unknown nullable context '{other}'")),
        }
    }
}

/// Symbol-resolution capability supplied by the host.
pub trait SemanticModel: Send + Sync {
    /// The symbol declared by `node`, if it declares one.
    ///
    /// For fields and locals the declaring node is the `VariableDeclarator`.
    fn declared_symbol(&self, node: SyntaxNode<'_>) -> Option<Symbol>;

    /// The compilation's nullable context option.
    fn nullable_context(&self) -> NullableContext;
}

/// A [`SemanticModel`] that reads declaration modifiers straight off the tree.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyntacticModel {
    nullable: NullableContext,
}

impl SyntacticModel {
    /// Creates a model for a compilation with the given nullable option.
    #[must_use]
    pub const fn new(nullable: NullableContext) -> Self {
        Self { nullable }
    }
}

impl SemanticModel for SyntacticModel {
    fn declared_symbol(&self, node: SyntaxNode<'_>) -> Option<Symbol> {
        let (kind, modifiers) = match node.kind() {
            SyntaxKind::VariableDeclarator => {
                let holder = node
                    .ancestors()
                    .find(|n| {
                        matches!(
                            n.kind(),
                            SyntaxKind::FieldDeclaration | SyntaxKind::LocalDeclarationStatement
                        )
                    })?;
                let kind = if holder.kind() == SyntaxKind::FieldDeclaration {
                    SymbolKind::Field
                } else {
                    SymbolKind::Local
                };
                (kind, holder)
            }
            SyntaxKind::MethodDeclaration
            | SyntaxKind::ConstructorDeclaration
            | SyntaxKind::LocalFunctionStatement => (SymbolKind::Method, node),
            SyntaxKind::PropertyDeclaration => (SymbolKind::Property, node),
            kind if kind.is_type_declaration() => (SymbolKind::Type, node),
            _ => return None,
        };

        let name = node.identifier()?.text().to_string();
        let accessibility = declared_accessibility(modifiers)
            .unwrap_or_else(|| default_accessibility(node, kind));

        Some(Symbol {
            name,
            kind,
            accessibility,
            is_static: modifiers.has_keyword("static"),
            is_readonly: modifiers.has_keyword("readonly"),
            is_const: modifiers.has_keyword("const"),
        })
    }

    fn nullable_context(&self) -> NullableContext {
        self.nullable
    }
}

fn declared_accessibility(modifiers: SyntaxNode<'_>) -> Option<Accessibility> {
    let public = modifiers.has_keyword("public");
    let private = modifiers.has_keyword("private");
    let protected = modifiers.has_keyword("protected");
    let internal = modifiers.has_keyword("internal");

    match (public, private, protected, internal) {
        (true, ..) => Some(Accessibility::Public),
        (_, true, true, _) => Some(Accessibility::PrivateProtected),
        (_, _, true, true) => Some(Accessibility::ProtectedInternal),
        (_, true, ..) => Some(Accessibility::Private),
        (_, _, true, _) => Some(Accessibility::Protected),
        (.., true) => Some(Accessibility::Internal),
        _ => None,
    }
}

fn default_accessibility(node: SyntaxNode<'_>, kind: SymbolKind) -> Accessibility {
    match kind {
        SymbolKind::Local => Accessibility::Private,
        SymbolKind::Type => {
            if node.ancestors().any(|a| a.kind().is_type_declaration()) {
                Accessibility::Private
            } else {
                Accessibility::Internal
            }
        }
        _ => {
            let in_interface = node
                .ancestors()
                .find(|a| a.kind().is_type_declaration())
                .is_some_and(|t| t.kind() == SyntaxKind::InterfaceDeclaration);
            if in_interface {
                Accessibility::Public
            } else {
                Accessibility::Private
            }
        }
    }
}
