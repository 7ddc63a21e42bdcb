use super::SettingsKey;
use crate::syntax::SyntaxNode;
use serde::{Deserialize, Serialize};

/// A setting pinned to one declaration in the source, the analogue of an
/// attribute on a class or method.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SiteOverride {
    /// Which setting is overridden.
    #[serde(flatten)]
    pub key: SettingsKey,
    /// Raw value, coerced the same way as file-level settings.
    pub value: String,
}

impl SiteOverride {
    /// Creates an override.
    #[must_use]
    pub fn new(key: SettingsKey, value: impl Into<String>) -> Self {
        Self {
            key,
            value: value.into(),
        }
    }
}

/// Finds the override for `key` on `node` or its nearest enclosing ancestor.
///
/// Inner declarations shadow outer ones. Returns `None` when no site on the
/// path to the root carries the key.
#[must_use]
pub fn nearest_override<'t>(node: SyntaxNode<'t>, key: &SettingsKey) -> Option<&'t str> {
    let tree = node.tree();
    std::iter::once(node)
        .chain(node.ancestors())
        .find_map(|n| {
            tree.overrides(n.id())
                .iter()
                .find(|site| &site.key == key)
                .map(|site| site.value.as_str())
        })
}
