//! Fix proposals: described edits the host may apply.

use crate::context::Compilation;
use crate::semantic::NullableContext;
use crate::types::{Diagnostic, Location};
use serde::Serialize;

/// A compilation option a fix can change.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum CompilationOption {
    /// The nullable reference type context.
    Nullable,
}

impl std::fmt::Display for CompilationOption {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Nullable => write!(f, "nullable"),
        }
    }
}

/// The edit a fix describes.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum FixEdit {
    /// Rename a declared symbol and all of its references.
    RenameSymbol {
        /// Declaration site of the symbol.
        location: Location,
        /// Current name.
        old_name: String,
        /// Proposed name.
        new_name: String,
    },
    /// Change a compilation-wide option.
    SetCompilationOption {
        /// Option to change.
        option: CompilationOption,
        /// Current value.
        from: NullableContext,
        /// Proposed value.
        to: NullableContext,
    },
}

impl std::fmt::Display for FixEdit {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::RenameSymbol {
                location,
                old_name,
                new_name,
            } => write!(f, "rename '{old_name}' to '{new_name}' at {location}"),
            Self::SetCompilationOption { option, from, to } => {
                write!(f, "set {option} from '{from}' to '{to}'")
            }
        }
    }
}

/// A corrective edit proposed for one diagnostic. Never applied by the engine.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct FixProposal {
    /// Rule that produced the diagnostic.
    pub rule_id: String,
    /// Short description shown to the user.
    pub title: String,
    /// The edit.
    pub edit: FixEdit,
}

impl FixProposal {
    /// Creates a proposal.
    #[must_use]
    pub fn new(rule_id: impl Into<String>, title: impl Into<String>, edit: FixEdit) -> Self {
        Self {
            rule_id: rule_id.into(),
            title: title.into(),
            edit,
        }
    }
}

impl std::fmt::Display for FixProposal {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "[{}] {}: {}", self.rule_id, self.title, self.edit)
    }
}

/// Input to a rule's fix computation.
#[derive(Clone, Copy)]
pub struct FixRequest<'a> {
    /// Diagnostic the fix is requested for.
    pub diagnostic: &'a Diagnostic,
    /// Compilation the diagnostic was reported in.
    pub compilation: &'a Compilation<'a>,
}

impl<'a> FixRequest<'a> {
    /// Creates a request.
    #[must_use]
    pub fn new(diagnostic: &'a Diagnostic, compilation: &'a Compilation<'a>) -> Self {
        Self {
            diagnostic,
            compilation,
        }
    }

    /// The tree containing the diagnostic, if it belongs to one.
    #[must_use]
    pub fn tree(&self) -> Option<&'a dyn crate::syntax::SyntaxTree> {
        self.compilation
            .file(&self.diagnostic.location.file)
            .map(|scope| scope.tree)
    }
}
