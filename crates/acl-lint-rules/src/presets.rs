//! Rule presets and the built-in rule table.

use crate::{
    FieldUnderscorePrefix, NoMagicNumbers, PreferThenByDescending, RequireNullableContext,
    WhereClauseComplexity,
};
use acl_lint_core::{CompilationRuleBox, Config, RuleBox, RuleDescriptor, RuleEngineBuilder};
use std::str::FromStr;
use tracing::debug;

/// Preset configurations for acl-lint.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Preset {
    /// Rules that are on by default.
    #[default]
    Recommended,
    /// Every built-in rule.
    All,
}

impl Preset {
    /// Name used in configuration files.
    #[must_use]
    pub fn name(self) -> &'static str {
        match self {
            Self::Recommended => "recommended",
            Self::All => "all",
        }
    }

    /// Whether this preset turns on the rule described by `descriptor`.
    #[must_use]
    pub fn includes(self, descriptor: &RuleDescriptor) -> bool {
        match self {
            Self::Recommended => descriptor.enabled_by_default,
            Self::All => true,
        }
    }
}

/// A preset name that is not recognized.
#[derive(Debug, thiserror::Error)]
#[error("unknown preset '{0}' (expected 'recommended' or 'all')")]
pub struct UnknownPreset(pub String);

impl FromStr for Preset {
    type Err = UnknownPreset;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().as_str() {
            "recommended" => Ok(Self::Recommended),
            "all" => Ok(Self::All),
            _ => Err(UnknownPreset(s.to_string())),
        }
    }
}

/// A built-in rule of either shape.
pub enum BuiltinRule {
    /// Evaluated per syntax node.
    Node(RuleBox),
    /// Evaluated once per compilation.
    Compilation(CompilationRuleBox),
}

impl BuiltinRule {
    /// Descriptor of the wrapped rule.
    #[must_use]
    pub fn descriptor(&self) -> &'static RuleDescriptor {
        match self {
            Self::Node(rule) => rule.descriptor(),
            Self::Compilation(rule) => rule.descriptor(),
        }
    }
}

/// Every built-in rule, in id order.
#[must_use]
pub fn builtin_rules() -> Vec<BuiltinRule> {
    vec![
        BuiltinRule::Node(Box::new(NoMagicNumbers::new())),
        BuiltinRule::Node(Box::new(PreferThenByDescending::new())),
        BuiltinRule::Node(Box::new(WhereClauseComplexity::new())),
        BuiltinRule::Node(Box::new(FieldUnderscorePrefix::new())),
        BuiltinRule::Compilation(Box::new(RequireNullableContext::new())),
    ]
}

/// Descriptors of every built-in rule, in id order.
#[must_use]
pub fn descriptors() -> Vec<&'static RuleDescriptor> {
    builtin_rules().iter().map(BuiltinRule::descriptor).collect()
}

/// Adds the rules selected by `preset` and `config` to `builder`.
///
/// A rule is added when the preset includes it or the configuration sets
/// `enabled = true` for it. Rules the configuration disables are dropped
/// later, when the engine registers them.
#[must_use]
pub fn install(
    mut builder: RuleEngineBuilder,
    preset: Preset,
    config: &Config,
) -> RuleEngineBuilder {
    for rule in builtin_rules() {
        let descriptor = rule.descriptor();
        if !preset.includes(descriptor) && !config.is_rule_forced_on(descriptor.id) {
            debug!(rule = descriptor.id, preset = preset.name(), "not in preset");
            continue;
        }
        builder = match rule {
            BuiltinRule::Node(rule) => builder.rule_box(rule),
            BuiltinRule::Compilation(rule) => builder.compilation_rule_box(rule),
        };
    }
    builder
}
