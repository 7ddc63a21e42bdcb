//! Core types for diagnostics and results.

use crate::syntax::{SyntaxTree, TextSpan};
use miette::{NamedSource, SourceSpan};
use serde::ser::SerializeStruct;
use serde::{Deserialize, Serialize, Serializer};
use std::path::{Path, PathBuf};

/// Severity level for diagnostics.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    /// Informational message, does not fail lint.
    Info,
    /// Warning that should be addressed.
    Warning,
    /// Error that must be fixed.
    Error,
}

impl std::fmt::Display for Severity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::Info => write!(f, "info"),
            Self::Warning => write!(f, "warning"),
            Self::Error => write!(f, "error"),
        }
    }
}

/// Rule category.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Category {
    /// Code that is harder to change than it needs to be.
    Maintainability,
    /// Identifier conventions.
    Naming,
    /// API usage mistakes.
    Usage,
    /// Project-wide style settings.
    Style,
}

impl std::fmt::Display for Category {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{self:?}")
    }
}

/// Static description of a rule and the diagnostics it produces.
#[derive(Debug, PartialEq, Eq, Hash, Serialize)]
pub struct RuleDescriptor {
    /// Stable rule id, e.g. `ACL1003`.
    pub id: &'static str,
    /// Kebab-case name, e.g. `where-clause-complexity`.
    pub name: &'static str,
    /// One-line summary.
    pub title: &'static str,
    /// Message with positional `{0}`-style slots.
    pub message_template: &'static str,
    /// Rule category.
    pub category: Category,
    /// Severity used unless configuration overrides it.
    pub default_severity: Severity,
    /// Whether the recommended preset turns the rule on.
    pub enabled_by_default: bool,
}

impl RuleDescriptor {
    /// Renders the message template with `args`.
    #[must_use]
    pub fn format_message(&self, args: &[String]) -> String {
        format_message(self.message_template, args)
    }
}

/// Replaces `{n}` slots in `template` with `args[n]`.
///
/// Slots without a matching argument are left as written.
#[must_use]
pub fn format_message(template: &str, args: &[String]) -> String {
    let mut out = String::with_capacity(template.len());
    let mut rest = template;

    while let Some(open) = rest.find('{') {
        out.push_str(&rest[..open]);
        let after = &rest[open + 1..];
        let slot = after
            .find('}')
            .and_then(|close| Some((close, after[..close].parse::<usize>().ok()?)));

        match slot.and_then(|(close, index)| Some((close, args.get(index)?))) {
            Some((close, arg)) => {
                out.push_str(arg);
                rest = &after[close + 1..];
            }
            None => {
                out.push('{');
                rest = after;
            }
        }
    }

    out.push_str(rest);
    out
}

/// Source code location.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Location {
    /// File path of the analyzed tree.
    pub file: PathBuf,
    /// Line number (1-indexed).
    pub line: usize,
    /// Column number (1-indexed).
    pub column: usize,
    /// Byte span in the tree's source text.
    pub span: TextSpan,
}

impl Location {
    /// Creates a location with an empty span.
    #[must_use]
    pub fn new(file: impl Into<PathBuf>, line: usize, column: usize) -> Self {
        Self {
            file: file.into(),
            line,
            column,
            span: TextSpan::default(),
        }
    }

    /// Resolves `span` against the line map of `tree`.
    #[must_use]
    pub fn from_span(tree: &dyn SyntaxTree, span: TextSpan) -> Self {
        let (line, column) = tree.line_col(span.start);
        Self {
            file: tree.path().to_path_buf(),
            line,
            column,
            span,
        }
    }
}

impl std::fmt::Display for Location {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}:{}:{}", self.file.display(), self.line, self.column)
    }
}

/// A diagnostic reported by a rule.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    /// Descriptor of the reporting rule.
    pub descriptor: &'static RuleDescriptor,
    /// Effective severity after configuration.
    pub severity: Severity,
    /// Where the problem is.
    pub location: Location,
    /// Values for the message template slots, in order.
    pub message_args: Vec<String>,
}

impl Diagnostic {
    /// Creates a diagnostic.
    #[must_use]
    pub fn new(
        descriptor: &'static RuleDescriptor,
        severity: Severity,
        location: Location,
        message_args: Vec<String>,
    ) -> Self {
        Self {
            descriptor,
            severity,
            location,
            message_args,
        }
    }

    /// Id of the reporting rule.
    #[must_use]
    pub fn rule_id(&self) -> &'static str {
        self.descriptor.id
    }

    /// Rendered message.
    #[must_use]
    pub fn message(&self) -> String {
        self.descriptor.format_message(&self.message_args)
    }

    /// Formats the diagnostic for terminal output.
    #[must_use]
    pub fn format(&self) -> String {
        format!(
            "{} {} at {}\n  {}: {}\n",
            self.descriptor.id,
            self.descriptor.name,
            self.location,
            self.severity,
            self.message(),
        )
    }
}

impl std::fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(
            f,
            "{}: {} [{}] {}",
            self.location,
            self.severity,
            self.descriptor.id,
            self.message()
        )
    }
}

impl Serialize for Diagnostic {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        let mut s = serializer.serialize_struct("Diagnostic", 7)?;
        s.serialize_field("id", self.descriptor.id)?;
        s.serialize_field("rule", self.descriptor.name)?;
        s.serialize_field("category", &self.descriptor.category)?;
        s.serialize_field("severity", &self.severity)?;
        s.serialize_field("location", &self.location)?;
        s.serialize_field("message", &self.message())?;
        s.serialize_field("message_args", &self.message_args)?;
        s.end()
    }
}

/// A [`Diagnostic`] rendered through miette.
#[derive(Debug, thiserror::Error, miette::Diagnostic)]
#[error("[{code}] {message}")]
pub struct DiagnosticReport {
    code: String,
    message: String,
    #[help]
    help: Option<String>,
    #[source_code]
    source_code: NamedSource<String>,
    #[label("{label_message}")]
    span: Option<SourceSpan>,
    label_message: String,
}

impl DiagnosticReport {
    /// Builds a report; `source` is the tree's source text when available.
    #[must_use]
    pub fn new(diagnostic: &Diagnostic, source: Option<&str>, help: Option<String>) -> Self {
        let span = &diagnostic.location.span;
        let labelled = source.filter(|s| span.end <= s.len() && !span.is_empty());
        Self {
            code: diagnostic.descriptor.id.to_string(),
            message: diagnostic.message(),
            help,
            source_code: NamedSource::new(
                diagnostic.location.file.display().to_string(),
                source.unwrap_or_default().to_string(),
            ),
            span: labelled.map(|_| SourceSpan::from((span.start, span.len()))),
            label_message: diagnostic.descriptor.name.to_string(),
        }
    }
}

/// A rule that failed while evaluating.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RuleFault {
    /// Id of the failing rule.
    pub rule_id: String,
    /// Where it was evaluating, when it was evaluating a node.
    pub location: Option<Location>,
    /// Failure description.
    pub message: String,
}

impl std::fmt::Display for RuleFault {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match &self.location {
            Some(location) => write!(f, "{location}: rule {} failed: {}", self.rule_id, self.message),
            None => write!(f, "rule {} failed: {}", self.rule_id, self.message),
        }
    }
}

/// Result of running an analysis.
#[derive(Debug, Default, Serialize)]
pub struct LintResult {
    /// All diagnostics found.
    pub diagnostics: Vec<Diagnostic>,
    /// Rules that failed; their partial output is discarded.
    pub faults: Vec<RuleFault>,
    /// Number of trees analyzed.
    pub files_checked: usize,
}

impl LintResult {
    /// Creates a new empty result.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Returns true if there are any errors.
    #[must_use]
    pub fn has_errors(&self) -> bool {
        self.has_violations_at(Severity::Error)
    }

    /// Checks if any diagnostics meet or exceed the given severity threshold.
    #[must_use]
    pub fn has_violations_at(&self, severity: Severity) -> bool {
        self.diagnostics.iter().any(|d| d.severity >= severity)
    }

    /// Returns diagnostics filtered by severity.
    #[must_use]
    pub fn by_severity(&self, severity: Severity) -> Vec<&Diagnostic> {
        self.diagnostics
            .iter()
            .filter(|d| d.severity == severity)
            .collect()
    }

    /// Diagnostics reported by one rule.
    pub fn by_rule<'a>(&'a self, rule_id: &'a str) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics.iter().filter(move |d| d.rule_id() == rule_id)
    }

    /// Counts diagnostics by severity as `(errors, warnings, infos)`.
    #[must_use]
    pub fn count_by_severity(&self) -> (usize, usize, usize) {
        self.diagnostics
            .iter()
            .fold((0, 0, 0), |(e, w, i), d| match d.severity {
                Severity::Error => (e + 1, w, i),
                Severity::Warning => (e, w + 1, i),
                Severity::Info => (e, w, i + 1),
            })
    }

    /// Orders diagnostics by file, line, column, then rule id.
    pub fn sort(&mut self) {
        self.diagnostics.sort_by(|a, b| {
            (&a.location.file, a.location.line, a.location.column, a.rule_id()).cmp(&(
                &b.location.file,
                b.location.line,
                b.location.column,
                b.rule_id(),
            ))
        });
    }

    /// Diagnostics located in `file`.
    pub fn in_file<'a>(&'a self, file: &'a Path) -> impl Iterator<Item = &'a Diagnostic> + 'a {
        self.diagnostics
            .iter()
            .filter(move |d| d.location.file == file)
    }

    /// Multi-line report of diagnostics at or above `fail_on`.
    #[must_use]
    pub fn format_report(&self, fail_on: Severity) -> String {
        use std::fmt::Write;

        let failing: Vec<&Diagnostic> = self
            .diagnostics
            .iter()
            .filter(|d| d.severity >= fail_on)
            .collect();

        let mut report = String::new();
        let _ = writeln!(
            report,
            "\n=== acl-lint: {} diagnostic(s) ===\n",
            failing.len()
        );

        for d in &failing {
            let _ = writeln!(report, "{}", d.format());
        }

        for fault in &self.faults {
            let _ = writeln!(report, "internal: {fault}");
        }

        let (errors, warnings, infos) = self.count_by_severity();
        let _ = writeln!(
            report,
            "Total: {} error(s), {} warning(s), {} info(s) in {} file(s)",
            errors, warnings, infos, self.files_checked
        );

        report
    }

    /// Adds diagnostics and faults from another result.
    pub fn extend(&mut self, other: Self) {
        self.diagnostics.extend(other.diagnostics);
        self.faults.extend(other.faults);
        self.files_checked += other.files_checked;
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    static WHERE: RuleDescriptor = RuleDescriptor {
        id: "ACL1003",
        name: "where-clause-complexity",
        title: "Where predicate has too many clauses",
        message_template: "Where predicate has {0} clauses (max: {1})",
        category: Category::Maintainability,
        default_severity: Severity::Warning,
        enabled_by_default: true,
    };

    fn make_diagnostic(severity: Severity, line: usize) -> Diagnostic {
        Diagnostic::new(
            &WHERE,
            severity,
            Location::new("src/Orders.cs", line, 9),
            vec!["5".to_string(), "3".to_string()],
        )
    }

    #[test]
    fn message_slots_are_filled_in_order() {
        assert_eq!(
            make_diagnostic(Severity::Warning, 1).message(),
            "Where predicate has 5 clauses (max: 3)"
        );
    }

    #[test]
    fn missing_or_malformed_slots_stay_literal() {
        let args = vec!["a".to_string()];
        assert_eq!(format_message("{0} {1} {x} {", &args), "a {1} {x} {");
        assert_eq!(format_message("{0}{0}", &args), "aa");
        assert_eq!(format_message("no slots", &[]), "no slots");
    }

    #[test]
    fn diagnostic_display() {
        let d = make_diagnostic(Severity::Error, 12);
        insta::assert_snapshot!(
            d.to_string(),
            @"src/Orders.cs:12:9: error [ACL1003] Where predicate has 5 clauses (max: 3)"
        );
    }

    #[test]
    fn diagnostic_serializes_rendered_message() {
        let json = serde_json::to_value(make_diagnostic(Severity::Warning, 2)).unwrap();
        assert_eq!(json["id"], "ACL1003");
        assert_eq!(json["severity"], "warning");
        assert_eq!(json["message"], "Where predicate has 5 clauses (max: 3)");
        assert_eq!(json["message_args"][1], "3");
        assert_eq!(json["location"]["line"], 2);
    }

    #[test]
    fn has_violations_at_error_only() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning, 1));
        assert!(!result.has_violations_at(Severity::Error));
        assert!(result.has_violations_at(Severity::Warning));
        assert!(!result.has_errors());
    }

    #[test]
    fn report_filters_by_severity() {
        let mut result = LintResult::new();
        result.files_checked = 5;
        result.diagnostics.push(make_diagnostic(Severity::Warning, 1));
        result.diagnostics.push(make_diagnostic(Severity::Error, 2));

        let report = result.format_report(Severity::Error);
        assert!(report.contains("1 diagnostic(s)"));
        assert!(report.contains("1 error(s)"));
        assert!(report.contains("1 warning(s)"));
        assert!(report.contains("in 5 file(s)"));
    }

    #[test]
    fn report_lists_faults() {
        let mut result = LintResult::new();
        result.faults.push(RuleFault {
            rule_id: "ACL1003".to_string(),
            location: None,
            message: "boom".to_string(),
        });
        assert!(result
            .format_report(Severity::Error)
            .contains("internal: rule ACL1003 failed: boom"));
    }

    #[test]
    fn sort_orders_by_position() {
        let mut result = LintResult::new();
        result.diagnostics.push(make_diagnostic(Severity::Warning, 9));
        result.diagnostics.push(make_diagnostic(Severity::Warning, 3));
        result.sort();
        let lines: Vec<_> = result.diagnostics.iter().map(|d| d.location.line).collect();
        assert_eq!(lines, vec![3, 9]);
    }

    #[test]
    fn extend_merges_counts() {
        let mut a = LintResult::new();
        a.files_checked = 1;
        a.diagnostics.push(make_diagnostic(Severity::Info, 1));
        let mut b = LintResult::new();
        b.files_checked = 2;
        b.diagnostics.push(make_diagnostic(Severity::Error, 1));
        a.extend(b);
        assert_eq!(a.files_checked, 3);
        assert_eq!(a.count_by_severity(), (1, 0, 1));
    }

    #[test]
    fn report_without_source_has_no_label() {
        use miette::Diagnostic as _;
        let d = make_diagnostic(Severity::Warning, 1);
        let report = DiagnosticReport::new(&d, None, None);
        assert!(report.labels().is_none() || report.labels().is_some_and(|mut l| l.next().is_none()));
        assert_eq!(report.to_string(), "[ACL1003] Where predicate has 5 clauses (max: 3)");
    }
}
