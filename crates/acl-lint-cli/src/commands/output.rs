//! Shared output formatting for lint results.

use acl_lint::{ArenaTree, Diagnostic, DiagnosticReport, LintResult, Severity, SyntaxTree};
use anyhow::Result;

use crate::OutputFormat;

/// Print lint results in the specified format.
pub fn print(result: &LintResult, trees: &[ArenaTree], format: OutputFormat) -> Result<()> {
    match format {
        OutputFormat::Text => print!("{}", render_text(result)),
        OutputFormat::Json => return print_json(result),
        OutputFormat::Compact => print!("{}", render_compact(result)),
        OutputFormat::Pretty => print_pretty(result, trees),
    }
    Ok(())
}

fn severity_indicator(severity: Severity) -> &'static str {
    match severity {
        Severity::Error => "\x1b[31merror\x1b[0m",
        Severity::Warning => "\x1b[33mwarning\x1b[0m",
        Severity::Info => "\x1b[34minfo\x1b[0m",
    }
}

fn summary(result: &LintResult) -> String {
    let (errors, warnings, infos) = result.count_by_severity();
    let summary_color = if errors > 0 {
        "\x1b[31m"
    } else if warnings > 0 {
        "\x1b[33m"
    } else {
        "\x1b[32m"
    };
    format!(
        "{summary_color}Found {errors} error(s), {warnings} warning(s), {infos} info(s) in {} file(s)\x1b[0m\n",
        result.files_checked
    )
}

fn render_text(result: &LintResult) -> String {
    let mut out = String::new();
    for diagnostic in &result.diagnostics {
        out.push_str(&format!(
            "{} {} at {}\n  {}: {}\n\n",
            diagnostic.rule_id(),
            diagnostic.descriptor.name,
            diagnostic.location,
            severity_indicator(diagnostic.severity),
            diagnostic.message(),
        ));
    }
    out.push_str(&render_faults(result));
    out.push_str(&summary(result));
    out
}

fn render_faults(result: &LintResult) -> String {
    result
        .faults
        .iter()
        .map(|fault| format!("\x1b[35minternal\x1b[0m: {fault}\n"))
        .collect()
}

fn print_json(result: &LintResult) -> Result<()> {
    let json = serde_json::to_string_pretty(result)?;
    println!("{json}");
    Ok(())
}

/// `file:line:col: severity [id] message`, one per line.
fn render_compact(result: &LintResult) -> String {
    result
        .diagnostics
        .iter()
        .map(|d| format!("{d}\n"))
        .chain(result.faults.iter().map(|f| format!("{f}\n")))
        .collect()
}

fn print_pretty(result: &LintResult, trees: &[ArenaTree]) {
    for diagnostic in &result.diagnostics {
        let report = miette::Report::new(report_for(diagnostic, trees));
        eprintln!("{report:?}");
    }
    eprint!("{}", render_faults(result));
    print!("{}", summary(result));
}

fn report_for(diagnostic: &Diagnostic, trees: &[ArenaTree]) -> DiagnosticReport {
    let source = trees
        .iter()
        .find(|t| t.path() == diagnostic.location.file)
        .and_then(|t| t.source_text());
    DiagnosticReport::new(
        diagnostic,
        source,
        Some(diagnostic.descriptor.title.to_string()),
    )
}
