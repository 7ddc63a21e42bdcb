//! List rules command implementation.

use acl_lint::rules::descriptors;

/// Runs the list-rules command.
pub fn run() {
    print!("{}", render());
}

fn render() -> String {
    let mut out = String::from("Available rules:\n\n");
    out.push_str(&format!(
        "{:<9} {:<27} {:<16} {:<9} {}\n",
        "Code", "Name", "Category", "Severity", "Title"
    ));
    out.push_str(&"-".repeat(100));
    out.push('\n');

    for d in descriptors() {
        let name = if d.enabled_by_default {
            d.name.to_string()
        } else {
            format!("{} (off)", d.name)
        };
        out.push_str(&format!(
            "{:<9} {:<27} {:<16} {:<9} {}\n",
            d.id,
            name,
            d.category.to_string(),
            d.default_severity.to_string(),
            d.title
        ));
    }

    out.push_str("\nPresets:\n");
    out.push_str("  recommended  - every rule not marked (off) (default)\n");
    out.push_str("  all          - every rule\n");
    out.push_str("\nUse --rules to filter specific rules, e.g.:\n");
    out.push_str("  acl-lint check --rules where-clause-complexity,field-underscore-prefix\n");
    out
}
