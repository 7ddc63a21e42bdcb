//! Init command implementation.

use anyhow::{bail, Result};
use std::path::Path;

const CONFIG_NAME: &str = "acl-lint.toml";

const DEFAULT_CONFIG: &str = r#"# acl-lint configuration

# Base rule set: "recommended" (rules on by default) or "all"
preset = "recommended"

# Diagnostics at or above this severity fail `acl-lint check`
fail_on = "error"

[analyzer]
# Tree dumps to analyze (default: every *.tree.json)
# include = ["**/*.tree.json"]

# Glob patterns to exclude from analysis
exclude = [
    "**/bin/**",
    "**/obj/**",
]

# Text files consulted for `dotnet_diagnostic.<rule>.<name> = value` lines
# when this file does not set an option
# additional_files = [".globalconfig"]

# Respect .gitignore files
respect_gitignore = true

[compilation]
# disable | warnings | annotations | enable
nullable = "enable"

# Rule configurations
# Each rule can be enabled/disabled and have its severity overridden;
# other keys are rule options.

[rules.ACL1003]
# severity = "error"
max_where_clauses = 3

# [rules.ACL1001]
# enabled = true

# Options for matching files only
# [[overrides]]
# files = ["**/Legacy/**"]
# [overrides.rules.ACL1003]
# max_where_clauses = 6
"#;

/// Runs the init command in `dir`.
pub fn run(dir: &Path, force: bool) -> Result<()> {
    let config_path = dir.join(CONFIG_NAME);

    if config_path.exists() && !force {
        bail!(
            "Configuration file already exists at {}. Use --force to overwrite.",
            config_path.display()
        );
    }

    std::fs::write(&config_path, DEFAULT_CONFIG)?;

    println!("Created {CONFIG_NAME}");
    println!("\nNext steps:");
    println!("  1. Edit {CONFIG_NAME} to configure rules");
    println!("  2. Run: acl-lint check");

    Ok(())
}
