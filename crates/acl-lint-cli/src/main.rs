//! acl-lint CLI tool.
//!
//! Usage:
//! ```bash
//! acl-lint check [OPTIONS] [PATHS]...
//! acl-lint fix [PATHS]...
//! acl-lint list-rules
//! acl-lint init
//! ```

use anyhow::Result;
use clap::{Parser, Subcommand};
use std::path::PathBuf;
use tracing_subscriber::EnvFilter;

mod commands;
mod config_resolver;

/// Static analysis over C#-style syntax tree dumps
#[derive(Parser)]
#[command(name = "acl-lint")]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// Enable verbose output
    #[arg(short, long, global = true)]
    verbose: bool,

    /// Path to configuration file
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Run the rules over tree dumps
    Check {
        /// Dumps or directories to analyze (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: OutputFormat,

        /// Only run specific rules (comma-separated ids or names)
        #[arg(long)]
        rules: Option<String>,

        /// Exclude patterns (can be specified multiple times)
        #[arg(short, long)]
        exclude: Vec<String>,

        /// Preset to use instead of the configured one
        #[arg(long)]
        preset: Option<String>,
    },

    /// Print fix proposals for every fixable diagnostic
    Fix {
        /// Dumps or directories to analyze (default: current directory)
        #[arg(default_value = ".")]
        paths: Vec<PathBuf>,

        /// Output format
        #[arg(short, long, default_value = "text")]
        format: FixFormat,
    },

    /// List available rules
    ListRules,

    /// Initialize configuration file
    Init {
        /// Overwrite existing config
        #[arg(long)]
        force: bool,
    },
}

/// Output format for lint results.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum OutputFormat {
    /// Human-readable text output.
    #[default]
    Text,
    /// JSON output.
    Json,
    /// One-line-per-diagnostic compact format.
    Compact,
    /// Source snippets with labels.
    Pretty,
}

/// Output format for fix proposals.
#[derive(Clone, Copy, Debug, Default, PartialEq, Eq, clap::ValueEnum)]
pub enum FixFormat {
    /// One line per proposal.
    #[default]
    Text,
    /// JSON array of proposals.
    Json,
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let filter = if cli.verbose {
        EnvFilter::new("debug")
    } else {
        EnvFilter::new("info")
    };

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(false)
        .with_writer(std::io::stderr)
        .init();

    match cli.command {
        Commands::Check {
            paths,
            format,
            rules,
            exclude,
            preset,
        } => {
            let options = commands::check::CheckOptions {
                format,
                rules,
                exclude,
                preset,
            };
            let failed = commands::check::run(&paths, &options, cli.config.as_deref())?;
            if failed {
                std::process::exit(1);
            }
            Ok(())
        }
        Commands::Fix { paths, format } => {
            commands::fix::run(&paths, format, cli.config.as_deref())
        }
        Commands::ListRules => {
            commands::list_rules::run();
            Ok(())
        }
        Commands::Init { force } => commands::init::run(std::path::Path::new("."), force),
    }
}
