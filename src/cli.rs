use clap::{Parser, Subcommand, ValueEnum};
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum CompareFormat {
    /// Rendered markdown diff
    Markdown,
    /// Raw comparison result
    Json,
}

#[derive(Parser, Debug)]
#[command(name = "scoremap")]
#[command(about = "Code quality score aggregation and CI regression comparison", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run the full CI flow: collect, resolve base reports, compare, comment
    Ci {
        /// Workspace root containing scoremap.toml
        #[arg(long, default_value = ".")]
        workspace: PathBuf,

        /// Base ref to compare against (overrides the configured one)
        #[arg(long)]
        base: Option<String>,

        /// Do not create or update a PR comment
        #[arg(long)]
        skip_comment: bool,
    },

    /// Compare two report files directly
    Compare {
        /// Current (head) report
        current: PathBuf,

        /// Previous (base) report
        previous: PathBuf,

        /// Pre-computed line-shift map (JSON, keyed by head path)
        #[arg(long)]
        diff_map: Option<PathBuf>,

        /// Output format
        #[arg(short, long, value_enum, default_value = "markdown")]
        format: CompareFormat,

        /// Output file (defaults to stdout)
        #[arg(short, long)]
        output: Option<PathBuf>,
    },

    /// Create a starter scoremap.toml in the current directory
    Init {
        /// Overwrite an existing configuration
        #[arg(long)]
        force: bool,
    },
}
