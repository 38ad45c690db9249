use anyhow::Result;
use clap::Parser;
use scoremap::cli::{Cli, Commands};
use scoremap::commands::{self, ci::CiConfig, compare::CompareConfig};

fn main() -> Result<()> {
    env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info")).init();

    let cli = Cli::parse();
    match cli.command {
        Commands::Ci {
            workspace,
            base,
            skip_comment,
        } => {
            commands::run_ci(CiConfig {
                workspace,
                base,
                skip_comment,
            })?;
            Ok(())
        }
        Commands::Compare {
            current,
            previous,
            diff_map,
            format,
            output,
        } => commands::run_compare(CompareConfig {
            current,
            previous,
            diff_map,
            format,
            output,
        }),
        Commands::Init { force } => commands::init_config(force),
    }
}
