use anyhow::Result;
use std::fs;
use std::path::PathBuf;

use crate::cli::CompareFormat;
use crate::comparison::ReportComparator;
use crate::core::diff::FileDiffMap;
use crate::monorepo::orchestrator::load_diff_map;
use crate::output::{self, markdown};

pub struct CompareConfig {
    pub current: PathBuf,
    pub previous: PathBuf,
    pub diff_map: Option<PathBuf>,
    pub format: CompareFormat,
    pub output: Option<PathBuf>,
}

/// Compare two persisted reports without a workspace or repository. The
/// line-shift map is optional; without one, unchanged files are assumed.
pub fn run_compare(config: CompareConfig) -> Result<()> {
    let current_name = config
        .current
        .file_stem()
        .and_then(|s| s.to_str())
        .unwrap_or("current");
    let current = output::read_report(&config.current, current_name)?;
    let previous = output::read_report(&config.previous, current_name)?;
    let diffs = match &config.diff_map {
        Some(path) => load_diff_map(path)?,
        None => FileDiffMap::new(),
    };

    let comparison = ReportComparator::new(current, previous, diffs).compare();

    let rendered = match config.format {
        CompareFormat::Markdown => markdown::render_comparison(&comparison),
        CompareFormat::Json => serde_json::to_string_pretty(&comparison)?,
    };

    match config.output {
        Some(path) => {
            if let Some(parent) = path.parent() {
                output::ensure_dir(parent)?;
            }
            fs::write(&path, rendered)?;
            println!("Comparison written to {}", path.display());
        }
        None => println!("{rendered}"),
    }
    Ok(())
}
