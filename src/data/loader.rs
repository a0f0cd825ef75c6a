use std::fs;
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use indicatif::{ProgressBar, ProgressStyle};
use log::{debug, info};
use thiserror::Error;

use crate::data::columnar::MetricsTable;
use crate::data::sca::ScaParser;
use crate::metrics::run_metrics::MetricRow;

pub const RESULT_EXTENSION: &str = ".sca";

/// Input problems reported to the user with the usage text
#[derive(Debug, Error)]
pub enum InputError {
    #[error("missing results directory argument")]
    MissingArgument,
    #[error("Directory {0} does not exist")]
    MissingDirectory(PathBuf),
    #[error("No .sca files found in {0}")]
    NoResultFiles(PathBuf),
}

/// All `*.sca` entries directly inside `dir`, sorted by path
pub fn find_sca_files(dir: &Path) -> Result<Vec<PathBuf>> {
    if !dir.is_dir() {
        return Err(InputError::MissingDirectory(dir.to_path_buf()).into());
    }

    let mut files = Vec::new();
    for entry in fs::read_dir(dir).with_context(|| format!("cannot list {}", dir.display()))? {
        let path = entry?.path();
        let is_result = path
            .file_name()
            .and_then(|name| name.to_str())
            .map_or(false, |name| name.ends_with(RESULT_EXTENSION));
        if is_result && path.is_file() {
            files.push(path);
        }
    }
    files.sort();

    if files.is_empty() {
        return Err(InputError::NoResultFiles(dir.to_path_buf()).into());
    }
    Ok(files)
}

/// Case-insensitive substring match on the full path; an empty pattern matches everything
pub fn matches_pattern(path: &Path, pattern: &str) -> bool {
    path.to_string_lossy()
        .to_lowercase()
        .contains(&pattern.to_lowercase())
}

/// Parse every file matching `pattern` and derive one metric row per file
pub fn collect_rows(files: &[PathBuf], pattern: &str) -> Result<Vec<MetricRow>> {
    let parser = ScaParser::new()?;
    let selected: Vec<&PathBuf> = files.iter().filter(|p| matches_pattern(p, pattern)).collect();

    let pb = ProgressBar::new(selected.len() as u64);
    pb.set_style(
        ProgressStyle::default_bar()
            .template("[{elapsed_precise}] [{bar:40.cyan/blue}] {pos}/{len} {msg}")?
            .progress_chars("##-"),
    );

    let mut rows = Vec::with_capacity(selected.len());
    for path in selected {
        let parsed = parser.parse_file(path)?;
        debug!(
            "{}: config={} run={} nodes={}",
            path.display(),
            parsed.config,
            parsed.run,
            parsed.nodes.len()
        );
        rows.push(MetricRow::from_run(&parsed));
        pb.inc(1);
    }
    pb.finish_and_clear();

    info!("aggregated {} of {} result files for pattern {:?}", rows.len(), files.len(), pattern);
    Ok(rows)
}

pub fn aggregate_metrics(files: &[PathBuf], pattern: &str) -> Result<MetricsTable> {
    let rows = collect_rows(files, pattern)?;
    MetricsTable::from_rows(&rows)
}
