use std::fs::File;
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};

#[derive(Clone, Copy, Debug, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChartFormat {
    Png,
    Html,
}

impl ChartFormat {
    pub fn extension(self) -> &'static str {
        match self {
            ChartFormat::Png => "png",
            ChartFormat::Html => "html",
        }
    }
}

/// Run-wide settings. Every field has a default so a partial JSON file is enough.
#[derive(Clone, Debug, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct AnalysisConfig {
    pub output_dir: PathBuf,
    pub confidence: f64,
    /// Algorithm names, matched as substrings of file paths and config names.
    pub algorithms: Vec<String>,
    pub chart_width: u32,
    pub chart_height: u32,
    pub chart_formats: Vec<ChartFormat>,
}

impl Default for AnalysisConfig {
    fn default() -> Self {
        Self {
            output_dir: PathBuf::from("analysis_output"),
            confidence: 0.95,
            algorithms: vec!["FastMIS".to_string(), "SlowMIS".to_string()],
            chart_width: 1200,
            chart_height: 600,
            chart_formats: vec![ChartFormat::Png, ChartFormat::Html],
        }
    }
}

impl AnalysisConfig {
    /// Load a JSON config file and validate it
    pub fn load(path: &Path) -> Result<Self> {
        let file = File::open(path)
            .with_context(|| format!("cannot open config file {}", path.display()))?;
        let config: AnalysisConfig = serde_json::from_reader(file)
            .with_context(|| format!("invalid config file {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if !(self.confidence > 0.0 && self.confidence < 1.0) {
            bail!("confidence must lie strictly between 0 and 1, got {}", self.confidence);
        }
        if self.algorithms.is_empty() {
            bail!("at least one algorithm name is required");
        }
        if self.chart_width == 0 || self.chart_height == 0 {
            bail!("chart dimensions must be non-zero");
        }
        Ok(())
    }
}
