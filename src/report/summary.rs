use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use comfy_table::presets::UTF8_FULL;
use comfy_table::{ContentArrangement, Table};
use polars::prelude::{CsvWriter, DataFrame, NamedFrom, SerWriter, Series};

use crate::data::columnar::{MetricsTable, CONFIG_COL};
use crate::metrics::confidence::{confidence_interval, ConfidenceSummary};

/// (column in the metrics table, header in the summary)
pub const SUMMARY_COLUMNS: [(&str, &str); 5] = [
    ("mis_nodes", "MIS Nodes"),
    ("total_message_overhead", "Total Overhead"),
    ("avg_overhead_per_node", "Overhead/Node"),
    ("max_convergence_time", "Convergence Time"),
    ("avg_cluster_size", "Avg Cluster Size"),
];

pub const FIRST_HEADER: &str = "Configuration";

/// One formatted row per configuration
#[derive(Clone, Debug, PartialEq)]
pub struct SummaryTable {
    pub confidence: f64,
    pub headers: Vec<String>,
    pub rows: Vec<Vec<String>>,
}

pub fn format_cell(ci: &ConfidenceSummary) -> String {
    format!("{:.2} ({:.2}-{:.2})", ci.mean, ci.lower, ci.upper)
}

impl SummaryTable {
    pub fn build(table: &MetricsTable, confidence: f64) -> Result<Self> {
        let configs = table.configs()?;
        let mut rows: Vec<Vec<String>> = configs.iter().map(|c| vec![c.clone()]).collect();

        for (column, _) in SUMMARY_COLUMNS {
            let groups = table.group_by(CONFIG_COL, column)?;
            for (row, (_, sample)) in rows.iter_mut().zip(groups) {
                row.push(format_cell(&confidence_interval(&sample, confidence)?));
            }
        }

        let headers = std::iter::once(FIRST_HEADER)
            .chain(SUMMARY_COLUMNS.iter().map(|(_, header)| *header))
            .map(str::to_string)
            .collect();
        Ok(Self { confidence, headers, rows })
    }

    pub fn to_latex(&self) -> String {
        let mut out = String::new();
        out.push_str(&format!(
            "% Summary Statistics with {:.0}% Confidence Intervals\n",
            self.confidence * 100.0
        ));
        out.push_str("% Format: Mean (CI_lower-CI_upper)\n\n");
        let column_format = format!("l{}", "c".repeat(self.headers.len().saturating_sub(1)));
        out.push_str(&format!("\\begin{{tabular}}{{{column_format}}}\n"));
        out.push_str("\\toprule\n");
        out.push_str(&format!("{} \\\\\n", self.headers.join(" & ")));
        out.push_str("\\midrule\n");
        for row in &self.rows {
            out.push_str(&format!("{} \\\\\n", row.join(" & ")));
        }
        out.push_str("\\bottomrule\n");
        out.push_str("\\end{tabular}\n");
        out
    }

    pub fn to_dataframe(&self) -> Result<DataFrame> {
        let columns: Vec<Series> = self
            .headers
            .iter()
            .enumerate()
            .map(|(i, header)| {
                let values: Vec<&str> = self.rows.iter().map(|row| row[i].as_str()).collect();
                Series::new(header, values)
            })
            .collect();
        Ok(DataFrame::new(columns)?)
    }

    pub fn to_console(&self) -> Table {
        let mut table = Table::new();
        table
            .load_preset(UTF8_FULL)
            .set_content_arrangement(ContentArrangement::Dynamic)
            .set_header(self.headers.clone());
        for row in &self.rows {
            table.add_row(row.clone());
        }
        table
    }

    /// Writes `<name>.tex` and the matching `<name>.csv`, returning both paths
    pub fn write(&self, tex_path: &Path) -> Result<(PathBuf, PathBuf)> {
        fs::write(tex_path, self.to_latex())
            .with_context(|| format!("cannot write {}", tex_path.display()))?;

        let csv_path = tex_path.with_extension("csv");
        let mut df = self.to_dataframe()?;
        let mut file = File::create(&csv_path)
            .with_context(|| format!("cannot create {}", csv_path.display()))?;
        CsvWriter::new(&mut file).has_header(true).finish(&mut df)?;

        Ok((tex_path.to_path_buf(), csv_path))
    }
}
