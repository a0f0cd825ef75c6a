use std::fs::{self, File};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use log::info;
use plotters::style::RGBColor;

use crate::config::{AnalysisConfig, ChartFormat};
use crate::data::columnar::{MetricsTable, ALGORITHM_COL, CONFIG_COL};
use crate::data::loader::{aggregate_metrics, collect_rows, find_sca_files};
use crate::plot::bars::{render_png, BarSeries, ChartSpec, COMPARISON_COLORS, STEELBLUE};
use crate::plot::to_html::render_html;
use crate::report::summary::SummaryTable;

/// One bar chart: file stem (or suffix), metric column, y-axis label, title.
struct ChartDef {
    name: &'static str,
    metric: &'static str,
    y_desc: &'static str,
    title: &'static str,
}

const ALGORITHM_CHARTS: [ChartDef; 4] = [
    ChartDef {
        name: "mis_size",
        metric: "mis_nodes",
        y_desc: "Number of MIS Nodes",
        title: "MIS Size across Configurations",
    },
    ChartDef {
        name: "overhead",
        metric: "total_message_overhead",
        y_desc: "Total Messages",
        title: "Message Overhead with {ci} CI",
    },
    ChartDef {
        name: "convergence",
        metric: "max_convergence_time",
        y_desc: "Time (seconds)",
        title: "Convergence Time with {ci} CI",
    },
    ChartDef {
        name: "cluster_size",
        metric: "avg_cluster_size",
        y_desc: "Nodes per Cluster",
        title: "Average Cluster Size with {ci} CI",
    },
];

const COMPARISON_CHARTS: [ChartDef; 3] = [
    ChartDef {
        name: "comparison_overhead",
        metric: "avg_overhead_per_node",
        y_desc: "Messages per Node",
        title: "Algorithm Comparison: Overhead per Node",
    },
    ChartDef {
        name: "comparison_convergence",
        metric: "max_convergence_time",
        y_desc: "Time (seconds)",
        title: "Algorithm Comparison: Convergence Time",
    },
    ChartDef {
        name: "comparison_mis_ratio",
        metric: "mis_ratio",
        y_desc: "MIS/Total Nodes",
        title: "Algorithm Comparison: MIS Ratio",
    },
];

/// Which column the bars are grouped by, and how that axis looks.
struct Grouping {
    key: &'static str,
    x_desc: &'static str,
    colors: &'static [RGBColor],
}

const BY_CONFIG: Grouping =
    Grouping { key: CONFIG_COL, x_desc: "Configuration", colors: &[STEELBLUE] };
const BY_ALGORITHM: Grouping =
    Grouping { key: ALGORITHM_COL, x_desc: "Algorithm", colors: &COMPARISON_COLORS };

const RULE: &str = "------------------------------------------------------------";
const DOUBLE_RULE: &str = "============================================================";

fn generated(path: &Path) {
    println!("✓ Generated: {}", path.display());
}

/// Drives the whole pipeline for one results directory and returns every file written
pub struct Analysis<'a> {
    config: &'a AnalysisConfig,
    artifacts: Vec<PathBuf>,
}

impl<'a> Analysis<'a> {
    pub fn new(config: &'a AnalysisConfig) -> Self {
        Self { config, artifacts: Vec::new() }
    }

    fn ci_label(&self) -> String {
        format!("{:.0}%", self.config.confidence * 100.0)
    }

    fn record(&mut self, path: PathBuf) {
        generated(&path);
        self.artifacts.push(path);
    }

    fn chart(
        &mut self,
        table: &MetricsTable,
        grouping: &Grouping,
        def: &ChartDef,
        stem: &str,
        title: &str,
    ) -> Result<()> {
        let groups = table.group_by(grouping.key, def.metric)?;
        let series = BarSeries::from_groups(&groups, self.config.confidence)?;
        let spec = ChartSpec {
            title,
            x_desc: grouping.x_desc,
            y_desc: def.y_desc,
            colors: grouping.colors,
            size: (self.config.chart_width, self.config.chart_height),
        };

        for format in self.config.chart_formats.clone() {
            let path = self.config.output_dir.join(format!("{stem}.{}", format.extension()));
            match format {
                ChartFormat::Png => render_png(&series, &spec, &path)?,
                ChartFormat::Html => render_html(&series, &spec, &path)?,
            }
            self.record(path);
        }
        Ok(())
    }

    fn algorithm_report(&mut self, files: &[PathBuf], algo: &str) -> Result<()> {
        println!("\n{algo} Analysis:");
        println!("{RULE}");

        let table = aggregate_metrics(files, algo)?;
        if table.is_empty() {
            println!("  No data found for {algo}");
            return Ok(());
        }
        println!("  Configurations: {}", table.configs()?.len());
        println!("  Total runs: {}", table.len());

        let ci = self.ci_label();
        for def in &ALGORITHM_CHARTS {
            let title = format!("{algo}: {}", def.title.replace("{ci}", &ci));
            let stem = format!("{algo}_{}", def.name);
            self.chart(&table, &BY_CONFIG, def, &stem, &title)?;
        }

        let summary = SummaryTable::build(&table, self.config.confidence)?;
        println!("{}", summary.to_console());
        let tex_path = self.config.output_dir.join(format!("{algo}_summary.tex"));
        let (tex, csv) = summary.write(&tex_path)?;
        self.record(tex);
        self.record(csv);
        Ok(())
    }

    fn comparison_report(&mut self, files: &[PathBuf]) -> Result<()> {
        println!("\nGenerating Comparison Plots:");
        println!("{RULE}");

        let rows = collect_rows(files, "")?;
        let dump = self.config.output_dir.join("all_runs.json");
        let file =
            File::create(&dump).with_context(|| format!("cannot create {}", dump.display()))?;
        serde_json::to_writer_pretty(file, &rows)?;
        self.record(dump);

        let mut table = MetricsTable::from_rows(&rows)?;
        if table.is_empty() {
            return Ok(());
        }
        table.label_algorithms(&self.config.algorithms)?;
        for def in &COMPARISON_CHARTS {
            self.chart(&table, &BY_ALGORITHM, def, def.name, def.title)?;
        }
        Ok(())
    }

    pub fn run(mut self, results_dir: &Path) -> Result<Vec<PathBuf>> {
        let files = find_sca_files(results_dir)?;

        println!("\nFound {} result files", files.len());
        println!("{DOUBLE_RULE}");

        fs::create_dir_all(&self.config.output_dir).with_context(|| {
            format!("cannot create output directory {}", self.config.output_dir.display())
        })?;
        info!("writing artifacts to {}", self.config.output_dir.display());

        for algo in self.config.algorithms.clone() {
            self.algorithm_report(&files, &algo)?;
        }
        self.comparison_report(&files)?;

        println!("\n{DOUBLE_RULE}");
        println!("Analysis complete! Results saved to {}/", self.config.output_dir.display());
        println!("{DOUBLE_RULE}");
        Ok(self.artifacts)
    }
}

pub fn run(results_dir: &Path, config: &AnalysisConfig) -> Result<Vec<PathBuf>> {
    Analysis::new(config).run(results_dir)
}
