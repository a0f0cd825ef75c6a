use anyhow::{Context, Result};
use itertools::Itertools;
use polars::prelude::{DataFrame, DataType, NamedFrom, Series};

use crate::metrics::run_metrics::MetricRow;

pub const CONFIG_COL: &str = "config";
pub const ALGORITHM_COL: &str = "algorithm";

/// Per-run metric rows backed by a Polars DataFrame, one column per `MetricRow` field
#[derive(Clone, Debug)]
pub struct MetricsTable {
    pub df: DataFrame,
}

impl MetricsTable {
    pub fn new(df: DataFrame) -> Self {
        Self { df }
    }

    pub fn from_rows(rows: &[MetricRow]) -> Result<Self> {
        let f64_col = |name: &str, get: fn(&MetricRow) -> f64| {
            Series::new(name, rows.iter().map(get).collect::<Vec<f64>>())
        };
        let u32_col = |name: &str, get: fn(&MetricRow) -> u32| {
            Series::new(name, rows.iter().map(get).collect::<Vec<u32>>())
        };

        let columns = vec![
            Series::new(CONFIG_COL, rows.iter().map(|r| r.config.as_str()).collect::<Vec<&str>>()),
            Series::new("run", rows.iter().map(|r| r.run).collect::<Vec<i64>>()),
            u32_col("total_nodes", |r| r.total_nodes),
            u32_col("mis_nodes", |r| r.mis_nodes),
            u32_col("non_mis_nodes", |r| r.non_mis_nodes),
            f64_col("mis_ratio", |r| r.mis_ratio),
            f64_col("total_messages_sent", |r| r.total_messages_sent),
            f64_col("total_messages_received", |r| r.total_messages_received),
            f64_col("total_message_overhead", |r| r.total_message_overhead),
            f64_col("avg_overhead_per_node", |r| r.avg_overhead_per_node),
            f64_col("max_convergence_time", |r| r.max_convergence_time),
            f64_col("avg_convergence_time", |r| r.avg_convergence_time),
            f64_col("max_phase", |r| r.max_phase),
            f64_col("avg_neighbors", |r| r.avg_neighbors),
            f64_col("avg_cluster_size", |r| r.avg_cluster_size),
            f64_col("cluster_size_std", |r| r.cluster_size_std),
        ];
        Ok(Self::new(DataFrame::new(columns)?))
    }

    /// Number of rows
    pub fn len(&self) -> usize {
        self.df.height()
    }

    pub fn is_empty(&self) -> bool {
        self.df.height() == 0
    }

    /// Extract a numeric column as Vec<f64>, casting integer columns
    pub fn column_f64(&self, col: &str) -> Result<Vec<f64>> {
        let series = self
            .df
            .column(col)
            .with_context(|| format!("unknown column {col}"))?
            .cast(&DataType::Float64)?;
        let values = series.f64()?.into_iter().map(|v| v.unwrap_or(f64::NAN)).collect();
        Ok(values)
    }

    pub fn column_str(&self, col: &str) -> Result<Vec<String>> {
        let series = self.df.column(col).with_context(|| format!("unknown column {col}"))?;
        let values = series
            .utf8()?
            .into_iter()
            .map(|v| v.unwrap_or_default().to_string())
            .collect();
        Ok(values)
    }

    /// Distinct configuration names in order of first appearance
    pub fn configs(&self) -> Result<Vec<String>> {
        Ok(self.column_str(CONFIG_COL)?.into_iter().unique().collect())
    }

    /// Adds the `algorithm` column: the first algorithm whose name occurs in the
    /// config name, or the last algorithm when none does.
    pub fn label_algorithms(&mut self, algorithms: &[String]) -> Result<()> {
        let labels: Vec<String> = self
            .column_str(CONFIG_COL)?
            .iter()
            .map(|config| algorithm_label(config, algorithms))
            .collect();
        let labels: Vec<&str> = labels.iter().map(String::as_str).collect();
        self.df.with_column(Series::new(ALGORITHM_COL, labels))?;
        Ok(())
    }

    /// Samples of `metric` grouped by the string column `key`, groups in order of first appearance
    pub fn group_by(&self, key: &str, metric: &str) -> Result<Vec<(String, Vec<f64>)>> {
        let keys = self.column_str(key)?;
        let values = self.column_f64(metric)?;

        let mut groups: Vec<(String, Vec<f64>)> = Vec::new();
        for (k, v) in keys.into_iter().zip(values) {
            match groups.iter_mut().find(|(name, _)| *name == k) {
                Some((_, sample)) => sample.push(v),
                None => groups.push((k, vec![v])),
            }
        }
        Ok(groups)
    }
}

pub fn algorithm_label(config: &str, algorithms: &[String]) -> String {
    algorithms
        .iter()
        .find(|algo| config.contains(algo.as_str()))
        .or_else(|| algorithms.last())
        .cloned()
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn row(config: &str, run: i64, mis_nodes: u32, overhead: f64) -> MetricRow {
        MetricRow {
            config: config.to_string(),
            run,
            total_nodes: 10,
            mis_nodes,
            non_mis_nodes: 10 - mis_nodes,
            mis_ratio: mis_nodes as f64 / 10.0,
            total_messages_sent: overhead,
            total_messages_received: 0.0,
            total_message_overhead: overhead,
            avg_overhead_per_node: overhead / 10.0,
            max_convergence_time: 0.0,
            avg_convergence_time: 0.0,
            max_phase: 0.0,
            avg_neighbors: 0.0,
            avg_cluster_size: 0.0,
            cluster_size_std: 0.0,
        }
    }

    fn algorithms() -> Vec<String> {
        vec!["FastMIS".to_string(), "SlowMIS".to_string()]
    }

    #[test]
    fn builds_columns_from_rows() {
        let rows = [row("FastMIS-Grid", 0, 3, 40.0), row("FastMIS-Grid", 1, 4, 60.0)];
        let table = MetricsTable::from_rows(&rows).unwrap();
        assert!(format!("{table:?}").contains("mis_nodes"));
        assert_eq!(table.len(), 2);
        assert_eq!(table.column_f64("mis_nodes").unwrap(), vec![3.0, 4.0]);
        assert_eq!(table.column_f64("avg_overhead_per_node").unwrap(), vec![4.0, 6.0]);
        assert!(table.column_f64("no_such_column").is_err());
    }

    #[test]
    fn empty_table() {
        let table = MetricsTable::from_rows(&[]).unwrap();
        assert!(table.is_empty());
        assert!(table.configs().unwrap().is_empty());
    }

    #[test]
    fn groups_preserve_first_appearance() {
        let table = MetricsTable::from_rows(&[
            row("SlowMIS-Ring", 0, 1, 1.0),
            row("FastMIS-Grid", 0, 2, 2.0),
            row("SlowMIS-Ring", 1, 3, 3.0),
        ])
        .unwrap();
        assert_eq!(table.configs().unwrap(), vec!["SlowMIS-Ring", "FastMIS-Grid"]);
        let groups = table.group_by(CONFIG_COL, "mis_nodes").unwrap();
        assert_eq!(
            groups,
            vec![
                ("SlowMIS-Ring".to_string(), vec![1.0, 3.0]),
                ("FastMIS-Grid".to_string(), vec![2.0]),
            ]
        );
    }

    #[test]
    fn labels_algorithms() {
        let mut table = MetricsTable::from_rows(&[
            row("FastMIS-Grid", 0, 2, 2.0),
            row("SlowMIS-Ring", 0, 1, 1.0),
            row("Baseline", 0, 1, 5.0),
        ])
        .unwrap();
        table.label_algorithms(&algorithms()).unwrap();
        assert_eq!(table.column_str(ALGORITHM_COL).unwrap(), vec!["FastMIS", "SlowMIS", "SlowMIS"]);

        let groups = table.group_by(ALGORITHM_COL, "total_message_overhead").unwrap();
        assert_eq!(groups[1], ("SlowMIS".to_string(), vec![1.0, 5.0]));
    }

    #[test]
    fn label_fallback_without_algorithms() {
        assert_eq!(algorithm_label("FastMIS-Grid", &[]), "");
        assert_eq!(algorithm_label("Other", &algorithms()), "SlowMIS");
    }
}
