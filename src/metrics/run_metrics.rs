use ordered_float::OrderedFloat;
use serde::{Deserialize, Serialize};

use crate::data::sca::{NodeMetric, ParsedRun};

/// Derived network-level metrics for one simulation run
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MetricRow {
    pub config: String,
    pub run: i64,
    pub total_nodes: u32,
    pub mis_nodes: u32,
    pub non_mis_nodes: u32,
    pub mis_ratio: f64,
    pub total_messages_sent: f64,
    pub total_messages_received: f64,
    pub total_message_overhead: f64,
    pub avg_overhead_per_node: f64,
    pub max_convergence_time: f64,
    pub avg_convergence_time: f64,
    pub max_phase: f64,
    pub avg_neighbors: f64,
    pub avg_cluster_size: f64,
    pub cluster_size_std: f64,
}

impl MetricRow {
    pub fn from_run(run: &ParsedRun) -> Self {
        let nodes: Vec<_> = run.nodes.values().collect();
        let total_nodes = nodes.len() as u32;

        let in_mis: Vec<_> = nodes
            .iter()
            .filter(|node| node.get(NodeMetric::InMis) == Some(1.0))
            .collect();
        let mis_nodes = in_mis.len() as u32;

        let sum_of = |metric: NodeMetric| -> f64 {
            nodes.iter().map(|node| node.get_or_zero(metric)).sum()
        };
        let total_messages_sent = sum_of(NodeMetric::TotalMessagesSent);
        let total_messages_received = sum_of(NodeMetric::TotalMessagesReceived);
        let total_message_overhead = sum_of(NodeMetric::TotalMessageOverhead);

        // zero or missing means "did not report", not "converged at t=0"
        let positive_of = |metric: NodeMetric| -> Vec<f64> {
            nodes
                .iter()
                .filter_map(|node| node.get(metric))
                .filter(|v| *v > 0.0)
                .collect()
        };
        let convergence_times = positive_of(NodeMetric::ConvergenceTime);
        let phases = positive_of(NodeMetric::Phase);

        // missing neighbor count means degree 0
        let neighbor_counts: Vec<f64> = nodes
            .iter()
            .map(|node| node.get_or_zero(NodeMetric::InitialNeighborCount))
            .collect();

        // a cluster is the MIS node plus its neighbors
        let cluster_sizes: Vec<f64> = in_mis
            .iter()
            .map(|node| node.get_or_zero(NodeMetric::InitialNeighborCount) + 1.0)
            .collect();
        let cluster_size_std = if cluster_sizes.len() > 1 {
            population_std(&cluster_sizes)
        } else {
            0.0
        };

        MetricRow {
            config: run.config.clone(),
            run: run.run,
            total_nodes,
            mis_nodes,
            non_mis_nodes: total_nodes - mis_nodes,
            mis_ratio: ratio(mis_nodes as f64, total_nodes),
            total_messages_sent,
            total_messages_received,
            total_message_overhead,
            avg_overhead_per_node: ratio(total_message_overhead, total_nodes),
            max_convergence_time: max_or_zero(&convergence_times),
            avg_convergence_time: mean_or_zero(&convergence_times),
            max_phase: max_or_zero(&phases),
            avg_neighbors: mean_or_zero(&neighbor_counts),
            avg_cluster_size: mean_or_zero(&cluster_sizes),
            cluster_size_std,
        }
    }
}

fn ratio(value: f64, total_nodes: u32) -> f64 {
    if total_nodes > 0 {
        value / total_nodes as f64
    } else {
        0.0
    }
}

pub fn mean_or_zero(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    values.iter().sum::<f64>() / values.len() as f64
}

pub fn max_or_zero(values: &[f64]) -> f64 {
    values
        .iter()
        .copied()
        .map(OrderedFloat)
        .max()
        .map(|m| m.into_inner())
        .unwrap_or(0.0)
}

/// Standard deviation with `n` in the denominator
pub fn population_std(values: &[f64]) -> f64 {
    if values.is_empty() {
        return 0.0;
    }
    let mean = mean_or_zero(values);
    let var = values.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / values.len() as f64;
    var.sqrt()
}
