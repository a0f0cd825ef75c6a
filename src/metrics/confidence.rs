use anyhow::{bail, Result};
use serde::Serialize;
use statrs::distribution::{ContinuousCDF, StudentsT};

pub const DEFAULT_CONFIDENCE: f64 = 0.95;

#[derive(Clone, Copy, Debug, PartialEq, Serialize)]
pub struct ConfidenceSummary {
    pub mean: f64,
    pub lower: f64,
    pub upper: f64,
}

impl ConfidenceSummary {
    fn point(value: f64) -> Self {
        Self { mean: value, lower: value, upper: value }
    }

    pub fn half_width(&self) -> f64 {
        self.upper - self.mean
    }
}

/// Mean with a two-tailed Student-t interval.
///
/// An empty sample yields all zeros and a single value collapses the interval to that value.
pub fn confidence_interval(sample: &[f64], confidence: f64) -> Result<ConfidenceSummary> {
    if !(confidence > 0.0 && confidence < 1.0) {
        bail!("confidence level must be in (0, 1), got {confidence}");
    }
    let n = sample.len();
    if n == 0 {
        return Ok(ConfidenceSummary::point(0.0));
    }
    let mean = sample.iter().sum::<f64>() / n as f64;
    if n == 1 {
        return Ok(ConfidenceSummary::point(mean));
    }

    let var = sample.iter().map(|v| (v - mean).powi(2)).sum::<f64>() / (n - 1) as f64;
    let sem = var.sqrt() / (n as f64).sqrt();
    let t_dist = StudentsT::new(0.0, 1.0, (n - 1) as f64)?;
    let t_crit = t_dist.inverse_cdf((1.0 + confidence) / 2.0);
    let half = sem * t_crit;

    Ok(ConfidenceSummary { mean, lower: mean - half, upper: mean + half })
}
