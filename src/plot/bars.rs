use std::error::Error;
use std::path::Path;

use anyhow::{anyhow, Result};
use plotters::prelude::*;

use crate::metrics::confidence::confidence_interval;

/// Bar heights with asymmetric confidence error extents, one bar per group.
#[derive(Clone, Debug, PartialEq)]
pub struct BarSeries {
    pub labels: Vec<String>,
    pub means: Vec<f64>,
    /// `mean - lower`
    pub err_minus: Vec<f64>,
    /// `upper - mean`
    pub err_plus: Vec<f64>,
}

impl BarSeries {
    pub fn from_groups(groups: &[(String, Vec<f64>)], confidence: f64) -> Result<Self> {
        let mut series = BarSeries {
            labels: Vec::with_capacity(groups.len()),
            means: Vec::with_capacity(groups.len()),
            err_minus: Vec::with_capacity(groups.len()),
            err_plus: Vec::with_capacity(groups.len()),
        };
        for (label, sample) in groups {
            let ci = confidence_interval(sample, confidence)?;
            series.labels.push(label.clone());
            series.means.push(ci.mean);
            series.err_minus.push(ci.mean - ci.lower);
            series.err_plus.push(ci.upper - ci.mean);
        }
        Ok(series)
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }

    /// Value range covering bars and error bars, always including zero
    pub fn y_range(&self) -> (f64, f64) {
        let mut y_min = 0.0f64;
        let mut y_max = 0.0f64;
        for i in 0..self.len() {
            y_min = y_min.min(self.means[i] - self.err_minus[i]);
            y_max = y_max.max(self.means[i] + self.err_plus[i]);
        }
        if !y_min.is_finite() || !y_max.is_finite() || (y_max - y_min).abs() < 1e-9 {
            return (0.0, 1.0);
        }
        let pad = 0.1 * (y_max - y_min);
        (if y_min < 0.0 { y_min - pad } else { 0.0 }, y_max + pad)
    }
}

/// Chart text and look shared by the PNG and HTML renderings.
pub struct ChartSpec<'a> {
    pub title: &'a str,
    pub x_desc: &'a str,
    pub y_desc: &'a str,
    pub colors: &'a [RGBColor],
    pub size: (u32, u32),
}

pub const STEELBLUE: RGBColor = RGBColor(70, 130, 180);
pub const COMPARISON_COLORS: [RGBColor; 3] =
    [RGBColor(0x2E, 0x86, 0xAB), RGBColor(0xA2, 0x3B, 0x72), RGBColor(0xF1, 0x8F, 0x01)];

pub fn render_png(series: &BarSeries, spec: &ChartSpec<'_>, out_path: &Path) -> Result<()> {
    draw_bars(series, spec, out_path)
        .map_err(|e| anyhow!("failed to render {}: {}", out_path.display(), e))
}

fn draw_bars(
    series: &BarSeries,
    spec: &ChartSpec<'_>,
    out_path: &Path,
) -> Result<(), Box<dyn Error>> {
    let n = series.len();
    let (y_lo, y_hi) = series.y_range();

    let root = BitMapBackend::new(out_path, spec.size).into_drawing_area();
    root.fill(&WHITE)?;
    let mut chart = ChartBuilder::on(&root)
        .caption(spec.title, ("sans-serif", 22))
        .margin(15)
        .x_label_area_size(60)
        .y_label_area_size(70)
        .build_cartesian_2d(-0.5f64..(n as f64 - 0.5).max(0.5), y_lo..y_hi)?;

    let label_at = |x: &f64| -> String {
        let idx = x.round();
        if (x - idx).abs() > 1e-6 || idx < 0.0 {
            return String::new();
        }
        series.labels.get(idx as usize).cloned().unwrap_or_default()
    };
    chart
        .configure_mesh()
        .disable_x_mesh()
        .x_labels(n.max(1))
        .x_label_formatter(&label_at)
        .x_desc(spec.x_desc)
        .y_desc(spec.y_desc)
        .draw()?;

    let half_bar = 0.35;
    let cap = 0.1;
    for i in 0..n {
        let x = i as f64;
        let color = spec
            .colors
            .get(i % spec.colors.len().max(1))
            .copied()
            .unwrap_or(STEELBLUE);
        let mean = series.means[i];
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half_bar, 0.0), (x + half_bar, mean)],
            color.mix(0.75).filled(),
        )))?;
        chart.draw_series(std::iter::once(Rectangle::new(
            [(x - half_bar, 0.0), (x + half_bar, mean)],
            BLACK.stroke_width(1),
        )))?;

        let y0 = mean - series.err_minus[i];
        let y1 = mean + series.err_plus[i];
        if y1 > y0 {
            for segment in [
                vec![(x, y0), (x, y1)],
                vec![(x - cap, y0), (x + cap, y0)],
                vec![(x - cap, y1), (x + cap, y1)],
            ] {
                let whisker = PathElement::new(segment, BLACK.stroke_width(2));
                chart.draw_series(std::iter::once(whisker))?;
            }
        }
    }

    root.present()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_from_groups() {
        let groups = vec![
            ("Grid4".to_string(), vec![10.0, 10.0, 10.0]),
            ("Ring8".to_string(), vec![2.0]),
            ("Line".to_string(), vec![1.0, 3.0]),
        ];
        let series = BarSeries::from_groups(&groups, 0.95).unwrap();
        assert_eq!(series.labels, vec!["Grid4", "Ring8", "Line"]);
        assert_eq!(series.means, vec![10.0, 2.0, 2.0]);
        assert_eq!(series.err_minus[0], 0.0);
        assert_eq!(series.err_plus[1], 0.0);
        assert!(series.err_plus[2] > 0.0);
        assert!((series.err_plus[2] - series.err_minus[2]).abs() < 1e-9);
    }

    #[test]
    fn y_range_covers_error_bars() {
        let series = BarSeries {
            labels: vec!["a".into(), "b".into()],
            means: vec![4.0, 8.0],
            err_minus: vec![1.0, 2.0],
            err_plus: vec![1.0, 2.0],
        };
        let (lo, hi) = series.y_range();
        assert_eq!(lo, 0.0);
        assert!(hi >= 10.0);

        let flat = BarSeries { labels: vec![], means: vec![], err_minus: vec![], err_plus: vec![] };
        assert_eq!(flat.y_range(), (0.0, 1.0));
    }

    #[test]
    fn renders_png_with_error_bars() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("mis_size.png");
        let groups = vec![
            ("FastMIS-Grid".to_string(), vec![3.0, 4.0, 5.0]),
            ("FastMIS-Ring".to_string(), vec![2.0]),
        ];
        let series = BarSeries::from_groups(&groups, 0.95).unwrap();
        let spec = ChartSpec {
            title: "FastMIS: MIS Size across Configurations",
            x_desc: "Configuration",
            y_desc: "Number of MIS Nodes",
            colors: &[STEELBLUE],
            size: (640, 320),
        };

        render_png(&series, &spec, &out).unwrap();
        let bytes = std::fs::read(&out).unwrap();
        assert!(bytes.starts_with(b"\x89PNG"));
    }

    #[test]
    fn renders_empty_png_without_panicking() {
        let dir = tempfile::tempdir().unwrap();
        let out = dir.path().join("empty.png");
        let series =
            BarSeries { labels: vec![], means: vec![], err_minus: vec![], err_plus: vec![] };
        let spec = ChartSpec {
            title: "empty",
            x_desc: "Algorithm",
            y_desc: "MIS/Total Nodes",
            colors: &[],
            size: (320, 240),
        };

        render_png(&series, &spec, &out).unwrap();
        assert!(out.is_file());
    }
}
