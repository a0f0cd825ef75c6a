use std::fs;
use std::path::Path;

use anyhow::{Context, Result};
use plotly::common::{ErrorData, ErrorType, Title};
use plotly::layout::{Axis, Layout};
use plotly::{Bar, Plot};

use crate::plot::bars::{BarSeries, ChartSpec};

/// Plotly bar trace with asymmetric error bars
pub fn build_plot(series: &BarSeries, spec: &ChartSpec<'_>) -> Plot {
    let errors = ErrorData::new(ErrorType::Data)
        .symmetric(false)
        .array(series.err_plus.clone())
        .array_minus(series.err_minus.clone());
    let bar = Bar::new(series.labels.clone(), series.means.clone())
        .name(spec.y_desc)
        .error_y(errors);

    let mut plot = Plot::new();
    plot.add_trace(bar);
    plot.set_layout(
        Layout::new()
            .title(Title::new(spec.title))
            .x_axis(Axis::new().title(Title::new(spec.x_desc)))
            .y_axis(Axis::new().title(Title::new(spec.y_desc))),
    );
    plot
}

pub fn render_html(series: &BarSeries, spec: &ChartSpec<'_>, out_path: &Path) -> Result<()> {
    let plot = build_plot(series, spec);

    // This already contains <div id="..."> + <script>...</script>
    let plot_html = plot.to_inline_html(None);

    let html = format!(
        r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="https://cdn.plot.ly/plotly-latest.min.js"></script>
</head>
<body>
{plot_html}
</body>
</html>
"#,
        title = spec.title,
        plot_html = plot_html
    );

    fs::write(out_path, html).with_context(|| format!("cannot write {}", out_path.display()))?;
    Ok(())
}
