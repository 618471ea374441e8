//! Plotly figure JSON and the HTML page shell the dashboard embeds it in.
//!
//! Figures are plain `serde_json` values in the shape Plotly.js expects
//! (`{ data: [...], layout: {...} }`); the page shell loads Plotly from a
//! CDN and hands the figure over verbatim.

use serde_json::{json, Value};

use crate::heatmap::HeatmapGrid;

/// Plotly heatmap figure for an hourly-load grid.
///
/// The y axis is reversed so 00:00 renders at the top; the x axis gets the
/// noon-to-noon display range so edge columns are not clipped.
pub fn heatmap_figure(grid: &HeatmapGrid, x_range: (String, String)) -> Value {
    let x: Vec<String> = grid
        .days
        .iter()
        .map(|d| d.format("%Y-%m-%d").to_string())
        .collect();

    json!({
        "data": [{
            "type": "heatmap",
            "x": x,
            "y": grid.hours,
            "z": grid.z,
            "colorscale": "Greens",
            "reversescale": true,
        }],
        "layout": {
            "xaxis": { "range": [x_range.0, x_range.1] },
            "yaxis": { "autorange": "reversed" },
            "height": 700,
        }
    })
}

const PAGE_TEMPLATE: &str = r#"<!DOCTYPE html>
<html lang="en">
<head>
<meta charset="utf-8">
<title>__TITLE__</title>
<script src="https://cdn.plot.ly/plotly-2.35.2.min.js"></script>
</head>
<body>
<h1>__TITLE__</h1>
<p>__INFORMATION__</p>
<div id="graph"></div>
<script>
var figure = __FIGURE__;
Plotly.newPlot("graph", figure.data, figure.layout, {responsive: true});
</script>
</body>
</html>
"#;

/// Render a full HTML page around a Plotly figure.
pub fn render_page(title: &str, information: &str, figure: &Value) -> String {
    PAGE_TEMPLATE
        .replace("__TITLE__", &escape(title))
        .replace("__INFORMATION__", &escape(information))
        .replace("__FIGURE__", &figure.to_string())
}

/// Minimal HTML escaping for text interpolated into pages.
pub fn escape(text: &str) -> String {
    text.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
        .replace('"', "&quot;")
}
