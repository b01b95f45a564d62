//! Self-contained HTML chart using Plotly.js.
//!
//! The page holds a Close line and an SMA line over a date axis with a range
//! selector and range slider. The figure is plain JSON; Plotly is loaded from
//! its CDN when the page is opened.

use std::path::{Path, PathBuf};

use chrono::{DateTime, SecondsFormat};
use serde_json::{Value, json};
use snafu::ResultExt;

use crate::{
    models::frame::RenderedFrame,
    render::{ChartRenderer, RenderError, SerializeSnafu, write_atomically},
};

const PLOTLY_CDN: &str = "https://cdn.plot.ly/plotly-2.35.2.min.js";

#[derive(Debug, Clone)]
pub struct PlotlyHtmlRenderer {
    path: PathBuf,
    title: String,
}

impl PlotlyHtmlRenderer {
    pub fn new(path: impl Into<PathBuf>, title: impl Into<String>) -> Self {
        Self {
            path: path.into(),
            title: title.into(),
        }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    /// The Plotly figure (`{"data": [...], "layout": {...}}`) for `frame`.
    pub fn figure(&self, frame: &RenderedFrame) -> Value {
        let x: Vec<Value> = frame.timestamps.iter().map(|ts| axis_time(*ts)).collect();

        json!({
            "data": [
                {"type": "scatter", "mode": "lines", "name": "Close", "x": x, "y": frame.closes},
                {"type": "scatter", "mode": "lines", "name": "SMA", "x": x, "y": frame.sma},
            ],
            "layout": {
                "title": {"text": self.title},
                "xaxis": {
                    "type": "date",
                    "rangeselector": {
                        "buttons": [
                            {"count": 1, "label": "1m", "step": "month", "stepmode": "backward"},
                            {"count": 6, "label": "6m", "step": "month", "stepmode": "backward"},
                            {"count": 1, "label": "YTD", "step": "year", "stepmode": "todate"},
                            {"count": 1, "label": "1y", "step": "year", "stepmode": "backward"},
                            {"step": "all"},
                        ]
                    },
                    "rangeslider": {"visible": true},
                },
            },
        })
    }

    pub fn html(&self, frame: &RenderedFrame) -> Result<String, RenderError> {
        let figure = serde_json::to_string(&self.figure(frame)).context(SerializeSnafu)?;
        // Keep a "</script>" inside the data from closing the tag early.
        let figure = figure.replace("</", "<\\/");

        Ok(format!(
            r#"<!DOCTYPE html>
<html>
<head>
<meta charset="utf-8">
<title>{title}</title>
<script src="{PLOTLY_CDN}"></script>
</head>
<body>
<div id="chart" style="width:100%;height:100vh;"></div>
<script>
const figure = {figure};
Plotly.newPlot("chart", figure.data, figure.layout);
</script>
</body>
</html>
"#,
            title = escape_html(&self.title),
        ))
    }
}

impl ChartRenderer for PlotlyHtmlRenderer {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError> {
        let page = self.html(frame)?;
        write_atomically(&self.path, page.as_bytes())
    }
}

/// Millisecond timestamps become ISO-8601 strings; anything chrono cannot
/// place on the calendar is passed through as a number.
fn axis_time(ts: i64) -> Value {
    match DateTime::from_timestamp_millis(ts) {
        Some(dt) => Value::String(dt.to_rfc3339_opts(SecondsFormat::Millis, true)),
        None => Value::from(ts),
    }
}

fn escape_html(s: &str) -> String {
    s.replace('&', "&amp;")
        .replace('<', "&lt;")
        .replace('>', "&gt;")
}
