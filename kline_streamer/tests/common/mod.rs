#![allow(dead_code)]

use kline_streamer::{
    engine::{EngineOptions, IndicatorEngine},
    errors::IngestError,
    feed::SubscriptionRequest,
    ingestor::StreamIngestor,
    models::{frame::RenderedFrame, timeframe::TimeFrame},
    render::{ChartRenderer, RenderError, WriteSnafu},
};
use serde_json::json;
use snafu::IntoError;

pub const CHANNEL: &str = "btcusdt@kline_1m";

/// A kline event as the exchange sends it, prices string-encoded.
pub fn kline_event(ts: i64, close: f64) -> String {
    json!({
        "e": "kline",
        "E": ts + 1_234,
        "s": "BTCUSDT",
        "k": {
            "t": ts,
            "T": ts + 59_999,
            "s": "BTCUSDT",
            "i": "1m",
            "o": format!("{:.2}", close - 0.5),
            "c": format!("{close:.2}"),
            "h": format!("{:.2}", close + 1.0),
            "l": format!("{:.2}", close - 1.0),
            "v": "12.50000000",
            "x": false
        }
    })
    .to_string()
}

/// Keeps every frame it was asked to draw; optionally fails every call.
#[derive(Default)]
pub struct RecordingRenderer {
    pub frames: Vec<RenderedFrame>,
    pub fail: bool,
}

impl ChartRenderer for RecordingRenderer {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError> {
        if self.fail {
            return Err(WriteSnafu {
                path: "/unwritable/chart.html",
            }
            .into_error(std::io::Error::other("disk full")));
        }
        self.frames.push(frame.clone());
        Ok(())
    }
}

/// Collects a short description of every reported error.
#[derive(Default)]
pub struct CollectingSink {
    pub malformed: Vec<String>,
    pub render_faults: Vec<String>,
}

impl kline_streamer::ingestor::ErrorSink for CollectingSink {
    fn report(&mut self, error: &IngestError) {
        if error.is_malformed() {
            self.malformed.push(error.to_string());
        } else {
            self.render_faults.push(error.to_string());
        }
    }
}

pub fn ingestor_with(
    options: EngineOptions,
    renderer: RecordingRenderer,
) -> StreamIngestor<RecordingRenderer, CollectingSink> {
    let engine = IndicatorEngine::new("btcusdt", TimeFrame::default(), options)
        .expect("valid engine options");
    StreamIngestor::new(
        engine,
        renderer,
        CollectingSink::default(),
        SubscriptionRequest::subscribe(vec![CHANNEL.to_string()], 1),
    )
}

pub fn ingestor() -> StreamIngestor<RecordingRenderer, CollectingSink> {
    ingestor_with(EngineOptions::default(), RecordingRenderer::default())
}

pub fn assert_close(actual: f64, expected: f64) {
    let tol = 1e-9 * expected.abs().max(1.0);
    assert!(
        (actual - expected).abs() <= tol,
        "expected {expected}, got {actual}"
    );
}
