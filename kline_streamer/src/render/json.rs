use std::path::PathBuf;

use snafu::ResultExt;

use crate::{
    models::frame::RenderedFrame,
    render::{ChartRenderer, RenderError, SerializeSnafu, write_atomically},
};

/// Dumps the raw frame as pretty-printed JSON, for external plotting tools.
#[derive(Debug, Clone)]
pub struct JsonFrameRenderer {
    path: PathBuf,
}

impl JsonFrameRenderer {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }
}

impl ChartRenderer for JsonFrameRenderer {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError> {
        let body = serde_json::to_vec_pretty(frame).context(SerializeSnafu)?;
        write_atomically(&self.path, &body)
    }
}

#[cfg(test)]
mod tests {
    use serde_json::Value;

    use super::*;
    use crate::models::timeframe::TimeFrame;

    #[test]
    fn gaps_are_written_as_null() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("frame.json");
        let frame = RenderedFrame {
            symbol: "btcusdt".into(),
            interval: TimeFrame::default(),
            window: 2,
            timestamps: vec![0, 60_000],
            opens: vec![1.0, 2.0],
            highs: vec![1.0, 2.0],
            lows: vec![1.0, 2.0],
            closes: vec![1.0, 2.0],
            volumes: vec![5.0, 6.0],
            sma: vec![None, Some(1.5)],
        };

        JsonFrameRenderer::new(&path).render(&frame).unwrap();

        let written: Value = serde_json::from_slice(&std::fs::read(&path).unwrap()).unwrap();
        assert_eq!(written["interval"], "1m");
        assert_eq!(written["sma"][0], Value::Null);
        assert_eq!(written["sma"][1], 1.5);
        assert_eq!(written["timestamps"][1], 60_000);
    }
}
