//! The aligned data package handed to a chart renderer.

use serde::Serialize;

use crate::models::{bar_series::BarSeries, timeframe::TimeFrame};

/// Column-oriented snapshot of the series plus its indicator.
///
/// Every column has the same length and position `i` in each column refers to
/// the same bar. `sma[i]` is `None` until a full window of closes exists.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct RenderedFrame {
    pub symbol: String,
    pub interval: TimeFrame,
    /// Number of closes averaged for each `sma` value.
    pub window: usize,
    pub timestamps: Vec<i64>,
    pub opens: Vec<f64>,
    pub highs: Vec<f64>,
    pub lows: Vec<f64>,
    pub closes: Vec<f64>,
    pub volumes: Vec<f64>,
    pub sma: Vec<Option<f64>>,
}

impl RenderedFrame {
    /// Builds a frame from a series and an indicator column of equal length.
    pub(crate) fn from_parts(series: &BarSeries, window: usize, sma: Vec<Option<f64>>) -> Self {
        debug_assert_eq!(series.len(), sma.len());

        let n = series.len();
        let mut frame = Self {
            symbol: series.symbol.clone(),
            interval: series.timeframe,
            window,
            timestamps: Vec::with_capacity(n),
            opens: Vec::with_capacity(n),
            highs: Vec::with_capacity(n),
            lows: Vec::with_capacity(n),
            closes: Vec::with_capacity(n),
            volumes: Vec::with_capacity(n),
            sma,
        };
        for bar in series.iter() {
            frame.timestamps.push(bar.timestamp);
            frame.opens.push(bar.open);
            frame.highs.push(bar.high);
            frame.lows.push(bar.low);
            frame.closes.push(bar.close);
            frame.volumes.push(bar.volume);
        }
        frame
    }

    pub fn len(&self) -> usize {
        self.timestamps.len()
    }

    pub fn is_empty(&self) -> bool {
        self.timestamps.is_empty()
    }

    /// The most recent indicator value, if the newest bar has one.
    pub fn latest_sma(&self) -> Option<f64> {
        self.sma.last().copied().flatten()
    }
}
