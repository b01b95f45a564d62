//! The ingestion and indicator core.
//!
//! [`IndicatorEngine`] owns one [`BarSeries`] and the SMA column aligned with
//! it. Every accepted bar moves the series from length `n` to `n + 1` (or, in
//! [`SeriesMode::Upsert`], may replace the newest bar instead), and the newest
//! indicator value is updated through a [`RollingMean`].

use std::collections::VecDeque;

use serde::Deserialize;
use snafu::{Snafu, ensure};
use tracing::{debug, warn};

use crate::{
    indicators::{RollingMean, simple_moving_average},
    models::{bar::Bar, bar_series::BarSeries, frame::RenderedFrame, timeframe::TimeFrame},
};

/// Number of closes averaged by default.
pub const DEFAULT_SMA_WINDOW: usize = 20;

/// How repeated updates for the same bar are stored.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SeriesMode {
    /// Every event becomes a new row, even a re-send of the open bar.
    #[default]
    Append,
    /// An event whose timestamp equals the newest bar's replaces that bar.
    Upsert,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EngineOptions {
    pub window: usize,
    pub mode: SeriesMode,
    /// Retain at most this many bars, evicting the oldest first.
    pub max_history: Option<usize>,
}

impl Default for EngineOptions {
    fn default() -> Self {
        Self {
            window: DEFAULT_SMA_WINDOW,
            mode: SeriesMode::Append,
            max_history: None,
        }
    }
}

#[derive(Debug, Snafu, PartialEq, Eq)]
#[snafu(visibility(pub))]
pub enum EngineOptionsError {
    #[snafu(display("SMA window must be at least 1"))]
    ZeroWindow,

    #[snafu(display("max_history ({max_history}) must be at least the SMA window ({window})"))]
    HistoryShorterThanWindow { max_history: usize, window: usize },
}

impl EngineOptions {
    pub fn validate(&self) -> Result<(), EngineOptionsError> {
        ensure!(self.window > 0, ZeroWindowSnafu);
        if let Some(max_history) = self.max_history {
            ensure!(
                max_history >= self.window,
                HistoryShorterThanWindowSnafu {
                    max_history,
                    window: self.window,
                }
            );
        }
        Ok(())
    }
}

/// What [`IndicatorEngine::ingest`] did with a bar.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Ingested {
    Appended { len: usize },
    Replaced { len: usize },
}

#[derive(Debug, Clone)]
pub struct IndicatorEngine {
    options: EngineOptions,
    series: BarSeries,
    rolling: RollingMean,
    sma: VecDeque<Option<f64>>,
}

impl IndicatorEngine {
    pub fn new(
        symbol: impl Into<String>,
        timeframe: TimeFrame,
        options: EngineOptions,
    ) -> Result<Self, EngineOptionsError> {
        options.validate()?;
        Ok(Self {
            options,
            series: BarSeries::new(symbol, timeframe),
            rolling: RollingMean::new(options.window),
            sma: VecDeque::new(),
        })
    }

    pub fn series(&self) -> &BarSeries {
        &self.series
    }

    /// SMA column aligned with [`series`](Self::series).
    pub fn indicator(&self) -> &VecDeque<Option<f64>> {
        &self.sma
    }

    pub fn ingest(&mut self, bar: Bar) -> Ingested {
        let last_ts = self.series.last().map(|b| b.timestamp);

        if let Some(prev) = last_ts {
            if bar.timestamp < prev {
                warn!(
                    timestamp = bar.timestamp,
                    previous = prev,
                    "bar arrived out of order; keeping receipt order"
                );
            }
        }

        let outcome = match (self.options.mode, last_ts) {
            (SeriesMode::Upsert, Some(prev)) if prev == bar.timestamp => {
                self.series.replace_last(bar);
                let value = self.rolling.replace_last(bar.close);
                if let Some(slot) = self.sma.back_mut() {
                    *slot = value;
                }
                Ingested::Replaced {
                    len: self.series.len(),
                }
            }
            _ => {
                self.series.push(bar);
                self.sma.push_back(self.rolling.push(bar.close));
                self.enforce_retention();
                Ingested::Appended {
                    len: self.series.len(),
                }
            }
        };

        debug!(
            timestamp = bar.timestamp,
            close = bar.close,
            sma = ?self.sma.back().copied().flatten(),
            ?outcome,
            "bar ingested"
        );
        outcome
    }

    /// Snapshot of the current series and indicator. Reading does not change state.
    pub fn frame(&self) -> RenderedFrame {
        RenderedFrame::from_parts(
            &self.series,
            self.options.window,
            self.sma.iter().copied().collect(),
        )
    }

    /// Recomputes the SMA column from the retained closes alone.
    ///
    /// Matches [`indicator`](Self::indicator) as long as nothing was evicted;
    /// after eviction the first `window - 1` retained positions lose their value.
    pub fn recompute_indicator(&self) -> Vec<Option<f64>> {
        simple_moving_average(&self.series.closes(), self.options.window)
    }

    fn enforce_retention(&mut self) {
        let Some(cap) = self.options.max_history else {
            return;
        };
        while self.series.len() > cap {
            self.series.evict_oldest();
            self.sma.pop_front();
        }
    }
}
