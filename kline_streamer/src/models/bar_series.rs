//! An insertion-ordered collection of bars for one symbol and interval.

use std::collections::VecDeque;

use crate::models::{bar::Bar, timeframe::TimeFrame};

/// The ingested history for a single symbol.
///
/// Bars are kept oldest first, exactly in receipt order. The only mutations
/// are appending at the back, replacing the newest bar, and evicting from the
/// front when a retention cap is in force.
#[derive(Debug, Clone, PartialEq)]
pub struct BarSeries {
    /// The symbol this data represents (e.g., "btcusdt").
    pub symbol: String,
    /// The interval of each bar in the series.
    pub timeframe: TimeFrame,
    bars: VecDeque<Bar>,
}

impl BarSeries {
    pub fn new(symbol: impl Into<String>, timeframe: TimeFrame) -> Self {
        Self {
            symbol: symbol.into(),
            timeframe,
            bars: VecDeque::new(),
        }
    }

    pub fn push(&mut self, bar: Bar) {
        self.bars.push_back(bar);
    }

    /// Swaps the newest bar for `bar`, returning the one it replaced.
    ///
    /// On an empty series this behaves like [`push`](Self::push) and returns `None`.
    pub fn replace_last(&mut self, bar: Bar) -> Option<Bar> {
        match self.bars.back_mut() {
            Some(last) => Some(std::mem::replace(last, bar)),
            None => {
                self.bars.push_back(bar);
                None
            }
        }
    }

    pub fn evict_oldest(&mut self) -> Option<Bar> {
        self.bars.pop_front()
    }

    pub fn len(&self) -> usize {
        self.bars.len()
    }

    pub fn is_empty(&self) -> bool {
        self.bars.is_empty()
    }

    pub fn last(&self) -> Option<&Bar> {
        self.bars.back()
    }

    pub fn get(&self, index: usize) -> Option<&Bar> {
        self.bars.get(index)
    }

    pub fn iter(&self) -> impl ExactSizeIterator<Item = &Bar> + '_ {
        self.bars.iter()
    }

    pub fn closes(&self) -> Vec<f64> {
        self.bars.iter().map(|b| b.close).collect()
    }
}
