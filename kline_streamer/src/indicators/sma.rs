//! Simple Moving Average (SMA).
//!
//! Two forms are provided: [`simple_moving_average`] recomputes the whole
//! column from scratch, and [`RollingMean`] maintains the newest value in O(1)
//! per update. The engine uses the rolling form; the full form is what a chart
//! redraw or a consistency check falls back to.

use std::collections::VecDeque;

/// Mean of every trailing `window` values.
///
/// Position `i` is `None` while fewer than `window` values end at `i`. A
/// `window` of zero yields an all-`None` column.
pub fn simple_moving_average(values: &[f64], window: usize) -> Vec<Option<f64>> {
    let mut out = vec![None; values.len()];
    if window == 0 || values.len() < window {
        return out;
    }
    for (i, slot) in out.iter_mut().enumerate().skip(window - 1) {
        let sum: f64 = values[i + 1 - window..=i].iter().sum();
        *slot = Some(sum / window as f64);
    }
    out
}

/// Incremental mean over the last `window` values.
#[derive(Debug, Clone)]
pub struct RollingMean {
    window: usize,
    values: VecDeque<f64>,
    sum: f64,
    pushes_since_resync: usize,
}

impl RollingMean {
    /// # Panics
    /// Panics if `window` is zero.
    pub fn new(window: usize) -> Self {
        assert!(window > 0, "rolling window must be at least 1");
        Self {
            window,
            values: VecDeque::with_capacity(window + 1),
            sum: 0.0,
            pushes_since_resync: 0,
        }
    }

    /// Adds a value and returns the mean if a full window is now available.
    pub fn push(&mut self, value: f64) -> Option<f64> {
        self.values.push_back(value);
        self.sum += value;
        if self.values.len() > self.window {
            if let Some(dropped) = self.values.pop_front() {
                self.sum -= dropped;
            }
        }

        // Running add/subtract drifts; re-add the buffer once per full turn.
        self.pushes_since_resync += 1;
        if self.pushes_since_resync >= self.window {
            self.resync();
        }
        self.value()
    }

    /// Replaces the newest value (an update of a still-open bar).
    ///
    /// Behaves like [`push`](Self::push) when nothing has been pushed yet.
    pub fn replace_last(&mut self, value: f64) -> Option<f64> {
        match self.values.back_mut() {
            Some(last) => {
                self.sum += value - *last;
                *last = value;
                self.value()
            }
            None => self.push(value),
        }
    }

    /// The current mean, `None` until `window` values have been seen.
    pub fn value(&self) -> Option<f64> {
        (self.values.len() == self.window).then(|| self.sum / self.window as f64)
    }

    fn resync(&mut self) {
        self.sum = self.values.iter().sum();
        self.pushes_since_resync = 0;
    }
}
