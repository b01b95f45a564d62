//! Canonical in-memory representation of one streamed bar (OHLCV).
//!
//! Every feed message that survives parsing becomes exactly one [`Bar`]; the
//! engine never mutates a bar after it has been received.

use serde::{Deserialize, Serialize};

/// A single OHLCV observation for one kline interval.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct Bar {
    /// Bar open time in the feed's epoch unit (milliseconds for the kline stream).
    pub timestamp: i64,

    /// Opening price.
    pub open: f64,

    /// Highest price during the bar interval.
    pub high: f64,

    /// Lowest price during the bar interval.
    pub low: f64,

    /// Closing price, or the last traded price while the bar is still open.
    pub close: f64,

    /// Base-asset volume traded during the bar interval.
    pub volume: f64,
}
