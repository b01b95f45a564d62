//! Indicators computed over the close column of a series.

pub mod sma;

pub use sma::{RollingMean, simple_moving_average};
