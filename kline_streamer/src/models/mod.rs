pub mod bar;
pub mod bar_series;
pub mod frame;
pub mod timeframe;
