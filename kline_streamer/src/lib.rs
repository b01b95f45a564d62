//! Live kline ingestion with a rolling SMA and a chart redrawn on every update.
//!
//! The pieces, from the wire inwards:
//!
//! - [`feed`]: subscription request, raw message decoding, websocket client
//!   and offline replay, all driving a [`feed::FeedHandler`].
//! - [`ingestor::StreamIngestor`]: the handler; turns each raw event into a
//!   bar, hands it to the engine and the updated frame to a renderer.
//! - [`engine::IndicatorEngine`]: owns the bar series and its SMA column.
//! - [`render`]: chart renderers consuming [`models::frame::RenderedFrame`]s.

#[cfg(feature = "cli")]
pub mod cli;
pub mod config;
pub mod engine;
pub mod errors;
pub mod feed;
pub mod indicators;
pub mod ingestor;
pub mod logging;
pub mod models;
pub mod render;

use config::{ConfigError, StreamConfig};
use ingestor::{ErrorSink, StreamIngestor};
use render::ChartRenderer;

/// Builds the engine, renderer and subscription described by `config`.
pub fn build_ingestor<S: ErrorSink>(
    config: &StreamConfig,
    errors: S,
) -> Result<StreamIngestor<Box<dyn ChartRenderer>, S>, ConfigError> {
    Ok(StreamIngestor::new(
        config.engine()?,
        config.renderer(),
        errors,
        config.feed.subscription(),
    ))
}
