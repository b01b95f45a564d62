//! Feed side of the pipeline: wire formats, the websocket client, and the
//! lifecycle callbacks a consumer registers with it.
//!
//! The client owns the connection and calls into a [`FeedHandler`]:
//!
//! - [`on_connect`](FeedHandler::on_connect) once the handshake succeeds; the
//!   returned [`SubscriptionRequest`] is sent before anything is read.
//! - [`on_message`](FeedHandler::on_message) for every text frame, one at a
//!   time, each handled to completion before the next frame is read.
//! - [`on_error`](FeedHandler::on_error) / [`on_close`](FeedHandler::on_close)
//!   when the connection ends. There is no reconnect.

pub mod client;
pub mod message;
pub mod replay;
pub mod subscription;

use snafu::{Backtrace, Snafu};
use tokio_tungstenite::tungstenite;

pub use client::FeedClient;
pub use subscription::SubscriptionRequest;

/// Callbacks driven by [`FeedClient::run`] and [`replay::replay`].
pub trait FeedHandler {
    fn on_connect(&mut self) -> SubscriptionRequest;

    fn on_message(&mut self, raw: &str);

    fn on_error(&mut self, error: &FeedError);

    fn on_close(&mut self, reason: Option<&str>);
}

/// Connection-level failures. None of these touch the ingested series.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum FeedError {
    /// The handshake request could not be built (bad URL or header).
    #[snafu(display("Invalid feed request for {url}: {message}"))]
    InvalidRequest {
        url: String,
        message: String,
        backtrace: Backtrace,
    },

    /// TCP/TLS/websocket handshake failed.
    #[snafu(display("Failed to connect to {url}: {source}"))]
    Connect {
        url: String,
        source: tungstenite::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to encode subscription request: {source}"))]
    EncodeSubscription {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    /// The established connection failed while sending or receiving.
    #[snafu(display("Feed transport error: {source}"))]
    Transport {
        source: tungstenite::Error,
        backtrace: Backtrace,
    },
}
