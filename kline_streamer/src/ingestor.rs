//! Glue between the feed, the engine and the renderer.
//!
//! [`StreamIngestor::handle_update`] is the per-event entry point: parse,
//! skip control replies, append, update the SMA, render. Failures never
//! escape it; they are logged and passed to the [`ErrorSink`] the caller
//! supplied.

use std::collections::VecDeque;

use serde_json::Value;
use tracing::{debug, error, info, warn};

use crate::{
    engine::IndicatorEngine,
    errors::IngestError,
    feed::{
        FeedError, FeedHandler, SubscriptionRequest,
        message::{ParseError, bar_from_value, control_reply},
    },
    models::{bar::Bar, frame::RenderedFrame},
    render::{ChartRenderer, RenderError},
};

/// Longest slice of a bad message kept in a [`IngestError::MalformedEvent`].
const RAW_EXCERPT_LEN: usize = 256;

/// Receives every per-event failure, exactly once each.
pub trait ErrorSink {
    fn report(&mut self, error: &IngestError);
}

impl<F: FnMut(&IngestError)> ErrorSink for F {
    fn report(&mut self, error: &IngestError) {
        self(error)
    }
}

/// Discards reports; the ingestor's own log lines are the only record.
#[derive(Debug, Clone, Copy, Default)]
pub struct DiscardErrors;

impl ErrorSink for DiscardErrors {
    fn report(&mut self, _error: &IngestError) {}
}

/// Keeps the text of the last `capacity` reported errors.
#[derive(Debug, Clone, Default)]
pub struct RecentErrors {
    capacity: usize,
    entries: VecDeque<String>,
}

impl RecentErrors {
    pub fn new(capacity: usize) -> Self {
        Self {
            capacity,
            entries: VecDeque::with_capacity(capacity),
        }
    }

    /// Oldest first.
    pub fn entries(&self) -> impl ExactSizeIterator<Item = &str> + '_ {
        self.entries.iter().map(String::as_str)
    }
}

impl ErrorSink for RecentErrors {
    fn report(&mut self, error: &IngestError) {
        if self.capacity == 0 {
            return;
        }
        if self.entries.len() == self.capacity {
            self.entries.pop_front();
        }
        self.entries.push_back(error.to_string());
    }
}

/// Running totals, mostly for the end-of-run summary.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct IngestStats {
    pub accepted: usize,
    pub malformed: usize,
    pub render_faults: usize,
    pub control_replies: usize,
}

pub struct StreamIngestor<R, S = DiscardErrors> {
    engine: IndicatorEngine,
    renderer: R,
    errors: S,
    subscription: SubscriptionRequest,
    stats: IngestStats,
}

impl<R: ChartRenderer, S: ErrorSink> StreamIngestor<R, S> {
    pub fn new(
        engine: IndicatorEngine,
        renderer: R,
        errors: S,
        subscription: SubscriptionRequest,
    ) -> Self {
        Self {
            engine,
            renderer,
            errors,
            subscription,
            stats: IngestStats::default(),
        }
    }

    /// Ingests one raw feed event.
    ///
    /// Returns the updated frame, or `None` if the event was a control reply
    /// or malformed (the series is then unchanged). A render failure still
    /// returns the frame.
    pub fn handle_update(&mut self, raw: &str) -> Option<RenderedFrame> {
        let value = match serde_json::from_str::<Value>(raw) {
            Ok(value) => value,
            Err(source) => return self.accept(Err(ParseError::InvalidJson { source }), raw),
        };

        if let Some(reply) = control_reply(&value) {
            self.stats.control_replies += 1;
            match reply.error {
                Some(err) => warn!(id = ?reply.id, error = %err, "feed rejected request"),
                None => debug!(id = ?reply.id, "feed acknowledged request"),
            }
            return None;
        }

        self.accept(bar_from_value(&value), raw)
    }

    /// The current frame without ingesting anything.
    pub fn frame(&self) -> RenderedFrame {
        self.engine.frame()
    }

    /// Redraws the current frame, e.g. after the renderer's target was cleared.
    pub fn render_current(&mut self) -> Result<RenderedFrame, RenderError> {
        let frame = self.engine.frame();
        self.renderer.render(&frame)?;
        Ok(frame)
    }

    pub fn engine(&self) -> &IndicatorEngine {
        &self.engine
    }

    pub fn renderer(&self) -> &R {
        &self.renderer
    }

    pub fn error_sink(&self) -> &S {
        &self.errors
    }

    pub fn stats(&self) -> IngestStats {
        self.stats
    }

    fn accept(&mut self, parsed: Result<Bar, ParseError>, raw: &str) -> Option<RenderedFrame> {
        let bar = match parsed {
            Ok(bar) => bar,
            Err(source) => {
                let err = IngestError::MalformedEvent {
                    source,
                    raw: excerpt(raw),
                };
                warn!(error = %err, "dropping malformed event");
                self.stats.malformed += 1;
                self.errors.report(&err);
                return None;
            }
        };

        self.engine.ingest(bar);
        self.stats.accepted += 1;

        let frame = self.engine.frame();
        if let Err(source) = self.renderer.render(&frame) {
            let err = IngestError::RenderFault { source };
            error!(error = %err, bars = frame.len(), "chart render failed; bar kept");
            self.stats.render_faults += 1;
            self.errors.report(&err);
        } else {
            debug!(bars = frame.len(), sma = ?frame.latest_sma(), "chart updated");
        }
        Some(frame)
    }
}

impl<R: ChartRenderer, S: ErrorSink> FeedHandler for StreamIngestor<R, S> {
    fn on_connect(&mut self) -> SubscriptionRequest {
        info!(
            channels = ?self.subscription.params,
            id = self.subscription.id,
            "subscribing"
        );
        self.subscription.clone()
    }

    fn on_message(&mut self, raw: &str) {
        self.handle_update(raw);
    }

    fn on_error(&mut self, error: &FeedError) {
        error!(%error, bars = self.engine.series().len(), "feed error");
    }

    fn on_close(&mut self, reason: Option<&str>) {
        info!(reason = reason.unwrap_or(""), bars = self.engine.series().len(), "feed closed");
    }
}

fn excerpt(raw: &str) -> String {
    match raw.char_indices().nth(RAW_EXCERPT_LEN) {
        Some((cut, _)) => format!("{}...", &raw[..cut]),
        None => raw.to_string(),
    }
}
