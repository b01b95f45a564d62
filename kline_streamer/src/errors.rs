use snafu::Snafu;

use crate::{feed::message::ParseError, render::RenderError};

/// Per-event failures surfaced to the caller's [`ErrorSink`](crate::ingestor::ErrorSink).
///
/// Neither variant is fatal: a malformed event is dropped before it reaches
/// the series, and a render fault leaves the already-ingested bar in place.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum IngestError {
    /// The event could not be turned into a bar.
    #[snafu(display("Malformed event ({source}): {raw}"))]
    MalformedEvent { source: ParseError, raw: String },

    /// The renderer failed to draw the updated frame.
    #[snafu(display("Render fault: {source}"))]
    RenderFault { source: RenderError },
}

impl IngestError {
    pub fn is_malformed(&self) -> bool {
        matches!(self, IngestError::MalformedEvent { .. })
    }
}
