//! Chart output.
//!
//! The engine hands every new [`RenderedFrame`] to a [`ChartRenderer`]; what
//! the renderer draws and where it writes is entirely its own concern.

pub mod json;
pub mod plotly;

use std::{
    fs,
    path::{Path, PathBuf},
};

use snafu::{Backtrace, ResultExt, Snafu};

use crate::models::frame::RenderedFrame;

pub use json::JsonFrameRenderer;
pub use plotly::PlotlyHtmlRenderer;

#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum RenderError {
    /// Building the output document failed.
    #[snafu(display("Failed to serialize chart data: {source}"))]
    Serialize {
        source: serde_json::Error,
        backtrace: Backtrace,
    },

    #[snafu(display("Failed to write chart to {}: {source}", path.display()))]
    Write {
        path: PathBuf,
        source: std::io::Error,
        backtrace: Backtrace,
    },
}

pub trait ChartRenderer {
    /// Draws `frame`, replacing whatever was drawn before.
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError>;
}

impl<T: ChartRenderer + ?Sized> ChartRenderer for Box<T> {
    fn render(&mut self, frame: &RenderedFrame) -> Result<(), RenderError> {
        (**self).render(frame)
    }
}

/// Writes `contents` next to `path` and renames it into place, so a browser
/// refreshing the file never reads a half-written chart.
pub(crate) fn write_atomically(path: &Path, contents: &[u8]) -> Result<(), RenderError> {
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent).context(WriteSnafu { path: parent })?;
    }

    let mut tmp = path.as_os_str().to_owned();
    tmp.push(".tmp");
    let tmp = PathBuf::from(tmp);

    fs::write(&tmp, contents).context(WriteSnafu { path: &tmp })?;
    fs::rename(&tmp, path).context(WriteSnafu { path })?;
    Ok(())
}
