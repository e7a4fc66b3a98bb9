//! Error handling.
//!
//! Every failure is fatal for the request it belongs to and is surfaced to
//! the immediate caller; there are no retries. The variants map onto the
//! pipeline stages so a caller can always name the stage that failed.

use std::io;
use std::path::PathBuf;

use crate::export::OutputFormat;

/// A wrapper type for plakat errors.
pub type Result<T> = std::result::Result<T, Error>;

/// An error in plakat.
#[derive(Debug, thiserror::Error)]
pub enum Error {
    /// The city/country pair resolved to no coordinates.
    #[error("no coordinates found for `{query}`")]
    GeocodeNotFound {
        /// The query that came up empty.
        query: String,
    },

    /// The external geometry provider failed.
    #[error("geometry fetch failed: {0}")]
    DataFetch(String),

    /// No theme record exists for the requested identifier.
    #[error("unknown theme `{0}`")]
    ThemeNotFound(String),

    /// A theme record exists but is malformed.
    #[error("invalid theme `{name}`: {reason}")]
    ThemeInvalid {
        /// The theme identifier.
        name: String,
        /// What the validating parser rejected.
        reason: String,
    },

    /// The theme directory could not be scanned.
    #[error("cannot read theme directory `{path}`: {source}")]
    ThemeDir {
        /// The directory that was scanned.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },

    /// A render request failed validation.
    #[error("invalid request: {0}")]
    InvalidRequest(String),

    /// The renderer or an encoder rejected its input.
    #[error("render failed: {0}")]
    Render(String),

    /// The requested format is not available on this surface.
    #[error("{format} output is not supported here")]
    UnsupportedFormat {
        /// The rejected format.
        format: OutputFormat,
    },

    /// The output path was not writable.
    #[error("failed to write `{path}`: {source}")]
    Write {
        /// The path that could not be written.
        path: PathBuf,
        /// The underlying I/O error.
        source: io::Error,
    },
}

impl Error {
    pub(crate) fn write(path: impl Into<PathBuf>, source: io::Error) -> Self {
        Error::Write {
            path: path.into(),
            source,
        }
    }
}
