//! Error types for filter construction and deserialization.

use std::io;
use thiserror::Error;

/// Result type alias for filter operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while building, writing or reading a filter.
///
/// Failed peeling attempts during construction are not errors; they are retried with a fresh seed
/// and never surface here.
#[derive(Error, Debug)]
pub enum Error {
    /// The element count is too large for a slot array addressable with 32-bit signed indices.
    #[error("Too many elements to build a filter from: {len}")]
    InvalidArgument {
        /// The number of elements supplied.
        len: usize,
    },

    /// Serialized filter bytes are truncated or malformed.
    #[error("Malformed filter: {reason}")]
    Format {
        /// Description of what was malformed.
        reason: String,
    },

    /// I/O error from the underlying reader or writer.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

impl Error {
    pub(crate) fn format(reason: impl Into<String>) -> Self {
        Self::Format {
            reason: reason.into(),
        }
    }
}
