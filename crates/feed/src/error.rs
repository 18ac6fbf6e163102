//! Feed Error Types

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A feed error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for feed operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The feed could not be downloaded.
    #[display("could not fetch feed from {_0}")]
    Network(#[error(not(source))] String),
    /// The feed file could not be read.
    #[display("could not read feed file {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The document is not a valid RSS feed.
    #[display("feed is not a valid RSS document")]
    Malformed,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_) | Self::Io(_))
    }
}
