//! Cache Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};
use std::path::PathBuf;

/// A cache error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for cache operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The configured maximum size cannot hold any entries.
    #[display("invalid cache size {_0}: must be greater than zero")]
    InvalidSize(#[error(not(source))] usize),
    /// The cache file exists but could not be read.
    #[display("unable to read cache file: {}", _0.display())]
    Io(#[error(not(source))] PathBuf),
    /// The cache file exists but is not a JSON array of strings. Never
    /// treated as empty, that would hide corruption as "nothing seen yet".
    #[display("malformed cache file: {}", _0.display())]
    Malformed(#[error(not(source))] PathBuf),
    /// Persisting the cache to disk failed.
    #[display("failed to commit cache file: {}", _0.display())]
    Commit(#[error(not(source))] PathBuf),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Io(_) | Self::Commit(_))
    }
}
