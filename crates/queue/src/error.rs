//! Queue Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use crate::EntryId;
use derive_more::{Display, Error};
use std::path::PathBuf;

/// A queue error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for queue operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The queue service could not be reached, or the connection dropped.
    #[display("network error talking to {_0}")]
    Network(#[error(not(source))] String),
    /// The queue service rejected the configured credentials.
    #[display("unauthorized: check the RPC username and password")]
    Unauthorized,
    /// The queue service understood the request but refused it.
    #[display("queue service returned an error: {_0}")]
    Rpc(#[error(not(source))] String),
    /// The queue service answered with something that isn't a valid response.
    #[display("invalid response to `{_0}`")]
    InvalidResponse(#[error(not(source))] &'static str),
    /// The storage location can't be sent to the queue service.
    #[display("invalid storage location: {}", _0.display())]
    InvalidLocation(#[error(not(source))] PathBuf),
    /// No entry with that ID is in the queue.
    #[display("queue entry not found: {_0}")]
    NotFound(#[error(not(source))] EntryId),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Network(_))
    }
}
