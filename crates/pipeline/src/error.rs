//! Pipeline Error Types

use derive_more::{Display, Error};

/// A pipeline error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for pipeline operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Classifies the stage of the pipeline that failed.
///
/// Only [`ErrorKind::Feed`] is fatal to a run; the rest are local to a single
/// release.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The feed snapshot could not be obtained; there is nothing to process.
    #[display("could not read feed")]
    Feed,
    /// The queue did not accept a release. It was not recorded as seen and
    /// will be picked up again by the next run.
    #[display("could not submit release: {_0}")]
    Submission(#[error(not(source))] String),
    /// The release's series name can't be used as a directory below the
    /// download root. The release is skipped and not recorded.
    #[display("series name is not a valid directory name: {_0:?}")]
    InvalidLocation(#[error(not(source))] String),
    /// Active queue entries could not be listed while looking for a
    /// superseded entry.
    #[display("could not list queue entries")]
    Lookup,
    /// A superseded queue entry could not be removed.
    #[display("could not remove superseded queue entry")]
    Remove,
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::Feed | Self::Submission(_))
    }

    /// Returns `true` if the whole run had to stop.
    pub fn is_fatal(&self) -> bool {
        matches!(self, Self::Feed)
    }
}
