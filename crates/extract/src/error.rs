//! Classification Error Types
//!
//! This module provides structured errors using `exn` for automatic location
//! tracking and error tree construction.

use derive_more::{Display, Error};

/// A classification error with automatic location tracking.
pub type Error = exn::Exn<ErrorKind>;
/// Result type alias for classification operations.
pub type Result<T> = std::result::Result<T, Error>;

/// Actionable error categories.
///
/// These describe what the caller should *do*, not what went wrong internally.
#[derive(Debug, Display, Error, Clone, PartialEq, Eq)]
pub enum ErrorKind {
    /// The title has no recognizable `<series> SxxExx <info>` structure.
    #[display("title does not match `<series> SxxExx <info>`: {_0}")]
    TitleFormatMismatch(#[error(not(source))] String),
    /// The link is not a magnet URI carrying a 40-character hex identifier.
    #[display("link does not carry a btih identifier: {_0}")]
    LinkFormatMismatch(#[error(not(source))] String),
    /// A field matched the pattern but could not be parsed.
    #[display("failed to parse field '{field}', found value: {value}")]
    ParseError {
        /// The field that failed to parse.
        field: &'static str,
        /// The value that was found.
        value: String,
    },
    /// One of the built-in patterns failed to compile.
    #[display("invalid classification pattern: {_0}")]
    Pattern(#[error(not(source))] &'static str),
}

impl ErrorKind {
    /// Returns `true` if retrying might succeed.
    pub fn is_retryable(&self) -> bool {
        // Classification is a pure function of the entry text; the same
        // input is rejected the same way every time.
        false
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_kind_display() {
        assert_eq!(
            ErrorKind::TitleFormatMismatch("Show Name Weird Title No Code".to_string()).to_string(),
            "title does not match `<series> SxxExx <info>`: Show Name Weird Title No Code"
        );
        assert_eq!(
            ErrorKind::LinkFormatMismatch("http://example.com".to_string()).to_string(),
            "link does not carry a btih identifier: http://example.com"
        );
    }

    #[test]
    fn error_kind_never_retryable() {
        assert!(!ErrorKind::TitleFormatMismatch(String::new()).is_retryable());
        assert!(!ErrorKind::LinkFormatMismatch(String::new()).is_retryable());
        assert!(!ErrorKind::Pattern("title").is_retryable());
    }
}
