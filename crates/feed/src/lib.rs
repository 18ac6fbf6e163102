//! Feed sources.
//!
//! A feed is a finite, ordered snapshot of raw entries, each with a title
//! and a link. Nothing here interprets either; that is the classifier's job.

pub mod error;
mod parse;
mod source;

pub use crate::parse::parse;
pub use crate::source::{FeedSource, FileFeed, HttpFeed};

/// One raw feed entry, as published.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Entry {
    pub title: String,
    pub link: String,
}
impl Entry {
    pub fn new(title: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            title: title.into(),
            link: link.into(),
        }
    }
}
