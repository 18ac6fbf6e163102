//! Classification of raw feed entries into [`Release`](models::Release)s.
//!
//! A feed entry is a pair of strings (title and link). The [`Classifier`]
//! splits the title into series name, [`EpisodeCode`](models::EpisodeCode)
//! and residual descriptor text, and pulls the content identifier out of the
//! magnet link. Either both succeed and a complete `Release` comes out, or the
//! entry is rejected with a [`TitleFormatMismatch`](error::ErrorKind::TitleFormatMismatch)
//! or [`LinkFormatMismatch`](error::ErrorKind::LinkFormatMismatch).

mod classify;
mod consts;
pub mod error;
pub mod models;

pub use crate::classify::Classifier;
pub use crate::consts::HASH_LENGTH;
