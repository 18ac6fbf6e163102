//! Download queue contract.
//!
//! The queue is an external service that accepts magnet links, holds active
//! entries, and can remove them again. Everything the pipeline needs from it
//! fits in three operations on [`QueueBackend`]: submit, list, remove.

pub mod backend;
pub mod error;
mod models;

pub use crate::backend::QueueBackend;
pub use crate::models::{EntryId, QueueEntry};
use std::sync::Arc;

pub type QueueHandle = Arc<dyn QueueBackend + Send + Sync>;
