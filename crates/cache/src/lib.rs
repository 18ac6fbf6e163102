//! Persistent identifier cache for release deduplication.
//!
//! This crate answers one question across process restarts: "has this
//! release identifier already been dispatched?". The answer must survive
//! restarts, so the cache is backed by a small JSON file, but it must also
//! stay bounded, so only the most recently added identifiers are kept.
//!
//! # Persistence
//! The on-disk representation is a JSON array of identifier strings, oldest
//! first. Writes only happen at explicit [`commit`](IdentifierCache::commit)
//! points and always replace the whole file through a temporary file and an
//! atomic rename, so a concurrent reader sees either the previous or the new
//! content and never a partial write.
//!
//! # Failure
//! A cache that cannot be loaded is fatal: without a trustworthy record of
//! what has been dispatched there is no way to avoid submitting everything in
//! the feed again. A failed commit is not fatal; the in-memory state stays
//! correct for the rest of the run.

mod cache;
pub mod error;

pub use crate::cache::IdentifierCache;
