//! Queue backend trait and implementations.
//!
//! This module defines the [`QueueBackend`] trait, a uniform interface over
//! download-queue services, along with:
//! - [`TransmissionBackend`], talking JSON-RPC to a Transmission daemon,
//! - [`DryRunBackend`], a decorator that reads through to another backend but
//!   only logs writes, and
//! - `MockBackend` (feature `mock`), an in-memory queue for tests.

mod dry_run;
#[cfg(feature = "mock")]
mod mock;
mod transmission;

pub use self::dry_run::DryRunBackend;
#[cfg(feature = "mock")]
pub use self::mock::{MockBackend, Operation};
pub use self::transmission::TransmissionBackend;
use crate::error::Result;
use crate::{EntryId, QueueEntry};
use async_trait::async_trait;
use std::path::Path;

/// Unified interface for download-queue services.
///
/// The pipeline creates entries through [`submit`](Self::submit), and only
/// ever reads ([`list_active`](Self::list_active)) or deletes
/// ([`remove`](Self::remove)) entries otherwise. Entries may be added or
/// removed by other clients of the service at any time, so every listing is a
/// snapshot.
///
/// # Examples
///
/// ```no_run
/// use std::path::Path;
/// use nab_queue::{QueueBackend, error::Result};
///
/// async fn queue_and_count(queue: &dyn QueueBackend, magnet: &str) -> Result<usize> {
///     let id = queue.submit(magnet, Path::new("/downloads/Show")).await?;
///     let active = queue.list_active().await?;
///     println!("queued as {id}, {} entries active", active.len());
///     Ok(active.len())
/// }
/// ```
#[async_trait]
pub trait QueueBackend: Send + Sync {
    /// Name of the configured backend, used for logging only.
    fn name(&self) -> &str;

    /// Add `link` to the queue, downloading into `location`.
    ///
    /// Returns the ID the service assigned to the new entry. Submitting
    /// content that is already queued is not an error; the existing entry's
    /// ID is returned instead.
    async fn submit(&self, link: &str, location: &Path) -> Result<EntryId>;

    /// Snapshot of every entry currently in the queue, in the order the
    /// service reports them.
    async fn list_active(&self) -> Result<Vec<QueueEntry>>;

    /// Remove an entry, and its downloaded data when `delete_data` is set.
    async fn remove(&self, id: EntryId, delete_data: bool) -> Result<()>;
}
