//! Dry-run queue backend.
//!
//! Wraps another backend: reads go through to it, writes are logged as an
//! [`info event`](tracing::Event) and reported as successful without
//! reaching the service.

use async_trait::async_trait;
use std::path::Path;
use std::sync::atomic::{AtomicI64, Ordering};

use crate::error::Result;
use crate::{EntryId, QueueBackend, QueueEntry, QueueHandle};

/// Dry-run queue backend.
///
/// Submissions are answered with synthetic, negative [`EntryId`]s so they can
/// never be mistaken for (or collide with) a real entry of the wrapped queue.
pub struct DryRunBackend {
    inner: QueueHandle,
    issued: AtomicI64,
}
impl DryRunBackend {
    pub fn new(inner: QueueHandle) -> Self {
        Self {
            inner,
            issued: AtomicI64::new(0),
        }
    }
}

#[async_trait]
impl QueueBackend for DryRunBackend {
    fn name(&self) -> &str {
        self.inner.name()
    }

    async fn submit(&self, link: &str, location: &Path) -> Result<EntryId> {
        let id = EntryId(-(self.issued.fetch_add(1, Ordering::Relaxed) + 1));
        tracing::info!(%id, location = %location.display(), link, "Skipping submit during dry run");
        Ok(id)
    }

    async fn list_active(&self) -> Result<Vec<QueueEntry>> {
        self.inner.list_active().await
    }

    async fn remove(&self, id: EntryId, delete_data: bool) -> Result<()> {
        tracing::info!(%id, delete_data, "Skipping remove during dry run");
        Ok(())
    }
}
