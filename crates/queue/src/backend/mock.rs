//! In-memory queue backend for testing.

use async_trait::async_trait;
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::atomic::{AtomicI64, Ordering};
use tokio::sync::RwLock;

use crate::error::{ErrorKind, Result};
use crate::{EntryId, QueueBackend, QueueEntry};

/// Queue operations that a [`MockBackend`] can be told to fail.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Operation {
    Submit,
    List,
    Remove,
}

/// In-memory queue backend for testing.
///
/// Entries live in a `Vec` behind a [`RwLock`], so all trait methods can
/// operate on `&self`. Every successful submission and removal is also
/// recorded so tests can assert on what the pipeline asked for.
///
/// Submitted entries are named after the magnet link's `dn` parameter (with
/// `.` and `+` turned into spaces) when it has one, like a real client
/// displays a magnet before its metadata arrives.
///
/// # Examples
///
/// ```
/// use nab_queue::backend::{MockBackend, Operation};
/// use nab_queue::{EntryId, QueueBackend, QueueEntry};
/// use std::path::Path;
///
/// # #[tokio::main(flavor = "current_thread")]
/// # async fn main() {
/// let queue = MockBackend::with_entries([QueueEntry::new(EntryId(1), "Show S01E01", "/dl/Show")])
///     .failing(Operation::Remove);
/// let id = queue.submit("magnet:?xt=urn:btih:abc&dn=Show.S01E02", Path::new("/dl/Show")).await.unwrap();
/// assert_eq!(id, EntryId(2));
/// assert!(queue.remove(EntryId(1), true).await.is_err());
/// # }
/// ```
pub struct MockBackend {
    name: String,
    entries: RwLock<Vec<QueueEntry>>,
    next_id: AtomicI64,
    failing: HashSet<Operation>,
    rejected_links: HashSet<String>,
    submissions: RwLock<Vec<(String, PathBuf)>>,
    removals: RwLock<Vec<(EntryId, bool)>>,
}

impl MockBackend {
    /// Create a mock queue pre-populated with entries. New entries get IDs
    /// above the highest existing one.
    pub fn with_entries(entries: impl IntoIterator<Item = QueueEntry>) -> Self {
        let entries: Vec<QueueEntry> = entries.into_iter().collect();
        let next_id = entries.iter().map(|entry| entry.id.0).max().unwrap_or(0) + 1;
        Self {
            name: "mock".to_string(),
            entries: RwLock::new(entries),
            next_id: AtomicI64::new(next_id),
            failing: HashSet::new(),
            rejected_links: HashSet::new(),
            submissions: RwLock::new(Vec::new()),
            removals: RwLock::new(Vec::new()),
        }
    }

    /// Change the name of the mock backend.
    pub fn with_name(mut self, name: impl Into<String>) -> Self {
        self.name = name.into();
        self
    }

    /// Make every call of `operation` fail with [`ErrorKind::Network`].
    pub fn failing(mut self, operation: Operation) -> Self {
        self.failing.insert(operation);
        self
    }

    /// Make submissions of this exact link fail with [`ErrorKind::Rpc`].
    pub fn rejecting(mut self, link: impl Into<String>) -> Self {
        self.rejected_links.insert(link.into());
        self
    }

    /// Current queue contents.
    pub async fn entries(&self) -> Vec<QueueEntry> {
        self.entries.read().await.clone()
    }

    /// Successful submissions, in order, as `(link, location)`.
    pub async fn submissions(&self) -> Vec<(String, PathBuf)> {
        self.submissions.read().await.clone()
    }

    /// Successful removals, in order, as `(id, delete_data)`.
    pub async fn removals(&self) -> Vec<(EntryId, bool)> {
        self.removals.read().await.clone()
    }

    fn check(&self, operation: Operation) -> Result<()> {
        if self.failing.contains(&operation) {
            exn::bail!(ErrorKind::Network(format!("mock://{}", self.name)));
        }
        Ok(())
    }

    fn display_name(link: &str) -> String {
        link.split(['?', '&'])
            .find_map(|param| param.strip_prefix("dn="))
            .map(|name| name.replace(['.', '+'], " "))
            .unwrap_or_else(|| link.to_string())
    }
}
impl Default for MockBackend {
    fn default() -> Self {
        Self::with_entries([])
    }
}

#[async_trait]
impl QueueBackend for MockBackend {
    fn name(&self) -> &str {
        &self.name
    }

    async fn submit(&self, link: &str, location: &Path) -> Result<EntryId> {
        self.check(Operation::Submit)?;
        if self.rejected_links.contains(link) {
            exn::bail!(ErrorKind::Rpc("invalid or corrupt torrent file".to_string()));
        }
        let id = EntryId(self.next_id.fetch_add(1, Ordering::Relaxed));
        self.entries.write().await.push(QueueEntry::new(id, Self::display_name(link), location));
        self.submissions.write().await.push((link.to_string(), location.to_path_buf()));
        Ok(id)
    }

    async fn list_active(&self) -> Result<Vec<QueueEntry>> {
        self.check(Operation::List)?;
        Ok(self.entries().await)
    }

    async fn remove(&self, id: EntryId, delete_data: bool) -> Result<()> {
        self.check(Operation::Remove)?;
        let mut entries = self.entries.write().await;
        let position = entries
            .iter()
            .position(|entry| entry.id == id)
            .ok_or_else(|| exn::Exn::from(ErrorKind::NotFound(id)))?;
        entries.remove(position);
        self.removals.write().await.push((id, delete_data));
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case("magnet:?xt=urn:btih:abc&dn=Show.S01E02.720p&tr=x", "Show S01E02 720p")]
    #[case("magnet:?dn=Show+S01E02&xt=urn:btih:abc", "Show S01E02")]
    #[case("magnet:?xt=urn:btih:abc", "magnet:?xt=urn:btih:abc")]
    fn test_display_name(#[case] link: &str, #[case] expected: &str) {
        assert_eq!(MockBackend::display_name(link), expected);
    }

    #[tokio::test]
    async fn test_submit_list_remove() {
        let queue = MockBackend::default();
        let id = queue.submit("magnet:?xt=urn:btih:abc&dn=Show.S01E02", Path::new("/dl/Show")).await.unwrap();
        assert_eq!(id, EntryId(1));
        assert_eq!(queue.list_active().await.unwrap(), vec![QueueEntry::new(id, "Show S01E02", "/dl/Show")]);
        queue.remove(id, true).await.unwrap();
        assert!(queue.list_active().await.unwrap().is_empty());
        assert_eq!(queue.removals().await, vec![(id, true)]);
    }

    #[tokio::test]
    async fn test_ids_continue_after_existing() {
        let queue = MockBackend::with_entries([
            QueueEntry::new(EntryId(4), "a", "/dl"),
            QueueEntry::new(EntryId(9), "b", "/dl"),
        ]);
        let id = queue.submit("magnet:?xt=urn:btih:abc", Path::new("/dl")).await.unwrap();
        assert_eq!(id, EntryId(10));
    }

    #[tokio::test]
    async fn test_remove_missing() {
        let queue = MockBackend::default();
        let err = queue.remove(EntryId(1), false).await.unwrap_err();
        assert_eq!(*err, ErrorKind::NotFound(EntryId(1)));
    }

    #[tokio::test]
    async fn test_failure_injection() {
        let queue = MockBackend::default().with_name("broken").failing(Operation::List).rejecting("magnet:?bad");
        assert!(queue.list_active().await.is_err());
        let err = queue.submit("magnet:?bad", Path::new("/dl")).await.unwrap_err();
        assert!(matches!(*err, ErrorKind::Rpc(_)));
        assert!(queue.submit("magnet:?good", Path::new("/dl")).await.is_ok());
        assert_eq!(queue.submissions().await.len(), 1);
    }
}
