//! Queue models.

use std::fmt::{Display, Formatter, Result as FmtResult};
use std::path::PathBuf;

/// Service-assigned identifier of a queue entry.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntryId(pub i64);

impl Display for EntryId {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(f, "{}", self.0)
    }
}

/// One active entry in the download queue. Owned by the queue service; the
/// pipeline only reads and deletes these.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct QueueEntry {
    pub id: EntryId,
    /// Display name, as reported by the service.
    pub name: String,
    /// Directory the entry downloads into.
    pub location: PathBuf,
}
impl QueueEntry {
    pub fn new(id: EntryId, name: impl Into<String>, location: impl Into<PathBuf>) -> Self {
        Self {
            id,
            name: name.into(),
            location: location.into(),
        }
    }
}
