//! Replacement resolution.
//!
//! A corrected re-issue (a "replacement") supersedes whatever was queued for
//! the same episode in the same location. Once the replacement is safely
//! submitted and recorded, [`resolve`] finds that older entry and removes it
//! along with its data.

use crate::error::{Error, ErrorKind};
use exn::ResultExt;
use nab_extract::models::Release;
use nab_queue::{EntryId, QueueBackend, QueueEntry};
use std::path::Path;
use tracing::instrument;

/// Substrings of a release's descriptor text that mark a corrected re-issue.
/// Matching is case-sensitive.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Markers(Vec<String>);

impl Markers {
    pub fn new(markers: impl IntoIterator<Item = impl Into<String>>) -> Self {
        Self(markers.into_iter().map(Into::into).collect())
    }

    /// The first marker found in `release`'s descriptor text, if any.
    pub fn find(&self, release: &Release) -> Option<&str> {
        self.0.iter().map(String::as_str).find(|marker| release.info.contains(marker))
    }

    pub fn is_replacement(&self, release: &Release) -> bool {
        self.find(release).is_some()
    }
}
impl Default for Markers {
    fn default() -> Self {
        Self::new(["REPACK", "PROPER"])
    }
}

/// What [`resolve`] did about a dispatched release.
#[derive(Debug)]
pub enum Resolution {
    /// The release is not a replacement; nothing to resolve.
    NotReplacement,
    /// No queue entry matched. The replacement may be the first version of
    /// the episode ever seen.
    NoMatch,
    /// The superseded entry was removed, data included.
    Removed(QueueEntry),
    /// Active entries could not be listed.
    LookupFailed(Error),
    /// The superseded entry was found but could not be removed.
    RemoveFailed(QueueEntry, Error),
}
impl Resolution {
    pub fn is_failure(&self) -> bool {
        matches!(self, Self::LookupFailed(_) | Self::RemoveFailed(..))
    }
}

/// The queue entry `release` supersedes: the first entry whose name contains
/// the release's episode code *and* whose location is exactly `location`,
/// compared as raw text (`/dl/Show/` does not match `/dl/Show`).
///
/// `submitted` is the entry just created for the replacement itself; it is
/// never a candidate, even if its name already carries the episode code.
pub fn find_superseded<'a>(
    entries: &'a [QueueEntry],
    release: &Release,
    location: &Path,
    submitted: EntryId,
) -> Option<&'a QueueEntry> {
    let code = release.episode.to_string();
    entries
        .iter()
        .filter(|entry| entry.id != submitted)
        .find(|entry| entry.name.contains(&code) && entry.location.as_os_str() == location.as_os_str())
}

/// Remove the queue entry superseded by `release`, if there is one.
///
/// Must only be called after the replacement has been submitted and recorded.
/// Never fails: lookup and removal problems are logged and reported in the
/// returned [`Resolution`], and at most one entry is removed.
#[instrument(skip_all, fields(series = %release.series, episode = %release.episode, location = %location.display()))]
pub async fn resolve(queue: &dyn QueueBackend, release: &Release, location: &Path, submitted: EntryId) -> Resolution {
    let entries = match queue.list_active().await.or_raise(|| ErrorKind::Lookup) {
        Ok(entries) => entries,
        Err(error) => {
            tracing::warn!(%error, "Could not list queue entries to find superseded release");
            return Resolution::LookupFailed(error);
        },
    };
    let Some(superseded) = find_superseded(&entries, release, location, submitted).cloned() else {
        tracing::debug!(candidates = entries.len(), "No superseded queue entry found");
        return Resolution::NoMatch;
    };
    match queue.remove(superseded.id, true).await.or_raise(|| ErrorKind::Remove) {
        Ok(()) => {
            tracing::info!(id = %superseded.id, name = %superseded.name, "Removed superseded release");
            Resolution::Removed(superseded)
        },
        Err(error) => {
            tracing::warn!(id = %superseded.id, name = %superseded.name, %error, "Could not remove superseded release");
            Resolution::RemoveFailed(superseded, error)
        },
    }
}
