use crate::error::{ErrorKind, Result};
use crate::resolve::{Resolution, resolve};
use crate::Context;
use exn::ResultExt;
use nab_cache::IdentifierCache;
use nab_cache::error::Result as CacheResult;
use nab_extract::models::Release;
use nab_queue::{EntryId, QueueBackend};
use std::path::PathBuf;
use tracing::instrument;

/// The outcome of (successfully) dispatching one release.
#[derive(Debug)]
pub enum Dispatch {
    /// The release was accepted by the queue and recorded in the cache.
    Submitted(Box<Submitted>),
    /// An earlier release in this run had the same hash; nothing was done.
    Duplicate(Release),
}

/// Details of an accepted submission.
#[derive(Debug)]
pub struct Submitted {
    pub release: Release,
    pub id: EntryId,
    pub location: PathBuf,
    /// Whether the cache was persisted afterwards. A failed commit does not
    /// undo the submission, and the in-memory cache still holds the hash, but
    /// a crash before the next successful commit means it will be submitted
    /// again.
    pub commit: CacheResult<()>,
    pub resolution: Resolution,
}

/// Submit `release` to the queue, record it, and clean up what it
/// supersedes.
///
/// In order:
/// 1. Skip if the cache already holds the hash (a duplicate earlier in the
///    same feed snapshot).
/// 2. Submit to `<download root>/<series>`. On failure nothing is recorded,
///    so the next run tries again.
/// 3. Add the hash to the cache and commit immediately.
/// 4. For a replacement, [`resolve`] the superseded entry.
///
/// # Errors
/// Returns [`ErrorKind::InvalidLocation`] when the series name would escape
/// the download root, and [`ErrorKind::Submission`] when the queue refuses
/// the release. Neither is recorded in the cache.
/// Commit and resolution problems are reported on [`Submitted`] instead.
#[instrument(skip_all, fields(hash = %release.hash, title = %release.title))]
pub async fn dispatch(
    queue: &dyn QueueBackend,
    cache: &mut IdentifierCache,
    ctx: &Context,
    release: Release,
) -> Result<Dispatch> {
    if cache.exists(&release.hash) {
        tracing::info!("Skipping release already dispatched during this run");
        return Ok(Dispatch::Duplicate(release));
    }

    let location = match ctx.location(&release) {
        Ok(location) => location,
        Err(error) => {
            tracing::warn!(series = %release.series, %error, "Skipping release with unusable series name");
            return Err(error);
        },
    };
    let id = match queue.submit(&release.link, &location).await {
        Ok(id) => id,
        Err(error) => {
            tracing::warn!(location = %location.display(), %error, "Could not submit release; it will be retried next run");
            return Err(error).or_raise(|| ErrorKind::Submission(release.title.clone()));
        },
    };
    tracing::info!(%id, location = %location.display(), "Added release");

    cache.add(release.hash.clone());
    let commit = cache.commit();
    if let Err(error) = &commit {
        tracing::error!(%error, "Could not persist cache; this release may be submitted again after a restart");
    }

    let resolution = match ctx.markers.find(&release) {
        Some(marker) => {
            tracing::debug!(marker, "Release is a replacement");
            resolve(queue, &release, &location, id).await
        },
        None => Resolution::NotReplacement,
    };

    Ok(Dispatch::Submitted(Box::new(Submitted {
        release,
        id,
        location,
        commit,
        resolution,
    })))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Markers;
    use crate::test_support::{HASH_A, HASH_B, magnet, release};
    use nab_queue::QueueEntry;
    use nab_queue::backend::{MockBackend, Operation};
    use tempfile::tempdir;

    fn ctx() -> Context {
        Context::new("/dl", Markers::default())
    }

    #[tokio::test]
    async fn test_dispatch_submits_and_commits() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let queue = MockBackend::default();
        let mut cache = IdentifierCache::load(&path, 10).unwrap();

        let dispatched = dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 720p GROUP", HASH_A)).await.unwrap();

        let Dispatch::Submitted(submitted) = dispatched else {
            panic!("expected a submission");
        };
        assert_eq!(submitted.location, PathBuf::from("/dl/Show"));
        assert!(submitted.commit.is_ok());
        assert!(matches!(submitted.resolution, Resolution::NotReplacement));
        assert_eq!(queue.submissions().await, vec![(magnet(HASH_A), PathBuf::from("/dl/Show"))]);
        assert!(IdentifierCache::load(&path, 10).unwrap().exists(HASH_A));
    }

    #[tokio::test]
    async fn test_dispatch_failure_is_not_recorded() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let queue = MockBackend::default().failing(Operation::Submit);
        let mut cache = IdentifierCache::load(&path, 10).unwrap();

        let err = dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 720p GROUP", HASH_A)).await.unwrap_err();

        assert_eq!(*err, ErrorKind::Submission("Show S01E02 720p GROUP".to_string()));
        assert!(!cache.exists(HASH_A));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dispatch_series_outside_root_is_skipped() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let queue = MockBackend::with_entries([QueueEntry::new(EntryId(1), "etc S01E02 720p GROUP", "/etc")]);
        let mut cache = IdentifierCache::load(&path, 10).unwrap();

        for title in ["/etc S01E02 REPACK 720p GROUP", "../../etc S01E02 REPACK 720p GROUP"] {
            let err = dispatch(&queue, &mut cache, &ctx(), release(title, HASH_A)).await.unwrap_err();
            assert!(matches!(*err, ErrorKind::InvalidLocation(_)));
        }

        assert!(queue.submissions().await.is_empty());
        assert!(queue.removals().await.is_empty());
        assert!(!cache.exists(HASH_A));
        assert!(!path.exists());
    }

    #[tokio::test]
    async fn test_dispatch_duplicate_within_run() {
        let queue = MockBackend::default();
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        let first = dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 720p GROUP", HASH_A)).await.unwrap();
        let second = dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 720p MIRROR", HASH_A)).await.unwrap();
        assert!(matches!(first, Dispatch::Submitted(_)));
        assert!(matches!(second, Dispatch::Duplicate(ref r) if r.info == "720p MIRROR"));
        assert_eq!(queue.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_dispatch_commit_failure_is_reported() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("sub").join("cache.json");
        let queue = MockBackend::default();
        let mut cache = IdentifierCache::load(&path, 10).unwrap();
        std::fs::write(temp.path().join("sub"), b"not a directory").unwrap();

        let dispatched = dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 720p GROUP", HASH_A)).await.unwrap();

        let Dispatch::Submitted(submitted) = dispatched else {
            panic!("expected a submission");
        };
        assert!(submitted.commit.is_err());
        assert!(cache.exists(HASH_A));
    }

    #[tokio::test]
    async fn test_dispatch_replacement_removes_superseded() {
        let queue = MockBackend::with_entries([
            QueueEntry::new(EntryId(1), "Show S01E02 720p GROUP", "/dl/Show"),
            QueueEntry::new(EntryId(2), "Show S01E02 720p GROUP", "/dl/Other"),
        ]);
        let mut cache = IdentifierCache::in_memory(10).unwrap();

        let dispatched =
            dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 REPACK 720p GROUP", HASH_B)).await.unwrap();

        let Dispatch::Submitted(submitted) = dispatched else {
            panic!("expected a submission");
        };
        assert!(matches!(submitted.resolution, Resolution::Removed(ref e) if e.id == EntryId(1)));
        let remaining: Vec<(EntryId, PathBuf)> =
            queue.entries().await.into_iter().map(|e| (e.id, e.location)).collect();
        assert_eq!(
            remaining,
            vec![(EntryId(2), PathBuf::from("/dl/Other")), (submitted.id, PathBuf::from("/dl/Show"))]
        );
    }

    #[tokio::test]
    async fn test_dispatch_resolution_failure_keeps_submission() {
        let queue = MockBackend::with_entries([QueueEntry::new(EntryId(1), "Show S01E02 720p GROUP", "/dl/Show")])
            .failing(Operation::Remove);
        let mut cache = IdentifierCache::in_memory(10).unwrap();

        let dispatched =
            dispatch(&queue, &mut cache, &ctx(), release("Show S01E02 PROPER 720p GROUP", HASH_B)).await.unwrap();

        let Dispatch::Submitted(submitted) = dispatched else {
            panic!("expected a submission");
        };
        assert!(matches!(submitted.resolution, Resolution::RemoveFailed(..)));
        assert!(cache.exists(HASH_B));
        assert_eq!(queue.submissions().await.len(), 1);
    }
}
