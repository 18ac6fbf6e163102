use crate::Context;
use crate::dispatch::{Dispatch, dispatch};
use crate::error::{ErrorKind, Result};
use crate::ingest::ingest;
use crate::resolve::Resolution;
use async_stream::stream;
use exn::ResultExt;
use futures::Stream;
use nab_cache::IdentifierCache;
use nab_extract::Classifier;
use nab_feed::FeedSource;
use nab_queue::QueueBackend;
use std::fmt::{Display, Formatter, Result as FmtResult};

/// Progress events emitted by [`run`].
///
/// Events follow a strict ordering:
/// 1. [`Started`](Self::Started): exactly once.
/// 2. [`Ingested`](Self::Ingested): exactly once, after the feed has been
///    classified against the cache.
/// 3. [`Dispatched`](Self::Dispatched): zero or more times, one per
///    actionable release, in feed order.
/// 4. [`Complete`](Self::Complete): exactly once, signalling the stream is
///    finished.
///
/// A feed failure terminates the stream early, in which case `Complete` is
/// never emitted.
#[derive(Debug)]
pub enum RunEvent {
    Started,
    Ingested { actionable: usize, cached: usize, rejected: usize },
    Dispatched(Dispatch),
    Complete,
}

/// Streams [`RunEvent`]s for one pass over the current feed snapshot.
///
/// Releases are dispatched one at a time, so the cache on disk always
/// reflects a prefix of the dispatch sequence. The queue is not contacted at
/// all when there is nothing to dispatch.
///
/// A submission failure is surfaced as an `Err` item without terminating the
/// stream; only a feed failure ([`ErrorKind::Feed`]) is fatal.
pub fn run<'a>(
    feed: &'a dyn FeedSource,
    classifier: &'a Classifier,
    cache: &'a mut IdentifierCache,
    queue: &'a dyn QueueBackend,
    ctx: &'a Context,
) -> impl Stream<Item = Result<RunEvent>> + 'a {
    // `rustfmt` does not format macros that use braces. Wrap in parentheses!
    stream!({
        yield Ok(RunEvent::Started);

        let entries = match feed.fetch().await.or_raise(|| ErrorKind::Feed) {
            Ok(entries) => entries,
            Err(e) => {
                tracing::error!(feed = %feed.location(), error = %e, "Could not read feed");
                yield Err(e);
                return;
            },
        };
        tracing::info!(feed = %feed.location(), entries = entries.len(), "Fetched feed");

        let ingest = ingest(entries, classifier, cache);
        yield Ok(RunEvent::Ingested {
            actionable: ingest.actionable.len(),
            cached: ingest.cached.len(),
            rejected: ingest.rejected.len(),
        });

        for release in ingest.actionable {
            yield dispatch(queue, cache, ctx, release).await.map(RunEvent::Dispatched);
        }

        yield Ok(RunEvent::Complete);
    })
}

/// Tally of a run's events, for reporting.
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct Summary {
    pub cached: usize,
    pub rejected: usize,
    pub submitted: usize,
    pub duplicates: usize,
    pub failed: usize,
    pub replaced: usize,
    /// Submissions whose cache commit failed.
    pub uncommitted: usize,
    /// Replacements whose superseded entry could not be looked up or removed.
    pub unresolved: usize,
    pub complete: bool,
}

impl Summary {
    pub fn record(&mut self, event: &Result<RunEvent>) {
        match event {
            Ok(RunEvent::Started) => {},
            Ok(RunEvent::Ingested { cached, rejected, .. }) => {
                self.cached = *cached;
                self.rejected = *rejected;
            },
            Ok(RunEvent::Dispatched(Dispatch::Duplicate(_))) => self.duplicates += 1,
            Ok(RunEvent::Dispatched(Dispatch::Submitted(submitted))) => {
                self.submitted += 1;
                if submitted.commit.is_err() {
                    self.uncommitted += 1;
                }
                match submitted.resolution {
                    Resolution::Removed(_) => self.replaced += 1,
                    Resolution::LookupFailed(_) | Resolution::RemoveFailed(..) => self.unresolved += 1,
                    Resolution::NotReplacement | Resolution::NoMatch => {},
                }
            },
            Ok(RunEvent::Complete) => self.complete = true,
            Err(_) => self.failed += 1,
        }
    }

    /// A run is clean when it finished and every submission was persisted.
    /// Failed submissions don't count: they are retried next run.
    pub fn is_clean(&self) -> bool {
        self.complete && self.uncommitted == 0
    }
}

impl Display for Summary {
    fn fmt(&self, f: &mut Formatter<'_>) -> FmtResult {
        write!(
            f,
            "{} submitted, {} replaced, {} cached, {} rejected, {} duplicate, {} failed",
            self.submitted, self.replaced, self.cached, self.rejected, self.duplicates, self.failed
        )?;
        if self.uncommitted > 0 {
            write!(f, ", {} not persisted", self.uncommitted)?;
        }
        if self.unresolved > 0 {
            write!(f, ", {} superseded entries left in queue", self.unresolved)?;
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::resolve::Markers;
    use crate::test_support::{HASH_A, HASH_B, HASH_C, magnet, named_magnet};
    use async_trait::async_trait;
    use futures::{StreamExt, pin_mut};
    use nab_feed::Entry;
    use nab_feed::error::{ErrorKind as FeedErrorKind, Result as FeedResult};
    use nab_queue::backend::{MockBackend, Operation};
    use nab_queue::{EntryId, QueueEntry};
    use std::path::PathBuf;
    use tempfile::tempdir;

    struct StaticFeed(Option<Vec<Entry>>);

    #[async_trait]
    impl FeedSource for StaticFeed {
        fn location(&self) -> String {
            "static".to_string()
        }

        async fn fetch(&self) -> FeedResult<Vec<Entry>> {
            match &self.0 {
                Some(entries) => Ok(entries.clone()),
                None => exn::bail!(FeedErrorKind::Network("static".to_string())),
            }
        }
    }

    fn scenario() -> StaticFeed {
        StaticFeed(Some(vec![
            Entry::new("Show S01E02 720p GROUP", named_magnet("Show S01E02 720p GROUP", HASH_A)),
            Entry::new("Show S01E02 REPACK 720p GROUP", named_magnet("Show S01E02 REPACK 720p GROUP", HASH_B)),
        ]))
    }

    async fn collect(
        feed: &dyn FeedSource,
        cache: &mut IdentifierCache,
        queue: &dyn QueueBackend,
    ) -> (Vec<Result<RunEvent>>, Summary) {
        let classifier = Classifier::new().unwrap();
        let ctx = Context::new("/dl", Markers::default());
        let events = run(feed, &classifier, cache, queue, &ctx);
        pin_mut!(events);
        let mut collected = Vec::new();
        let mut summary = Summary::default();
        while let Some(event) = events.next().await {
            summary.record(&event);
            collected.push(event);
        }
        (collected, summary)
    }

    #[tokio::test]
    async fn test_end_to_end_replacement() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let queue = MockBackend::default();
        let mut cache = IdentifierCache::load(&path, 10).unwrap();

        let (events, summary) = collect(&scenario(), &mut cache, &queue).await;

        assert!(matches!(events.first(), Some(Ok(RunEvent::Started))));
        assert!(matches!(events.last(), Some(Ok(RunEvent::Complete))));
        assert!(matches!(events[1], Ok(RunEvent::Ingested { actionable: 2, cached: 0, rejected: 0 })));
        assert_eq!(summary.submitted, 2);
        assert_eq!(summary.replaced, 1);
        assert!(summary.is_clean());

        // Only the replacement is left in the queue.
        let entries = queue.entries().await;
        assert_eq!(entries.len(), 1);
        assert_eq!(entries[0].id, EntryId(2));
        assert_eq!(queue.removals().await, vec![(EntryId(1), true)]);

        let persisted = IdentifierCache::load(&path, 10).unwrap();
        assert_eq!(persisted.iter().collect::<Vec<_>>(), vec![HASH_A, HASH_B]);
    }

    #[tokio::test]
    async fn test_second_run_is_idempotent() {
        let temp = tempdir().unwrap();
        let path = temp.path().join("cache.json");
        let queue = MockBackend::default();

        let mut cache = IdentifierCache::load(&path, 10).unwrap();
        collect(&scenario(), &mut cache, &queue).await;
        let submitted = queue.submissions().await.len();

        let mut cache = IdentifierCache::load(&path, 10).unwrap();
        let (_, summary) = collect(&scenario(), &mut cache, &queue).await;

        assert_eq!(queue.submissions().await.len(), submitted);
        assert_eq!(summary.submitted, 0);
        assert_eq!(summary.cached, 2);
    }

    #[tokio::test]
    async fn test_nothing_actionable_leaves_queue_alone() {
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        cache.add(HASH_A);
        let feed = StaticFeed(Some(vec![
            Entry::new("Show S01E02 720p GROUP", magnet(HASH_A)),
            Entry::new("Show Name Weird Title No Code", magnet(HASH_C)),
        ]));
        // Every operation fails, so any contact would show up as a failure.
        let queue = MockBackend::default()
            .failing(Operation::Submit)
            .failing(Operation::List)
            .failing(Operation::Remove);

        let (_, summary) = collect(&feed, &mut cache, &queue).await;

        assert_eq!(summary.failed, 0);
        assert_eq!((summary.cached, summary.rejected), (1, 1));
        assert!(summary.complete);
    }

    #[tokio::test]
    async fn test_submission_failure_continues_run() {
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        let feed = StaticFeed(Some(vec![
            Entry::new("Show S01E02 720p GROUP", magnet(HASH_A)),
            Entry::new("Show S01E03 720p GROUP", magnet(HASH_C)),
        ]));
        let queue = MockBackend::default().rejecting(magnet(HASH_A));

        let (events, summary) = collect(&feed, &mut cache, &queue).await;

        assert_eq!((summary.failed, summary.submitted), (1, 1));
        assert!(events.iter().any(|e| matches!(e, Err(err) if matches!(**err, ErrorKind::Submission(_)))));
        assert!(!cache.exists(HASH_A));
        assert!(cache.exists(HASH_C));
        assert!(summary.is_clean());
    }

    #[tokio::test]
    async fn test_within_run_duplicates() {
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        let feed = StaticFeed(Some(vec![
            Entry::new("Show S01E02 720p GROUP", magnet(HASH_A)),
            Entry::new("Show S01E02 720p MIRROR", magnet(HASH_A)),
        ]));
        let queue = MockBackend::default();

        let (_, summary) = collect(&feed, &mut cache, &queue).await;

        assert_eq!((summary.submitted, summary.duplicates), (1, 1));
        assert_eq!(queue.submissions().await.len(), 1);
    }

    #[tokio::test]
    async fn test_feed_failure_is_fatal() {
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        let queue = MockBackend::default();

        let (events, summary) = collect(&StaticFeed(None), &mut cache, &queue).await;

        assert_eq!(events.len(), 2);
        assert!(matches!(&events[1], Err(err) if err.is_fatal()));
        assert!(!summary.complete);
        assert!(!summary.is_clean());
    }

    #[tokio::test]
    async fn test_replacement_leaves_other_locations() {
        let mut cache = IdentifierCache::in_memory(10).unwrap();
        let queue = MockBackend::with_entries([
            QueueEntry::new(EntryId(1), "Show S01E02 720p GROUP", "/dl/Show"),
            QueueEntry::new(EntryId(2), "Show S01E02 720p GROUP", "/mnt/Show"),
        ]);
        let feed = StaticFeed(Some(vec![Entry::new("Show S01E02 REPACK 720p GROUP", magnet(HASH_B))]));

        let (_, summary) = collect(&feed, &mut cache, &queue).await;

        assert_eq!(summary.replaced, 1);
        let locations: Vec<PathBuf> = queue.entries().await.into_iter().map(|e| e.location).collect();
        assert_eq!(locations, vec![PathBuf::from("/mnt/Show"), PathBuf::from("/dl/Show")]);
    }

    #[test]
    fn test_summary_display() {
        let summary = Summary {
            submitted: 2,
            replaced: 1,
            uncommitted: 1,
            ..Summary::default()
        };
        assert_eq!(
            summary.to_string(),
            "2 submitted, 1 replaced, 0 cached, 0 rejected, 0 duplicate, 0 failed, 1 not persisted"
        );
    }
}
