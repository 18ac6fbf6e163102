use nab_cache::IdentifierCache;
use nab_extract::Classifier;
use nab_extract::error::Error as ClassifyError;
use nab_extract::models::Release;
use nab_feed::Entry;
use tracing::instrument;

/// A feed entry the classifier refused, and why.
#[derive(Debug)]
pub struct Rejection {
    pub entry: Entry,
    pub error: ClassifyError,
}

/// The outcome of [`ingest`]ing one feed snapshot. Every entry ends up in
/// exactly one of the three lists, each in feed order.
#[derive(Debug, Default)]
pub struct Ingest {
    /// Releases not in the cache when ingestion ran.
    pub actionable: Vec<Release>,
    /// Releases already processed by an earlier run.
    pub cached: Vec<Release>,
    pub rejected: Vec<Rejection>,
}

/// Classify every entry and split the results against the cache.
///
/// Membership is decided once, here; dispatching a release later in the same
/// run does not move anything between lists. A rejected entry is logged and
/// skipped without affecting the others.
#[instrument(skip_all, fields(cache = cache.len()))]
pub fn ingest(entries: impl IntoIterator<Item = Entry>, classifier: &Classifier, cache: &IdentifierCache) -> Ingest {
    let mut ingest = Ingest::default();
    for entry in entries {
        match classifier.classify(&entry.title, &entry.link) {
            Ok(release) if cache.exists(&release.hash) => {
                tracing::info!(hash = %release.hash, title = %release.title, "Skipping cached release");
                ingest.cached.push(release);
            },
            Ok(release) => {
                tracing::debug!(hash = %release.hash, title = %release.title, "Found new release");
                ingest.actionable.push(release);
            },
            Err(error) => {
                tracing::warn!(title = %entry.title, link = %entry.link, %error, "Skipping unrecognised feed entry");
                ingest.rejected.push(Rejection { entry, error });
            },
        }
    }
    ingest
}
