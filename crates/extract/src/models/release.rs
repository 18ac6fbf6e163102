use super::EpisodeCode;

/// One classified feed entry.
///
/// Built once by the [`Classifier`](crate::Classifier) and never modified
/// afterwards. Only the `hash` outlives the run (as a cache entry); the
/// release itself is never persisted.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Release {
    /// Raw display title from the feed.
    pub title: String,
    /// Show name, everything before the episode code.
    pub series: String,
    pub episode: EpisodeCode,
    /// Residual descriptor text (resolution, source, group, replacement
    /// markers), kept verbatim.
    pub info: String,
    /// Retrievable resource locator, a magnet URI.
    pub link: String,
    /// Lower-case hex info-hash extracted from `link`.
    pub hash: String,
}
