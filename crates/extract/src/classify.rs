//! Title and link classification.

use exn::{OptionExt, ResultExt};
use regex::Regex;
use tracing::instrument;

use crate::consts::{LINK_PATTERN, TITLE_PATTERN};
use crate::error::{ErrorKind, Result};
use crate::models::{EpisodeCode, Release};

/// Turns raw feed entries into [`Release`]s.
///
/// Owns its compiled patterns; construct one at start-up and reuse it for
/// every entry of the run. Classification is a pure function of the title and
/// link text: the same input always yields the same release or the same
/// rejection.
///
/// # Examples
///
/// ```rust
/// use nab_extract::Classifier;
///
/// let classifier = Classifier::new().unwrap();
/// let release = classifier
///     .classify(
///         "Show S01E02 720p GROUP",
///         "magnet:?xt=urn:btih:0123456789ABCDEF0123456789abcdef01234567&dn=Show",
///     )
///     .unwrap();
/// assert_eq!(release.series, "Show");
/// assert_eq!(release.episode.to_string(), "S01E02");
/// assert_eq!(release.info, "720p GROUP");
/// assert_eq!(release.hash, "0123456789abcdef0123456789abcdef01234567");
/// ```
#[derive(Debug, Clone)]
pub struct Classifier {
    title_pattern: Regex,
    link_pattern: Regex,
}
impl Classifier {
    /// Compile the title and link patterns.
    pub fn new() -> Result<Self> {
        Ok(Self {
            title_pattern: Regex::new(TITLE_PATTERN).or_raise(|| ErrorKind::Pattern("title"))?,
            link_pattern: Regex::new(LINK_PATTERN).or_raise(|| ErrorKind::Pattern("link"))?,
        })
    }

    /// Classify one feed entry.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::TitleFormatMismatch`] if the title has no `SxxExx`
    ///   code surrounded by a series name and descriptor text.
    /// - [`ErrorKind::LinkFormatMismatch`] if the link is not a magnet URI
    ///   starting with a 40-character hex `btih` identifier.
    #[instrument(level = "debug", skip(self, link), fields(hash))]
    pub fn classify(&self, title: &str, link: &str) -> Result<Release> {
        let (series, episode, info) = self.title(title)?;
        let hash = self.hash(link)?;
        tracing::Span::current().record("hash", hash.as_str());
        Ok(Release {
            title: title.to_string(),
            series,
            episode,
            info,
            link: link.to_string(),
            hash,
        })
    }

    /// Splits a title into `(series, episode, info)`.
    fn title(&self, title: &str) -> Result<(String, EpisodeCode, String)> {
        let captures =
            self.title_pattern.captures(title).ok_or_raise(|| ErrorKind::TitleFormatMismatch(title.to_string()))?;
        let series = captures.get(1).map(|m| m.as_str().trim()).unwrap_or_default();
        let info = captures.get(4).map(|m| m.as_str().trim()).unwrap_or_default();
        if series.is_empty() || info.is_empty() {
            exn::bail!(ErrorKind::TitleFormatMismatch(title.to_string()));
        }
        let season = Self::number(captures.get(2).map(|m| m.as_str()), "season")?;
        let episode = Self::number(captures.get(3).map(|m| m.as_str()), "episode")?;
        Ok((series.to_string(), EpisodeCode::new(season, episode), info.to_string()))
    }

    fn number(digits: Option<&str>, field: &'static str) -> Result<u16> {
        let digits = digits.ok_or_raise(|| ErrorKind::ParseError {
            field,
            value: "missing".to_string(),
        })?;
        digits.parse::<u16>().or_raise(|| ErrorKind::ParseError {
            field,
            value: digits.to_string(),
        })
    }

    /// Extracts the info-hash from a magnet link, lower-cased.
    fn hash(&self, link: &str) -> Result<String> {
        self.link_pattern
            .captures(link)
            .and_then(|captures| captures.get(1))
            .map(|m| m.as_str().to_ascii_lowercase())
            .ok_or_raise(|| ErrorKind::LinkFormatMismatch(link.to_string()))
    }
}
