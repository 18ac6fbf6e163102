use exn::ResultExt;
use tracing::instrument;

use crate::Entry;
use crate::error::{ErrorKind, Result};

/// Parse an RSS 2.0 document into its entries, in document order.
///
/// Items without a `<link>` fall back to their `<enclosure>` URL. A missing
/// title or link becomes an empty string rather than dropping the item, so
/// that whoever classifies the entries gets to reject (and report) it.
///
/// # Examples
///
/// ```
/// let xml = br#"<rss version="2.0"><channel><title>t</title><link>l</link><description>d</description>
///     <item><title>Show S01E02 720p GROUP</title><link>magnet:?xt=urn:btih:abc</link></item>
/// </channel></rss>"#;
/// let entries = nab_feed::parse(xml).unwrap();
/// assert_eq!(entries[0].title, "Show S01E02 720p GROUP");
/// ```
#[instrument(skip_all, fields(bytes = bytes.len()))]
pub fn parse(bytes: &[u8]) -> Result<Vec<Entry>> {
    let channel = rss::Channel::read_from(bytes).or_raise(|| ErrorKind::Malformed)?;
    let entries: Vec<Entry> = channel
        .items()
        .iter()
        .map(|item| {
            let link = item
                .link()
                .filter(|link| !link.trim().is_empty())
                .or_else(|| item.enclosure().map(|enclosure| enclosure.url()))
                .unwrap_or_default();
            Entry::new(item.title().unwrap_or_default().trim(), link.trim())
        })
        .collect();
    tracing::debug!(channel = channel.title(), count = entries.len(), "Parsed feed");
    Ok(entries)
}
