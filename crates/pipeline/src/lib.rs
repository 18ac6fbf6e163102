//! The deduplication and replacement pipeline.
//!
//! One run takes a feed snapshot through four stages:
//! 1. [`ingest`]: classify every entry and keep the releases the
//!    [cache](nab_cache) has not seen, in feed order.
//! 2. [`dispatch`]: submit each of those to the [queue](nab_queue), then record
//!    and commit its hash.
//! 3. [`resolve`]: when the release is a corrected re-issue, remove the queue
//!    entry it supersedes.
//! 4. [`run`] ties the above together as a stream of [`RunEvent`]s.
//!
//! Failures local to one entry or one release are reported and never abort
//! the run. Only a feed that can't be fetched stops it.

mod dispatch;
pub mod error;
mod ingest;
mod resolve;
mod run;

pub use crate::dispatch::{Dispatch, Submitted, dispatch};
pub use crate::ingest::{Ingest, Rejection, ingest};
pub use crate::resolve::{Markers, Resolution, find_superseded, resolve};
pub use crate::run::{RunEvent, Summary, run};
use crate::error::{ErrorKind, Result};
use nab_extract::models::Release;
use std::path::{Component, Path, PathBuf};

/// Static settings a run needs beyond its collaborators.
#[derive(Debug, Clone)]
pub struct Context {
    /// Download root; each series is stored in its own directory below it.
    pub download_root: PathBuf,
    pub markers: Markers,
}
impl Context {
    pub fn new(download_root: impl Into<PathBuf>, markers: Markers) -> Self {
        Self {
            download_root: download_root.into(),
            markers,
        }
    }

    /// Storage location for a release: `<download root>/<series>`.
    ///
    /// The series comes straight from feed text, so it must be exactly one
    /// plain directory name. Anything that would resolve outside the download
    /// root (absolute paths, `..`, separators, null bytes) is rejected with
    /// [`ErrorKind::InvalidLocation`].
    pub fn location(&self, release: &Release) -> Result<PathBuf> {
        let series = Path::new(&release.series);
        let mut components = series.components();
        match (components.next(), components.next()) {
            (Some(Component::Normal(name)), None) if !name.as_encoded_bytes().contains(&0) => {
                Ok(self.download_root.join(name))
            },
            _ => exn::bail!(ErrorKind::InvalidLocation(release.series.clone())),
        }
    }
}


#[cfg(test)]
pub(crate) mod test_support {
    use nab_extract::Classifier;
    use nab_extract::models::Release;

    pub const HASH_A: &str = "aaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaaa";
    pub const HASH_B: &str = "bbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbbb";
    pub const HASH_C: &str = "cccccccccccccccccccccccccccccccccccccccc";

    pub fn magnet(hash: &str) -> String {
        format!("magnet:?xt=urn:btih:{hash}&tr=udp%3A%2F%2Ftracker.example%3A1337")
    }

    /// Magnet carrying the title as its display name, which is what a queue
    /// shows for it.
    pub fn named_magnet(title: &str, hash: &str) -> String {
        format!("magnet:?xt=urn:btih:{hash}&dn={}", title.replace(' ', "+"))
    }

    pub fn release(title: &str, hash: &str) -> Release {
        Classifier::new().unwrap().classify(title, &magnet(hash)).unwrap()
    }
}
