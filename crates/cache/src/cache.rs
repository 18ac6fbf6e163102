use std::collections::{HashSet, VecDeque};
use std::fs::{self, create_dir_all};
use std::io::{ErrorKind as IoErrorKind, Write};
use std::path::{Path, PathBuf};

use exn::ResultExt;
use tempfile::NamedTempFile;
use tracing::instrument;

use crate::error::{ErrorKind, Result};

/// Bounded, insertion-ordered set of release identifiers.
///
/// Membership checks are O(1). When an insert pushes the number of entries
/// past the configured maximum, the oldest entries are evicted until the
/// bound holds again, so the retained entries are always the most recently
/// added ones.
///
/// Mutations ([`add`](Self::add), [`remove`](Self::remove)) only touch memory.
/// Nothing reaches disk until [`commit`](Self::commit) is called.
#[derive(Debug, Clone)]
pub struct IdentifierCache {
    path: Option<PathBuf>,
    max_size: usize,
    order: VecDeque<String>,
    index: HashSet<String>,
    dry_run: bool,
}

impl IdentifierCache {
    fn new(path: Option<PathBuf>, max_size: usize) -> Result<Self> {
        if max_size == 0 {
            exn::bail!(ErrorKind::InvalidSize(max_size));
        }
        Ok(Self {
            path,
            max_size,
            order: VecDeque::new(),
            index: HashSet::new(),
            dry_run: false,
        })
    }

    /// Load the cache persisted at `path`.
    ///
    /// A missing or empty (whitespace only) file yields an empty cache. If the
    /// file holds more than `max_size` identifiers, only the newest
    /// `max_size` are kept; duplicates keep their first position.
    ///
    /// # Errors
    ///
    /// - [`ErrorKind::InvalidSize`] when `max_size` is zero.
    /// - [`ErrorKind::Io`] when the file exists but cannot be read.
    /// - [`ErrorKind::Malformed`] when the file is not a JSON array of strings.
    #[instrument(skip_all, fields(path = %path.as_ref().display(), max_size = max_size))]
    pub fn load(path: impl AsRef<Path>, max_size: usize) -> Result<Self> {
        let path = path.as_ref().to_path_buf();
        let mut cache = Self::new(Some(path.clone()), max_size)?;
        let contents = match fs::read_to_string(&path) {
            Ok(contents) => contents,
            Err(err) if err.kind() == IoErrorKind::NotFound => {
                tracing::info!(path = %path.display(), "No identifier cache on disk yet; starting empty");
                return Ok(cache);
            },
            Err(err) => return Err(err).or_raise(|| ErrorKind::Io(path)),
        };
        if contents.trim().is_empty() {
            return Ok(cache);
        }
        let identifiers: Vec<String> =
            serde_json::from_str(&contents).or_raise(|| ErrorKind::Malformed(path.clone()))?;
        for identifier in identifiers {
            cache.add(identifier);
        }
        tracing::debug!(path = %path.display(), entries = cache.len(), "Loaded identifier cache");
        Ok(cache)
    }

    /// Create a cache that is never persisted.
    ///
    /// [`commit`](Self::commit) is a no-op. Do NOT apply `#[cfg(test)]` so
    /// that other crates can also use this in their tests.
    pub fn in_memory(max_size: usize) -> Result<Self> {
        Self::new(None, max_size)
    }

    /// When enabled, [`commit`](Self::commit) logs instead of writing.
    pub fn with_dry_run(mut self, dry_run: bool) -> Self {
        self.dry_run = dry_run;
        self
    }

    /// Backing file, if any.
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    pub fn max_size(&self) -> usize {
        self.max_size
    }

    pub fn len(&self) -> usize {
        self.order.len()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    /// Returns `true` if `id` has been added (and not yet evicted).
    pub fn exists(&self, id: &str) -> bool {
        self.index.contains(id)
    }

    /// Record `id` as the most recently seen identifier.
    ///
    /// Adding an identifier that is already present changes nothing: it is
    /// neither duplicated nor moved to the back. Returns `true` if the
    /// identifier was inserted.
    pub fn add(&mut self, id: impl Into<String>) -> bool {
        let id = id.into();
        if self.index.contains(&id) {
            return false;
        }
        self.index.insert(id.clone());
        self.order.push_back(id);
        while self.order.len() > self.max_size {
            if let Some(evicted) = self.order.pop_front() {
                tracing::trace!(hash = %evicted, "Evicted oldest cache entry");
                self.index.remove(&evicted);
            }
        }
        true
    }

    /// Forget `id`, keeping the relative order of everything else. Returns
    /// `true` if it was present.
    pub fn remove(&mut self, id: &str) -> bool {
        if !self.index.remove(id) {
            return false;
        }
        self.order.retain(|entry| entry != id);
        true
    }

    /// Identifiers from oldest to newest.
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.order.iter().map(String::as_str)
    }

    /// Atomically replace the backing file with the current contents.
    ///
    /// The new content is written to a temporary file in the same directory,
    /// synced, then renamed over the old file. Parent directories are created
    /// as needed.
    ///
    /// # Errors
    ///
    /// Returns [`ErrorKind::Commit`] if any step fails. The in-memory state
    /// is unaffected.
    #[instrument(skip(self), fields(entries = self.order.len()))]
    pub fn commit(&self) -> Result<()> {
        let Some(path) = self.path.as_deref() else {
            return Ok(());
        };
        if self.dry_run {
            tracing::info!(path = %path.display(), "Skipping cache commit during dry run");
            return Ok(());
        }
        let data = serde_json::to_vec_pretty(&self.order).or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        // Sibling temporary file: a rename is only atomic within one filesystem.
        let directory = path.parent().filter(|parent| !parent.as_os_str().is_empty()).unwrap_or(Path::new("."));
        create_dir_all(directory).or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        let mut file = NamedTempFile::new_in(directory).or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        file.write_all(&data).or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        file.flush().or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        file.as_file().sync_all().or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        file.persist(path).or_raise(|| ErrorKind::Commit(path.to_path_buf()))?;
        tracing::debug!(path = %path.display(), "Committed identifier cache");
        Ok(())
    }
}
