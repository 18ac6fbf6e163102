//! Feed source trait and implementations.

use async_trait::async_trait;
use exn::ResultExt;
use reqwest::Client;
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{Entry, parse};

/// A source of one feed snapshot.
#[async_trait]
pub trait FeedSource: Send + Sync {
    /// Human-readable location of the feed, for logging.
    fn location(&self) -> String;

    /// Fetch and parse the current snapshot, preserving feed order.
    async fn fetch(&self) -> Result<Vec<Entry>>;
}

/// Feed served over HTTP(S).
pub struct HttpFeed {
    url: String,
    client: Client,
}
impl HttpFeed {
    pub fn new(url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nab/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Network(url.clone()))?;
        Ok(Self { url, client })
    }
}

#[async_trait]
impl FeedSource for HttpFeed {
    fn location(&self) -> String {
        self.url.clone()
    }

    #[instrument(skip(self), fields(url = %self.url))]
    async fn fetch(&self) -> Result<Vec<Entry>> {
        let network = || ErrorKind::Network(self.url.clone());
        let response = self
            .client
            .get(&self.url)
            .send()
            .await
            .and_then(|response| response.error_for_status())
            .or_raise(network)?;
        let body = response.bytes().await.or_raise(network)?;
        parse(&body)
    }
}

/// Feed stored in a local file.
pub struct FileFeed {
    path: PathBuf,
}
impl FileFeed {
    pub fn new(path: impl AsRef<Path>) -> Self {
        Self {
            path: path.as_ref().to_path_buf(),
        }
    }
}

#[async_trait]
impl FeedSource for FileFeed {
    fn location(&self) -> String {
        self.path.display().to_string()
    }

    #[instrument(skip(self), fields(path = %self.path.display()))]
    async fn fetch(&self) -> Result<Vec<Entry>> {
        let body = tokio::fs::read(&self.path)
            .await
            .or_raise(|| ErrorKind::Io(self.path.clone()))?;
        parse(&body)
    }
}
