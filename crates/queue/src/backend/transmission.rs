//! Transmission JSON-RPC backend.
//!
//! Transmission guards its RPC endpoint against CSRF with a session token:
//! the first request (and any request after the daemon restarts) is answered
//! with `409 Conflict` and an `X-Transmission-Session-Id` header. The request
//! has to be repeated with that header set.

use std::path::Path;
use std::time::Duration;

use async_trait::async_trait;
use exn::{OptionExt, ResultExt};
use reqwest::{Client, StatusCode};
use serde::de::{DeserializeOwned, IgnoredAny};
use serde::{Deserialize, Serialize};
use tokio::sync::RwLock;
use tracing::instrument;

use crate::error::{ErrorKind, Result};
use crate::{EntryId, QueueBackend, QueueEntry};

const SESSION_HEADER: &str = "X-Transmission-Session-Id";
const LIST_FIELDS: [&str; 3] = ["id", "name", "downloadDir"];

#[derive(Serialize)]
struct Request<'a, A> {
    method: &'static str,
    arguments: &'a A,
}

#[derive(Debug, Deserialize)]
struct Response<A> {
    result: String,
    arguments: Option<A>,
}
impl<A> Response<A> {
    fn check(&self) -> Result<()> {
        if self.result != "success" {
            exn::bail!(ErrorKind::Rpc(self.result.clone()));
        }
        Ok(())
    }

    fn into_arguments(self, method: &'static str) -> Result<A> {
        self.check()?;
        self.arguments.ok_or_raise(|| ErrorKind::InvalidResponse(method))
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct AddArguments<'a> {
    filename: &'a str,
    download_dir: &'a str,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "kebab-case")]
struct AddResult {
    torrent_added: Option<TorrentRef>,
    torrent_duplicate: Option<TorrentRef>,
}
impl AddResult {
    fn into_entry_id(self) -> Result<EntryId> {
        match (self.torrent_added, self.torrent_duplicate) {
            (Some(added), _) => Ok(EntryId(added.id)),
            (None, Some(duplicate)) => {
                tracing::info!(id = duplicate.id, name = ?duplicate.name, "Torrent already in queue");
                Ok(EntryId(duplicate.id))
            },
            (None, None) => exn::bail!(ErrorKind::InvalidResponse("torrent-add")),
        }
    }
}

#[derive(Debug, Deserialize)]
struct TorrentRef {
    id: i64,
    name: Option<String>,
}

#[derive(Serialize)]
struct GetArguments {
    fields: &'static [&'static str],
}

#[derive(Debug, Deserialize)]
struct GetResult {
    torrents: Vec<Torrent>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Torrent {
    id: i64,
    name: String,
    download_dir: String,
}
impl From<Torrent> for QueueEntry {
    fn from(torrent: Torrent) -> Self {
        QueueEntry::new(EntryId(torrent.id), torrent.name, torrent.download_dir)
    }
}

#[derive(Serialize)]
#[serde(rename_all = "kebab-case")]
struct RemoveArguments {
    ids: [i64; 1],
    delete_local_data: bool,
}

/// Queue backend for a Transmission daemon.
///
/// # Examples
///
/// ```no_run
/// use nab_queue::backend::TransmissionBackend;
/// use std::time::Duration;
///
/// # fn example() -> Result<(), Box<dyn std::error::Error>> {
/// let url = TransmissionBackend::endpoint("localhost", 9091, "/transmission/rpc", false);
/// let backend = TransmissionBackend::new("transmission", url, Duration::from_secs(30))?
///     .with_credentials("user", "secret");
/// # Ok(())
/// # }
/// ```
pub struct TransmissionBackend {
    name: String,
    url: String,
    client: Client,
    credentials: Option<(String, String)>,
    session: RwLock<Option<String>>,
}
impl TransmissionBackend {
    /// Create a backend for the RPC endpoint at `url`. No connection is
    /// made until the first operation.
    pub fn new(name: impl Into<String>, url: impl Into<String>, timeout: Duration) -> Result<Self> {
        let url = url.into();
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(concat!("nab/", env!("CARGO_PKG_VERSION")))
            .build()
            .or_raise(|| ErrorKind::Network(url.clone()))?;
        Ok(Self {
            name: name.into(),
            url,
            client,
            credentials: None,
            session: RwLock::new(None),
        })
    }

    /// Authenticate every request with HTTP basic auth.
    pub fn with_credentials(mut self, user: impl Into<String>, pass: impl Into<String>) -> Self {
        self.credentials = Some((user.into(), pass.into()));
        self
    }

    /// Build the RPC endpoint URL from its parts.
    pub fn endpoint(host: &str, port: u16, path: &str, tls: bool) -> String {
        let scheme = if tls { "https" } else { "http" };
        format!("{scheme}://{host}:{port}/{}", path.trim_start_matches('/'))
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    async fn call<A, R>(&self, method: &'static str, arguments: &A) -> Result<Response<R>>
    where
        A: Serialize + Sync,
        R: DeserializeOwned + Send,
    {
        let request = Request { method, arguments };
        let mut renewed = false;
        loop {
            let mut builder = self.client.post(&self.url).json(&request);
            if let Some(session) = self.session.read().await.as_deref() {
                builder = builder.header(SESSION_HEADER, session);
            }
            if let Some((user, pass)) = &self.credentials {
                builder = builder.basic_auth(user, Some(pass));
            }
            let response = builder.send().await.or_raise(|| ErrorKind::Network(self.url.clone()))?;
            match response.status() {
                // Only renew once; a second conflict means something else is wrong.
                StatusCode::CONFLICT if !renewed => {
                    let session = response
                        .headers()
                        .get(SESSION_HEADER)
                        .and_then(|value| value.to_str().ok())
                        .map(str::to_string)
                        .ok_or_raise(|| ErrorKind::InvalidResponse(method))?;
                    tracing::debug!(backend = %self.name, "Renewed Transmission session");
                    *self.session.write().await = Some(session);
                    renewed = true;
                    continue;
                },
                StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => exn::bail!(ErrorKind::Unauthorized),
                status if !status.is_success() => exn::bail!(ErrorKind::Rpc(format!("HTTP {status}"))),
                _ => {},
            }
            return response.json::<Response<R>>().await.or_raise(|| ErrorKind::InvalidResponse(method));
        }
    }
}

#[async_trait]
impl QueueBackend for TransmissionBackend {
    fn name(&self) -> &str {
        &self.name
    }

    #[instrument(skip(self, link), fields(backend = %self.name, location = %location.display()))]
    async fn submit(&self, link: &str, location: &Path) -> Result<EntryId> {
        let download_dir = location.to_str().ok_or_raise(|| ErrorKind::InvalidLocation(location.to_path_buf()))?;
        let arguments = AddArguments { filename: link, download_dir };
        let added: AddResult = self.call("torrent-add", &arguments).await?.into_arguments("torrent-add")?;
        added.into_entry_id()
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn list_active(&self) -> Result<Vec<QueueEntry>> {
        let arguments = GetArguments { fields: &LIST_FIELDS };
        let result: GetResult = self.call("torrent-get", &arguments).await?.into_arguments("torrent-get")?;
        Ok(result.torrents.into_iter().map(QueueEntry::from).collect())
    }

    #[instrument(skip(self), fields(backend = %self.name))]
    async fn remove(&self, id: EntryId, delete_data: bool) -> Result<()> {
        let arguments = RemoveArguments {
            ids: [id.0],
            delete_local_data: delete_data,
        };
        self.call::<_, IgnoredAny>("torrent-remove", &arguments).await?.check()
    }
}
