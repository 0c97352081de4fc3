//! Texture fetching and the queue of in-flight texture syncs.
//!
//! Issuing a sync never blocks the interpreter: the fetch future is queued
//! and only awaited when the owner drains the queue (see
//! `PlanetInterpreter::flush_syncs`). Nothing cancels a queued sync, so a
//! sync issued by an earlier parse can still land after a later one.

use std::cell::RefCell;
use std::collections::{HashMap, VecDeque};
use std::future::Future;
use std::pin::Pin;

use crate::host::AssetKind;

/// Marker returned by texture queries for non-vector textures.
pub const NON_SVG_MARKER: &str = "[non-SVG texture]";

/// Bytes and content type of a fetched texture.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FetchedTexture {
    pub bytes: Vec<u8>,
    pub content_type: Option<String>,
}

impl FetchedTexture {
    pub fn new(bytes: impl Into<Vec<u8>>, content_type: impl Into<String>) -> Self {
        Self {
            bytes: bytes.into(),
            content_type: Some(content_type.into()),
        }
    }

    pub fn is_svg(&self) -> bool {
        self.content_type.as_deref().is_some_and(|ct| ct.contains("svg"))
    }
}

#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum FetchError {
    #[error("request to {url} failed: {message}")]
    Request { url: String, message: String },

    #[error("{url} answered with HTTP status {status}")]
    Status { url: String, status: u16 },

    #[error("no texture available at {0}")]
    NotFound(String),
}

/// A fetch in flight. Owns everything it needs, so it can outlive the call
/// that issued it.
pub type FetchFuture = Pin<Box<dyn Future<Output = Result<FetchedTexture, FetchError>>>>;

/// Byte fetch over a URL.
pub trait TextureFetcher {
    fn fetch(&self, url: &str) -> FetchFuture;
}

/// A texture sync that has been issued but not yet applied.
pub struct PendingSync {
    pub id: String,
    /// Entity name the costume is for, resolved again when the fetch lands.
    pub entity: String,
    pub url: String,
    pub kind: AssetKind,
    pub fetch: FetchFuture,
}

impl std::fmt::Debug for PendingSync {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("PendingSync")
            .field("id", &self.id)
            .field("entity", &self.entity)
            .field("url", &self.url)
            .field("kind", &self.kind)
            .finish_non_exhaustive()
    }
}

/// FIFO of pending syncs, applied in issue order.
#[derive(Debug, Default)]
pub struct SyncQueue {
    pending: VecDeque<PendingSync>,
}

impl SyncQueue {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn push(&mut self, sync: PendingSync) {
        self.pending.push_back(sync);
    }

    pub fn pop(&mut self) -> Option<PendingSync> {
        self.pending.pop_front()
    }

    pub fn len(&self) -> usize {
        self.pending.len()
    }

    pub fn is_empty(&self) -> bool {
        self.pending.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &PendingSync> {
        self.pending.iter()
    }
}

/// Outcome of draining the sync queue.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct SyncReport {
    /// Costumes installed.
    pub applied: usize,
    /// Fetches that failed; the entity was left untouched.
    pub failed: usize,
    /// Fetches that landed after their entity disappeared.
    pub skipped: usize,
}

impl SyncReport {
    pub fn total(&self) -> usize {
        self.applied + self.failed + self.skipped
    }
}

/// Fetcher serving textures from memory. Records every requested URL.
#[derive(Debug, Default)]
pub struct MemoryFetcher {
    textures: HashMap<String, FetchedTexture>,
    requests: RefCell<Vec<String>>,
}

impl MemoryFetcher {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_texture(mut self, url: impl Into<String>, texture: FetchedTexture) -> Self {
        self.textures.insert(url.into(), texture);
        self
    }

    pub fn insert(&mut self, url: impl Into<String>, texture: FetchedTexture) {
        self.textures.insert(url.into(), texture);
    }

    /// URLs requested so far, in order.
    pub fn requests(&self) -> Vec<String> {
        self.requests.borrow().clone()
    }
}

impl TextureFetcher for MemoryFetcher {
    fn fetch(&self, url: &str) -> FetchFuture {
        self.requests.borrow_mut().push(url.to_string());
        let result = self
            .textures
            .get(url)
            .cloned()
            .ok_or_else(|| FetchError::NotFound(url.to_string()));
        Box::pin(async move { result })
    }
}

#[cfg(not(target_arch = "wasm32"))]
pub use http_fetch::HttpFetcher;

#[cfg(not(target_arch = "wasm32"))]
mod http_fetch {
    use std::time::Duration;

    use reqwest::header::CONTENT_TYPE;
    use reqwest::Client;

    use super::{FetchError, FetchFuture, FetchedTexture, TextureFetcher};

    /// Fetches textures over HTTP. Futures need a tokio runtime to make
    /// progress.
    #[derive(Debug, Clone)]
    pub struct HttpFetcher {
        client: Client,
    }

    impl HttpFetcher {
        pub fn new() -> Result<Self, FetchError> {
            let client = Client::builder()
                .timeout(Duration::from_secs(30))
                .build()
                .map_err(|e| FetchError::Request {
                    url: String::new(),
                    message: e.to_string(),
                })?;
            Ok(Self { client })
        }
    }

    impl TextureFetcher for HttpFetcher {
        fn fetch(&self, url: &str) -> FetchFuture {
            let client = self.client.clone();
            let url = url.to_string();
            Box::pin(async move {
                let request_error = |e: reqwest::Error| FetchError::Request {
                    url: url.clone(),
                    message: e.to_string(),
                };

                let response = client.get(&url).send().await.map_err(request_error)?;
                let status = response.status();
                if !status.is_success() {
                    return Err(FetchError::Status {
                        url: url.clone(),
                        status: status.as_u16(),
                    });
                }

                let content_type = response
                    .headers()
                    .get(CONTENT_TYPE)
                    .and_then(|v| v.to_str().ok())
                    .map(str::to_string);
                let bytes = response.bytes().await.map_err(request_error)?;

                Ok(FetchedTexture {
                    bytes: bytes.to_vec(),
                    content_type,
                })
            })
        }
    }
}
