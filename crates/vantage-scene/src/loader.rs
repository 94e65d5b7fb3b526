//! Model loading: fetch, find the embedded scene description, build it
//!
//! Loading runs as a task on the host's tokio runtime and never touches the
//! scene graph. Results are parked in a `PendingLoad` slot; the viewer's
//! frame loop drains the slot and attaches the model.

use serde_json::Value;
use std::future::Future;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;
use thiserror::Error;
use tokio::runtime::Handle;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};
use vantage_core::{find_scene_description, DeserializeError, NodeSubtree, SceneDeserializer};

use crate::status::{LoadStatus, LoadStatusChannel};

#[derive(Error, Debug)]
pub enum LoadError {
    #[error("Request to {url} failed: {message}")]
    Transport { url: String, message: String },
    #[error("{url} answered with HTTP {status}")]
    Status { url: String, status: u16 },
    #[error("Payload from {url} is not valid JSON: {message}")]
    InvalidJson { url: String, message: String },
    #[error("Failed to build model: {0}")]
    Deserialize(#[from] DeserializeError),
    #[error("Load task did not complete: {0}")]
    Aborted(String),
}

/// Source of raw model payloads
pub trait PayloadFetcher: Send + Sync + 'static {
    fn fetch(&self, url: &str) -> impl Future<Output = Result<Value, LoadError>> + Send;
}

/// Fetches payloads over HTTP with caching disabled
#[derive(Debug, Clone)]
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    pub fn new(timeout: Duration) -> anyhow::Result<Self> {
        use anyhow::Context;
        let client = reqwest::Client::builder()
            .timeout(timeout)
            .build()
            .context("Failed to create HTTP client")?;
        Ok(Self { client })
    }
}

impl PayloadFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Value, LoadError> {
        use reqwest::header::{CACHE_CONTROL, EXPIRES, PRAGMA};

        info!(url = %url, "Fetching model payload");
        let transport = |e: reqwest::Error| LoadError::Transport {
            url: url.to_string(),
            message: e.to_string(),
        };

        let response = self
            .client
            .get(url)
            .header(CACHE_CONTROL, "no-cache")
            .header(PRAGMA, "no-cache")
            .header(EXPIRES, "0")
            .send()
            .await
            .map_err(transport)?;

        if !response.status().is_success() {
            return Err(LoadError::Status {
                url: url.to_string(),
                status: response.status().as_u16(),
            });
        }

        let body = response.bytes().await.map_err(transport)?;
        debug!(url = %url, bytes = body.len(), "Received model payload");
        serde_json::from_slice(&body).map_err(|e| LoadError::InvalidJson {
            url: url.to_string(),
            message: e.to_string(),
        })
    }
}

/// Result parked for the frame loop
#[derive(Debug)]
pub enum LoadOutcome {
    Built(NodeSubtree),
    /// The payload held no scene description
    NoDescription,
    Failed(String),
}

/// What the load task reports to whoever awaits it
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LoadReport {
    Built { nodes: usize },
    NoDescription,
    /// Viewer disposed before the model was built
    Cancelled,
}

/// Slot shared between the load task and the frame loop
#[derive(Debug, Clone, Default)]
pub struct PendingLoad {
    slot: Arc<Mutex<Option<LoadOutcome>>>,
}

impl PendingLoad {
    fn put(&self, outcome: LoadOutcome) {
        match self.slot.lock() {
            Ok(mut slot) => *slot = Some(outcome),
            Err(poisoned) => *poisoned.into_inner() = Some(outcome),
        }
    }

    pub fn take(&self) -> Option<LoadOutcome> {
        match self.slot.try_lock() {
            Ok(mut slot) => slot.take(),
            Err(std::sync::TryLockError::Poisoned(poisoned)) => poisoned.into_inner().take(),
            Err(std::sync::TryLockError::WouldBlock) => None,
        }
    }
}

/// Handle on a running load
#[derive(Debug)]
pub struct LoadTask {
    url: String,
    handle: JoinHandle<Result<LoadReport, LoadError>>,
}

impl LoadTask {
    /// Wait for the fetch and build to finish
    pub async fn finished(self) -> Result<LoadReport, LoadError> {
        self.handle
            .await
            .map_err(|e| LoadError::Aborted(format!("{}: {e}", self.url)))?
    }
}

#[derive(Debug, Clone)]
pub struct ModelLoader {
    url: String,
    status: LoadStatusChannel,
    pending: PendingLoad,
    disposed: Arc<AtomicBool>,
}

impl ModelLoader {
    pub fn new(url: impl Into<String>, status: LoadStatusChannel, disposed: Arc<AtomicBool>) -> Self {
        Self {
            url: url.into(),
            status,
            pending: PendingLoad::default(),
            disposed,
        }
    }

    pub fn url(&self) -> &str {
        &self.url
    }

    /// Publish `loading` and spawn the fetch without blocking
    pub fn start<F: PayloadFetcher>(
        &self,
        fetcher: Arc<F>,
        deserializer: Arc<dyn SceneDeserializer>,
        runtime: &Handle,
    ) -> LoadTask {
        self.status.publish(LoadStatus::Loading);

        let url = self.url.clone();
        let pending = self.pending.clone();
        let disposed = self.disposed.clone();
        let task_url = url.clone();
        let handle = runtime.spawn(async move {
            match run_load(fetcher.as_ref(), deserializer, &task_url, &disposed).await {
                Ok(Some(outcome)) => {
                    let report = match &outcome {
                        LoadOutcome::Built(subtree) => LoadReport::Built {
                            nodes: subtree.node_count(),
                        },
                        _ => LoadReport::NoDescription,
                    };
                    pending.put(outcome);
                    Ok(report)
                }
                Ok(None) => Ok(LoadReport::Cancelled),
                Err(e) => {
                    pending.put(LoadOutcome::Failed(e.to_string()));
                    Err(e)
                }
            }
        });
        LoadTask { url, handle }
    }

    /// Drain the finished load, if any
    pub fn take_pending(&self) -> Option<LoadOutcome> {
        self.pending.take()
    }
}

/// Fetch and build; `Ok(None)` when the viewer went away mid-load
async fn run_load<F: PayloadFetcher>(
    fetcher: &F,
    deserializer: Arc<dyn SceneDeserializer>,
    url: &str,
    disposed: &AtomicBool,
) -> Result<Option<LoadOutcome>, LoadError> {
    let payload = fetcher.fetch(url).await.inspect_err(|e| {
        warn!(url = %url, error = %e, "Model fetch failed");
    })?;

    if disposed.load(Ordering::Acquire) {
        debug!(url = %url, "Viewer disposed during fetch, dropping payload");
        return Ok(None);
    }

    let Some(description) = find_scene_description(&payload) else {
        warn!(url = %url, "Payload holds no scene description, nothing to show");
        return Ok(Some(LoadOutcome::NoDescription));
    };

    let subtree = tokio::task::spawn_blocking(move || deserializer.build(&description))
        .await
        .map_err(|e| LoadError::Aborted(e.to_string()))??;

    info!(url = %url, nodes = subtree.node_count(), "Built model");
    Ok(Some(LoadOutcome::Built(subtree)))
}
