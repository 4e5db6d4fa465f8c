//! Log source collaborators
//!
//! The animator consumes wholesale snapshots; where they come from is the
//! source's concern. Two implementations ship here: an HTTP polling source
//! that re-fetches the full list, and an SSE source that accumulates
//! server-pushed entries into a growing snapshot.

use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use futures::StreamExt;
use parking_lot::Mutex;
use reqwest_eventsource::{Event, EventSource};
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tokio_stream::Stream;
use tokio_util::sync::CancellationToken;

use crate::animator::LogAnimator;
use crate::entry::LogEntry;

/// One snapshot of the backend's log list: the full list so far, replacing
/// any previous snapshot wholesale
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LogSnapshot {
    /// All entries delivered so far, in arrival order
    pub entries: Vec<LogEntry>,
    /// Whether the backend is still producing entries
    #[serde(default)]
    pub is_loading: bool,
}

/// Errors surfaced by log sources
#[derive(Error, Debug)]
pub enum SourceError {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// Server-sent events error
    #[error("SSE error: {0}")]
    Sse(String),
}

impl SourceError {
    /// Check if this error is worth retrying
    pub fn is_retryable(&self) -> bool {
        matches!(self, SourceError::Http(_) | SourceError::Sse(_))
    }
}

/// Retry configuration for log fetches
#[derive(Debug, Clone)]
pub struct RetryConfig {
    /// Maximum number of retry attempts
    pub max_retries: u32,
    /// Initial delay between retries
    pub initial_delay: Duration,
    /// Maximum delay between retries
    pub max_delay: Duration,
    /// Multiplier for exponential backoff
    pub backoff_multiplier: f64,
}

impl Default for RetryConfig {
    fn default() -> Self {
        Self {
            max_retries: 3,
            initial_delay: Duration::from_secs(1),
            max_delay: Duration::from_secs(30),
            backoff_multiplier: 2.0,
        }
    }
}

impl RetryConfig {
    /// Calculate delay for a given attempt (0-indexed)
    pub fn delay_for_attempt(&self, attempt: u32) -> Duration {
        let delay_secs =
            self.initial_delay.as_secs_f64() * self.backoff_multiplier.powi(attempt as i32);
        Duration::from_secs_f64(delay_secs.min(self.max_delay.as_secs_f64()))
    }
}

/// Supplier of log snapshots
#[async_trait]
pub trait LogSource: Send + Sync {
    /// Fetch the current snapshot
    async fn fetch(&self) -> Result<LogSnapshot, SourceError>;
}

/// Polling source that re-fetches the full snapshot over HTTP
pub struct HttpLogSource {
    client: reqwest::Client,
    url: String,
    retry: RetryConfig,
}

impl HttpLogSource {
    /// Create a new polling source for a snapshot endpoint
    pub fn new(url: impl Into<String>) -> Self {
        Self {
            client: reqwest::Client::new(),
            url: url.into(),
            retry: RetryConfig::default(),
        }
    }

    /// Set retry configuration
    pub fn with_retry_config(mut self, retry: RetryConfig) -> Self {
        self.retry = retry;
        self
    }

    async fn fetch_once(&self) -> Result<LogSnapshot, SourceError> {
        let response = self
            .client
            .get(&self.url)
            .send()
            .await?
            .error_for_status()?;
        Ok(response.json::<LogSnapshot>().await?)
    }
}

#[async_trait]
impl LogSource for HttpLogSource {
    async fn fetch(&self) -> Result<LogSnapshot, SourceError> {
        let mut attempt = 0u32;
        loop {
            match self.fetch_once().await {
                Ok(snapshot) => return Ok(snapshot),
                Err(e) if attempt < self.retry.max_retries && e.is_retryable() => {
                    let delay = self.retry.delay_for_attempt(attempt);
                    tracing::warn!(
                        "Log fetch failed (attempt {}/{}): {}. Retrying in {:?}...",
                        attempt + 1,
                        self.retry.max_retries + 1,
                        e,
                        delay
                    );
                    attempt += 1;
                    tokio::time::sleep(delay).await;
                }
                Err(e) => return Err(e),
            }
        }
    }
}

#[derive(Default)]
struct SseState {
    entries: Vec<LogEntry>,
    is_loading: bool,
    failed: Option<String>,
}

/// SSE source that accumulates pushed entries into a growing snapshot.
///
/// Each `fetch()` returns the state accumulated so far; the backing
/// subscription runs until the server signals completion or retries are
/// exhausted.
pub struct SseLogSource {
    state: Arc<Mutex<SseState>>,
}

impl SseLogSource {
    /// Subscribe to an SSE log endpoint and start accumulating
    pub fn connect(url: impl Into<String>) -> Result<Self, SourceError> {
        let url = url.into();
        let request = reqwest::Client::new().get(&url);
        let event_source = EventSource::new(request)
            .map_err(|e| SourceError::Sse(format!("Failed to create event source: {e}")))?;

        let state = Arc::new(Mutex::new(SseState {
            is_loading: true,
            ..SseState::default()
        }));
        tokio::spawn(run_subscription(
            event_source,
            Arc::clone(&state),
            RetryConfig::default(),
        ));

        Ok(Self { state })
    }
}

#[async_trait]
impl LogSource for SseLogSource {
    async fn fetch(&self) -> Result<LogSnapshot, SourceError> {
        let state = self.state.lock();
        if let Some(ref message) = state.failed {
            return Err(SourceError::Sse(message.clone()));
        }
        Ok(LogSnapshot {
            entries: state.entries.clone(),
            is_loading: state.is_loading,
        })
    }
}

async fn run_subscription(
    mut event_source: EventSource,
    state: Arc<Mutex<SseState>>,
    retry: RetryConfig,
) {
    let mut consecutive_errors = 0u32;

    while let Some(event) = event_source.next().await {
        match event {
            Ok(Event::Open) => {
                consecutive_errors = 0;
            }
            Ok(Event::Message(message)) => {
                consecutive_errors = 0;
                match message.event.as_str() {
                    "log" | "message" => {
                        match serde_json::from_str::<LogEntry>(&message.data) {
                            Ok(entry) => state.lock().entries.push(entry),
                            Err(e) => {
                                tracing::debug!("dropping unparseable log event: {e}");
                            }
                        }
                    }
                    "done" => {
                        state.lock().is_loading = false;
                        event_source.close();
                        return;
                    }
                    _ => {}
                }
            }
            Err(e) => {
                if consecutive_errors >= retry.max_retries {
                    let mut state = state.lock();
                    state.failed = Some(e.to_string());
                    state.is_loading = false;
                    event_source.close();
                    return;
                }
                let delay = retry.delay_for_attempt(consecutive_errors);
                tracing::warn!(
                    "SSE stream error (attempt {}/{}): {}. Retrying in {:?}...",
                    consecutive_errors + 1,
                    retry.max_retries + 1,
                    e,
                    delay
                );
                consecutive_errors += 1;
                tokio::time::sleep(delay).await;
            }
        }
    }
}

/// A stream of log snapshots
pub type SnapshotStream = Pin<Box<dyn Stream<Item = LogSnapshot> + Send>>;

/// Poll a source on a fixed interval, yielding each snapshot until the
/// backend settles or the token is cancelled. Fetch errors are logged and
/// retried on the next tick.
pub fn snapshot_stream(
    source: Arc<dyn LogSource>,
    interval: Duration,
    cancel: CancellationToken,
) -> SnapshotStream {
    Box::pin(async_stream::stream! {
        loop {
            tokio::select! {
                _ = cancel.cancelled() => return,
                _ = tokio::time::sleep(interval) => {}
            }
            match source.fetch().await {
                Ok(snapshot) => {
                    let settled = !snapshot.is_loading;
                    yield snapshot;
                    if settled {
                        return;
                    }
                }
                Err(e) => tracing::warn!("Log source fetch failed: {e}"),
            }
        }
    })
}

/// Headless driver: feed each snapshot into the animator, acknowledging
/// typing reveals immediately (no animation to wait for), until the run
/// reaches a terminal status or the stream ends.
pub async fn drive(animator: &mut LogAnimator, mut snapshots: SnapshotStream) {
    while let Some(snapshot) = snapshots.next().await {
        animator.ingest(snapshot.entries, snapshot.is_loading).await;
        while animator.typing_index().is_some() {
            animator.complete_typing().await;
        }
        if animator.status().is_terminal() {
            return;
        }
    }
}
