//! Analysis check coordination
//!
//! De-duplicates and caches analysis requests keyed by normalized input
//! text. At most one request is outstanding per coordinator at a time;
//! starting a new one supersedes (cancels) the previous, and a superseded
//! request's resolution is discarded rather than applied.

use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use parking_lot::Mutex;
use tokio_util::sync::CancellationToken;

use crate::cache::{ReportCache, normalize_key};
use crate::error::Error;
use crate::host::HostNotifier;
use crate::report::Report;
use crate::transport::AnalysisTransport;

/// Options for a single check
#[derive(Debug, Clone, Copy, Default)]
pub struct CheckOptions {
    /// Bypass the cache and supersede any in-flight request
    pub force_refresh: bool,
}

/// Caller-facing check state
#[derive(Debug, Clone, Default)]
pub struct CheckState {
    /// Whether a request is being processed
    pub loading: bool,
    /// The most recent successful report, if any
    pub report: Option<Report>,
    /// User-facing message for the most recent failure, if any
    pub error: Option<String>,
    /// Whether `report` came from the cache rather than a fresh request
    pub from_cache: bool,
}

/// The single-slot current-operation token
struct InFlight {
    generation: u64,
    token: CancellationToken,
}

/// Coordinates analysis checks against a remote endpoint
pub struct AnalysisCoordinator {
    transport: Arc<dyn AnalysisTransport>,
    cache: Arc<dyn ReportCache>,
    host: Arc<dyn HostNotifier>,
    state: Mutex<CheckState>,
    in_flight: Mutex<Option<InFlight>>,
    generation: AtomicU64,
}

impl AnalysisCoordinator {
    /// Create a coordinator over its collaborators
    pub fn new(
        transport: Arc<dyn AnalysisTransport>,
        cache: Arc<dyn ReportCache>,
        host: Arc<dyn HostNotifier>,
    ) -> Self {
        Self {
            transport,
            cache,
            host,
            state: Mutex::new(CheckState::default()),
            in_flight: Mutex::new(None),
            generation: AtomicU64::new(0),
        }
    }

    /// Snapshot of the current check state
    pub fn state(&self) -> CheckState {
        self.state.lock().clone()
    }

    /// Clear loading/report/error back to idle. The underlying cache is
    /// left untouched.
    pub fn reset(&self) {
        *self.state.lock() = CheckState::default();
    }

    /// Force a fresh check, bypassing the cache
    pub async fn manual_refresh(&self, text: &str) {
        self.trigger_check(text, CheckOptions { force_refresh: true })
            .await;
    }

    /// Run a check for the given text.
    ///
    /// Empty (whitespace-only) text cancels any in-flight request and
    /// resets to idle. Without `force_refresh`, an in-flight request makes
    /// this a no-op and a cache hit is adopted synchronously with no
    /// network call. Otherwise exactly one cancellable request is issued;
    /// a resolution that arrives after being superseded is discarded.
    pub async fn trigger_check(&self, text: &str, options: CheckOptions) {
        let key = normalize_key(text);

        if key.is_empty() {
            self.cancel_in_flight();
            *self.state.lock() = CheckState::default();
            return;
        }

        if !options.force_refresh {
            if self.in_flight.lock().is_some() {
                return;
            }
            if let Some(report) = self.cache.get(&key) {
                *self.state.lock() = CheckState {
                    loading: false,
                    report: Some(report),
                    error: None,
                    from_cache: true,
                };
                return;
            }
        }

        // Supersede any outstanding request before issuing a new one
        let token = CancellationToken::new();
        let generation = self.generation.fetch_add(1, Ordering::Relaxed) + 1;
        {
            let mut slot = self.in_flight.lock();
            if let Some(previous) = slot.take() {
                previous.token.cancel();
            }
            *slot = Some(InFlight {
                generation,
                token: token.clone(),
            });
        }
        self.state.lock().loading = true;

        let outcome = self.transport.analyze(text, token).await;

        // A resolution whose generation no longer matches the slot is stale
        {
            let mut slot = self.in_flight.lock();
            match slot.as_ref() {
                Some(current) if current.generation == generation => {
                    *slot = None;
                }
                _ => {
                    tracing::debug!("discarding superseded analysis resolution");
                    return;
                }
            }
        }

        match outcome {
            Ok(report) => {
                self.cache.set(&key, report.clone());
                *self.state.lock() = CheckState {
                    loading: false,
                    report: Some(report),
                    error: None,
                    from_cache: false,
                };
            }
            Err(Error::Aborted) => {
                // Cancellation is not an error; the in-flight slot is
                // already cleared and state belongs to whoever cancelled us
            }
            Err(err) => {
                let message = err.user_message();
                if err.is_unauthorized() {
                    self.host.show_login_prompt();
                } else if err.is_quota() {
                    self.host.show_quota_alert(&message);
                }
                self.host.show_toast(&message);

                let mut state = self.state.lock();
                state.loading = false;
                state.error = Some(message);
                // The last good report stays visible
            }
        }
    }

    fn cancel_in_flight(&self) {
        if let Some(previous) = self.in_flight.lock().take() {
            previous.token.cancel();
        }
    }
}
