//! quill-analysis: de-duplicated, cached text-analysis coordination
//!
//! This crate coordinates expensive text-analysis checks against a remote
//! service: input text is normalized into a cache key, cache hits are
//! adopted without touching the network, and at most one cancellable
//! request is in flight at a time. Superseded requests are cancelled and
//! their resolutions discarded. Transport, cache, and host-notification
//! side effects are pluggable collaborators.

pub mod cache;
pub mod config;
pub mod coordinator;
pub mod error;
pub mod host;
pub mod report;
pub mod transport;

pub use cache::{InMemoryCache, ReportCache, normalize_key};
pub use config::Config;
pub use coordinator::{AnalysisCoordinator, CheckOptions, CheckState};
pub use error::{Error, Result};
pub use host::{HostNotifier, NullNotifier};
pub use report::{MatchSegment, Report};
pub use transport::{AnalysisTransport, HttpAnalysisTransport};
