//! quill-reveal: incremental reveal of streamed agent logs
//!
//! This crate provides the client-side state machine that turns a
//! monotonically-growing list of agent log entries into an ordered reveal
//! sequence: each new entry is shown exactly once via a typing animation
//! contract, already-seen entries render statically, and a terminal session
//! status flushes whatever is left. Log sources (HTTP polling, SSE) and the
//! animated-marker store are pluggable collaborators.

pub mod animator;
pub mod entry;
pub mod events;
pub mod marker;
pub mod source;

pub use animator::{LogAnimator, RevealConfig, RevealedEntry};
pub use entry::{EntryIdentity, LogEntry, Payload, SessionStatus};
pub use events::RevealEvent;
pub use marker::{AnimatedMarker, InMemoryMarker};
pub use source::{
    HttpLogSource, LogSnapshot, LogSource, RetryConfig, SnapshotStream, SourceError,
    SseLogSource, drive, snapshot_stream,
};
