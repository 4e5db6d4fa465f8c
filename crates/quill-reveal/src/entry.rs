//! Log entry types and identity derivation

use chrono::{DateTime, Utc};
use serde::{Deserialize, Deserializer, Serialize};

/// Number of payload characters folded into an entry's identity.
const IDENTITY_HEAD_CHARS: usize = 50;

/// Session-level status carried alongside log entries
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SessionStatus {
    Processing,
    Completed,
    Failed,
}

impl SessionStatus {
    /// Check if this status ends the run
    pub fn is_terminal(&self) -> bool {
        matches!(self, SessionStatus::Completed | SessionStatus::Failed)
    }
}

/// Payload of a log entry: literal text or a structured object
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum Payload {
    /// Plain text, eligible for a typing reveal
    Text(String),
    /// Structured data, revealed atomically
    Data(serde_json::Value),
}

impl Payload {
    /// Whether this payload may be surfaced at all.
    /// Empty text and empty objects/arrays are dropped at ingestion.
    pub fn is_displayable(&self) -> bool {
        match self {
            Payload::Text(text) => !text.trim().is_empty(),
            Payload::Data(value) => match value {
                serde_json::Value::Object(map) => !map.is_empty(),
                serde_json::Value::Array(items) => !items.is_empty(),
                _ => false,
            },
        }
    }

    /// Whether this payload is eligible for a typing reveal
    pub fn is_animatable(&self) -> bool {
        matches!(self, Payload::Text(_))
    }

    fn identity_text(&self) -> String {
        match self {
            Payload::Text(text) => text.clone(),
            Payload::Data(value) => value.to_string(),
        }
    }
}

/// One unit of agent output delivered by the log source
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LogEntry {
    /// Producer identifier
    pub agent: String,
    /// Emission time; falls back to "now" when absent or unparseable
    #[serde(default = "Utc::now", deserialize_with = "timestamp_or_now")]
    pub timestamp: DateTime<Utc>,
    /// Entry payload
    pub payload: Payload,
    /// Session status carried alongside this entry, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<SessionStatus>,
}

impl LogEntry {
    /// Create a text entry stamped "now"
    pub fn text(agent: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            agent: agent.into(),
            timestamp: Utc::now(),
            payload: Payload::Text(text.into()),
            status: None,
        }
    }

    /// Create a structured-data entry stamped "now"
    pub fn data(agent: impl Into<String>, value: serde_json::Value) -> Self {
        Self {
            agent: agent.into(),
            timestamp: Utc::now(),
            payload: Payload::Data(value),
            status: None,
        }
    }

    /// Attach an explicit session status
    pub fn with_status(mut self, status: SessionStatus) -> Self {
        self.status = Some(status);
        self
    }

    /// Derive the identity of this entry at position `index` in its
    /// (filtered) snapshot. Identical data at the same position yields the
    /// same identity across re-ingestion and remounts.
    pub fn identity(&self, index: usize) -> EntryIdentity {
        let head: String = self
            .payload
            .identity_text()
            .chars()
            .take(IDENTITY_HEAD_CHARS)
            .collect();
        EntryIdentity(format!(
            "{}|{}|{}|{}",
            self.agent,
            self.timestamp.timestamp_millis(),
            index,
            head
        ))
    }
}

/// De-duplication identity derived from agent, timestamp, position, and a
/// payload prefix
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct EntryIdentity(String);

impl std::fmt::Display for EntryIdentity {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(&self.0)
    }
}

fn timestamp_or_now<'de, D>(deserializer: D) -> Result<DateTime<Utc>, D::Error>
where
    D: Deserializer<'de>,
{
    // Anything that is not an RFC 3339 string falls back to "now"
    let raw = serde_json::Value::deserialize(deserializer)?;
    Ok(raw
        .as_str()
        .and_then(|s| DateTime::parse_from_rfc3339(s).ok())
        .map(|t| t.with_timezone(&Utc))
        .unwrap_or_else(Utc::now))
}
