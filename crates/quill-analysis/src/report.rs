//! Analysis report types

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

/// A flagged text segment matching an external source
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MatchSegment {
    /// The matched text span
    pub text: String,
    /// Similarity to the source, 0.0..=1.0
    pub similarity: f64,
    /// Where the match was found
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub source: Option<String>,
}

/// Full analysis report returned by the remote endpoint
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Report {
    /// Share of the text considered original, 0.0..=1.0
    pub originality: f64,
    /// Flagged segments, ordered by position in the input
    #[serde(default)]
    pub matches: Vec<MatchSegment>,
    /// Number of words scanned
    pub word_count: u32,
    /// When the scan finished
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Report {
    /// Whether the scan flagged anything at all
    pub fn has_matches(&self) -> bool {
        !self.matches.is_empty()
    }
}
