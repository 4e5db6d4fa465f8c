//! Error types for quill-analysis

use regex::Regex;
use std::sync::LazyLock;
use thiserror::Error;

/// Result type alias using quill-analysis Error
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur when talking to the analysis service
#[derive(Error, Debug)]
pub enum Error {
    /// HTTP request failed
    #[error("HTTP error: {0}")]
    Http(#[from] reqwest::Error),

    /// JSON serialization/deserialization failed
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    /// API returned an error response
    #[error("API error: {message} (type: {error_type})")]
    Api { error_type: String, message: String },

    /// Authentication required or rejected
    #[error("Authentication required")]
    Unauthorized,

    /// Usage quota exhausted
    #[error("Quota exceeded: {message}")]
    QuotaExceeded { message: String },

    /// Request was aborted
    #[error("Request aborted")]
    Aborted,
}

/// Patterns for quota/rate-limit phrasing buried in API error strings
static QUOTA_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)quota.?(exceed|exhaust|reach)",
        r"(?i)usage.?limit",
        r"(?i)out.?of.?credits",
        r"(?i)plan.?limit",
        r"(?i)word.?limit",
        r"(?i)too.?many.?requests",
        r"\b402\b",
        r"\b429\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

/// Patterns for authentication failures embedded in API error strings
static AUTH_PATTERNS: LazyLock<Vec<Regex>> = LazyLock::new(|| {
    [
        r"(?i)unauthori[sz]ed",
        r"(?i)invalid.?(token|session|credentials)",
        r"(?i)not.?(signed|logged).?in",
        r"(?i)session.?expired",
        r"\b401\b",
        r"\b403\b",
    ]
    .iter()
    .filter_map(|p| Regex::new(p).ok())
    .collect()
});

impl Error {
    /// Create an API error from type and message
    pub fn api(error_type: impl Into<String>, message: impl Into<String>) -> Self {
        Self::Api {
            error_type: error_type.into(),
            message: message.into(),
        }
    }

    /// Check if this error means the user must sign in
    pub fn is_unauthorized(&self) -> bool {
        match self {
            Error::Unauthorized => true,
            Error::Api {
                error_type,
                message,
            } => AUTH_PATTERNS
                .iter()
                .any(|re| re.is_match(error_type) || re.is_match(message)),
            _ => false,
        }
    }

    /// Check if this error indicates an exhausted usage quota
    pub fn is_quota(&self) -> bool {
        match self {
            Error::QuotaExceeded { .. } => true,
            Error::Api {
                error_type,
                message,
            } => QUOTA_PATTERNS
                .iter()
                .any(|re| re.is_match(error_type) || re.is_match(message)),
            _ => false,
        }
    }

    /// Check if this error is a cancellation
    pub fn is_aborted(&self) -> bool {
        matches!(self, Error::Aborted)
    }

    /// The user-facing message for this failure
    pub fn user_message(&self) -> String {
        if self.is_unauthorized() {
            return "Please sign in to run a check.".to_string();
        }
        match self {
            Error::QuotaExceeded { message } if !message.trim().is_empty() => message.clone(),
            _ if self.is_quota() => "You have reached your usage limit.".to_string(),
            Error::Api { message, .. } => message.clone(),
            _ => "Something went wrong. Please try again.".to_string(),
        }
    }
}
