//! Error handling and custom error types
//!
//! Provides the crate-wide error type plus the user-facing error taxonomy
//! that handlers produce at their boundary.

use serde::Serialize;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum Error {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("HTTP request error: {0}")]
    Http(#[from] reqwest::Error),

    #[error("AI provider error: {0}")]
    AiProvider(String),

    #[error("Invariant violation: {0}")]
    Invariant(String),

    #[error("Generic error: {0}")]
    Generic(String),
}

pub type Result<T> = std::result::Result<T, Error>;

/// Stable category a failed user action resolves to.
///
/// Upstream failures arrive as free-form message strings; everything the UI
/// or HTTP layer needs to know is collapsed into one of these.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorCategory {
    InvalidCredential,
    PermissionDenied,
    QuotaExceeded,
    BillingIssue,
    ConfigurationError,
    InvalidInput,
    Unknown,
}

/// Classified failure surfaced once to the caller and then discarded.
#[derive(Debug, Clone)]
pub struct ErrorReport {
    pub category: ErrorCategory,
    pub human_message: String,
}

impl ErrorReport {
    pub fn invalid_input(message: impl Into<String>) -> Self {
        Self {
            category: ErrorCategory::InvalidInput,
            human_message: message.into(),
        }
    }

    pub fn not_configured() -> Self {
        Self {
            category: ErrorCategory::ConfigurationError,
            human_message:
                "Gemini API key not configured. Please add GEMINI_API_KEY to your environment."
                    .to_string(),
        }
    }

    /// Classify an upstream provider failure into a stable category.
    ///
    /// The provider has no typed error channel; matching is case-insensitive
    /// substring search over the raw message. Unmatched messages keep their
    /// original text so diagnostics survive the classification.
    pub fn from_provider(raw: &str) -> Self {
        let category = classify(raw);
        let human_message = match category {
            ErrorCategory::InvalidCredential => {
                "Invalid API key. Please check your Gemini API key.".to_string()
            }
            ErrorCategory::PermissionDenied => {
                "Permission denied. Please check your API key permissions and ensure the Gemini API is enabled."
                    .to_string()
            }
            ErrorCategory::QuotaExceeded => {
                "API quota exceeded. Please check your usage limits in Google AI Studio."
                    .to_string()
            }
            ErrorCategory::BillingIssue => {
                "Billing issue detected. Please check your payment settings in Google AI Studio."
                    .to_string()
            }
            _ => raw.to_string(),
        };

        Self {
            category,
            human_message,
        }
    }
}

impl From<&Error> for ErrorReport {
    fn from(error: &Error) -> Self {
        match error {
            Error::AiProvider(raw) => Self::from_provider(raw),
            other => Self::from_provider(&other.to_string()),
        }
    }
}

/// Substring rules shared by every handler.
///
/// Match order is fixed: credential problems first, then permissions, quota,
/// billing. A message matching none of the rules is `Unknown`.
fn classify(raw: &str) -> ErrorCategory {
    let message = raw.to_lowercase();

    if message.contains("api_key_invalid") || message.contains("invalid api key") {
        ErrorCategory::InvalidCredential
    } else if message.contains("permission_denied")
        || message.contains("permission")
        || message.contains("denied")
    {
        ErrorCategory::PermissionDenied
    } else if message.contains("quota") || message.contains("limit") || message.contains("exceeded")
    {
        ErrorCategory::QuotaExceeded
    } else if message.contains("billing") || message.contains("payment") {
        ErrorCategory::BillingIssue
    } else {
        ErrorCategory::Unknown
    }
}
