//! Data models and structures
//!
//! Defines the session message log entries, analysis results, and runtime
//! configuration.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Author {
    User,
    Assistant,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "kebab-case")]
pub enum MessageKind {
    Plain,
    DamageReport,
}

/// One entry in the session log.
///
/// Messages are immutable once appended and live only for the session; a
/// damage-report pair (user upload + assistant result) is always appended
/// together.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Message {
    pub id: i64,
    pub text: String,
    pub author: Author,
    pub timestamp: DateTime<Utc>,
    pub kind: MessageKind,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub damage_analysis: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub prevention_instructions: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub image_ref: Option<Uuid>,
}

impl Message {
    pub fn plain(id: i64, author: Author, text: impl Into<String>) -> Self {
        Self {
            id,
            text: text.into(),
            author,
            timestamp: Utc::now(),
            kind: MessageKind::Plain,
            damage_analysis: None,
            prevention_instructions: None,
            image_ref: None,
        }
    }
}

/// Image captured from the UI, addressed by an opaque handle.
#[derive(Debug, Clone)]
pub struct ImageAttachment {
    pub id: Uuid,
    pub data: Vec<u8>,
    pub mime_type: String,
}

impl ImageAttachment {
    pub fn new(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            data,
            mime_type: mime_type.into(),
        }
    }
}

/// Transient value returned by the damage-analysis handler, folded into a
/// [`Message`] pair and then discarded.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AnalysisResult {
    pub damage_analysis: String,
    pub prevention_instructions: String,
}

// Configuration
#[derive(Debug, Clone)]
pub struct Config {
    /// Absent key is not a startup error; requests fail with a
    /// configuration error instead, so the server stays up for diagnostics.
    pub gemini_api_key: Option<String>,
    pub gemini_model: String,
    pub server_bind: String,
}

impl Config {
    pub fn from_env() -> Self {
        dotenvy::dotenv().ok();

        Self {
            gemini_api_key: std::env::var("GEMINI_API_KEY")
                .ok()
                .filter(|key| !key.trim().is_empty()),
            gemini_model: std::env::var("GEMINI_MODEL")
                .unwrap_or_else(|_| "gemini-1.5-flash".to_string()),
            server_bind: std::env::var("SERVER_BIND")
                .unwrap_or_else(|_| "127.0.0.1:8080".to_string()),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_message_serialization_uses_camel_case() {
        let mut message = Message::plain(1, Author::Assistant, "Cracks detected");
        message.kind = MessageKind::DamageReport;
        message.damage_analysis = Some("Cracks detected".to_string());
        message.prevention_instructions = Some("Seal cracks promptly".to_string());

        let json = serde_json::to_string(&message).unwrap();
        assert!(json.contains("\"author\":\"assistant\""));
        assert!(json.contains("\"kind\":\"damage-report\""));
        assert!(json.contains("\"damageAnalysis\""));
        assert!(json.contains("\"preventionInstructions\""));
    }

    #[test]
    fn test_plain_message_omits_analysis_fields() {
        let message = Message::plain(1, Author::User, "Hello");
        let json = serde_json::to_string(&message).unwrap();
        assert!(!json.contains("damageAnalysis"));
        assert!(!json.contains("imageRef"));
    }

    #[test]
    fn test_attachments_get_distinct_handles() {
        let a = ImageAttachment::new(vec![1], "image/png");
        let b = ImageAttachment::new(vec![1], "image/png");
        assert_ne!(a.id, b.id);
    }
}
