//! AI service integration
//!
//! Exposes the single narrow capability the rest of the crate depends on:
//! one generation call producing text from a prompt, optionally with an
//! attached image. Error classification and prompt templates are unit-tested
//! against the mock implementation without network access.

pub mod gemini;
pub mod mime;
pub mod mock;

pub use gemini::GeminiGenerationClient;
pub use mock::MockGenerationClient;

use crate::Result;
use async_trait::async_trait;

/// One piece of a generation prompt, in provider-neutral form.
#[derive(Debug, Clone)]
pub enum PromptPart {
    Text(String),
    Image { data: Vec<u8>, mime_type: String },
}

impl PromptPart {
    pub fn text(text: impl Into<String>) -> Self {
        Self::Text(text.into())
    }

    pub fn image(data: Vec<u8>, mime_type: impl Into<String>) -> Self {
        Self::Image {
            data,
            mime_type: mime_type.into(),
        }
    }
}

#[async_trait]
pub trait GenerationService: Send + Sync {
    /// Issue one generation round trip; failures carry the provider's raw
    /// message for downstream classification.
    async fn generate(&self, parts: &[PromptPart]) -> Result<String>;
}
