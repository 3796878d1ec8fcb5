//! Chat request handling: one user message in, one generated reply out.

use crate::ai::{GenerationService, PromptPart};
use crate::error::ErrorReport;
use std::sync::Arc;

/// Stateless chat handler; safe to call concurrently for independent
/// messages.
#[derive(Clone)]
pub struct ChatHandler {
    service: Option<Arc<dyn GenerationService>>,
}

impl ChatHandler {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    /// Handler for a deployment without a configured credential; every
    /// request fails with a configuration error, checked before any call.
    pub fn unconfigured() -> Self {
        Self { service: None }
    }

    /// Issue exactly one generation call with the raw message as prompt.
    ///
    /// The generated text is returned verbatim: no post-processing and no
    /// truncation.
    pub async fn handle(&self, message: &str) -> Result<String, ErrorReport> {
        if message.is_empty() {
            return Err(ErrorReport::invalid_input("Message is required"));
        }

        let service = self
            .service
            .as_ref()
            .ok_or_else(ErrorReport::not_configured)?;

        tracing::debug!("Dispatching chat message ({} chars)", message.len());

        service
            .generate(&[PromptPart::text(message)])
            .await
            .map_err(|e| {
                let report = ErrorReport::from(&e);
                tracing::warn!(
                    category = ?report.category,
                    "Chat generation failed: {}",
                    e
                );
                report
            })
    }
}
