//! Image damage analysis: a two-stage generation pipeline.
//!
//! Stage 1 describes the damage visible in the uploaded image; stage 2 turns
//! that description into a prevention plan. The stages are strictly
//! sequential and dependent — stage 2 consumes stage 1's output verbatim,
//! and a failure at either stage aborts the whole analysis.

use crate::ai::{GenerationService, PromptPart};
use crate::error::ErrorReport;
use crate::models::AnalysisResult;
use crate::prompts;
use std::sync::Arc;

#[derive(Clone)]
pub struct DamageAnalysisHandler {
    service: Option<Arc<dyn GenerationService>>,
}

impl DamageAnalysisHandler {
    pub fn new(service: Arc<dyn GenerationService>) -> Self {
        Self {
            service: Some(service),
        }
    }

    pub fn unconfigured() -> Self {
        Self { service: None }
    }

    /// Run the analysis pipeline over one image.
    ///
    /// The declared MIME type is forwarded as-is, never re-validated against
    /// the image bytes. A stage-2 failure discards the stage-1 text; there
    /// is no partial result.
    pub async fn handle(
        &self,
        image: &[u8],
        mime_type: &str,
    ) -> Result<AnalysisResult, ErrorReport> {
        if image.is_empty() {
            return Err(ErrorReport::invalid_input("No image file provided"));
        }

        let service = self
            .service
            .as_ref()
            .ok_or_else(ErrorReport::not_configured)?;

        tracing::debug!(
            "Analyzing image ({} bytes, declared type {})",
            image.len(),
            mime_type
        );

        let damage_analysis = self.describe_damage(service, image, mime_type).await?;
        let prevention_instructions = self.plan_prevention(service, &damage_analysis).await?;

        Ok(AnalysisResult {
            damage_analysis,
            prevention_instructions,
        })
    }

    /// Stage 1: fixed analysis prompt plus the inlined image.
    async fn describe_damage(
        &self,
        service: &Arc<dyn GenerationService>,
        image: &[u8],
        mime_type: &str,
    ) -> Result<String, ErrorReport> {
        let parts = [
            PromptPart::text(prompts::DAMAGE_ANALYSIS),
            PromptPart::image(image.to_vec(), mime_type),
        ];

        service.generate(&parts).await.map_err(|e| {
            let report = ErrorReport::from(&e);
            tracing::warn!(
                category = ?report.category,
                "Damage description failed: {}",
                e
            );
            report
        })
    }

    /// Stage 2: prevention template interpolated with the stage-1 output
    /// verbatim (no sanitization of the generated text).
    async fn plan_prevention(
        &self,
        service: &Arc<dyn GenerationService>,
        damage_analysis: &str,
    ) -> Result<String, ErrorReport> {
        let prompt = prompts::render(prompts::PREVENTION, &[("analysis", damage_analysis)]);

        service
            .generate(&[PromptPart::text(prompt)])
            .await
            .map_err(|e| {
                let report = ErrorReport::from(&e);
                tracing::warn!(
                    category = ?report.category,
                    "Prevention planning failed: {}",
                    e
                );
                report
            })
    }
}
