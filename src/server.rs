//! HTTP endpoints for the chat and damage-analysis handlers.

use crate::ai::{mime, GeminiGenerationClient, GenerationService};
use crate::analysis::DamageAnalysisHandler;
use crate::chat::ChatHandler;
use crate::error::{ErrorCategory, ErrorReport};
use crate::models::Config;
use axum::{
    extract::{DefaultBodyLimit, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tower_http::limit::RequestBodyLimitLayer;
use tracing::info;

const MAX_UPLOAD_BYTES: usize = 8 * 1024 * 1024;

#[derive(Clone)]
pub struct AppState {
    pub chat: ChatHandler,
    pub analysis: DamageAnalysisHandler,
}

impl AppState {
    /// Wire both handlers to one shared Gemini client, or leave them
    /// unconfigured so requests fail with a configuration error instead of
    /// refusing to start.
    pub fn from_config(config: &Config) -> Self {
        match &config.gemini_api_key {
            Some(key) => {
                info!("Generation provider: Gemini (model: {})", config.gemini_model);
                Self::with_service(Arc::new(GeminiGenerationClient::new(
                    key.clone(),
                    config.gemini_model.clone(),
                )))
            }
            None => {
                tracing::warn!(
                    "GEMINI_API_KEY not set; requests will fail with a configuration error"
                );
                Self {
                    chat: ChatHandler::unconfigured(),
                    analysis: DamageAnalysisHandler::unconfigured(),
                }
            }
        }
    }

    pub fn with_service(service: Arc<dyn GenerationService>) -> Self {
        Self {
            chat: ChatHandler::new(service.clone()),
            analysis: DamageAnalysisHandler::new(service),
        }
    }
}

#[derive(Debug, Deserialize)]
struct ChatRequest {
    #[serde(default)]
    message: Option<String>,
}

#[derive(Debug, Serialize)]
struct ChatResponse {
    response: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct AnalyzeResponse {
    damage_analysis: String,
    prevention_instructions: String,
    success: bool,
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/healthz", get(healthz))
        .route("/api/chat", post(chat_submit))
        .route("/api/analyze-damage", post(analyze_damage))
        .layer(DefaultBodyLimit::disable())
        .layer(RequestBodyLimitLayer::new(MAX_UPLOAD_BYTES))
        .with_state(Arc::new(state))
}

async fn healthz() -> &'static str {
    "ok"
}

fn status_for(category: ErrorCategory) -> StatusCode {
    match category {
        ErrorCategory::InvalidInput => StatusCode::BAD_REQUEST,
        ErrorCategory::InvalidCredential => StatusCode::UNAUTHORIZED,
        ErrorCategory::BillingIssue => StatusCode::PAYMENT_REQUIRED,
        ErrorCategory::PermissionDenied => StatusCode::FORBIDDEN,
        ErrorCategory::QuotaExceeded => StatusCode::TOO_MANY_REQUESTS,
        ErrorCategory::ConfigurationError | ErrorCategory::Unknown => {
            StatusCode::INTERNAL_SERVER_ERROR
        }
    }
}

fn error_response(report: ErrorReport) -> (StatusCode, Json<ErrorBody>) {
    (
        status_for(report.category),
        Json(ErrorBody {
            error: report.human_message,
        }),
    )
}

async fn chat_submit(
    State(state): State<Arc<AppState>>,
    Json(req): Json<ChatRequest>,
) -> Result<Json<ChatResponse>, (StatusCode, Json<ErrorBody>)> {
    let message = req.message.unwrap_or_default();

    let response = state
        .chat
        .handle(&message)
        .await
        .map_err(error_response)?;

    Ok(Json(ChatResponse { response }))
}

async fn analyze_damage(
    State(state): State<Arc<AppState>>,
    mut multipart: Multipart,
) -> Result<Json<AnalyzeResponse>, (StatusCode, Json<ErrorBody>)> {
    let mut image: Option<(Vec<u8>, String)> = None;

    while let Some(field) = multipart.next_field().await.map_err(|e| {
        error_response(ErrorReport::invalid_input(format!(
            "Malformed multipart request: {e}"
        )))
    })? {
        if field.name() != Some("image") {
            continue;
        }

        let declared_mime = field.content_type().map(str::to_string);
        let data = field.bytes().await.map_err(|e| {
            error_response(ErrorReport::invalid_input(format!(
                "Failed to read image field: {e}"
            )))
        })?;

        let mime_type =
            declared_mime.unwrap_or_else(|| mime::detect_image_mime(&data).to_string());
        image = Some((data.to_vec(), mime_type));
    }

    let (data, mime_type) = image.ok_or_else(|| {
        error_response(ErrorReport::invalid_input("No image file provided"))
    })?;

    let result = state
        .analysis
        .handle(&data, &mime_type)
        .await
        .map_err(error_response)?;

    Ok(Json(AnalyzeResponse {
        damage_analysis: result.damage_analysis,
        prevention_instructions: result.prevention_instructions,
        success: true,
    }))
}
