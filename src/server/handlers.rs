use super::types::{AskRequest, ErrorResponse, HealthResponse};
use crate::{
    config::Config,
    pipeline::{Answer, MISSING_PROMPT_ERROR, Pipeline, PipelineOutcome},
};
use axum::{
    extract::{State, rejection::JsonRejection},
    http::StatusCode,
    response::Json,
};
use std::sync::Arc;
use tracing::{debug, info, warn};

#[derive(Clone)]
pub struct AppState {
    pub pipeline: Arc<Pipeline>,
    pub capabilities: Arc<Capabilities>,
}

/// Static flags reported by `GET /health`, fixed at startup.
#[derive(Debug, Clone)]
pub struct Capabilities {
    pub guardrails_enabled: bool,
    pub toxicity_filter: bool,
    pub pii_detection: bool,
    pub model: String,
    pub project: String,
}

impl Capabilities {
    pub fn from_config(config: &Config) -> Self {
        let enabled = config.guardrails.enabled;
        Self {
            guardrails_enabled: enabled,
            toxicity_filter: enabled && config.guardrails.toxicity.enabled,
            pii_detection: enabled && config.guardrails.pii.enabled,
            model: config.llm.model.clone(),
            project: config.server.project.clone(),
        }
    }
}

pub async fn ask(
    State(state): State<AppState>,
    payload: Result<Json<AskRequest>, JsonRejection>,
) -> Result<Json<Answer>, (StatusCode, Json<ErrorResponse>)> {
    // An unreadable body is handled like one without a prompt.
    let request = match payload {
        Ok(Json(request)) => request,
        Err(rejection) => {
            debug!("Rejected request body: {}", rejection);
            AskRequest::default()
        }
    };

    match state
        .pipeline
        .run(request.prompt.as_deref(), request.user_id)
        .await
    {
        PipelineOutcome::MissingPrompt => {
            info!("Rejecting request without prompt");
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: MISSING_PROMPT_ERROR.to_string(),
                    guardrails_passed: None,
                    actions: None,
                    prediction_id: None,
                }),
            ))
        }
        PipelineOutcome::Blocked(blocked) => {
            warn!(
                "Guardrails blocked request {}: {}",
                blocked.prediction_id, blocked.error
            );
            Err((
                StatusCode::BAD_REQUEST,
                Json(ErrorResponse {
                    error: blocked.error,
                    guardrails_passed: Some(false),
                    actions: Some(blocked.actions),
                    prediction_id: Some(blocked.prediction_id),
                }),
            ))
        }
        PipelineOutcome::Answered(answer) => Ok(Json(answer)),
    }
}

pub async fn health(State(state): State<AppState>) -> Json<HealthResponse> {
    let caps = &state.capabilities;
    Json(HealthResponse {
        status: "healthy".to_string(),
        guardrails_enabled: caps.guardrails_enabled,
        toxicity_filter: caps.toxicity_filter,
        pii_detection: caps.pii_detection,
        model: caps.model.clone(),
        project: caps.project.clone(),
    })
}
