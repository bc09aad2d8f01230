pub mod handlers;
pub mod types;

use crate::{
    Result,
    config::Config,
    guardrails,
    llm::OpenAiClient,
    pipeline::{Pipeline, PipelineSettings},
};
use axum::{
    Router,
    routing::{get, post},
};
use handlers::{AppState, Capabilities};
use std::{net::SocketAddr, sync::Arc};
use tower_http::trace::TraceLayer;
use tracing::info;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/ask", post(handlers::ask))
        .route("/health", get(handlers::health))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Wires the production collaborators from configuration.
pub fn build_state(config: &Config) -> Result<AppState> {
    let llm = Arc::new(OpenAiClient::new(config.llm.clone()));
    let validator = guardrails::build_validator(&config.guardrails, &config.llm)?;
    let pipeline = Pipeline::new(llm, validator, PipelineSettings::from_config(config));

    Ok(AppState {
        pipeline: Arc::new(pipeline),
        capabilities: Arc::new(Capabilities::from_config(config)),
    })
}

pub async fn run(config: Config) -> Result<()> {
    let app_state = build_state(&config)?;

    info!(
        "Guardrails {}, model {}",
        if app_state.pipeline.guardrails_enabled() {
            "enabled"
        } else {
            "disabled"
        },
        app_state.pipeline.model()
    );

    let app = router(app_state);

    let addr = SocketAddr::new(config.server.host.parse()?, config.server.port);

    info!("Starting server on {}", addr);
    info!("Endpoints: POST /ask, GET /health");

    let listener = tokio::net::TcpListener::bind(addr).await?;
    axum::serve(listener, app).await?;

    Ok(())
}
