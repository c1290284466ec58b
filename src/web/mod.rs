/// HTTP front end: the question page, a JSON endpoint and a health check.
///
/// All interaction state is request-scoped: the question arrives as a form
/// field or query parameter and is echoed back into the rendered page.
pub mod page;

use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::{Form, Query, State};
use axum::response::Html;
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Deserialize;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::{BrandingConfig, Config, ExampleQuestion, effective_top_k};
use crate::pipeline::{QaPipeline, Reply};

/// Shared application context available to all handlers.
pub struct AppState {
    pub pipeline: QaPipeline,
    pub branding: BrandingConfig,
    pub examples: Vec<ExampleQuestion>,
}

impl AppState {
    pub fn new(pipeline: QaPipeline, config: &Config) -> Self {
        Self {
            pipeline,
            branding: config.branding.clone(),
            examples: config.examples.clone(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct QuestionParams {
    #[serde(default)]
    question: String,
}

#[derive(Debug, Deserialize)]
struct AskRequest {
    #[serde(default)]
    question: String,
    #[serde(default)]
    top_k: Option<usize>,
}

pub fn router(state: Arc<AppState>) -> Router {
    Router::new()
        .route("/", get(index_handler))
        .route("/ask", post(ask_form_handler))
        .route("/api/ask", post(ask_json_handler))
        .route("/health", get(health_handler))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

/// Bind `addr` and serve until Ctrl-C.
pub async fn serve(state: Arc<AppState>, addr: &str) -> Result<()> {
    let listener = tokio::net::TcpListener::bind(addr)
        .await
        .with_context(|| format!("failed to bind {addr}"))?;
    info!("Listening on http://{}", listener.local_addr()?);

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown_signal())
        .await
        .context("HTTP server encountered an error")?;

    info!("Server stopped");
    Ok(())
}

async fn shutdown_signal() {
    if tokio::signal::ctrl_c().await.is_err() {
        // Without a signal handler the server runs until killed.
        std::future::pending::<()>().await;
    }
}

async fn index_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<QuestionParams>,
) -> Html<String> {
    Html(page::render_page(
        &state.branding,
        &state.examples,
        &params.question,
        None,
    ))
}

async fn ask_form_handler(
    State(state): State<Arc<AppState>>,
    Form(params): Form<QuestionParams>,
) -> Html<String> {
    let reply = state.pipeline.ask(&params.question).await;
    Html(page::render_page(
        &state.branding,
        &state.examples,
        &params.question,
        Some(&reply),
    ))
}

async fn ask_json_handler(
    State(state): State<Arc<AppState>>,
    Json(request): Json<AskRequest>,
) -> Json<Reply> {
    let top_k = effective_top_k(request.top_k, state.pipeline.top_k());
    Json(state.pipeline.ask_with_top_k(&request.question, top_k).await)
}

async fn health_handler() -> Json<serde_json::Value> {
    Json(serde_json::json!({"status": "ok", "service": "campus-qa"}))
}
