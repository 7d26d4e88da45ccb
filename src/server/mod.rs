//! HTTP surface: one POST route per capability plus a greeting at `/`.
//!
//! Handlers are pass-throughs to [`Assistant`]; all behavior lives in `core`.

use std::net::SocketAddr;
use std::sync::Arc;

use anyhow::{Context, Result};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use serde_json::json;
use tokio::net::TcpListener;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

use crate::core::assistant::Assistant;
use crate::core::config::WingmanConfig;
use crate::core::schemas::{
    CodeWalkthroughRequest, CodeWalkthroughResponse, ExplainErrorsRequest, ExplainErrorsResponse,
    GenerateTestCasesRequest, GenerateTestCasesResponse, SuggestFixesRequest,
    SuggestFixesResponse,
};
use crate::error::WingmanError;

pub const GREETING: &str = "Hello, Welcome to Wingman, your personal AI Debugger.";

#[derive(Clone)]
pub struct AppState {
    assistant: Arc<Assistant>,
}

impl AppState {
    pub fn new(assistant: Assistant) -> Self {
        Self {
            assistant: Arc::new(assistant),
        }
    }
}

// ---------- Errors ----------

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: &'static str,
    message: String,
}

/// `WingmanError` rendered as an HTTP response
#[derive(Debug)]
pub struct ApiError(WingmanError);

impl From<WingmanError> for ApiError {
    fn from(err: WingmanError) -> Self {
        Self(err)
    }
}

impl ApiError {
    fn status(&self) -> StatusCode {
        match self.0 {
            WingmanError::UnsupportedProvider(_) | WingmanError::MissingCredential(_) => {
                StatusCode::BAD_REQUEST
            }
            WingmanError::InvalidRequest(_) => StatusCode::UNPROCESSABLE_ENTITY,
            WingmanError::MalformedOutput { .. } | WingmanError::Provider(_) => {
                StatusCode::BAD_GATEWAY
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status();
        if status.is_server_error() {
            tracing::warn!(error = %self.0, kind = self.0.kind(), "request failed");
        } else {
            tracing::debug!(error = %self.0, kind = self.0.kind(), "request rejected");
        }

        let body = ErrorBody {
            error: self.0.kind(),
            message: self.0.to_string(),
        };
        (status, Json(body)).into_response()
    }
}

// ---------- Handlers ----------

async fn greet() -> Json<serde_json::Value> {
    Json(json!({ "message": GREETING }))
}

async fn explain_errors(
    State(state): State<AppState>,
    Json(req): Json<ExplainErrorsRequest>,
) -> Result<Json<ExplainErrorsResponse>, ApiError> {
    Ok(Json(state.assistant.explain_errors(&req).await?))
}

async fn suggest_fixes(
    State(state): State<AppState>,
    Json(req): Json<SuggestFixesRequest>,
) -> Result<Json<SuggestFixesResponse>, ApiError> {
    Ok(Json(state.assistant.suggest_fixes(&req).await?))
}

async fn generate_testcases(
    State(state): State<AppState>,
    Json(req): Json<GenerateTestCasesRequest>,
) -> Result<Json<GenerateTestCasesResponse>, ApiError> {
    Ok(Json(state.assistant.generate_testcases(&req).await?))
}

async fn code_walkthrough(
    State(state): State<AppState>,
    Json(req): Json<CodeWalkthroughRequest>,
) -> Result<Json<CodeWalkthroughResponse>, ApiError> {
    Ok(Json(state.assistant.code_walkthrough(&req).await?))
}

// ---------- Router / server ----------

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(greet))
        .route("/explain-errors", post(explain_errors))
        .route("/suggest-fixes", post(suggest_fixes))
        .route("/generate-testcases", post(generate_testcases))
        .route("/code-walkthrough", post(code_walkthrough))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(state)
}

/// Serve on an already-bound listener until `shutdown` resolves.
pub async fn serve_with_shutdown<F>(
    listener: TcpListener,
    state: AppState,
    shutdown: F,
) -> Result<()>
where
    F: std::future::Future<Output = ()> + Send + 'static,
{
    let addr: SocketAddr = listener.local_addr().context("Failed to read bound address")?;
    tracing::info!(%addr, "wingman listening");

    axum::serve(listener, router(state))
        .with_graceful_shutdown(shutdown)
        .await
        .context("HTTP server failed")
}

/// Bind the configured address and serve until Ctrl-C.
pub async fn serve(config: &WingmanConfig) -> Result<()> {
    let address = config.bind_address();
    let listener = TcpListener::bind(&address)
        .await
        .with_context(|| format!("Failed to bind {}", address))?;

    let state = AppState::new(Assistant::from_config(config));
    serve_with_shutdown(listener, state, shutdown_signal()).await
}

async fn shutdown_signal() {
    if let Err(e) = tokio::signal::ctrl_c().await {
        tracing::error!(error = %e, "failed to listen for Ctrl-C");
        std::future::pending::<()>().await;
    }
    tracing::info!("shutting down");
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_status_mapping() {
        let cases = [
            (WingmanError::UnsupportedProvider("x".into()), StatusCode::BAD_REQUEST),
            (WingmanError::MissingCredential("google"), StatusCode::BAD_REQUEST),
            (
                WingmanError::InvalidRequest("n".into()),
                StatusCode::UNPROCESSABLE_ENTITY,
            ),
            (
                WingmanError::MalformedOutput {
                    capability: "explain-errors",
                    reason: "bad".into(),
                },
                StatusCode::BAD_GATEWAY,
            ),
            (
                WingmanError::Provider(anyhow::anyhow!("down")),
                StatusCode::BAD_GATEWAY,
            ),
        ];
        for (err, expected) in cases {
            assert_eq!(ApiError::from(err).status(), expected);
        }
    }
}
