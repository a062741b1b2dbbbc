//! HTTP interface of the relay

use crate::chain::ForwarderChain;
use crate::error::RelayError;
use crate::relay::Relay;
use crate::types::{ExecutionResult, FlushOutcome, PendingView, SignedRequest};
use axum::extract::State;
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tower_http::trace::TraceLayer;

/// `RelayError` rendered as `{ "msg": ... }` with a matching status
#[derive(Debug)]
pub struct ApiError(pub RelayError);

impl From<RelayError> for ApiError {
    fn from(err: RelayError) -> Self {
        Self(err)
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = match &self.0 {
            RelayError::InvalidSignature { .. }
            | RelayError::MissingOwner { .. }
            | RelayError::InvalidArgument(_) => StatusCode::BAD_REQUEST,
            RelayError::NetworkFailure(_) | RelayError::Chain(_) => StatusCode::BAD_GATEWAY,
            RelayError::LengthMismatch { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        };
        let body = serde_json::json!({ "msg": self.0.to_string() });
        (status, Json(body)).into_response()
    }
}

#[derive(Debug, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub pending: usize,
    pub flushing: bool,
}

/// Create the application router
pub fn router<C: ForwarderChain + 'static>(relay: Arc<Relay<C>>) -> Router {
    Router::new()
        .route("/health", get(health::<C>))
        .route("/txRequest", post(submit::<C>))
        .route("/requests", get(pending::<C>))
        .route("/relayTransaction", post(relay_transaction::<C>))
        .route("/history", get(history::<C>))
        .layer(TraceLayer::new_for_http())
        .layer(CorsLayer::permissive())
        .with_state(relay)
}

async fn health<C: ForwarderChain>(State(relay): State<Arc<Relay<C>>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok",
        pending: relay.batch().len(),
        flushing: relay.dispatcher().is_flushing(),
    })
}

/// Verify and queue a signed request, echoing it back
async fn submit<C: ForwarderChain>(
    State(relay): State<Arc<Relay<C>>>,
    Json(signed): Json<SignedRequest>,
) -> Result<Json<SignedRequest>, ApiError> {
    relay.submit(signed.clone())?;
    Ok(Json(signed))
}

async fn pending<C: ForwarderChain>(
    State(relay): State<Arc<Relay<C>>>,
) -> Result<Json<PendingView>, ApiError> {
    Ok(Json(relay.pending().await?))
}

async fn relay_transaction<C: ForwarderChain + 'static>(
    State(relay): State<Arc<Relay<C>>>,
) -> Result<Json<FlushOutcome>, ApiError> {
    Ok(Json(relay.flush().await?))
}

async fn history<C: ForwarderChain>(
    State(relay): State<Arc<Relay<C>>>,
) -> Json<Vec<ExecutionResult>> {
    Json(relay.history())
}
