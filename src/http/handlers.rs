//! Route handlers.

use axum::body::Bytes;
use axum::extract::State;
use axum::http::{HeaderMap, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde::Serialize;

use crate::http::request::request_id;
use crate::http::server::AppState;

#[derive(Debug, Serialize)]
pub struct Liveness {
    pub status: &'static str,
}

#[derive(Debug, Serialize)]
pub struct Readiness {
    pub status: &'static str,
    pub node_connected: bool,
}

/// `GET /`: process is up. No auth, no node call.
pub async fn health() -> Json<Liveness> {
    Json(Liveness { status: "signer-up" })
}

/// `GET /ready`: node reachable. 503 while degraded.
pub async fn ready(State(state): State<AppState>) -> Response {
    let node_connected = state.node.is_healthy().await;
    let (status, label) = if node_connected {
        (StatusCode::OK, "ready")
    } else {
        (StatusCode::SERVICE_UNAVAILABLE, "degraded")
    };
    (
        status,
        Json(Readiness {
            status: label,
            node_connected,
        }),
    )
        .into_response()
}

/// `POST /sign`. The body is taken raw so that malformed or mislabeled JSON
/// still reaches the normalizer.
pub async fn sign(State(state): State<AppState>, headers: HeaderMap, body: Bytes) -> Response {
    let request_id = request_id(&headers);
    match state.pipeline.execute(&request_id, &headers, &body).await {
        Ok(outcome) => state.formatter.success(&outcome),
        Err(err) => state.formatter.error(&err),
    }
}
