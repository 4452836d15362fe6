//! Broadcast endpoint

use axum::{extract::State, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use sgf_common::UserId;
use std::collections::BTreeMap;
use tracing::info;

use crate::error::{ApiError, ApiResult};
use crate::AppState;

#[derive(Debug, Deserialize)]
pub struct BroadcastRequest {
    pub user_ids: Vec<UserId>,
    pub message: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct BroadcastResponse {
    /// User id → delivered
    pub results: BTreeMap<UserId, bool>,
    pub successful: usize,
    pub failed: usize,
}

/// POST /api/broadcast
///
/// Sends the message to every listed user and reports per-user delivery.
/// Individual delivery failures do not fail the request.
pub async fn post_broadcast(
    State(state): State<AppState>,
    Json(request): Json<BroadcastRequest>,
) -> ApiResult<Json<BroadcastResponse>> {
    let broadcaster = state
        .broadcaster
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("No outbound transport configured".to_string()))?;

    if request.message.trim().is_empty() {
        return Err(ApiError::BadRequest("Message is empty".to_string()));
    }

    info!(recipients = request.user_ids.len(), "Broadcast requested");

    let results = broadcaster
        .send_all(&request.user_ids, &request.message)
        .await;
    let successful = results.values().filter(|ok| **ok).count();
    let failed = results.len() - successful;

    Ok(Json(BroadcastResponse {
        results,
        successful,
        failed,
    }))
}

pub fn broadcast_routes() -> Router<AppState> {
    Router::new().route("/api/broadcast", post(post_broadcast))
}
