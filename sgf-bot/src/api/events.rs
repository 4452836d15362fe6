//! Conversation event endpoint

use axum::{extract::State, routing::post, Json, Router};

use crate::command::InboundEvent;
use crate::error::ApiResult;
use crate::handler::handle_event;
use crate::reply::SessionReply;
use crate::AppState;

/// POST /api/events
///
/// Takes one `value_submitted` or `option_selected` event and returns the
/// reply to show the user.
pub async fn post_event(
    State(state): State<AppState>,
    Json(event): Json<InboundEvent>,
) -> ApiResult<Json<SessionReply>> {
    let reply = handle_event(&state, event).await?;
    Ok(Json(reply))
}

pub fn event_routes() -> Router<AppState> {
    Router::new().route("/api/events", post(post_event))
}
