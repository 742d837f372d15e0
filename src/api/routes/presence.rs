//! Presence Routes
//!
//! - GET /api/v1/presence - Connections currently in the room

use axum::{extract::State, Json};
use std::sync::Arc;

use crate::api::dto::PresenceResponse;
use crate::api::state::AppState;

/// GET /api/v1/presence
pub async fn list_presence(State(state): State<Arc<AppState>>) -> Json<PresenceResponse> {
    let users = state.hub.presence().await;

    Json(PresenceResponse {
        count: users.len(),
        users,
    })
}
