use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use crate::modules::members::core::events::VoiceStateChanged;
use crate::shell::http::enqueue;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<VoiceStateChanged>, JsonRejection>,
) -> impl IntoResponse {
    enqueue(&state.voice, body, &state.shutdown).await
}
