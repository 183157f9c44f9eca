use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use crate::modules::members::core::events::MessageReceived;
use crate::shell::http::enqueue;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<MessageReceived>, JsonRejection>,
) -> impl IntoResponse {
    enqueue(&state.messages, body, &state.shutdown).await
}
