use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use crate::modules::members::core::events::MemberCommand;
use crate::shell::http::enqueue;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<MemberCommand>, JsonRejection>,
) -> impl IntoResponse {
    enqueue(&state.commands, body, &state.shutdown).await
}
