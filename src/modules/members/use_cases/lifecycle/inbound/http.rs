use axum::{Json, extract::State, extract::rejection::JsonRejection, response::IntoResponse};

use crate::modules::members::core::events::LifecycleEvent;
use crate::shell::http::enqueue;
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    body: Result<Json<LifecycleEvent>, JsonRejection>,
) -> impl IntoResponse {
    enqueue(&state.lifecycle, body, &state.shutdown).await
}
