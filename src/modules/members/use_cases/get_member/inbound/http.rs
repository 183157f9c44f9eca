// Read side: serves the committed member snapshot straight from the repository index.

use axum::{Json, extract::Path, extract::State, http::StatusCode, response::IntoResponse};

use crate::modules::members::core::member::{Member, MemberKey};
use crate::shell::state::AppState;

pub async fn handle(
    State(state): State<AppState>,
    Path((guild_id, user_id)): Path<(u64, u64)>,
) -> impl IntoResponse {
    match state.services.repository.try_get(&MemberKey::new(guild_id, user_id)) {
        Some(member) => Json(Member::clone(&member)).into_response(),
        None => StatusCode::NOT_FOUND.into_response(),
    }
}
