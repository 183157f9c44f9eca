use axum::{
    Json, Router,
    extract::rejection::JsonRejection,
    http::StatusCode,
    response::{IntoResponse, Response},
    routing::{get, post},
};
use std::fmt::Debug;
use tokio_util::sync::CancellationToken;
use tower_http::trace::TraceLayer;
use tracing::{debug, warn};

use crate::modules::members::use_cases::get_member::inbound::http as get_member_http;
use crate::modules::members::use_cases::lifecycle::inbound::http as lifecycle_http;
use crate::modules::members::use_cases::member_commands::inbound::http as commands_http;
use crate::modules::members::use_cases::message_received::inbound::http as messages_http;
use crate::modules::members::use_cases::voice_state_changed::inbound::http as voice_http;
use crate::shared::infrastructure::event_channel::EventChannel;
use crate::shell::state::AppState;

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/events/messages", post(messages_http::handle))
        .route("/events/voice", post(voice_http::handle))
        .route("/events/lifecycle", post(lifecycle_http::handle))
        .route("/commands", post(commands_http::handle))
        .route("/members/{guild_id}/{user_id}", get(get_member_http::handle))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> StatusCode {
    StatusCode::OK
}

/// Accepting an event means it was enqueued, not that it was processed. A channel that has
/// shut down answers 503.
pub async fn enqueue<M>(
    channel: &EventChannel<M>,
    body: Result<Json<M>, JsonRejection>,
    cancel: &CancellationToken,
) -> Response
where
    M: Debug + Send + Sync + 'static,
{
    let Json(message) = match body {
        Ok(body) => body,
        Err(rejection) => {
            debug!(channel = channel.name(), rejection = %rejection, "event body rejected");
            return StatusCode::UNPROCESSABLE_ENTITY.into_response();
        }
    };
    match channel.write(message, cancel).await {
        Ok(()) => StatusCode::ACCEPTED.into_response(),
        Err(error) => {
            warn!(channel = channel.name(), error = %error, "event refused");
            StatusCode::SERVICE_UNAVAILABLE.into_response()
        }
    }
}

#[cfg(test)]
mod http_router_tests {
    use axum::{
        body::Body,
        http::{Request, StatusCode},
    };
    use http_body_util::BodyExt;
    use rstest::{fixture, rstest};
    use std::sync::Arc;
    use std::time::Duration;
    use tokio_util::sync::CancellationToken;
    use tower::ServiceExt;

    use super::router;
    use crate::modules::members::adapters::outbound::tracing_notifier::TracingNotifier;
    use crate::modules::members::core::experience::FlatExperiencePolicy;
    use crate::modules::members::core::member::Member;
    use crate::shared::infrastructure::error_reporter::in_memory::RecordingErrorReporter;
    use crate::shell::state::{AppDependencies, AppState, MemberStore};
    use crate::shell::workers::spawn_workers;
    use crate::tests::fixtures::members::make_member;

    #[fixture]
    async fn before_each() -> AppState {
        let dependencies = AppDependencies {
            store: Arc::new(MemberStore::with_rows([make_member(1, 7, 120)])),
            policy: Arc::new(FlatExperiencePolicy::default()),
            notifier: Arc::new(TracingNotifier),
            reporter: Arc::new(RecordingErrorReporter::new()),
        };
        AppState::build(dependencies, 8, CancellationToken::new())
            .await
            .expect("state build failed")
    }

    fn post_json(uri: &str, body: &str) -> Request<Body> {
        Request::post(uri)
            .header("content-type", "application/json")
            .body(Body::from(body.to_string()))
            .unwrap()
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_answer_the_health_check(#[future] before_each: AppState) {
        let response = router(before_each.await)
            .oneshot(Request::get("/health").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_accept_a_message_event(#[future] before_each: AppState) {
        let body = r#"{"guild_id":1,"user_id":7,"channel_id":3,"sent_at":"2024-01-01T00:00:00Z"}"#;
        let response = router(before_each.await)
            .oneshot(post_json("/events/messages", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_accept_a_tagged_command(#[future] before_each: AppState) {
        let body = r#"{"type":"grant_experience","guild_id":1,"user_id":7,"amount":5,"issued_by":2}"#;
        let response = router(before_each.await)
            .oneshot(post_json("/commands", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::ACCEPTED);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_422_on_an_invalid_body(#[future] before_each: AppState) {
        let response = router(before_each.await)
            .oneshot(post_json("/events/voice", r#"{"guild_id":"one"}"#))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNPROCESSABLE_ENTITY);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_503_once_shut_down(#[future] before_each: AppState) {
        let state = before_each.await;
        spawn_workers(&state, Duration::from_secs(3600)).unwrap();
        state.shutdown.cancel();

        let body = r#"{"type":"sweep","guild_id":1,"at":"2024-01-01T00:00:00Z"}"#;
        let response = router(state)
            .oneshot(post_json("/events/lifecycle", body))
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::SERVICE_UNAVAILABLE);
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_the_cached_member(#[future] before_each: AppState) {
        let response = router(before_each.await)
            .oneshot(Request::get("/members/1/7").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let member: Member = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(member, make_member(1, 7, 120));
    }

    #[rstest]
    #[tokio::test]
    async fn it_should_return_404_for_an_unknown_member(#[future] before_each: AppState) {
        let response = router(before_each.await)
            .oneshot(Request::get("/members/1/8").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }
}
