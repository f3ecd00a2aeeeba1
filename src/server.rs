use std::sync::Arc;
use std::time::Duration;

use axum::Router;
use axum::extract::DefaultBodyLimit;
use axum::http::StatusCode;
use axum::routing::{get, patch, post};
use tower::limit::ConcurrencyLimitLayer;
use tower_http::timeout::TimeoutLayer;

use crate::handlers;
use crate::handlers::auth::IdentityProvider;
use crate::store::{EventStore, FeedbackStore, SessionStore, TaskStore, UserStore};

// ============================================================================
// Application State
// ============================================================================

/// Shared application state: one store per entity over the same backend,
/// plus the identity boundary.
#[derive(Clone)]
pub struct AppState {
    pub users: UserStore,
    pub sessions: SessionStore,
    pub events: EventStore,
    pub tasks: TaskStore,
    pub feedback: FeedbackStore,
    pub identity: Arc<dyn IdentityProvider>,
    pub max_connections: usize,
}

// ============================================================================
// Server Setup
// ============================================================================

pub fn build_app(state: AppState, request_timeout_seconds: u64) -> Router {
    let max_connections = state.max_connections;

    let api_routes = Router::new()
        .route("/sessions/start", post(handlers::v1::start_session))
        .route("/sessions", get(handlers::v1::list_sessions))
        .route("/sessions/current", get(handlers::v1::current_session))
        .route(
            "/sessions/{session_id}",
            get(handlers::v1::get_session).put(handlers::v1::update_session),
        )
        .route(
            "/events",
            get(handlers::v1::list_events).post(handlers::v1::create_event),
        )
        .route("/events/{event_id}", get(handlers::v1::get_event))
        .route(
            "/tasks",
            get(handlers::v1::list_tasks).post(handlers::v1::create_task),
        )
        .route(
            "/tasks/{task_id}",
            get(handlers::v1::get_task)
                .put(handlers::v1::update_task)
                .delete(handlers::v1::delete_task),
        )
        .route(
            "/feedback",
            get(handlers::v1::list_feedback).post(handlers::v1::create_feedback),
        )
        .route(
            "/feedback/{feedback_id}",
            get(handlers::v1::get_feedback).delete(handlers::v1::delete_feedback),
        )
        .route("/users/me", get(handlers::v1::my_profile))
        .route("/users/me/settings", patch(handlers::v1::update_my_settings))
        .route(
            "/users/me/fcm-tokens",
            post(handlers::v1::add_my_fcm_token).delete(handlers::v1::remove_my_fcm_token),
        )
        .route(
            "/users/me/blocked-apps",
            post(handlers::v1::add_my_blocked_app).delete(handlers::v1::remove_my_blocked_app),
        )
        .with_state(state.clone())
        .layer(TimeoutLayer::with_status_code(
            StatusCode::REQUEST_TIMEOUT,
            Duration::from_secs(request_timeout_seconds),
        ));

    let api_v1 = Router::new()
        .merge(api_routes)
        .layer(DefaultBodyLimit::max(2 * 1024 * 1024)) // 2 MB
        .layer(axum::middleware::from_fn_with_state(
            state,
            handlers::auth::require_identity,
        ))
        .layer(ConcurrencyLimitLayer::new(max_connections));

    Router::new()
        .route("/livez", get(handlers::livez))
        .route("/readyz", get(handlers::readyz))
        .route("/version", get(handlers::version))
        .nest("/api/v1", api_v1)
}
