//! Session endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::{SessionResponse, StartSessionRequest, UpdateSessionRequest};
use crate::handlers::auth::CurrentUser;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::store::{NewSession, SessionPatch};

const DEFAULT_LIST_LIMIT: usize = 50;

#[derive(Deserialize)]
pub struct ListSessionsQuery {
    status: Option<String>,
    limit: Option<usize>,
}

/// POST /api/v1/sessions/start
pub async fn start_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<StartSessionRequest>,
) -> Response {
    let new = NewSession {
        task_id: req.task_id,
        profile_id: req.profile_id,
        start_time: Some(req.start_time),
        goal_duration: req.goal_duration,
    };

    match state.sessions.start(&user_id, new).await {
        Ok(session) => (StatusCode::CREATED, Json(SessionResponse::from(session))).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/sessions
pub async fn list_sessions(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ListSessionsQuery>,
) -> Response {
    let limit = query.limit.unwrap_or(DEFAULT_LIST_LIMIT);

    match state
        .sessions
        .list(&user_id, query.status.as_deref(), limit)
        .await
    {
        Ok(sessions) => {
            let sessions: Vec<SessionResponse> =
                sessions.into_iter().map(SessionResponse::from).collect();
            Json(sessions).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/sessions/current
pub async fn current_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Response {
    match state.sessions.current(&user_id).await {
        Ok(Some(session)) => Json(SessionResponse::from(session)).into_response(),
        Ok(None) => problem_details::not_found("no active session"),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/sessions/{session_id}
pub async fn get_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
) -> Response {
    match state.sessions.get(&user_id, &session_id).await {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// PUT /api/v1/sessions/{session_id}
pub async fn update_session(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(session_id): Path<String>,
    Json(req): Json<UpdateSessionRequest>,
) -> Response {
    let patch = SessionPatch {
        end_time: req.end_time,
        status: req.status,
        goal_duration: req.goal_duration,
        interruption_count: req.interruption_count,
    };

    match state.sessions.update(&user_id, &session_id, patch).await {
        Ok(session) => Json(SessionResponse::from(session)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}
