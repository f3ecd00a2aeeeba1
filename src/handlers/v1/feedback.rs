//! Intervention-feedback endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use serde::Deserialize;

use crate::api::{CreateFeedbackRequest, FeedbackResponse};
use crate::handlers::auth::CurrentUser;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::store::{FeedbackFilter, FeedbackType, NewFeedback};

#[derive(Deserialize)]
pub struct ListFeedbackQuery {
    event_id: Option<String>,
    feedback_type: Option<FeedbackType>,
    limit: Option<i64>,
}

/// POST /api/v1/feedback
pub async fn create_feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateFeedbackRequest>,
) -> Response {
    let new = NewFeedback {
        event_id: req.event_id,
        feedback_type: req.feedback_type,
        timestamp: req.timestamp,
    };

    match state.feedback.create(&user_id, new).await {
        Ok(feedback) => {
            (StatusCode::CREATED, Json(FeedbackResponse::from(feedback))).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/feedback
pub async fn list_feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ListFeedbackQuery>,
) -> Response {
    let filter = FeedbackFilter {
        event_id: query.event_id,
        feedback_type: query.feedback_type,
        limit: query.limit,
    };

    match state.feedback.list(&user_id, filter).await {
        Ok(items) => {
            let items: Vec<FeedbackResponse> =
                items.into_iter().map(FeedbackResponse::from).collect();
            Json(items).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/feedback/{feedback_id}
pub async fn get_feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(feedback_id): Path<String>,
) -> Response {
    match state.feedback.get(&user_id, &feedback_id).await {
        Ok(feedback) => Json(FeedbackResponse::from(feedback)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// DELETE /api/v1/feedback/{feedback_id}
pub async fn delete_feedback(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(feedback_id): Path<String>,
) -> Response {
    match state.feedback.delete(&user_id, &feedback_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}
