//! Activity event endpoints.

use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};
use chrono::{DateTime, Utc};
use serde::Deserialize;

use crate::api::{CreateEventRequest, CreateEventResponse, EventResponse};
use crate::handlers::auth::CurrentUser;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::store::{EventFilter, NewEvent};

#[derive(Deserialize)]
pub struct ListEventsQuery {
    session_id: Option<String>,
    start_time: Option<DateTime<Utc>>,
    end_time: Option<DateTime<Utc>>,
    limit: Option<i64>,
}

/// POST /api/v1/events
pub async fn create_event(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateEventRequest>,
) -> Response {
    let new = NewEvent {
        session_id: req.session_id,
        timestamp: req.timestamp,
        app_name: req.app_name,
        window_title: req.window_title,
        activity_vector: req.activity_vector,
    };

    match state.events.create(&user_id, new).await {
        Ok(event_id) => {
            (StatusCode::CREATED, Json(CreateEventResponse { event_id })).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/events
pub async fn list_events(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Query(query): Query<ListEventsQuery>,
) -> Response {
    let filter = EventFilter {
        session_id: query.session_id,
        start_time: query.start_time,
        end_time: query.end_time,
        limit: query.limit,
    };

    match state.events.list(&user_id, filter).await {
        Ok(events) => {
            let events: Vec<EventResponse> = events.into_iter().map(EventResponse::from).collect();
            Json(events).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/events/{event_id}
pub async fn get_event(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(event_id): Path<String>,
) -> Response {
    match state.events.get(&user_id, &event_id).await {
        Ok(event) => Json(EventResponse::from(event)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}
