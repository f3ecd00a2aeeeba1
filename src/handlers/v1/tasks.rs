//! Task endpoints.

use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::api::{CreateTaskRequest, TaskResponse, UpdateTaskRequest};
use crate::handlers::auth::CurrentUser;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::store::{NewTask, TaskPatch};

/// POST /api/v1/tasks
pub async fn create_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<CreateTaskRequest>,
) -> Response {
    let new = NewTask {
        name: req.name,
        description: req.description,
        due_date: req.due_date,
        target_executable: req.target_executable,
        target_arguments: req.target_arguments,
    };

    match state.tasks.create(&user_id, new).await {
        Ok(task) => (StatusCode::CREATED, Json(TaskResponse::from(task))).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/tasks
pub async fn list_tasks(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Response {
    match state.tasks.list(&user_id).await {
        Ok(tasks) => {
            let tasks: Vec<TaskResponse> = tasks.into_iter().map(TaskResponse::from).collect();
            Json(tasks).into_response()
        }
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/tasks/{task_id}
pub async fn get_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
) -> Response {
    match state.tasks.get(&user_id, &task_id).await {
        Ok(task) => Json(TaskResponse::from(task)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// PUT /api/v1/tasks/{task_id}
pub async fn update_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
    Json(req): Json<UpdateTaskRequest>,
) -> Response {
    let patch = TaskPatch {
        name: req.name,
        description: req.description,
        due_date: req.due_date,
        status: req.status,
        linked_session_id: req.linked_session_id,
        target_executable: req.target_executable,
        target_arguments: req.target_arguments,
    };

    match state.tasks.update(&user_id, &task_id, patch).await {
        Ok(task) => Json(TaskResponse::from(task)).into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// DELETE /api/v1/tasks/{task_id}
pub async fn delete_task(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Path(task_id): Path<String>,
) -> Response {
    match state.tasks.delete(&user_id, &task_id).await {
        Ok(()) => StatusCode::NO_CONTENT.into_response(),
        Err(e) => problem_details::from_store_error(&e),
    }
}
