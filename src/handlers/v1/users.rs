//! Profile endpoints for the authenticated user.
//!
//! Failed mutations (no matching profile) answer 400 with a stable
//! reason, matching the long-standing client contract; only the plain
//! profile read distinguishes 404.

use axum::extract::State;
use axum::response::{IntoResponse, Response};
use axum::{Extension, Json};

use crate::api::{
    BlockedAppRequest, FcmTokenAddRequest, FcmTokenRemoveRequest, SettingsPatchRequest,
    SuccessMessage, UserResponse,
};
use crate::handlers::auth::CurrentUser;
use crate::handlers::problem_details;
use crate::server::AppState;
use crate::store::{StoreResult, UserRecord};

/// Collapse the store's `Option` into the contract's 400.
fn respond_mutation(result: StoreResult<Option<UserRecord>>, action: &str) -> Response {
    match result {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => problem_details::bad_request(format!("failed to {action}")),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// GET /api/v1/users/me
pub async fn my_profile(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
) -> Response {
    match state.users.get(&user_id).await {
        Ok(Some(user)) => Json(UserResponse::from(user)).into_response(),
        Ok(None) => problem_details::not_found("user not found"),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// PATCH /api/v1/users/me/settings
pub async fn update_my_settings(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<SettingsPatchRequest>,
) -> Response {
    respond_mutation(
        state.users.merge_settings(&user_id, req.settings).await,
        "update settings",
    )
}

/// POST /api/v1/users/me/fcm-tokens
pub async fn add_my_fcm_token(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<FcmTokenAddRequest>,
) -> Response {
    respond_mutation(
        state.users.add_fcm_token(&user_id, &req.token).await,
        "add FCM token",
    )
}

/// DELETE /api/v1/users/me/fcm-tokens
///
/// With no token in the body this clears the entire token set — reachable
/// contract behavior, kept deliberately.
pub async fn remove_my_fcm_token(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<FcmTokenRemoveRequest>,
) -> Response {
    match state
        .users
        .remove_fcm_token(&user_id, req.token.as_deref())
        .await
    {
        Ok(Some(_)) => Json(SuccessMessage::new("FCM token removed")).into_response(),
        Ok(None) => problem_details::bad_request("failed to remove FCM token"),
        Err(e) => problem_details::from_store_error(&e),
    }
}

/// POST /api/v1/users/me/blocked-apps
pub async fn add_my_blocked_app(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<BlockedAppRequest>,
) -> Response {
    respond_mutation(
        state.users.add_blocked_app(&user_id, &req.app_name).await,
        "add blocked app",
    )
}

/// DELETE /api/v1/users/me/blocked-apps
pub async fn remove_my_blocked_app(
    State(state): State<AppState>,
    Extension(CurrentUser(user_id)): Extension<CurrentUser>,
    Json(req): Json<BlockedAppRequest>,
) -> Response {
    respond_mutation(
        state
            .users
            .remove_blocked_app(&user_id, &req.app_name)
            .await,
        "remove blocked app",
    )
}
