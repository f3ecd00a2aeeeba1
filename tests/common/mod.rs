//! Common test utilities.

use std::sync::Arc;

use axum::Router;
use tempfile::TempDir;

use focusd::handlers::auth::SignedTokenIdentity;
use focusd::server::{self, AppState};
use focusd::store::{
    EventStore, FeedbackStore, FileDatabase, SessionStore, TaskStore, UserRecord, UserStore,
};

/// Secret shared by the test app and `bearer`.
pub const TEST_SECRET: &[u8] = b"test-secret";

/// Create a test `AppState` over a fresh tempdir-backed database.
pub async fn test_state() -> AppState {
    let tmp = TempDir::new().unwrap();

    // Leak the TempDir so it doesn't get cleaned up during the test.
    // This is fine for tests - the OS will clean up on process exit.
    let tmp = Box::leak(Box::new(tmp));

    let db = Arc::new(FileDatabase::open(tmp.path().join("data")).await.unwrap());

    AppState {
        users: UserStore::new(db.clone()),
        sessions: SessionStore::new(db.clone()),
        events: EventStore::new(db.clone()),
        tasks: TaskStore::new(db.clone()),
        feedback: FeedbackStore::new(db),
        identity: Arc::new(SignedTokenIdentity::new(TEST_SECRET.to_vec())),
        max_connections: 16,
    }
}

/// Create a test app with fresh state.
#[allow(dead_code)]
pub async fn test_app() -> Router {
    server::build_app(test_state().await, 30)
}

/// Create a test app and keep the state for direct store access.
#[allow(dead_code)]
pub async fn test_app_with_state() -> (Router, AppState) {
    let state = test_state().await;
    let app = server::build_app(state.clone(), 30);
    (app, state)
}

/// `Authorization` header value for a user id, signed with `TEST_SECRET`.
#[allow(dead_code)]
pub fn bearer(user_id: &str) -> String {
    let identity = SignedTokenIdentity::new(TEST_SECRET.to_vec());
    format!("Bearer {}", identity.issue(user_id))
}

/// Create a user profile the way first login would.
#[allow(dead_code)]
pub async fn seed_user(state: &AppState, subject: &str, email: &str) -> UserRecord {
    state.users.get_or_create(subject, email).await.unwrap()
}
