//! Store-level tests for the session lifecycle and its invariants.

use std::sync::Arc;
use std::sync::atomic::{AtomicUsize, Ordering};

use async_trait::async_trait;
use chrono::{Duration, TimeZone, Utc};
use tempfile::TempDir;

use focusd::store::{
    Document, DocumentBackend, EventFilter, FeedbackFilter, FeedbackType, FileDatabase, IdQuery,
    NewEvent, NewFeedback, NewSession, RecordId, SessionPatch, SessionStore, StoreError,
    StoreResult,
};

mod common;

use common::test_state;

fn t0() -> chrono::DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 8, 7, 9, 0, 0).unwrap()
}

// ============================================================================
// Session lifecycle
// ============================================================================

#[tokio::test]
async fn test_start_session_defaults() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                goal_duration: Some(25.0),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(session.status, "active");
    assert_eq!(session.user_id, "alice");
    assert_eq!(session.start_time, t0());
    assert_eq!(session.interruption_count, 0);
    assert!(session.end_time.is_none());
    assert!(session.duration.is_none());
}

#[tokio::test]
async fn test_start_session_without_start_time_uses_server_clock() {
    let state = test_state().await;

    let before = Utc::now();
    let session = state
        .sessions
        .start("alice", NewSession::default())
        .await
        .unwrap();
    let after = Utc::now();

    assert!(session.start_time >= before && session.start_time <= after);
}

#[tokio::test]
async fn test_close_session_computes_duration() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let end = t0() + Duration::seconds(3661);
    let closed = state
        .sessions
        .update(
            "alice",
            session.id.as_str(),
            SessionPatch {
                end_time: Some(end),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    assert_eq!(closed.duration, Some(3661.0));
    assert_eq!(closed.end_time, Some(end));
    // Status only changes when explicitly set.
    assert_eq!(closed.status, "active");
}

#[tokio::test]
async fn test_close_before_start_is_rejected_and_does_not_mutate() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = state
        .sessions
        .update(
            "alice",
            session.id.as_str(),
            SessionPatch {
                end_time: Some(t0() - Duration::seconds(1)),
                status: Some("completed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));

    let unchanged = state
        .sessions
        .get("alice", session.id.as_str())
        .await
        .unwrap();
    assert!(unchanged.end_time.is_none());
    assert!(unchanged.duration.is_none());
    assert_eq!(unchanged.status, "active");
}

#[tokio::test]
async fn test_negative_interruption_count_rejected() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = state
        .sessions
        .update(
            "alice",
            session.id.as_str(),
            SessionPatch {
                interruption_count: Some(-1),
                ..Default::default()
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Validation(_)));
}

#[tokio::test]
async fn test_status_is_an_open_string() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let updated = state
        .sessions
        .update(
            "alice",
            session.id.as_str(),
            SessionPatch {
                status: Some("paused-by-experiment".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(updated.status, "paused-by-experiment");
}

#[tokio::test]
async fn test_two_active_sessions_is_tolerated() {
    // The single-active-session rule is advisory only: nothing prevents a
    // second concurrent start, and `current` picks the newest.
    let state = test_state().await;

    let first = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let second = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0() + Duration::minutes(5)),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let listed = state.sessions.list("alice", None, 50).await.unwrap();
    assert_eq!(listed.len(), 2);
    // Newest start first.
    assert_eq!(listed[0].id, second.id);
    assert_eq!(listed[1].id, first.id);

    let current = state.sessions.current("alice").await.unwrap().unwrap();
    assert_eq!(current.id, second.id);
}

#[tokio::test]
async fn test_list_filters_by_status_and_owner() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .sessions
        .update(
            "alice",
            session.id.as_str(),
            SessionPatch {
                end_time: Some(t0() + Duration::minutes(30)),
                status: Some("completed".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0() + Duration::hours(1)),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .sessions
        .start(
            "bob",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let completed = state
        .sessions
        .list("alice", Some("completed"), 50)
        .await
        .unwrap();
    assert_eq!(completed.len(), 1);

    let all_alice = state.sessions.list("alice", None, 50).await.unwrap();
    assert_eq!(all_alice.len(), 2);

    let limited = state.sessions.list("alice", None, 1).await.unwrap();
    assert_eq!(limited.len(), 1);
}

// ============================================================================
// Ownership & identifier resolution
// ============================================================================

#[tokio::test]
async fn test_foreign_absent_and_malformed_ids_are_distinct() {
    let state = test_state().await;

    let session = state
        .sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let err = state
        .sessions
        .get("bob", session.id.as_str())
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::Forbidden { .. }));

    let err = state
        .sessions
        .get("alice", "507f1f77bcf86cd799439011")
        .await
        .unwrap_err();
    assert!(matches!(err, StoreError::NotFound { .. }));

    let err = state.sessions.get("alice", "???").await.unwrap_err();
    assert!(matches!(err, StoreError::InvalidIdentifier { .. }));
}

#[tokio::test]
async fn test_session_stored_under_string_key_is_still_found() {
    // Historical records sometimes hold the hex value as a plain string
    // key; lookups must tolerate both representations.
    let tmp = TempDir::new().unwrap();
    let db = Arc::new(FileDatabase::open(tmp.path()).await.unwrap());
    let sessions = SessionStore::new(db.clone());

    let hex = "507f1f77bcf86cd799439011";
    let doc = serde_json::json!({
        "id": {"repr": "literal", "value": hex},
        "user_id": "alice",
        "start_time": "2026-08-07T09:00:00Z",
        "status": "active",
        "interruption_count": 0
    });
    db.insert_one("sessions", doc).await.unwrap();

    let found = sessions.get("alice", hex).await.unwrap();
    assert_eq!(found.id, RecordId::Literal(hex.to_string()));
    assert_eq!(found.status, "active");
}

// ============================================================================
// No-op patch performs no write
// ============================================================================

/// Backend wrapper that counts writes, to pin the no-write guarantee of
/// empty patches.
struct CountingBackend {
    inner: FileDatabase,
    writes: AtomicUsize,
}

#[async_trait]
impl DocumentBackend for CountingBackend {
    async fn find_one(&self, collection: &str, query: &IdQuery) -> StoreResult<Option<Document>> {
        self.inner.find_one(collection, query).await
    }

    async fn insert_one(&self, collection: &str, doc: Document) -> StoreResult<()> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.insert_one(collection, doc).await
    }

    async fn replace_one(
        &self,
        collection: &str,
        query: &IdQuery,
        doc: Document,
    ) -> StoreResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.replace_one(collection, query, doc).await
    }

    async fn delete_one(&self, collection: &str, query: &IdQuery) -> StoreResult<bool> {
        self.writes.fetch_add(1, Ordering::SeqCst);
        self.inner.delete_one(collection, query).await
    }

    async fn scan(&self, collection: &str) -> StoreResult<Vec<Document>> {
        self.inner.scan(collection).await
    }
}

#[tokio::test]
async fn test_empty_patch_returns_record_without_writing() {
    let tmp = TempDir::new().unwrap();
    let backend = Arc::new(CountingBackend {
        inner: FileDatabase::open(tmp.path()).await.unwrap(),
        writes: AtomicUsize::new(0),
    });
    let sessions = SessionStore::new(backend.clone());

    let session = sessions
        .start(
            "alice",
            NewSession {
                start_time: Some(t0()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    let writes_after_start = backend.writes.load(Ordering::SeqCst);

    let unchanged = sessions
        .update("alice", session.id.as_str(), SessionPatch::default())
        .await
        .unwrap();

    assert_eq!(unchanged.start_time, session.start_time);
    assert_eq!(unchanged.status, session.status);
    assert_eq!(backend.writes.load(Ordering::SeqCst), writes_after_start);
}

// ============================================================================
// Events
// ============================================================================

#[tokio::test]
async fn test_event_owner_is_always_the_caller() {
    let state = test_state().await;

    let event_id = state
        .events
        .create(
            "alice",
            NewEvent {
                timestamp: t0(),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let event = state.events.get("alice", &event_id).await.unwrap();
    assert_eq!(event.user_id, "alice");
    assert!(event.session_id.is_none());
}

#[tokio::test]
async fn test_event_list_limit_is_clamped_not_rejected() {
    let state = test_state().await;

    for i in 0..3i64 {
        state
            .events
            .create(
                "alice",
                NewEvent {
                    timestamp: t0() + Duration::minutes(i),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
    }

    // Over the ceiling: accepted, effectively capped.
    let events = state
        .events
        .list(
            "alice",
            EventFilter {
                limit: Some(100_000),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(events.len(), 3);

    // Under the floor: floored to one result, not an error.
    let events = state
        .events
        .list(
            "alice",
            EventFilter {
                limit: Some(0),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(events.len(), 1);

    let events = state
        .events
        .list(
            "alice",
            EventFilter {
                limit: Some(-7),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(events.len(), 1);
}

#[tokio::test]
async fn test_event_list_session_filter() {
    let state = test_state().await;

    state
        .events
        .create(
            "alice",
            NewEvent {
                timestamp: t0(),
                session_id: Some("s-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    state
        .events
        .create(
            "alice",
            NewEvent {
                timestamp: t0() + Duration::minutes(1),
                ..Default::default()
            },
        )
        .await
        .unwrap();

    let scoped = state
        .events
        .list(
            "alice",
            EventFilter {
                session_id: Some("s-1".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(scoped.len(), 1);

    let all = state.events.list("alice", EventFilter::default()).await.unwrap();
    assert_eq!(all.len(), 2);
}

// ============================================================================
// Feedback
// ============================================================================

#[tokio::test]
async fn test_feedback_filtering() {
    let state = test_state().await;

    state
        .feedback
        .create(
            "alice",
            NewFeedback {
                event_id: "e-1".to_string(),
                feedback_type: FeedbackType::IsWork,
                timestamp: t0(),
            },
        )
        .await
        .unwrap();
    state
        .feedback
        .create(
            "alice",
            NewFeedback {
                event_id: "e-2".to_string(),
                feedback_type: FeedbackType::DistractionIgnored,
                timestamp: t0() + Duration::minutes(1),
            },
        )
        .await
        .unwrap();

    let is_work = state
        .feedback
        .list(
            "alice",
            FeedbackFilter {
                feedback_type: Some(FeedbackType::IsWork),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(is_work.len(), 1);
    assert_eq!(is_work[0].event_id, "e-1");

    let by_event = state
        .feedback
        .list(
            "alice",
            FeedbackFilter {
                event_id: Some("e-2".to_string()),
                ..Default::default()
            },
        )
        .await
        .unwrap();
    assert_eq!(by_event.len(), 1);
}

// ============================================================================
// User profile store
// ============================================================================

#[tokio::test]
async fn test_get_or_create_is_idempotent_per_subject() {
    let state = test_state().await;

    let first = state
        .users
        .get_or_create("sub-1", "a@example.com")
        .await
        .unwrap();
    let second = state
        .users
        .get_or_create("sub-1", "a@example.com")
        .await
        .unwrap();
    assert_eq!(first.id, second.id);

    let other = state
        .users
        .get_or_create("sub-2", "b@example.com")
        .await
        .unwrap();
    assert_ne!(first.id, other.id);
}

#[tokio::test]
async fn test_update_last_login_stamps_existing_user() {
    let state = test_state().await;
    let user = state
        .users
        .get_or_create("sub-1", "a@example.com")
        .await
        .unwrap();

    let before = Utc::now();
    let stamped = state
        .users
        .update_last_login(user.id.as_str())
        .await
        .unwrap()
        .unwrap();
    assert!(stamped.last_login_at.unwrap() >= before);

    let missing = state.users.update_last_login("ghost").await.unwrap();
    assert!(missing.is_none());
}

#[tokio::test]
async fn test_settings_merge_patch() {
    let state = test_state().await;
    let user = state
        .users
        .get_or_create("sub-1", "a@example.com")
        .await
        .unwrap();
    let uid = user.id.as_str().to_string();

    let mut patch = serde_json::Map::new();
    patch.insert("b".to_string(), serde_json::json!(2));
    state.users.merge_settings(&uid, patch).await.unwrap();

    let mut patch = serde_json::Map::new();
    patch.insert("a".to_string(), serde_json::json!(1));
    let merged = state
        .users
        .merge_settings(&uid, patch)
        .await
        .unwrap()
        .unwrap();

    assert_eq!(merged.settings["a"], 1);
    assert_eq!(merged.settings["b"], 2);
}

#[tokio::test]
async fn test_remove_fcm_token_wildcard_and_named() {
    let state = test_state().await;
    let user = state
        .users
        .get_or_create("sub-1", "a@example.com")
        .await
        .unwrap();
    let uid = user.id.as_str().to_string();

    state.users.add_fcm_token(&uid, "t1").await.unwrap();
    state.users.add_fcm_token(&uid, "t2").await.unwrap();

    // Named removal is idempotent.
    let after = state
        .users
        .remove_fcm_token(&uid, Some("t1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.fcm_tokens, vec!["t2".to_string()]);
    let after = state
        .users
        .remove_fcm_token(&uid, Some("t1"))
        .await
        .unwrap()
        .unwrap();
    assert_eq!(after.fcm_tokens, vec!["t2".to_string()]);

    // Wildcard clears everything.
    state.users.add_fcm_token(&uid, "t3").await.unwrap();
    let after = state
        .users
        .remove_fcm_token(&uid, None)
        .await
        .unwrap()
        .unwrap();
    assert!(after.fcm_tokens.is_empty());
}

#[tokio::test]
async fn test_user_mutations_on_missing_user_return_none() {
    let state = test_state().await;

    let result = state.users.add_fcm_token("ghost", "t1").await.unwrap();
    assert!(result.is_none());

    let result = state
        .users
        .merge_settings("ghost", serde_json::Map::new())
        .await
        .unwrap();
    assert!(result.is_none());
}

#[tokio::test]
async fn test_user_lookup_tolerates_both_key_forms() {
    let tmp = TempDir::new().unwrap();
    let db = Arc::new(FileDatabase::open(tmp.path()).await.unwrap());
    let state_users = focusd::store::UserStore::new(db.clone());

    let hex = "507f1f77bcf86cd799439011";
    let doc = serde_json::json!({
        "id": {"repr": "literal", "value": hex},
        "email": "legacy@example.com",
        "auth_subject": "sub-legacy",
        "created_at": "2024-01-01T00:00:00Z"
    });
    db.insert_one("users", doc).await.unwrap();

    // Hex-shaped lookup finds the string-keyed record.
    let user = state_users.get(hex).await.unwrap().unwrap();
    assert_eq!(user.email, "legacy@example.com");

    // And mutations through the same filter land on it.
    let updated = state_users.add_blocked_app(hex, "games.exe").await.unwrap();
    assert_eq!(updated.unwrap().blocked_apps, vec!["games.exe".to_string()]);
}
