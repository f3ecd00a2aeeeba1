//! Focus-session lifecycle.
//!
//! A session opens `active` and is closed by a sparse update carrying an
//! `end_time` (and usually a terminal status). Duration is derived, never
//! stored independently of its endpoints.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::document::DocumentBackend;
use super::ensure_owned;
use super::error::{StoreError, StoreResult};
use super::ident::{IdQuery, RecordId};
use super::Owned;

const COLLECTION: &str = "sessions";
const ENTITY: &str = "session";

/// Known status values. The field is an open string — clients may write
/// others — but these are the ones the system itself reasons about.
pub mod status {
    pub const ACTIVE: &str = "active";
    pub const COMPLETED: &str = "completed";
    pub const CANCELLED: &str = "cancelled";
}

// ============================================================================
// Records
// ============================================================================

/// One bounded focus period.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionRecord {
    pub id: RecordId,
    /// Immutable after creation; no operation may change the owner.
    pub user_id: String,
    #[serde(default)]
    pub task_id: Option<String>,
    #[serde(default)]
    pub profile_id: Option<String>,
    pub start_time: DateTime<Utc>,
    #[serde(default)]
    pub end_time: Option<DateTime<Utc>>,
    /// Seconds, derived from `end_time - start_time` when the session is
    /// closed.
    #[serde(default)]
    pub duration: Option<f64>,
    pub status: String,
    /// Goal focus time in minutes.
    #[serde(default)]
    pub goal_duration: Option<f64>,
    #[serde(default)]
    pub interruption_count: i64,
}

impl Owned for SessionRecord {
    const ENTITY: &'static str = ENTITY;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Fields accepted when starting a session.
#[derive(Debug, Clone, Default)]
pub struct NewSession {
    pub task_id: Option<String>,
    pub profile_id: Option<String>,
    /// Required at the request schema; if it still arrives empty the
    /// server clock is used.
    pub start_time: Option<DateTime<Utc>>,
    pub goal_duration: Option<f64>,
}

/// Sparse update: only provided fields are applied.
#[derive(Debug, Clone, Default)]
pub struct SessionPatch {
    pub end_time: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub goal_duration: Option<f64>,
    pub interruption_count: Option<i64>,
}

impl SessionPatch {
    fn is_empty(&self) -> bool {
        self.end_time.is_none()
            && self.status.is_none()
            && self.goal_duration.is_none()
            && self.interruption_count.is_none()
    }
}

// ============================================================================
// Store
// ============================================================================

/// Session store: lifecycle, duration computation, "current" query.
#[derive(Clone)]
pub struct SessionStore {
    db: Arc<dyn DocumentBackend>,
}

impl SessionStore {
    pub fn new(db: Arc<dyn DocumentBackend>) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: &IdQuery) -> StoreResult<Option<SessionRecord>> {
        let Some(doc) = self.db.find_one(COLLECTION, query).await? else {
            return Ok(None);
        };
        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))
    }

    /// Open a new session in `active` status.
    pub async fn start(&self, user_id: &str, new: NewSession) -> StoreResult<SessionRecord> {
        let record = SessionRecord {
            id: RecordId::mint_native(),
            user_id: user_id.to_string(),
            task_id: new.task_id,
            profile_id: new.profile_id,
            start_time: new.start_time.unwrap_or_else(Utc::now),
            end_time: None,
            duration: None,
            status: status::ACTIVE.to_string(),
            goal_duration: new.goal_duration,
            interruption_count: 0,
        };

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        self.db.insert_one(COLLECTION, doc).await?;
        Ok(record)
    }

    /// Fetch one session, owner-gated.
    pub async fn get(&self, user_id: &str, session_id: &str) -> StoreResult<SessionRecord> {
        let query = IdQuery::strict(ENTITY, session_id)?;
        let found = self.fetch(&query).await?;
        ensure_owned(found, user_id, session_id)
    }

    /// The most-recently-started `active` session, if any.
    ///
    /// "At most one active session per user" is advisory: concurrent
    /// starts can leave several, and this picks the newest rather than
    /// failing.
    pub async fn current(&self, user_id: &str) -> StoreResult<Option<SessionRecord>> {
        let sessions = self.list(user_id, Some(status::ACTIVE), 1).await?;
        Ok(sessions.into_iter().next())
    }

    /// Sessions for a user, newest start first, optionally filtered by
    /// status.
    pub async fn list(
        &self,
        user_id: &str,
        status: Option<&str>,
        limit: usize,
    ) -> StoreResult<Vec<SessionRecord>> {
        let mut sessions: Vec<SessionRecord> = self
            .db
            .scan(COLLECTION)
            .await?
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<SessionRecord>(doc).ok())
            .filter(|s| s.user_id == user_id)
            .filter(|s| status.is_none_or(|wanted| s.status == wanted))
            .collect();

        sessions.sort_by(|a, b| b.start_time.cmp(&a.start_time));
        sessions.truncate(limit);
        Ok(sessions)
    }

    /// Apply a sparse update. Covers "end", "cancel", and plain field
    /// patches alike; an empty patch returns the record unchanged without
    /// writing.
    ///
    /// The duration is computed against the start time read here, not
    /// atomically with the write — a concurrent update of the same record
    /// can win the race. Accepted at this boundary.
    pub async fn update(
        &self,
        user_id: &str,
        session_id: &str,
        patch: SessionPatch,
    ) -> StoreResult<SessionRecord> {
        let query = IdQuery::strict(ENTITY, session_id)?;
        let found = self.fetch(&query).await?;
        let mut record = ensure_owned(found, user_id, session_id)?;

        if patch.is_empty() {
            return Ok(record);
        }

        if let Some(end_time) = patch.end_time {
            record.duration = Some(duration_seconds(record.start_time, end_time)?);
            record.end_time = Some(end_time);
        }

        if let Some(status) = patch.status {
            // Open string by contract: no transition table beyond the
            // duration check above.
            record.status = status;
        }

        if let Some(goal_duration) = patch.goal_duration {
            record.goal_duration = Some(goal_duration);
        }

        if let Some(count) = patch.interruption_count {
            if count < 0 {
                return Err(StoreError::validation("interruption_count must be >= 0"));
            }
            record.interruption_count = count;
        }

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        if !self.db.replace_one(COLLECTION, &query, doc).await? {
            return Err(StoreError::not_found(ENTITY, session_id));
        }
        Ok(record)
    }
}

/// Elapsed seconds between the session endpoints. Closing a session
/// before it started is a rejected operation, not a clamp.
fn duration_seconds(start: DateTime<Utc>, end: DateTime<Utc>) -> StoreResult<f64> {
    let seconds = (end - start).num_milliseconds() as f64 / 1000.0;
    if seconds < 0.0 {
        return Err(StoreError::validation("end_time must be after start_time"));
    }
    Ok(seconds)
}
