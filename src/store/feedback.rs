//! User feedback on system interventions.
//!
//! Each record is the user's judgment about one past event. Created once,
//! deletable by its owner, never updated.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::document::DocumentBackend;
use super::ensure_owned;
use super::error::{StoreError, StoreResult};
use super::ident::{IdQuery, RecordId};
use super::Owned;

const COLLECTION: &str = "user_feedback";
const ENTITY: &str = "feedback";

const DEFAULT_LIST_LIMIT: i64 = 50;
const MAX_LIST_LIMIT: i64 = 200;

// ============================================================================
// Records
// ============================================================================

/// The judgment kinds a user can hand back. Closed enum, unlike session
/// status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FeedbackType {
    /// "That flagged activity was actually work."
    IsWork,
    /// "I saw the distraction warning and ignored it on purpose."
    DistractionIgnored,
}

impl FeedbackType {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::IsWork => "is_work",
            Self::DistractionIgnored => "distraction_ignored",
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackRecord {
    pub id: RecordId,
    pub user_id: String,
    pub event_id: String,
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
}

impl Owned for FeedbackRecord {
    const ENTITY: &'static str = ENTITY;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

#[derive(Debug, Clone)]
pub struct NewFeedback {
    pub event_id: String,
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Clone, Default)]
pub struct FeedbackFilter {
    pub event_id: Option<String>,
    pub feedback_type: Option<FeedbackType>,
    pub limit: Option<i64>,
}

// ============================================================================
// Store
// ============================================================================

#[derive(Clone)]
pub struct FeedbackStore {
    db: Arc<dyn DocumentBackend>,
}

impl FeedbackStore {
    pub fn new(db: Arc<dyn DocumentBackend>) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: &IdQuery) -> StoreResult<Option<FeedbackRecord>> {
        let Some(doc) = self.db.find_one(COLLECTION, query).await? else {
            return Ok(None);
        };
        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))
    }

    pub async fn create(&self, user_id: &str, new: NewFeedback) -> StoreResult<FeedbackRecord> {
        if new.event_id.trim().is_empty() {
            return Err(StoreError::validation("event_id must not be empty"));
        }

        let record = FeedbackRecord {
            id: RecordId::mint_literal(),
            user_id: user_id.to_string(),
            event_id: new.event_id,
            feedback_type: new.feedback_type,
            timestamp: new.timestamp,
        };

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        self.db.insert_one(COLLECTION, doc).await?;
        Ok(record)
    }

    pub async fn get(&self, user_id: &str, feedback_id: &str) -> StoreResult<FeedbackRecord> {
        let query = IdQuery::literal(feedback_id);
        let found = self.fetch(&query).await?;
        ensure_owned(found, user_id, feedback_id)
    }

    /// Feedback for a user, newest first.
    pub async fn list(
        &self,
        user_id: &str,
        filter: FeedbackFilter,
    ) -> StoreResult<Vec<FeedbackRecord>> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT) as usize;

        let mut items: Vec<FeedbackRecord> = self
            .db
            .scan(COLLECTION)
            .await?
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<FeedbackRecord>(doc).ok())
            .filter(|f| f.user_id == user_id)
            .filter(|f| {
                filter
                    .event_id
                    .as_deref()
                    .is_none_or(|wanted| f.event_id == wanted)
            })
            .filter(|f| {
                filter
                    .feedback_type
                    .is_none_or(|wanted| f.feedback_type == wanted)
            })
            .collect();

        items.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        items.truncate(limit);
        Ok(items)
    }

    /// Hard delete, owner-gated.
    pub async fn delete(&self, user_id: &str, feedback_id: &str) -> StoreResult<()> {
        let query = IdQuery::literal(feedback_id);
        let found = self.fetch(&query).await?;
        ensure_owned(found, user_id, feedback_id)?;

        if !self.db.delete_one(COLLECTION, &query).await? {
            return Err(StoreError::not_found(ENTITY, feedback_id));
        }
        Ok(())
    }
}
