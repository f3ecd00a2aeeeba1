//! Append-only activity events.
//!
//! Events are written once by the desktop agent and never mutated. Keys
//! are store-minted UUID strings, not native ids.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use std::sync::Arc;

use super::document::DocumentBackend;
use super::ensure_owned;
use super::error::{StoreError, StoreResult};
use super::ident::{IdQuery, RecordId};
use super::Owned;

const COLLECTION: &str = "events";
const ENTITY: &str = "event";

/// Hard ceiling on list sizes, applied regardless of what the caller asks
/// for.
pub const MAX_LIST_LIMIT: i64 = 1000;

/// Default list size when the caller does not specify one.
pub const DEFAULT_LIST_LIMIT: i64 = 100;

// ============================================================================
// Records
// ============================================================================

/// One immutable activity observation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventRecord {
    pub id: RecordId,
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub window_title: Option<String>,
    /// Arbitrary named features extracted by the agent.
    #[serde(default)]
    pub activity_vector: Map<String, Value>,
}

impl Owned for EventRecord {
    const ENTITY: &'static str = ENTITY;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Fields accepted at ingestion. The owner never appears here: it is
/// always the authenticated caller, whatever the request body claimed.
#[derive(Debug, Clone, Default)]
pub struct NewEvent {
    pub session_id: Option<String>,
    pub timestamp: DateTime<Utc>,
    pub app_name: Option<String>,
    pub window_title: Option<String>,
    pub activity_vector: Map<String, Value>,
}

/// List filter. Time bounds are inclusive on both ends.
#[derive(Debug, Clone, Default)]
pub struct EventFilter {
    pub session_id: Option<String>,
    pub start_time: Option<DateTime<Utc>>,
    pub end_time: Option<DateTime<Utc>>,
    pub limit: Option<i64>,
}

// ============================================================================
// Store
// ============================================================================

/// Append-only event store.
#[derive(Clone)]
pub struct EventStore {
    db: Arc<dyn DocumentBackend>,
}

impl EventStore {
    pub fn new(db: Arc<dyn DocumentBackend>) -> Self {
        Self { db }
    }

    /// Ingest one event, minting its id and forcing the owner to the
    /// caller. Returns the minted id.
    pub async fn create(&self, user_id: &str, new: NewEvent) -> StoreResult<String> {
        let record = EventRecord {
            id: RecordId::mint_literal(),
            user_id: user_id.to_string(),
            session_id: new.session_id,
            timestamp: new.timestamp,
            app_name: new.app_name,
            window_title: new.window_title,
            activity_vector: new.activity_vector,
        };
        let event_id = record.id.as_str().to_string();

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        self.db.insert_one(COLLECTION, doc).await?;
        Ok(event_id)
    }

    /// Fetch one event, owner-gated.
    pub async fn get(&self, user_id: &str, event_id: &str) -> StoreResult<EventRecord> {
        let query = IdQuery::literal(event_id);
        let found = match self.db.find_one(COLLECTION, &query).await? {
            None => None,
            Some(doc) => serde_json::from_value(doc)
                .map(Some)
                .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?,
        };
        ensure_owned(found, user_id, event_id)
    }

    /// Events for a user, newest first. The limit is clamped server-side
    /// to `1..=MAX_LIST_LIMIT` to bound resource use; out-of-range values
    /// are floored/capped, not rejected.
    pub async fn list(&self, user_id: &str, filter: EventFilter) -> StoreResult<Vec<EventRecord>> {
        let limit = filter
            .limit
            .unwrap_or(DEFAULT_LIST_LIMIT)
            .clamp(1, MAX_LIST_LIMIT) as usize;

        let mut events: Vec<EventRecord> = self
            .db
            .scan(COLLECTION)
            .await?
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<EventRecord>(doc).ok())
            .filter(|e| e.user_id == user_id)
            .filter(|e| {
                filter
                    .session_id
                    .as_deref()
                    .is_none_or(|wanted| e.session_id.as_deref() == Some(wanted))
            })
            .filter(|e| filter.start_time.is_none_or(|start| e.timestamp >= start))
            .filter(|e| filter.end_time.is_none_or(|end| e.timestamp <= end))
            .collect();

        events.sort_by(|a, b| b.timestamp.cmp(&a.timestamp));
        events.truncate(limit);
        Ok(events)
    }
}
