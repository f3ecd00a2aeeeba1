//! User-defined tasks.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;

use super::document::DocumentBackend;
use super::ensure_owned;
use super::error::{StoreError, StoreResult};
use super::ident::{IdQuery, RecordId};
use super::Owned;

const COLLECTION: &str = "tasks";
const ENTITY: &str = "task";

/// Status a freshly created task starts in.
pub const STATUS_PENDING: &str = "pending";

// ============================================================================
// Records
// ============================================================================

/// A unit of work the user intends to focus on.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskRecord {
    pub id: RecordId,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub due_date: Option<DateTime<Utc>>,
    pub status: String,
    #[serde(default)]
    pub linked_session_id: Option<String>,
    /// Launch automation: executable to start when the task begins.
    #[serde(default)]
    pub target_executable: Option<String>,
    #[serde(default)]
    pub target_arguments: Option<Vec<String>>,
}

impl Owned for TaskRecord {
    const ENTITY: &'static str = ENTITY;

    fn owner_id(&self) -> &str {
        &self.user_id
    }
}

/// Fields accepted at creation.
#[derive(Debug, Clone, Default)]
pub struct NewTask {
    pub name: String,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub target_executable: Option<String>,
    pub target_arguments: Option<Vec<String>>,
}

/// Sparse update: only provided fields overwrite.
#[derive(Debug, Clone, Default)]
pub struct TaskPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub due_date: Option<DateTime<Utc>>,
    pub status: Option<String>,
    pub linked_session_id: Option<String>,
    pub target_executable: Option<String>,
    pub target_arguments: Option<Vec<String>>,
}

impl TaskPatch {
    fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.due_date.is_none()
            && self.status.is_none()
            && self.linked_session_id.is_none()
            && self.target_executable.is_none()
            && self.target_arguments.is_none()
    }
}

// ============================================================================
// Store
// ============================================================================

#[derive(Clone)]
pub struct TaskStore {
    db: Arc<dyn DocumentBackend>,
}

impl TaskStore {
    pub fn new(db: Arc<dyn DocumentBackend>) -> Self {
        Self { db }
    }

    async fn fetch(&self, query: &IdQuery) -> StoreResult<Option<TaskRecord>> {
        let Some(doc) = self.db.find_one(COLLECTION, query).await? else {
            return Ok(None);
        };
        serde_json::from_value(doc)
            .map(Some)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))
    }

    pub async fn create(&self, user_id: &str, new: NewTask) -> StoreResult<TaskRecord> {
        if new.name.trim().is_empty() {
            return Err(StoreError::validation("task name must not be empty"));
        }

        let record = TaskRecord {
            id: RecordId::mint_native(),
            user_id: user_id.to_string(),
            name: new.name,
            description: new.description,
            created_at: Utc::now(),
            due_date: new.due_date,
            status: STATUS_PENDING.to_string(),
            linked_session_id: None,
            target_executable: new.target_executable,
            target_arguments: new.target_arguments,
        };

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        self.db.insert_one(COLLECTION, doc).await?;
        Ok(record)
    }

    pub async fn get(&self, user_id: &str, task_id: &str) -> StoreResult<TaskRecord> {
        let query = IdQuery::strict(ENTITY, task_id)?;
        let found = self.fetch(&query).await?;
        ensure_owned(found, user_id, task_id)
    }

    /// All tasks for a user. No guard: the owner is baked into the filter.
    pub async fn list(&self, user_id: &str) -> StoreResult<Vec<TaskRecord>> {
        Ok(self
            .db
            .scan(COLLECTION)
            .await?
            .into_iter()
            .filter_map(|doc| serde_json::from_value::<TaskRecord>(doc).ok())
            .filter(|t| t.user_id == user_id)
            .collect())
    }

    /// Apply a sparse update; an empty patch is a read.
    pub async fn update(
        &self,
        user_id: &str,
        task_id: &str,
        patch: TaskPatch,
    ) -> StoreResult<TaskRecord> {
        let query = IdQuery::strict(ENTITY, task_id)?;
        let found = self.fetch(&query).await?;
        let mut record = ensure_owned(found, user_id, task_id)?;

        if patch.is_empty() {
            return Ok(record);
        }

        if let Some(name) = patch.name {
            if name.trim().is_empty() {
                return Err(StoreError::validation("task name must not be empty"));
            }
            record.name = name;
        }
        if let Some(description) = patch.description {
            record.description = Some(description);
        }
        if let Some(due_date) = patch.due_date {
            record.due_date = Some(due_date);
        }
        if let Some(status) = patch.status {
            record.status = status;
        }
        if let Some(linked_session_id) = patch.linked_session_id {
            record.linked_session_id = Some(linked_session_id);
        }
        if let Some(target_executable) = patch.target_executable {
            record.target_executable = Some(target_executable);
        }
        if let Some(target_arguments) = patch.target_arguments {
            record.target_arguments = Some(target_arguments);
        }

        let doc = serde_json::to_value(&record)
            .map_err(|e| StoreError::backend_data(COLLECTION, e.to_string()))?;
        if !self.db.replace_one(COLLECTION, &query, doc).await? {
            return Err(StoreError::not_found(ENTITY, task_id));
        }
        Ok(record)
    }

    /// Hard delete, owner-gated.
    pub async fn delete(&self, user_id: &str, task_id: &str) -> StoreResult<()> {
        let query = IdQuery::strict(ENTITY, task_id)?;
        let found = self.fetch(&query).await?;
        ensure_owned(found, user_id, task_id)?;

        if !self.db.delete_one(COLLECTION, &query).await? {
            return Err(StoreError::not_found(ENTITY, task_id));
        }
        Ok(())
    }
}
