//! Shared API types used by the server handlers and clients.
//!
//! These types define the contract between server and client.
//! Changes here affect both sides, preventing silent drift.
//!
//! Timestamps are RFC 3339 strings in responses and RFC 3339 input in
//! requests; durations are seconds (f64); goal durations are minutes.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};

use crate::store::{
    EventRecord, FeedbackRecord, FeedbackType, SessionRecord, TaskRecord, UserRecord,
};

// ============================================================================
// Session Types
// ============================================================================

/// Request to start a focus session.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StartSessionRequest {
    pub start_time: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    /// Goal focus time in minutes.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_duration: Option<f64>,
    /// Experimental profile to tag the session with.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
}

/// Sparse session update; only provided fields are applied.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateSessionRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub end_time: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub goal_duration: Option<f64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub interruption_count: Option<i64>,
}

/// A session as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionResponse {
    pub id: String,
    pub user_id: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub task_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub profile_id: Option<String>,
    pub start_time: String,
    #[serde(default)]
    pub end_time: Option<String>,
    /// Seconds; present once the session is closed.
    #[serde(default)]
    pub duration: Option<f64>,
    pub status: String,
    #[serde(default)]
    pub goal_duration: Option<f64>,
    pub interruption_count: i64,
}

impl From<SessionRecord> for SessionResponse {
    fn from(record: SessionRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            user_id: record.user_id,
            task_id: record.task_id,
            profile_id: record.profile_id,
            start_time: record.start_time.to_rfc3339(),
            end_time: record.end_time.map(|t| t.to_rfc3339()),
            duration: record.duration,
            status: record.status,
            goal_duration: record.goal_duration,
            interruption_count: record.interruption_count,
        }
    }
}

// ============================================================================
// Event Types
// ============================================================================

/// Request to record an activity event. Any owner field a client sends is
/// ignored; the authenticated caller always owns the event.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventRequest {
    pub timestamp: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub window_title: Option<String>,
    #[serde(default, skip_serializing_if = "Map::is_empty")]
    pub activity_vector: Map<String, Value>,
}

/// Response for event creation.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateEventResponse {
    pub event_id: String,
}

/// An event as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EventResponse {
    pub id: String,
    pub user_id: String,
    #[serde(default)]
    pub session_id: Option<String>,
    pub timestamp: String,
    #[serde(default)]
    pub app_name: Option<String>,
    #[serde(default)]
    pub window_title: Option<String>,
    #[serde(default)]
    pub activity_vector: Map<String, Value>,
}

impl From<EventRecord> for EventResponse {
    fn from(record: EventRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            user_id: record.user_id,
            session_id: record.session_id,
            timestamp: record.timestamp.to_rfc3339(),
            app_name: record.app_name,
            window_title: record.window_title,
            activity_vector: record.activity_vector,
        }
    }
}

// ============================================================================
// Task Types
// ============================================================================

/// Request to create a task.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateTaskRequest {
    pub name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arguments: Option<Vec<String>>,
}

/// Sparse task update; only provided fields overwrite.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct UpdateTaskRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<DateTime<Utc>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub status: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub linked_session_id: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_executable: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub target_arguments: Option<Vec<String>>,
}

/// A task as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TaskResponse {
    pub id: String,
    pub user_id: String,
    pub name: String,
    #[serde(default)]
    pub description: Option<String>,
    pub created_at: String,
    #[serde(default)]
    pub due_date: Option<String>,
    pub status: String,
    #[serde(default)]
    pub linked_session_id: Option<String>,
    #[serde(default)]
    pub target_executable: Option<String>,
    #[serde(default)]
    pub target_arguments: Option<Vec<String>>,
}

impl From<TaskRecord> for TaskResponse {
    fn from(record: TaskRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            user_id: record.user_id,
            name: record.name,
            description: record.description,
            created_at: record.created_at.to_rfc3339(),
            due_date: record.due_date.map(|t| t.to_rfc3339()),
            status: record.status,
            linked_session_id: record.linked_session_id,
            target_executable: record.target_executable,
            target_arguments: record.target_arguments,
        }
    }
}

// ============================================================================
// Feedback Types
// ============================================================================

/// Request to record feedback about an intervention.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct CreateFeedbackRequest {
    pub event_id: String,
    pub feedback_type: FeedbackType,
    pub timestamp: DateTime<Utc>,
}

/// Feedback as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FeedbackResponse {
    pub id: String,
    pub user_id: String,
    pub event_id: String,
    pub feedback_type: FeedbackType,
    pub timestamp: String,
}

impl From<FeedbackRecord> for FeedbackResponse {
    fn from(record: FeedbackRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            user_id: record.user_id,
            event_id: record.event_id,
            feedback_type: record.feedback_type,
            timestamp: record.timestamp.to_rfc3339(),
        }
    }
}

// ============================================================================
// User Types
// ============================================================================

/// Merge-patch for user settings: supplied keys overwrite, others stay.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SettingsPatchRequest {
    pub settings: Map<String, Value>,
}

/// Request to register a device notification token.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct FcmTokenAddRequest {
    pub token: String,
}

/// Request to remove a device notification token. With no token set, the
/// entire token set is cleared.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct FcmTokenRemoveRequest {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub token: Option<String>,
}

/// Request to add/remove a blocked application.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BlockedAppRequest {
    pub app_name: String,
}

/// A user profile as returned to callers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserResponse {
    pub id: String,
    pub email: String,
    pub created_at: String,
    #[serde(default)]
    pub last_login_at: Option<String>,
    #[serde(default)]
    pub settings: Map<String, Value>,
    #[serde(default)]
    pub fcm_tokens: Vec<String>,
    #[serde(default)]
    pub blocked_apps: Vec<String>,
}

impl From<UserRecord> for UserResponse {
    fn from(record: UserRecord) -> Self {
        Self {
            id: record.id.as_str().to_string(),
            email: record.email,
            created_at: record.created_at.to_rfc3339(),
            last_login_at: record.last_login_at.map(|t| t.to_rfc3339()),
            settings: record.settings,
            fcm_tokens: record.fcm_tokens,
            blocked_apps: record.blocked_apps,
        }
    }
}

/// Generic acknowledgement for operations without a richer payload.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SuccessMessage {
    pub success: bool,
    pub message: String,
}

impl SuccessMessage {
    pub fn new(message: impl Into<String>) -> Self {
        Self {
            success: true,
            message: message.into(),
        }
    }
}
