//! Entity stores over a generic document backend.
//!
//! Every store follows the same request path: resolve the caller's
//! identifier into an [`IdQuery`], fetch, run the ownership guard, then
//! perform the domain operation. The backend handle is constructed at
//! process start and injected — there is no ambient database state.

pub mod document;
pub mod error;
pub mod events;
pub mod feedback;
pub mod file;
pub mod ident;
pub mod sessions;
pub mod tasks;
pub mod users;

pub use document::{Document, DocumentBackend};
pub use error::{StoreError, StoreResult};
pub use events::{EventFilter, EventRecord, EventStore, NewEvent};
pub use feedback::{FeedbackFilter, FeedbackRecord, FeedbackStore, FeedbackType, NewFeedback};
pub use file::FileDatabase;
pub use ident::{IdQuery, RecordId};
pub use sessions::{NewSession, SessionPatch, SessionRecord, SessionStore};
pub use tasks::{NewTask, TaskPatch, TaskRecord, TaskStore};
pub use users::{UserRecord, UserStore};

// ============================================================================
// Ownership Guard
// ============================================================================

/// A record with an owning user.
pub trait Owned {
    /// Entity name used in errors ("session", "event", ...).
    const ENTITY: &'static str;

    /// The user id stored on the record.
    fn owner_id(&self) -> &str;
}

/// The one authorization rule shared by every read-one/mutate operation:
///
/// - absent record → `NotFound`
/// - present but owned by someone else → `Forbidden`
///
/// The two outcomes are deliberately distinct (a probe against another
/// user's record confirms its existence); collapsing them is a contract
/// change, not a refactor.
pub(crate) fn ensure_owned<T: Owned>(found: Option<T>, caller: &str, id: &str) -> StoreResult<T> {
    match found {
        None => Err(StoreError::not_found(T::ENTITY, id)),
        Some(record) if record.owner_id() != caller => Err(StoreError::forbidden(T::ENTITY, id)),
        Some(record) => Ok(record),
    }
}
