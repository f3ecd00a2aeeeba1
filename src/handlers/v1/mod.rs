//! Versioned API handlers.

mod events;
mod feedback;
mod sessions;
mod tasks;
mod users;

pub use events::{create_event, get_event, list_events};
pub use feedback::{create_feedback, delete_feedback, get_feedback, list_feedback};
pub use sessions::{current_session, get_session, list_sessions, start_session, update_session};
pub use tasks::{create_task, delete_task, get_task, list_tasks, update_task};
pub use users::{
    add_my_blocked_app, add_my_fcm_token, my_profile, remove_my_blocked_app, remove_my_fcm_token,
    update_my_settings,
};
