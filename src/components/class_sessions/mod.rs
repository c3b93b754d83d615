mod actor;
mod handle;
pub mod models;

pub use handle::ClassSessionHandle;
pub use models::{
    AttendanceRecord, AttendanceStatus, CreateSessionInput, MarkAttendanceInput, RawSession,
    UpdateSessionInput,
};

use crate::error::AppResult;
use crate::utils::time::WeekWindow;
use async_trait::async_trait;

/// The backend operations the calendars depend on.
///
/// Implemented by [`ClassSessionHandle`] against the REST API; tests supply
/// their own recording implementations.
#[async_trait]
pub trait SessionBackend: Send + Sync {
    /// Fetch the session list, optionally scoped to one week
    async fn list_sessions(&self, window: Option<WeekWindow>) -> AppResult<Vec<RawSession>>;

    /// Create a class session
    async fn create_session(&self, input: CreateSessionInput) -> AppResult<RawSession>;

    /// Move a class session to another date or time
    async fn update_session(&self, input: UpdateSessionInput) -> AppResult<RawSession>;

    /// Record an émargement for a session
    async fn mark_attendance(&self, input: MarkAttendanceInput) -> AppResult<AttendanceRecord>;
}
