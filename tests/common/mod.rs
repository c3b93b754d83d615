#![allow(dead_code)]

use async_trait::async_trait;
use emargement::components::class_sessions::models::{RawCourse, RawPerson};
use emargement::components::class_sessions::{
    AttendanceRecord, AttendanceStatus, CreateSessionInput, MarkAttendanceInput, RawSession,
    UpdateSessionInput,
};
use emargement::components::SessionBackend;
use emargement::error::{api_error, AppResult};
use emargement::utils::time::WeekWindow;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::Mutex;

/// A backend call as the mock saw it
#[derive(Debug, Clone, PartialEq)]
pub enum BackendCall {
    List,
    Create(CreateSessionInput),
    Update(UpdateSessionInput),
    MarkAttendance(MarkAttendanceInput),
}

/// In-memory stand-in for the class-session REST API.
///
/// Records every call and applies creates and updates to its own list, the
/// way the real backend would.
#[derive(Debug, Clone, Default)]
pub struct MockSessionBackend {
    sessions: Arc<Mutex<Vec<RawSession>>>,
    calls: Arc<Mutex<Vec<BackendCall>>>,
    fail_updates: Arc<AtomicBool>,
    fail_attendance: Arc<AtomicBool>,
}

impl MockSessionBackend {
    pub fn with_sessions(sessions: Vec<RawSession>) -> Self {
        Self {
            sessions: Arc::new(Mutex::new(sessions)),
            ..Default::default()
        }
    }

    pub fn fail_updates(&self, failing: bool) {
        self.fail_updates.store(failing, Ordering::SeqCst);
    }

    pub fn fail_attendance(&self, failing: bool) {
        self.fail_attendance.store(failing, Ordering::SeqCst);
    }

    pub async fn calls(&self) -> Vec<BackendCall> {
        self.calls.lock().await.clone()
    }

    /// Calls other than list fetches
    pub async fn mutations(&self) -> Vec<BackendCall> {
        self.calls
            .lock()
            .await
            .iter()
            .filter(|call| **call != BackendCall::List)
            .cloned()
            .collect()
    }

    pub async fn session(&self, id: &str) -> Option<RawSession> {
        self.sessions.lock().await.iter().find(|s| s.id == id).cloned()
    }
}

#[async_trait]
impl SessionBackend for MockSessionBackend {
    async fn list_sessions(&self, _window: Option<WeekWindow>) -> AppResult<Vec<RawSession>> {
        self.calls.lock().await.push(BackendCall::List);
        Ok(self.sessions.lock().await.clone())
    }

    async fn create_session(&self, input: CreateSessionInput) -> AppResult<RawSession> {
        self.calls.lock().await.push(BackendCall::Create(input.clone()));
        let mut sessions = self.sessions.lock().await;
        let created = RawSession {
            id: format!("created-{}", sessions.len() + 1),
            date: Some(input.date),
            start_time: Some(input.start_time),
            end_time: Some(input.end_time),
            course: Some(RawCourse {
                id: Some(input.course_id),
                ..Default::default()
            }),
            professor: Some(RawPerson {
                id: Some(input.professor_id),
                ..Default::default()
            }),
            ..Default::default()
        };
        sessions.push(created.clone());
        Ok(created)
    }

    async fn update_session(&self, input: UpdateSessionInput) -> AppResult<RawSession> {
        self.calls.lock().await.push(BackendCall::Update(input.clone()));
        if self.fail_updates.load(Ordering::SeqCst) {
            return Err(api_error(500, "update refused"));
        }

        let mut sessions = self.sessions.lock().await;
        let session = sessions
            .iter_mut()
            .find(|s| s.id == input.id)
            .ok_or_else(|| api_error(404, "not found"))?;
        if let Some(date) = input.date {
            session.date = Some(date);
        }
        if let Some(start) = input.start_time {
            session.start_time = Some(start);
        }
        if let Some(end) = input.end_time {
            session.end_time = Some(end);
        }
        Ok(session.clone())
    }

    async fn mark_attendance(&self, input: MarkAttendanceInput) -> AppResult<AttendanceRecord> {
        self.calls
            .lock()
            .await
            .push(BackendCall::MarkAttendance(input.clone()));
        if self.fail_attendance.load(Ordering::SeqCst) {
            return Err(api_error(503, "attendance service unavailable"));
        }
        Ok(AttendanceRecord {
            id: format!("emargement-{}", input.class_session_id),
            status: Some(AttendanceStatus::Present),
        })
    }
}

/// A backend record taught by `professor_id`
pub fn raw_session(
    id: &str,
    professor_id: &str,
    date: &str,
    start: &str,
    end: &str,
    course: &str,
) -> RawSession {
    RawSession {
        id: id.to_string(),
        date: Some(date.to_string()),
        start_time: Some(start.to_string()),
        end_time: Some(end.to_string()),
        course: Some(RawCourse {
            id: Some(format!("course-{}", id)),
            title: Some(course.to_string()),
            location: Some("Amphi A".to_string()),
            ..Default::default()
        }),
        professor: Some(RawPerson {
            id: Some(professor_id.to_string()),
            name: Some(format!("Prof. {}", professor_id)),
            role: Some("TEACHER".to_string()),
        }),
        ..Default::default()
    }
}

/// Two sessions in the week of Monday 2024-03-04
pub fn week_sessions() -> Vec<RawSession> {
    vec![
        raw_session("s1", "prof-a", "2024-03-04", "09:00", "10:30", "Algorithmique"),
        raw_session("s2", "prof-b", "2024-03-05", "14:00", "16:00", "Physique"),
    ]
}
