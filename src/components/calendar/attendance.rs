//! Attendance calendar and the gate deciding when an edit is an émargement.

use super::context::CalendarContext;
use super::models::{CalendarEntry, CalendarEvent, EntryKey, SessionId};
use super::normalize::Session;
use super::projector::{project, ColorPolicy};
use super::role_filter::ActingUser;
use super::view::SessionView;
use crate::components::class_sessions::{
    AttendanceRecord, AttendanceStatus, MarkAttendanceInput, SessionBackend,
};
use crate::components::session_cache::SessionCache;
use crate::error::{AppResult, Rejection};
use chrono::{Duration, NaiveDateTime};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Whether `now` lies in `[start, end + grace]` of the session.
/// A closing time past the end of the calendar leaves the window open.
pub fn is_window_active(session: &Session, now: NaiveDateTime, grace: Duration) -> bool {
    session.start() <= now
        && session
            .end()
            .checked_add_signed(grace)
            .map_or(true, |closes| now <= closes)
}

/// How an edit on the attendance calendar must be handled
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GateDecision {
    /// Send a "present" émargement
    Submit {
        session_id: SessionId,
        professor_id: String,
    },
    /// Refuse without any side effect
    Reject(Rejection),
    /// Plain edit of an ephemeral entry
    LocalEdit,
}

/// Decide what an edit means.
///
/// The window is checked against the session as the backend knows it, not
/// against the dragged event's times.
pub fn gate(
    entry: &CalendarEntry,
    known: Option<&Session>,
    user: Option<&ActingUser>,
    now: NaiveDateTime,
    grace: Duration,
) -> GateDecision {
    if !entry.is_session() {
        return GateDecision::LocalEdit;
    }
    let Some(session) = known else {
        return GateDecision::Reject(Rejection::SessionNotFound);
    };
    if !is_window_active(session, now, grace) {
        return GateDecision::Reject(Rejection::InactiveWindow);
    }
    match user {
        Some(user) if user.is_instructor() && user.owns(session) => GateDecision::Submit {
            session_id: session.id.clone(),
            professor_id: user.id.clone(),
        },
        _ => GateDecision::Reject(Rejection::PermissionDenied),
    }
}

/// Result of an edit on the attendance calendar
#[derive(Debug, Clone, PartialEq)]
pub enum AttendanceOutcome {
    Submitted(AttendanceRecord),
    LocalEdit,
}

/// The attendance-aware calendar. Session entries are never moved here;
/// editing one inside its active window signs the attendance sheet.
pub struct AttendanceCalendar {
    backend: Arc<dyn SessionBackend>,
    cache: SessionCache,
    context: CalendarContext,
    view: SessionView,
}

impl AttendanceCalendar {
    pub fn new(
        backend: Arc<dyn SessionBackend>,
        cache: SessionCache,
        context: CalendarContext,
    ) -> Self {
        Self {
            backend,
            cache,
            context,
            view: SessionView::new(),
        }
    }

    pub fn context(&self) -> &CalendarContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CalendarContext {
        &mut self.context
    }

    pub async fn refresh(&mut self) -> AppResult<()> {
        let snapshot = self.cache.get().await?;
        self.view.load(&snapshot, &self.context);
        Ok(())
    }

    pub fn sessions(&self) -> &[Session] {
        self.view.sessions()
    }

    pub fn entries(&self, now: NaiveDateTime) -> Vec<CalendarEntry> {
        let locale = self.context.locale;
        self.view
            .sessions()
            .iter()
            .map(|session| {
                CalendarEntry::Session(project(session, now, ColorPolicy::Attendance, locale))
            })
            .chain(
                self.view
                    .ephemeral()
                    .iter()
                    .cloned()
                    .map(CalendarEntry::Ephemeral),
            )
            .collect()
    }

    pub fn visible_entries(&self, now: NaiveDateTime) -> Vec<CalendarEntry> {
        self.context.visible(self.entries(now))
    }

    /// Sessions whose attendance can be signed at `now`
    pub fn open_sessions(&self, now: NaiveDateTime) -> Vec<&Session> {
        self.view
            .sessions()
            .iter()
            .filter(|s| is_window_active(s, now, self.context.attendance_grace))
            .collect()
    }

    /// New entries on this calendar are always local
    pub fn add_event(&mut self, event: CalendarEvent) {
        debug!("Adding ephemeral entry {}", event.id);
        self.view.add_ephemeral(event);
    }

    pub async fn update_event(
        &mut self,
        entry: CalendarEntry,
        now: NaiveDateTime,
    ) -> AppResult<AttendanceOutcome> {
        let known = self.view.find(&entry.event().id);
        let decision = gate(
            &entry,
            known,
            self.context.user.as_ref(),
            now,
            self.context.attendance_grace,
        );

        match decision {
            GateDecision::LocalEdit => {
                self.view.update_ephemeral(entry.into_event());
                Ok(AttendanceOutcome::LocalEdit)
            }
            GateDecision::Reject(rejection) => {
                warn!(
                    "Attendance edit of {} refused: {}",
                    entry.event().id,
                    rejection.user_message(self.context.locale)
                );
                Err(rejection.into())
            }
            GateDecision::Submit {
                session_id,
                professor_id,
            } => {
                let input = MarkAttendanceInput {
                    class_session_id: session_id.clone(),
                    professor_id,
                    status: AttendanceStatus::Present,
                    comments: Some(
                        t!("attendance_comment", locale = self.context.locale.as_str())
                            .to_string(),
                    ),
                };
                match self.backend.mark_attendance(input).await {
                    Ok(record) => {
                        info!("Attendance signed for session {}", session_id);
                        self.cache.invalidate().await;
                        Ok(AttendanceOutcome::Submitted(record))
                    }
                    Err(e) => {
                        error!("Attendance submission for {} failed: {}", session_id, e);
                        Err(e)
                    }
                }
            }
        }
    }

    pub fn delete_event(&mut self, key: &EntryKey) -> AppResult<()> {
        match key {
            EntryKey::Session(id) => {
                warn!("Refusing to delete class session {} from calendar", id);
                Err(Rejection::SessionNotDeletable.into())
            }
            EntryKey::Ephemeral(id) => {
                self.view.remove_ephemeral(id);
                Ok(())
            }
        }
    }
}
