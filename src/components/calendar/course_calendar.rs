use super::context::CalendarContext;
use super::models::{CalendarEntry, CalendarEvent, EntryKey, SessionId};
use super::normalize::Session;
use super::optimistic::{EditState, EditTicket, OptimisticOverlay, SessionPatch};
use super::projector::{project, ColorPolicy};
use super::role_filter::{can_create_sessions, can_edit_session};
use super::view::SessionView;
use crate::components::class_sessions::{
    CreateSessionInput, RawSession, SessionBackend, UpdateSessionInput,
};
use crate::components::session_cache::SessionCache;
use crate::error::{AppResult, Error, Rejection};
use crate::utils::time::{format_time, to_wire_date};
use chrono::NaiveDateTime;
use std::sync::Arc;
use tracing::{debug, error, info, warn};

/// Result of adding an event to the course calendar
#[derive(Debug, Clone, PartialEq)]
pub enum AddOutcome {
    /// Created on the backend; it shows up after the next refresh
    Persisted(RawSession),
    /// Kept as an ephemeral entry of this calendar
    Local,
}

/// Result of updating an event on the course calendar
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UpdateOutcome {
    /// The backend accepted the move
    Submitted,
    /// An ephemeral entry was edited in place
    Local,
}

/// A session move that has been patched locally and still has to be sent
#[derive(Debug, Clone)]
pub struct PendingUpdate {
    pub ticket: EditTicket,
    pub input: UpdateSessionInput,
}

/// What a calendar edit turned into
#[derive(Debug, Clone)]
pub enum UpdatePlan {
    Remote(PendingUpdate),
    Local,
}

/// The plain course calendar.
///
/// Sessions are moved optimistically: [`CourseCalendar::begin_update`]
/// patches the local list, the backend call runs, and
/// [`CourseCalendar::complete_update`] either confirms the patch (dropped on
/// the next refetch) or rolls it back at once. Both paths invalidate the
/// shared cache.
pub struct CourseCalendar {
    backend: Arc<dyn SessionBackend>,
    cache: SessionCache,
    context: CalendarContext,
    view: SessionView,
    overlay: OptimisticOverlay,
}

impl CourseCalendar {
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
            overlay: OptimisticOverlay::new(),
        }
    }

    pub fn context(&self) -> &CalendarContext {
        &self.context
    }

    pub fn context_mut(&mut self) -> &mut CalendarContext {
        &mut self.context
    }

    /// Pull the current snapshot from the cache, refetching if it was invalidated
    pub async fn refresh(&mut self) -> AppResult<()> {
        let snapshot = self.cache.get().await?;
        if self.view.load(&snapshot, &self.context) {
            for id in self.overlay.reconcile(snapshot.generation) {
                debug!("Session {} reconciled with generation {}", id, snapshot.generation);
            }
        }
        Ok(())
    }

    /// Visible sessions with optimistic patches applied
    pub fn sessions(&self) -> Vec<Session> {
        self.overlay.apply(self.view.sessions())
    }

    fn find_session(&self, id: &str) -> Option<Session> {
        let session = self.view.find(id)?;
        self.overlay.apply(std::slice::from_ref(session)).pop()
    }

    /// Every entry of this calendar as seen at `now`, ignoring colour toggles
    pub fn entries(&self, now: NaiveDateTime) -> Vec<CalendarEntry> {
        let locale = self.context.locale;
        self.sessions()
            .iter()
            .map(|session| {
                CalendarEntry::Session(project(session, now, ColorPolicy::Course, locale))
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

    /// Entries whose colour is currently visible
    pub fn visible_entries(&self, now: NaiveDateTime) -> Vec<CalendarEntry> {
        self.context.visible(self.entries(now))
    }

    pub fn can_create_sessions(&self) -> bool {
        can_create_sessions(self.context.user.as_ref())
    }

    pub fn edit_state(&self, id: &str) -> EditState {
        self.overlay.state(id)
    }

    /// Add an event. Events carrying all four back-references create a
    /// session on the backend; anything else stays local to this calendar.
    pub async fn add_event(&mut self, event: CalendarEvent) -> AppResult<AddOutcome> {
        let Some(meta) = event.meta.as_ref().and_then(|m| m.complete()) else {
            debug!("Adding ephemeral entry {}", event.id);
            self.view.add_ephemeral(event);
            return Ok(AddOutcome::Local);
        };

        if !self.can_create_sessions() {
            warn!("Session creation refused for {:?}", self.context.user);
            return Err(Rejection::PermissionDenied.into());
        }

        let input = CreateSessionInput {
            date: to_wire_date(self.context.timezone, event.start)?,
            start_time: format_time(event.start.time()),
            end_time: format_time(event.end.time()),
            academic_year_id: meta.academic_year_id.to_string(),
            course_id: meta.course_id.to_string(),
            professor_id: meta.professor_id.to_string(),
            class_representative_id: meta.class_representative_id.to_string(),
        };

        match self.backend.create_session(input).await {
            Ok(created) => {
                info!("Class session {} created from calendar", created.id);
                self.cache.invalidate().await;
                Ok(AddOutcome::Persisted(created))
            }
            Err(e) => {
                error!("Failed to create class session: {}", e);
                Err(e)
            }
        }
    }

    /// Check and apply an edit locally.
    ///
    /// A session edit is rejected without touching anything unless the
    /// acting user may edit that session. Otherwise the patch is applied and
    /// the returned plan carries the request to send.
    pub fn begin_update(&mut self, entry: CalendarEntry) -> AppResult<UpdatePlan> {
        let event = match entry {
            CalendarEntry::Ephemeral(event) => {
                if !self.view.update_ephemeral(event) {
                    debug!("Ignoring edit of unknown ephemeral entry");
                }
                return Ok(UpdatePlan::Local);
            }
            CalendarEntry::Session(event) => event,
        };

        let session = self
            .find_session(&event.id)
            .ok_or(Error::Rejected(Rejection::SessionNotFound))?;
        if !can_edit_session(self.context.user.as_ref(), &session) {
            let rejection = Rejection::PermissionDenied;
            warn!(
                "Edit of session {} refused for {:?}: {}",
                session.id,
                self.context.user,
                rejection.user_message(self.context.locale)
            );
            return Err(rejection.into());
        }

        let input = UpdateSessionInput {
            id: session.id.clone(),
            date: Some(to_wire_date(self.context.timezone, event.start)?),
            start_time: Some(format_time(event.start.time())),
            end_time: Some(format_time(event.end.time())),
        };
        let ticket = self.overlay.begin(SessionPatch::from_event(&event));
        info!("Session {} moved to {} - {}", session.id, event.start, event.end);

        Ok(UpdatePlan::Remote(PendingUpdate { ticket, input }))
    }

    /// Settle an edit once the backend answered
    pub async fn complete_update(
        &mut self,
        pending: PendingUpdate,
        result: AppResult<RawSession>,
    ) -> AppResult<()> {
        let outcome = match result {
            Ok(_) => {
                let generation = self.cache.peek().await.map_or(0, |s| s.generation);
                self.overlay.confirm(&pending.ticket, generation);
                Ok(())
            }
            Err(e) => {
                error!("Update of session {} failed: {}", pending.ticket.id, e);
                self.overlay.roll_back(&pending.ticket);
                Err(e)
            }
        };
        self.cache.invalidate().await;
        outcome
    }

    /// Apply an edit end to end: check, patch, send, settle, refresh
    pub async fn update_event(&mut self, entry: CalendarEntry) -> AppResult<UpdateOutcome> {
        let pending = match self.begin_update(entry)? {
            UpdatePlan::Local => return Ok(UpdateOutcome::Local),
            UpdatePlan::Remote(pending) => pending,
        };

        let result = self.backend.update_session(pending.input.clone()).await;
        self.complete_update(pending, result).await?;

        if let Err(e) = self.refresh().await {
            warn!("Refetch after session update failed: {}", e);
        }
        Ok(UpdateOutcome::Submitted)
    }

    /// Sessions can never be deleted from a calendar; ephemeral entries always can
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

    /// Ids of sessions with a local edit not yet reconciled
    pub fn pending_edits(&self) -> Vec<SessionId> {
        self.view
            .sessions()
            .iter()
            .filter(|s| self.overlay.state(&s.id) == EditState::Pending)
            .map(|s| s.id.clone())
            .collect()
    }
}
