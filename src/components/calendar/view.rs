use super::context::CalendarContext;
use super::models::CalendarEvent;
use super::normalize::{normalize_all, Session};
use super::role_filter::filter_for_user;
use crate::components::session_cache::CacheSnapshot;
use tracing::debug;

/// What one mounted calendar currently shows: the role-filtered sessions
/// from the last snapshot it loaded, plus its own ephemeral entries.
#[derive(Debug, Default)]
pub struct SessionView {
    /// Every placeable session of the snapshot, before role filtering
    known: Vec<Session>,
    sessions: Vec<Session>,
    generation: Option<u64>,
    ephemeral: Vec<CalendarEvent>,
}

impl SessionView {
    pub fn new() -> Self {
        Self::default()
    }

    /// Replace the sessions with those of `snapshot`.
    /// Returns false when that generation is already loaded.
    pub fn load(&mut self, snapshot: &CacheSnapshot, context: &CalendarContext) -> bool {
        if self.generation == Some(snapshot.generation) {
            return false;
        }
        self.known = normalize_all(&snapshot.sessions, context.timezone, context.locale);
        self.sessions = filter_for_user(&self.known, context.user.as_ref());
        self.generation = Some(snapshot.generation);
        debug!(
            "Loaded {} of {} sessions from generation {}",
            self.sessions.len(),
            snapshot.sessions.len(),
            snapshot.generation
        );
        true
    }

    pub fn sessions(&self) -> &[Session] {
        &self.sessions
    }

    /// Look a session up by id, including sessions filtered out for this user
    pub fn find(&self, id: &str) -> Option<&Session> {
        self.known.iter().find(|s| s.id == id)
    }

    pub fn generation(&self) -> Option<u64> {
        self.generation
    }

    pub fn ephemeral(&self) -> &[CalendarEvent] {
        &self.ephemeral
    }

    pub fn add_ephemeral(&mut self, event: CalendarEvent) {
        self.ephemeral.push(event);
    }

    /// Replace the ephemeral entry with the same id. Returns whether one existed.
    pub fn update_ephemeral(&mut self, event: CalendarEvent) -> bool {
        match self.ephemeral.iter_mut().find(|e| e.id == event.id) {
            Some(existing) => {
                *existing = event;
                true
            }
            None => false,
        }
    }

    pub fn remove_ephemeral(&mut self, id: &str) -> bool {
        let before = self.ephemeral.len();
        self.ephemeral.retain(|e| e.id != id);
        self.ephemeral.len() != before
    }
}
