use super::models::{CalendarEvent, SessionId};
use super::normalize::Session;
use chrono::{NaiveDate, NaiveTime};
use std::collections::HashMap;
use tracing::debug;

/// Lifecycle of a local edit to one session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum EditState {
    /// No edit has been made
    Idle,
    /// Patched locally; the backend has not been heard from, or has
    /// accepted the edit but no refetch has replaced the patch yet
    Pending,
    /// A refetch after a successful update replaced the patch
    Reconciled,
    /// The update failed and the patch was dropped
    RolledBack,
}

/// New placement for a session
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SessionPatch {
    pub id: SessionId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
}

impl SessionPatch {
    /// The placement a calendar event was dragged or resized to
    pub fn from_event(event: &CalendarEvent) -> Self {
        Self {
            id: event.id.clone(),
            date: event.start.date(),
            start_time: event.start.time(),
            end_time: event.end.time(),
        }
    }

    pub fn apply_to(&self, session: &mut Session) {
        session.date = self.date;
        session.start_time = self.start_time;
        session.end_time = self.end_time;
    }
}

/// Identifies one edit; a later edit to the same session supersedes it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EditTicket {
    pub id: SessionId,
    seq: u64,
}

#[derive(Debug, Clone)]
struct Edit {
    patch: SessionPatch,
    seq: u64,
    /// Cache generation current when the backend accepted the edit
    confirmed_at: Option<u64>,
}

/// Local, transient patches laid over the cached session list.
///
/// Never written back to the shared cache.
#[derive(Debug, Default)]
pub struct OptimisticOverlay {
    edits: HashMap<SessionId, Edit>,
    settled: HashMap<SessionId, EditState>,
    next_seq: u64,
}

impl OptimisticOverlay {
    pub fn new() -> Self {
        Self::default()
    }

    /// Patch a session locally. Replaces any earlier patch for it.
    pub fn begin(&mut self, patch: SessionPatch) -> EditTicket {
        self.next_seq += 1;
        let ticket = EditTicket {
            id: patch.id.clone(),
            seq: self.next_seq,
        };
        debug!("Optimistic patch applied to session {}", patch.id);
        self.settled.remove(&patch.id);
        self.edits.insert(
            patch.id.clone(),
            Edit {
                patch,
                seq: ticket.seq,
                confirmed_at: None,
            },
        );
        ticket
    }

    fn current(&mut self, ticket: &EditTicket) -> Option<&mut Edit> {
        self.edits
            .get_mut(&ticket.id)
            .filter(|edit| edit.seq == ticket.seq)
    }

    /// The backend accepted the edit. The patch stays until a refetch newer
    /// than `generation` arrives.
    pub fn confirm(&mut self, ticket: &EditTicket, generation: u64) {
        if let Some(edit) = self.current(ticket) {
            edit.confirmed_at = Some(generation);
        }
    }

    /// The backend refused the edit; drop the patch right away
    pub fn roll_back(&mut self, ticket: &EditTicket) {
        if self.current(ticket).is_some() {
            self.edits.remove(&ticket.id);
            self.settled.insert(ticket.id.clone(), EditState::RolledBack);
            debug!("Optimistic patch rolled back for session {}", ticket.id);
        }
    }

    /// A snapshot of `generation` arrived; drop patches it supersedes.
    /// Returns the ids that became reconciled.
    pub fn reconcile(&mut self, generation: u64) -> Vec<SessionId> {
        let reconciled: Vec<SessionId> = self
            .edits
            .iter()
            .filter(|(_, edit)| edit.confirmed_at.is_some_and(|at| generation > at))
            .map(|(id, _)| id.clone())
            .collect();
        for id in &reconciled {
            self.edits.remove(id);
            self.settled.insert(id.clone(), EditState::Reconciled);
        }
        reconciled
    }

    pub fn state(&self, id: &str) -> EditState {
        if self.edits.contains_key(id) {
            EditState::Pending
        } else {
            self.settled.get(id).copied().unwrap_or(EditState::Idle)
        }
    }

    pub fn pending_count(&self) -> usize {
        self.edits.len()
    }

    /// The session list with every live patch applied, order preserved
    pub fn apply(&self, sessions: &[Session]) -> Vec<Session> {
        sessions
            .iter()
            .map(|session| {
                let mut session = session.clone();
                if let Some(edit) = self.edits.get(&session.id) {
                    edit.patch.apply_to(&mut session);
                }
                session
            })
            .collect()
    }
}
