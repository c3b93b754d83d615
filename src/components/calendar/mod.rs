//! Projection of class sessions onto calendar events, and the two calendars
//! built on it.

pub mod attendance;
mod context;
pub mod course_calendar;
pub mod digest;
pub mod models;
pub mod normalize;
pub mod optimistic;
pub mod projector;
mod role_filter;
mod view;

pub use attendance::{gate, is_window_active, AttendanceCalendar, AttendanceOutcome, GateDecision};
pub use context::CalendarContext;
pub use course_calendar::{AddOutcome, CourseCalendar, PendingUpdate, UpdateOutcome, UpdatePlan};
pub use digest::{todays_courses, week_courses, CourseSummary};
pub use models::{
    ephemeral_event, CalendarEntry, CalendarEvent, EntryKey, EventColor, EventMeta, SessionId,
    TemporalState,
};
pub use normalize::{normalize, normalize_all, Session};
pub use optimistic::{EditState, OptimisticOverlay, SessionPatch};
pub use projector::{classify, project, ColorPolicy};
pub use role_filter::{can_create_sessions, can_edit_session, filter_for_user, ActingUser, Role};
pub use view::SessionView;
