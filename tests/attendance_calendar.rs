mod common;

use chrono::{Duration, NaiveDate, NaiveDateTime};
use common::{week_sessions, BackendCall, MockSessionBackend};
use emargement::components::calendar::{
    ephemeral_event, ActingUser, AttendanceCalendar, AttendanceOutcome, CalendarContext,
    CalendarEntry, EntryKey, EventColor, Role,
};
use emargement::components::class_sessions::AttendanceStatus;
use emargement::components::SessionCache;
use emargement::error::Rejection;
use emargement::utils::i18n::Locale;
use std::sync::Arc;

fn at(day: u32, h: u32, m: u32) -> NaiveDateTime {
    NaiveDate::from_ymd_opt(2024, 3, day)
        .unwrap()
        .and_hms_opt(h, m, 0)
        .unwrap()
}

async fn mounted(user: ActingUser) -> (AttendanceCalendar, MockSessionBackend, SessionCache) {
    let backend = MockSessionBackend::with_sessions(week_sessions());
    let shared = Arc::new(backend.clone());
    let cache = SessionCache::new(shared.clone());
    let context = CalendarContext::new(Some(user), Locale::Fr, chrono_tz::Europe::Paris);
    let mut calendar = AttendanceCalendar::new(shared, cache.clone(), context);
    calendar.refresh().await.unwrap();
    (calendar, backend, cache)
}

/// The entry for `id` as the widget hands it back after a drag
fn dragged(calendar: &AttendanceCalendar, id: &str, now: NaiveDateTime) -> CalendarEntry {
    let mut event = calendar
        .entries(now)
        .into_iter()
        .find(|entry| entry.event().id == id)
        .unwrap()
        .into_event();
    event.start = at(9, 8, 0);
    event.end = at(9, 9, 0);
    CalendarEntry::Session(event)
}

#[tokio::test]
async fn test_owner_signs_attendance_within_grace() {
    let (mut calendar, backend, cache) = mounted(ActingUser::new("prof-a", Role::Teacher)).await;
    // s1 ends at 10:30
    let now = at(4, 10, 59);

    let outcome = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap();
    assert!(matches!(outcome, AttendanceOutcome::Submitted(_)));
    assert!(cache.is_stale().await);

    let calls = backend.mutations().await;
    let [BackendCall::MarkAttendance(input)] = &calls[..] else {
        panic!("expected a single attendance call, got {:?}", calls);
    };
    assert_eq!(input.class_session_id, "s1");
    assert_eq!(input.professor_id, "prof-a");
    assert_eq!(input.status, AttendanceStatus::Present);
    assert_eq!(input.comments.as_deref(), Some("Émargé via calendrier"));
}

#[tokio::test]
async fn test_attendance_closes_after_grace() {
    let (mut calendar, backend, cache) = mounted(ActingUser::new("prof-a", Role::Teacher)).await;
    let now = at(4, 11, 1);

    let err = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::InactiveWindow));
    assert!(backend.mutations().await.is_empty());
    assert!(!cache.is_stale().await);
}

#[tokio::test]
async fn test_grace_period_is_configurable() {
    let backend = MockSessionBackend::with_sessions(week_sessions());
    let shared = Arc::new(backend.clone());
    let context = CalendarContext::new(
        Some(ActingUser::new("prof-a", Role::Teacher)),
        Locale::Fr,
        chrono_tz::Europe::Paris,
    )
    .with_attendance_grace(Duration::zero());
    let mut calendar = AttendanceCalendar::new(shared.clone(), SessionCache::new(shared), context);
    calendar.refresh().await.unwrap();

    let now = at(4, 10, 31);
    assert!(calendar.open_sessions(now).is_empty());
    let err = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::InactiveWindow));

    let now = at(4, 10, 30);
    let outcome = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap();
    assert!(matches!(outcome, AttendanceOutcome::Submitted(_)));
}

#[tokio::test]
async fn test_attendance_not_open_before_start() {
    let (mut calendar, backend, _) = mounted(ActingUser::new("prof-a", Role::Teacher)).await;
    let now = at(4, 8, 59);

    let err = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::InactiveWindow));
    assert!(backend.mutations().await.is_empty());
}

#[tokio::test]
async fn test_only_the_teaching_instructor_may_sign() {
    let (mut admin_calendar, backend, _) = mounted(ActingUser::new("admin", Role::Admin)).await;
    let now = at(4, 9, 30);

    let err = admin_calendar
        .update_event(dragged(&admin_calendar, "s1", now), now)
        .await
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::PermissionDenied));
    assert!(backend.mutations().await.is_empty());
}

#[tokio::test]
async fn test_submission_failure_leaves_calendar_unchanged() {
    let (mut calendar, backend, _) = mounted(ActingUser::new("prof-a", Role::Teacher)).await;
    backend.fail_attendance(true);
    let now = at(4, 9, 30);
    let before = calendar.entries(now);

    let err = calendar
        .update_event(dragged(&calendar, "s1", now), now)
        .await
        .unwrap_err();
    assert!(err.rejection().is_none());
    assert_eq!(calendar.entries(now), before);
}

#[tokio::test]
async fn test_active_sessions_are_annotated() {
    let (calendar, _, _) = mounted(ActingUser::new("admin", Role::Admin)).await;
    let now = at(4, 9, 30);

    let entries = calendar.entries(now);
    assert_eq!(entries[0].event().title, "Algorithmique (Actif)");
    assert_eq!(entries[0].color(), EventColor::Orange);
    assert_eq!(entries[1].color(), EventColor::Blue);

    let open: Vec<_> = calendar.open_sessions(now).iter().map(|s| s.id.clone()).collect();
    assert_eq!(open, vec!["s1".to_string()]);
}

#[tokio::test]
async fn test_ephemeral_entries_are_plain_edits() {
    let (mut calendar, backend, _) = mounted(ActingUser::new("prof-a", Role::Teacher)).await;
    let now = at(4, 9, 30);
    let note = ephemeral_event("Permanence", at(4, 17, 0), at(4, 18, 0), EventColor::Amber);
    let id = note.id.clone();
    calendar.add_event(note.clone());

    let mut edited = note;
    edited.title = "Permanence déplacée".to_string();
    let outcome = calendar
        .update_event(CalendarEntry::Ephemeral(edited), now)
        .await
        .unwrap();
    assert_eq!(outcome, AttendanceOutcome::LocalEdit);
    assert!(calendar
        .entries(now)
        .iter()
        .any(|e| e.event().title == "Permanence déplacée"));

    let err = calendar
        .delete_event(&EntryKey::Session("s1".to_string()))
        .unwrap_err();
    assert_eq!(err.rejection(), Some(Rejection::SessionNotDeletable));

    calendar.delete_event(&EntryKey::Ephemeral(id)).unwrap();
    assert_eq!(calendar.entries(now).len(), 1);
    assert!(backend.mutations().await.is_empty());
}
