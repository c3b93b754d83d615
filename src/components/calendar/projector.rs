//! Maps normalized sessions onto calendar events.
//!
//! Both calendars classify sessions the same way but colour and title them
//! differently, so every projection names the [`ColorPolicy`] it renders for.

use super::models::{CalendarEvent, EventColor, EventMeta, TemporalState};
use super::normalize::Session;
use super::role_filter::Role;
use crate::utils::i18n::Locale;
use crate::utils::time::format_time;
use chrono::NaiveDateTime;

/// Which calendar an event is rendered for
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorPolicy {
    /// Plain course calendar: instructor-taught sessions stand out
    Course,
    /// Attendance calendar: sessions needing an émargement stand out
    Attendance,
}

/// Classify `[start, end]` against `now`.
/// An inverted range is never current.
pub fn classify(start: NaiveDateTime, end: NaiveDateTime, now: NaiveDateTime) -> TemporalState {
    if start <= now && now <= end {
        TemporalState::Current
    } else if end < now {
        TemporalState::Past
    } else {
        TemporalState::Future
    }
}

/// Colour of a session in the given calendar
pub fn color_for(policy: ColorPolicy, state: TemporalState, session: &Session) -> EventColor {
    let is_past = state == TemporalState::Past;
    match policy {
        ColorPolicy::Course => {
            let taught_by_instructor = session
                .professor
                .as_ref()
                .is_some_and(|p| p.role == Some(Role::Teacher));
            match (taught_by_instructor, is_past) {
                (true, true) => EventColor::Violet,
                (true, false) => EventColor::Orange,
                (false, true) => EventColor::Emerald,
                (false, false) => EventColor::Blue,
            }
        }
        ColorPolicy::Attendance => {
            if session.course.requires_attendance {
                return if is_past {
                    EventColor::Violet
                } else {
                    EventColor::Rose
                };
            }
            match state {
                TemporalState::Current => EventColor::Orange,
                TemporalState::Past => EventColor::Emerald,
                TemporalState::Future => EventColor::Blue,
            }
        }
    }
}

/// Human-readable status suffix used on the attendance calendar
pub fn status_annotation(state: TemporalState, locale: Locale) -> String {
    let locale = locale.as_str();
    match state {
        TemporalState::Current => t!("status_active", locale = locale),
        TemporalState::Past => t!("status_finished", locale = locale),
        TemporalState::Future => t!("status_upcoming", locale = locale),
    }
    .to_string()
}

/// Multi-line event description
pub fn describe(session: &Session, policy: ColorPolicy, locale: Locale) -> String {
    let l = locale.as_str();
    let tbd = t!("to_be_defined", locale = l).to_string();
    let professor = session
        .professor
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| tbd.clone());
    let representative = session
        .class_representative
        .as_ref()
        .and_then(|p| p.name.clone())
        .unwrap_or_else(|| tbd.clone());
    let period = session
        .academic_year
        .as_ref()
        .and_then(|y| y.period.clone())
        .unwrap_or_else(|| tbd.clone());

    let mut lines = vec![
        t!("description_professor", locale = l, name = professor).to_string(),
        t!("description_representative", locale = l, name = representative).to_string(),
        t!("description_academic_year", locale = l, period = period).to_string(),
    ];
    if policy == ColorPolicy::Course {
        lines.push(
            t!(
                "description_schedule",
                locale = l,
                start = format_time(session.start_time),
                end = format_time(session.end_time)
            )
            .to_string(),
        );
    }
    lines.join("\n")
}

fn back_references(session: &Session) -> EventMeta {
    EventMeta {
        course_id: session.course.id.clone(),
        professor_id: session.professor.as_ref().and_then(|p| p.id.clone()),
        class_representative_id: session
            .class_representative
            .as_ref()
            .and_then(|p| p.id.clone()),
        academic_year_id: session.academic_year.as_ref().and_then(|y| y.id.clone()),
    }
}

/// Project a session onto a calendar event as seen at `now`
pub fn project(
    session: &Session,
    now: NaiveDateTime,
    policy: ColorPolicy,
    locale: Locale,
) -> CalendarEvent {
    let start = session.start();
    let end = session.end();
    let state = classify(start, end, now);
    let name = session.course.name.clone();

    let (title, meta) = match policy {
        ColorPolicy::Course => (name.clone(), Some(back_references(session))),
        ColorPolicy::Attendance => (
            format!("{} {}", name, status_annotation(state, locale)),
            None,
        ),
    };

    CalendarEvent {
        id: session.id.clone(),
        title,
        description: describe(session, policy, locale),
        location: session.course.location.clone(),
        start,
        end,
        color: color_for(policy, state, session),
        label: name,
        meta,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::normalize::test_support::session_owned_by;
    use crate::components::calendar::normalize::PersonRef;
    use chrono::{Duration, NaiveDate, NaiveTime};

    fn at(h: u32, m: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2024, 3, 4)
            .unwrap()
            .and_hms_opt(h, m, 0)
            .unwrap()
    }

    /// The 09:00-10:30 session taught by a non-instructor account
    fn plain_session() -> Session {
        let mut session = session_owned_by("s1", Some("p1"));
        if let Some(professor) = session.professor.as_mut() {
            professor.role = None;
        }
        session
    }

    #[test]
    fn test_classification_boundaries() {
        let (start, end) = (at(9, 0), at(10, 30));
        assert_eq!(classify(start, end, at(8, 59)), TemporalState::Future);
        assert_eq!(classify(start, end, at(9, 0)), TemporalState::Current);
        assert_eq!(classify(start, end, at(10, 30)), TemporalState::Current);
        assert_eq!(classify(start, end, at(10, 31)), TemporalState::Past);
    }

    #[test]
    fn test_past_is_never_current() {
        let (start, end) = (at(9, 0), at(10, 30));
        let mut now = end + Duration::minutes(1);
        for _ in 0..500 {
            assert_eq!(classify(start, end, now), TemporalState::Past);
            now += Duration::minutes(7);
        }
    }

    #[test]
    fn test_inverted_range_does_not_panic() {
        // Ends before it starts
        let (start, end) = (at(10, 0), at(9, 0));
        assert_eq!(classify(start, end, at(9, 30)), TemporalState::Past);
        assert_eq!(classify(start, end, at(8, 0)), TemporalState::Future);
        assert_eq!(classify(start, end, at(11, 0)), TemporalState::Past);

        let mut session = plain_session();
        session.start_time = NaiveTime::from_hms_opt(10, 0, 0).unwrap();
        session.end_time = NaiveTime::from_hms_opt(9, 0, 0).unwrap();
        let event = project(&session, at(9, 30), ColorPolicy::Attendance, Locale::Fr);
        assert!(event.end < event.start);
        assert_eq!(event.color, EventColor::Emerald);
    }

    #[test]
    fn test_current_session_projection() {
        let event = project(&plain_session(), at(9, 30), ColorPolicy::Attendance, Locale::Fr);
        assert_eq!(event.start, at(9, 0));
        assert_eq!(event.end, at(10, 30));
        assert_eq!(event.color, EventColor::Orange);
        assert_eq!(event.title, "Algorithmique (Actif)");
        assert_eq!(event.label, "Algorithmique");
        assert_eq!(event.location, "Amphi A");
        assert!(event.meta.is_none());
    }

    #[test]
    fn test_attendance_colors_after_session() {
        let session = plain_session();
        let event = project(&session, at(11, 0), ColorPolicy::Attendance, Locale::Fr);
        assert_eq!(event.color, EventColor::Emerald);
        assert_eq!(event.title, "Algorithmique (Terminé)");

        let mut flagged = session.clone();
        flagged.course.requires_attendance = true;
        let event = project(&flagged, at(11, 0), ColorPolicy::Attendance, Locale::Fr);
        assert_eq!(event.color, EventColor::Violet);

        // Flagged sessions that are not over yet are rose
        assert_eq!(
            project(&flagged, at(9, 30), ColorPolicy::Attendance, Locale::Fr).color,
            EventColor::Rose
        );
        let upcoming = project(&flagged, at(8, 0), ColorPolicy::Attendance, Locale::En);
        assert_eq!(upcoming.color, EventColor::Rose);
        assert_eq!(upcoming.title, "Algorithmique (Upcoming)");
    }

    #[test]
    fn test_course_policy_colors() {
        let instructor_session = session_owned_by("s1", Some("p1"));
        assert_eq!(
            project(&instructor_session, at(8, 0), ColorPolicy::Course, Locale::Fr).color,
            EventColor::Orange
        );
        assert_eq!(
            project(&instructor_session, at(9, 30), ColorPolicy::Course, Locale::Fr).color,
            EventColor::Orange
        );
        assert_eq!(
            project(&instructor_session, at(11, 0), ColorPolicy::Course, Locale::Fr).color,
            EventColor::Violet
        );

        let other = plain_session();
        assert_eq!(
            project(&other, at(8, 0), ColorPolicy::Course, Locale::Fr).color,
            EventColor::Blue
        );
        assert_eq!(
            project(&other, at(11, 0), ColorPolicy::Course, Locale::Fr).color,
            EventColor::Emerald
        );
    }

    #[test]
    fn test_course_event_title_and_meta() {
        let event = project(
            &session_owned_by("s1", Some("p1")),
            at(8, 0),
            ColorPolicy::Course,
            Locale::Fr,
        );
        assert_eq!(event.title, "Algorithmique");
        let meta = event.meta.unwrap();
        assert_eq!(meta.course_id.as_deref(), Some("course-1"));
        assert_eq!(meta.professor_id.as_deref(), Some("p1"));
        assert_eq!(meta.class_representative_id, None);
    }

    #[test]
    fn test_descriptions() {
        let mut session = session_owned_by("s1", Some("p1"));
        session.class_representative = Some(PersonRef {
            id: Some("r1".into()),
            name: Some("Awa Diop".into()),
            role: None,
        });

        assert_eq!(
            describe(&session, ColorPolicy::Course, Locale::Fr),
            "Professeur: Prof. Dubois\nDélégué: Awa Diop\nAnnée académique: À définir\nHoraire: 09:00 - 10:30"
        );
        assert_eq!(
            describe(&session, ColorPolicy::Attendance, Locale::En),
            "Professor: Prof. Dubois\nRepresentative: Awa Diop\nAcademic year: TBD"
        );
    }
}
