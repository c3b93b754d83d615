use crate::components::calendar::{
    CalendarEntry, CalendarEvent, CourseSummary, Session, SessionId,
};
use crate::utils::i18n::Locale;
use crate::utils::time::{format_time, WeekWindow};
use std::collections::HashSet;

fn event_line(event: &CalendarEvent) -> String {
    format!(
        "• {} ({} - {}, {})\n",
        event.title,
        format_time(event.start.time()),
        format_time(event.end.time()),
        event.location
    )
}

/// The week's entries grouped by day
pub fn format_week_agenda(
    entries: &[CalendarEntry],
    window: &WeekWindow,
    locale: Locale,
) -> String {
    let l = locale.as_str();
    let mut message = t!("agenda_week_header", locale = l).to_string();
    message.push('\n');
    let mut any = false;

    for day in window.days() {
        let mut day_events: Vec<&CalendarEvent> = entries
            .iter()
            .map(CalendarEntry::event)
            .filter(|event| event.start.date() == day)
            .collect();
        if day_events.is_empty() {
            continue;
        }
        any = true;
        day_events.sort_by_key(|event| event.start);

        message.push_str(&format!("\n{}:\n", day.format("%d/%m")));
        for event in day_events {
            message.push_str(&event_line(event));
        }
    }

    if !any {
        return t!("agenda_empty", locale = l).to_string();
    }
    message
}

/// Session entries whose id was not in `previous`.
/// Nothing is new on the first load.
pub fn new_sessions<'a>(
    entries: &'a [CalendarEntry],
    previous: Option<&HashSet<SessionId>>,
) -> Vec<&'a CalendarEvent> {
    let Some(previous) = previous else {
        return Vec::new();
    };
    entries
        .iter()
        .filter_map(|entry| match entry {
            CalendarEntry::Session(event) if !previous.contains(&event.id) => Some(event),
            _ => None,
        })
        .collect()
}

pub fn format_new_sessions(events: &[&CalendarEvent], locale: Locale) -> Option<String> {
    if events.is_empty() {
        return None;
    }
    let mut message = t!("agenda_new_sessions_header", locale = locale.as_str()).to_string();
    message.push('\n');
    for event in events {
        message.push_str(&format!(
            "• {} ({})\n",
            event.title,
            event.start.format("%d/%m %H:%M")
        ));
    }
    Some(message)
}

/// Today's courses of an instructor
pub fn format_course_digest(courses: &[CourseSummary], locale: Locale) -> Option<String> {
    if courses.is_empty() {
        return None;
    }
    let mut message = t!("agenda_today_header", locale = locale.as_str()).to_string();
    message.push('\n');
    for course in courses {
        message.push_str(&format!(
            "• {} ({} - {}, {})\n",
            course.title, course.start_time, course.end_time, course.location
        ));
    }
    Some(message)
}

pub fn format_open_attendance(sessions: &[&Session], locale: Locale) -> Vec<String> {
    sessions
        .iter()
        .map(|session| {
            t!(
                "agenda_attendance_open",
                locale = locale.as_str(),
                title = session.course.name.as_str()
            )
            .to_string()
        })
        .collect()
}
