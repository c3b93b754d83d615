use super::models::SessionId;
use super::normalize::Session;
use crate::utils::time::format_time;
use chrono::{Duration, NaiveDate};

/// One line of an instructor's course list
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CourseSummary {
    pub id: SessionId,
    pub date: NaiveDate,
    pub title: String,
    pub start_time: String,
    pub end_time: String,
    pub location: String,
    pub has_attendance: bool,
}

impl CourseSummary {
    fn from_session(session: &Session) -> Self {
        Self {
            id: session.id.clone(),
            date: session.date,
            title: session.course.name.clone(),
            start_time: format_time(session.start_time),
            end_time: format_time(session.end_time),
            location: session.course.location.clone(),
            has_attendance: session.course.requires_attendance,
        }
    }
}

fn courses_between(
    sessions: &[Session],
    professor_id: &str,
    first: NaiveDate,
    last: NaiveDate,
) -> Vec<CourseSummary> {
    let mut courses: Vec<CourseSummary> = sessions
        .iter()
        .filter(|s| s.professor_id() == Some(professor_id))
        .filter(|s| first <= s.date && s.date <= last)
        .map(CourseSummary::from_session)
        .collect();
    courses.sort_by(|a, b| (a.date, &a.start_time).cmp(&(b.date, &b.start_time)));
    courses
}

/// Courses the professor teaches on `today`, earliest first
pub fn todays_courses(
    sessions: &[Session],
    professor_id: &str,
    today: NaiveDate,
) -> Vec<CourseSummary> {
    courses_between(sessions, professor_id, today, today)
}

/// Courses the professor teaches from `week_start` through the sixth day after it
pub fn week_courses(
    sessions: &[Session],
    professor_id: &str,
    week_start: NaiveDate,
) -> Vec<CourseSummary> {
    courses_between(sessions, professor_id, week_start, week_start + Duration::days(6))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::components::calendar::normalize::test_support::session_owned_by;
    use chrono::NaiveTime;

    fn on(id: &str, professor: &str, day: u32, hour: u32) -> Session {
        let mut session = session_owned_by(id, Some(professor));
        session.date = NaiveDate::from_ymd_opt(2024, 3, day).unwrap();
        session.start_time = NaiveTime::from_hms_opt(hour, 0, 0).unwrap();
        session.end_time = NaiveTime::from_hms_opt(hour + 1, 0, 0).unwrap();
        session
    }

    #[test]
    fn test_todays_courses_sorted_and_filtered() {
        let sessions = vec![
            on("late", "p1", 4, 14),
            on("other-prof", "p2", 4, 8),
            on("early", "p1", 4, 8),
            on("tomorrow", "p1", 5, 8),
        ];
        let today = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let courses = todays_courses(&sessions, "p1", today);
        let ids: Vec<&str> = courses.iter().map(|c| c.id.as_str()).collect();
        assert_eq!(ids, vec!["early", "late"]);
        assert_eq!(courses[0].start_time, "08:00");
        assert_eq!(courses[0].end_time, "09:00");
        assert_eq!(courses[0].title, "Algorithmique");
        assert_eq!(courses[0].location, "Amphi A");
        assert!(!courses[0].has_attendance);
    }

    #[test]
    fn test_week_courses_inclusive_range() {
        let sessions = vec![
            on("monday", "p1", 4, 9),
            on("sunday", "p1", 10, 9),
            on("next-monday", "p1", 11, 9),
            on("before", "p1", 3, 9),
        ];
        let monday = NaiveDate::from_ymd_opt(2024, 3, 4).unwrap();
        let ids: Vec<String> = week_courses(&sessions, "p1", monday)
            .into_iter()
            .map(|c| c.id)
            .collect();
        assert_eq!(ids, vec!["monday", "sunday"]);
    }
}
