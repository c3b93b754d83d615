use super::models::SessionId;
use super::role_filter::Role;
use crate::components::class_sessions::models::{RawCourse, RawPerson, RawSession};
use crate::error::{malformed_session, AppResult};
use crate::utils::i18n::Locale;
use crate::utils::time::{combine, parse_session_date, parse_time_of_day};
use chrono::{NaiveDate, NaiveDateTime, NaiveTime};
use chrono_tz::Tz;
use tracing::warn;

#[derive(Debug, Clone, PartialEq)]
pub struct CourseInfo {
    pub id: Option<String>,
    /// Display name, never empty
    pub name: String,
    /// Room or place, never empty
    pub location: String,
    pub requires_attendance: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct PersonRef {
    pub id: Option<String>,
    pub name: Option<String>,
    pub role: Option<Role>,
}

#[derive(Debug, Clone, PartialEq)]
pub struct AcademicYearRef {
    pub id: Option<String>,
    pub period: Option<String>,
}

/// A class session in canonical form
#[derive(Debug, Clone, PartialEq)]
pub struct Session {
    pub id: SessionId,
    pub date: NaiveDate,
    pub start_time: NaiveTime,
    pub end_time: NaiveTime,
    pub course: CourseInfo,
    pub professor: Option<PersonRef>,
    pub class_representative: Option<PersonRef>,
    pub academic_year: Option<AcademicYearRef>,
}

impl Session {
    pub fn start(&self) -> NaiveDateTime {
        combine(self.date, self.start_time)
    }

    pub fn end(&self) -> NaiveDateTime {
        combine(self.date, self.end_time)
    }

    pub fn professor_id(&self) -> Option<&str> {
        self.professor.as_ref().and_then(|p| p.id.as_deref())
    }
}

fn non_empty(value: &Option<String>) -> Option<&str> {
    value.as_deref().map(str::trim).filter(|v| !v.is_empty())
}

fn normalize_course(course: Option<&RawCourse>, locale: Locale) -> CourseInfo {
    let locale = locale.as_str();
    let name = course
        .and_then(|c| non_empty(&c.title).or_else(|| non_empty(&c.name)))
        .map(str::to_string)
        .unwrap_or_else(|| t!("untitled_course", locale = locale).to_string());
    let location = course
        .and_then(|c| non_empty(&c.location))
        .map(str::to_string)
        .unwrap_or_else(|| t!("unspecified_location", locale = locale).to_string());

    CourseInfo {
        id: course.and_then(|c| c.id.clone()),
        name,
        location,
        requires_attendance: course.and_then(|c| c.has_attendance).unwrap_or(false),
    }
}

fn normalize_person(person: &RawPerson) -> PersonRef {
    PersonRef {
        id: person.id.clone(),
        name: non_empty(&person.name).map(str::to_string),
        role: non_empty(&person.role).map(Role::from_wire),
    }
}

/// Bring a backend record into canonical form.
///
/// Missing nested references fall back to defaults. A record without a
/// usable date or time of day cannot be placed on a calendar and is an error.
pub fn normalize(raw: &RawSession, tz: Tz, locale: Locale) -> AppResult<Session> {
    let date = raw
        .date
        .as_deref()
        .and_then(|d| parse_session_date(d, tz))
        .ok_or_else(|| malformed_session(&raw.id, &format!("unusable date {:?}", raw.date)))?;
    let start_time = raw
        .start_time
        .as_deref()
        .and_then(parse_time_of_day)
        .ok_or_else(|| {
            malformed_session(&raw.id, &format!("unusable start time {:?}", raw.start_time))
        })?;
    let end_time = raw
        .end_time
        .as_deref()
        .and_then(parse_time_of_day)
        .ok_or_else(|| {
            malformed_session(&raw.id, &format!("unusable end time {:?}", raw.end_time))
        })?;

    Ok(Session {
        id: raw.id.clone(),
        date,
        start_time,
        end_time,
        course: normalize_course(raw.course.as_ref(), locale),
        professor: raw.professor.as_ref().map(normalize_person),
        class_representative: raw.class_representative.as_ref().map(normalize_person),
        academic_year: raw.academic_year.as_ref().map(|year| AcademicYearRef {
            id: year.id.clone(),
            period: non_empty(&year.periode).map(str::to_string),
        }),
    })
}

/// Normalize a list, dropping records that cannot be placed
pub fn normalize_all(raws: &[RawSession], tz: Tz, locale: Locale) -> Vec<Session> {
    raws.iter()
        .filter_map(|raw| match normalize(raw, tz, locale) {
            Ok(session) => Some(session),
            Err(e) => {
                warn!("Skipping class session: {}", e);
                None
            }
        })
        .collect()
}
