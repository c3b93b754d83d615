use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};
use std::fmt;

/// Backend identifier of a class session
pub type SessionId = String;

/// Colour tags understood by the calendar widget
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum EventColor {
    Blue,
    Orange,
    Emerald,
    Violet,
    Rose,
    Amber,
}

impl EventColor {
    pub const ALL: [EventColor; 6] = [
        EventColor::Blue,
        EventColor::Orange,
        EventColor::Emerald,
        EventColor::Violet,
        EventColor::Rose,
        EventColor::Amber,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            EventColor::Blue => "blue",
            EventColor::Orange => "orange",
            EventColor::Emerald => "emerald",
            EventColor::Violet => "violet",
            EventColor::Rose => "rose",
            EventColor::Amber => "amber",
        }
    }
}

impl fmt::Display for EventColor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Where a session sits relative to "now"
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TemporalState {
    Past,
    Current,
    Future,
}

/// Back-references filled in by the session-creation dialog
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct EventMeta {
    pub course_id: Option<String>,
    pub professor_id: Option<String>,
    pub class_representative_id: Option<String>,
    pub academic_year_id: Option<String>,
}

/// The four ids a session needs to be created
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CompleteMeta<'a> {
    pub course_id: &'a str,
    pub professor_id: &'a str,
    pub class_representative_id: &'a str,
    pub academic_year_id: &'a str,
}

impl EventMeta {
    /// All four references, if every one of them is present and non-empty
    pub fn complete(&self) -> Option<CompleteMeta<'_>> {
        fn present(value: &Option<String>) -> Option<&str> {
            value.as_deref().filter(|v| !v.is_empty())
        }
        Some(CompleteMeta {
            course_id: present(&self.course_id)?,
            professor_id: present(&self.professor_id)?,
            class_representative_id: present(&self.class_representative_id)?,
            academic_year_id: present(&self.academic_year_id)?,
        })
    }
}

/// An event in the calendar widget's shape
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CalendarEvent {
    pub id: String,
    pub title: String,
    pub description: String,
    pub location: String,
    /// Local wall-clock start
    pub start: NaiveDateTime,
    /// Local wall-clock end
    pub end: NaiveDateTime,
    pub color: EventColor,
    pub label: String,
    #[serde(default)]
    pub meta: Option<EventMeta>,
}

/// A calendar entry and what backs it.
///
/// Session entries are views over backend records; ephemeral entries exist
/// only in the calendar that holds them and never reach the backend.
#[derive(Debug, Clone, PartialEq)]
pub enum CalendarEntry {
    Session(CalendarEvent),
    Ephemeral(CalendarEvent),
}

/// Identifies an entry together with its kind
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum EntryKey {
    Session(SessionId),
    Ephemeral(String),
}

impl CalendarEntry {
    pub fn event(&self) -> &CalendarEvent {
        match self {
            CalendarEntry::Session(event) | CalendarEntry::Ephemeral(event) => event,
        }
    }

    pub fn into_event(self) -> CalendarEvent {
        match self {
            CalendarEntry::Session(event) | CalendarEntry::Ephemeral(event) => event,
        }
    }

    pub fn is_session(&self) -> bool {
        matches!(self, CalendarEntry::Session(_))
    }

    pub fn key(&self) -> EntryKey {
        match self {
            CalendarEntry::Session(event) => EntryKey::Session(event.id.clone()),
            CalendarEntry::Ephemeral(event) => EntryKey::Ephemeral(event.id.clone()),
        }
    }

    pub fn color(&self) -> EventColor {
        self.event().color
    }
}

/// A new ephemeral entry with a fresh id
pub fn ephemeral_event(
    title: impl Into<String>,
    start: NaiveDateTime,
    end: NaiveDateTime,
    color: EventColor,
) -> CalendarEvent {
    let title = title.into();
    CalendarEvent {
        id: uuid::Uuid::new_v4().to_string(),
        label: title.clone(),
        title,
        description: String::new(),
        location: String::new(),
        start,
        end,
        color,
        meta: None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_meta_completeness() {
        let mut meta = EventMeta {
            course_id: Some("c1".to_string()),
            professor_id: Some("p1".to_string()),
            class_representative_id: Some("r1".to_string()),
            academic_year_id: Some("y1".to_string()),
        };
        let complete = meta.complete().unwrap();
        assert_eq!(complete.course_id, "c1");
        assert_eq!(complete.academic_year_id, "y1");

        meta.class_representative_id = Some(String::new());
        assert!(meta.complete().is_none());

        assert!(EventMeta::default().complete().is_none());
    }

    #[test]
    fn test_color_wire_names() {
        assert_eq!(serde_json::to_string(&EventColor::Emerald).unwrap(), "\"emerald\"");
        let parsed: EventColor = serde_json::from_str("\"rose\"").unwrap();
        assert_eq!(parsed, EventColor::Rose);
    }
}
