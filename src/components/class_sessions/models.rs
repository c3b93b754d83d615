use serde::{Deserialize, Serialize};
use tracing::warn;

/// Course reference as the backend nests it in a session.
/// Older payloads carry the display name under `name` instead of `title`.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawCourse {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub location: Option<String>,
    #[serde(default)]
    pub has_attendance: Option<bool>,
}

/// Professor or class representative reference
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawPerson {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub role: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct RawAcademicYear {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "period")]
    pub periode: Option<String>,
}

/// Class session record exactly as the backend returns it
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RawSession {
    pub id: String,
    #[serde(default)]
    pub date: Option<String>,
    #[serde(default, rename = "heureDebut", alias = "startTime")]
    pub start_time: Option<String>,
    #[serde(default, rename = "heureFin", alias = "endTime")]
    pub end_time: Option<String>,
    #[serde(default)]
    pub course: Option<RawCourse>,
    #[serde(default)]
    pub professor: Option<RawPerson>,
    #[serde(default)]
    pub class_representative: Option<RawPerson>,
    #[serde(default)]
    pub academic_year: Option<RawAcademicYear>,
}

/// The session list endpoint has answered with several envelopes over time.
/// Records are kept as raw JSON here so one bad element cannot hide the rest.
#[derive(Debug, Clone, Deserialize)]
#[serde(untagged)]
pub enum SessionListResponse {
    Bare(Vec<serde_json::Value>),
    #[serde(rename_all = "camelCase")]
    Wrapped {
        class_sessions: Vec<serde_json::Value>,
    },
    Data {
        data: Vec<serde_json::Value>,
    },
    Unknown(serde_json::Value),
}

impl SessionListResponse {
    /// Decode every record, skipping those that do not fit `RawSession`
    pub fn into_sessions(self) -> Vec<RawSession> {
        let records = match self {
            SessionListResponse::Bare(records)
            | SessionListResponse::Wrapped {
                class_sessions: records,
            }
            | SessionListResponse::Data { data: records } => records,
            SessionListResponse::Unknown(value) => {
                warn!("Unexpected session list payload, treating as empty: {}", value);
                return Vec::new();
            }
        };

        records
            .into_iter()
            .enumerate()
            .filter_map(|(index, record)| {
                match serde_json::from_value::<RawSession>(record) {
                    Ok(session) => Some(session),
                    Err(e) => {
                        warn!("Skipping undecodable class session at index {}: {}", index, e);
                        None
                    }
                }
            })
            .collect()
    }
}

/// Payload for creating a class session
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateSessionInput {
    pub date: String,
    #[serde(rename = "heureDebut")]
    pub start_time: String,
    #[serde(rename = "heureFin")]
    pub end_time: String,
    pub academic_year_id: String,
    pub course_id: String,
    pub professor_id: String,
    pub class_representative_id: String,
}

/// Payload for moving a class session; the id travels in the URL
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct UpdateSessionInput {
    #[serde(skip)]
    pub id: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub date: Option<String>,
    #[serde(rename = "heureDebut", skip_serializing_if = "Option::is_none")]
    pub start_time: Option<String>,
    #[serde(rename = "heureFin", skip_serializing_if = "Option::is_none")]
    pub end_time: Option<String>,
}

/// Attendance states tracked by the backend
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AttendanceStatus {
    Pending,
    Present,
    Absent,
    SupervisorConfirmed,
    ClassHeaderConfirmed,
}

/// Payload for an émargement
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct MarkAttendanceInput {
    pub class_session_id: String,
    pub professor_id: String,
    pub status: AttendanceStatus,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comments: Option<String>,
}

/// Attendance record returned after an émargement
#[derive(Debug, Clone, Default, PartialEq, Deserialize)]
pub struct AttendanceRecord {
    #[serde(default)]
    pub id: String,
    #[serde(default)]
    pub status: Option<AttendanceStatus>,
}
