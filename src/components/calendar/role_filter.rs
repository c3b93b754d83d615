use super::normalize::Session;
use std::fmt;

/// Roles the backend assigns to users
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub enum Role {
    Admin,
    Teacher,
    Supervisor,
    ClassDelegate,
    Other(String),
}

impl Role {
    /// Map the backend's role tag; unknown tags are kept verbatim
    pub fn from_wire(tag: &str) -> Self {
        match tag.trim().to_ascii_uppercase().as_str() {
            "ADMIN" => Role::Admin,
            "TEACHER" => Role::Teacher,
            "SUPERVISOR" => Role::Supervisor,
            "CLASS_DELEGATE" => Role::ClassDelegate,
            _ => Role::Other(tag.trim().to_string()),
        }
    }

    pub fn as_wire(&self) -> &str {
        match self {
            Role::Admin => "ADMIN",
            Role::Teacher => "TEACHER",
            Role::Supervisor => "SUPERVISOR",
            Role::ClassDelegate => "CLASS_DELEGATE",
            Role::Other(tag) => tag,
        }
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_wire())
    }
}

/// The user on whose behalf the calendar acts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActingUser {
    pub id: String,
    pub role: Role,
}

impl ActingUser {
    pub fn new(id: impl Into<String>, role: Role) -> Self {
        Self {
            id: id.into(),
            role,
        }
    }

    pub fn is_instructor(&self) -> bool {
        self.role == Role::Teacher
    }

    /// Whether this user teaches the given session
    pub fn owns(&self, session: &Session) -> bool {
        session.professor_id() == Some(self.id.as_str())
    }
}

/// Sessions visible to `user`, in their original order.
///
/// Administrators see everything and instructors see their own sessions.
/// Every other role, and an unknown user, sees the full list.
pub fn filter_for_user(sessions: &[Session], user: Option<&ActingUser>) -> Vec<Session> {
    match user {
        Some(user) if user.role == Role::Teacher => sessions
            .iter()
            .filter(|session| user.owns(session))
            .cloned()
            .collect(),
        _ => sessions.to_vec(),
    }
}

/// Administrators, and instructors on their own sessions, may move a session
pub fn can_edit_session(user: Option<&ActingUser>, session: &Session) -> bool {
    match user {
        Some(user) => match user.role {
            Role::Admin => true,
            Role::Teacher => user.owns(session),
            _ => false,
        },
        None => false,
    }
}

/// Administrators and supervisors may create sessions from the calendar
pub fn can_create_sessions(user: Option<&ActingUser>) -> bool {
    matches!(
        user.map(|u| &u.role),
        Some(Role::Admin) | Some(Role::Supervisor)
    )
}
