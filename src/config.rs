use crate::components::calendar::{ActingUser, EventColor, Role};
use crate::error::{config_error, AppResult};
use crate::utils::i18n::Locale;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::collections::HashMap;
use std::env;
use std::fs;
use std::path::Path;
use std::str::FromStr;
use std::time::Duration;

/// Default backend location when API_BASE_URL is unset
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:3000";
/// Default timezone for session wall-clock times
pub const DEFAULT_TIMEZONE: Tz = chrono_tz::Europe::Paris;
/// Minutes after a session ends during which attendance can still be submitted
pub const DEFAULT_ATTENDANCE_GRACE_MINUTES: i64 = 30;
/// Longest accepted grace period: one week
pub const MAX_ATTENDANCE_GRACE_MINUTES: i64 = 7 * 24 * 60;
/// Seconds between agenda refreshes
pub const DEFAULT_REFRESH_INTERVAL_SECS: u64 = 300;

/// Main configuration structure
#[derive(Debug, Clone)]
pub struct Config {
    /// Base URL of the attendance backend
    pub api_base_url: String,
    /// Bearer credential attached to every backend call
    pub api_token: Option<String>,
    /// Identifier of the acting user
    pub user_id: Option<String>,
    /// Role of the acting user as the backend names it
    pub user_role: Option<String>,
    /// Timezone session dates and times are expressed in
    pub timezone: Tz,
    /// Locale for user-visible strings
    pub locale: Locale,
    /// Seconds between agenda refreshes
    pub refresh_interval_secs: u64,
    /// Grace period after a session ends for attendance submission
    pub attendance_grace_minutes: i64,
    /// Optional request timeout; the HTTP client default applies when unset
    pub request_timeout_secs: Option<u64>,
    /// Map of component names to their enabled status
    pub components: HashMap<String, bool>,
    /// Colours hidden when a calendar is first shown
    pub hidden_colors: Vec<EventColor>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            api_token: None,
            user_id: None,
            user_role: None,
            timezone: DEFAULT_TIMEZONE,
            locale: Locale::default(),
            refresh_interval_secs: DEFAULT_REFRESH_INTERVAL_SECS,
            attendance_grace_minutes: DEFAULT_ATTENDANCE_GRACE_MINUTES,
            request_timeout_secs: None,
            components: default_components(),
            hidden_colors: Vec::new(),
        }
    }
}

#[derive(Debug, Default, Deserialize)]
struct CalendarFile {
    #[serde(default)]
    hidden_colors: Vec<EventColor>,
}

fn default_components() -> HashMap<String, bool> {
    let mut components = HashMap::new();
    components.insert("course_calendar".to_string(), true);
    components.insert("attendance_calendar".to_string(), true);
    components
}

/// Read an optional variable, parsing it when present
fn parse_env<T: FromStr>(name: &str) -> AppResult<Option<T>> {
    match env::var(name) {
        Ok(raw) if !raw.trim().is_empty() => raw
            .trim()
            .parse::<T>()
            .map(Some)
            .map_err(|_| config_error(&format!("Invalid {} value: {}", name, raw))),
        _ => Ok(None),
    }
}

impl Config {
    /// Load configuration from environment and config files
    pub fn load() -> AppResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let defaults = Config::default();

        let api_base_url = env::var("API_BASE_URL").unwrap_or(defaults.api_base_url);
        let api_token = env::var("API_TOKEN").ok().filter(|t| !t.trim().is_empty());
        let user_id = env::var("USER_ID").ok().filter(|id| !id.trim().is_empty());
        let user_role = env::var("USER_ROLE").ok().filter(|r| !r.trim().is_empty());

        let timezone = match env::var("TIMEZONE") {
            Ok(name) => name
                .parse::<Tz>()
                .map_err(|_| config_error(&format!("Unknown timezone: {}", name)))?,
            Err(_) => defaults.timezone,
        };

        let locale = match env::var("LOCALE") {
            Ok(raw) => raw.parse::<Locale>().map_err(|e| config_error(&e))?,
            Err(_) => defaults.locale,
        };

        let refresh_interval_secs =
            parse_env::<u64>("REFRESH_INTERVAL_SECS")?.unwrap_or(defaults.refresh_interval_secs);
        let attendance_grace_minutes = parse_env::<i64>("ATTENDANCE_GRACE_MINUTES")?
            .unwrap_or(defaults.attendance_grace_minutes);
        let request_timeout_secs = parse_env::<u64>("REQUEST_TIMEOUT_SECS")?;

        let mut components = defaults.components;
        // Load components configuration from file if it exists
        if let Ok(content) = fs::read_to_string("config/components.toml") {
            let file_components = toml::from_str::<HashMap<String, bool>>(&content)?;
            components.extend(file_components);
        }

        let hidden_colors = match fs::read_to_string(Path::new("config/calendar.toml")) {
            Ok(content) => toml::from_str::<CalendarFile>(&content)?.hidden_colors,
            Err(_) => Vec::new(),
        };

        let config = Config {
            api_base_url,
            api_token,
            user_id,
            user_role,
            timezone,
            locale,
            refresh_interval_secs,
            attendance_grace_minutes,
            request_timeout_secs,
            components,
            hidden_colors,
        };
        config.validate()?;
        Ok(config)
    }

    /// Check values that would make the calendars misbehave
    pub fn validate(&self) -> AppResult<()> {
        url::Url::parse(&self.api_base_url)
            .map_err(|e| config_error(&format!("Invalid API_BASE_URL: {}", e)))?;
        if self.refresh_interval_secs == 0 {
            return Err(config_error("REFRESH_INTERVAL_SECS must be positive"));
        }
        if self.attendance_grace_minutes < 0 {
            return Err(config_error("ATTENDANCE_GRACE_MINUTES cannot be negative"));
        }
        if self.attendance_grace_minutes > MAX_ATTENDANCE_GRACE_MINUTES {
            return Err(config_error(&format!(
                "ATTENDANCE_GRACE_MINUTES cannot exceed {}",
                MAX_ATTENDANCE_GRACE_MINUTES
            )));
        }
        Ok(())
    }

    /// Check if a component is enabled
    pub fn is_component_enabled(&self, name: &str) -> bool {
        *self.components.get(name).unwrap_or(&false)
    }

    /// The acting user, when one is configured
    pub fn acting_user(&self) -> Option<ActingUser> {
        let id = self.user_id.clone()?;
        let role = self
            .user_role
            .as_deref()
            .map(Role::from_wire)
            .unwrap_or_else(|| Role::Other(String::new()));
        Some(ActingUser { id, role })
    }

    pub fn request_timeout(&self) -> Option<Duration> {
        self.request_timeout_secs.map(Duration::from_secs)
    }

    pub fn refresh_interval(&self) -> Duration {
        Duration::from_secs(self.refresh_interval_secs)
    }

    pub fn attendance_grace(&self) -> AppResult<chrono::Duration> {
        chrono::Duration::try_minutes(self.attendance_grace_minutes)
            .filter(|_| (0..=MAX_ATTENDANCE_GRACE_MINUTES).contains(&self.attendance_grace_minutes))
            .ok_or_else(|| {
                config_error(&format!(
                    "Invalid ATTENDANCE_GRACE_MINUTES: {}",
                    self.attendance_grace_minutes
                ))
            })
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_acting_user_from_config() {
        let config = Config {
            user_id: Some("prof-1".to_string()),
            user_role: Some("TEACHER".to_string()),
            ..Default::default()
        };
        let user = config.acting_user().unwrap();
        assert_eq!(user.id, "prof-1");
        assert_eq!(user.role, Role::Teacher);

        let anonymous = Config::default();
        assert!(anonymous.acting_user().is_none());
    }

    #[test]
    fn test_validate() {
        assert!(Config::default().validate().is_ok());

        let bad_url = Config {
            api_base_url: "not a url".to_string(),
            ..Default::default()
        };
        assert!(bad_url.validate().is_err());

        let negative_grace = Config {
            attendance_grace_minutes: -5,
            ..Default::default()
        };
        assert!(negative_grace.validate().is_err());

        let week_grace = Config {
            attendance_grace_minutes: MAX_ATTENDANCE_GRACE_MINUTES,
            ..Default::default()
        };
        assert!(week_grace.validate().is_ok());
        assert_eq!(week_grace.attendance_grace().unwrap(), chrono::Duration::weeks(1));

        // Would overflow chrono's duration range
        let huge_grace = Config {
            attendance_grace_minutes: i64::MAX / 2,
            ..Default::default()
        };
        assert!(huge_grace.validate().is_err());
        assert!(huge_grace.attendance_grace().is_err());
    }

    #[test]
    fn test_default_components_enabled() {
        let config = Config::default();
        assert!(config.is_component_enabled("course_calendar"));
        assert!(config.is_component_enabled("attendance_calendar"));
        assert!(!config.is_component_enabled("unknown"));
    }
}
