use super::models::{CalendarEntry, EventColor};
use super::role_filter::ActingUser;
use crate::config::Config;
use crate::error::AppResult;
use crate::utils::i18n::Locale;
use chrono::Duration;
use chrono_tz::Tz;
use std::collections::HashSet;

/// Per-mount calendar state: who is looking, in which locale and timezone,
/// and which colours they chose to see.
///
/// Created when a calendar is mounted and dropped with it.
#[derive(Debug, Clone)]
pub struct CalendarContext {
    pub user: Option<ActingUser>,
    pub locale: Locale,
    pub timezone: Tz,
    /// How long after a session ends attendance can still be submitted
    pub attendance_grace: Duration,
    visible_colors: HashSet<EventColor>,
    page_title: String,
}

impl CalendarContext {
    /// A context with every colour visible
    pub fn new(user: Option<ActingUser>, locale: Locale, timezone: Tz) -> Self {
        Self {
            user,
            locale,
            timezone,
            attendance_grace: Duration::minutes(crate::config::DEFAULT_ATTENDANCE_GRACE_MINUTES),
            visible_colors: EventColor::ALL.into_iter().collect(),
            page_title: String::new(),
        }
    }

    pub fn from_config(config: &Config) -> AppResult<Self> {
        let mut context = Self::new(config.acting_user(), config.locale, config.timezone);
        context.attendance_grace = config.attendance_grace()?;
        for color in &config.hidden_colors {
            context.set_color_visible(*color, false);
        }
        Ok(context)
    }

    pub fn with_attendance_grace(mut self, grace: Duration) -> Self {
        self.attendance_grace = grace;
        self
    }

    pub fn is_color_visible(&self, color: EventColor) -> bool {
        self.visible_colors.contains(&color)
    }

    pub fn set_color_visible(&mut self, color: EventColor, visible: bool) {
        if visible {
            self.visible_colors.insert(color);
        } else {
            self.visible_colors.remove(&color);
        }
    }

    /// Flip a colour and return whether it is now visible
    pub fn toggle_color(&mut self, color: EventColor) -> bool {
        let visible = !self.is_color_visible(color);
        self.set_color_visible(color, visible);
        visible
    }

    /// Keep only entries whose colour is visible
    pub fn visible(&self, entries: Vec<CalendarEntry>) -> Vec<CalendarEntry> {
        entries
            .into_iter()
            .filter(|entry| self.is_color_visible(entry.color()))
            .collect()
    }

    pub fn page_title(&self) -> &str {
        &self.page_title
    }

    pub fn set_page_title(&mut self, title: impl Into<String>) {
        self.page_title = title.into();
    }
}
