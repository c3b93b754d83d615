mod notifications;
mod scheduler;

pub use scheduler::AgendaScheduler;

use super::calendar::{AttendanceCalendar, CalendarContext, CourseCalendar};
use super::session_cache::SessionCache;
use super::{Component, Services};
use crate::config::Config;
use crate::error::AppResult;
use crate::utils::scheduler::Scheduler;
use async_trait::async_trait;
use std::sync::Arc;
use tokio::sync::{Mutex, RwLock};
use tracing::{error, info};

/// Which calendar an agenda component mounts
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AgendaKind {
    Course,
    Attendance,
}

/// A mounted calendar, shared between its component and scheduler
#[derive(Clone)]
pub enum AgendaCalendar {
    Course(Arc<Mutex<CourseCalendar>>),
    Attendance(Arc<Mutex<AttendanceCalendar>>),
}

impl AgendaCalendar {
    pub fn name(&self) -> &'static str {
        match self {
            AgendaCalendar::Course(_) => "course_calendar",
            AgendaCalendar::Attendance(_) => "attendance_calendar",
        }
    }
}

/// Everything a scheduler needs to keep a calendar fresh
#[derive(Clone)]
pub struct AgendaHandle {
    pub cache: SessionCache,
    pub calendar: AgendaCalendar,
}

/// Component mounting one calendar and keeping its agenda up to date
pub struct Agenda {
    kind: AgendaKind,
    handle: RwLock<Option<AgendaHandle>>,
    scheduler: RwLock<Option<AgendaScheduler>>,
}

impl Agenda {
    pub fn new(kind: AgendaKind) -> Self {
        Self {
            kind,
            handle: RwLock::new(None),
            scheduler: RwLock::new(None),
        }
    }

    pub fn course() -> Self {
        Self::new(AgendaKind::Course)
    }

    pub fn attendance() -> Self {
        Self::new(AgendaKind::Attendance)
    }

    /// Get the handle once the component is initialized
    pub async fn get_handle(&self) -> Option<AgendaHandle> {
        let handle_lock = self.handle.read().await;
        handle_lock.clone()
    }

    fn mount(&self, context: CalendarContext, services: &Services) -> AgendaCalendar {
        let backend = Arc::clone(&services.backend);
        let cache = services.cache.clone();
        match self.kind {
            AgendaKind::Course => AgendaCalendar::Course(Arc::new(Mutex::new(
                CourseCalendar::new(backend, cache, context),
            ))),
            AgendaKind::Attendance => AgendaCalendar::Attendance(Arc::new(Mutex::new(
                AttendanceCalendar::new(backend, cache, context),
            ))),
        }
    }
}

#[async_trait]
impl Component for Agenda {
    fn name(&self) -> &'static str {
        match self.kind {
            AgendaKind::Course => "course_calendar",
            AgendaKind::Attendance => "attendance_calendar",
        }
    }

    async fn init(&self, config: Arc<RwLock<Config>>, services: Services) -> AppResult<()> {
        let mut context = CalendarContext::from_config(&*config.read().await)?;
        let locale = context.locale;
        let title = match self.kind {
            AgendaKind::Course => t!("page_title_courses", locale = locale.as_str()),
            AgendaKind::Attendance => t!("page_title_attendance", locale = locale.as_str()),
        };
        context.set_page_title(title);
        info!("Mounting {}", context.page_title());

        let mut handle_lock = self.handle.write().await;
        let handle = match &*handle_lock {
            Some(handle) => handle.clone(),
            None => {
                let handle = AgendaHandle {
                    cache: services.cache.clone(),
                    calendar: self.mount(context, &services),
                };
                *handle_lock = Some(handle.clone());
                handle
            }
        };
        drop(handle_lock);

        let mut scheduler_lock = self.scheduler.write().await;
        if scheduler_lock.is_none() {
            match AgendaScheduler::start(config, handle).await {
                Ok(scheduler) => *scheduler_lock = Some(scheduler),
                Err(e) => error!("Failed to start {} scheduler: {}", self.name(), e),
            }
        }

        Ok(())
    }

    async fn shutdown(&self) -> AppResult<()> {
        if let Some(scheduler) = self.scheduler.write().await.take() {
            scheduler.stop().await?;
        }
        // Unmounting drops the calendar context and its local state
        self.handle.write().await.take();
        Ok(())
    }

    fn as_any(&self) -> &dyn std::any::Any {
        self
    }
}
