use chrono_tz::Tz;
use futures::future::BoxFuture;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::{Mutex, RwLock};
use tokio::task::JoinHandle;
use tokio_util::sync::CancellationToken;
use tracing::{error, info, warn};

use super::notifications::{
    format_course_digest, format_new_sessions, format_open_attendance, format_week_agenda,
    new_sessions,
};
use super::{AgendaCalendar, AgendaHandle};
use crate::components::calendar::{todays_courses, SessionId};
use crate::config::Config;
use crate::error::{component_error, AppResult, Error};
use crate::utils::scheduler::Scheduler;
use crate::utils::time::{local_now, week_window};

/// Keeps one calendar fresh: refetches on every interval tick and whenever
/// the shared cache is invalidated, then logs the agenda.
pub struct AgendaScheduler {
    cancel: CancellationToken,
    task: Mutex<Option<JoinHandle<()>>>,
}

impl Scheduler for AgendaScheduler {
    type Handle = AgendaHandle;

    fn start(
        config: Arc<RwLock<Config>>,
        handle: AgendaHandle,
    ) -> BoxFuture<'static, AppResult<Self>> {
        Box::pin(async move {
            let (interval, timezone) = {
                let config_read = config.read().await;
                (config_read.refresh_interval(), config_read.timezone)
            };

            info!(
                "Starting agenda scheduler for {} (every {:?})",
                handle.calendar.name(),
                interval
            );

            let cancel = CancellationToken::new();
            let task = tokio::spawn(run_agenda_loop(
                handle,
                interval,
                timezone,
                cancel.clone(),
            ));

            Ok(Self {
                cancel,
                task: Mutex::new(Some(task)),
            })
        })
    }

    fn stop(&self) -> BoxFuture<'_, AppResult<()>> {
        Box::pin(async move {
            self.cancel.cancel();
            if let Some(task) = self.task.lock().await.take() {
                task.await
                    .map_err(|e| component_error(&format!("Agenda task failed: {}", e)))?;
            }
            Ok(())
        })
    }
}

/// Main scheduler loop
async fn run_agenda_loop(
    handle: AgendaHandle,
    interval: Duration,
    timezone: Tz,
    cancel: CancellationToken,
) {
    let mut ticker = tokio::time::interval(interval);
    let mut invalidations = handle.cache.subscribe();
    let mut seen: Option<HashSet<SessionId>> = None;

    loop {
        tokio::select! {
            _ = cancel.cancelled() => {
                info!("Agenda scheduler for {} stopped", handle.calendar.name());
                break;
            }
            _ = ticker.tick() => {
                // Calendars share the cache; a sibling may have refreshed it this tick
                let now = local_now(timezone);
                let rescoped = handle.cache.set_scope(Some(week_window(now))).await;
                if !rescoped && !handle.cache.expire(interval / 2).await {
                    continue;
                }
            }
            changed = invalidations.changed() => {
                if changed.is_err() {
                    warn!("Session cache dropped, stopping agenda scheduler");
                    break;
                }
            }
        }

        // The refresh below covers every invalidation seen so far
        invalidations.borrow_and_update();
        refresh_agenda(&handle, timezone, &mut seen).await;
    }
}

async fn refresh_agenda(
    handle: &AgendaHandle,
    timezone: Tz,
    seen: &mut Option<HashSet<SessionId>>,
) {
    let now = local_now(timezone);

    match &handle.calendar {
        AgendaCalendar::Course(calendar) => {
            let mut calendar = calendar.lock().await;
            if let Err(e) = calendar.refresh().await {
                report_refresh_failure("course", &e);
                return;
            }
            let locale = calendar.context().locale;
            let entries = calendar.visible_entries(now);

            info!("{}", format_week_agenda(&entries, &week_window(now), locale));

            let added = new_sessions(&entries, seen.as_ref());
            if let Some(message) = format_new_sessions(&added, locale) {
                info!("{}", message);
            }
            *seen = Some(
                entries
                    .iter()
                    .filter(|entry| entry.is_session())
                    .map(|entry| entry.event().id.clone())
                    .collect(),
            );

            let instructor = calendar.context().user.as_ref().filter(|u| u.is_instructor());
            if let Some(user) = instructor {
                let courses = todays_courses(&calendar.sessions(), &user.id, now.date());
                if let Some(message) = format_course_digest(&courses, locale) {
                    info!("{}", message);
                }
            }
        }
        AgendaCalendar::Attendance(calendar) => {
            let mut calendar = calendar.lock().await;
            if let Err(e) = calendar.refresh().await {
                report_refresh_failure("attendance", &e);
                return;
            }
            let locale = calendar.context().locale;
            for line in format_open_attendance(&calendar.open_sessions(now), locale) {
                info!("{}", line);
            }
        }
    }
}

/// Log a failed refresh, as a warning when the backend could not be reached
fn report_refresh_failure(calendar: &str, e: &Error) {
    if e.is_transport_failure() {
        warn!("Backend unavailable, keeping last {} agenda: {}", calendar, e);
    } else {
        error!("Failed to refresh {} calendar: {}", calendar, e);
    }
}
