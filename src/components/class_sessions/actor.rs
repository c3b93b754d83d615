use super::models::{
    AttendanceRecord, CreateSessionInput, MarkAttendanceInput, RawSession, SessionListResponse,
    UpdateSessionInput,
};
use crate::config::Config;
use crate::error::{api_error, component_error, AppResult, Error, Rejection};
use crate::utils::time::{parse_session_date, WeekWindow};
use chrono_tz::Tz;
use reqwest::{Client, RequestBuilder};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use tokio::sync::{mpsc, RwLock};
use tracing::{debug, error, info, warn};
use url::Url;

const CLASS_SESSIONS_PATH: &str = "api/v1/class-sessions";
const EMARGEMENTS_PATH: &str = "api/v1/emargements";

/// The class-session actor that owns the HTTP client
pub struct ClassSessionActor {
    config: Arc<RwLock<Config>>,
    client: Client,
    command_rx: mpsc::Receiver<ClassSessionCommand>,
}

/// Commands that can be sent to the class-session actor
pub enum ClassSessionCommand {
    ListSessions(Option<WeekWindow>, mpsc::Sender<AppResult<Vec<RawSession>>>),
    GetSession(String, mpsc::Sender<AppResult<RawSession>>),
    CreateSession(CreateSessionInput, mpsc::Sender<AppResult<RawSession>>),
    UpdateSession(UpdateSessionInput, mpsc::Sender<AppResult<RawSession>>),
    DeleteSession(String, mpsc::Sender<AppResult<()>>),
    MarkAttendance(MarkAttendanceInput, mpsc::Sender<AppResult<AttendanceRecord>>),
    Shutdown,
}

/// Handle for communicating with the class-session actor
#[derive(Clone)]
pub struct ClassSessionActorHandle {
    command_tx: mpsc::Sender<ClassSessionCommand>,
}

impl ClassSessionActorHandle {
    /// Send a command and wait for its reply
    async fn request<T>(
        &self,
        build: impl FnOnce(mpsc::Sender<AppResult<T>>) -> ClassSessionCommand,
    ) -> AppResult<T> {
        let (response_tx, mut response_rx) = mpsc::channel(1);
        self.command_tx
            .send(build(response_tx))
            .await
            .map_err(|e| component_error(&format!("Actor mailbox error: {}", e)))?;

        response_rx
            .recv()
            .await
            .ok_or_else(|| component_error("Response channel closed"))?
    }

    /// Fetch sessions, optionally restricted to one week
    pub async fn list_sessions(&self, window: Option<WeekWindow>) -> AppResult<Vec<RawSession>> {
        self.request(|tx| ClassSessionCommand::ListSessions(window, tx))
            .await
    }

    pub async fn get_session(&self, id: impl Into<String>) -> AppResult<RawSession> {
        let id = id.into();
        self.request(|tx| ClassSessionCommand::GetSession(id, tx))
            .await
    }

    pub async fn create_session(&self, input: CreateSessionInput) -> AppResult<RawSession> {
        self.request(|tx| ClassSessionCommand::CreateSession(input, tx))
            .await
    }

    pub async fn update_session(&self, input: UpdateSessionInput) -> AppResult<RawSession> {
        self.request(|tx| ClassSessionCommand::UpdateSession(input, tx))
            .await
    }

    pub async fn delete_session(&self, id: impl Into<String>) -> AppResult<()> {
        let id = id.into();
        self.request(|tx| ClassSessionCommand::DeleteSession(id, tx))
            .await
    }

    pub async fn mark_attendance(&self, input: MarkAttendanceInput) -> AppResult<AttendanceRecord> {
        self.request(|tx| ClassSessionCommand::MarkAttendance(input, tx))
            .await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        let _ = self.command_tx.send(ClassSessionCommand::Shutdown).await;
        Ok(())
    }
}

/// Everything one request needs, captured when the command arrives
#[derive(Clone)]
struct RequestContext {
    client: Client,
    base_url: Url,
    token: Option<String>,
    timezone: Tz,
}

impl RequestContext {
    fn url(&self, path: &str) -> AppResult<Url> {
        self.base_url
            .join(path)
            .map_err(|e| Error::Config(format!("Failed to build URL for {}: {}", path, e)))
    }

    /// Attach the bearer credential, refusing to go out without one
    fn authorize(&self, request: RequestBuilder) -> AppResult<RequestBuilder> {
        let token = self
            .token
            .as_deref()
            .ok_or(Error::Rejected(Rejection::NotAuthenticated))?;
        Ok(request.bearer_auth(token))
    }
}

/// Send a request and decode a JSON body, mapping non-2xx replies to API errors
async fn send_json<T: DeserializeOwned>(request: RequestBuilder) -> AppResult<T> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(api_error(status.as_u16(), &error_body));
    }

    Ok(response.json::<T>().await?)
}

/// Like `send_json` for endpoints whose body we do not use
async fn send_empty(request: RequestBuilder) -> AppResult<()> {
    let response = request.send().await?;

    if !response.status().is_success() {
        let status = response.status();
        let error_body = response
            .text()
            .await
            .unwrap_or_else(|_| "Could not read error response".to_string());
        return Err(api_error(status.as_u16(), &error_body));
    }

    Ok(())
}

impl ClassSessionActor {
    /// Create a new actor and return its handle
    pub fn new(config: Arc<RwLock<Config>>, client: Client) -> (Self, ClassSessionActorHandle) {
        let (command_tx, command_rx) = mpsc::channel(32);

        let actor = Self {
            config,
            client,
            command_rx,
        };

        let handle = ClassSessionActorHandle { command_tx };

        (actor, handle)
    }

    async fn request_context(&self) -> AppResult<RequestContext> {
        let config = self.config.read().await;
        let mut base = config.api_base_url.clone();
        if !base.ends_with('/') {
            base.push('/');
        }
        let base_url = Url::parse(&base)
            .map_err(|e| Error::Config(format!("Invalid API base URL: {}", e)))?;
        Ok(RequestContext {
            client: self.client.clone(),
            base_url,
            token: config.api_token.clone(),
            timezone: config.timezone,
        })
    }

    /// Start the actor's processing loop.
    ///
    /// Each command runs in its own task: requests are neither queued behind
    /// one another nor coalesced, so concurrent edits are independent.
    pub async fn run(&mut self) {
        info!("Class session actor started");

        while let Some(cmd) = self.command_rx.recv().await {
            if let ClassSessionCommand::Shutdown = cmd {
                info!("Class session actor shutting down");
                break;
            }

            let ctx = match self.request_context().await {
                Ok(ctx) => ctx,
                Err(e) => {
                    error!("Cannot build request context: {}", e);
                    Self::fail(cmd, e).await;
                    continue;
                }
            };

            tokio::spawn(Self::execute(ctx, cmd));
        }

        info!("Class session actor shut down");
    }

    /// Reply to a command with an error without touching the network
    async fn fail(cmd: ClassSessionCommand, e: Error) {
        match cmd {
            ClassSessionCommand::ListSessions(_, tx) => {
                let _ = tx.send(Err(e)).await;
            }
            ClassSessionCommand::GetSession(_, tx)
            | ClassSessionCommand::CreateSession(_, tx)
            | ClassSessionCommand::UpdateSession(_, tx) => {
                let _ = tx.send(Err(e)).await;
            }
            ClassSessionCommand::DeleteSession(_, tx) => {
                let _ = tx.send(Err(e)).await;
            }
            ClassSessionCommand::MarkAttendance(_, tx) => {
                let _ = tx.send(Err(e)).await;
            }
            ClassSessionCommand::Shutdown => {
                debug!("Ignoring failure for shutdown command: {}", e);
            }
        }
    }

    async fn execute(ctx: RequestContext, cmd: ClassSessionCommand) {
        match cmd {
            ClassSessionCommand::ListSessions(window, tx) => {
                let _ = tx.send(Self::list_sessions(&ctx, window).await).await;
            }
            ClassSessionCommand::GetSession(id, tx) => {
                let _ = tx.send(Self::get_session(&ctx, &id).await).await;
            }
            ClassSessionCommand::CreateSession(input, tx) => {
                let _ = tx.send(Self::create_session(&ctx, &input).await).await;
            }
            ClassSessionCommand::UpdateSession(input, tx) => {
                let _ = tx.send(Self::update_session(&ctx, &input).await).await;
            }
            ClassSessionCommand::DeleteSession(id, tx) => {
                let _ = tx.send(Self::delete_session(&ctx, &id).await).await;
            }
            ClassSessionCommand::MarkAttendance(input, tx) => {
                let _ = tx.send(Self::mark_attendance(&ctx, &input).await).await;
            }
            ClassSessionCommand::Shutdown => {}
        }
    }

    async fn list_sessions(
        ctx: &RequestContext,
        window: Option<WeekWindow>,
    ) -> AppResult<Vec<RawSession>> {
        let url = ctx.url(CLASS_SESSIONS_PATH)?;
        let request = ctx.authorize(ctx.client.get(url))?;

        let response: SessionListResponse = send_json(request).await.map_err(|e| {
            warn!("Failed to fetch class sessions: {}", e);
            e
        })?;
        let sessions = response.into_sessions();
        debug!("Fetched {} class sessions", sessions.len());

        // The endpoint has no range parameters; scope the list here
        let Some(window) = window else {
            return Ok(sessions);
        };
        Ok(sessions
            .into_iter()
            .filter(|session| {
                session
                    .date
                    .as_deref()
                    .and_then(|date| parse_session_date(date, ctx.timezone))
                    // Undated records are kept so the normalizer can report them
                    .map_or(true, |date| window.contains_date(date))
            })
            .collect())
    }

    async fn get_session(ctx: &RequestContext, id: &str) -> AppResult<RawSession> {
        let url = ctx.url(&format!("{}/{}", CLASS_SESSIONS_PATH, id))?;
        let request = ctx.authorize(ctx.client.get(url))?;
        send_json(request).await
    }

    async fn create_session(
        ctx: &RequestContext,
        input: &CreateSessionInput,
    ) -> AppResult<RawSession> {
        let url = ctx.url(CLASS_SESSIONS_PATH)?;
        let request = ctx.authorize(ctx.client.post(url).json(input))?;
        info!("Creating class session for course {}", input.course_id);
        send_json(request).await
    }

    async fn update_session(
        ctx: &RequestContext,
        input: &UpdateSessionInput,
    ) -> AppResult<RawSession> {
        let url = ctx.url(&format!("{}/{}", CLASS_SESSIONS_PATH, input.id))?;
        let request = ctx.authorize(ctx.client.put(url).json(input))?;
        info!("Updating class session {}", input.id);
        send_json(request).await
    }

    async fn delete_session(ctx: &RequestContext, id: &str) -> AppResult<()> {
        let url = ctx.url(&format!("{}/{}", CLASS_SESSIONS_PATH, id))?;
        let request = ctx.authorize(ctx.client.delete(url))?;
        info!("Deleting class session {}", id);
        send_empty(request).await
    }

    async fn mark_attendance(
        ctx: &RequestContext,
        input: &MarkAttendanceInput,
    ) -> AppResult<AttendanceRecord> {
        let url = ctx.url(EMARGEMENTS_PATH)?;
        let request = ctx.authorize(ctx.client.post(url).json(input))?;
        info!(
            "Submitting attendance for session {} by professor {}",
            input.class_session_id, input.professor_id
        );
        send_json(request).await
    }
}
