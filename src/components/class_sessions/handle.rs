use super::actor::{ClassSessionActor, ClassSessionActorHandle};
use super::models::{
    AttendanceRecord, CreateSessionInput, MarkAttendanceInput, RawSession, UpdateSessionInput,
};
use super::SessionBackend;
use crate::config::Config;
use crate::error::{AppResult, Error};
use crate::utils::time::WeekWindow;
use async_trait::async_trait;
use reqwest::Client;
use std::sync::Arc;
use tokio::sync::RwLock;
use tokio::task::JoinHandle;

/// Handle for interacting with the class-session actor
#[derive(Clone)]
pub struct ClassSessionHandle {
    actor_handle: ClassSessionActorHandle,
    _actor_task: Arc<JoinHandle<()>>,
}

impl ClassSessionHandle {
    /// Create a new ClassSessionHandle and spawn the actor
    pub async fn new(config: Arc<RwLock<Config>>) -> AppResult<Self> {
        let timeout = config.read().await.request_timeout();
        let mut builder = Client::builder();
        if let Some(timeout) = timeout {
            builder = builder.timeout(timeout);
        }
        let client = builder
            .build()
            .map_err(|e| Error::Config(format!("Failed to build HTTP client: {}", e)))?;

        // Create the actor and get its handle
        let (mut actor, handle) = ClassSessionActor::new(config, client);

        // Spawn a task to run the actor
        let actor_task = tokio::spawn(async move {
            actor.run().await;
        });

        Ok(Self {
            actor_handle: handle,
            _actor_task: Arc::new(actor_task),
        })
    }

    /// Fetch a single session by id
    pub async fn get_session(&self, id: impl Into<String>) -> AppResult<RawSession> {
        self.actor_handle.get_session(id).await
    }

    /// Delete a session. The calendars never call this.
    pub async fn delete_session(&self, id: impl Into<String>) -> AppResult<()> {
        self.actor_handle.delete_session(id).await
    }

    /// Shutdown the actor
    pub async fn shutdown(&self) -> AppResult<()> {
        self.actor_handle.shutdown().await
    }
}

#[async_trait]
impl SessionBackend for ClassSessionHandle {
    async fn list_sessions(&self, window: Option<WeekWindow>) -> AppResult<Vec<RawSession>> {
        self.actor_handle.list_sessions(window).await
    }

    async fn create_session(&self, input: CreateSessionInput) -> AppResult<RawSession> {
        self.actor_handle.create_session(input).await
    }

    async fn update_session(&self, input: UpdateSessionInput) -> AppResult<RawSession> {
        self.actor_handle.update_session(input).await
    }

    async fn mark_attendance(&self, input: MarkAttendanceInput) -> AppResult<AttendanceRecord> {
        self.actor_handle.mark_attendance(input).await
    }
}
