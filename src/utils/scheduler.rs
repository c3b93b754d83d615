use futures::future::BoxFuture;
use std::sync::Arc;
use tokio::sync::RwLock;

use crate::config::Config;
use crate::error::AppResult;

/// Trait for component schedulers that refresh on an interval
pub trait Scheduler: Send + Sized + 'static {
    /// The type of handle used by this scheduler
    type Handle: Clone + Send + Sync + 'static;

    /// Start the scheduler with the necessary context
    fn start(
        config: Arc<RwLock<Config>>,
        handle: Self::Handle,
    ) -> BoxFuture<'static, AppResult<Self>>;

    /// Stop the scheduler gracefully
    fn stop(&self) -> BoxFuture<'_, AppResult<()>>;
}
