use emargement::components::agenda::Agenda;
use emargement::components::{ClassSessionHandle, ComponentManager, Services};
use emargement::config::Config;
use emargement::error::Error;
use emargement::utils::i18n::set_locale;
use std::sync::Arc;
use tokio::sync::{oneshot, RwLock};
use tracing::{error, info, warn};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

use crate::shutdown;

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,reqwest=warn,hyper=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load and initialize the application config
pub async fn load_config() -> miette::Result<Arc<RwLock<Config>>> {
    match Config::load() {
        Ok(config) => Ok(Arc::new(RwLock::new(config))),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Start the backend client and calendar components, then wait for shutdown
pub async fn run(config: Arc<RwLock<Config>>) -> miette::Result<()> {
    {
        let config_read = config.read().await;
        set_locale(config_read.locale);
        info!("Setting locale to {}", config_read.locale);
        info!(
            "Using backend {} in timezone {}",
            config_read.api_base_url, config_read.timezone
        );
        match config_read.acting_user() {
            Some(user) => info!("Acting as {} ({})", user.id, user.role),
            None => warn!("USER_ID is not set; calendars show every session read-only"),
        }
        if config_read.api_token.is_none() {
            warn!("API_TOKEN is not set; every backend call will be rejected");
        }
    }

    // Start the backend client actor
    let backend = ClassSessionHandle::new(Arc::clone(&config)).await?;
    let services = Services::new(Arc::new(backend.clone()));

    // Initialize component manager
    let mut component_manager = ComponentManager::new(Arc::clone(&config));
    component_manager.register(Agenda::course());
    component_manager.register(Agenda::attendance());

    // Create a shared component manager
    let component_manager = Arc::new(component_manager);
    component_manager.init_all(services).await?;

    // Create shutdown channel
    let (shutdown_send, shutdown_recv) = oneshot::channel();

    // Spawn signal handler task
    let shutdown_components = Arc::clone(&component_manager);
    tokio::spawn(async move {
        shutdown::handle_signals(shutdown_send, shutdown_components, backend).await;
    });

    if shutdown_recv.await.is_err() {
        warn!("Signal handler ended without a shutdown notice");
    }
    info!("Shutdown complete");
    Ok(())
}
