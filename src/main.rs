mod shutdown;
mod startup;

use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting emargement agenda");

    // Load configuration
    let config = startup::load_config().await?;

    // Mount the calendars and run until a shutdown signal
    startup::run(config).await
}
