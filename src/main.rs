use gymcal::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    // Initialize logging
    startup::init_logging()?;

    info!("Starting gymcal");

    // Load configuration
    let config = startup::load_config()?;

    // One pass over the inbox
    let summary = startup::run_sync(&config).await?;
    info!("Finished: {}", summary);

    Ok(())
}
