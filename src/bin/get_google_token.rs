use gymcal::config::Config;
use gymcal::error::SyncResult;
use gymcal::startup;
use tracing::info;

#[tokio::main]
async fn main() -> miette::Result<()> {
    startup::init_logging()?;

    // Load configuration
    let config = startup::load_config()?;

    authorize(&config).await?;
    Ok(())
}

/// Force a new consent flow, replacing whatever token is stored
async fn authorize(config: &Config) -> SyncResult<()> {
    let client = startup::http_client()?;
    let token_manager = startup::token_manager(config, client)?;

    let token = token_manager.authorize().await?;
    info!(
        "Token saved (refresh token: {}, expires at {})",
        if token.refresh_token.is_some() { "yes" } else { "no" },
        token.expires_at
    );

    Ok(())
}
