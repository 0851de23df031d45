use crate::components::google_calendar::GoogleCalendarClient;
use crate::components::google_oauth::{token_store_from_config, TokenManager};
use crate::components::mailbox::{ImapMailbox, ImapSettings};
use crate::config::Config;
use crate::error::{Error, SyncResult};
use crate::pipeline::{self, RunSummary};
use reqwest::Client;
use std::time::Duration;
use tracing::{error, info};
use tracing_subscriber::{EnvFilter, FmtSubscriber};

/// Timeout for calls to the Google APIs
const HTTP_TIMEOUT: Duration = Duration::from_secs(30);

/// Initialize logging with environment-based configuration
pub fn init_logging() -> miette::Result<()> {
    let subscriber = FmtSubscriber::builder()
        .with_env_filter(
            EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| EnvFilter::new("info,imap=warn,reqwest=warn")),
        )
        .finish();

    tracing::subscriber::set_global_default(subscriber)
        .map_err(|e| Error::Other(format!("Failed to set up logging: {}", e)))?;

    Ok(())
}

/// Load the application config
pub fn load_config() -> miette::Result<Config> {
    match Config::load() {
        Ok(config) => Ok(config),
        Err(e) => {
            error!("Failed to load configuration: {:?}", e);
            Err(e.into())
        }
    }
}

/// Shared HTTP client for the token and calendar endpoints
pub fn http_client() -> SyncResult<Client> {
    Ok(Client::builder().timeout(HTTP_TIMEOUT).build()?)
}

/// Build a token manager over the configured token store
pub fn token_manager(config: &Config, client: Client) -> SyncResult<TokenManager> {
    let store = token_store_from_config(config)?;
    Ok(TokenManager::new(config, store, client))
}

/// Authenticate, then run the pipeline once against Gmail and Google Calendar
pub async fn run_sync(config: &Config) -> SyncResult<RunSummary> {
    let client = http_client()?;

    // Without credentials nothing can proceed
    let token = token_manager(config, client.clone())?.get_token().await?;
    info!("Google credentials obtained");

    let mailbox = ImapMailbox::new(ImapSettings::from_config(config), token.access_token.clone());
    let calendar = GoogleCalendarClient::new(client, token.access_token);

    let filter = config.mail_filter();
    let template = config.event_template()?;

    pipeline::run(&mailbox, &calendar, &filter, &template).await
}
