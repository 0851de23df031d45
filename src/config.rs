use crate::components::mailbox::MailFilter;
use crate::error::{config_error, env_error, SyncResult};
use crate::registration::EventTemplate;
use chrono::Duration;
use chrono_tz::Tz;
use dotenvy::dotenv;
use serde::Deserialize;
use std::env;
use std::fs;
use std::path::{Path, PathBuf};

/// Default IMAP server for Gmail
pub const DEFAULT_IMAP_HOST: &str = "imap.gmail.com";
/// Default sender of the registration confirmations
pub const DEFAULT_MAIL_SENDER: &str = "noreply+@dserec.com";
/// Default subject substring of the registration confirmations
pub const DEFAULT_MAIL_SUBJECT: &str = "Class registration successful";
/// Default timezone for created events
pub const DEFAULT_TIMEZONE: &str = "America/New_York";
/// Default class length in minutes
pub const DEFAULT_CLASS_DURATION_MINUTES: i64 = 45;
/// Longest accepted class, one day
pub const MAX_CLASS_DURATION_MINUTES: i64 = 24 * 60;
/// Optional overlay for the mail filter
pub const MAIL_FILTER_OVERLAY: &str = "config/mail_filter.toml";

/// Where the OAuth token is persisted between runs
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TokenStoreKind {
    File,
    Redis,
}

/// Main configuration structure for a sync run
#[derive(Debug, Clone)]
pub struct Config {
    /// Google OAuth client ID
    pub google_client_id: String,
    /// Google OAuth client secret
    pub google_client_secret: String,
    /// Gmail address whose inbox is scanned
    pub gmail_address: String,
    /// IMAP server host
    pub imap_host: String,
    /// IMAP server port (implicit TLS)
    pub imap_port: u16,
    /// Mailbox to scan
    pub imap_mailbox: String,
    /// Sender address the confirmations come from
    pub mail_sender: String,
    /// Substring every confirmation subject contains
    pub mail_subject: String,
    /// IANA timezone attached to created events
    pub timezone: String,
    /// Target calendar
    pub calendar_id: String,
    /// Class length in minutes
    pub class_duration_minutes: i64,
    /// Prefix prepended to the class name
    pub event_title_prefix: String,
    /// Token persistence backend
    pub token_store: TokenStoreKind,
    /// Token file for the file backend
    pub token_path: PathBuf,
    /// Redis connection string for the redis backend
    pub redis_url: String,
    /// Local port receiving the OAuth redirect
    pub oauth_redirect_port: u16,
}

/// Keys accepted in the mail filter overlay file
#[derive(Debug, Default, Deserialize)]
struct MailFilterOverlay {
    sender: Option<String>,
    subject: Option<String>,
}

impl Config {
    /// Load configuration from environment and config file
    pub fn load() -> SyncResult<Self> {
        // Load .env file if it exists
        dotenv().ok();

        let mut config = Self::from_lookup(|key| env::var(key).ok())?;
        config.apply_filter_overlay(Path::new(MAIL_FILTER_OVERLAY))?;

        Ok(config)
    }

    /// Build the configuration from an arbitrary variable lookup
    pub fn from_lookup<F>(lookup: F) -> SyncResult<Self>
    where
        F: Fn(&str) -> Option<String>,
    {
        let required = |key: &str| {
            lookup(key)
                .filter(|v| !v.is_empty())
                .ok_or_else(|| env_error(key))
        };
        let optional =
            |key: &str, default: &str| lookup(key).unwrap_or_else(|| default.to_string());

        // Required environment variables
        let google_client_id = required("GOOGLE_CLIENT_ID")?;
        let google_client_secret = required("GOOGLE_CLIENT_SECRET")?;
        let gmail_address = required("GMAIL_ADDRESS")?;

        // Parse numeric values
        let imap_port = optional("IMAP_PORT", "993")
            .parse::<u16>()
            .map_err(|_| config_error("Invalid IMAP_PORT format"))?;

        let oauth_redirect_port = optional("OAUTH_REDIRECT_PORT", "8080")
            .parse::<u16>()
            .map_err(|_| config_error("Invalid OAUTH_REDIRECT_PORT format"))?;

        let class_duration_minutes = optional(
            "CLASS_DURATION_MINUTES",
            &DEFAULT_CLASS_DURATION_MINUTES.to_string(),
        )
        .parse::<i64>()
        .map_err(|_| config_error("Invalid CLASS_DURATION_MINUTES format"))?;
        class_duration(class_duration_minutes)?;

        let timezone = optional("TIMEZONE", DEFAULT_TIMEZONE);
        timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", timezone)))?;

        let token_store = match optional("TOKEN_STORE", "file").to_lowercase().as_str() {
            "file" => TokenStoreKind::File,
            "redis" => TokenStoreKind::Redis,
            other => {
                return Err(config_error(&format!("Unknown TOKEN_STORE: {}", other)));
            }
        };

        Ok(Config {
            google_client_id,
            google_client_secret,
            gmail_address,
            imap_host: optional("IMAP_HOST", DEFAULT_IMAP_HOST),
            imap_port,
            imap_mailbox: optional("IMAP_MAILBOX", "INBOX"),
            mail_sender: optional("MAIL_SENDER", DEFAULT_MAIL_SENDER),
            mail_subject: optional("MAIL_SUBJECT", DEFAULT_MAIL_SUBJECT),
            timezone,
            calendar_id: optional("CALENDAR_ID", "primary"),
            class_duration_minutes,
            event_title_prefix: optional("EVENT_TITLE_PREFIX", "Gym Class: "),
            token_store,
            token_path: PathBuf::from(optional("TOKEN_PATH", "token.json")),
            redis_url: optional("REDIS_URL", "redis://127.0.0.1/"),
            oauth_redirect_port,
        })
    }

    /// Override the mail filter from a TOML file, if one exists
    pub fn apply_filter_overlay(&mut self, path: &Path) -> SyncResult<()> {
        let content = match fs::read_to_string(path) {
            Ok(content) => content,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(()),
            Err(e) => return Err(e.into()),
        };

        let overlay: MailFilterOverlay = toml::from_str(&content)?;
        if let Some(sender) = overlay.sender {
            self.mail_sender = sender;
        }
        if let Some(subject) = overlay.subject {
            self.mail_subject = subject;
        }

        Ok(())
    }

    /// Filter selecting unread registration confirmations
    pub fn mail_filter(&self) -> MailFilter {
        MailFilter {
            sender_contains: self.mail_sender.clone(),
            subject_contains: self.mail_subject.clone(),
        }
    }

    /// Template turning registrations into calendar events
    pub fn event_template(&self) -> SyncResult<EventTemplate> {
        let time_zone = self
            .timezone
            .parse::<Tz>()
            .map_err(|_| config_error(&format!("Unknown timezone: {}", self.timezone)))?;

        Ok(EventTemplate {
            title_prefix: self.event_title_prefix.clone(),
            time_zone,
            calendar_id: self.calendar_id.clone(),
            duration: class_duration(self.class_duration_minutes)?,
        })
    }
}

/// Class length as a duration, between one minute and one day
fn class_duration(minutes: i64) -> SyncResult<Duration> {
    if !(1..=MAX_CLASS_DURATION_MINUTES).contains(&minutes) {
        return Err(config_error(&format!(
            "CLASS_DURATION_MINUTES must be between 1 and {}, got {}",
            MAX_CLASS_DURATION_MINUTES, minutes
        )));
    }

    Duration::try_minutes(minutes)
        .ok_or_else(|| config_error(&format!("Invalid CLASS_DURATION_MINUTES: {}", minutes)))
}
