use miette::Diagnostic;
use thiserror::Error;

/// Main error type for the application
#[derive(Debug, Error, Diagnostic)]
pub enum Error {
    #[error("Environment error: {0}")]
    #[diagnostic(code(gymcal::environment))]
    Environment(String),

    #[error("Configuration error: {0}")]
    #[diagnostic(code(gymcal::config))]
    Config(String),

    #[error("Authorization error: {0}")]
    #[diagnostic(
        code(gymcal::auth),
        help("run `get_google_token` to authorize the application again")
    )]
    Auth(String),

    #[error("Mailbox error: {0}")]
    #[diagnostic(code(gymcal::mailbox))]
    Mailbox(String),

    #[error("Google Calendar API error: {0}")]
    #[diagnostic(code(gymcal::google_calendar))]
    GoogleCalendar(String),

    #[error("Malformed registration '{text}': {reason}")]
    #[diagnostic(code(gymcal::malformed_registration))]
    MalformedRegistration { text: String, reason: String },

    #[error(transparent)]
    #[diagnostic(code(gymcal::io))]
    Io(#[from] std::io::Error),

    #[error("HTTP error: {0}")]
    #[diagnostic(code(gymcal::http))]
    Http(#[from] reqwest::Error),

    #[error("Serialization error: {0}")]
    #[diagnostic(code(gymcal::serialization))]
    Serialization(String),

    #[error("Other error: {0}")]
    #[diagnostic(code(gymcal::other))]
    Other(String),
}

impl From<toml::de::Error> for Error {
    fn from(err: toml::de::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

impl From<serde_json::Error> for Error {
    fn from(err: serde_json::Error) -> Self {
        Error::Serialization(err.to_string())
    }
}

/// Type alias for Result with our Error type
pub type SyncResult<T> = Result<T, Error>;

/// Helper to create environment errors
pub fn env_error(var: &str) -> Error {
    Error::Environment(format!("Missing environment variable: {}", var))
}

/// Helper to create configuration errors
pub fn config_error(message: &str) -> Error {
    Error::Config(message.to_string())
}

/// Helper to create authorization errors
pub fn auth_error(message: &str) -> Error {
    Error::Auth(message.to_string())
}

/// Helper to create mailbox errors
pub fn mailbox_error(message: &str) -> Error {
    Error::Mailbox(message.to_string())
}

/// Helper to create Google Calendar errors
pub fn google_calendar_error(message: &str) -> Error {
    Error::GoogleCalendar(message.to_string())
}

/// Helper to create malformed registration errors
pub fn malformed_registration(text: &str, reason: &str) -> Error {
    Error::MalformedRegistration {
        text: text.to_string(),
        reason: reason.to_string(),
    }
}
