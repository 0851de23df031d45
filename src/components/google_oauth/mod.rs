//! Credential provider for the Google APIs.
//!
//! A single OAuth token with both the calendar and the mail scope is kept in a
//! [`TokenStore`] and handed to the mailbox and calendar collaborators.

mod consent;
pub mod store;
pub mod token;

pub use consent::{authorization_url, request_authorization_code, AuthorizationCode};
pub use store::{token_store_from_config, FileTokenStore, RedisTokenStore, TokenStore};
pub use token::{OAuthToken, TokenManager, GOOGLE_SCOPES};
