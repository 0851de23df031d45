use super::consent::{request_authorization_code, AuthorizationCode};
use super::store::TokenStore;
use crate::config::Config;
use crate::error::{auth_error, SyncResult};
use chrono::{DateTime, Utc};
use reqwest::Client;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{info, warn};

/// One token covers both the mailbox and the calendar
pub const GOOGLE_SCOPES: [&str; 2] = [
    "https://www.googleapis.com/auth/calendar",
    "https://mail.google.com/",
];
pub const GOOGLE_TOKEN_URL: &str = "https://oauth2.googleapis.com/token";
pub const GOOGLE_AUTH_URL: &str = "https://accounts.google.com/o/oauth2/v2/auth";

/// Tokens this close to expiry are refreshed
const EXPIRY_LEEWAY_SECS: i64 = 60;
/// Assumed lifetime when the token endpoint omits `expires_in`
const DEFAULT_EXPIRES_IN_SECS: i64 = 3600;

/// OAuth token as persisted between runs
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OAuthToken {
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    /// Unix timestamp (seconds)
    pub expires_at: i64,
}

impl OAuthToken {
    pub fn is_expired(&self, now: DateTime<Utc>) -> bool {
        self.expires_at - EXPIRY_LEEWAY_SECS <= now.timestamp()
    }
}

/// Token endpoint response for both code exchange and refresh
#[derive(Debug, Deserialize)]
struct TokenResponse {
    access_token: String,
    refresh_token: Option<String>,
    expires_in: Option<i64>,
}

impl TokenResponse {
    fn into_token(self, previous_refresh_token: Option<String>) -> OAuthToken {
        let expires_in = self.expires_in.unwrap_or(DEFAULT_EXPIRES_IN_SECS);

        OAuthToken {
            access_token: self.access_token,
            // Google only returns a refresh token on the first exchange
            refresh_token: self.refresh_token.or(previous_refresh_token),
            expires_at: Utc::now().timestamp() + expires_in,
        }
    }
}

/// Supplies valid access tokens, refreshing or re-authorizing as needed
#[derive(Clone)]
pub struct TokenManager {
    client_id: String,
    client_secret: String,
    redirect_port: u16,
    token_url: String,
    auth_url: String,
    store: Arc<dyn TokenStore>,
    client: Client,
}

impl TokenManager {
    pub fn new(config: &Config, store: Arc<dyn TokenStore>, client: Client) -> Self {
        Self {
            client_id: config.google_client_id.clone(),
            client_secret: config.google_client_secret.clone(),
            redirect_port: config.oauth_redirect_port,
            token_url: GOOGLE_TOKEN_URL.to_string(),
            auth_url: GOOGLE_AUTH_URL.to_string(),
            store,
            client,
        }
    }

    /// Use other OAuth endpoints (used by tests)
    pub fn with_endpoints(mut self, token_url: &str, auth_url: &str) -> Self {
        self.token_url = token_url.to_string();
        self.auth_url = auth_url.to_string();
        self
    }

    /// Get a usable token: stored, refreshed, or freshly authorized
    pub async fn get_token(&self) -> SyncResult<OAuthToken> {
        match self.store.load().await? {
            Some(token) if !token.is_expired(Utc::now()) => Ok(token),
            Some(token) => match token.refresh_token.clone() {
                Some(refresh_token) => {
                    info!("Access token expired, refreshing");
                    self.refresh_token(&refresh_token).await
                }
                None => {
                    warn!("Access token expired and no refresh token stored");
                    self.authorize().await
                }
            },
            None => {
                info!("No stored token, starting authorization");
                self.authorize().await
            }
        }
    }

    /// Exchange a refresh token for a new access token and persist it
    pub async fn refresh_token(&self, refresh_token: &str) -> SyncResult<OAuthToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("refresh_token", refresh_token),
            ("grant_type", "refresh_token"),
        ];

        let response = self.request_token(&params).await?;
        let token = response.into_token(Some(refresh_token.to_string()));
        self.store.save(&token).await?;

        Ok(token)
    }

    /// Run the interactive consent flow and persist the resulting token
    pub async fn authorize(&self) -> SyncResult<OAuthToken> {
        let code =
            request_authorization_code(&self.auth_url, &self.client_id, self.redirect_port).await?;
        let token = self.exchange_code(&code).await?;
        self.store.save(&token).await?;

        info!("Authorization complete, token saved");
        Ok(token)
    }

    /// Exchange an authorization code for tokens
    pub async fn exchange_code(&self, code: &AuthorizationCode) -> SyncResult<OAuthToken> {
        let params = [
            ("client_id", self.client_id.as_str()),
            ("client_secret", self.client_secret.as_str()),
            ("code", code.code.as_str()),
            ("redirect_uri", code.redirect_uri.as_str()),
            ("grant_type", "authorization_code"),
        ];

        let response = self.request_token(&params).await?;
        if response.refresh_token.is_none() {
            warn!("Token response has no refresh token; the next expiry needs a new authorization");
        }

        Ok(response.into_token(None))
    }

    async fn request_token(&self, params: &[(&str, &str)]) -> SyncResult<TokenResponse> {
        let response = self
            .client
            .post(&self.token_url)
            .form(params)
            .send()
            .await
            .map_err(|e| auth_error(&format!("Token request failed: {}", e)))?;

        if !response.status().is_success() {
            let status = response.status();
            let error_body = response
                .text()
                .await
                .unwrap_or_else(|_| "Could not read error response".to_string());
            return Err(auth_error(&format!(
                "Token request failed: HTTP {} - {}",
                status, error_body
            )));
        }

        response
            .json::<TokenResponse>()
            .await
            .map_err(|e| auth_error(&format!("Failed to parse token response: {}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    #[test]
    fn test_token_expiry() {
        let now = Utc.with_ymd_and_hms(2024, 3, 14, 6, 0, 0).unwrap();
        let token = |expires_at| OAuthToken {
            access_token: "a".to_string(),
            refresh_token: None,
            expires_at,
        };

        assert!(!token(now.timestamp() + 3600).is_expired(now));
        assert!(token(now.timestamp() - 1).is_expired(now));
        // Within the leeway counts as expired
        assert!(token(now.timestamp() + 30).is_expired(now));
    }

    #[test]
    fn test_refresh_keeps_previous_refresh_token() {
        let response = TokenResponse {
            access_token: "new".to_string(),
            refresh_token: None,
            expires_in: Some(10),
        };
        let token = response.into_token(Some("old-refresh".to_string()));

        assert_eq!(token.access_token, "new");
        assert_eq!(token.refresh_token.as_deref(), Some("old-refresh"));
        assert!(token.expires_at <= Utc::now().timestamp() + 10);
    }

    #[test]
    fn test_token_json_shape() {
        let token: OAuthToken =
            serde_json::from_str(r#"{"access_token":"a","expires_at":1700000000}"#).unwrap();
        assert_eq!(token.refresh_token, None);
        assert_eq!(
            serde_json::to_string(&token).unwrap(),
            r#"{"access_token":"a","expires_at":1700000000}"#
        );
    }
}
