use async_trait::async_trait;
use chrono::Utc;
use gymcal::components::google_oauth::{OAuthToken, TokenManager, TokenStore};
use gymcal::config::Config;
use gymcal::error::{Error, SyncResult};
use serde_json::json;
use std::sync::{Arc, Mutex};
use wiremock::matchers::{body_string_contains, method, path};
use wiremock::{Mock, MockServer, ResponseTemplate};

/// In-memory token store for testing without disk or Redis
#[derive(Default)]
struct MemoryTokenStore {
    token: Mutex<Option<OAuthToken>>,
}

#[async_trait]
impl TokenStore for MemoryTokenStore {
    async fn load(&self) -> SyncResult<Option<OAuthToken>> {
        Ok(self.token.lock().unwrap().clone())
    }

    async fn save(&self, token: &OAuthToken) -> SyncResult<()> {
        *self.token.lock().unwrap() = Some(token.clone());
        Ok(())
    }
}

fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "GOOGLE_CLIENT_ID" => Some("client-1".to_string()),
        "GOOGLE_CLIENT_SECRET" => Some("secret-1".to_string()),
        "GMAIL_ADDRESS" => Some("someone@example.com".to_string()),
        _ => None,
    })
    .unwrap()
}

fn manager(server: &MockServer, store: Arc<MemoryTokenStore>) -> TokenManager {
    let token_url = format!("{}/token", server.uri());
    let auth_url = format!("{}/auth", server.uri());
    TokenManager::new(&test_config(), store, reqwest::Client::new())
        .with_endpoints(&token_url, &auth_url)
}

#[tokio::test]
async fn test_valid_token_is_used_as_is() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(500))
        .expect(0)
        .mount(&server)
        .await;

    let stored = OAuthToken {
        access_token: "still-good".to_string(),
        refresh_token: Some("refresh-1".to_string()),
        expires_at: Utc::now().timestamp() + 3600,
    };
    let store = Arc::new(MemoryTokenStore {
        token: Mutex::new(Some(stored.clone())),
    });

    let token = manager(&server, store).get_token().await.unwrap();
    assert_eq!(token, stored);
}

#[tokio::test]
async fn test_expired_token_is_refreshed_and_persisted() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .and(body_string_contains("grant_type=refresh_token"))
        .and(body_string_contains("refresh_token=refresh-1"))
        .and(body_string_contains("client_id=client-1"))
        .respond_with(ResponseTemplate::new(200).set_body_json(json!({
            "access_token": "fresh",
            "expires_in": 3599,
            "token_type": "Bearer",
        })))
        .expect(1)
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore {
        token: Mutex::new(Some(OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: Some("refresh-1".to_string()),
            expires_at: Utc::now().timestamp() - 10,
        })),
    });

    let token = manager(&server, Arc::clone(&store)).get_token().await.unwrap();
    assert_eq!(token.access_token, "fresh");
    assert_eq!(token.refresh_token.as_deref(), Some("refresh-1"));
    assert!(token.expires_at > Utc::now().timestamp());

    // The refreshed token replaced the stale one
    let saved = store.token.lock().unwrap().clone().unwrap();
    assert_eq!(saved, token);
}

#[tokio::test]
async fn test_refresh_failure_is_an_auth_error() {
    let server = MockServer::start().await;
    Mock::given(method("POST"))
        .and(path("/token"))
        .respond_with(ResponseTemplate::new(400).set_body_json(json!({
            "error": "invalid_grant",
        })))
        .mount(&server)
        .await;

    let store = Arc::new(MemoryTokenStore {
        token: Mutex::new(Some(OAuthToken {
            access_token: "stale".to_string(),
            refresh_token: Some("revoked".to_string()),
            expires_at: 0,
        })),
    });

    let result = manager(&server, Arc::clone(&store)).get_token().await;
    assert!(matches!(result, Err(Error::Auth(_))));

    // Nothing was overwritten
    let saved = store.token.lock().unwrap().clone().unwrap();
    assert_eq!(saved.access_token, "stale");
}
