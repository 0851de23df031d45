use super::token::OAuthToken;
use crate::config::{Config, TokenStoreKind};
use crate::error::{auth_error, SyncResult};
use async_trait::async_trait;
use redis::{AsyncCommands, Client as RedisClient};
use std::io::ErrorKind;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::fs;
use tracing::debug;

/// Redis key holding the token JSON
pub const TOKEN_REDIS_KEY: &str = "gymcal_google_token";

/// Persistent storage for the OAuth token between runs
#[async_trait]
pub trait TokenStore: Send + Sync {
    /// Load the stored token, `None` if nothing has been stored yet
    async fn load(&self) -> SyncResult<Option<OAuthToken>>;

    /// Replace the stored token
    async fn save(&self, token: &OAuthToken) -> SyncResult<()>;
}

/// Build the token store selected in the config
pub fn token_store_from_config(config: &Config) -> SyncResult<Arc<dyn TokenStore>> {
    match config.token_store {
        TokenStoreKind::File => Ok(Arc::new(FileTokenStore::new(config.token_path.clone()))),
        TokenStoreKind::Redis => Ok(Arc::new(RedisTokenStore::new(&config.redis_url)?)),
    }
}

/// Token kept as a JSON file on disk
#[derive(Debug, Clone)]
pub struct FileTokenStore {
    path: PathBuf,
}

impl FileTokenStore {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }
}

#[async_trait]
impl TokenStore for FileTokenStore {
    async fn load(&self) -> SyncResult<Option<OAuthToken>> {
        let content = match fs::read_to_string(&self.path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(None),
            Err(e) => return Err(e.into()),
        };

        let token = serde_json::from_str(&content).map_err(|e| {
            auth_error(&format!(
                "Failed to parse token file {}: {}",
                self.path.display(),
                e
            ))
        })?;

        Ok(Some(token))
    }

    async fn save(&self, token: &OAuthToken) -> SyncResult<()> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).await?;
        }

        fs::write(&self.path, serde_json::to_string_pretty(token)?).await?;
        debug!("Token saved to {}", self.path.display());

        Ok(())
    }
}

/// Token kept under a single Redis key
#[derive(Clone)]
pub struct RedisTokenStore {
    redis: RedisClient,
    redis_key: String,
}

impl RedisTokenStore {
    pub fn new(redis_url: &str) -> SyncResult<Self> {
        let redis = RedisClient::open(redis_url)
            .map_err(|e| auth_error(&format!("Failed to create Redis client: {}", e)))?;

        Ok(Self {
            redis,
            redis_key: TOKEN_REDIS_KEY.to_string(),
        })
    }
}

#[async_trait]
impl TokenStore for RedisTokenStore {
    async fn load(&self) -> SyncResult<Option<OAuthToken>> {
        let mut redis_conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| auth_error(&format!("Failed to connect to Redis: {}", e)))?;

        let token_str: Option<String> = redis_conn
            .get(&self.redis_key)
            .await
            .map_err(|e| auth_error(&format!("Failed to read token from Redis: {}", e)))?;

        match token_str {
            Some(token_str) => {
                let token = serde_json::from_str(&token_str).map_err(|e| {
                    auth_error(&format!("Failed to parse token JSON: {}", e))
                })?;
                Ok(Some(token))
            }
            None => Ok(None),
        }
    }

    async fn save(&self, token: &OAuthToken) -> SyncResult<()> {
        let mut redis_conn = self
            .redis
            .get_multiplexed_async_connection()
            .await
            .map_err(|e| auth_error(&format!("Failed to connect to Redis: {}", e)))?;

        let token_json = serde_json::to_string(token)?;
        let _: () = redis_conn
            .set(&self.redis_key, token_json)
            .await
            .map_err(|e| auth_error(&format!("Failed to save token to Redis: {}", e)))?;

        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_file_store_round_trip() {
        let dir = tempfile::tempdir().unwrap();
        let store = FileTokenStore::new(dir.path().join("nested").join("token.json"));

        assert!(store.load().await.unwrap().is_none());

        let token = OAuthToken {
            access_token: "access".to_string(),
            refresh_token: Some("refresh".to_string()),
            expires_at: 1_700_000_000,
        };
        store.save(&token).await.unwrap();

        assert_eq!(store.load().await.unwrap(), Some(token));
    }

    #[tokio::test]
    async fn test_file_store_rejects_garbage() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("token.json");
        std::fs::write(&path, "not json").unwrap();

        let result = FileTokenStore::new(path).load().await;
        assert!(matches!(result, Err(crate::error::Error::Auth(_))));
    }

    #[tokio::test]
    async fn test_file_store_reports_io_errors() {
        let dir = tempfile::tempdir().unwrap();

        // A directory is not a missing token
        let result = FileTokenStore::new(dir.path().to_path_buf()).load().await;
        assert!(matches!(result, Err(crate::error::Error::Io(_))));
    }
}
