//! Secret service implementation.
//!
//! Reads API keys from secret.json and falls back to environment variables.

use crate::storage::{SecretStorage, SecretStorageError};
use kambo_core::config::SecretConfig;
use kambo_core::secret::SecretService;
use std::path::PathBuf;
use tokio::sync::RwLock;

/// secret.json-backed [`SecretService`] with a load-once cache.
///
/// A missing file is treated as an empty configuration.
pub struct SecretServiceImpl {
    storage: SecretStorage,
    cache: RwLock<Option<SecretConfig>>,
}

impl SecretServiceImpl {
    pub fn new(path: PathBuf) -> Self {
        Self {
            storage: SecretStorage::with_path(path),
            cache: RwLock::new(None),
        }
    }

    async fn load_cached(&self) -> Result<SecretConfig, String> {
        if let Some(cached) = self.cache.read().await.as_ref() {
            return Ok(cached.clone());
        }

        let loaded = match self.storage.load().await {
            Ok(config) => config,
            Err(SecretStorageError::NotFound(path)) => {
                tracing::debug!(path = %path.display(), "[SecretService] No secret file");
                SecretConfig::default()
            }
            // Message carries the path and parser position only, never values.
            Err(e) => return Err(e.to_string()),
        };

        *self.cache.write().await = Some(loaded.clone());
        Ok(loaded)
    }
}

#[async_trait::async_trait]
impl SecretService for SecretServiceImpl {
    async fn load_secrets(&self) -> Result<SecretConfig, String> {
        self.load_cached().await
    }

    async fn get_secret(&self, name: &str, fallback_env_var: Option<&str>) -> Option<String> {
        let from_file = match self.load_cached().await {
            Ok(config) => {
                let entry = match name {
                    "openai" => config.openai,
                    "claude" => config.claude,
                    _ => None,
                };
                entry
                    .map(|e| e.api_key)
                    .filter(|key| !key.trim().is_empty())
            }
            Err(e) => {
                tracing::warn!(error = %e, "[SecretService] Failed to read secret file");
                None
            }
        };

        from_file.or_else(|| {
            fallback_env_var
                .and_then(|var| std::env::var(var).ok())
                .filter(|key| !key.trim().is_empty())
        })
    }
}
