use crate::application_port::AuthError;
use crate::domain_model::{AccessToken, CredentialPair, RefreshToken};
use crate::domain_port::SecretStore;
use std::sync::Arc;

pub const DEFAULT_ACCESS_KEY: &str = "auth_access_token";
pub const DEFAULT_REFRESH_KEY: &str = "auth_refresh_token";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StorageKeys {
    pub access: String,
    pub refresh: String,
}

impl Default for StorageKeys {
    fn default() -> Self {
        Self {
            access: DEFAULT_ACCESS_KEY.to_string(),
            refresh: DEFAULT_REFRESH_KEY.to_string(),
        }
    }
}

/// Reads and writes the credential pair through a [`SecretStore`].
#[derive(Clone)]
pub struct TokenStore {
    backend: Arc<dyn SecretStore>,
    keys: StorageKeys,
}

impl TokenStore {
    pub fn new(backend: Arc<dyn SecretStore>, keys: StorageKeys) -> Self {
        Self { backend, keys }
    }

    pub async fn load(&self) -> Result<CredentialPair, AuthError> {
        let access_token = self.backend.get(&self.keys.access).await?.map(AccessToken);
        let refresh_token = self.backend.get(&self.keys.refresh).await?.map(RefreshToken);
        Ok(CredentialPair {
            access_token,
            refresh_token,
        })
    }

    /// Writes the present fields. An absent refresh token keeps the stored one.
    pub async fn save(&self, pair: &CredentialPair) -> Result<(), AuthError> {
        if let Some(access_token) = &pair.access_token {
            self.backend.set(&self.keys.access, access_token.as_str()).await?;
        }
        if let Some(refresh_token) = &pair.refresh_token {
            self.backend.set(&self.keys.refresh, refresh_token.as_str()).await?;
        }
        Ok(())
    }

    /// Removes both entries; the second removal runs even if the first fails.
    pub async fn clear(&self) -> Result<(), AuthError> {
        let access = self.backend.remove(&self.keys.access).await;
        let refresh = self.backend.remove(&self.keys.refresh).await;
        access?;
        refresh?;
        Ok(())
    }
}
