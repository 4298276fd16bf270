#[derive(Debug, Clone, thiserror::Error)]
pub enum SecretStoreError {
    #[error("io error: {0}")]
    Io(String),
    #[error("corrupt store: {0}")]
    Corrupt(String),
}

/// Key/value persistence for credential strings.
#[async_trait::async_trait]
pub trait SecretStore: Send + Sync {
    async fn get(&self, key: &str) -> Result<Option<String>, SecretStoreError>;
    async fn set(&self, key: &str, value: &str) -> Result<(), SecretStoreError>;
    /// Removing a missing key is not an error.
    async fn remove(&self, key: &str) -> Result<(), SecretStoreError>;
}
