use crate::domain_model::AccessToken;
use crate::domain_port::{ApiRequest, ApiResponse, AuthHeaders, SecretStoreError, TransportError};

/// Session failures. `Clone` so a single refresh outcome can be handed to
/// every caller waiting on it.
#[derive(Debug, Clone, thiserror::Error)]
pub enum AuthError {
    #[error("login failed: {0}")]
    LoginFailed(String),
    #[error("no refresh token available")]
    NoRefreshToken,
    #[error("session expired")]
    SessionExpired,
    #[error("not authenticated")]
    NotAuthenticated,
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),
    #[error("transport error: {0}")]
    Transport(#[from] TransportError),
    #[error("store error: {0}")]
    Store(String),
}

impl From<SecretStoreError> for AuthError {
    fn from(error: SecretStoreError) -> Self {
        AuthError::Store(error.to_string())
    }
}

impl AuthError {
    /// True for errors after which the caller has to log in again.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            AuthError::NoRefreshToken
                | AuthError::SessionExpired
                | AuthError::NotAuthenticated
                | AuthError::RefreshFailed(_)
        )
    }
}

#[async_trait::async_trait]
pub trait AuthSession: Send + Sync {
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError>;
    /// Ends the local session. Server notification failures are absorbed;
    /// only a failure to clear local persistence is reported.
    async fn logout(&self) -> Result<(), AuthError>;
    async fn refresh(&self) -> Result<AccessToken, AuthError>;
    async fn get_valid_token(&self) -> Result<AccessToken, AuthError>;
    async fn is_authenticated(&self) -> bool;
    async fn get_auth_header(&self) -> AuthHeaders;
    async fn fetch_with_auth(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}
