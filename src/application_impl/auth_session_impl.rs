use crate::application_impl::{
    DEFAULT_EXPIRY_BUFFER_SECS, ExpiryEvaluator, RefreshCoordinator, SessionState, StorageKeys,
    TokenStore,
};
use crate::application_port::{AuthError, AuthSession};
use crate::domain_model::{AccessToken, CredentialPair};
use crate::domain_port::{
    AUTHORIZATION, ApiRequest, ApiResponse, AuthHeaders, AuthTransport, LoginCredentials,
    SecretStore, TokenDecoder, TokenReply, TransportError,
};
use std::sync::Arc;
use tracing::{debug, error, info, warn};

const GENERIC_LOGIN_FAILURE: &str = "login failed";

#[derive(Debug, Clone)]
pub struct SessionConfig {
    pub expiry_buffer_secs: u64,
    pub storage_keys: StorageKeys,
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            expiry_buffer_secs: DEFAULT_EXPIRY_BUFFER_SECS,
            storage_keys: StorageKeys::default(),
        }
    }
}

pub struct RealAuthSession {
    transport: Arc<dyn AuthTransport>,
    store: TokenStore,
    evaluator: ExpiryEvaluator,
    state: SessionState,
    refresher: RefreshCoordinator,
}

impl RealAuthSession {
    /// Builds a session and loads any credentials already persisted.
    pub async fn load(
        transport: Arc<dyn AuthTransport>,
        secrets: Arc<dyn SecretStore>,
        decoder: Arc<dyn TokenDecoder>,
        config: SessionConfig,
    ) -> Result<Self, AuthError> {
        let store = TokenStore::new(secrets, config.storage_keys);
        let initial = store.load().await?;
        debug!(
            has_access = initial.access_token.is_some(),
            has_refresh = initial.refresh_token.is_some(),
            "session loaded from store"
        );

        let state = SessionState::new(initial);
        let evaluator = ExpiryEvaluator::new(decoder, config.expiry_buffer_secs);
        let refresher = RefreshCoordinator::new(
            transport.clone(),
            store.clone(),
            state.clone(),
            evaluator.clone(),
        );
        Ok(Self {
            transport,
            store,
            evaluator,
            state,
            refresher,
        })
    }

    pub fn evaluator(&self) -> &ExpiryEvaluator {
        &self.evaluator
    }

    pub fn credentials(&self) -> CredentialPair {
        self.state.snapshot()
    }

    async fn clear_session(&self) -> Result<(), AuthError> {
        self.state.clear();
        self.store.clear().await
    }
}

#[async_trait::async_trait]
impl AuthSession for RealAuthSession {
    async fn login(&self, username: &str, password: &str) -> Result<(), AuthError> {
        let credentials = LoginCredentials {
            username: username.to_string(),
            password: password.to_string(),
        };

        let reply = self.transport.login(&credentials).await.map_err(|e| {
            warn!(username, error = %e, "login request failed");
            AuthError::Transport(e)
        })?;

        let issued = match reply {
            TokenReply::Granted(issued) => issued,
            TokenReply::Rejected(rejection) => {
                warn!(username, status = rejection.status, "login rejected");
                let message = rejection
                    .message
                    .filter(|m| !m.is_empty())
                    .unwrap_or_else(|| GENERIC_LOGIN_FAILURE.to_string());
                return Err(AuthError::LoginFailed(message));
            }
        };

        let pair = CredentialPair::issued(issued.access_token, issued.refresh_token);
        if pair.access_token.is_none() {
            return Err(AuthError::LoginFailed(
                "server returned an empty access token".to_string(),
            ));
        }

        // A fresh login never inherits the refresh token of an earlier session.
        let persisted = match self.store.clear().await {
            Ok(()) => self.store.save(&pair).await,
            Err(e) => Err(e),
        };
        if let Err(e) = persisted {
            error!(username, error = %e, "failed to persist credentials, ending session");
            if let Err(cleanup) = self.clear_session().await {
                error!(error = %cleanup, "failed to clear stored credentials");
            }
            return Err(e);
        }
        self.state.replace(pair);

        info!(username, "logged in");
        Ok(())
    }

    async fn logout(&self) -> Result<(), AuthError> {
        if let Some(access_token) = self.state.snapshot().access_token {
            let headers = AuthHeaders::from([(AUTHORIZATION.to_string(), access_token.bearer())]);
            if let Err(e) = self.transport.logout(&headers).await {
                warn!(error = %e, "server logout failed, ending local session anyway");
            }
        }

        let cleared = self.clear_session().await;
        if let Err(e) = &cleared {
            error!(error = %e, "failed to clear stored credentials on logout");
        }
        info!("logged out");
        cleared
    }

    async fn refresh(&self) -> Result<AccessToken, AuthError> {
        self.refresher.refresh().await
    }

    async fn get_valid_token(&self) -> Result<AccessToken, AuthError> {
        let CredentialPair {
            access_token,
            refresh_token,
        } = self.state.snapshot();

        let Some(access_token) = access_token else {
            return Err(AuthError::NotAuthenticated);
        };

        if !self.evaluator.is_expired(Some(access_token.as_str())) {
            return Ok(access_token);
        }

        let refreshable = refresh_token
            .as_ref()
            .is_some_and(|t| !self.evaluator.is_expired(Some(t.as_str())));
        if refreshable {
            debug!("access token expired, refreshing");
            return self.refresher.refresh_stale(&access_token).await;
        }

        info!("access and refresh tokens expired, ending session");
        if let Err(e) = self.clear_session().await {
            error!(error = %e, "failed to clear stored credentials");
        }
        Err(AuthError::SessionExpired)
    }

    async fn is_authenticated(&self) -> bool {
        self.get_valid_token().await.is_ok()
    }

    async fn get_auth_header(&self) -> AuthHeaders {
        match self.get_valid_token().await {
            Ok(token) => AuthHeaders::from([(AUTHORIZATION.to_string(), token.bearer())]),
            Err(e) => {
                debug!(error = %e, "no usable token for auth header");
                AuthHeaders::new()
            }
        }
    }

    async fn fetch_with_auth(&self, mut request: ApiRequest) -> Result<ApiResponse, TransportError> {
        request.merge_headers(self.get_auth_header().await);
        self.transport.request(request).await.inspect_err(|e| {
            warn!(error = %e, "authenticated request failed");
        })
    }
}
