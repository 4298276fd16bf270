use crate::application_impl::{ExpiryEvaluator, SessionState, TokenStore};
use crate::application_port::AuthError;
use crate::domain_model::{AccessToken, CredentialPair, RefreshToken};
use crate::domain_port::{AuthTransport, TokenReply};
use futures_util::future::{self, BoxFuture, FutureExt, Shared};
use std::panic::AssertUnwindSafe;
use std::sync::atomic::{AtomicU64, Ordering};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use tracing::{debug, error, info, warn};

type PendingRefresh = Shared<BoxFuture<'static, Result<AccessToken, AuthError>>>;

/// Runs at most one token refresh at a time.
///
/// The first caller spawns the refresh; callers arriving while it is pending
/// await the same shared future and observe the same outcome. The refresh
/// runs on its own task, so waiters that give up do not cancel it. The
/// pending slot is emptied by the task itself before the outcome reaches any
/// waiter, on success, failure and panic alike.
///
/// Callers that decided a token was stale before the previous refresh
/// finished use [`RefreshCoordinator::refresh_stale`] and get the token that
/// refresh produced instead of spending the rotated refresh token again.
#[derive(Clone)]
pub struct RefreshCoordinator {
    inner: Arc<RefreshInner>,
}

struct RefreshInner {
    transport: Arc<dyn AuthTransport>,
    store: TokenStore,
    state: SessionState,
    evaluator: ExpiryEvaluator,
    pending: Mutex<Option<PendingRefresh>>,
    attempts: AtomicU64,
}

struct ReleaseOnDrop(Arc<RefreshInner>);

impl Drop for ReleaseOnDrop {
    fn drop(&mut self) {
        *self.0.lock_pending() = None;
    }
}

impl RefreshCoordinator {
    pub fn new(
        transport: Arc<dyn AuthTransport>,
        store: TokenStore,
        state: SessionState,
        evaluator: ExpiryEvaluator,
    ) -> Self {
        Self {
            inner: Arc::new(RefreshInner {
                transport,
                store,
                state,
                evaluator,
                pending: Mutex::new(None),
                attempts: AtomicU64::new(0),
            }),
        }
    }

    pub async fn refresh(&self) -> Result<AccessToken, AuthError> {
        self.pending_or_start(None).await
    }

    /// Refreshes on behalf of a caller that found `stale` expired. If the
    /// session already holds a different, unexpired access token, that token
    /// is returned without contacting the server.
    pub async fn refresh_stale(&self, stale: &AccessToken) -> Result<AccessToken, AuthError> {
        self.pending_or_start(Some(stale)).await
    }

    pub fn is_refreshing(&self) -> bool {
        self.inner.lock_pending().is_some()
    }

    fn pending_or_start(&self, stale: Option<&AccessToken>) -> PendingRefresh {
        let mut slot = self.inner.lock_pending();
        if let Some(pending) = slot.as_ref() {
            debug!("joining in-flight token refresh");
            return pending.clone();
        }

        // A finished refresh merges its tokens before it empties the slot, so
        // with the slot empty the state already shows its outcome.
        if let Some(current) = stale.and_then(|stale| self.inner.superseded(stale)) {
            debug!("access token already renewed by an earlier refresh");
            return future::ready(Ok::<_, AuthError>(current)).boxed().shared();
        }

        let attempt = self.inner.attempts.fetch_add(1, Ordering::Relaxed) + 1;
        let inner = self.inner.clone();
        let task = tokio::spawn(async move {
            let _release = ReleaseOnDrop(inner.clone());
            match AssertUnwindSafe(inner.run(attempt)).catch_unwind().await {
                Ok(result) => result,
                Err(_) => {
                    error!(attempt, "token refresh panicked, clearing session");
                    inner.clear_session().await;
                    Err(AuthError::RefreshFailed("refresh task panicked".to_string()))
                }
            }
        });

        let pending = async move {
            match task.await {
                Ok(result) => result,
                Err(e) => Err(AuthError::RefreshFailed(format!(
                    "refresh task aborted: {e}"
                ))),
            }
        }
        .boxed()
        .shared();

        *slot = Some(pending.clone());
        pending
    }
}

impl RefreshInner {
    fn lock_pending(&self) -> MutexGuard<'_, Option<PendingRefresh>> {
        self.pending.lock().unwrap_or_else(PoisonError::into_inner)
    }

    fn superseded(&self, stale: &AccessToken) -> Option<AccessToken> {
        let current = self.state.snapshot().access_token?;
        if &current == stale || self.evaluator.is_expired(Some(current.as_str())) {
            return None;
        }
        Some(current)
    }

    async fn run(&self, attempt: u64) -> Result<AccessToken, AuthError> {
        let Some(refresh_token) = self.state.refresh_token() else {
            warn!(attempt, "refresh requested without a refresh token");
            self.clear_session().await;
            return Err(AuthError::NoRefreshToken);
        };

        debug!(attempt, "refreshing access token");
        match self.exchange(&refresh_token).await {
            Ok(access_token) => {
                info!(attempt, "access token refreshed");
                Ok(access_token)
            }
            Err(e) => {
                warn!(attempt, error = %e, "token refresh failed, clearing session");
                self.clear_session().await;
                Err(e)
            }
        }
    }

    async fn exchange(&self, refresh_token: &RefreshToken) -> Result<AccessToken, AuthError> {
        let reply = self
            .transport
            .refresh(refresh_token)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;

        let issued = match reply {
            TokenReply::Granted(issued) => issued,
            TokenReply::Rejected(rejection) => {
                return Err(AuthError::RefreshFailed(rejection.to_string()));
            }
        };

        let update = CredentialPair::issued(issued.access_token, issued.refresh_token);
        let access_token = update.access_token.clone().ok_or_else(|| {
            AuthError::RefreshFailed("server returned an empty access token".to_string())
        })?;
        if update.refresh_token.is_none() {
            debug!("refresh reply carried no new refresh token, keeping the current one");
        }

        self.store
            .save(&update)
            .await
            .map_err(|e| AuthError::RefreshFailed(e.to_string()))?;
        self.state.merge(update);

        Ok(access_token)
    }

    async fn clear_session(&self) {
        self.state.clear();
        if let Err(e) = self.store.clear().await {
            error!(error = %e, "failed to clear stored credentials");
        }
    }
}
