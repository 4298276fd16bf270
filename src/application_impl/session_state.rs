use crate::domain_model::{CredentialPair, RefreshToken};
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};

/// In-memory credentials of one session, shared between the facade and its
/// refresh coordinator.
#[derive(Clone, Default)]
pub struct SessionState {
    credentials: Arc<Mutex<CredentialPair>>,
}

impl SessionState {
    pub fn new(initial: CredentialPair) -> Self {
        Self {
            credentials: Arc::new(Mutex::new(initial)),
        }
    }

    fn lock(&self) -> MutexGuard<'_, CredentialPair> {
        self.credentials.lock().unwrap_or_else(PoisonError::into_inner)
    }

    pub fn snapshot(&self) -> CredentialPair {
        self.lock().clone()
    }

    pub fn refresh_token(&self) -> Option<RefreshToken> {
        self.lock().refresh_token.clone()
    }

    pub fn replace(&self, pair: CredentialPair) {
        *self.lock() = pair;
    }

    pub fn merge(&self, update: CredentialPair) {
        self.lock().merge(update);
    }

    pub fn clear(&self) {
        *self.lock() = CredentialPair::default();
    }
}
