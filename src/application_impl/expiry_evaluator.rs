use crate::domain_port::TokenDecoder;
use chrono::{DateTime, Duration, Utc};
use std::sync::Arc;
use tracing::debug;

pub const DEFAULT_EXPIRY_BUFFER_SECS: u64 = 30;

/// Decides whether a token can still be handed out.
///
/// A token counts as expired when it is absent, when it cannot be decoded, or
/// when it expires before `now + buffer`. The buffer covers the time between
/// the check and the server seeing the token.
#[derive(Clone)]
pub struct ExpiryEvaluator {
    decoder: Arc<dyn TokenDecoder>,
    buffer: Duration,
}

impl ExpiryEvaluator {
    pub fn new(decoder: Arc<dyn TokenDecoder>, buffer_secs: u64) -> Self {
        let buffer = i64::try_from(buffer_secs)
            .ok()
            .and_then(Duration::try_seconds)
            .unwrap_or(Duration::MAX);
        Self { decoder, buffer }
    }

    pub fn buffer(&self) -> Duration {
        self.buffer
    }

    pub fn is_expired(&self, token: Option<&str>) -> bool {
        self.is_expired_at(token, Utc::now())
    }

    pub fn is_expired_at(&self, token: Option<&str>, now: DateTime<Utc>) -> bool {
        let Some(token) = token else {
            return true;
        };
        let claims = match self.decoder.decode(token) {
            Ok(claims) => claims,
            Err(e) => {
                debug!(error = %e, "token decode failed, treating as expired");
                return true;
            }
        };
        match now.checked_add_signed(self.buffer) {
            Some(deadline) => claims.expires_at < deadline,
            None => true,
        }
    }
}
