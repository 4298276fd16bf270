use crate::domain_model::{AccessToken, RefreshToken};
use crate::domain_port::{
    AUTHORIZATION, ApiRequest, ApiResponse, AuthHeaders, AuthTransport, IssuedTokens,
    LoginCredentials, Rejection, TokenReply, TransportError,
};
use chrono::{DateTime, Duration, Utc};
use jsonwebtoken::{EncodingKey, Header, encode};
use serde::Serialize;
use std::collections::{BTreeMap, HashMap, HashSet};
use std::sync::atomic::{AtomicBool, AtomicUsize, Ordering};
use std::sync::{Mutex, PoisonError};

const FAKE_SIGNING_KEY: &[u8] = b"tokenward-fake-signing-key";

#[derive(Debug, Serialize)]
struct FakeClaims<'a> {
    sub: &'a str,
    exp: i64,
    iat: i64,
    jti: String,
}

/// Builds a JWT-shaped token expiring at `expires_at`, signed with a fixed
/// throwaway key.
pub fn fake_jwt(subject: &str, expires_at: DateTime<Utc>) -> Result<String, TransportError> {
    let claims = FakeClaims {
        sub: subject,
        exp: expires_at.timestamp(),
        iat: Utc::now().timestamp(),
        jti: uuid::Uuid::new_v4().to_string(),
    };
    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(FAKE_SIGNING_KEY),
    )
    .map_err(|e| TransportError::Decode(e.to_string()))
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Rotation {
    Rotate,
    Omit,
    Empty,
}

/// In-process stand-in for the authentication server.
///
/// Issues real JWTs, spends a refresh token on use when rotating (a replayed
/// refresh token is rejected, like most servers do), and records every call.
pub struct FakeAuthTransport {
    access_ttl: Duration,
    refresh_ttl: Duration,
    refresh_delay: std::time::Duration,
    rotation: Rotation,
    accounts: HashMap<String, String>,
    refresh_rejected: AtomicBool,
    logout_unreachable: AtomicBool,
    login_calls: AtomicUsize,
    refresh_calls: AtomicUsize,
    logout_calls: AtomicUsize,
    spent_refresh_tokens: Mutex<HashSet<String>>,
    logout_headers: Mutex<Vec<AuthHeaders>>,
    requests: Mutex<Vec<ApiRequest>>,
}

impl Default for FakeAuthTransport {
    fn default() -> Self {
        Self::new()
    }
}

impl FakeAuthTransport {
    pub fn new() -> Self {
        Self {
            access_ttl: Duration::minutes(15),
            refresh_ttl: Duration::days(7),
            refresh_delay: std::time::Duration::ZERO,
            rotation: Rotation::Rotate,
            accounts: HashMap::new(),
            refresh_rejected: AtomicBool::new(false),
            logout_unreachable: AtomicBool::new(false),
            login_calls: AtomicUsize::new(0),
            refresh_calls: AtomicUsize::new(0),
            logout_calls: AtomicUsize::new(0),
            spent_refresh_tokens: Mutex::new(HashSet::new()),
            logout_headers: Mutex::new(Vec::new()),
            requests: Mutex::new(Vec::new()),
        }
    }

    pub fn with_access_ttl(mut self, ttl: Duration) -> Self {
        self.access_ttl = ttl;
        self
    }

    pub fn with_refresh_ttl(mut self, ttl: Duration) -> Self {
        self.refresh_ttl = ttl;
        self
    }

    pub fn with_refresh_delay(mut self, delay: std::time::Duration) -> Self {
        self.refresh_delay = delay;
        self
    }

    /// Refresh replies omit the refresh token.
    pub fn without_rotation(mut self) -> Self {
        self.rotation = Rotation::Omit;
        self
    }

    /// Refresh replies carry `refreshToken: ""`.
    pub fn with_empty_rotation(mut self) -> Self {
        self.rotation = Rotation::Empty;
        self
    }

    /// Once any account is registered, logins must match one.
    pub fn with_account(mut self, username: &str, password: &str) -> Self {
        self.accounts
            .insert(username.to_string(), password.to_string());
        self
    }

    pub fn set_refresh_rejected(&self, rejected: bool) {
        self.refresh_rejected.store(rejected, Ordering::SeqCst);
    }

    pub fn set_logout_unreachable(&self, unreachable: bool) {
        self.logout_unreachable.store(unreachable, Ordering::SeqCst);
    }

    pub fn login_calls(&self) -> usize {
        self.login_calls.load(Ordering::SeqCst)
    }

    pub fn refresh_calls(&self) -> usize {
        self.refresh_calls.load(Ordering::SeqCst)
    }

    pub fn logout_calls(&self) -> usize {
        self.logout_calls.load(Ordering::SeqCst)
    }

    pub fn logout_headers(&self) -> Vec<AuthHeaders> {
        self.logout_headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    pub fn requests(&self) -> Vec<ApiRequest> {
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    fn issue(&self, subject: &str, rotation: Rotation) -> Result<IssuedTokens, TransportError> {
        let now = Utc::now();
        let access_token = AccessToken(fake_jwt(subject, now + self.access_ttl)?);
        let refresh_token = match rotation {
            Rotation::Rotate => Some(RefreshToken(fake_jwt(subject, now + self.refresh_ttl)?)),
            Rotation::Omit => None,
            Rotation::Empty => Some(RefreshToken(String::new())),
        };
        Ok(IssuedTokens {
            access_token,
            refresh_token,
        })
    }

    fn rejection(status: u16, message: &str) -> TokenReply {
        TokenReply::Rejected(Rejection {
            status,
            message: Some(message.to_string()),
        })
    }
}

#[async_trait::async_trait]
impl AuthTransport for FakeAuthTransport {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenReply, TransportError> {
        self.login_calls.fetch_add(1, Ordering::SeqCst);

        if !self.accounts.is_empty()
            && self.accounts.get(&credentials.username) != Some(&credentials.password)
        {
            return Ok(Self::rejection(401, "invalid username or password"));
        }

        Ok(TokenReply::Granted(
            self.issue(&credentials.username, Rotation::Rotate)?,
        ))
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenReply, TransportError> {
        self.refresh_calls.fetch_add(1, Ordering::SeqCst);

        if !self.refresh_delay.is_zero() {
            tokio::time::sleep(self.refresh_delay).await;
        }

        if self.refresh_rejected.load(Ordering::SeqCst) {
            return Ok(Self::rejection(401, "refresh rejected"));
        }

        if self.rotation == Rotation::Rotate {
            let mut spent = self
                .spent_refresh_tokens
                .lock()
                .unwrap_or_else(PoisonError::into_inner);
            if !spent.insert(refresh_token.as_str().to_string()) {
                return Ok(Self::rejection(401, "refresh token already used"));
            }
        }

        Ok(TokenReply::Granted(self.issue("fake-user", self.rotation)?))
    }

    async fn logout(&self, headers: &AuthHeaders) -> Result<(), TransportError> {
        self.logout_calls.fetch_add(1, Ordering::SeqCst);
        self.logout_headers
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(headers.clone());

        if self.logout_unreachable.load(Ordering::SeqCst) {
            return Err(TransportError::Network("connection refused".to_string()));
        }
        Ok(())
    }

    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let authorized = request.header(AUTHORIZATION).is_some();
        self.requests
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(request);

        let status = if authorized { 200 } else { 401 };
        let body = serde_json::json!({ "authorized": authorized });
        Ok(ApiResponse {
            status,
            headers: BTreeMap::from([(
                "content-type".to_string(),
                "application/json".to_string(),
            )]),
            body: body.to_string().into_bytes(),
        })
    }
}
