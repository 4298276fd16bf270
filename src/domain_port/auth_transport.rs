use crate::domain_model::{AccessToken, RefreshToken};
use serde::de::DeserializeOwned;
use std::collections::BTreeMap;
use std::fmt;

pub type AuthHeaders = BTreeMap<String, String>;

pub const AUTHORIZATION: &str = "Authorization";

#[derive(Debug, Clone, thiserror::Error)]
pub enum TransportError {
    #[error("network error: {0}")]
    Network(String),
    #[error("invalid request: {0}")]
    InvalidRequest(String),
    #[error("unexpected status {status}: {message}")]
    Status { status: u16, message: String },
    #[error("decode error: {0}")]
    Decode(String),
}

#[derive(Clone)]
pub struct LoginCredentials {
    pub username: String,
    pub password: String,
}

impl fmt::Debug for LoginCredentials {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("LoginCredentials")
            .field("username", &self.username)
            .finish_non_exhaustive()
    }
}

#[derive(Debug, Clone)]
pub struct IssuedTokens {
    pub access_token: AccessToken,
    pub refresh_token: Option<RefreshToken>,
}

#[derive(Debug, Clone)]
pub struct Rejection {
    pub status: u16,
    pub message: Option<String>,
}

impl fmt::Display for Rejection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.message {
            Some(message) => write!(f, "status {}: {}", self.status, message),
            None => write!(f, "status {}", self.status),
        }
    }
}

/// Outcome of a login or refresh exchange that reached the server.
#[derive(Debug, Clone)]
pub enum TokenReply {
    Granted(IssuedTokens),
    Rejected(Rejection),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

#[derive(Debug, Clone)]
pub struct ApiRequest {
    pub method: HttpMethod,
    pub url: String,
    pub headers: BTreeMap<String, String>,
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    pub fn new(method: HttpMethod, url: impl Into<String>) -> Self {
        Self {
            method,
            url: url.into(),
            headers: BTreeMap::new(),
            body: None,
        }
    }

    pub fn get(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Get, url)
    }

    pub fn post(url: impl Into<String>) -> Self {
        Self::new(HttpMethod::Post, url)
    }

    pub fn with_header(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.headers.insert(name.into(), value.into());
        self
    }

    pub fn with_json(mut self, value: &serde_json::Value) -> Self {
        self.headers
            .insert("Content-Type".to_string(), "application/json".to_string());
        self.body = Some(value.to_string().into_bytes());
        self
    }

    /// Applies `extra` over the existing headers. Names are compared
    /// case-insensitively, so `authorization` is replaced by `Authorization`.
    pub fn merge_headers(&mut self, extra: AuthHeaders) {
        for (name, value) in extra {
            self.headers.retain(|existing, _| !existing.eq_ignore_ascii_case(&name));
            self.headers.insert(name, value);
        }
    }

    pub fn header(&self, name: &str) -> Option<&str> {
        self.headers
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
            .map(|(_, value)| value.as_str())
    }
}

#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub headers: BTreeMap<String, String>,
    pub body: Vec<u8>,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    pub fn text(&self) -> String {
        String::from_utf8_lossy(&self.body).into_owned()
    }

    pub fn json<T: DeserializeOwned>(&self) -> Result<T, TransportError> {
        serde_json::from_slice(&self.body).map_err(|e| TransportError::Decode(e.to_string()))
    }
}

/// Connection to the authentication server.
#[async_trait::async_trait]
pub trait AuthTransport: Send + Sync {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenReply, TransportError>;
    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenReply, TransportError>;
    /// Best-effort server-side invalidation.
    async fn logout(&self, headers: &AuthHeaders) -> Result<(), TransportError>;
    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError>;
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn merge_headers_replaces_authorization_regardless_of_case() {
        let mut request = ApiRequest::get("http://localhost/items")
            .with_header("authorization", "Bearer stale")
            .with_header("Accept", "application/json");

        let mut auth = AuthHeaders::new();
        auth.insert(AUTHORIZATION.to_string(), "Bearer fresh".to_string());
        request.merge_headers(auth);

        assert_eq!(request.headers.len(), 2);
        assert_eq!(request.header("AUTHORIZATION"), Some("Bearer fresh"));
        assert_eq!(request.header("accept"), Some("application/json"));
    }

    #[test]
    fn merge_headers_with_empty_map_is_noop() {
        let mut request = ApiRequest::get("http://localhost").with_header("X-Trace", "1");
        request.merge_headers(AuthHeaders::new());
        assert_eq!(request.header("x-trace"), Some("1"));
        assert_eq!(request.headers.len(), 1);
    }
}
