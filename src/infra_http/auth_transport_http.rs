use crate::domain_model::{AccessToken, RefreshToken};
use crate::domain_port::{
    ApiRequest, ApiResponse, AuthHeaders, AuthTransport, HttpMethod, IssuedTokens,
    LoginCredentials, Rejection, TokenReply, TransportError,
};
use reqwest::{Client, Method, Response};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::time::Duration;
use tracing::debug;

const LOGIN_PATH: &str = "/auth/login";
const REFRESH_PATH: &str = "/auth/refresh";
const LOGOUT_PATH: &str = "/auth/logout";

#[derive(Debug, Clone)]
pub struct HttpTransportConfig {
    pub api_url: String,
    pub request_timeout: Duration,
}

#[derive(Serialize)]
struct LoginBody<'a> {
    username: &'a str,
    password: &'a str,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct RefreshBody<'a> {
    refresh_token: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct TokenBody {
    access_token: String,
    #[serde(default)]
    refresh_token: Option<String>,
}

#[derive(Deserialize)]
struct ErrorBody {
    #[serde(default)]
    message: Option<String>,
}

/// [`AuthTransport`] over JSON/HTTP.
pub struct HttpAuthTransport {
    client: Client,
    api_url: String,
}

impl HttpAuthTransport {
    pub fn new(config: HttpTransportConfig) -> Result<Self, TransportError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| TransportError::InvalidRequest(e.to_string()))?;
        Ok(Self {
            client,
            api_url: config.api_url.trim_end_matches('/').to_string(),
        })
    }

    fn endpoint(&self, path: &str) -> String {
        format!("{}{}", self.api_url, path)
    }

    async fn exchange<B: Serialize + Sync>(
        &self,
        path: &str,
        body: &B,
    ) -> Result<TokenReply, TransportError> {
        let url = self.endpoint(path);
        let resp = self
            .client
            .post(&url)
            .json(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            debug!(%url, status = status.as_u16(), "token endpoint rejected request");
            return Ok(TokenReply::Rejected(Rejection {
                status: status.as_u16(),
                message: error_message(&text),
            }));
        }

        let body: TokenBody = resp
            .json()
            .await
            .map_err(|e| TransportError::Decode(e.to_string()))?;
        Ok(TokenReply::Granted(IssuedTokens {
            access_token: AccessToken(body.access_token),
            refresh_token: body.refresh_token.map(RefreshToken),
        }))
    }
}

fn map_reqwest_error(e: reqwest::Error) -> TransportError {
    if e.is_builder() {
        TransportError::InvalidRequest(e.to_string())
    } else {
        TransportError::Network(e.to_string())
    }
}

/// Pulls `message` out of a JSON error body, if there is one.
fn error_message(text: &str) -> Option<String> {
    serde_json::from_str::<ErrorBody>(text)
        .ok()
        .and_then(|b| b.message)
        .filter(|m| !m.is_empty())
}

fn to_method(method: HttpMethod) -> Method {
    match method {
        HttpMethod::Get => Method::GET,
        HttpMethod::Post => Method::POST,
        HttpMethod::Put => Method::PUT,
        HttpMethod::Patch => Method::PATCH,
        HttpMethod::Delete => Method::DELETE,
    }
}

async fn into_api_response(resp: Response) -> Result<ApiResponse, TransportError> {
    let status = resp.status().as_u16();
    let headers: BTreeMap<String, String> = resp
        .headers()
        .iter()
        .filter_map(|(name, value)| {
            value
                .to_str()
                .ok()
                .map(|v| (name.as_str().to_string(), v.to_string()))
        })
        .collect();
    let body = resp.bytes().await.map_err(map_reqwest_error)?.to_vec();
    Ok(ApiResponse {
        status,
        headers,
        body,
    })
}

#[async_trait::async_trait]
impl AuthTransport for HttpAuthTransport {
    async fn login(&self, credentials: &LoginCredentials) -> Result<TokenReply, TransportError> {
        let body = LoginBody {
            username: &credentials.username,
            password: &credentials.password,
        };
        self.exchange(LOGIN_PATH, &body).await
    }

    async fn refresh(&self, refresh_token: &RefreshToken) -> Result<TokenReply, TransportError> {
        let body = RefreshBody {
            refresh_token: refresh_token.as_str(),
        };
        self.exchange(REFRESH_PATH, &body).await
    }

    async fn logout(&self, headers: &AuthHeaders) -> Result<(), TransportError> {
        let mut builder = self.client.post(self.endpoint(LOGOUT_PATH));
        for (name, value) in headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        let resp = builder.send().await.map_err(map_reqwest_error)?;

        let status = resp.status();
        if !status.is_success() {
            let text = resp.text().await.unwrap_or_default();
            return Err(TransportError::Status {
                status: status.as_u16(),
                message: error_message(&text).unwrap_or(text),
            });
        }
        Ok(())
    }

    async fn request(&self, request: ApiRequest) -> Result<ApiResponse, TransportError> {
        let ApiRequest {
            method,
            url,
            headers,
            body,
        } = request;

        let mut builder = self.client.request(to_method(method), &url);
        for (name, value) in &headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = body {
            builder = builder.body(body);
        }

        let resp = builder.send().await.map_err(map_reqwest_error)?;
        into_api_response(resp).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_message_reads_json_message() {
        assert_eq!(
            error_message(r#"{"message":"Invalid credentials"}"#),
            Some("Invalid credentials".to_string())
        );
    }

    #[test]
    fn error_message_ignores_non_json_and_blank() {
        assert_eq!(error_message("Bad Gateway"), None);
        assert_eq!(error_message(r#"{"message":""}"#), None);
        assert_eq!(error_message(r#"{"error":"nope"}"#), None);
    }

    #[test]
    fn trailing_slash_is_trimmed() {
        let transport = HttpAuthTransport::new(HttpTransportConfig {
            api_url: "http://localhost:8080/".to_string(),
            request_timeout: Duration::from_secs(5),
        })
        .unwrap();
        assert_eq!(
            transport.endpoint(LOGIN_PATH),
            "http://localhost:8080/auth/login"
        );
    }
}
