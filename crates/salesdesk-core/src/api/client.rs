//! HTTP transport for the sales API.
//!
//! `ApiClient` sends a single `ApiRequest` and turns the response into either
//! an `ApiResponse` or a classified `ApiError`. It also talks to the two token
//! endpoints, which are never wrapped by the refresh logic.

use std::sync::Arc;

use reqwest::{header, Client, Response};
use tracing::debug;

use super::{ApiError, ApiRequest, ApiResponse};
use crate::config::ClientConfig;
use crate::models::{LoginRequest, LoginResponse, RefreshRequest, RefreshResponse};

// ============================================================================
// Constants
// ============================================================================

/// Login endpoint, exchanges phone + password for a token pair.
const LOGIN_PATH: &str = "/account/create_token/";

/// Token refresh endpoint, exchanges a refresh token for a new access token.
const TOKEN_REFRESH_PATH: &str = "/token_refresh/";

/// A new access token, plus the refresh token when the server rotated it.
#[derive(Clone)]
pub struct RenewedAccess {
    pub access: String,
    pub rotated_refresh: Option<String>,
}

/// API client for the sales backend.
/// Clone is cheap - reqwest::Client uses Arc internally for connection pooling.
#[derive(Clone)]
pub struct ApiClient {
    client: Client,
    base_url: Arc<str>,
    token: Option<Arc<str>>,
}

impl ApiClient {
    /// Create a new API client
    pub fn new(config: &ClientConfig) -> Result<Self, ApiError> {
        let client = Client::builder()
            .timeout(config.request_timeout)
            .danger_accept_invalid_certs(config.accept_invalid_certs)
            .build()?;

        Ok(Self {
            client,
            base_url: Arc::from(config.base_url.trim_end_matches('/')),
            token: None,
        })
    }

    /// Create a new ApiClient with the given token, sharing the connection pool.
    pub fn with_token(&self, token: impl Into<Arc<str>>) -> Self {
        Self {
            client: self.client.clone(), // Cheap clone, shares connection pool
            base_url: Arc::clone(&self.base_url),
            token: Some(token.into()),
        }
    }

    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    fn url(&self, path: &str) -> String {
        if path.starts_with('/') {
            format!("{}{}", self.base_url, path)
        } else {
            format!("{}/{}", self.base_url, path)
        }
    }

    /// Send one request. A token configured on this client replaces any
    /// credential already on the descriptor.
    pub async fn dispatch(&self, request: &ApiRequest) -> Result<ApiResponse, ApiError> {
        let authorized;
        let request = match self.token {
            Some(ref token) => {
                authorized = request.with_bearer(token)?;
                &authorized
            }
            None => request,
        };

        let url = self.url(request.path());
        let mut builder = self
            .client
            .request(request.method().clone(), &url)
            .headers(request.headers().clone())
            .header(header::ACCEPT, "application/json");
        if !request.query_pairs().is_empty() {
            builder = builder.query(request.query_pairs());
        }
        if let Some(body) = request.body() {
            builder = builder.json(body);
        }

        let response = builder.send().await?;
        debug!(
            method = %request.method(),
            path = request.path(),
            status = response.status().as_u16(),
            "API response"
        );

        let response = Self::check_response(response).await?;
        let status = response.status();
        let body = Self::read_body(response).await?;
        Ok(ApiResponse { status, body })
    }

    /// Exchange phone and password for a token pair.
    pub async fn login(&self, phone: &str, password: &str) -> Result<LoginResponse, ApiError> {
        let body = LoginRequest {
            phone: phone.to_string(),
            password: password.to_string(),
        };
        let response = self
            .client
            .post(self.url(LOGIN_PATH))
            .json(&body)
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        Ok(response.json().await?)
    }

    /// Exchange a refresh token for a new access token. A 2xx answer without
    /// an access token counts as a failed refresh.
    pub async fn refresh_access(&self, refresh: &str) -> Result<RenewedAccess, ApiError> {
        let response = self
            .client
            .post(self.url(TOKEN_REFRESH_PATH))
            .json(&RefreshRequest { refresh })
            .send()
            .await?;
        let response = Self::check_response(response).await?;
        let renewed: RefreshResponse = response.json().await?;

        match renewed.access {
            Some(access) if !access.is_empty() => Ok(RenewedAccess {
                access,
                rotated_refresh: renewed.refresh.filter(|r| !r.is_empty()),
            }),
            _ => Err(ApiError::InvalidResponse(
                "Token refresh response missing access token".to_string(),
            )),
        }
    }

    /// Check if response is successful, returning an error with body if not.
    async fn check_response(response: Response) -> Result<Response, ApiError> {
        if response.status().is_success() {
            Ok(response)
        } else {
            let status = response.status();
            let body = response.text().await.unwrap_or_default();
            Err(ApiError::from_status(status, &body))
        }
    }

    async fn read_body(response: Response) -> Result<serde_json::Value, ApiError> {
        let text = response.text().await?;
        if text.trim().is_empty() {
            return Ok(serde_json::Value::Null);
        }
        Ok(serde_json::from_str(&text)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_url_joining() {
        let client =
            ApiClient::new(&ClientConfig::with_base_url("https://api.example/")).expect("client");
        assert_eq!(client.base_url(), "https://api.example");
        assert_eq!(client.url("/sales"), "https://api.example/sales");
        assert_eq!(client.url("sales/1/"), "https://api.example/sales/1/");
    }

    #[test]
    fn test_with_token_keeps_base_url() {
        let client =
            ApiClient::new(&ClientConfig::with_base_url("https://api.example")).expect("client");
        let authed = client.with_token("tok");
        assert_eq!(authed.base_url(), "https://api.example");
        assert!(client.token.is_none());
        assert_eq!(authed.token.as_deref(), Some("tok"));
    }
}
