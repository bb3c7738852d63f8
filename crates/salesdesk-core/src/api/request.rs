use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, StatusCode};
use serde::{de::DeserializeOwned, Serialize};

use super::ApiError;

/// Description of one outbound API call.
///
/// A descriptor is never changed after it is dispatched; attaching a
/// credential produces a new copy (`with_bearer`), so the original can be
/// re-sent with a different token.
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    query: Vec<(String, String)>,
    headers: HeaderMap,
    body: Option<serde_json::Value>,
}

impl ApiRequest {
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            headers: HeaderMap::new(),
            body: None,
        }
    }

    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    pub fn query<K, V>(mut self, pairs: impl IntoIterator<Item = (K, V)>) -> Self
    where
        K: Into<String>,
        V: Into<String>,
    {
        self.query
            .extend(pairs.into_iter().map(|(k, v)| (k.into(), v.into())));
        self
    }

    pub fn json<B: Serialize + ?Sized>(mut self, body: &B) -> Result<Self, ApiError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    pub fn header(mut self, name: HeaderName, value: &str) -> Result<Self, ApiError> {
        self.headers.insert(name, HeaderValue::from_str(value)?);
        Ok(self)
    }

    /// Copy of this request carrying `Authorization: Bearer <token>`,
    /// replacing any credential already attached.
    pub fn with_bearer(&self, token: &str) -> Result<Self, ApiError> {
        let mut value = HeaderValue::from_str(&format!("Bearer {}", token))?;
        value.set_sensitive(true);

        let mut derived = self.clone();
        derived.headers.insert(header::AUTHORIZATION, value);
        Ok(derived)
    }

    /// The bearer token attached to this request, if any.
    pub fn bearer_token(&self) -> Option<&str> {
        self.headers
            .get(header::AUTHORIZATION)
            .and_then(|v| v.to_str().ok())
            .and_then(|v| v.strip_prefix("Bearer "))
    }

    pub fn method(&self) -> &Method {
        &self.method
    }

    pub fn path(&self) -> &str {
        &self.path
    }

    pub fn query_pairs(&self) -> &[(String, String)] {
        &self.query
    }

    pub fn headers(&self) -> &HeaderMap {
        &self.headers
    }

    pub fn body(&self) -> Option<&serde_json::Value> {
        self.body.as_ref()
    }
}

/// A successful (2xx) API response. Empty bodies decode as `Null`.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: StatusCode,
    pub body: serde_json::Value,
}

impl ApiResponse {
    pub fn json<T: DeserializeOwned>(&self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.body.clone())?)
    }

    pub fn into_json<T: DeserializeOwned>(self) -> Result<T, ApiError> {
        Ok(serde_json::from_value(self.body)?)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_with_bearer_derives_a_copy() {
        let original = ApiRequest::get("/sales").query([("page", "1")]);
        let authed = original.with_bearer("old").expect("valid token");
        let reauthed = authed.with_bearer("new123").expect("valid token");

        assert_eq!(original.bearer_token(), None);
        assert_eq!(authed.bearer_token(), Some("old"));
        assert_eq!(reauthed.bearer_token(), Some("new123"));
        assert_eq!(reauthed.query_pairs(), original.query_pairs());
        assert_eq!(reauthed.path(), "/sales");
    }

    #[test]
    fn test_debug_hides_bearer_token() {
        let authed = ApiRequest::get("/sales")
            .with_bearer("very-secret")
            .expect("valid token");
        assert!(!format!("{:?}", authed).contains("very-secret"));
    }

    #[test]
    fn test_bad_token_is_rejected() {
        let err = ApiRequest::get("/sales").with_bearer("line\nbreak");
        assert!(matches!(err, Err(ApiError::InvalidHeader(_))));
    }

    #[test]
    fn test_response_json() {
        let resp = ApiResponse {
            status: StatusCode::OK,
            body: serde_json::json!({"uuid": "w-1", "name": "Main"}),
        };
        let warehouse: crate::models::Warehouse = resp.json().expect("warehouse");
        assert_eq!(warehouse.name, "Main");
        assert!(resp.json::<Vec<String>>().is_err());
    }
}
