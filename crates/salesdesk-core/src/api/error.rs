use thiserror::Error;

/// Outcome of a single dispatch to the API.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("Access denied: {0}")]
    AccessDenied(String),

    #[error("Unauthorized - token may be expired")]
    Unauthorized,

    #[error("Resource not found: {0}")]
    NotFound(String),

    #[error("Rate limited - please wait before retrying")]
    RateLimited,

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Server error: {0}")]
    ServerError(String),

    #[error("Network error: {0}")]
    NetworkError(#[from] reqwest::Error),

    #[error("Invalid header value: {0}")]
    InvalidHeader(#[from] reqwest::header::InvalidHeaderValue),

    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("Invalid identifier: {0}")]
    InvalidId(String),

    #[error("Invalid response: {0}")]
    InvalidResponse(String),
}

/// Maximum length for error response bodies in error messages
const MAX_ERROR_BODY_LENGTH: usize = 500;

impl ApiError {
    /// Truncate a response body to avoid logging excessive data
    fn truncate_body(body: &str) -> String {
        if body.len() <= MAX_ERROR_BODY_LENGTH {
            body.to_string()
        } else {
            let mut end = MAX_ERROR_BODY_LENGTH;
            while !body.is_char_boundary(end) {
                end -= 1;
            }
            format!("{}... (truncated, {} total bytes)", &body[..end], body.len())
        }
    }

    pub fn from_status(status: reqwest::StatusCode, body: &str) -> Self {
        let truncated = Self::truncate_body(body);
        match status.as_u16() {
            400 | 422 => ApiError::BadRequest(truncated),
            401 => ApiError::Unauthorized,
            403 => ApiError::AccessDenied(truncated),
            404 => ApiError::NotFound(truncated),
            429 => ApiError::RateLimited,
            500..=599 => ApiError::ServerError(truncated),
            _ => ApiError::InvalidResponse(format!("Status {}: {}", status, truncated)),
        }
    }

    /// The only signal that starts a token refresh.
    pub fn is_unauthorized(&self) -> bool {
        matches!(self, ApiError::Unauthorized)
    }
}

/// Outcome of `AuthenticatedClient::execute` when it does not succeed.
#[derive(Error, Debug)]
pub enum RequestError {
    /// Any failure other than a 401, including transport errors. Passed
    /// through untouched; the session is not modified.
    #[error(transparent)]
    Api(#[from] ApiError),

    /// 401 with no refresh token to recover with. The session was
    /// invalidated; the original 401 is the source.
    #[error("Session expired - please log in again")]
    UnauthorizedNoRefresh(#[source] ApiError),

    /// The token endpoint rejected the refresh or could not be reached.
    /// The session was invalidated.
    #[error("Token refresh failed: {0}")]
    RefreshFailed(#[source] ApiError),

    /// The retry after a successful refresh failed. Not retried again and the
    /// session is left in place, even when the retry was itself a 401.
    #[error("Request failed after token refresh: {0}")]
    RetriedFinalError(#[source] ApiError),
}

impl RequestError {
    /// The underlying API error, whichever stage produced it.
    pub fn api_error(&self) -> &ApiError {
        match self {
            RequestError::Api(e)
            | RequestError::UnauthorizedNoRefresh(e)
            | RequestError::RefreshFailed(e)
            | RequestError::RetriedFinalError(e) => e,
        }
    }

    /// Whether handling this error cleared the session.
    pub fn session_invalidated(&self) -> bool {
        matches!(
            self,
            RequestError::UnauthorizedNoRefresh(_) | RequestError::RefreshFailed(_)
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_from_status_classifies() {
        assert!(ApiError::from_status(StatusCode::UNAUTHORIZED, "").is_unauthorized());
        assert!(matches!(
            ApiError::from_status(StatusCode::FORBIDDEN, "no"),
            ApiError::AccessDenied(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::NOT_FOUND, "gone"),
            ApiError::NotFound(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_REQUEST, "{\"date\": [\"required\"]}"),
            ApiError::BadRequest(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::BAD_GATEWAY, ""),
            ApiError::ServerError(_)
        ));
        assert!(matches!(
            ApiError::from_status(StatusCode::IM_A_TEAPOT, ""),
            ApiError::InvalidResponse(_)
        ));
    }

    #[test]
    fn test_long_bodies_are_truncated() {
        let body = "é".repeat(400);
        match ApiError::from_status(StatusCode::INTERNAL_SERVER_ERROR, &body) {
            ApiError::ServerError(msg) => {
                assert!(msg.contains("truncated"));
                assert!(msg.len() < body.len());
            }
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[test]
    fn test_request_error_exposes_stage() {
        let err = RequestError::UnauthorizedNoRefresh(ApiError::Unauthorized);
        assert!(err.session_invalidated());
        assert!(err.api_error().is_unauthorized());

        let err = RequestError::RetriedFinalError(ApiError::Unauthorized);
        assert!(!err.session_invalidated());

        let err: RequestError = ApiError::RateLimited.into();
        assert!(!err.session_invalidated());
    }
}
