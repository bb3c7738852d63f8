use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};

use crate::models::{AuthTokens, User};

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SessionData {
    pub tokens: AuthTokens,
    pub user: User,
    /// Set when a token refresh failed; the session is about to be cleared.
    #[serde(default)]
    pub error: Option<String>,
    pub created_at: DateTime<Utc>,
    /// When the access token was last replaced by a refresh.
    #[serde(default)]
    pub refreshed_at: Option<DateTime<Utc>>,
}

impl SessionData {
    pub fn new(tokens: AuthTokens, user: User) -> Self {
        Self {
            tokens,
            user,
            error: None,
            created_at: Utc::now(),
            refreshed_at: None,
        }
    }

    /// Access token, if one is set.
    pub fn access(&self) -> Option<&str> {
        Some(self.tokens.access.as_str()).filter(|t| !t.is_empty())
    }

    /// Refresh token, if one is set.
    pub fn refresh(&self) -> Option<&str> {
        Some(self.tokens.refresh.as_str()).filter(|t| !t.is_empty())
    }

    pub fn is_stale(&self) -> bool {
        self.error.is_some()
    }

    /// Replace the access token, and the refresh token when the server rotated it.
    pub fn apply_refresh(&mut self, access: String, refresh: Option<String>) {
        self.tokens.access = access;
        if let Some(refresh) = refresh.filter(|r| !r.is_empty()) {
            self.tokens.refresh = refresh;
        }
        self.error = None;
        self.refreshed_at = Some(Utc::now());
    }

    /// Age of the current access token, for display.
    pub fn token_age(&self) -> Duration {
        Utc::now() - self.refreshed_at.unwrap_or(self.created_at)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn session(access: &str, refresh: &str) -> SessionData {
        SessionData::new(
            AuthTokens {
                access: access.to_string(),
                refresh: refresh.to_string(),
            },
            User::default(),
        )
    }

    #[test]
    fn test_empty_tokens_read_as_absent() {
        let data = session("", "");
        assert_eq!(data.access(), None);
        assert_eq!(data.refresh(), None);

        let data = session("a1", "r1");
        assert_eq!(data.access(), Some("a1"));
        assert_eq!(data.refresh(), Some("r1"));
    }

    #[test]
    fn test_apply_refresh_keeps_refresh_token_unless_rotated() {
        let mut data = session("a1", "r1");
        data.error = Some("stale".to_string());

        data.apply_refresh("a2".to_string(), None);
        assert_eq!(data.tokens.access, "a2");
        assert_eq!(data.tokens.refresh, "r1");
        assert!(!data.is_stale());
        assert!(data.refreshed_at.is_some());

        data.apply_refresh("a3".to_string(), Some("r2".to_string()));
        assert_eq!(data.tokens.refresh, "r2");
    }

    #[test]
    fn test_session_file_format() {
        let data = session("a1", "r1");
        let json = serde_json::to_string(&data).expect("serializable");
        let back: SessionData = serde_json::from_str(&json).expect("parseable");
        assert_eq!(back, data);

        // Older files without the optional fields still load
        let json = r#"{"tokens": {"access": "a", "refresh": "r"}, "user": {"uuid": "u"}, "created_at": "2026-10-19T08:00:00Z"}"#;
        let old: SessionData = serde_json::from_str(json).expect("parseable");
        assert!(old.error.is_none());
        assert!(old.refreshed_at.is_none());
    }
}
