use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub uuid: String,
    #[serde(default)]
    pub phone: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: String,
    #[serde(default)]
    pub first_name: String,
    #[serde(default)]
    pub last_name: String,
    #[serde(default)]
    pub is_active: bool,
    #[serde(default)]
    pub has_van: bool,
}

impl User {
    pub fn full_name(&self) -> String {
        let name = format!("{} {}", self.first_name, self.last_name);
        let name = name.trim();
        if name.is_empty() {
            self.phone.clone()
        } else {
            name.to_string()
        }
    }
}

/// Access/refresh credential pair. Both values are opaque bearer strings.
#[derive(Clone, PartialEq, Serialize, Deserialize)]
pub struct AuthTokens {
    pub access: String,
    pub refresh: String,
}

// Tokens never show up in logs or panics.
impl std::fmt::Debug for AuthTokens {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("AuthTokens")
            .field("access", &"<redacted>")
            .field("refresh", &"<redacted>")
            .finish()
    }
}

#[derive(Debug, Clone, Serialize)]
pub struct LoginRequest {
    pub phone: String,
    pub password: String,
}

#[derive(Clone, Deserialize)]
pub struct LoginResponse {
    pub access: Option<String>,
    pub refresh: Option<String>,
    pub user: Option<User>,
}

impl LoginResponse {
    /// A login only counts when the server hands back both tokens.
    pub fn into_parts(self) -> Option<(AuthTokens, User)> {
        match (self.access, self.refresh) {
            (Some(access), Some(refresh)) if !access.is_empty() && !refresh.is_empty() => {
                Some((AuthTokens { access, refresh }, self.user.unwrap_or_default()))
            }
            _ => None,
        }
    }
}

#[derive(Clone, Serialize)]
pub struct RefreshRequest<'a> {
    pub refresh: &'a str,
}

/// Token refresh response. Some deployments rotate the refresh token too.
#[derive(Clone, Deserialize)]
pub struct RefreshResponse {
    pub access: Option<String>,
    #[serde(default)]
    pub refresh: Option<String>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_login_response_requires_both_tokens() {
        let json = r#"{"access": "a1", "refresh": "r1", "user": {"uuid": "u-1", "phone": "555", "first_name": "Ada", "last_name": "Byron", "role": "seller", "email": "", "is_active": true, "has_van": false}}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("valid login json");
        let (tokens, user) = resp.into_parts().expect("both tokens present");
        assert_eq!(tokens.access, "a1");
        assert_eq!(tokens.refresh, "r1");
        assert_eq!(user.full_name(), "Ada Byron");

        let json = r#"{"access": "a1"}"#;
        let resp: LoginResponse = serde_json::from_str(json).expect("valid login json");
        assert!(resp.into_parts().is_none());
    }

    #[test]
    fn test_user_name_falls_back_to_phone() {
        let user = User {
            uuid: "u-2".to_string(),
            phone: "+15550100".to_string(),
            ..Default::default()
        };
        assert_eq!(user.full_name(), "+15550100");
    }

    #[test]
    fn test_tokens_debug_is_redacted() {
        let tokens = AuthTokens {
            access: "secret-access".to_string(),
            refresh: "secret-refresh".to_string(),
        };
        let printed = format!("{:?}", tokens);
        assert!(!printed.contains("secret"));
    }
}
