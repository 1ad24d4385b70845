use {
    serde::{Deserialize, Serialize},
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
};

use crate::response::{str_field, u64_field};

/// Authorization redirect target plus the state it carries.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AuthorizationUrl {
    pub url: String,
    /// Persist this and compare it on the callback.
    pub state: String,
}

/// Token fields common to every provider's token response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TokenGrant {
    pub access_token: String,
    pub refresh_token: Option<String>,
    /// Seconds until the access token expires.
    pub expires_in: Option<u64>,
}

impl TokenGrant {
    pub fn from_body(provider: ProviderKind, body: &Value) -> SocialResult<Self> {
        let access_token = str_field(body, "access_token")
            .filter(|t| !t.is_empty())
            .ok_or(SocialError::MalformedResponse {
                provider,
                field: "access_token",
            })?;
        Ok(Self {
            access_token: access_token.to_string(),
            refresh_token: str_field(body, "refresh_token")
                .filter(|t| !t.is_empty())
                .map(str::to_owned),
            expires_in: u64_field(body, "expires_in"),
        })
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Gender {
    Male,
    Female,
    #[default]
    Unknown,
}

/// Profile of the signed-in user, normalized across providers.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct UserProfile {
    pub provider: ProviderKind,
    pub identity_id: Option<String>,
    pub nickname: Option<String>,
    pub avatar_url: Option<String>,
    pub gender: Gender,
    /// Untouched provider response.
    pub raw: Value,
}

impl UserProfile {
    /// Nickname, falling back to the identity id.
    #[must_use]
    pub fn display_name(&self) -> Option<&str> {
        self.nickname
            .as_deref()
            .filter(|n| !n.is_empty())
            .or(self.identity_id.as_deref())
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    #[test]
    fn test_grant_from_body() {
        let body = json!({
            "access_token": "tok",
            "refresh_token": "ref",
            "expires_in": "7776000",
        });
        let grant = TokenGrant::from_body(ProviderKind::Qq, &body).unwrap();
        assert_eq!(grant.access_token, "tok");
        assert_eq!(grant.refresh_token.as_deref(), Some("ref"));
        assert_eq!(grant.expires_in, Some(7_776_000));
    }

    #[test]
    fn test_grant_requires_access_token() {
        let err = TokenGrant::from_body(ProviderKind::Weibo, &json!({"uid": "1"})).unwrap_err();
        assert!(matches!(
            err,
            SocialError::MalformedResponse {
                field: "access_token",
                ..
            }
        ));
    }

    #[test]
    fn test_display_name_fallback() {
        let profile = UserProfile {
            provider: ProviderKind::Weibo,
            identity_id: Some("123".into()),
            nickname: Some(String::new()),
            avatar_url: None,
            gender: Gender::Unknown,
            raw: Value::Null,
        };
        assert_eq!(profile.display_name(), Some("123"));
    }
}
