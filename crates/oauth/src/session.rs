use {
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
};

use crate::{
    response::{ApiResponse, ErrorFields},
    types::TokenGrant,
};

/// Mutable state of one login flow.
///
/// Owned by a single adapter instance and overwritten in place by each call;
/// run concurrent flows on separate adapters.
#[derive(Debug, Clone, Default)]
pub struct Session {
    access_token: Option<String>,
    refresh_token: Option<String>,
    expires_in: Option<u64>,
    /// The provider's own user id (`openid` / `uid`).
    primary_id: Option<String>,
    /// The id selected by the identity id mode.
    identity_id: Option<String>,
    state: Option<String>,
    /// Redirect URI sent with the last authorization URL; the token request
    /// has to repeat it.
    redirect_uri: Option<String>,
    last_result: Option<Value>,
}

impl Session {
    pub fn access_token(&self) -> Option<&str> {
        self.access_token.as_deref()
    }

    pub fn refresh_token(&self) -> Option<&str> {
        self.refresh_token.as_deref()
    }

    /// Lifetime in seconds reported with the current access token.
    pub fn expires_in(&self) -> Option<u64> {
        self.expires_in
    }

    pub fn primary_id(&self) -> Option<&str> {
        self.primary_id.as_deref()
    }

    pub fn identity_id(&self) -> Option<&str> {
        self.identity_id.as_deref()
    }

    /// State handed out with the last authorization URL.
    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    pub fn redirect_uri(&self) -> Option<&str> {
        self.redirect_uri.as_deref()
    }

    /// Most recent response body, successful or not.
    pub fn last_result(&self) -> Option<&Value> {
        self.last_result.as_ref()
    }

    pub fn is_authenticated(&self) -> bool {
        self.access_token.is_some()
    }

    /// The per-call token when given, otherwise the stored one.
    pub fn token_or_stored(&self, explicit: Option<&str>) -> SocialResult<String> {
        explicit
            .filter(|t| !t.is_empty())
            .or(self.access_token.as_deref())
            .map(str::to_owned)
            .ok_or(SocialError::NotAuthenticated)
    }

    pub fn store_grant(&mut self, grant: TokenGrant) {
        self.access_token = Some(grant.access_token);
        if grant.refresh_token.is_some() {
            self.refresh_token = grant.refresh_token;
        }
        self.expires_in = grant.expires_in;
    }

    pub fn set_identity(&mut self, primary_id: Option<String>, identity_id: String) {
        if primary_id.is_some() {
            self.primary_id = primary_id;
        }
        self.identity_id = Some(identity_id);
    }

    pub fn set_state(&mut self, state: impl Into<String>) {
        self.state = Some(state.into());
    }

    pub fn set_redirect_uri(&mut self, redirect_uri: Option<String>) {
        self.redirect_uri = redirect_uri;
    }

    pub fn record_result(&mut self, body: Value) {
        self.last_result = Some(body);
    }

    /// Keep the body as the last result, then judge it by the provider's
    /// error conventions.
    pub fn check_response(
        &mut self,
        provider: ProviderKind,
        response: ApiResponse,
        conventions: &[ErrorFields],
    ) -> SocialResult<Value> {
        self.record_result(response.body.clone());
        response.into_checked(provider, conventions)
    }

    /// Forget everything; the adapter can start a new flow.
    pub fn reset(&mut self) {
        *self = Self::default();
    }
}

#[cfg(test)]
mod tests {
    use {super::*, serde_json::json};

    fn grant(token: &str, refresh: Option<&str>) -> TokenGrant {
        TokenGrant {
            access_token: token.into(),
            refresh_token: refresh.map(Into::into),
            expires_in: Some(7200),
        }
    }

    #[test]
    fn test_token_or_stored() {
        let mut session = Session::default();
        assert!(matches!(
            session.token_or_stored(None),
            Err(SocialError::NotAuthenticated)
        ));

        session.store_grant(grant("stored", None));
        assert_eq!(session.token_or_stored(None).unwrap(), "stored");
        assert_eq!(session.token_or_stored(Some("explicit")).unwrap(), "explicit");
        assert_eq!(session.token_or_stored(Some("")).unwrap(), "stored");
    }

    #[test]
    fn test_refresh_token_survives_grant_without_one() {
        let mut session = Session::default();
        session.store_grant(grant("a", Some("r1")));
        session.store_grant(grant("b", None));
        assert_eq!(session.access_token(), Some("b"));
        assert_eq!(session.refresh_token(), Some("r1"));
        assert_eq!(session.expires_in(), Some(7200));
    }

    #[test]
    fn test_reset() {
        let mut session = Session::default();
        session.store_grant(grant("a", None));
        session.set_identity(Some("open".into()), "union".into());
        session.set_state("st");
        session.record_result(json!({"ok": true}));
        assert!(session.is_authenticated());

        session.reset();
        assert!(!session.is_authenticated());
        assert!(session.identity_id().is_none());
        assert!(session.state().is_none());
        assert!(session.last_result().is_none());
    }

    #[test]
    fn test_check_response_records_failures_too() {
        let mut session = Session::default();
        let response = ApiResponse {
            status: 200,
            body: json!({"errcode": 40029, "errmsg": "invalid code"}),
        };
        let err = session
            .check_response(
                ProviderKind::WeChat,
                response,
                &[ErrorFields::nonzero("errcode", "errmsg")],
            )
            .unwrap_err();
        assert_eq!(err.provider_code(), Some(40029));
        assert_eq!(session.last_result().unwrap()["errcode"], json!(40029));
        assert!(!session.is_authenticated());
    }

    #[test]
    fn test_set_identity_keeps_known_primary() {
        let mut session = Session::default();
        session.set_identity(Some("open".into()), "open".into());
        session.set_identity(None, "union".into());
        assert_eq!(session.primary_id(), Some("open"));
        assert_eq!(session.identity_id(), Some("union"));
    }
}
