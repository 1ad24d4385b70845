use {
    async_trait::async_trait,
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
    tracing::warn,
};

use crate::{
    callback::CallbackContext,
    session::Session,
    types::{AuthorizationUrl, UserProfile},
};

/// The OAuth2 login flow every provider adapter implements.
///
/// An adapter instance carries the [`Session`] of one login flow; all
/// mutating operations take `&mut self`, so one instance serves one flow at
/// a time.
#[async_trait]
pub trait OAuth2Client: Send + Sync {
    fn provider(&self) -> ProviderKind;

    fn session(&self) -> &Session;

    fn session_mut(&mut self) -> &mut Session;

    /// Drop all flow state so the instance can start over.
    fn reset_session(&mut self) {
        self.session_mut().reset();
    }

    /// Build the URL to redirect the user to.
    ///
    /// Omitted arguments fall back to the configured callback URL and scope; a
    /// missing state is generated. With a login agent configured the
    /// parameters are sent to the agent instead of the provider.
    fn authorization_url(
        &mut self,
        callback_url: Option<&str>,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> AuthorizationUrl;

    /// Trade the callback's authorization code for an access token.
    ///
    /// The callback state must equal `expected_state` unless that is empty.
    /// Session state is only updated on success.
    async fn exchange_code(
        &mut self,
        expected_state: &str,
        callback: &CallbackContext,
    ) -> SocialResult<String>;

    /// Fetch the profile of the signed-in user.
    async fn user_profile(&mut self, access_token: Option<&str>) -> SocialResult<UserProfile>;

    /// Renew the access token.
    ///
    /// This is a probe: any failure, including transport errors, is logged
    /// and reported as `false` rather than returned.
    async fn refresh_access_token(&mut self, refresh_token: &str) -> bool;

    /// Ask the provider whether a token is still valid.
    ///
    /// Like [`refresh_access_token`](Self::refresh_access_token), errors are
    /// reported as `false`.
    async fn validate_access_token(&mut self, access_token: Option<&str>) -> bool;

    /// The canonical identity id of the signed-in user.
    ///
    /// Providers that return the id with the token simply hand back the
    /// cached value.
    async fn resolve_identity_id(&mut self, _access_token: Option<&str>) -> SocialResult<String> {
        self.session()
            .identity_id()
            .map(str::to_owned)
            .ok_or(SocialError::NotAuthenticated)
    }

    /// Trade a mini-program login code for its session key.
    async fn exchange_mini_program_session(&mut self, _js_code: &str) -> SocialResult<String> {
        Err(SocialError::Unsupported {
            provider: self.provider(),
            operation: "mini-program login",
        })
    }

    /// Decrypt data a mini-program obtained with the session key.
    fn decrypt_mini_program_data(
        &self,
        _encrypted_data: &str,
        _iv: &str,
        _session_key: &str,
    ) -> SocialResult<Value> {
        Err(SocialError::Unsupported {
            provider: self.provider(),
            operation: "mini-program data decryption",
        })
    }
}

/// Collapse the outcome of a probe operation (refresh, validate) into a bool.
///
/// Probes answer "did it work", they never fail; the swallowed error is
/// logged so it is not lost.
pub fn probe(provider: ProviderKind, operation: &'static str, outcome: SocialResult<bool>) -> bool {
    match outcome {
        Ok(ok) => ok,
        Err(e) => {
            warn!(%provider, operation, error = %e, "probe failed");
            false
        },
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_probe() {
        assert!(probe(ProviderKind::Qq, "validate", Ok(true)));
        assert!(!probe(ProviderKind::Qq, "validate", Ok(false)));
        assert!(!probe(
            ProviderKind::Qq,
            "validate",
            Err(SocialError::NotAuthenticated)
        ));
    }
}
