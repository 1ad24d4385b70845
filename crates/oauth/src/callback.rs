//! Parameters a provider sends back on the authorization redirect.

use {
    socialite_common::{SocialError, SocialResult},
    url::{Url, form_urlencoded},
};

use crate::state::states_match;

/// `code` / `state` of an inbound callback request.
///
/// Build it from the query string of the request being handled, then
/// override individual values when they come from somewhere else.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct CallbackContext {
    code: Option<String>,
    state: Option<String>,
    error: Option<String>,
    error_description: Option<String>,
}

impl CallbackContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Parse a raw query string, with or without the leading `?`.
    pub fn from_query(query: &str) -> Self {
        let mut ctx = Self::default();
        for (key, value) in form_urlencoded::parse(query.trim_start_matches('?').as_bytes()) {
            let value = Some(value.into_owned());
            match key.as_ref() {
                "code" => ctx.code = value,
                "state" => ctx.state = value,
                "error" => ctx.error = value,
                "error_description" => ctx.error_description = value,
                _ => {},
            }
        }
        ctx
    }

    /// Parse the full callback URL.
    pub fn from_url(url: &str) -> SocialResult<Self> {
        let parsed = Url::parse(url)
            .map_err(|e| SocialError::invalid_argument(format!("invalid callback url: {e}")))?;
        Ok(Self::from_query(parsed.query().unwrap_or_default()))
    }

    #[must_use]
    pub fn with_code(mut self, code: impl Into<String>) -> Self {
        self.code = Some(code.into());
        self
    }

    #[must_use]
    pub fn with_state(mut self, state: impl Into<String>) -> Self {
        self.state = Some(state.into());
        self
    }

    pub fn code(&self) -> Option<&str> {
        self.code.as_deref()
    }

    pub fn state(&self) -> Option<&str> {
        self.state.as_deref()
    }

    /// Error reported by the provider instead of a code (e.g. the user declined).
    pub fn error(&self) -> Option<&str> {
        self.error.as_deref()
    }

    /// Check the callback against the state stored when the flow started and
    /// return the authorization code.
    ///
    /// An empty `expected_state` skips the state comparison; the caller then
    /// owns CSRF protection.
    pub fn authorize(&self, expected_state: &str) -> SocialResult<&str> {
        if !expected_state.is_empty() {
            let received = self.state.as_deref().unwrap_or_default();
            if !states_match(expected_state, received) {
                return Err(SocialError::InvalidState);
            }
        }

        if let Some(error) = &self.error {
            let detail = self.error_description.as_deref().unwrap_or(error);
            return Err(SocialError::invalid_argument(format!(
                "authorization was not granted: {detail}"
            )));
        }

        match self.code.as_deref() {
            Some(code) if !code.is_empty() => Ok(code),
            _ => Err(SocialError::invalid_argument("callback carries no authorization code")),
        }
    }
}

#[cfg(test)]
mod tests {
    use {super::*, socialite_common::ErrorKind};

    #[test]
    fn test_from_query() {
        let ctx = CallbackContext::from_query("?code=abc&state=s%201&other=x");
        assert_eq!(ctx.code(), Some("abc"));
        assert_eq!(ctx.state(), Some("s 1"));
        assert_eq!(ctx.error(), None);
    }

    #[test]
    fn test_from_url() {
        let ctx =
            CallbackContext::from_url("https://example.com/callback?code=c1&state=st").unwrap();
        assert_eq!(ctx.code(), Some("c1"));
        assert_eq!(ctx.state(), Some("st"));
        assert!(CallbackContext::from_url("not a url").is_err());
    }

    #[test]
    fn test_explicit_values_override_query() {
        let ctx = CallbackContext::from_query("code=from-query&state=q").with_code("explicit");
        assert_eq!(ctx.code(), Some("explicit"));
        assert_eq!(ctx.state(), Some("q"));
    }

    #[test]
    fn test_authorize_checks_state() {
        let ctx = CallbackContext::new().with_code("c").with_state("good");
        assert_eq!(ctx.authorize("good").unwrap(), "c");
        assert!(matches!(ctx.authorize("bad"), Err(SocialError::InvalidState)));
        assert_eq!(ctx.authorize("").unwrap(), "c");

        let stateless = CallbackContext::new().with_code("c");
        assert!(matches!(stateless.authorize("good"), Err(SocialError::InvalidState)));
    }

    #[test]
    fn test_authorize_requires_code() {
        let err = CallbackContext::new().authorize("").unwrap_err();
        assert_eq!(err.kind(), ErrorKind::InvalidArgument);
    }

    #[test]
    fn test_authorize_surfaces_denial() {
        let ctx = CallbackContext::from_query(
            "error=access_denied&error_description=user%20denied&state=s",
        );
        let err = ctx.authorize("s").unwrap_err();
        assert!(err.to_string().contains("user denied"));
    }
}
