//! QQ Connect (`graph.qq.com`) and QQ mini-program login.
//!
//! Unlike WeChat and Weibo, the QQ token response carries no user id; the
//! `openid` (and `unionid` on request) comes from a separate `oauth2.0/me`
//! call.

use std::sync::Arc;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
    socialite_config::QqConfig,
    socialite_oauth::{
        ApiClient, AuthorizationUrl, CallbackContext, ErrorFields, Gender, OAuth2Client,
        QueryParams, Session, TokenGrant, UserProfile, decrypt_payload, probe,
        query::{append_query, build_url},
        response::str_field,
        state::state_or_generate,
    },
    tracing::info,
};

const PROVIDER: ProviderKind = ProviderKind::Qq;

const API_DOMAIN: &str = "https://graph.qq.com/";
const MINI_PROGRAM_DOMAIN: &str = "https://api.q.qq.com/";

/// `oauth2.0/*` endpoints; `error`/`error_description` is what graph.qq.com
/// actually sends for a bad code.
const OAUTH_ERRORS: &[ErrorFields] = &[
    ErrorFields::nonzero("code", "msg"),
    ErrorFields::nonzero("error", "error_description"),
];
const PROFILE_ERRORS: &[ErrorFields] = &[ErrorFields::nonzero("ret", "msg")];
const MINI_PROGRAM_ERRORS: &[ErrorFields] = &[ErrorFields::nonzero("errcode", "errmsg")];

/// Base domains, overridable for proxies and tests.
#[derive(Debug, Clone)]
pub struct QqEndpoints {
    pub api: String,
    pub mini_program: String,
}

impl Default for QqEndpoints {
    fn default() -> Self {
        Self {
            api: API_DOMAIN.into(),
            mini_program: MINI_PROGRAM_DOMAIN.into(),
        }
    }
}

pub struct QqClient {
    config: Arc<QqConfig>,
    api: ApiClient,
    endpoints: QqEndpoints,
    session: Session,
}

impl QqClient {
    pub fn new(config: Arc<QqConfig>, api: ApiClient) -> Self {
        Self {
            config,
            api,
            endpoints: QqEndpoints::default(),
            session: Session::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: QqEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    async fn get(&mut self, url: &str, conventions: &[ErrorFields]) -> SocialResult<Value> {
        let response = self.api.get(url).await?;
        self.session.check_response(PROVIDER, response, conventions)
    }

    /// `oauth2.0/me`: resolve openid (and unionid when the mode needs it).
    async fn lookup_identity(&mut self, access_token: &str) -> SocialResult<String> {
        let mode = self.config.identity_mode;
        let params = QueryParams::new()
            .with("access_token", access_token)
            .with_opt("unionid", mode.wants_unified().then_some("1"))
            .with("fmt", "json");
        let url = build_url(&self.endpoints.api, "oauth2.0/me", &params);
        let body = self.get(&url, OAUTH_ERRORS).await?;

        let openid = str_field(&body, "openid")
            .filter(|id| !id.is_empty())
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: "openid",
            })?;
        let identity = mode
            .select(Some(openid), str_field(&body, "unionid"))
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: mode.required_field(),
            })?
            .to_string();

        self.session.set_identity(Some(openid.to_string()), identity.clone());
        Ok(identity)
    }

    async fn refresh(&mut self, refresh_token: &str) -> SocialResult<bool> {
        let params = QueryParams::new()
            .with("grant_type", "refresh_token")
            .with("client_id", &self.config.client.app_id)
            .with("client_secret", self.config.client.app_secret.expose_secret())
            .with("refresh_token", refresh_token)
            .with("fmt", "json");
        let url = build_url(&self.endpoints.api, "oauth2.0/token", &params);
        let body = self.get(&url, OAUTH_ERRORS).await?;
        let grant = TokenGrant::from_body(PROVIDER, &body)?;
        self.session.store_grant(grant);
        Ok(true)
    }
}

#[async_trait]
impl OAuth2Client for QqClient {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    fn authorization_url(
        &mut self,
        callback_url: Option<&str>,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> AuthorizationUrl {
        let client = &self.config.client;
        let state = state_or_generate(state);
        let redirect_uri = callback_url
            .map(str::to_owned)
            .or_else(|| client.callback_url.clone());
        let params = QueryParams::new()
            .with("response_type", "code")
            .with("client_id", &client.app_id)
            .with_opt("redirect_uri", redirect_uri.clone())
            .with("state", &state)
            .with_opt("scope", scope.or(client.scope.as_deref()))
            .with_opt("display", self.config.display.as_deref());

        let url = match &client.login_agent_url {
            Some(agent) => append_query(agent, &params),
            None => build_url(&self.endpoints.api, "oauth2.0/authorize", &params),
        };

        self.session.set_state(&state);
        self.session.set_redirect_uri(redirect_uri);
        AuthorizationUrl { url, state }
    }

    async fn exchange_code(
        &mut self,
        expected_state: &str,
        callback: &CallbackContext,
    ) -> SocialResult<String> {
        let code = callback.authorize(expected_state)?;
        let client = &self.config.client;
        let redirect_uri = self
            .session
            .redirect_uri()
            .map(str::to_owned)
            .or_else(|| client.callback_url.clone());
        let params = QueryParams::new()
            .with("grant_type", "authorization_code")
            .with("client_id", &client.app_id)
            .with("client_secret", client.app_secret.expose_secret())
            .with("code", code)
            .with_opt("state", callback.state())
            .with_opt("redirect_uri", redirect_uri)
            .with("fmt", "json");
        let url = build_url(&self.endpoints.api, "oauth2.0/token", &params);

        let body = self.get(&url, OAUTH_ERRORS).await?;
        let grant = TokenGrant::from_body(PROVIDER, &body)?;
        let access_token = grant.access_token.clone();
        self.session.store_grant(grant);
        info!(provider = %PROVIDER, "authorization code exchanged");
        Ok(access_token)
    }

    async fn user_profile(&mut self, access_token: Option<&str>) -> SocialResult<UserProfile> {
        let token = self.session.token_or_stored(access_token)?;
        if self.session.primary_id().is_none() {
            self.lookup_identity(&token).await?;
        }
        let openid = self
            .session
            .primary_id()
            .ok_or(SocialError::NotAuthenticated)?
            .to_string();

        let params = QueryParams::new()
            .with("access_token", &token)
            .with("oauth_consumer_key", &self.config.client.app_id)
            .with("openid", &openid);
        let url = build_url(&self.endpoints.api, "user/get_user_info", &params);
        let body = self.get(&url, PROFILE_ERRORS).await?;

        let avatar_url = ["figureurl_qq_2", "figureurl_qq_1", "figureurl_2", "figureurl_1"]
            .iter()
            .find_map(|key| str_field(&body, key).filter(|u| !u.is_empty()))
            .map(str::to_owned);
        let gender = match str_field(&body, "gender") {
            Some("男") => Gender::Male,
            Some("女") => Gender::Female,
            _ => Gender::Unknown,
        };
        Ok(UserProfile {
            provider: PROVIDER,
            identity_id: self.session.identity_id().map(str::to_owned),
            nickname: str_field(&body, "nickname").map(str::to_owned),
            avatar_url,
            gender,
            raw: body,
        })
    }

    async fn refresh_access_token(&mut self, refresh_token: &str) -> bool {
        let outcome = self.refresh(refresh_token).await;
        probe(PROVIDER, "refresh", outcome)
    }

    async fn validate_access_token(&mut self, access_token: Option<&str>) -> bool {
        let outcome = match self.session.token_or_stored(access_token) {
            Ok(token) => self.lookup_identity(&token).await.map(|_| true),
            Err(e) => Err(e),
        };
        probe(PROVIDER, "validate", outcome)
    }

    async fn resolve_identity_id(&mut self, access_token: Option<&str>) -> SocialResult<String> {
        let token = self.session.token_or_stored(access_token)?;
        self.lookup_identity(&token).await
    }

    async fn exchange_mini_program_session(&mut self, js_code: &str) -> SocialResult<String> {
        let client = &self.config.client;
        let params = QueryParams::new()
            .with("appid", &client.app_id)
            .with("secret", client.app_secret.expose_secret())
            .with("js_code", js_code)
            .with("grant_type", "authorization_code");
        let url = build_url(&self.endpoints.mini_program, "sns/jscode2session", &params);
        let body = self.get(&url, MINI_PROGRAM_ERRORS).await?;

        let mode = self.config.identity_mode;
        let openid = str_field(&body, "openid").filter(|id| !id.is_empty());
        let identity = mode
            .select(openid, str_field(&body, "unionid"))
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: mode.required_field(),
            })?
            .to_string();
        let session_key = str_field(&body, "session_key")
            .filter(|k| !k.is_empty())
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: "session_key",
            })?
            .to_string();

        self.session.set_identity(openid.map(str::to_owned), identity);
        Ok(session_key)
    }

    fn decrypt_mini_program_data(
        &self,
        encrypted_data: &str,
        iv: &str,
        session_key: &str,
    ) -> SocialResult<Value> {
        decrypt_payload(encrypted_data, iv, session_key)
    }
}
