//! WeChat open platform (`api.weixin.qq.com`) and mini-program login.

use std::sync::Arc;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
    socialite_config::WeChatConfig,
    socialite_oauth::{
        ApiClient, AuthorizationUrl, CallbackContext, ErrorFields, Gender, OAuth2Client,
        QueryParams, Session, TokenGrant, UserProfile, decrypt_payload, probe,
        query::{append_query, build_url},
        response::{i64_field, str_field},
        state::state_or_generate,
    },
    tracing::info,
};

const PROVIDER: ProviderKind = ProviderKind::WeChat;

const API_DOMAIN: &str = "https://api.weixin.qq.com/";
const OPEN_DOMAIN: &str = "https://open.weixin.qq.com/";

/// Suffix WeChat requires on its native authorization pages.
const WECHAT_REDIRECT: &str = "#wechat_redirect";

const ERRORS: &[ErrorFields] = &[ErrorFields::nonzero("errcode", "errmsg")];

#[derive(Debug, Clone)]
pub struct WeChatEndpoints {
    pub api: String,
    /// Host of the `connect/*` authorization pages.
    pub open: String,
}

impl Default for WeChatEndpoints {
    fn default() -> Self {
        Self {
            api: API_DOMAIN.into(),
            open: OPEN_DOMAIN.into(),
        }
    }
}

/// Which authorization page to send the user to.
#[derive(Debug, Clone, Copy)]
enum AuthPage {
    /// PC QR-code login, `connect/qrconnect`.
    QrConnect,
    /// Login inside the WeChat app, `connect/oauth2/authorize`.
    InApp,
}

impl AuthPage {
    fn path(self) -> &'static str {
        match self {
            Self::QrConnect => "connect/qrconnect",
            Self::InApp => "connect/oauth2/authorize",
        }
    }

    fn default_scope(self) -> &'static str {
        match self {
            Self::QrConnect => "snsapi_login",
            Self::InApp => "snsapi_userinfo",
        }
    }
}

pub struct WeChatClient {
    config: Arc<WeChatConfig>,
    api: ApiClient,
    endpoints: WeChatEndpoints,
    session: Session,
}

impl WeChatClient {
    pub fn new(config: Arc<WeChatConfig>, api: ApiClient) -> Self {
        Self {
            config,
            api,
            endpoints: WeChatEndpoints::default(),
            session: Session::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: WeChatEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    /// Authorization URL for the in-app (official account) login page.
    ///
    /// Same fallbacks as [`OAuth2Client::authorization_url`], but the default
    /// scope is `snsapi_userinfo` and a login agent is told `isMp=1`.
    pub fn in_app_authorization_url(
        &mut self,
        callback_url: Option<&str>,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> AuthorizationUrl {
        self.page_url(AuthPage::InApp, callback_url, state, scope)
    }

    fn page_url(
        &mut self,
        page: AuthPage,
        callback_url: Option<&str>,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> AuthorizationUrl {
        let client = &self.config.client;
        let state = state_or_generate(state);
        let redirect_uri = callback_url
            .map(str::to_owned)
            .or_else(|| client.callback_url.clone());
        let mut params = QueryParams::new()
            .with("appid", &client.app_id)
            .with_opt("redirect_uri", redirect_uri.clone())
            .with("response_type", "code")
            .with(
                "scope",
                scope
                    .or(client.scope.as_deref())
                    .unwrap_or(page.default_scope()),
            )
            .with("state", &state);

        let url = match (&client.login_agent_url, page) {
            (Some(agent), AuthPage::InApp) => {
                params.push("isMp", "1");
                append_query(agent, &params)
            },
            (Some(agent), AuthPage::QrConnect) => append_query(agent, &params),
            (None, _) => format!(
                "{}{WECHAT_REDIRECT}",
                build_url(&self.endpoints.open, page.path(), &params)
            ),
        };

        self.session.set_state(&state);
        self.session.set_redirect_uri(redirect_uri);
        AuthorizationUrl { url, state }
    }

    async fn get(&mut self, path: &str, params: &QueryParams) -> SocialResult<Value> {
        let url = build_url(&self.endpoints.api, path, params);
        let response = self.api.get(&url).await?;
        self.session.check_response(PROVIDER, response, ERRORS)
    }

    /// Identity per mode from a body carrying `openid`/`unionid`.
    fn select_identity(&self, body: &Value) -> SocialResult<(Option<String>, String)> {
        let mode = self.config.identity_mode;
        let openid = str_field(body, "openid").filter(|id| !id.is_empty());
        let identity = mode
            .select(openid, str_field(body, "unionid"))
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: mode.required_field(),
            })?;
        Ok((openid.map(str::to_owned), identity.to_string()))
    }

    async fn refresh(&mut self, refresh_token: &str) -> SocialResult<bool> {
        let params = QueryParams::new()
            .with("appid", &self.config.client.app_id)
            .with("grant_type", "refresh_token")
            .with("refresh_token", refresh_token);
        let body = self.get("sns/oauth2/refresh_token", &params).await?;
        let grant = TokenGrant::from_body(PROVIDER, &body)?;
        self.session.store_grant(grant);
        Ok(true)
    }

    async fn validate(&mut self, access_token: Option<&str>) -> SocialResult<bool> {
        let token = self.session.token_or_stored(access_token)?;
        let params = QueryParams::new()
            .with("access_token", token)
            .with_opt("openid", self.session.primary_id());
        let body = self.get("sns/auth", &params).await?;
        Ok(i64_field(&body, "errcode") == Some(0))
    }
}

#[async_trait]
impl OAuth2Client for WeChatClient {
    fn provider(&self) -> ProviderKind {
        PROVIDER
    }

    fn session(&self) -> &Session {
        &self.session
    }

    fn session_mut(&mut self) -> &mut Session {
        &mut self.session
    }

    /// The PC QR-code login page.
    fn authorization_url(
        &mut self,
        callback_url: Option<&str>,
        state: Option<&str>,
        scope: Option<&str>,
    ) -> AuthorizationUrl {
        self.page_url(AuthPage::QrConnect, callback_url, state, scope)
    }

    async fn exchange_code(
        &mut self,
        expected_state: &str,
        callback: &CallbackContext,
    ) -> SocialResult<String> {
        let code = callback.authorize(expected_state)?;
        let client = &self.config.client;
        let params = QueryParams::new()
            .with("appid", &client.app_id)
            .with("secret", client.app_secret.expose_secret())
            .with("code", code)
            .with("grant_type", "authorization_code");
        let body = self.get("sns/oauth2/access_token", &params).await?;

        let grant = TokenGrant::from_body(PROVIDER, &body)?;
        let (openid, identity) = self.select_identity(&body)?;
        let access_token = grant.access_token.clone();
        self.session.store_grant(grant);
        self.session.set_identity(openid, identity);
        info!(provider = %PROVIDER, "authorization code exchanged");
        Ok(access_token)
    }

    async fn user_profile(&mut self, access_token: Option<&str>) -> SocialResult<UserProfile> {
        let token = self.session.token_or_stored(access_token)?;
        let params = QueryParams::new()
            .with("access_token", token)
            .with_opt("openid", self.session.primary_id())
            .with("lang", &self.config.lang);
        let body = self.get("sns/userinfo", &params).await?;

        let gender = match i64_field(&body, "sex") {
            Some(1) => Gender::Male,
            Some(2) => Gender::Female,
            _ => Gender::Unknown,
        };
        Ok(UserProfile {
            provider: PROVIDER,
            identity_id: self.session.identity_id().map(str::to_owned),
            nickname: str_field(&body, "nickname").map(str::to_owned),
            avatar_url: str_field(&body, "headimgurl")
                .filter(|u| !u.is_empty())
                .map(str::to_owned),
            gender,
            raw: body,
        })
    }

    async fn refresh_access_token(&mut self, refresh_token: &str) -> bool {
        let outcome = self.refresh(refresh_token).await;
        probe(PROVIDER, "refresh", outcome)
    }

    async fn validate_access_token(&mut self, access_token: Option<&str>) -> bool {
        let outcome = self.validate(access_token).await;
        probe(PROVIDER, "validate", outcome)
    }

    async fn exchange_mini_program_session(&mut self, js_code: &str) -> SocialResult<String> {
        let client = &self.config.client;
        let params = QueryParams::new()
            .with("appid", &client.app_id)
            .with("secret", client.app_secret.expose_secret())
            .with("js_code", js_code)
            .with("grant_type", "authorization_code");
        let body = self.get("sns/jscode2session", &params).await?;

        let (openid, identity) = self.select_identity(&body)?;
        let session_key = str_field(&body, "session_key")
            .filter(|k| !k.is_empty())
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: "session_key",
            })?
            .to_string();
        self.session.set_identity(openid, identity);
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
