//! Sina Weibo (`api.weibo.com`).
//!
//! Weibo issues no refresh tokens to ordinary applications and has no
//! mini-program login; those operations keep the trait defaults or report
//! failure without a request.

use std::sync::Arc;

use {
    async_trait::async_trait,
    secrecy::ExposeSecret,
    serde_json::Value,
    socialite_common::{ProviderKind, SocialError, SocialResult},
    socialite_config::WeiboConfig,
    socialite_oauth::{
        ApiClient, ApiResponse, AuthorizationUrl, CallbackContext, ErrorFields, Gender,
        OAuth2Client, QueryParams, Session, TokenGrant, UserProfile, probe,
        query::{append_query, build_url, join_url},
        response::{i64_field, id_field, str_field},
        state::state_or_generate,
    },
    tracing::{debug, info},
};

const PROVIDER: ProviderKind = ProviderKind::Weibo;

const API_DOMAIN: &str = "https://api.weibo.com/";
const MOBILE_DOMAIN: &str = "https://open.weibo.cn/";

/// Weibo reports failure by the mere presence of `error_code`.
const ERRORS: &[ErrorFields] = &[ErrorFields::present("error_code", "error")];

#[derive(Debug, Clone)]
pub struct WeiboEndpoints {
    pub api: String,
    /// Host of the mobile authorization page (`display=mobile`).
    pub mobile: String,
}

impl Default for WeiboEndpoints {
    fn default() -> Self {
        Self {
            api: API_DOMAIN.into(),
            mobile: MOBILE_DOMAIN.into(),
        }
    }
}

pub struct WeiboClient {
    config: Arc<WeiboConfig>,
    api: ApiClient,
    endpoints: WeiboEndpoints,
    session: Session,
}

impl WeiboClient {
    pub fn new(config: Arc<WeiboConfig>, api: ApiClient) -> Self {
        Self {
            config,
            api,
            endpoints: WeiboEndpoints::default(),
            session: Session::default(),
        }
    }

    #[must_use]
    pub fn with_endpoints(mut self, endpoints: WeiboEndpoints) -> Self {
        self.endpoints = endpoints;
        self
    }

    fn check(&mut self, response: ApiResponse) -> SocialResult<Value> {
        self.session.check_response(PROVIDER, response, ERRORS)
    }

    async fn validate(&mut self, access_token: Option<&str>) -> SocialResult<bool> {
        let token = self.session.token_or_stored(access_token)?;
        let form = QueryParams::new().with("access_token", token);
        let url = join_url(&self.endpoints.api, "oauth2/get_token_info");
        let response = self.api.post_form(&url, &form).await?;
        let body = self.check(response)?;
        Ok(i64_field(&body, "expire_in").is_some_and(|secs| secs > 0))
    }
}

#[async_trait]
impl OAuth2Client for WeiboClient {
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
        let config = &self.config;
        let client = &config.client;
        let state = state_or_generate(state);
        let redirect_uri = callback_url
            .map(str::to_owned)
            .or_else(|| client.callback_url.clone());
        let params = QueryParams::new()
            .with("client_id", &client.app_id)
            .with_opt("redirect_uri", redirect_uri.clone())
            .with_opt("scope", scope.or(client.scope.as_deref()))
            .with("state", &state)
            .with_opt("display", config.display.as_deref())
            .with("forcelogin", config.force_login.to_string())
            .with_opt("language", config.language.as_deref());

        let url = match &client.login_agent_url {
            Some(agent) => append_query(agent, &params),
            None if config.is_mobile() => {
                build_url(&self.endpoints.mobile, "oauth2/authorize", &params)
            },
            None => build_url(&self.endpoints.api, "oauth2/authorize", &params),
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
        let form = QueryParams::new()
            .with("client_id", &client.app_id)
            .with("client_secret", client.app_secret.expose_secret())
            .with("grant_type", "authorization_code")
            .with("code", code)
            .with_opt("redirect_uri", redirect_uri);
        let url = join_url(&self.endpoints.api, "oauth2/access_token");

        let response = self.api.post_form(&url, &form).await?;
        let body = self.check(response)?;
        let grant = TokenGrant::from_body(PROVIDER, &body)?;
        let uid = id_field(&body, "uid")
            .filter(|uid| !uid.is_empty())
            .ok_or(SocialError::MalformedResponse {
                provider: PROVIDER,
                field: "uid",
            })?;

        let access_token = grant.access_token.clone();
        self.session.store_grant(grant);
        self.session.set_identity(Some(uid.clone()), uid);
        info!(provider = %PROVIDER, "authorization code exchanged");
        Ok(access_token)
    }

    async fn user_profile(&mut self, access_token: Option<&str>) -> SocialResult<UserProfile> {
        let token = self.session.token_or_stored(access_token)?;
        let params = QueryParams::new()
            .with("access_token", token)
            .with_opt("uid", self.session.primary_id())
            .with_opt("screen_name", self.config.screen_name.as_deref());
        let url = build_url(&self.endpoints.api, "2/users/show.json", &params);
        let response = self.api.get(&url).await?;
        let body = self.check(response)?;

        let avatar_url = ["avatar_large", "profile_image_url"]
            .iter()
            .find_map(|key| str_field(&body, key).filter(|u| !u.is_empty()))
            .map(str::to_owned);
        let gender = match str_field(&body, "gender") {
            Some("m") => Gender::Male,
            Some("f") => Gender::Female,
            _ => Gender::Unknown,
        };
        Ok(UserProfile {
            provider: PROVIDER,
            identity_id: self
                .session
                .identity_id()
                .map(str::to_owned)
                .or_else(|| id_field(&body, "id")),
            nickname: str_field(&body, "screen_name").map(str::to_owned),
            avatar_url,
            gender,
            raw: body,
        })
    }

    async fn refresh_access_token(&mut self, _refresh_token: &str) -> bool {
        debug!(provider = %PROVIDER, "token refresh is not offered");
        false
    }

    async fn validate_access_token(&mut self, access_token: Option<&str>) -> bool {
        let outcome = self.validate(access_token).await;
        probe(PROVIDER, "validate", outcome)
    }
}
