use std::time::Duration;

use {
    secrecy::{ExposeSecret, SecretString},
    serde::Deserialize,
    socialite_common::{IdentityIdMode, ProviderKind, SocialError, SocialResult},
};

// ── Shared client settings ──────────────────────────────────────────────────

/// Credentials and redirect settings of one registered application.
#[derive(Debug, Deserialize)]
pub struct ClientConfig {
    /// `appid` / `client_id` issued by the provider.
    pub app_id: String,
    pub app_secret: SecretString,
    /// Redirect target registered with the provider.
    #[serde(default)]
    pub callback_url: Option<String>,
    #[serde(default)]
    pub scope: Option<String>,
    /// Optional login proxy. When set, authorization URLs point here instead
    /// of the provider, carrying the same query parameters.
    #[serde(default)]
    pub login_agent_url: Option<String>,
}

impl ClientConfig {
    pub fn new(app_id: impl Into<String>, app_secret: impl Into<String>) -> Self {
        Self {
            app_id: app_id.into(),
            app_secret: SecretString::new(app_secret.into()),
            callback_url: None,
            scope: None,
            login_agent_url: None,
        }
    }

    #[must_use]
    pub fn with_callback_url(mut self, url: impl Into<String>) -> Self {
        self.callback_url = Some(url.into());
        self
    }

    #[must_use]
    pub fn with_scope(mut self, scope: impl Into<String>) -> Self {
        self.scope = Some(scope.into());
        self
    }

    #[must_use]
    pub fn with_login_agent_url(mut self, url: impl Into<String>) -> Self {
        self.login_agent_url = Some(url.into());
        self
    }

    fn validate(&self, provider: ProviderKind) -> SocialResult<()> {
        if self.app_id.trim().is_empty() {
            return Err(SocialError::config(format!("{provider}: app_id is empty")));
        }
        if self.app_secret.expose_secret().trim().is_empty() {
            return Err(SocialError::config(format!("{provider}: app_secret is empty")));
        }
        Ok(())
    }
}

// ── Per-provider settings ───────────────────────────────────────────────────

#[derive(Debug, Deserialize)]
pub struct QqConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    /// `mobile` switches the authorization page to the mobile layout.
    #[serde(default)]
    pub display: Option<String>,
    #[serde(default)]
    pub identity_mode: IdentityIdMode,
}

impl QqConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            display: None,
            identity_mode: IdentityIdMode::default(),
        }
    }

    #[must_use]
    pub fn with_identity_mode(mut self, mode: IdentityIdMode) -> Self {
        self.identity_mode = mode;
        self
    }

    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct WeChatConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    /// Language of the returned profile (`zh_CN`, `zh_TW`, `en`).
    #[serde(default = "default_wechat_lang")]
    pub lang: String,
    #[serde(default)]
    pub identity_mode: IdentityIdMode,
}

fn default_wechat_lang() -> String {
    "zh_CN".into()
}

impl WeChatConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            lang: default_wechat_lang(),
            identity_mode: IdentityIdMode::default(),
        }
    }

    #[must_use]
    pub fn with_identity_mode(mut self, mode: IdentityIdMode) -> Self {
        self.identity_mode = mode;
        self
    }
}

#[derive(Debug, Deserialize)]
pub struct WeiboConfig {
    #[serde(flatten)]
    pub client: ClientConfig,
    /// Terminal type of the authorization page; `mobile` moves it to `open.weibo.cn`.
    #[serde(default)]
    pub display: Option<String>,
    /// Force the user to sign in again even with a live Weibo session.
    #[serde(default)]
    pub force_login: bool,
    /// Authorization page language; Weibo defaults to simplified Chinese, `en` for English.
    #[serde(default)]
    pub language: Option<String>,
    /// Sent along with `uid` when fetching the profile.
    #[serde(default)]
    pub screen_name: Option<String>,
}

impl WeiboConfig {
    pub fn new(client: ClientConfig) -> Self {
        Self {
            client,
            display: None,
            force_login: false,
            language: None,
            screen_name: None,
        }
    }

    #[must_use]
    pub fn with_display(mut self, display: impl Into<String>) -> Self {
        self.display = Some(display.into());
        self
    }

    pub fn is_mobile(&self) -> bool {
        self.display.as_deref() == Some("mobile")
    }
}

// ── Transport ───────────────────────────────────────────────────────────────

/// Settings for the shared HTTP client. The adapters never retry, so these
/// timeouts bound every outbound call.
#[derive(Debug, Clone, Deserialize)]
#[serde(default)]
pub struct HttpConfig {
    pub timeout_secs: u64,
    pub connect_timeout_secs: u64,
    pub user_agent: String,
}

impl Default for HttpConfig {
    fn default() -> Self {
        Self {
            timeout_secs: 10,
            connect_timeout_secs: 5,
            user_agent: concat!("socialite/", env!("CARGO_PKG_VERSION")).into(),
        }
    }
}

impl HttpConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }

    pub fn connect_timeout(&self) -> Duration {
        Duration::from_secs(self.connect_timeout_secs)
    }
}

// ── Top level ───────────────────────────────────────────────────────────────

/// Everything a process needs to talk to the configured providers.
#[derive(Debug, Default, Deserialize)]
pub struct SocialiteConfig {
    #[serde(default)]
    pub http: HttpConfig,
    #[serde(default)]
    pub qq: Option<QqConfig>,
    #[serde(default, alias = "weixin")]
    pub wechat: Option<WeChatConfig>,
    #[serde(default)]
    pub weibo: Option<WeiboConfig>,
}

impl SocialiteConfig {
    /// Reject sections with blank credentials.
    pub fn validate(&self) -> SocialResult<()> {
        if let Some(qq) = &self.qq {
            qq.client.validate(ProviderKind::Qq)?;
        }
        if let Some(wechat) = &self.wechat {
            wechat.client.validate(ProviderKind::WeChat)?;
        }
        if let Some(weibo) = &self.weibo {
            weibo.client.validate(ProviderKind::Weibo)?;
        }
        Ok(())
    }

    /// Providers that have a section in this config.
    pub fn configured_providers(&self) -> Vec<ProviderKind> {
        let mut kinds = Vec::new();
        if self.qq.is_some() {
            kinds.push(ProviderKind::Qq);
        }
        if self.wechat.is_some() {
            kinds.push(ProviderKind::WeChat);
        }
        if self.weibo.is_some() {
            kinds.push(ProviderKind::Weibo);
        }
        kinds
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_client_builder() {
        let client = ClientConfig::new("app", "secret")
            .with_callback_url("https://example.com/cb")
            .with_scope("get_user_info")
            .with_login_agent_url("https://agent.example.com/login");
        assert_eq!(client.app_id, "app");
        assert_eq!(client.app_secret.expose_secret(), "secret");
        assert_eq!(client.callback_url.as_deref(), Some("https://example.com/cb"));
        assert_eq!(client.scope.as_deref(), Some("get_user_info"));
        assert!(client.login_agent_url.is_some());
    }

    #[test]
    fn test_secret_is_redacted_in_debug() {
        let client = ClientConfig::new("app", "super-secret-value");
        assert!(!format!("{client:?}").contains("super-secret-value"));
    }

    #[test]
    fn test_validate_rejects_blank_secret() {
        let config = SocialiteConfig {
            qq: Some(QqConfig::new(ClientConfig::new("app", "  "))),
            ..Default::default()
        };
        let err = config.validate().unwrap_err();
        assert!(err.to_string().contains("qq: app_secret is empty"));
    }

    #[test]
    fn test_configured_providers() {
        let config = SocialiteConfig {
            wechat: Some(WeChatConfig::new(ClientConfig::new("wx", "s"))),
            weibo: Some(WeiboConfig::new(ClientConfig::new("wb", "s"))),
            ..Default::default()
        };
        assert_eq!(
            config.configured_providers(),
            vec![ProviderKind::WeChat, ProviderKind::Weibo]
        );
    }

    #[test]
    fn test_weibo_mobile_display() {
        let weibo = WeiboConfig::new(ClientConfig::new("wb", "s")).with_display("mobile");
        assert!(weibo.is_mobile());
        assert!(!WeiboConfig::new(ClientConfig::new("wb", "s")).is_mobile());
    }
}
