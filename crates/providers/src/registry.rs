//! Builds per-flow adapters from one loaded configuration.
//!
//! Provider configs are held behind `Arc` and the HTTP client is a cheap
//! clone, so handing out a fresh adapter for every login flow costs nothing.

use std::sync::Arc;

use {
    socialite_common::{ProviderKind, SocialError, SocialResult},
    socialite_config::{QqConfig, SocialiteConfig, WeChatConfig, WeiboConfig},
    socialite_oauth::{ApiClient, OAuth2Client},
    tracing::info,
};

use crate::{QqClient, WeChatClient, WeiboClient};

pub struct ProviderRegistry {
    api: ApiClient,
    qq: Option<Arc<QqConfig>>,
    wechat: Option<Arc<WeChatConfig>>,
    weibo: Option<Arc<WeiboConfig>>,
}

impl ProviderRegistry {
    /// Validate the configuration and build the shared HTTP client.
    pub fn from_config(config: SocialiteConfig) -> SocialResult<Self> {
        config.validate()?;
        let api = ApiClient::new(&config.http)?;
        Ok(Self::with_client(config, api))
    }

    /// Like [`from_config`](Self::from_config) with a caller-built client.
    pub fn with_client(config: SocialiteConfig, api: ApiClient) -> Self {
        let registry = Self {
            api,
            qq: config.qq.map(Arc::new),
            wechat: config.wechat.map(Arc::new),
            weibo: config.weibo.map(Arc::new),
        };
        info!(
            providers = ?registry.providers(),
            "social login providers registered"
        );
        registry
    }

    /// Configured providers in declaration order.
    pub fn providers(&self) -> Vec<ProviderKind> {
        ProviderKind::ALL
            .into_iter()
            .filter(|kind| self.is_configured(*kind))
            .collect()
    }

    pub fn is_configured(&self, kind: ProviderKind) -> bool {
        match kind {
            ProviderKind::Qq => self.qq.is_some(),
            ProviderKind::WeChat => self.wechat.is_some(),
            ProviderKind::Weibo => self.weibo.is_some(),
        }
    }

    pub fn qq(&self) -> SocialResult<QqClient> {
        let config = self.qq.clone().ok_or_else(|| not_configured(ProviderKind::Qq))?;
        Ok(QqClient::new(config, self.api.clone()))
    }

    pub fn wechat(&self) -> SocialResult<WeChatClient> {
        let config = self
            .wechat
            .clone()
            .ok_or_else(|| not_configured(ProviderKind::WeChat))?;
        Ok(WeChatClient::new(config, self.api.clone()))
    }

    pub fn weibo(&self) -> SocialResult<WeiboClient> {
        let config = self
            .weibo
            .clone()
            .ok_or_else(|| not_configured(ProviderKind::Weibo))?;
        Ok(WeiboClient::new(config, self.api.clone()))
    }

    /// A fresh adapter for `kind`, behind the common contract.
    pub fn client(&self, kind: ProviderKind) -> SocialResult<Box<dyn OAuth2Client>> {
        Ok(match kind {
            ProviderKind::Qq => Box::new(self.qq()?),
            ProviderKind::WeChat => Box::new(self.wechat()?),
            ProviderKind::Weibo => Box::new(self.weibo()?),
        })
    }
}

fn not_configured(kind: ProviderKind) -> SocialError {
    SocialError::config(format!("provider {kind} is not configured"))
}
