use {
    socialite_common::{SocialError, SocialResult},
    socialite_config::HttpConfig,
    tracing::debug,
};

use crate::{
    query::QueryParams,
    response::{ApiResponse, excerpt, parse_body},
};

/// Thin JSON-over-HTTP client shared by all adapters.
///
/// Bodies are read on every status, so provider error payloads sent with 4xx
/// codes reach the adapter's error conventions. Nothing is retried.
#[derive(Debug, Clone)]
pub struct ApiClient {
    http: reqwest::Client,
}

impl ApiClient {
    /// Build a client with the configured timeouts and user agent.
    pub fn new(config: &HttpConfig) -> SocialResult<Self> {
        let http = reqwest::Client::builder()
            .timeout(config.timeout())
            .connect_timeout(config.connect_timeout())
            .user_agent(config.user_agent.as_str())
            .build()?;
        Ok(Self { http })
    }

    /// Wrap an existing client, e.g. one with custom TLS or proxy settings.
    pub fn from_client(http: reqwest::Client) -> Self {
        Self { http }
    }

    pub async fn get(&self, url: &str) -> SocialResult<ApiResponse> {
        debug!(endpoint = endpoint_of(url), "GET");
        let resp = self.http.get(url).send().await?;
        read_response(resp).await
    }

    pub async fn post_form(&self, url: &str, form: &QueryParams) -> SocialResult<ApiResponse> {
        debug!(endpoint = endpoint_of(url), "POST");
        let pairs: Vec<(&str, &str)> = form.pairs().collect();
        let resp = self.http.post(url).form(&pairs).send().await?;
        read_response(resp).await
    }
}

async fn read_response(resp: reqwest::Response) -> SocialResult<ApiResponse> {
    let status = resp.status();
    let text = resp.text().await?;
    debug!(status = status.as_u16(), bytes = text.len(), "provider response");

    let body = match parse_body(&text) {
        Some(body) => Some(body),
        // Surface the JSON parser's own complaint for garbage on a 2xx.
        None if status.is_success() => Some(serde_json::from_str(&text)?),
        None => None,
    };

    match body {
        Some(body) => Ok(ApiResponse {
            status: status.as_u16(),
            body,
        }),
        None => Err(SocialError::UnexpectedStatus {
            status: status.as_u16(),
            body: excerpt(&text),
        }),
    }
}

/// URL without its query string; queries carry secrets and codes.
fn endpoint_of(url: &str) -> &str {
    url.split_once('?').map_or(url, |(endpoint, _)| endpoint)
}
