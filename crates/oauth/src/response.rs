//! Response-body normalization.
//!
//! None of the providers signal failure through the HTTP status alone: errors
//! arrive as JSON fields, sometimes on a 200, sometimes on a 4xx. A response is
//! therefore always parsed first and judged by its body.

use {
    serde_json::{Map, Value},
    socialite_common::{ProviderKind, SocialError, SocialResult},
    url::form_urlencoded,
};

/// Longest body excerpt kept in [`SocialError::UnexpectedStatus`].
const BODY_EXCERPT: usize = 512;

/// Where a provider puts its error code and message.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ErrorFields {
    pub code: &'static str,
    pub message: &'static str,
    /// The code field being present at all means failure; otherwise only a
    /// non-zero value does.
    pub presence_is_error: bool,
}

impl ErrorFields {
    /// Failure when `code` is present and non-zero.
    pub const fn nonzero(code: &'static str, message: &'static str) -> Self {
        Self {
            code,
            message,
            presence_is_error: false,
        }
    }

    /// Failure whenever `code` is present.
    pub const fn present(code: &'static str, message: &'static str) -> Self {
        Self {
            code,
            message,
            presence_is_error: true,
        }
    }

    /// The `(code, message)` pair when `body` reports an error.
    pub fn extract(&self, body: &Value) -> Option<(i64, String)> {
        let raw = body.get(self.code).filter(|v| !v.is_null())?;
        let code = value_as_i64(raw);
        if !self.presence_is_error && code == Some(0) {
            return None;
        }
        let message = match body.get(self.message) {
            Some(Value::String(s)) => s.clone(),
            Some(Value::Null) | None => "unknown error".to_string(),
            Some(other) => other.to_string(),
        };
        Some((code.unwrap_or(-1), message))
    }
}

/// Fail with [`SocialError::Provider`] if any convention matches.
pub fn check_provider_error(
    provider: ProviderKind,
    body: &Value,
    conventions: &[ErrorFields],
) -> SocialResult<()> {
    match conventions.iter().find_map(|fields| fields.extract(body)) {
        Some((code, message)) => Err(SocialError::Provider {
            provider,
            message,
            code,
        }),
        None => Ok(()),
    }
}

/// A provider response: HTTP status plus the decoded body.
#[derive(Debug, Clone)]
pub struct ApiResponse {
    pub status: u16,
    pub body: Value,
}

impl ApiResponse {
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }

    /// Apply the provider's error conventions. A non-2xx status without a
    /// recognizable error body is a transport failure.
    pub fn into_checked(
        self,
        provider: ProviderKind,
        conventions: &[ErrorFields],
    ) -> SocialResult<Value> {
        check_provider_error(provider, &self.body, conventions)?;
        if !self.is_success() {
            return Err(SocialError::UnexpectedStatus {
                status: self.status,
                body: excerpt(&self.body.to_string()),
            });
        }
        Ok(self.body)
    }
}

/// Decode a response body. Accepts plain JSON, JSONP (`callback( {...} );`)
/// and `key=value&...` form bodies.
pub fn parse_body(text: &str) -> Option<Value> {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        return None;
    }
    if let Ok(value) = serde_json::from_str::<Value>(trimmed) {
        return Some(value);
    }
    if let Some(inner) = unwrap_jsonp(trimmed) {
        return serde_json::from_str(inner).ok();
    }
    parse_form_body(trimmed)
}

fn unwrap_jsonp(text: &str) -> Option<&str> {
    let open = text.find('(')?;
    let callback = &text[..open];
    if callback.is_empty()
        || !callback
            .trim()
            .chars()
            .all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '.')
    {
        return None;
    }
    let close = text.rfind(')')?;
    (close > open).then(|| text[open + 1..close].trim())
}

fn parse_form_body(text: &str) -> Option<Value> {
    if !text.contains('=') || text.contains(char::is_whitespace) || text.starts_with('<') {
        return None;
    }
    let map: Map<String, Value> = form_urlencoded::parse(text.as_bytes())
        .map(|(k, v)| (k.into_owned(), Value::String(v.into_owned())))
        .collect();
    (!map.is_empty()).then_some(Value::Object(map))
}

pub(crate) fn excerpt(text: &str) -> String {
    if text.len() <= BODY_EXCERPT {
        return text.to_string();
    }
    let mut end = BODY_EXCERPT;
    while !text.is_char_boundary(end) {
        end -= 1;
    }
    format!("{}...", &text[..end])
}

fn value_as_i64(value: &Value) -> Option<i64> {
    match value {
        Value::Number(n) => n.as_i64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

// ── Field access ────────────────────────────────────────────────────────────

pub fn str_field<'a>(body: &'a Value, key: &str) -> Option<&'a str> {
    body.get(key).and_then(Value::as_str)
}

/// A string field that some providers send as a number (Weibo's `uid`).
pub fn id_field(body: &Value, key: &str) -> Option<String> {
    match body.get(key)? {
        Value::String(s) if !s.is_empty() => Some(s.clone()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

/// An unsigned number that may arrive quoted (QQ's `expires_in`).
pub fn u64_field(body: &Value, key: &str) -> Option<u64> {
    match body.get(key)? {
        Value::Number(n) => n.as_u64(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

pub fn i64_field(body: &Value, key: &str) -> Option<i64> {
    body.get(key).and_then(value_as_i64)
}
