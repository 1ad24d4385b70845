//! Request URL composition.
//!
//! Parameters with no value are dropped rather than sent as empty keys, so
//! optional settings (display mode, language, ...) can be passed through
//! unconditionally.

use url::form_urlencoded;

/// Ordered query or form parameters.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct QueryParams {
    pairs: Vec<(&'static str, Option<String>)>,
}

impl QueryParams {
    pub fn new() -> Self {
        Self::default()
    }

    #[must_use]
    pub fn with(mut self, key: &'static str, value: impl Into<String>) -> Self {
        self.pairs.push((key, Some(value.into())));
        self
    }

    #[must_use]
    pub fn with_opt<V: Into<String>>(mut self, key: &'static str, value: Option<V>) -> Self {
        self.pairs.push((key, value.map(Into::into)));
        self
    }

    pub fn push(&mut self, key: &'static str, value: impl Into<String>) {
        self.pairs.push((key, Some(value.into())));
    }

    /// First value set for `key`.
    pub fn get(&self, key: &str) -> Option<&str> {
        self.pairs
            .iter()
            .find(|(k, _)| *k == key)
            .and_then(|(_, v)| v.as_deref())
    }

    /// Pairs that carry a value, in insertion order.
    pub fn pairs(&self) -> impl Iterator<Item = (&'static str, &str)> + '_ {
        self.pairs
            .iter()
            .filter_map(|(k, v)| v.as_deref().map(|v| (*k, v)))
    }

    pub fn is_empty(&self) -> bool {
        self.pairs().next().is_none()
    }

    /// `application/x-www-form-urlencoded` serialization.
    pub fn encode(&self) -> String {
        let mut serializer = form_urlencoded::Serializer::new(String::new());
        for (key, value) in self.pairs() {
            serializer.append_pair(key, value);
        }
        serializer.finish()
    }
}

/// Join a provider base domain and a path. An absolute `http(s)://` path is
/// used as is.
pub fn join_url(base: &str, path: &str) -> String {
    if path.starts_with("http://") || path.starts_with("https://") {
        return path.to_string();
    }
    format!(
        "{}/{}",
        base.trim_end_matches('/'),
        path.trim_start_matches('/')
    )
}

/// Append encoded parameters to a URL that may already carry a query string.
pub fn append_query(url: &str, params: &QueryParams) -> String {
    if params.is_empty() {
        return url.to_string();
    }
    let separator = if url.contains('?') { '&' } else { '?' };
    format!("{url}{separator}{}", params.encode())
}

/// `base` + `path` + `?query`.
pub fn build_url(base: &str, path: &str, params: &QueryParams) -> String {
    append_query(&join_url(base, path), params)
}
