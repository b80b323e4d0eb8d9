use crate::fetch::client::HttpClient;
use async_trait::async_trait;
use reqwest::header::{HeaderName, HeaderValue, InvalidHeaderName, InvalidHeaderValue};
use thiserror::Error;

/// Header the feed provider expects the key in unless configured otherwise.
pub const DEFAULT_HEADER: &str = "api_key";

#[derive(Debug, Error)]
pub enum ApiKeyError {
    #[error("invalid API key header name '{name}': {source}")]
    Name {
        name: String,
        #[source]
        source: InvalidHeaderName,
    },

    #[error("API key is not a valid header value: {0}")]
    Value(#[from] InvalidHeaderValue),
}

/// An [`HttpClient`] wrapper that injects an API key as an HTTP header.
///
/// The header name and value are validated once at construction, so
/// `execute` cannot fail on a malformed key. The value is marked sensitive and
/// is never printed by reqwest's `Debug` output.
pub struct ApiKey<C> {
    inner: C,
    header_name: HeaderName,
    key: HeaderValue,
}

impl<C> ApiKey<C> {
    pub fn new(inner: C, header_name: &str, key: &str) -> Result<Self, ApiKeyError> {
        let header_name =
            HeaderName::from_bytes(header_name.as_bytes()).map_err(|source| ApiKeyError::Name {
                name: header_name.to_string(),
                source,
            })?;
        let mut key = HeaderValue::from_str(key)?;
        key.set_sensitive(true);

        Ok(Self {
            inner,
            header_name,
            key,
        })
    }

    pub fn header_name(&self) -> &HeaderName {
        &self.header_name
    }
}

#[async_trait]
impl<C: HttpClient> HttpClient for ApiKey<C> {
    async fn execute(&self, mut req: reqwest::Request) -> reqwest::Result<reqwest::Response> {
        req.headers_mut()
            .insert(self.header_name.clone(), self.key.clone());
        self.inner.execute(req).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_bad_header_name() {
        let err = ApiKey::new((), "bad header", "secret").err().unwrap();
        assert!(matches!(err, ApiKeyError::Name { .. }));
    }

    #[test]
    fn test_rejects_key_with_newline() {
        let err = ApiKey::new((), DEFAULT_HEADER, "sec\nret").err().unwrap();
        assert!(matches!(err, ApiKeyError::Value(_)));
    }

    #[test]
    fn test_header_name_is_normalized() {
        let client = ApiKey::new((), "X-Api-Key", "secret").unwrap();
        assert_eq!(client.header_name().as_str(), "x-api-key");
    }
}
