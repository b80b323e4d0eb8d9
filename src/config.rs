//! Per-process poll configuration.

use reqwest::Url;

use crate::fetch::DEFAULT_HEADER;
use crate::fields::FieldSpec;

/// Everything a [`Poller`](crate::poll::Poller) needs besides its
/// collaborators. Built once at startup.
#[derive(Debug, Clone)]
pub struct PollConfig {
    /// Vehicle-position feed endpoint.
    pub feed_url: Url,
    /// Secret-store reference (SSM parameter name or ARN) of the API key.
    pub api_key_parameter: String,
    /// Header the API key is sent in.
    pub api_key_header: String,
    /// Prepended verbatim to every object key, e.g. `vehicle-positions/`.
    pub key_prefix: String,
    /// Gzip the CSV body and append `.gz` to the key.
    pub gzip: bool,
    pub fields: FieldSpec,
}

impl PollConfig {
    pub fn new(feed_url: Url, api_key_parameter: impl Into<String>) -> Self {
        Self {
            feed_url,
            api_key_parameter: api_key_parameter.into(),
            api_key_header: DEFAULT_HEADER.to_string(),
            key_prefix: String::new(),
            gzip: false,
            fields: FieldSpec::default(),
        }
    }

    pub fn with_api_key_header(mut self, header: impl Into<String>) -> Self {
        self.api_key_header = header.into();
        self
    }

    pub fn with_key_prefix(mut self, prefix: impl Into<String>) -> Self {
        self.key_prefix = prefix.into();
        self
    }

    pub fn with_gzip(mut self, gzip: bool) -> Self {
        self.gzip = gzip;
        self
    }

    pub fn with_fields(mut self, fields: FieldSpec) -> Self {
        self.fields = fields;
        self
    }
}
