//! One poll of the vehicle-position feed: key, fetch, decode, format, store.

use std::io::Write;

use bytes::Bytes;
use chrono::{DateTime, Utc};
use flate2::Compression;
use flate2::write::GzEncoder;
use serde::Serialize;
use tracing::{Instrument, error, info, info_span, warn};

use crate::config::PollConfig;
use crate::error::PollError;
use crate::fetch::{ApiKey, FetchOutcome, HttpClient, fetch_feed};
use crate::infra::keys::KeyStore;
use crate::infra::storage::ObjectSink;
use crate::output::format_records;
use crate::parser::parse_feed;

/// Status reported for every poll that completes, including empty ones.
pub const STATUS_OK: u16 = 200;

/// What a completed poll reports to its invoker.
#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PollOutcome {
    pub status_code: u16,
    pub message: String,
    pub record_count: usize,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub object_key: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub feed_timestamp: Option<DateTime<Utc>>,
}

impl PollOutcome {
    fn empty() -> Self {
        Self::processed(0, None, None)
    }

    fn processed(
        record_count: usize,
        object_key: Option<String>,
        feed_timestamp: Option<DateTime<Utc>>,
    ) -> Self {
        Self {
            status_code: STATUS_OK,
            message: format!("Processed {record_count} records"),
            record_count,
            object_key,
            feed_timestamp,
        }
    }
}

/// Converts a feed header timestamp (seconds since epoch) to UTC.
pub fn feed_datetime(secs: u64) -> Result<DateTime<Utc>, PollError> {
    i64::try_from(secs)
        .ok()
        .and_then(|s| DateTime::from_timestamp(s, 0))
        .ok_or(PollError::TimestampOutOfRange(secs))
}

/// Storage key for a feed snapshot: `<prefix><YYYY-MM-DD>/<HH:MM:SS>-<epoch>.csv`.
pub fn object_key(prefix: &str, feed_time: DateTime<Utc>) -> String {
    format!(
        "{prefix}{}/{}-{}.csv",
        feed_time.format("%Y-%m-%d"),
        feed_time.format("%H:%M:%S"),
        feed_time.timestamp()
    )
}

fn gzip(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

/// Runs polls against injected collaborators.
///
/// The collaborators are built once at startup; each [`run_once`](Self::run_once)
/// owns its decoded feed and keeps nothing afterwards.
pub struct Poller<K, C, S> {
    keys: K,
    http: C,
    sink: S,
    config: PollConfig,
}

impl<K, C, S> Poller<K, C, S>
where
    K: KeyStore,
    C: HttpClient,
    S: ObjectSink,
{
    pub fn new(keys: K, http: C, sink: S, config: PollConfig) -> Self {
        Self {
            keys,
            http,
            sink,
            config,
        }
    }

    pub fn sink(&self) -> &S {
        &self.sink
    }

    /// Runs a single poll to completion.
    ///
    /// A non-200 feed response is logged and yields zero records without
    /// touching the sink. Every other failure is logged and returned.
    pub async fn run_once(&self) -> Result<PollOutcome, PollError> {
        let span = info_span!("poll", url = %self.config.feed_url);

        match self.poll().instrument(span.clone()).await {
            Ok(outcome) => Ok(outcome),
            Err(e) => {
                span.in_scope(|| error!(error = %e, "Poll failed"));
                Err(e)
            }
        }
    }

    async fn poll(&self) -> Result<PollOutcome, PollError> {
        let reference = &self.config.api_key_parameter;
        let api_key = self
            .keys
            .get(reference)
            .await
            .map_err(|source| PollError::SecretRetrieval {
                reference: reference.clone(),
                source: source.into(),
            })?;

        let client = ApiKey::new(&self.http, &self.config.api_key_header, &api_key)?;
        let bytes = match fetch_feed(&client, &self.config.feed_url).await? {
            FetchOutcome::Feed(bytes) => bytes,
            FetchOutcome::NonSuccess { status, body } => {
                error!(%status, body = %body, "Feed request was not successful");
                return Ok(PollOutcome::empty());
            }
        };

        let feed = parse_feed(&bytes)?;
        let record_count = feed.entity.len();
        let secs = feed.header.timestamp.unwrap_or_else(|| {
            warn!("Feed header has no timestamp, keying output by epoch 0");
            0
        });
        info!(
            feed_timestamp = secs,
            entities = record_count,
            "GTFS message decoded"
        );

        let feed_time = feed_datetime(secs)?;
        let csv = format_records(&self.config.fields, &feed.entity)?;

        let mut key = object_key(&self.config.key_prefix, feed_time);
        let (body, content_encoding) = if self.config.gzip {
            key.push_str(".gz");
            (Bytes::from(gzip(csv.as_bytes())?), Some("gzip"))
        } else {
            (Bytes::from(csv), None)
        };

        self.sink
            .put(&key, body, content_encoding)
            .await
            .map_err(|source| PollError::Storage {
                key: key.clone(),
                source: source.into(),
            })?;

        info!(key = %key, record_count, "Poll complete");
        Ok(PollOutcome::processed(record_count, Some(key), Some(feed_time)))
    }
}
