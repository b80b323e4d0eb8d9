//! HTTP retrieval of the raw feed payload.

mod api_key;
mod basic;
mod client;

pub use api_key::{ApiKey, ApiKeyError, DEFAULT_HEADER};
pub use basic::BasicClient;
pub use client::HttpClient;

use bytes::Bytes;
use reqwest::header::{CACHE_CONTROL, HeaderValue};
use reqwest::{Method, Request, StatusCode, Url};
use tracing::{debug, info};

/// Result of one feed request that reached the server.
#[derive(Debug)]
pub enum FetchOutcome {
    /// `200 OK` with the binary feed body.
    Feed(Bytes),
    /// Any other status. Carries the response text for logging.
    NonSuccess { status: StatusCode, body: String },
}

/// Issues an uncached GET for the feed.
///
/// Only transport failures are errors; a non-200 answer is reported as
/// [`FetchOutcome::NonSuccess`].
#[tracing::instrument(skip_all, fields(url = %url))]
pub async fn fetch_feed<C: HttpClient>(client: &C, url: &Url) -> reqwest::Result<FetchOutcome> {
    let mut req = Request::new(Method::GET, url.clone());
    req.headers_mut()
        .insert(CACHE_CONTROL, HeaderValue::from_static("no-cache"));

    let resp = client.execute(req).await?;
    let status = resp.status();
    debug!(%status, "Feed response received");

    if status == StatusCode::OK {
        let bytes = resp.bytes().await?;
        info!(bytes = bytes.len(), "GTFS response received");
        Ok(FetchOutcome::Feed(bytes))
    } else {
        let body = resp.text().await.unwrap_or_default();
        Ok(FetchOutcome::NonSuccess { status, body })
    }
}

/// Fetches an unauthenticated URL and returns its body, failing on any
/// 4xx/5xx status.
pub async fn fetch_bytes<C: HttpClient>(client: &C, url: &str) -> anyhow::Result<Vec<u8>> {
    let req = Request::new(Method::GET, url.parse()?);

    let resp = client.execute(req).await?.error_for_status()?;
    Ok(resp.bytes().await?.to_vec())
}
