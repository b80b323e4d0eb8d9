//! Write-once archival of formatted poll output.
//!
//! [`ObjectSink`] stores a body under a `/`-separated key. [`S3Sink`] puts it
//! in a bucket, [`LocalDirSink`] under a directory on disk.

mod local;
mod s3;

pub use local::LocalDirSink;
pub use s3::S3Sink;

use anyhow::Result;
use bytes::Bytes;

/// Content type recorded for CSV bodies.
pub const CSV_CONTENT_TYPE: &str = "text/csv";

/// Destination for one poll's output block.
#[async_trait::async_trait]
pub trait ObjectSink: Send + Sync {
    /// Stores `body` under `key`. `content_encoding` is `Some("gzip")` for
    /// compressed bodies.
    async fn put(&self, key: &str, body: Bytes, content_encoding: Option<&str>) -> Result<()>;
}

#[async_trait::async_trait]
impl<T: ObjectSink + ?Sized> ObjectSink for Box<T> {
    async fn put(&self, key: &str, body: Bytes, content_encoding: Option<&str>) -> Result<()> {
        (**self).put(key, body, content_encoding).await
    }
}
