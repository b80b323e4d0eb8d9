use anyhow::{Context, Result};
use aws_sdk_s3::primitives::ByteStream;
use bytes::Bytes;
use tracing::info;

use super::{CSV_CONTENT_TYPE, ObjectSink};

/// Uploads objects to a single S3 bucket.
pub struct S3Sink {
    client: aws_sdk_s3::Client,
    bucket: String,
}

impl S3Sink {
    pub fn new(config: &aws_config::SdkConfig, bucket: impl Into<String>) -> Self {
        Self {
            client: aws_sdk_s3::Client::new(config),
            bucket: bucket.into(),
        }
    }
}

#[async_trait::async_trait]
impl ObjectSink for S3Sink {
    #[tracing::instrument(skip(self, body))]
    async fn put(&self, key: &str, body: Bytes, content_encoding: Option<&str>) -> Result<()> {
        self.client
            .put_object()
            .bucket(&self.bucket)
            .key(key)
            .body(ByteStream::from(body))
            .content_type(CSV_CONTENT_TYPE)
            .set_content_encoding(content_encoding.map(str::to_string))
            .send()
            .await
            .with_context(|| format!("S3 PutObject failed for s3://{}/{key}", self.bucket))?;

        info!(bucket = %self.bucket, key, "Object uploaded");
        Ok(())
    }
}
