//! Failures that abort a poll.
//!
//! A non-200 feed response is deliberately absent: it completes the poll with
//! zero records. Missing entity fields never surface either; they render as
//! `"None"` inside the record.

use thiserror::Error;

use crate::fetch::ApiKeyError;
use crate::output::FormatError;
use crate::parser::DecodeError;

pub type BoxError = Box<dyn std::error::Error + Send + Sync + 'static>;

#[derive(Debug, Error)]
pub enum PollError {
    #[error("failed to retrieve API key '{reference}': {source}")]
    SecretRetrieval { reference: String, source: BoxError },

    #[error(transparent)]
    ApiKey(#[from] ApiKeyError),

    #[error("feed request failed: {0}")]
    Transport(#[from] reqwest::Error),

    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Format(#[from] FormatError),

    #[error("feed timestamp {0} is outside the representable date range")]
    TimestampOutOfRange(u64),

    #[error("failed to compress output: {0}")]
    Compress(#[from] std::io::Error),

    #[error("failed to store '{key}': {source}")]
    Storage { key: String, source: BoxError },
}

impl PollError {
    /// `true` for failures caused by the feed payload rather than by a
    /// collaborator.
    pub fn is_feed_error(&self) -> bool {
        matches!(self, Self::Decode(_) | Self::TimestampOutOfRange(_))
    }
}
