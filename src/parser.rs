//! Protobuf decoder for GTFS Realtime feeds.

use prost::Message;
use thiserror::Error;

use crate::gtfs_rt::FeedMessage;

/// The payload was not a well-formed protobuf `FeedMessage`.
#[derive(Debug, Error)]
#[error("malformed GTFS-RT feed ({len} bytes): {source}")]
pub struct DecodeError {
    len: usize,
    #[source]
    source: prost::DecodeError,
}

impl DecodeError {
    /// Size of the rejected payload.
    pub fn payload_len(&self) -> usize {
        self.len
    }
}

/// Decodes a protobuf-encoded GTFS-RT [`FeedMessage`] from raw bytes.
///
/// Decoding is structural only: coordinates, timestamps and identifiers are
/// taken as they come.
///
/// # Errors
///
/// Returns [`DecodeError`] if the bytes are truncated or not valid protobuf for
/// a `FeedMessage`. Nothing is returned from a partial decode.
pub fn parse_feed(bytes: &[u8]) -> Result<FeedMessage, DecodeError> {
    FeedMessage::decode(bytes).map_err(|source| DecodeError {
        len: bytes.len(),
        source,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::gtfs_rt::{FeedEntity, FeedHeader, Position, VehiclePosition};

    fn sample_feed() -> FeedMessage {
        FeedMessage {
            header: FeedHeader {
                gtfs_realtime_version: "2.0".to_string(),
                timestamp: Some(1234567890),
                incrementality: None,
                feed_version: None,
            },
            entity: vec![FeedEntity {
                id: "bus-1".to_string(),
                vehicle: Some(VehiclePosition {
                    timestamp: Some(1234567880),
                    position: Some(Position {
                        latitude: Some(42.35),
                        longitude: Some(-71.06),
                        ..Default::default()
                    }),
                    ..Default::default()
                }),
                ..Default::default()
            }],
        }
    }

    #[test]
    fn test_parse_empty_bytes_returns_default_feed() {
        // An empty byte array decodes to a FeedMessage with default values
        let feed = parse_feed(&[]).unwrap();
        assert_eq!(feed.header.gtfs_realtime_version, "");
        assert_eq!(feed.header.timestamp, None);
        assert!(feed.entity.is_empty());
    }

    #[test]
    fn test_parse_invalid_bytes() {
        let invalid_bytes = vec![0xFF, 0xFE, 0x00, 0x01];
        let err = parse_feed(&invalid_bytes).unwrap_err();
        assert_eq!(err.payload_len(), 4);
    }

    #[test]
    fn test_parse_valid_feed() {
        let encoded = sample_feed().encode_to_vec();
        let parsed = parse_feed(&encoded).unwrap();

        assert_eq!(parsed.header.gtfs_realtime_version, "2.0");
        assert_eq!(parsed.header.timestamp, Some(1234567890));
        assert_eq!(parsed.entity.len(), 1);
        let vehicle = parsed.entity[0].vehicle.as_ref().unwrap();
        assert_eq!(vehicle.timestamp, Some(1234567880));
        assert!(vehicle.trip.is_none());
    }

    #[test]
    fn test_parse_truncated_feed() {
        let encoded = sample_feed().encode_to_vec();
        for cut in [1, encoded.len() / 2, encoded.len() - 1] {
            assert!(
                parse_feed(&encoded[..cut]).is_err(),
                "truncation at {cut} bytes should not decode"
            );
        }
    }

    #[test]
    fn test_error_message_mentions_size() {
        let err = parse_feed(&[0x0A, 0x10, 0x01]).unwrap_err();
        assert!(err.to_string().contains("3 bytes"));
    }
}
