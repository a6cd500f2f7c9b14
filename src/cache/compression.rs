//! Payload Encoding Module
//!
//! Size estimation and threshold-triggered gzip compression of cache payloads.
//! Sizes are a heuristic based on the JSON serialization, not heap accounting.

use std::io::{Read, Write};

use flate2::read::GzDecoder;
use flate2::write::GzEncoder;
use flate2::Compression;
use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::error::{CacheError, Result};

// == Encoded Payload ==
/// Result of preparing a value for storage.
#[derive(Debug)]
pub struct EncodedPayload {
    /// Serialized size, or an approximation if serialization failed
    pub size_bytes: usize,
    /// Compressed bytes when the size exceeded the threshold
    pub compressed: Option<Vec<u8>>,
}

// == Encode ==
/// Measures `value` and compresses it if its serialized form is larger than
/// `threshold` bytes.
///
/// Serialization failure degrades to an in-memory size approximation and the
/// value is kept uncompressed.
pub fn encode<T: Serialize>(value: &T, threshold: usize) -> EncodedPayload {
    let bytes = match serde_json::to_vec(value) {
        Ok(bytes) => bytes,
        Err(e) => {
            warn!("Payload size estimation fell back to approximation: {}", e);
            return EncodedPayload {
                size_bytes: std::mem::size_of_val(value),
                compressed: None,
            };
        }
    };

    let size_bytes = bytes.len();
    if size_bytes <= threshold {
        return EncodedPayload {
            size_bytes,
            compressed: None,
        };
    }

    match compress(&bytes) {
        Ok(compressed) => EncodedPayload {
            size_bytes,
            compressed: Some(compressed),
        },
        Err(e) => {
            warn!("Compression failed, storing payload uncompressed: {}", e);
            EncodedPayload {
                size_bytes,
                compressed: None,
            }
        }
    }
}

// == Decode ==
/// Restores a value from its compressed serialized form.
pub fn decode<T: DeserializeOwned>(bytes: &[u8]) -> Result<T> {
    let raw = decompress(bytes)
        .map_err(|e| CacheError::Internal(format!("Failed to decompress payload: {}", e)))?;
    Ok(serde_json::from_slice(&raw)?)
}

fn compress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut encoder = GzEncoder::new(Vec::new(), Compression::default());
    encoder.write_all(data)?;
    encoder.finish()
}

fn decompress(data: &[u8]) -> std::io::Result<Vec<u8>> {
    let mut decoder = GzDecoder::new(data);
    let mut out = Vec::new();
    decoder.read_to_end(&mut out)?;
    Ok(out)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::ser::Error as _;
    use serde::Serializer;

    struct Unserializable;

    impl Serialize for Unserializable {
        fn serialize<S: Serializer>(&self, _serializer: S) -> std::result::Result<S::Ok, S::Error> {
            Err(S::Error::custom("refused"))
        }
    }

    #[test]
    fn test_small_payload_not_compressed() {
        let payload = encode(&"short".to_string(), 1024);
        assert_eq!(payload.size_bytes, "\"short\"".len());
        assert!(payload.compressed.is_none());
    }

    #[test]
    fn test_threshold_is_exclusive() {
        let value = "abc".to_string();
        let size = serde_json::to_vec(&value).unwrap().len();

        assert!(encode(&value, size).compressed.is_none());
        assert!(encode(&value, size - 1).compressed.is_some());
    }

    #[test]
    fn test_large_payload_round_trip() {
        let value: Vec<String> = (0..500).map(|i| format!("row-{}", i)).collect();
        let payload = encode(&value, 100);

        let bytes = payload.compressed.expect("payload should be compressed");
        assert!(bytes.len() < payload.size_bytes);

        let restored: Vec<String> = decode(&bytes).unwrap();
        assert_eq!(restored, value);
    }

    #[test]
    fn test_serialization_failure_falls_back() {
        let payload = encode(&Unserializable, 0);
        assert!(payload.compressed.is_none());
        assert_eq!(payload.size_bytes, std::mem::size_of::<Unserializable>());
    }

    #[test]
    fn test_decode_garbage_is_error() {
        let result: Result<String> = decode(b"definitely not gzip");
        assert!(matches!(result, Err(CacheError::Internal(_))));
    }
}
