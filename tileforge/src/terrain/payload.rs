//! Binary terrain chunk payload.
//!
//! # Layout
//!
//! ```text
//! offset  size              field
//! 0       1                 format version
//! 1       2                 resolution (u16 LE)
//! 3       8                 min elevation (f64 LE)
//! 11      8                 max elevation (f64 LE)
//! 19      4 × (res + 1)²    height samples (f32 LE, row-major)
//! ```

use bytes::{Buf, BufMut, Bytes, BytesMut};
use thiserror::Error;

/// Current payload format version.
pub const PAYLOAD_VERSION: u8 = 1;

/// Size of the fixed header in bytes.
pub const HEADER_LEN: usize = 19;

/// Total encoded size of a chunk at the given resolution.
///
/// # Example
///
/// ```
/// assert_eq!(tileforge::terrain::encoded_len(64), 16_919);
/// ```
pub const fn encoded_len(resolution: u16) -> usize {
    let side = resolution as usize + 1;
    HEADER_LEN + 4 * side * side
}

/// Errors raised while decoding a terrain payload.
#[derive(Debug, Clone, PartialEq, Error)]
pub enum PayloadError {
    #[error("payload too short: {0} bytes")]
    Truncated(usize),

    #[error("unsupported payload version {0}")]
    UnsupportedVersion(u8),

    #[error("payload is {actual} bytes, resolution {resolution} needs {expected}")]
    LengthMismatch {
        resolution: u16,
        expected: usize,
        actual: usize,
    },

    #[error("resolution {resolution} needs {expected} samples, got {actual}")]
    SampleCount {
        resolution: u16,
        expected: usize,
        actual: usize,
    },
}

/// Decoded terrain chunk heightfield.
#[derive(Debug, Clone, PartialEq)]
pub struct TerrainPayload {
    resolution: u16,
    min_elevation: f64,
    max_elevation: f64,
    heights: Vec<f32>,
}

impl TerrainPayload {
    /// Builds a payload from row-major samples, computing the elevation range.
    pub fn new(resolution: u16, heights: Vec<f32>) -> Result<Self, PayloadError> {
        let side = resolution as usize + 1;
        if heights.len() != side * side {
            return Err(PayloadError::SampleCount {
                resolution,
                expected: side * side,
                actual: heights.len(),
            });
        }

        let (min, max) = heights
            .iter()
            .fold((f64::INFINITY, f64::NEG_INFINITY), |(lo, hi), &h| {
                (lo.min(h as f64), hi.max(h as f64))
            });

        Ok(Self {
            resolution,
            min_elevation: min,
            max_elevation: max,
            heights,
        })
    }

    pub fn resolution(&self) -> u16 {
        self.resolution
    }

    pub fn min_elevation(&self) -> f64 {
        self.min_elevation
    }

    pub fn max_elevation(&self) -> f64 {
        self.max_elevation
    }

    pub fn heights(&self) -> &[f32] {
        &self.heights
    }

    /// Serializes the payload.
    pub fn encode(&self) -> Bytes {
        let mut buf = BytesMut::with_capacity(encoded_len(self.resolution));
        buf.put_u8(PAYLOAD_VERSION);
        buf.put_u16_le(self.resolution);
        buf.put_f64_le(self.min_elevation);
        buf.put_f64_le(self.max_elevation);
        for &h in &self.heights {
            buf.put_f32_le(h);
        }
        buf.freeze()
    }

    /// Parses an encoded payload, checking version and total length.
    pub fn decode(data: &[u8]) -> Result<Self, PayloadError> {
        if data.len() < HEADER_LEN {
            return Err(PayloadError::Truncated(data.len()));
        }

        let mut buf = data;
        let version = buf.get_u8();
        if version != PAYLOAD_VERSION {
            return Err(PayloadError::UnsupportedVersion(version));
        }

        let resolution = buf.get_u16_le();
        let expected = encoded_len(resolution);
        if data.len() != expected {
            return Err(PayloadError::LengthMismatch {
                resolution,
                expected,
                actual: data.len(),
            });
        }

        let min_elevation = buf.get_f64_le();
        let max_elevation = buf.get_f64_le();
        let mut heights = Vec::with_capacity(buf.remaining() / 4);
        while buf.has_remaining() {
            heights.push(buf.get_f32_le());
        }

        Ok(Self {
            resolution,
            min_elevation,
            max_elevation,
            heights,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn test_encoded_len_resolution_64() {
        assert_eq!(encoded_len(64), 16_919);
        assert_eq!(encoded_len(0), HEADER_LEN + 4);
    }

    #[test]
    fn test_new_computes_range() {
        let payload = TerrainPayload::new(1, vec![-3.0, 0.0, 2.5, 10.0]).unwrap();
        assert_eq!(payload.min_elevation(), -3.0);
        assert_eq!(payload.max_elevation(), 10.0);
    }

    #[test]
    fn test_new_rejects_wrong_sample_count() {
        let result = TerrainPayload::new(2, vec![0.0; 4]);
        assert!(matches!(
            result,
            Err(PayloadError::SampleCount {
                expected: 9,
                actual: 4,
                ..
            })
        ));
    }

    #[test]
    fn test_header_layout() {
        let payload = TerrainPayload::new(1, vec![1.0, 2.0, 3.0, 4.0]).unwrap();
        let bytes = payload.encode();

        assert_eq!(bytes[0], PAYLOAD_VERSION);
        assert_eq!(u16::from_le_bytes([bytes[1], bytes[2]]), 1);
        assert_eq!(f64::from_le_bytes(bytes[3..11].try_into().unwrap()), 1.0);
        assert_eq!(f64::from_le_bytes(bytes[11..19].try_into().unwrap()), 4.0);
        assert_eq!(f32::from_le_bytes(bytes[19..23].try_into().unwrap()), 1.0);
    }

    #[test]
    fn test_decode_rejects_truncated_and_bad_version() {
        assert_eq!(
            TerrainPayload::decode(&[1, 2, 3]),
            Err(PayloadError::Truncated(3))
        );

        let mut bytes = TerrainPayload::new(0, vec![5.0]).unwrap().encode().to_vec();
        bytes[0] = 9;
        assert_eq!(
            TerrainPayload::decode(&bytes),
            Err(PayloadError::UnsupportedVersion(9))
        );
    }

    #[test]
    fn test_decode_rejects_length_mismatch() {
        let mut bytes = TerrainPayload::new(1, vec![0.0; 4]).unwrap().encode().to_vec();
        bytes.push(0);
        assert!(matches!(
            TerrainPayload::decode(&bytes),
            Err(PayloadError::LengthMismatch { resolution: 1, .. })
        ));
    }

    proptest! {
        #[test]
        fn prop_encoded_size_matches_formula(resolution in 0u16..96) {
            let side = resolution as usize + 1;
            let payload = TerrainPayload::new(resolution, vec![0.5; side * side]).unwrap();
            prop_assert_eq!(payload.encode().len(), encoded_len(resolution));
        }
    }
}
