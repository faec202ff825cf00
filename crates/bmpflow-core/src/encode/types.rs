//! Core types for encoding.

use std::io;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::decode::DecodeError;

/// Errors that can occur while encoding.
#[derive(Debug, Error)]
pub enum EncodeError {
    /// Requested output depth is neither 8 nor 24.
    #[error("Unsupported output bit depth: {0} (expected 8 or 24)")]
    UnsupportedBitDepth(u16),

    /// Fewer rows arrived than the metadata declares.
    #[error("Row count mismatch: expected {expected} rows, got {actual}")]
    RowCountMismatch { expected: u32, actual: u32 },

    /// More rows arrived than the metadata declares.
    #[error("Too many rows: expected {expected}")]
    TooManyRows { expected: u32 },

    /// A row's length differs from the declared width.
    #[error("Row {row} has {actual} pixels, expected {expected}")]
    RowWidthMismatch { row: u32, expected: u32, actual: usize },

    /// Dimensions do not fit the header fields of the target format.
    #[error("Image dimensions {width}x{height} are too large for this format")]
    DimensionsTooLarge { width: u32, height: u32 },

    /// The adaptive palette backend failed.
    #[error("Adaptive encoding failed: {0}")]
    Backend(String),

    /// The upstream stream failed while being consumed.
    #[error("Source stream failed: {0}")]
    Source(#[from] DecodeError),

    /// I/O error while writing.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// Output depths the BMP encoder supports.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum OutputDepth {
    /// 256-color palette, median-cut quantized. Buffers the whole image.
    Indexed8,
    /// BGR triples. Streams one row at a time.
    TrueColor24,
}

impl OutputDepth {
    pub fn bits(self) -> u16 {
        match self {
            OutputDepth::Indexed8 => 8,
            OutputDepth::TrueColor24 => 24,
        }
    }
}

impl TryFrom<u16> for OutputDepth {
    type Error = EncodeError;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            8 => Ok(OutputDepth::Indexed8),
            24 => Ok(OutputDepth::TrueColor24),
            other => Err(EncodeError::UnsupportedBitDepth(other)),
        }
    }
}

impl From<OutputDepth> for u16 {
    fn from(depth: OutputDepth) -> Self {
        depth.bits()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_output_depth_from_bits() {
        assert_eq!(OutputDepth::try_from(8).unwrap(), OutputDepth::Indexed8);
        assert_eq!(OutputDepth::try_from(24).unwrap(), OutputDepth::TrueColor24);
        assert!(matches!(
            OutputDepth::try_from(16),
            Err(EncodeError::UnsupportedBitDepth(16))
        ));
    }

    #[test]
    fn test_encode_error_display() {
        let err = EncodeError::RowCountMismatch { expected: 4, actual: 3 };
        assert_eq!(err.to_string(), "Row count mismatch: expected 4 rows, got 3");

        let err = EncodeError::UnsupportedBitDepth(32);
        assert_eq!(err.to_string(), "Unsupported output bit depth: 32 (expected 8 or 24)");
    }
}
