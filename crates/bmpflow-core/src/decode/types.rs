//! Core types for BMP decoding.

use std::io;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Error types for BMP decoding.
///
/// Everything except `Io`, `Open` and `TruncatedPixelData` describes a
/// malformed container and is reported before any row is produced.
#[derive(Debug, Error)]
pub enum DecodeError {
    /// The leading two bytes are not `BM`.
    #[error("Not a BMP file: expected magic \"BM\", found {0:02X?}")]
    InvalidMagic([u8; 2]),

    /// The info header declares a size this decoder cannot interpret.
    #[error("Inconsistent info header size: {0} bytes")]
    InvalidHeaderSize(u32),

    /// The pixel data offset points inside the headers or color table.
    #[error("Pixel data offset {offset} lies before the end of the headers ({minimum} bytes)")]
    InvalidPixelOffset { offset: u32, minimum: u64 },

    /// The stream ended inside the file or info header.
    #[error("Truncated BMP header")]
    TruncatedHeader,

    /// The stream ended inside the color table.
    #[error("Truncated color table: expected {expected} entries")]
    TruncatedColorTable { expected: usize },

    /// Bit depth other than 1, 4, 8, 16, 24 or 32.
    #[error("Unsupported bit depth: {0}")]
    UnsupportedBitDepth(u16),

    /// Any compression other than uncompressed RGB.
    #[error("Unsupported compression method: {0}")]
    UnsupportedCompression(u32),

    /// Negative width.
    #[error("Invalid image dimensions: width={width}, height={height}")]
    InvalidDimensions { width: i32, height: i32 },

    /// Pixel data ended before the declared height under [`TruncationPolicy::Error`].
    #[error("Truncated pixel data: expected {expected} rows, got {actual}")]
    TruncatedPixelData { expected: u32, actual: u32 },

    /// The input file could not be opened.
    #[error("Failed to open {}: {source}", path.display())]
    Open {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    /// I/O error while reading.
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),
}

/// What to do when pixel data ends before the declared height.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TruncationPolicy {
    /// End the row stream early and log a warning.
    #[default]
    Stop,
    /// Yield [`DecodeError::TruncatedPixelData`] as the final stream item.
    Error,
}

/// Decoder configuration.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DecodeOptions {
    /// Handling of short pixel data.
    pub truncation: TruncationPolicy,
}

impl DecodeOptions {
    pub fn builder() -> DecodeOptionsBuilder {
        DecodeOptionsBuilder::default()
    }

    /// Options that turn short pixel data into an error.
    pub fn strict() -> Self {
        Self {
            truncation: TruncationPolicy::Error,
        }
    }
}

/// Builder for [`DecodeOptions`].
#[derive(Debug, Default)]
pub struct DecodeOptionsBuilder {
    truncation: Option<TruncationPolicy>,
}

impl DecodeOptionsBuilder {
    pub fn truncation(mut self, policy: TruncationPolicy) -> Self {
        self.truncation = Some(policy);
        self
    }

    pub fn build(self) -> DecodeOptions {
        let default = DecodeOptions::default();
        DecodeOptions {
            truncation: self.truncation.unwrap_or(default.truncation),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_policy_stops() {
        assert_eq!(DecodeOptions::default().truncation, TruncationPolicy::Stop);
        assert_eq!(DecodeOptions::builder().build(), DecodeOptions::default());
    }

    #[test]
    fn test_builder_sets_policy() {
        let options = DecodeOptions::builder()
            .truncation(TruncationPolicy::Error)
            .build();
        assert_eq!(options, DecodeOptions::strict());
    }

    #[test]
    fn test_options_deserialize() {
        let options: DecodeOptions = serde_json::from_str(r#"{"truncation":"error"}"#).unwrap();
        assert_eq!(options.truncation, TruncationPolicy::Error);

        let options: DecodeOptions = serde_json::from_str("{}").unwrap();
        assert_eq!(options.truncation, TruncationPolicy::Stop);
    }

    #[test]
    fn test_decode_error_display() {
        let err = DecodeError::InvalidMagic(*b"PN");
        assert_eq!(err.to_string(), "Not a BMP file: expected magic \"BM\", found [50, 4E]");

        let err = DecodeError::UnsupportedBitDepth(2);
        assert_eq!(err.to_string(), "Unsupported bit depth: 2");

        let err = DecodeError::TruncatedPixelData { expected: 4, actual: 2 };
        assert_eq!(err.to_string(), "Truncated pixel data: expected 4 rows, got 2");
    }
}
