//! Image encoding for bmpflow.
//!
//! This module provides functionality for:
//! - Encoding streams to BMP at 24-bit (streaming) or 8-bit (quantized)
//! - Handing fully buffered, top-down frames to an adaptive palette encoder
//!   such as the GIF backend
//!
//! # Architecture
//!
//! The 24-bit writer holds one row at a time. The 8-bit writer and the
//! adaptive port must see the whole image first, so they buffer every row and
//! check the row count against the metadata before producing output.
//!
//! # Examples
//!
//! ```ignore
//! use bmpflow_core::{decode, encode};
//!
//! let stream = decode("in.bmp")?;
//! encode(stream, 8, "out.bmp")?;
//! ```

mod bmp;
mod gif;
mod types;

use std::fs::{self, File};
use std::io::{BufWriter, Write};
use std::path::Path;

use tracing::warn;

use crate::raster::{ImageStream, Metadata, Row};

pub use bmp::{encode, encode_to_writer, header_for, write_bmp_to};
pub use gif::{buffer_frame, encode_adaptive, AdaptiveEncoder, AdaptiveFrame, ColorMode, GifBackend};
pub use types::{EncodeError, OutputDepth};

/// Pull every row, checking count and widths against the metadata.
pub(crate) fn buffer_rows(stream: ImageStream) -> Result<(Metadata, Vec<Row>), EncodeError> {
    let metadata = *stream.metadata();
    let mut rows = Vec::new();

    for row in stream {
        let row = row?;
        let index = rows.len() as u32;
        if index == metadata.height {
            return Err(EncodeError::TooManyRows {
                expected: metadata.height,
            });
        }
        check_width(index, row.len(), metadata.width)?;
        rows.push(row);
    }

    if rows.len() != metadata.height as usize {
        return Err(EncodeError::RowCountMismatch {
            expected: metadata.height,
            actual: rows.len() as u32,
        });
    }
    Ok((metadata, rows))
}

pub(crate) fn check_width(row: u32, actual: usize, expected: u32) -> Result<(), EncodeError> {
    if actual != expected as usize {
        return Err(EncodeError::RowWidthMismatch { row, expected, actual });
    }
    Ok(())
}

/// Create `path`, run `write` against it and flush.
///
/// On any error the file is removed, so a failed encode never leaves a
/// truncated image behind.
pub(crate) fn write_file<F>(path: &Path, write: F) -> Result<(), EncodeError>
where
    F: FnOnce(&mut BufWriter<File>) -> Result<(), EncodeError>,
{
    let mut writer = BufWriter::new(File::create(path)?);
    let result = write(&mut writer).and_then(|()| writer.flush().map_err(EncodeError::from));

    if result.is_err() {
        drop(writer);
        if let Err(e) = fs::remove_file(path) {
            warn!(error = %e, path = %path.display(), "Failed to remove partially written output");
        }
    }
    result
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeError;
    use crate::raster::{BitDepth, Orientation, Pixel};

    fn meta(width: u32, height: u32) -> Metadata {
        Metadata::new(width, height, BitDepth::TwentyFour, Orientation::BottomUp)
    }

    #[test]
    fn test_buffer_rows_exact() {
        let rows = vec![vec![Pixel::BLACK; 2]; 3];
        let (metadata, buffered) = buffer_rows(ImageStream::from_rows(meta(2, 3), rows.clone())).unwrap();
        assert_eq!(metadata.height, 3);
        assert_eq!(buffered, rows);
    }

    #[test]
    fn test_buffer_rows_propagates_source_error() {
        let rows: Vec<Result<Row, DecodeError>> = vec![
            Ok(vec![Pixel::BLACK]),
            Err(DecodeError::TruncatedPixelData { expected: 2, actual: 1 }),
        ];
        let stream = ImageStream::new(meta(1, 2), rows.into_iter());
        assert!(matches!(
            buffer_rows(stream),
            Err(EncodeError::Source(DecodeError::TruncatedPixelData { .. }))
        ));
    }

    #[test]
    fn test_buffer_rows_width_mismatch() {
        let rows = vec![vec![Pixel::BLACK; 2], vec![Pixel::BLACK]];
        assert!(matches!(
            buffer_rows(ImageStream::from_rows(meta(2, 2), rows)),
            Err(EncodeError::RowWidthMismatch { row: 1, expected: 2, actual: 1 })
        ));
    }

    #[test]
    fn test_write_file_keeps_output_on_success() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("ok.bin");

        write_file(&path, |w| Ok(w.write_all(b"complete")?)).unwrap();
        assert_eq!(std::fs::read(&path).unwrap(), b"complete");
    }

    #[test]
    fn test_write_file_removes_output_on_failure() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("partial.bin");

        let err = write_file(&path, |w| {
            w.write_all(b"partial")?;
            w.flush()?;
            Err(EncodeError::Backend("interrupted".into()))
        })
        .unwrap_err();

        assert!(matches!(err, EncodeError::Backend(_)));
        assert!(!path.exists());
    }
}
