//! BMP encoding at 24-bit (streaming) or 8-bit (quantized).
//!
//! Header fields are computed from the stream metadata before the first byte
//! is written. Rows are written in the order they arrive; orientation only
//! decides the sign of the height field.

use std::io::Write;
use std::path::Path;

use tracing::{debug, instrument};

use super::{buffer_rows, check_width, write_file};
use super::types::{EncodeError, OutputDepth};
use crate::header::{
    write_color_table, BmpHeader, COLOR_ENTRY_LEN, FILE_HEADER_LEN, INFO_HEADER_LEN, RESOLUTION_PPM,
};
use crate::quantize::quantize;
use crate::raster::{row_stride, ImageStream, Metadata, Pixel, MAX_PALETTE_LEN};

/// Encode a stream to a BMP file at `bit_depth` (8 or 24).
///
/// The bit depth is validated before the file is created. If encoding fails
/// after that, the partially written file is removed.
#[instrument(skip(stream, path), fields(path = %path.as_ref().display()))]
pub fn encode<P: AsRef<Path>>(stream: ImageStream, bit_depth: u16, path: P) -> Result<(), EncodeError> {
    let depth = OutputDepth::try_from(bit_depth)?;
    write_file(path.as_ref(), |writer| write_bmp_to(stream, depth, writer))
}

/// Encode a stream as BMP bytes into any writer.
///
/// # Arguments
///
/// * `stream` - Rows to encode; the count must match the metadata height
/// * `bit_depth` - 8 (quantized palette) or 24 (true color)
/// * `writer` - Destination; flushed before returning
///
/// # Returns
///
/// `Ok(())` once every row is written, or the first validation, source or
/// I/O error.
pub fn encode_to_writer<W: Write>(stream: ImageStream, bit_depth: u16, writer: W) -> Result<(), EncodeError> {
    let depth = OutputDepth::try_from(bit_depth)?;
    write_bmp_to(stream, depth, writer)
}

/// Encode at an already validated depth.
pub fn write_bmp_to<W: Write>(stream: ImageStream, depth: OutputDepth, mut writer: W) -> Result<(), EncodeError> {
    match depth {
        OutputDepth::TrueColor24 => write_true_color(stream, &mut writer)?,
        OutputDepth::Indexed8 => write_indexed(stream, &mut writer)?,
    }
    writer.flush()?;
    Ok(())
}

/// Compute every header field for `metadata` at `depth`.
pub fn header_for(metadata: &Metadata, depth: OutputDepth) -> Result<BmpHeader, EncodeError> {
    let too_large = || EncodeError::DimensionsTooLarge {
        width: metadata.width,
        height: metadata.height,
    };

    let width = i32::try_from(metadata.width).map_err(|_| too_large())?;
    let height = i32::try_from(metadata.height).map_err(|_| too_large())?;

    let image_size = row_stride(depth.bits(), metadata.width) as u64 * metadata.height as u64;
    let palette_size = match depth {
        OutputDepth::Indexed8 => MAX_PALETTE_LEN as u32 * COLOR_ENTRY_LEN,
        OutputDepth::TrueColor24 => 0,
    };
    let pixel_offset = FILE_HEADER_LEN + INFO_HEADER_LEN + palette_size;
    let file_size = u32::try_from(pixel_offset as u64 + image_size).map_err(|_| too_large())?;

    Ok(BmpHeader {
        file_size,
        pixel_offset,
        info_size: INFO_HEADER_LEN,
        width,
        height: if metadata.orientation.is_top_down() { -height } else { height },
        planes: 1,
        bit_depth: depth.bits(),
        compression: 0,
        image_size: image_size as u32,
        x_resolution: RESOLUTION_PPM,
        y_resolution: RESOLUTION_PPM,
        colors_used: 0,
        important_colors: 0,
    })
}

fn write_true_color<W: Write>(stream: ImageStream, writer: &mut W) -> Result<(), EncodeError> {
    let metadata = *stream.metadata();
    let header = header_for(&metadata, OutputDepth::TrueColor24)?;
    debug!(
        width = metadata.width,
        height = metadata.height,
        file_size = header.file_size,
        "Writing 24-bit BMP"
    );
    header.write(writer)?;

    let stride = row_stride(24, metadata.width);
    let mut buf = Vec::with_capacity(stride);
    let mut written = 0u32;

    for row in stream {
        let row = row?;
        if written == metadata.height {
            return Err(EncodeError::TooManyRows {
                expected: metadata.height,
            });
        }
        check_width(written, row.len(), metadata.width)?;

        pack_rgb_row(&row, stride, &mut buf);
        writer.write_all(&buf)?;
        written += 1;
    }

    if written != metadata.height {
        return Err(EncodeError::RowCountMismatch {
            expected: metadata.height,
            actual: written,
        });
    }
    Ok(())
}

fn write_indexed<W: Write>(stream: ImageStream, writer: &mut W) -> Result<(), EncodeError> {
    let header = header_for(stream.metadata(), OutputDepth::Indexed8)?;
    let (metadata, rows) = buffer_rows(stream)?;
    let quantized = quantize(&rows);
    debug!(
        width = metadata.width,
        height = metadata.height,
        strategy = ?quantized.strategy,
        "Writing 8-bit BMP"
    );

    header.write(writer)?;
    write_color_table(writer, &quantized.palette)?;

    let stride = row_stride(8, metadata.width);
    let mut buf = Vec::with_capacity(stride);
    for index_row in &quantized.indices {
        pack_index_row(index_row, stride, &mut buf);
        writer.write_all(&buf)?;
    }
    Ok(())
}

/// BGR triples followed by zero padding up to `stride`.
fn pack_rgb_row(row: &[Pixel], stride: usize, out: &mut Vec<u8>) {
    out.clear();
    for p in row {
        out.extend_from_slice(&[p.b, p.g, p.r]);
    }
    out.resize(stride, 0);
}

fn pack_index_row(row: &[u8], stride: usize, out: &mut Vec<u8>) {
    out.clear();
    out.extend_from_slice(row);
    out.resize(stride, 0);
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::{decode_reader, DecodeOptions};
    use crate::raster::{BitDepth, Orientation, Row};
    use std::io::Cursor;

    fn meta(width: u32, height: u32, orientation: Orientation) -> Metadata {
        Metadata::new(width, height, BitDepth::TwentyFour, orientation)
    }

    fn encode_bytes(rows: Vec<Row>, metadata: Metadata, bit_depth: u16) -> Result<Vec<u8>, EncodeError> {
        let mut out = Vec::new();
        encode_to_writer(ImageStream::from_rows(metadata, rows), bit_depth, &mut out)?;
        Ok(out)
    }

    fn decode_bytes(bytes: Vec<u8>) -> (Metadata, Vec<Row>) {
        decode_reader(Cursor::new(bytes), &DecodeOptions::default())
            .unwrap()
            .collect_rows()
            .unwrap()
    }

    #[test]
    fn test_24bit_row_padding() {
        let rows = vec![vec![Pixel::new(1, 2, 3); 3]];
        let bytes = encode_bytes(rows, meta(3, 1, Orientation::BottomUp), 24).unwrap();

        // 54 header bytes + one 12-byte row (9 data + 3 padding)
        assert_eq!(bytes.len(), 66);
        assert_eq!(&bytes[54..63], &[3, 2, 1, 3, 2, 1, 3, 2, 1]);
        assert_eq!(&bytes[63..66], &[0, 0, 0]);
        assert_eq!(&bytes[2..6], &66u32.to_le_bytes());
        assert_eq!(&bytes[34..38], &12u32.to_le_bytes());
    }

    #[test]
    fn test_24bit_round_trip() {
        let rows = vec![
            vec![Pixel::new(255, 0, 0), Pixel::new(0, 255, 0)],
            vec![Pixel::new(0, 0, 255), Pixel::WHITE],
        ];
        let metadata = meta(2, 2, Orientation::BottomUp);
        let bytes = encode_bytes(rows.clone(), metadata, 24).unwrap();

        let (decoded_meta, decoded) = decode_bytes(bytes);
        assert_eq!(decoded_meta, metadata);
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_top_down_negates_height() {
        let rows = vec![vec![Pixel::BLACK]; 2];
        let bytes = encode_bytes(rows, meta(1, 2, Orientation::TopDown), 24).unwrap();

        assert_eq!(&bytes[22..26], &(-2i32).to_le_bytes());
        let (decoded_meta, _) = decode_bytes(bytes);
        assert_eq!(decoded_meta.orientation, Orientation::TopDown);
    }

    #[test]
    fn test_8bit_layout() {
        let rows = vec![vec![Pixel::gray(10), Pixel::gray(20), Pixel::gray(30)]];
        let bytes = encode_bytes(rows, meta(3, 1, Orientation::BottomUp), 8).unwrap();

        assert_eq!(&bytes[10..14], &1078u32.to_le_bytes());
        assert_eq!(&bytes[28..30], &8u16.to_le_bytes());
        assert_eq!(bytes.len(), 1078 + 4);
        // Grayscale ramp: entry 20 is (20, 20, 20, 0)
        assert_eq!(&bytes[54 + 20 * 4..54 + 21 * 4], &[20, 20, 20, 0]);
        assert_eq!(&bytes[1078..1082], &[10, 20, 30, 0]);
    }

    #[test]
    fn test_8bit_round_trip_exact_colors() {
        let rows = vec![
            vec![Pixel::new(200, 10, 10), Pixel::new(10, 200, 10)],
            vec![Pixel::new(10, 10, 200), Pixel::new(200, 10, 10)],
        ];
        let bytes = encode_bytes(rows.clone(), meta(2, 2, Orientation::BottomUp), 8).unwrap();

        let (decoded_meta, decoded) = decode_bytes(bytes);
        assert_eq!(decoded_meta.bit_depth, BitDepth::Eight);
        assert_eq!(decoded, rows);
    }

    #[test]
    fn test_write_bmp_to_matches_encode_to_writer() {
        let rows = vec![vec![Pixel::new(9, 8, 7), Pixel::new(1, 2, 3)]];
        let metadata = meta(2, 1, Orientation::TopDown);

        let mut direct = Vec::new();
        write_bmp_to(ImageStream::from_rows(metadata, rows.clone()), OutputDepth::Indexed8, &mut direct).unwrap();

        assert_eq!(direct, encode_bytes(rows, metadata, 8).unwrap());
        assert_eq!(&direct[28..30], &8u16.to_le_bytes());
    }

    #[test]
    fn test_unsupported_depth() {
        let err = encode_bytes(vec![], meta(0, 0, Orientation::BottomUp), 16).unwrap_err();
        assert!(matches!(err, EncodeError::UnsupportedBitDepth(16)));
    }

    #[test]
    fn test_too_few_rows() {
        let err = encode_bytes(vec![vec![Pixel::BLACK]], meta(1, 2, Orientation::BottomUp), 24).unwrap_err();
        assert!(matches!(err, EncodeError::RowCountMismatch { expected: 2, actual: 1 }));

        let err = encode_bytes(vec![vec![Pixel::BLACK]], meta(1, 2, Orientation::BottomUp), 8).unwrap_err();
        assert!(matches!(err, EncodeError::RowCountMismatch { expected: 2, actual: 1 }));
    }

    #[test]
    fn test_too_many_rows() {
        let rows = vec![vec![Pixel::BLACK]; 3];
        let err = encode_bytes(rows.clone(), meta(1, 2, Orientation::BottomUp), 24).unwrap_err();
        assert!(matches!(err, EncodeError::TooManyRows { expected: 2 }));

        let err = encode_bytes(rows, meta(1, 2, Orientation::BottomUp), 8).unwrap_err();
        assert!(matches!(err, EncodeError::TooManyRows { expected: 2 }));
    }

    #[test]
    fn test_row_width_mismatch() {
        let rows = vec![vec![Pixel::BLACK; 2]];
        let err = encode_bytes(rows, meta(3, 1, Orientation::BottomUp), 24).unwrap_err();
        assert!(matches!(
            err,
            EncodeError::RowWidthMismatch { row: 0, expected: 3, actual: 2 }
        ));
    }

    #[test]
    fn test_header_rejects_huge_dimensions() {
        let huge = meta(u32::MAX, 1, Orientation::BottomUp);
        assert!(matches!(
            header_for(&huge, OutputDepth::TrueColor24),
            Err(EncodeError::DimensionsTooLarge { .. })
        ));

        let huge = meta(60_000, 60_000, Orientation::BottomUp);
        assert!(matches!(
            header_for(&huge, OutputDepth::TrueColor24),
            Err(EncodeError::DimensionsTooLarge { .. })
        ));
    }

    #[test]
    fn test_failed_encode_removes_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("short.bmp");
        let stream = ImageStream::from_rows(meta(1, 2, Orientation::BottomUp), vec![vec![Pixel::BLACK]]);

        assert!(encode(stream, 24, &path).is_err());
        assert!(!path.exists());
    }

    #[test]
    fn test_bad_depth_does_not_create_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("never.bmp");
        let stream = ImageStream::from_rows(meta(1, 1, Orientation::BottomUp), vec![vec![Pixel::BLACK]]);

        assert!(matches!(
            encode(stream, 32, &path),
            Err(EncodeError::UnsupportedBitDepth(32))
        ));
        assert!(!path.exists());
    }

    #[test]
    fn test_encode_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("out.bmp");
        let stream = ImageStream::from_rows(meta(1, 1, Orientation::BottomUp), vec![vec![Pixel::WHITE]]);

        encode(stream, 24, &path).unwrap();
        let bytes = std::fs::read(&path).unwrap();
        assert_eq!(bytes.len(), 58);
        assert_eq!(&bytes[54..58], &[255, 255, 255, 0]);
    }
}
