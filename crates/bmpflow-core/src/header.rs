//! BMP container layout: the 14-byte file header, the info header and the
//! color table.
//!
//! # Layout
//!
//! ```text
//! offset  size  field
//! 0       2     magic "BM"
//! 2       4     file size (LE)
//! 6       2+2   reserved
//! 10      4     pixel data offset (LE)
//! 14      4     info header size (>= 40)
//! 18      4     width (signed)
//! 22      4     height (signed, negative = top-down)
//! 26      2     planes
//! 28      2     bits per pixel
//! 30      4     compression (0 = uncompressed)
//! 34      4     pixel data size
//! 38      4+4   horizontal / vertical resolution
//! 46      4     colors used
//! 50      4     important colors
//! 54      ...   extra info header bytes, color table, pixel data
//! ```

use std::io::{self, Read, Write};

use tracing::debug;

use crate::decode::DecodeError;
use crate::raster::{BitDepth, Metadata, Orientation, Palette, Pixel};

/// Magic bytes at the start of every BMP file.
pub const MAGIC: [u8; 2] = *b"BM";

/// Length of the file header.
pub const FILE_HEADER_LEN: u32 = 14;

/// Length of a BITMAPINFOHEADER, the smallest info header accepted.
pub const INFO_HEADER_LEN: u32 = 40;

/// Largest info header accepted (BITMAPV5HEADER).
pub const MAX_INFO_HEADER_LEN: u32 = 124;

/// Resolution written into both resolution fields (72 DPI).
pub const RESOLUTION_PPM: i32 = 2835;

/// Bytes per color table entry (B, G, R, reserved).
pub const COLOR_ENTRY_LEN: u32 = 4;

/// The fixed header fields of a BMP file.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct BmpHeader {
    pub file_size: u32,
    pub pixel_offset: u32,
    pub info_size: u32,
    pub width: i32,
    pub height: i32,
    pub planes: u16,
    pub bit_depth: u16,
    pub compression: u32,
    pub image_size: u32,
    pub x_resolution: i32,
    pub y_resolution: i32,
    pub colors_used: u32,
    pub important_colors: u32,
}

impl BmpHeader {
    /// Read the file header and info header.
    ///
    /// Info header bytes past the first 40 are consumed and ignored.
    pub fn read<R: Read>(reader: &mut R) -> Result<Self, DecodeError> {
        let mut file_header = [0u8; FILE_HEADER_LEN as usize];
        read_header_bytes(reader, &mut file_header)?;

        let magic = [file_header[0], file_header[1]];
        if magic != MAGIC {
            return Err(DecodeError::InvalidMagic(magic));
        }

        let mut size_bytes = [0u8; 4];
        read_header_bytes(reader, &mut size_bytes)?;
        let info_size = u32::from_le_bytes(size_bytes);
        if !(INFO_HEADER_LEN..=MAX_INFO_HEADER_LEN).contains(&info_size) {
            return Err(DecodeError::InvalidHeaderSize(info_size));
        }

        let mut info = vec![0u8; (info_size - 4) as usize];
        read_header_bytes(reader, &mut info)?;

        let header = Self {
            file_size: le_u32(&file_header, 2),
            pixel_offset: le_u32(&file_header, 10),
            info_size,
            width: le_i32(&info, 0),
            height: le_i32(&info, 4),
            planes: le_u16(&info, 8),
            bit_depth: le_u16(&info, 10),
            compression: le_u32(&info, 12),
            image_size: le_u32(&info, 16),
            x_resolution: le_i32(&info, 20),
            y_resolution: le_i32(&info, 24),
            colors_used: le_u32(&info, 28),
            important_colors: le_u32(&info, 32),
        };

        debug!(
            width = header.width,
            height = header.height,
            bit_depth = header.bit_depth,
            info_size = header.info_size,
            pixel_offset = header.pixel_offset,
            "Parsed BMP header"
        );

        Ok(header)
    }

    /// Write the file header and a 40-byte info header.
    pub fn write<W: Write>(&self, writer: &mut W) -> io::Result<()> {
        let mut buf = Vec::with_capacity((FILE_HEADER_LEN + INFO_HEADER_LEN) as usize);

        buf.extend_from_slice(&MAGIC);
        buf.extend_from_slice(&self.file_size.to_le_bytes());
        buf.extend_from_slice(&[0u8; 4]); // reserved
        buf.extend_from_slice(&self.pixel_offset.to_le_bytes());

        buf.extend_from_slice(&INFO_HEADER_LEN.to_le_bytes());
        buf.extend_from_slice(&self.width.to_le_bytes());
        buf.extend_from_slice(&self.height.to_le_bytes());
        buf.extend_from_slice(&self.planes.to_le_bytes());
        buf.extend_from_slice(&self.bit_depth.to_le_bytes());
        buf.extend_from_slice(&self.compression.to_le_bytes());
        buf.extend_from_slice(&self.image_size.to_le_bytes());
        buf.extend_from_slice(&self.x_resolution.to_le_bytes());
        buf.extend_from_slice(&self.y_resolution.to_le_bytes());
        buf.extend_from_slice(&self.colors_used.to_le_bytes());
        buf.extend_from_slice(&self.important_colors.to_le_bytes());

        writer.write_all(&buf)
    }

    /// Validate the header and derive stream metadata.
    pub fn metadata(&self) -> Result<Metadata, DecodeError> {
        let bit_depth = BitDepth::try_from(self.bit_depth).map_err(DecodeError::UnsupportedBitDepth)?;

        if self.compression != 0 {
            return Err(DecodeError::UnsupportedCompression(self.compression));
        }

        if self.width < 0 {
            return Err(DecodeError::InvalidDimensions {
                width: self.width,
                height: self.height,
            });
        }

        Ok(Metadata {
            width: self.width.unsigned_abs(),
            height: self.height.unsigned_abs(),
            bit_depth,
            orientation: Orientation::from_height(self.height),
        })
    }

    /// Offset of the first byte after the headers and the color table.
    pub fn data_start(&self, palette_len: usize) -> u64 {
        FILE_HEADER_LEN as u64 + self.info_size as u64 + palette_len as u64 * COLOR_ENTRY_LEN as u64
    }
}

/// Read `entries` color table entries stored as (B, G, R, reserved).
pub fn read_color_table<R: Read>(reader: &mut R, entries: usize) -> Result<Palette, DecodeError> {
    let mut table = vec![0u8; entries * COLOR_ENTRY_LEN as usize];
    reader.read_exact(&mut table).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::TruncatedColorTable { expected: entries },
        _ => DecodeError::Io(e),
    })?;

    let colors = table
        .chunks_exact(COLOR_ENTRY_LEN as usize)
        .map(|entry| Pixel::new(entry[2], entry[1], entry[0]))
        .collect();
    Ok(Palette::new(colors))
}

/// Write every palette entry as (B, G, R, 0).
pub fn write_color_table<W: Write>(writer: &mut W, palette: &Palette) -> io::Result<()> {
    let table: Vec<u8> = palette
        .iter()
        .flat_map(|color| [color.b, color.g, color.r, 0])
        .collect();
    writer.write_all(&table)
}

fn read_header_bytes<R: Read>(reader: &mut R, buf: &mut [u8]) -> Result<(), DecodeError> {
    reader.read_exact(buf).map_err(|e| match e.kind() {
        io::ErrorKind::UnexpectedEof => DecodeError::TruncatedHeader,
        _ => DecodeError::Io(e),
    })
}

#[inline]
fn le_u16(buf: &[u8], offset: usize) -> u16 {
    u16::from_le_bytes([buf[offset], buf[offset + 1]])
}

#[inline]
fn le_u32(buf: &[u8], offset: usize) -> u32 {
    u32::from_le_bytes([buf[offset], buf[offset + 1], buf[offset + 2], buf[offset + 3]])
}

#[inline]
fn le_i32(buf: &[u8], offset: usize) -> i32 {
    le_u32(buf, offset) as i32
}
