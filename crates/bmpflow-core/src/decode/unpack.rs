//! Per-depth row unpacking.
//!
//! Each function reads exactly `width` pixels from the start of a stored row
//! and ignores whatever padding follows.

use crate::raster::{BitDepth, Palette, Pixel, Row};

/// Unpack one stored row into pixels.
///
/// `data` must hold at least the unpadded bytes of `width` pixels.
/// Indexed depths resolve through `palette`.
pub fn unpack_row(data: &[u8], width: usize, depth: BitDepth, palette: &Palette) -> Row {
    match depth {
        BitDepth::One => unpack_1bit(data, width, palette),
        BitDepth::Four => unpack_4bit(data, width, palette),
        BitDepth::Eight => unpack_8bit(data, width, palette),
        BitDepth::Sixteen => unpack_16bit(data, width),
        BitDepth::TwentyFour => unpack_24bit(data, width),
        BitDepth::ThirtyTwo => unpack_32bit(data, width),
    }
}

/// Eight pixels per byte, most significant bit first.
fn unpack_1bit(data: &[u8], width: usize, palette: &Palette) -> Row {
    (0..width)
        .map(|x| {
            let bit = 7 - (x % 8);
            palette.lookup((data[x / 8] >> bit) & 0x01)
        })
        .collect()
}

/// Two pixels per byte, high nibble first.
fn unpack_4bit(data: &[u8], width: usize, palette: &Palette) -> Row {
    (0..width)
        .map(|x| {
            let byte = data[x / 2];
            let index = if x % 2 == 0 { byte >> 4 } else { byte & 0x0F };
            palette.lookup(index)
        })
        .collect()
}

fn unpack_8bit(data: &[u8], width: usize, palette: &Palette) -> Row {
    data[..width].iter().map(|&index| palette.lookup(index)).collect()
}

/// RGB555: `0RRRRRGG GGGBBBBB`, each channel scaled by `<< 3`.
fn unpack_16bit(data: &[u8], width: usize) -> Row {
    data.chunks_exact(2)
        .take(width)
        .map(|c| {
            let word = u16::from_le_bytes([c[0], c[1]]);
            Pixel::new(
                (((word >> 10) & 0x1F) << 3) as u8,
                (((word >> 5) & 0x1F) << 3) as u8,
                ((word & 0x1F) << 3) as u8,
            )
        })
        .collect()
}

/// Stored as B, G, R.
fn unpack_24bit(data: &[u8], width: usize) -> Row {
    data.chunks_exact(3)
        .take(width)
        .map(|c| Pixel::new(c[2], c[1], c[0]))
        .collect()
}

/// Stored as B, G, R, A; alpha is dropped.
fn unpack_32bit(data: &[u8], width: usize) -> Row {
    data.chunks_exact(4)
        .take(width)
        .map(|c| Pixel::new(c[2], c[1], c[0]))
        .collect()
}
