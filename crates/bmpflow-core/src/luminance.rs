//! Luminance calculation using ITU-R BT.601 coefficients.
//!
//! The grayscale transformation replaces every pixel with its luma value
//! replicated into all three channels.

use crate::raster::Pixel;

/// ITU-R BT.601 red weight, in thousandths.
pub const LUMINANCE_R: u32 = 299;

/// ITU-R BT.601 green weight, in thousandths.
pub const LUMINANCE_G: u32 = 587;

/// ITU-R BT.601 blue weight, in thousandths.
pub const LUMINANCE_B: u32 = 114;

const WEIGHT_SCALE: u32 = LUMINANCE_R + LUMINANCE_G + LUMINANCE_B;

/// Calculate luminance from u8 RGB values (0 to 255).
///
/// The weighted sum is computed exactly in integers, so exact halves always
/// round up.
///
/// # Arguments
/// * `r`, `g`, `b` - Channel values
///
/// # Returns
/// Luminance rounded to the nearest integer (0-255)
#[inline]
pub fn calculate_luminance_u8(r: u8, g: u8, b: u8) -> u8 {
    let weighted = LUMINANCE_R * r as u32 + LUMINANCE_G * g as u32 + LUMINANCE_B * b as u32;
    ((weighted + WEIGHT_SCALE / 2) / WEIGHT_SCALE) as u8
}

/// Luma of a pixel.
#[inline]
pub fn pixel_luminance(pixel: Pixel) -> u8 {
    calculate_luminance_u8(pixel.r, pixel.g, pixel.b)
}
