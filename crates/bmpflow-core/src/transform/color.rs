//! Per-pixel color transforms. All of them stream row by row.

use crate::luminance::pixel_luminance;
use crate::raster::{ImageStream, Pixel};

use super::combine::Transform;

/// Replace every pixel with its BT.601 luminance.
pub fn grayscale(stream: ImageStream) -> ImageStream {
    stream.map_rows(|row| row.into_iter().map(|p| Pixel::gray(pixel_luminance(p))).collect())
}

/// Scale every channel by `factor`, clamped to 0..=255 and rounded.
pub fn brightness(factor: f32) -> Transform {
    Transform::named(format!("brightness({factor})"), move |stream: ImageStream| {
        stream.map_rows(move |row| row.into_iter().map(|p| scale_pixel(p, factor)).collect())
    })
}

fn scale_pixel(pixel: Pixel, factor: f32) -> Pixel {
    Pixel::new(
        scale_channel(pixel.r, factor),
        scale_channel(pixel.g, factor),
        scale_channel(pixel.b, factor),
    )
}

#[inline]
fn scale_channel(value: u8, factor: f32) -> u8 {
    (value as f32 * factor).clamp(0.0, 255.0).round() as u8
}
