//! Adaptive palette encoding.
//!
//! [`AdaptiveEncoder`] is the port for encoders that choose their own palette
//! and compression. The core only buffers the stream, normalizes it to
//! top-down order and detects whether it is grayscale. [`GifBackend`] is the
//! concrete backend, built on the `image` crate's GIF encoder.

use std::io::Write;
use std::path::Path;

use image::codecs::gif::GifEncoder;
use image::ExtendedColorType;
use tracing::{debug, instrument};

use super::{buffer_rows, write_file};
use super::types::EncodeError;
use crate::raster::{ImageStream, Pixel};

/// Whether every pixel of a frame is gray.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ColorMode {
    Grayscale,
    Color,
}

/// Encoder that owns palette selection and the final compressed format.
pub trait AdaptiveEncoder {
    /// Encode `pixels` (top-down, row-major, `width * height` entries).
    fn encode_adaptive(
        &self,
        pixels: &[Pixel],
        width: u32,
        height: u32,
        mode: ColorMode,
    ) -> Result<Vec<u8>, EncodeError>;
}

/// A fully buffered image in top-down order, ready for an adaptive encoder.
#[derive(Debug, Clone, PartialEq)]
pub struct AdaptiveFrame {
    pub pixels: Vec<Pixel>,
    pub width: u32,
    pub height: u32,
    pub mode: ColorMode,
}

impl AdaptiveFrame {
    /// Hand this frame to `encoder` and return the bytes it produced.
    pub fn encode_with<E: AdaptiveEncoder + ?Sized>(&self, encoder: &E) -> Result<Vec<u8>, EncodeError> {
        encoder.encode_adaptive(&self.pixels, self.width, self.height, self.mode)
    }
}

/// Buffer a stream into a top-down frame and detect its color mode.
pub fn buffer_frame(stream: ImageStream) -> Result<AdaptiveFrame, EncodeError> {
    let (metadata, mut rows) = buffer_rows(stream)?;
    if !metadata.orientation.is_top_down() {
        rows.reverse();
    }

    let mut pixels = Vec::with_capacity(metadata.pixel_count() as usize);
    for row in rows {
        pixels.extend(row);
    }
    let mode = if pixels.iter().all(|p| p.is_gray()) {
        ColorMode::Grayscale
    } else {
        ColorMode::Color
    };

    Ok(AdaptiveFrame {
        pixels,
        width: metadata.width,
        height: metadata.height,
        mode,
    })
}

/// Buffer `stream`, encode it with `encoder` and write the bytes to `path`.
///
/// The file is only created once encoding succeeded, and removed again if
/// writing it fails.
#[instrument(skip(stream, encoder, path), fields(path = %path.as_ref().display()))]
pub fn encode_adaptive<P, E>(stream: ImageStream, encoder: &E, path: P) -> Result<(), EncodeError>
where
    P: AsRef<Path>,
    E: AdaptiveEncoder + ?Sized,
{
    let frame = buffer_frame(stream)?;
    let bytes = frame.encode_with(encoder)?;
    debug!(mode = ?frame.mode, bytes = bytes.len(), "Adaptive encoding finished");
    write_file(path.as_ref(), |writer| Ok(writer.write_all(&bytes)?))
}

/// GIF output through `image::codecs::gif`.
///
/// Images with at most 256 distinct colors get an exact palette; anything
/// else is reduced by the encoder's NeuQuant pass, whose effort is set by
/// `speed` (1 = best quality, 30 = fastest).
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GifBackend {
    speed: i32,
}

impl GifBackend {
    pub const DEFAULT_SPEED: i32 = 10;

    /// Create a backend with the given NeuQuant speed.
    ///
    /// # Arguments
    ///
    /// * `speed` - Quantizer effort, clamped to `1..=30`
    pub fn new(speed: i32) -> Self {
        Self {
            speed: speed.clamp(1, 30),
        }
    }

    pub fn speed(&self) -> i32 {
        self.speed
    }
}

impl Default for GifBackend {
    fn default() -> Self {
        Self::new(Self::DEFAULT_SPEED)
    }
}

impl AdaptiveEncoder for GifBackend {
    fn encode_adaptive(
        &self,
        pixels: &[Pixel],
        width: u32,
        height: u32,
        mode: ColorMode,
    ) -> Result<Vec<u8>, EncodeError> {
        if u16::try_from(width).is_err() || u16::try_from(height).is_err() {
            return Err(EncodeError::DimensionsTooLarge { width, height });
        }

        let rgb: Vec<u8> = pixels.iter().flat_map(|p| [p.r, p.g, p.b]).collect();

        // A gray frame never has more than 256 colors, so quantizer effort is wasted.
        let speed = match mode {
            ColorMode::Grayscale => 30,
            ColorMode::Color => self.speed,
        };

        let mut buffer = Vec::new();
        {
            let mut encoder = GifEncoder::new_with_speed(&mut buffer, speed);
            encoder
                .encode(&rgb, width, height, ExtendedColorType::Rgb8)
                .map_err(|e| EncodeError::Backend(e.to_string()))?;
        }
        Ok(buffer)
    }
}
