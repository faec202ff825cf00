//! Shared raster value types.
//!
//! Everything that flows between the decoder, the transformations and the
//! sinks is defined here: pixels, rows, palettes, image metadata and the
//! [`ImageStream`] that ties metadata to a lazy sequence of rows.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::decode::DecodeError;

/// Maximum number of entries in a palette.
pub const MAX_PALETTE_LEN: usize = 256;

/// A single RGB pixel. There is no alpha channel.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub struct Pixel {
    pub r: u8,
    pub g: u8,
    pub b: u8,
}

impl Pixel {
    pub const BLACK: Pixel = Pixel::new(0, 0, 0);
    pub const WHITE: Pixel = Pixel::new(255, 255, 255);

    pub const fn new(r: u8, g: u8, b: u8) -> Self {
        Self { r, g, b }
    }

    /// A neutral gray with all three channels set to `value`.
    pub const fn gray(value: u8) -> Self {
        Self::new(value, value, value)
    }

    /// Returns true when R, G and B are equal.
    #[inline]
    pub fn is_gray(self) -> bool {
        self.r == self.g && self.g == self.b
    }

    /// Squared Euclidean distance in RGB space.
    #[inline]
    pub fn distance_squared(self, other: Pixel) -> u32 {
        let dr = self.r as i32 - other.r as i32;
        let dg = self.g as i32 - other.g as i32;
        let db = self.b as i32 - other.b as i32;
        (dr * dr + dg * dg + db * db) as u32
    }
}

impl From<(u8, u8, u8)> for Pixel {
    fn from((r, g, b): (u8, u8, u8)) -> Self {
        Self::new(r, g, b)
    }
}

/// One row of pixels; its length equals the image width.
pub type Row = Vec<Pixel>;

/// One row of palette indices on the indexed encode path.
pub type IndexRow = Vec<u8>;

/// An ordered color table of at most [`MAX_PALETTE_LEN`] entries.
///
/// The position of a color is its index.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub struct Palette {
    colors: Vec<Pixel>,
}

impl Palette {
    /// Build a palette from colors in index order.
    ///
    /// Entries past [`MAX_PALETTE_LEN`] are dropped.
    pub fn new(mut colors: Vec<Pixel>) -> Self {
        debug_assert!(colors.len() <= MAX_PALETTE_LEN, "palette too long");
        colors.truncate(MAX_PALETTE_LEN);
        Self { colors }
    }

    /// The fixed 256-entry ramp `(i, i, i)`.
    pub fn grayscale_ramp() -> Self {
        Self {
            colors: (0..=255u8).map(Pixel::gray).collect(),
        }
    }

    /// Pad with black up to the full 256 entries.
    pub fn padded(mut self) -> Self {
        self.colors.resize(MAX_PALETTE_LEN, Pixel::BLACK);
        self
    }

    /// Number of entries, at most [`MAX_PALETTE_LEN`].
    pub fn len(&self) -> usize {
        self.colors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.colors.is_empty()
    }

    /// Color stored at `index`.
    ///
    /// # Arguments
    ///
    /// * `index` - Palette index as it appears in an indexed row
    ///
    /// # Returns
    ///
    /// The color, or `None` when `index` is not below [`Palette::len`].
    pub fn get(&self, index: u8) -> Option<Pixel> {
        self.colors.get(index as usize).copied()
    }

    /// Color at `index`, or black when the index is past the end.
    #[inline]
    pub fn lookup(&self, index: u8) -> Pixel {
        self.get(index).unwrap_or(Pixel::BLACK)
    }

    /// All entries in index order, without padding.
    pub fn colors(&self) -> &[Pixel] {
        &self.colors
    }

    pub fn iter(&self) -> impl Iterator<Item = &Pixel> {
        self.colors.iter()
    }
}

/// Row storage order in the container.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Orientation {
    /// The last visual row is stored first (positive height field).
    #[default]
    BottomUp,
    /// The first visual row is stored first (negative height field).
    TopDown,
}

impl Orientation {
    /// Orientation implied by the sign of a header height field.
    pub fn from_height(height: i32) -> Self {
        if height < 0 {
            Orientation::TopDown
        } else {
            Orientation::BottomUp
        }
    }

    #[inline]
    pub fn is_top_down(self) -> bool {
        self == Orientation::TopDown
    }
}

/// Bits per pixel of the container pixel data.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "u16", into = "u16")]
pub enum BitDepth {
    One,
    Four,
    Eight,
    Sixteen,
    TwentyFour,
    ThirtyTwo,
}

impl BitDepth {
    /// Bits per pixel as stored in the header.
    pub fn bits(self) -> u16 {
        match self {
            BitDepth::One => 1,
            BitDepth::Four => 4,
            BitDepth::Eight => 8,
            BitDepth::Sixteen => 16,
            BitDepth::TwentyFour => 24,
            BitDepth::ThirtyTwo => 32,
        }
    }

    /// Indexed depths carry a color table; the others store RGB directly.
    pub fn is_indexed(self) -> bool {
        self.bits() <= 8
    }

    /// Number of color table entries: `2^bits` for indexed depths, else 0.
    pub fn palette_len(self) -> usize {
        if self.is_indexed() {
            1 << self.bits()
        } else {
            0
        }
    }

    /// Padded byte length of one row of `width` pixels.
    pub fn row_stride(self, width: u32) -> usize {
        row_stride(self.bits(), width)
    }
}

impl TryFrom<u16> for BitDepth {
    type Error = u16;

    fn try_from(bits: u16) -> Result<Self, Self::Error> {
        match bits {
            1 => Ok(BitDepth::One),
            4 => Ok(BitDepth::Four),
            8 => Ok(BitDepth::Eight),
            16 => Ok(BitDepth::Sixteen),
            24 => Ok(BitDepth::TwentyFour),
            32 => Ok(BitDepth::ThirtyTwo),
            other => Err(other),
        }
    }
}

impl From<BitDepth> for u16 {
    fn from(depth: BitDepth) -> Self {
        depth.bits()
    }
}

impl fmt::Display for BitDepth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-bit", self.bits())
    }
}

/// Byte length of one stored row: `ceil(bits * width / 32) * 4`.
#[inline]
pub fn row_stride(bits_per_pixel: u16, width: u32) -> usize {
    (bits_per_pixel as usize * width as usize).div_ceil(32) * 4
}

/// Image metadata, produced once at the start of a stream.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Metadata {
    /// Width in pixels.
    pub width: u32,
    /// Height in pixels, always non-negative.
    pub height: u32,
    /// Bit depth of the source pixel data.
    pub bit_depth: BitDepth,
    /// Storage order of the rows in the stream.
    pub orientation: Orientation,
}

impl Metadata {
    pub fn new(width: u32, height: u32, bit_depth: BitDepth, orientation: Orientation) -> Self {
        Self {
            width,
            height,
            bit_depth,
            orientation,
        }
    }

    /// Total number of pixels, `width * height`, widened so it cannot overflow.
    pub fn pixel_count(&self) -> u64 {
        self.width as u64 * self.height as u64
    }
}

/// Item yielded by an [`ImageStream`].
pub type RowResult = Result<Row, DecodeError>;

/// Boxed row iterator behind an [`ImageStream`].
pub type RowIter = Box<dyn Iterator<Item = RowResult>>;

/// Metadata followed by a lazy, fallible sequence of rows in stream order.
///
/// Rows are only produced when the stream is pulled. Transformations wrap
/// the row iterator; they never run ahead of the consumer unless they must
/// see the whole image.
pub struct ImageStream {
    metadata: Metadata,
    rows: RowIter,
}

impl ImageStream {
    /// Pair `metadata` with a row iterator. Nothing is pulled here.
    pub fn new<I>(metadata: Metadata, rows: I) -> Self
    where
        I: Iterator<Item = RowResult> + 'static,
    {
        Self {
            metadata,
            rows: Box::new(rows),
        }
    }

    /// A stream over rows that are already in memory.
    pub fn from_rows(metadata: Metadata, rows: Vec<Row>) -> Self {
        Self::new(metadata, rows.into_iter().map(Ok))
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Replace every successfully produced row with `f(row)`, one at a time.
    pub fn map_rows<F>(self, mut f: F) -> Self
    where
        F: FnMut(Row) -> Row + 'static,
    {
        let metadata = self.metadata;
        Self::new(metadata, self.rows.map(move |row| row.map(&mut f)))
    }

    /// Replace the row iterator as a whole, keeping the metadata.
    pub fn with_rows<F, I>(self, f: F) -> Self
    where
        F: FnOnce(RowIter) -> I,
        I: Iterator<Item = RowResult> + 'static,
    {
        let metadata = self.metadata;
        Self::new(metadata, f(self.rows))
    }

    /// Pull every remaining row into memory.
    pub fn collect_rows(self) -> Result<(Metadata, Vec<Row>), DecodeError> {
        let metadata = self.metadata;
        let rows = self.rows.collect::<Result<Vec<_>, _>>()?;
        Ok((metadata, rows))
    }
}

impl Iterator for ImageStream {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.rows.next()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.rows.size_hint()
    }
}

impl fmt::Debug for ImageStream {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("ImageStream")
            .field("metadata", &self.metadata)
            .finish_non_exhaustive()
    }
}
