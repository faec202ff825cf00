//! Median-cut color quantization to a 256-entry palette.
//!
//! Three strategies are tried in order:
//! 1. **Grayscale ramp** - every pixel has R=G=B, so the palette is `(i, i, i)`
//!    and each index is the pixel's gray level.
//! 2. **Exact colors** - at most 256 distinct colors; the palette holds them in
//!    first-seen order, padded with black, and pixels map by direct lookup.
//! 3. **Median cut** - repeatedly split the bucket with the widest channel
//!    range at its median until 256 buckets exist, then map every pixel to the
//!    nearest bucket mean.
//!
//! The output depends only on the input pixel sequence. Ties in bucket
//! selection go to the earliest bucket, ties in channel choice prefer
//! red over green over blue, and ties in nearest-color search go to the
//! lowest palette index.

use std::collections::HashMap;

use tracing::debug;

use crate::raster::{IndexRow, Palette, Pixel, Row, MAX_PALETTE_LEN};

/// Which path produced the palette.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum QuantizeStrategy {
    GrayscaleRamp,
    ExactColors,
    MedianCut,
}

/// Palette plus one index row per input row.
#[derive(Debug, Clone)]
pub struct Quantized {
    pub palette: Palette,
    pub indices: Vec<IndexRow>,
    pub strategy: QuantizeStrategy,
}

impl Quantized {
    /// Expand the index rows back into pixels through the palette.
    pub fn reconstruct(&self) -> Vec<Row> {
        self.indices
            .iter()
            .map(|row| row.iter().map(|&i| self.palette.lookup(i)).collect())
            .collect()
    }
}

/// Quantize a fully materialized true-color image.
///
/// # Arguments
///
/// * `rows` - Every row of the image, in stream order
///
/// # Returns
///
/// A [`Quantized`] whose palette is the grayscale ramp when every pixel is
/// gray, the exact colors when there are at most 256 of them, and a
/// median-cut palette otherwise. `indices` has the same shape as `rows`.
pub fn quantize(rows: &[Row]) -> Quantized {
    let quantized = if rows.iter().flatten().all(|p| p.is_gray()) {
        quantize_grayscale(rows)
    } else if let Some(colors) = distinct_colors(rows, MAX_PALETTE_LEN) {
        quantize_exact(rows, colors)
    } else {
        quantize_median_cut(rows)
    };

    debug!(
        strategy = ?quantized.strategy,
        rows = rows.len(),
        "Quantized image to 256-color palette"
    );
    quantized
}

fn quantize_grayscale(rows: &[Row]) -> Quantized {
    Quantized {
        palette: Palette::grayscale_ramp(),
        indices: rows
            .iter()
            .map(|row| row.iter().map(|p| p.r).collect())
            .collect(),
        strategy: QuantizeStrategy::GrayscaleRamp,
    }
}

/// Distinct colors in first-seen order with their index, or `None` once
/// more than `limit` colors have been seen.
fn distinct_colors(rows: &[Row], limit: usize) -> Option<HashMap<Pixel, u8>> {
    let mut colors = HashMap::new();
    for &pixel in rows.iter().flatten() {
        if !colors.contains_key(&pixel) {
            if colors.len() == limit {
                return None;
            }
            let index = colors.len() as u8;
            colors.insert(pixel, index);
        }
    }
    Some(colors)
}

fn quantize_exact(rows: &[Row], colors: HashMap<Pixel, u8>) -> Quantized {
    let mut entries = vec![Pixel::BLACK; colors.len()];
    for (&pixel, &index) in &colors {
        entries[index as usize] = pixel;
    }

    // Every pixel was inserted while collecting, so the lookup always hits.
    let indices = rows
        .iter()
        .map(|row| row.iter().map(|p| colors.get(p).copied().unwrap_or(0)).collect())
        .collect();

    Quantized {
        palette: Palette::new(entries).padded(),
        indices,
        strategy: QuantizeStrategy::ExactColors,
    }
}

fn quantize_median_cut(rows: &[Row]) -> Quantized {
    let pixels: Vec<Pixel> = rows.iter().flatten().copied().collect();
    let palette = Palette::new(median_cut(pixels, MAX_PALETTE_LEN)).padded();

    let mut cache: HashMap<Pixel, u8> = HashMap::new();
    let indices = rows
        .iter()
        .map(|row| {
            row.iter()
                .map(|&p| *cache.entry(p).or_insert_with(|| nearest_index(p, palette.colors())))
                .collect()
        })
        .collect();

    Quantized {
        palette,
        indices,
        strategy: QuantizeStrategy::MedianCut,
    }
}

/// Split `pixels` into at most `target` buckets and return their means.
///
/// Stops early, returning fewer entries, once no bucket can be split.
pub fn median_cut(pixels: Vec<Pixel>, target: usize) -> Vec<Pixel> {
    if pixels.is_empty() || target == 0 {
        return Vec::new();
    }

    let mut buckets = vec![Bucket::new(pixels)];
    while buckets.len() < target {
        let Some(index) = widest_bucket(&buckets) else {
            break;
        };
        let (lower, upper) = buckets.remove(index).split();
        buckets.push(lower);
        buckets.push(upper);
    }

    buckets.iter().map(Bucket::mean).collect()
}

/// Index of the first bucket with the greatest range that can still be split.
fn widest_bucket(buckets: &[Bucket]) -> Option<usize> {
    let mut best: Option<(usize, u8)> = None;
    for (i, bucket) in buckets.iter().enumerate() {
        if bucket.pixels.len() < 2 {
            continue;
        }
        let range = bucket.max_range();
        match best {
            Some((_, best_range)) if range <= best_range => {}
            _ => best = Some((i, range)),
        }
    }
    best.map(|(i, _)| i)
}

/// Index of the palette entry closest to `pixel`; lowest index wins ties.
pub fn nearest_index(pixel: Pixel, palette: &[Pixel]) -> u8 {
    let mut best_index = 0usize;
    let mut best_distance = u32::MAX;
    for (i, &entry) in palette.iter().enumerate() {
        let distance = pixel.distance_squared(entry);
        if distance < best_distance {
            best_distance = distance;
            best_index = i;
        }
    }
    best_index as u8
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Channel {
    Red,
    Green,
    Blue,
}

impl Channel {
    #[inline]
    fn of(self, pixel: &Pixel) -> u8 {
        match self {
            Channel::Red => pixel.r,
            Channel::Green => pixel.g,
            Channel::Blue => pixel.b,
        }
    }
}

/// A multiset of pixels used while building the palette.
struct Bucket {
    pixels: Vec<Pixel>,
    ranges: [u8; 3],
}

impl Bucket {
    fn new(pixels: Vec<Pixel>) -> Self {
        let mut min = [u8::MAX; 3];
        let mut max = [u8::MIN; 3];
        for p in &pixels {
            for (c, v) in [p.r, p.g, p.b].into_iter().enumerate() {
                min[c] = min[c].min(v);
                max[c] = max[c].max(v);
            }
        }
        let ranges = [0, 1, 2].map(|c| max[c].saturating_sub(min[c]));
        Self { pixels, ranges }
    }

    fn max_range(&self) -> u8 {
        self.ranges.into_iter().max().unwrap_or(0)
    }

    fn widest_channel(&self) -> Channel {
        let [r, g, b] = self.ranges;
        if r >= g && r >= b {
            Channel::Red
        } else if g >= b {
            Channel::Green
        } else {
            Channel::Blue
        }
    }

    /// Stable-sort along the widest channel and cut at `len / 2`.
    fn split(mut self) -> (Bucket, Bucket) {
        let channel = self.widest_channel();
        self.pixels.sort_by_key(|p| channel.of(p));
        let upper = self.pixels.split_off(self.pixels.len() / 2);
        (Bucket::new(self.pixels), Bucket::new(upper))
    }

    /// Per-channel mean, truncated.
    fn mean(&self) -> Pixel {
        let count = self.pixels.len() as u64;
        if count == 0 {
            return Pixel::BLACK;
        }
        let (r, g, b) = self.pixels.iter().fold((0u64, 0u64, 0u64), |(r, g, b), p| {
            (r + p.r as u64, g + p.g as u64, b + p.b as u64)
        });
        Pixel::new((r / count) as u8, (g / count) as u8, (b / count) as u8)
    }
}


// ============================================================================
// Property-Based Tests
// ============================================================================
