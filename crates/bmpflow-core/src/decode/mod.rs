//! BMP decoding.
//!
//! This module provides functionality for:
//! - Parsing and validating the file header, info header and color table
//! - Unpacking 1, 4, 8, 16, 24 and 32-bit rows into RGB pixels
//! - Streaming rows lazily in file order
//!
//! # Architecture
//!
//! Headers and the color table are read when the stream is created, so
//! format errors surface immediately. Pixel rows are read one at a time as
//! the consumer pulls; rows are never reordered here.
//!
//! # Examples
//!
//! ```ignore
//! use bmpflow_core::decode::decode;
//!
//! let stream = decode("photo.bmp")?;
//! println!("{}x{}", stream.metadata().width, stream.metadata().height);
//! for row in stream {
//!     let row = row?;
//!     // ...
//! }
//! ```

mod reader;
mod types;
mod unpack;

use std::fs::File;
use std::io::{BufReader, Read};
use std::path::Path;

use tracing::instrument;

use crate::raster::ImageStream;

pub use reader::BmpRowReader;
pub use types::{DecodeError, DecodeOptions, DecodeOptionsBuilder, TruncationPolicy};
pub use unpack::unpack_row;

/// Open a BMP file and return its metadata and lazy row stream.
pub fn decode<P: AsRef<Path>>(path: P) -> Result<ImageStream, DecodeError> {
    decode_with_options(path, &DecodeOptions::default())
}

/// Like [`decode`], with explicit decoder options.
#[instrument(skip(path, options), fields(path = %path.as_ref().display()))]
pub fn decode_with_options<P: AsRef<Path>>(
    path: P,
    options: &DecodeOptions,
) -> Result<ImageStream, DecodeError> {
    let path = path.as_ref();
    let file = File::open(path).map_err(|source| DecodeError::Open {
        path: path.to_path_buf(),
        source,
    })?;
    decode_reader(BufReader::new(file), options)
}

/// Decode from any byte source.
///
/// The source is owned by the returned stream and dropped with it.
pub fn decode_reader<R>(reader: R, options: &DecodeOptions) -> Result<ImageStream, DecodeError>
where
    R: Read + 'static,
{
    let rows = BmpRowReader::new(reader, options)?;
    let metadata = *rows.metadata();
    Ok(ImageStream::new(metadata, rows))
}
