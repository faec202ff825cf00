//! Streaming row reader.
//!
//! [`BmpRowReader`] parses the headers and color table eagerly in
//! [`BmpRowReader::new`], then yields one row per `next()` call in file order.
//! It holds a single row buffer; the underlying reader is released when the
//! row reader is dropped.

use std::io::{self, Read};

use tracing::{debug, warn};

use super::types::{DecodeError, DecodeOptions, TruncationPolicy};
use super::unpack::unpack_row;
use crate::header::{read_color_table, BmpHeader};
use crate::raster::{Metadata, Palette, RowResult};

/// Pull-based row iterator over BMP pixel data.
pub struct BmpRowReader<R> {
    reader: R,
    metadata: Metadata,
    palette: Palette,
    buffer: Vec<u8>,
    rows_read: u32,
    truncation: TruncationPolicy,
    finished: bool,
}

impl<R: Read> BmpRowReader<R> {
    /// Parse the headers and color table and position the reader at the
    /// first row of pixel data.
    pub fn new(mut reader: R, options: &DecodeOptions) -> Result<Self, DecodeError> {
        let header = BmpHeader::read(&mut reader)?;
        let metadata = header.metadata()?;

        let palette = if metadata.bit_depth.is_indexed() {
            read_color_table(&mut reader, metadata.bit_depth.palette_len())?
        } else {
            Palette::default()
        };

        let data_start = header.data_start(palette.len());
        let offset = header.pixel_offset as u64;
        if offset < data_start {
            return Err(DecodeError::InvalidPixelOffset {
                offset: header.pixel_offset,
                minimum: data_start,
            });
        }

        // Gap bytes between the color table and the pixel data.
        let gap = offset - data_start;
        if gap > 0 {
            let skipped = io::copy(&mut (&mut reader).take(gap), &mut io::sink())?;
            debug!(gap, skipped, "Skipped bytes before pixel data");
        }

        let stride = metadata.bit_depth.row_stride(metadata.width);
        debug!(
            width = metadata.width,
            height = metadata.height,
            bit_depth = %metadata.bit_depth,
            orientation = ?metadata.orientation,
            stride,
            "BMP row reader ready"
        );

        Ok(Self {
            reader,
            metadata,
            palette,
            buffer: vec![0u8; stride],
            rows_read: 0,
            truncation: options.truncation,
            finished: false,
        })
    }

    pub fn metadata(&self) -> &Metadata {
        &self.metadata
    }

    /// Color table for indexed depths; empty otherwise.
    pub fn palette(&self) -> &Palette {
        &self.palette
    }

    /// Number of rows produced so far.
    pub fn rows_read(&self) -> u32 {
        self.rows_read
    }

    fn read_row(&mut self) -> Option<RowResult> {
        if self.finished || self.rows_read >= self.metadata.height {
            return None;
        }

        match self.reader.read_exact(&mut self.buffer) {
            Ok(()) => {
                self.rows_read += 1;
                Some(Ok(unpack_row(
                    &self.buffer,
                    self.metadata.width as usize,
                    self.metadata.bit_depth,
                    &self.palette,
                )))
            }
            Err(e) if e.kind() == io::ErrorKind::UnexpectedEof => {
                self.finished = true;
                self.truncated()
            }
            Err(e) => {
                self.finished = true;
                Some(Err(DecodeError::Io(e)))
            }
        }
    }

    fn truncated(&self) -> Option<RowResult> {
        let expected = self.metadata.height;
        let actual = self.rows_read;
        match self.truncation {
            TruncationPolicy::Stop => {
                warn!(expected, actual, "Pixel data ended early; stopping stream");
                None
            }
            TruncationPolicy::Error => Some(Err(DecodeError::TruncatedPixelData { expected, actual })),
        }
    }
}

impl<R: Read> Iterator for BmpRowReader<R> {
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        self.read_row()
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        if self.finished {
            return (0, Some(0));
        }
        let remaining = self.metadata.height.saturating_sub(self.rows_read) as usize;
        (0, Some(remaining))
    }
}
