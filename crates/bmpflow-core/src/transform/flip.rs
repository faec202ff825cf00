//! Horizontal and vertical flips.

use crate::raster::{ImageStream, Row, RowResult};

/// Reverse the pixel order within every row. Streams row by row.
pub fn flip_horizontal(stream: ImageStream) -> ImageStream {
    stream.map_rows(|mut row| {
        row.reverse();
        row
    })
}

/// Reverse the row order.
///
/// Nothing is read until the first row is requested; at that point the
/// whole remaining source is buffered.
pub fn flip_vertical(stream: ImageStream) -> ImageStream {
    stream.with_rows(ReversedRows::new)
}

/// Buffers its source on first pull and replays it back to front.
struct ReversedRows<I> {
    source: Option<I>,
    buffered: Vec<Row>,
}

impl<I> ReversedRows<I> {
    fn new(source: I) -> Self {
        Self {
            source: Some(source),
            buffered: Vec::new(),
        }
    }
}

impl<I> Iterator for ReversedRows<I>
where
    I: Iterator<Item = RowResult>,
{
    type Item = RowResult;

    fn next(&mut self) -> Option<Self::Item> {
        if let Some(source) = self.source.take() {
            for row in source {
                match row {
                    Ok(row) => self.buffered.push(row),
                    Err(e) => {
                        self.buffered.clear();
                        return Some(Err(e));
                    }
                }
            }
        }
        self.buffered.pop().map(Ok)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::decode::DecodeError;
    use crate::raster::{BitDepth, Metadata, Orientation, Pixel};
    use std::cell::Cell;
    use std::rc::Rc;

    fn meta(width: u32, height: u32) -> Metadata {
        Metadata::new(width, height, BitDepth::TwentyFour, Orientation::BottomUp)
    }

    fn px(v: u8) -> Pixel {
        Pixel::new(v, 0, 0)
    }

    #[test]
    fn test_flip_horizontal() {
        let rows = vec![vec![px(1), px(2), px(3)], vec![px(4), px(5), px(6)]];
        let (metadata, flipped) = flip_horizontal(ImageStream::from_rows(meta(3, 2), rows))
            .collect_rows()
            .unwrap();

        assert_eq!(metadata, meta(3, 2));
        assert_eq!(flipped, vec![vec![px(3), px(2), px(1)], vec![px(6), px(5), px(4)]]);
    }

    #[test]
    fn test_flip_vertical() {
        let rows = vec![vec![px(1)], vec![px(2)], vec![px(3)]];
        let (metadata, flipped) = flip_vertical(ImageStream::from_rows(meta(1, 3), rows))
            .collect_rows()
            .unwrap();

        assert_eq!(metadata.orientation, Orientation::BottomUp);
        assert_eq!(flipped, vec![vec![px(3)], vec![px(2)], vec![px(1)]]);
    }

    #[test]
    fn test_flip_vertical_is_lazy() {
        let pulls = Rc::new(Cell::new(0));
        let counter = Rc::clone(&pulls);
        let source = (0..4u8).map(move |v| {
            counter.set(counter.get() + 1);
            Ok(vec![px(v)])
        });

        let mut stream = flip_vertical(ImageStream::new(meta(1, 4), source));
        assert_eq!(pulls.get(), 0);

        assert_eq!(stream.next().unwrap().unwrap(), vec![px(3)]);
        assert_eq!(pulls.get(), 4);
    }

    #[test]
    fn test_flip_vertical_propagates_error() {
        let rows: Vec<RowResult> = vec![
            Ok(vec![px(1)]),
            Err(DecodeError::TruncatedPixelData { expected: 3, actual: 1 }),
        ];
        let mut stream = flip_vertical(ImageStream::new(meta(1, 3), rows.into_iter()));

        assert!(matches!(stream.next(), Some(Err(DecodeError::TruncatedPixelData { .. }))));
        assert!(stream.next().is_none());
    }
}

#[cfg(test)]
mod proptests {
    use super::*;
    use crate::raster::{BitDepth, Metadata, Orientation, Pixel};
    use proptest::prelude::*;

    fn image() -> impl Strategy<Value = Vec<Row>> {
        (0usize..=6, 0usize..=6).prop_flat_map(|(w, h)| {
            let pixel = any::<(u8, u8, u8)>().prop_map(Pixel::from);
            prop::collection::vec(prop::collection::vec(pixel, w..=w), h..=h)
        })
    }

    fn stream(rows: &[Row]) -> ImageStream {
        let width = rows.first().map_or(0, |r| r.len() as u32);
        let meta = Metadata::new(width, rows.len() as u32, BitDepth::TwentyFour, Orientation::TopDown);
        ImageStream::from_rows(meta, rows.to_vec())
    }

    proptest! {
        /// Property: flipping horizontally twice restores the image.
        #[test]
        fn prop_flip_horizontal_twice(rows in image()) {
            let (_, out) = flip_horizontal(flip_horizontal(stream(&rows))).collect_rows().unwrap();
            prop_assert_eq!(out, rows);
        }

        /// Property: flipping vertically twice restores the image.
        #[test]
        fn prop_flip_vertical_twice(rows in image()) {
            let (_, out) = flip_vertical(flip_vertical(stream(&rows))).collect_rows().unwrap();
            prop_assert_eq!(out, rows);
        }
    }
}
