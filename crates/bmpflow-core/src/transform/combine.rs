//! The [`Transform`] handle and its combinators.

use std::borrow::Cow;
use std::fmt;
use std::sync::Arc;

use crate::raster::ImageStream;

type TransformFn = dyn Fn(ImageStream) -> ImageStream + Send + Sync;

/// A cloneable stream-to-stream function.
///
/// Applying a transform only wraps the stream's row iterator; no row is read
/// until the result is pulled.
#[derive(Clone)]
pub struct Transform {
    name: Cow<'static, str>,
    f: Arc<TransformFn>,
}

impl Transform {
    /// Wrap a closure under the name `"custom"`.
    pub fn new<F>(f: F) -> Self
    where
        F: Fn(ImageStream) -> ImageStream + Send + Sync + 'static,
    {
        Self::named("custom", f)
    }

    /// Wrap a closure with a name used in logs and `Debug` output.
    pub fn named<N, F>(name: N, f: F) -> Self
    where
        N: Into<Cow<'static, str>>,
        F: Fn(ImageStream) -> ImageStream + Send + Sync + 'static,
    {
        Self {
            name: name.into(),
            f: Arc::new(f),
        }
    }

    /// Returns the stream unchanged.
    pub fn identity() -> Self {
        Self::named("identity", |stream| stream)
    }

    pub fn name(&self) -> &str {
        &self.name
    }

    /// Apply the transform to `stream`.
    ///
    /// # Arguments
    ///
    /// * `stream` - Input stream; its rows are not pulled
    ///
    /// # Returns
    ///
    /// The transformed stream, still lazy.
    pub fn apply(&self, stream: ImageStream) -> ImageStream {
        (self.f)(stream)
    }
}

impl fmt::Debug for Transform {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_tuple("Transform").field(&self.name).finish()
    }
}

/// Conversion into a [`Transform`], implemented for transforms and for plain
/// `Fn(ImageStream) -> ImageStream` functions.
pub trait IntoTransform {
    fn into_transform(self) -> Transform;
}

impl IntoTransform for Transform {
    fn into_transform(self) -> Transform {
        self
    }
}

impl<F> IntoTransform for F
where
    F: Fn(ImageStream) -> ImageStream + Send + Sync + 'static,
{
    fn into_transform(self) -> Transform {
        Transform::new(self)
    }
}

/// Right-to-left composition: `compose([f1, f2, f3])` is `f1(f2(f3(x)))`.
pub fn compose<I>(transforms: I) -> Transform
where
    I: IntoIterator<Item = Transform>,
{
    let mut transforms: Vec<Transform> = transforms.into_iter().collect();
    transforms.reverse();
    chain("compose", transforms)
}

/// Left-to-right composition: `pipe([f1, f2, f3])` is `f3(f2(f1(x)))`.
pub fn pipe<I>(transforms: I) -> Transform
where
    I: IntoIterator<Item = Transform>,
{
    chain("pipe", transforms.into_iter().collect())
}

/// Apply `transforms` in slice order.
fn chain(kind: &str, transforms: Vec<Transform>) -> Transform {
    let names: Vec<&str> = transforms.iter().map(Transform::name).collect();
    let name = format!("{kind}({})", names.join(", "));

    Transform::named(name, move |stream| {
        transforms.iter().fold(stream, |stream, t| t.apply(stream))
    })
}

/// Compose transforms right-to-left. Accepts [`Transform`]s and plain
/// functions alike.
///
/// ```ignore
/// let t = bmpflow_core::compose![grayscale, flip_horizontal];
/// ```
#[macro_export]
macro_rules! compose {
    ($($t:expr),* $(,)?) => {
        $crate::transform::compose([$($crate::transform::IntoTransform::into_transform($t)),*])
    };
}

/// Compose transforms left-to-right. Accepts [`Transform`]s and plain
/// functions alike.
#[macro_export]
macro_rules! pipe {
    ($($t:expr),* $(,)?) => {
        $crate::transform::pipe([$($crate::transform::IntoTransform::into_transform($t)),*])
    };
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::raster::{BitDepth, Metadata, Orientation, Pixel, Row};
    use crate::transform::{flip_horizontal, grayscale};

    fn stream(rows: Vec<Row>) -> ImageStream {
        let width = rows.first().map_or(0, |r| r.len() as u32);
        let meta = Metadata::new(width, rows.len() as u32, BitDepth::TwentyFour, Orientation::BottomUp);
        ImageStream::from_rows(meta, rows)
    }

    fn paint_red(stream: ImageStream) -> ImageStream {
        stream.map_rows(|row| vec![Pixel::new(255, 0, 0); row.len()])
    }

    fn rows_of(t: &Transform, rows: Vec<Row>) -> Vec<Row> {
        t.apply(stream(rows)).collect_rows().unwrap().1
    }

    #[test]
    fn test_compose_applies_right_to_left() {
        // paint_red(grayscale(x)) is red
        let t = compose([Transform::new(paint_red), Transform::new(grayscale)]);
        assert_eq!(rows_of(&t, vec![vec![Pixel::WHITE]]), vec![vec![Pixel::new(255, 0, 0)]]);
    }

    #[test]
    fn test_pipe_applies_left_to_right() {
        // grayscale(paint_red(x)) is gray 76
        let t = pipe([Transform::new(paint_red), Transform::new(grayscale)]);
        assert_eq!(rows_of(&t, vec![vec![Pixel::WHITE]]), vec![vec![Pixel::gray(76)]]);
    }

    #[test]
    fn test_macros_accept_functions_and_transforms() {
        let t = crate::pipe![paint_red, Transform::identity(), grayscale];
        assert_eq!(rows_of(&t, vec![vec![Pixel::BLACK]]), vec![vec![Pixel::gray(76)]]);

        let t = crate::compose![paint_red, grayscale];
        assert_eq!(rows_of(&t, vec![vec![Pixel::BLACK]]), vec![vec![Pixel::new(255, 0, 0)]]);
    }

    #[test]
    fn test_empty_composition_is_identity() {
        let rows = vec![vec![Pixel::new(1, 2, 3)]];
        assert_eq!(rows_of(&compose([]), rows.clone()), rows);
        assert_eq!(rows_of(&crate::pipe![], rows.clone()), rows);
    }

    #[test]
    fn test_names() {
        let t = pipe([
            Transform::named("flip_horizontal", flip_horizontal),
            Transform::identity(),
        ]);
        assert_eq!(t.name(), "pipe(flip_horizontal, identity)");
        assert_eq!(format!("{t:?}"), "Transform(\"pipe(flip_horizontal, identity)\")");
    }
}
