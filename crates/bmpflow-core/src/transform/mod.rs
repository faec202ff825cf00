//! Stream transformations and their composition.
//!
//! A transformation maps one [`ImageStream`](crate::raster::ImageStream) to
//! another. Two kinds exist:
//!
//! - Streaming: [`flip_horizontal`], [`grayscale`] and [`brightness`] touch one
//!   row at a time.
//! - Buffering: [`flip_vertical`] must hold every row before it can emit the
//!   first one.
//!
//! # Composition
//!
//! - [`compose`] applies right-to-left: `compose([f, g])(x) == f(g(x))`
//! - [`pipe`] applies left-to-right: `pipe([f, g])(x) == g(f(x))`
//!
//! Both return a [`Transform`]. Applying it only wraps iterators, so no row is
//! read until a sink pulls from the result.

mod color;
mod combine;
mod flip;

pub use color::{brightness, grayscale};
pub use combine::{compose, pipe, IntoTransform, Transform};
pub use flip::{flip_horizontal, flip_vertical};
