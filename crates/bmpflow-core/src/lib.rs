//! BMPFlow Core - streaming raster codec and transformation pipeline
//!
//! This crate decodes uncompressed BMP files into a lazy stream of pixel rows,
//! pushes that stream through composable transformations, and writes the
//! result back out as a 24-bit or 8-bit (median-cut quantized) BMP, or hands
//! it to an adaptive palette encoder such as GIF.
//!
//! # Data Flow
//!
//! ```text
//! decode ──▶ transform* ──▶ encode (24-bit streams, 8-bit buffers + quantizes)
//!                       └──▶ adaptive encoder (buffers, normalizes to top-down)
//! ```
//!
//! Evaluation is pull-based: nothing is read from the source until a sink
//! starts consuming rows.
//!
//! # Examples
//!
//! ```ignore
//! use bmpflow_core::pipeline::{execute, write_bmp};
//! use bmpflow_core::transform::{flip_horizontal, grayscale};
//!
//! let input = bmpflow_core::decode::decode("photo.bmp")?;
//! let pipeline = bmpflow_core::pipe![flip_horizontal, grayscale];
//! execute(input, &[pipeline], &write_bmp(8, "gray.bmp"))?;
//! ```

pub mod config;
pub mod decode;
pub mod encode;
pub mod header;
pub mod luminance;
pub mod pipeline;
pub mod quantize;
pub mod raster;
pub mod transform;

pub use config::{OutputSpec, PipelineSpec, TransformSpec};
pub use decode::{decode, decode_reader, decode_with_options, DecodeError, DecodeOptions};
pub use encode::{encode, encode_to_writer, AdaptiveEncoder, ColorMode, EncodeError, GifBackend};
pub use pipeline::{execute, make_writer, run, write_bmp, write_gif, PipelineError, Sink};
pub use quantize::{quantize, Quantized};
pub use raster::{BitDepth, ImageStream, Metadata, Orientation, Palette, Pixel, Row};
pub use transform::{compose, pipe, IntoTransform, Transform};
