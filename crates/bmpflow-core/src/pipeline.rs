//! Decode, transform, write.
//!
//! [`run_with_options`] is the only pipeline primitive: it decodes an input
//! file, applies the transforms left-to-right and hands the lazy result to a
//! [`Sink`]. The sink drives evaluation by pulling rows. [`from_file`],
//! [`from_file_with_transforms`] and [`with_transforms`] fix some of its
//! arguments and call it with the rest.

use std::path::{Path, PathBuf};

use thiserror::Error;
use tracing::{debug, instrument};

use crate::decode::{decode_with_options, DecodeError, DecodeOptions};
use crate::encode::{encode, encode_adaptive, EncodeError, GifBackend};
use crate::raster::ImageStream;
use crate::transform::{pipe, Transform};

/// Errors surfaced by a pipeline run.
#[derive(Debug, Error)]
pub enum PipelineError {
    #[error(transparent)]
    Decode(#[from] DecodeError),

    #[error(transparent)]
    Encode(#[from] EncodeError),
}

/// Final consumer of a stream.
pub trait Sink {
    fn write(&self, stream: ImageStream) -> Result<(), PipelineError>;
}

impl<F> Sink for F
where
    F: Fn(ImageStream) -> Result<(), PipelineError>,
{
    fn write(&self, stream: ImageStream) -> Result<(), PipelineError> {
        self(stream)
    }
}

/// Writes BMP files at a fixed bit depth.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BmpWriter {
    bit_depth: u16,
    path: PathBuf,
}

impl BmpWriter {
    /// Requested output depth, validated only when the sink writes.
    pub fn bit_depth(&self) -> u16 {
        self.bit_depth
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for BmpWriter {
    fn write(&self, stream: ImageStream) -> Result<(), PipelineError> {
        encode(stream, self.bit_depth, &self.path)?;
        Ok(())
    }
}

/// Sink that encodes BMP at `bit_depth` (8 or 24) to `path`.
///
/// The depth is checked when the sink writes, before the file is created.
pub fn write_bmp<P: AsRef<Path>>(bit_depth: u16, path: P) -> BmpWriter {
    BmpWriter {
        bit_depth,
        path: path.as_ref().to_path_buf(),
    }
}

/// Writes GIF files through the adaptive port.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct GifWriter {
    backend: GifBackend,
    path: PathBuf,
}

impl GifWriter {
    /// Replace the default backend, e.g. to trade speed for palette quality.
    pub fn with_backend(mut self, backend: GifBackend) -> Self {
        self.backend = backend;
        self
    }

    pub fn backend(&self) -> &GifBackend {
        &self.backend
    }

    pub fn path(&self) -> &Path {
        &self.path
    }
}

impl Sink for GifWriter {
    fn write(&self, stream: ImageStream) -> Result<(), PipelineError> {
        encode_adaptive(stream, &self.backend, &self.path)?;
        Ok(())
    }
}

/// Sink that encodes GIF to `path` through the adaptive port.
///
/// # Arguments
///
/// * `path` - Output file; created only after encoding succeeded
///
/// # Returns
///
/// A [`GifWriter`] using the default [`GifBackend`]. Use
/// [`GifWriter::with_backend`] to change the quantizer speed.
pub fn write_gif<P: AsRef<Path>>(path: P) -> GifWriter {
    GifWriter {
        backend: GifBackend::default(),
        path: path.as_ref().to_path_buf(),
    }
}

/// Fix the bit depth of a writer constructor, leaving only the path.
///
/// ```ignore
/// let bmp8 = make_writer(write_bmp, 8);
/// execute(stream, &[], &bmp8("out.bmp".into()))?;
/// ```
pub fn make_writer<W, S>(writer: W, bit_depth: u16) -> impl Fn(PathBuf) -> S
where
    W: Fn(u16, PathBuf) -> S,
{
    move |path| writer(bit_depth, path)
}

/// Apply `transforms` left-to-right to an already open stream and write the
/// result to `sink`.
pub fn execute<S>(input: ImageStream, transforms: &[Transform], sink: &S) -> Result<(), PipelineError>
where
    S: Sink + ?Sized,
{
    let transform = pipe(transforms.iter().cloned());
    debug!(transform = transform.name(), "Executing pipeline");
    sink.write(transform.apply(input))
}

/// [`run_with_options`] with default decoder options.
pub fn run<P, S>(input: P, transforms: &[Transform], sink: &S) -> Result<(), PipelineError>
where
    P: AsRef<Path>,
    S: Sink + ?Sized,
{
    run_with_options(input, transforms, sink, &DecodeOptions::default())
}

/// Decode `input`, apply `transforms` and write the result to `sink`.
///
/// # Arguments
///
/// * `input` - Path of the BMP file to read
/// * `transforms` - Applied left-to-right
/// * `sink` - Receives the transformed stream and pulls its rows
/// * `options` - Decoder options, e.g. the truncation policy
///
/// # Returns
///
/// The first decode or encode error, or `Ok(())` once the sink finished.
#[instrument(skip_all, fields(input = %input.as_ref().display(), transforms = transforms.len()))]
pub fn run_with_options<P, S>(
    input: P,
    transforms: &[Transform],
    sink: &S,
    options: &DecodeOptions,
) -> Result<(), PipelineError>
where
    P: AsRef<Path>,
    S: Sink + ?Sized,
{
    let stream = decode_with_options(input, options)?;
    execute(stream, transforms, sink)
}

/// Fix the input file; transforms and sink are supplied per call.
pub fn from_file<P: AsRef<Path>>(
    input: P,
) -> impl Fn(&[Transform], &dyn Sink) -> Result<(), PipelineError> {
    let input = input.as_ref().to_path_buf();
    move |transforms: &[Transform], sink: &dyn Sink| run(&input, transforms, sink)
}

/// Fix the input file and transforms; the sink is supplied per call.
pub fn from_file_with_transforms<P: AsRef<Path>>(
    input: P,
    transforms: Vec<Transform>,
) -> impl Fn(&dyn Sink) -> Result<(), PipelineError> {
    let input = input.as_ref().to_path_buf();
    move |sink: &dyn Sink| run(&input, &transforms, sink)
}

/// Fix the transforms; input and sink are supplied per call.
pub fn with_transforms(transforms: Vec<Transform>) -> impl Fn(&Path, &dyn Sink) -> Result<(), PipelineError> {
    move |input: &Path, sink: &dyn Sink| run(input, &transforms, sink)
}
