//! Serializable pipeline descriptions.
//!
//! A front end (CLI flags, a config file, a job queue) only has to produce a
//! [`PipelineSpec`]; running it goes through the same pipeline primitive as
//! the programmatic API.
//!
//! ```json
//! {
//!   "input": "in.bmp",
//!   "transforms": [{ "op": "flip_horizontal" }, { "op": "brightness", "factor": 1.2 }],
//!   "output": { "format": "bmp", "bit_depth": 8, "path": "out.bmp" }
//! }
//! ```

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::decode::DecodeOptions;
use crate::encode::OutputDepth;
use crate::pipeline::{run_with_options, write_bmp, write_gif, PipelineError, Sink};
use crate::transform::{brightness, flip_horizontal, flip_vertical, grayscale, Transform};

/// One transformation step.
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
#[serde(tag = "op", rename_all = "snake_case")]
pub enum TransformSpec {
    FlipHorizontal,
    FlipVertical,
    Grayscale,
    Brightness { factor: f32 },
}

impl TransformSpec {
    /// Build the named transform this description stands for.
    pub fn to_transform(&self) -> Transform {
        match *self {
            TransformSpec::FlipHorizontal => Transform::named("flip_horizontal", flip_horizontal),
            TransformSpec::FlipVertical => Transform::named("flip_vertical", flip_vertical),
            TransformSpec::Grayscale => Transform::named("grayscale", grayscale),
            TransformSpec::Brightness { factor } => brightness(factor),
        }
    }
}

/// Where and how the result is written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "format", rename_all = "snake_case")]
pub enum OutputSpec {
    Bmp { bit_depth: OutputDepth, path: PathBuf },
    Gif { path: PathBuf },
}

impl OutputSpec {
    /// Sink that writes to the described path and format.
    pub fn sink(&self) -> Box<dyn Sink> {
        match self {
            OutputSpec::Bmp { bit_depth, path } => Box::new(write_bmp(bit_depth.bits(), path)),
            OutputSpec::Gif { path } => Box::new(write_gif(path)),
        }
    }
}

/// A complete decode, transform, write job.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PipelineSpec {
    pub input: PathBuf,
    #[serde(default)]
    pub transforms: Vec<TransformSpec>,
    pub output: OutputSpec,
    #[serde(default)]
    pub decode: DecodeOptions,
}

impl PipelineSpec {
    pub fn transforms(&self) -> Vec<Transform> {
        self.transforms.iter().map(TransformSpec::to_transform).collect()
    }

    /// Decode `input`, apply `transforms` in order and write `output`.
    ///
    /// # Returns
    ///
    /// `Ok(())` once the output file is complete. Decode options from
    /// `decode` apply to the input.
    pub fn run(&self) -> Result<(), PipelineError> {
        let sink = self.output.sink();
        run_with_options(&self.input, &self.transforms(), sink.as_ref(), &self.decode)
    }
}
