pub mod activation;
pub mod dataset;
pub mod error;
pub mod helpers;
pub mod layer;
pub mod loss;
pub mod mlp;
pub mod params;
pub mod train;

pub use dataset::Dataset;
pub use error::{Error, Result};
pub use layer::DenseLayer;
pub use mlp::MlpClassifier;
pub use train::{EpochReport, TrainConfig, TrainReport};

/// Side length of a square input image.
pub const IMAGE_SIZE: usize = 28;
pub const INPUT_SIZE: usize = IMAGE_SIZE * IMAGE_SIZE;
pub const HIDDEN_SIZE: usize = 256;
pub const OUTPUT_SIZE: usize = 10;

/// Number of `f32` values in a saved parameter file.
pub const PARAM_COUNT: usize =
    INPUT_SIZE * HIDDEN_SIZE + HIDDEN_SIZE + HIDDEN_SIZE * OUTPUT_SIZE + OUTPUT_SIZE;
pub const PARAM_BYTES: usize = PARAM_COUNT * std::mem::size_of::<f32>();
