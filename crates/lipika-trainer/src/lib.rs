//! # Lipika Trainer
//!
//! Averaged structured perceptron training for Lipika models, plus the
//! aligned training-data format and the JSON model files read by the
//! command-line tools and [`io::JsonModelLoader`].

pub mod data;
pub mod io;
pub mod perceptron;
pub mod trainer;
pub mod update;

use tracing_subscriber::EnvFilter;

// Re-export primary API
pub use data::{build_examples, load_aligned_dataset, parse_aligned, split_symbols, AlignedWord};
pub use io::{load_model, save_model, JsonModelLoader};
pub use perceptron::{
    EpochReport, StructuredPerceptron, TrainedParameters, TrainerConfig, TrainingExample,
};
pub use trainer::{evaluate, Accuracy, Trainer, TrainingRun};
pub use update::SparseUpdate;

/// Install the stderr log subscriber used by the binaries.
///
/// `RUST_LOG` wins when set; otherwise `verbose` picks the level
/// (0 = info, 1+ = debug).
pub fn init_tracing(verbose: u8) {
    let default_level = if verbose == 0 { "info" } else { "debug" };
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_level));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}
