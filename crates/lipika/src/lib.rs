//! # Lipika
//!
//! Character-level transliteration between scripts, framed as sequence
//! labeling: one output class per input symbol, scored by a linear model
//! over n-gram context features and decoded with Viterbi or beam search.
//!
//! This crate bundles [`lipika_core`] (inference) and [`lipika_trainer`]
//! (training and model files).
//!
//! ```rust
//! use lipika::{split_symbols, AlignedWord, Trainer, TrainerConfig};
//!
//! let words: Vec<AlignedWord> = [("ka", ["k", "a"]), ("ak", ["a", "k"])]
//!     .iter()
//!     .map(|(src, tgt)| AlignedWord::new(split_symbols(src), tgt.iter().map(|s| s.to_string()).collect()))
//!     .collect();
//!
//! let config = TrainerConfig::default().with_order(1).with_n_iter(10).with_random_state(1);
//! let run = Trainer::new(config).train(&words).unwrap();
//! assert_eq!(run.model.transliterate(&split_symbols("kak")).unwrap(), "kak");
//! ```

pub use lipika_core::*;
pub use lipika_trainer::{
    build_examples, evaluate, load_aligned_dataset, load_model, parse_aligned, save_model,
    split_symbols, Accuracy, AlignedWord, EpochReport, JsonModelLoader, StructuredPerceptron,
    TrainedParameters, Trainer, TrainerConfig, TrainingExample, TrainingRun,
};

pub mod trainer {
    //! Training internals.
    pub use lipika_trainer::{data, io, perceptron, update};
}
