//! # Lipika Core
//!
//! Sequence-labeling engine behind character-level transliteration. A word,
//! already normalized into symbols by a script codec, becomes n-gram context
//! features, one-hot vectors, linear emission scores and finally a decoded
//! class sequence (Viterbi for the single best, beam search for k-best).
//!
//! ## Quick Start
//!
//! ```rust
//! use lipika_core::decode::{decode_best, decode_k, ChainParams};
//!
//! let emissions = vec![vec![5.0, 1.0], vec![1.0, 5.0], vec![5.0, 1.0]];
//! let chain = ChainParams::zeros(2);
//!
//! let best = decode_best(&emissions, &chain).unwrap();
//! assert_eq!(best.labels, vec![0, 1, 0]);
//! assert_eq!(best.score, 15.0);
//!
//! let ranked = decode_k(&emissions, &chain, 3).unwrap();
//! assert_eq!(ranked[0], best);
//! ```
pub mod decode;
pub mod encoding;
pub mod error;
pub mod features;
pub mod model;
pub mod repository;
pub mod scoring;

// Re-export primary API
pub use decode::{
    decode_best, decode_k, sequence_score, BeamSearchDecoder, ChainParams, DecodeStrategy,
    ScoredSequence, ViterbiDecoder,
};
pub use encoding::{EncodingMode, FeatureVector, FeatureVocabulary, SparseVector};
pub use error::{LipikaError, Result};
pub use features::{FeatureRow, NgramContext};
pub use model::{ClassAlphabet, ModelParameters, TransliterationModel};
pub use repository::{LanguagePair, ModelLoader, ModelRepository};
pub use scoring::{Emissions, WeightMatrix};
