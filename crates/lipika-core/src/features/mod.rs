pub mod ngram;

pub use ngram::{FeatureRow, NgramContext, PAD_SYMBOL, NGRAM_SEPARATOR};
