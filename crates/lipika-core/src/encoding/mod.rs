pub mod one_hot;
pub mod sparse;

pub use one_hot::FeatureVocabulary;
pub use sparse::{ActiveIndices, EncodingMode, FeatureVector, SparseVector};
