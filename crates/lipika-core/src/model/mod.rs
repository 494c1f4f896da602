pub mod alphabet;
pub mod params;
pub mod transliterator;

pub use alphabet::ClassAlphabet;
pub use params::ModelParameters;
pub use transliterator::TransliterationModel;
