use thiserror::Error;

/// Errors that can occur during Lipika core operations.
///
/// Out-of-vocabulary feature values are deliberately absent: they contribute
/// nothing to an encoded vector and are never reported.
#[derive(Debug, Error)]
pub enum LipikaError {
    /// A caller-supplied argument is outside its valid domain.
    #[error("invalid argument `{name}` = {value}: {reason}")]
    InvalidArgument {
        /// Name of the offending parameter.
        name: &'static str,
        /// Rendered value of the offending parameter.
        value: String,
        /// What the parameter was expected to satisfy.
        reason: String,
    },

    /// The decoder name did not match any known strategy.
    #[error("unknown decoder {0:?} (expected \"viterbi\" or \"beamsearch\")")]
    UnknownDecoder(String),

    /// The language pair cannot be handled by a learned model.
    #[error("language pair `{source_lang}-{target_lang}` is not supported")]
    UnsupportedPair {
        /// Source language code.
        source_lang: String,
        /// Target language code.
        target_lang: String,
    },

    /// The model for a language pair could not be loaded.
    #[error("failed to load model: {0}")]
    ModelLoad(String),
}

impl LipikaError {
    /// Shorthand for building an [`LipikaError::InvalidArgument`].
    pub fn invalid(
        name: &'static str,
        value: impl ToString,
        reason: impl Into<String>,
    ) -> Self {
        Self::InvalidArgument {
            name,
            value: value.to_string(),
            reason: reason.into(),
        }
    }
}

/// Result type alias for Lipika operations.
pub type Result<T> = std::result::Result<T, LipikaError>;
