//! # Transliteration Model
//!
//! Inference pipeline over one frozen model: symbols are turned into n-gram
//! context rows, one-hot encoded, scored linearly and decoded over the class
//! lattice. Symbols arrive already normalized by the script codec.

use serde::{Deserialize, Serialize};
use tracing::trace;

use crate::decode::{decode_best, DecodeStrategy, ScoredSequence};
use crate::encoding::{EncodingMode, FeatureVector, FeatureVocabulary};
use crate::error::{LipikaError, Result};
use crate::features::{NgramContext, PAD_SYMBOL};
use crate::model::{ClassAlphabet, ModelParameters};
use crate::scoring::Emissions;

/// A trained model for one ordered language pair.
///
/// Immutable once built; share it behind an `Arc` for concurrent decoding.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "ModelParts")]
pub struct TransliterationModel {
    context: NgramContext,
    vocabulary: FeatureVocabulary,
    classes: ClassAlphabet,
    params: ModelParameters,
    encoding: EncodingMode,
}

/// Stored model components, assembled through [`TransliterationModel::new`].
#[derive(Deserialize)]
struct ModelParts {
    context: NgramContext,
    vocabulary: FeatureVocabulary,
    classes: ClassAlphabet,
    params: ModelParameters,
    #[serde(default)]
    encoding: EncodingMode,
}

impl TryFrom<ModelParts> for TransliterationModel {
    type Error = LipikaError;

    fn try_from(parts: ModelParts) -> Result<Self> {
        Self::new(
            parts.context,
            parts.vocabulary,
            parts.classes,
            parts.params,
            parts.encoding,
        )
    }
}

impl TransliterationModel {
    /// Assemble a model, checking that every component agrees on its shape.
    pub fn new(
        context: NgramContext,
        vocabulary: FeatureVocabulary,
        classes: ClassAlphabet,
        params: ModelParameters,
        encoding: EncodingMode,
    ) -> Result<Self> {
        if vocabulary.arity() != 0 && vocabulary.arity() != context.arity() {
            return Err(LipikaError::invalid(
                "vocabulary",
                format!("{} columns", vocabulary.arity()),
                format!("context of order {} yields {} columns", context.order(), context.arity()),
            ));
        }
        if vocabulary.dimension() != params.n_features() {
            return Err(LipikaError::invalid(
                "params",
                format!("{} features", params.n_features()),
                format!("vocabulary has {} feature ids", vocabulary.dimension()),
            ));
        }
        if classes.len() != params.n_classes() {
            return Err(LipikaError::invalid(
                "params",
                format!("{} classes", params.n_classes()),
                format!("alphabet has {} classes", classes.len()),
            ));
        }
        Ok(Self {
            context,
            vocabulary,
            classes,
            params,
            encoding,
        })
    }

    pub fn context(&self) -> NgramContext {
        self.context
    }

    pub fn vocabulary(&self) -> &FeatureVocabulary {
        &self.vocabulary
    }

    pub fn classes(&self) -> &ClassAlphabet {
        &self.classes
    }

    pub fn params(&self) -> &ModelParameters {
        &self.params
    }

    /// Feature vectors for a word, ready for scoring.
    pub fn encode<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<FeatureVector> {
        let rows = self.context.extract(symbols);
        self.vocabulary.transform(&rows, self.encoding)
    }

    /// Emission matrix for a word.
    pub fn emissions<S: AsRef<str>>(&self, symbols: &[S]) -> Result<Emissions> {
        self.params.emissions(&self.encode(symbols))
    }

    /// Decode a word with the given strategy.
    pub fn decode<S: AsRef<str>>(
        &self,
        symbols: &[S],
        strategy: &DecodeStrategy,
    ) -> Result<Vec<ScoredSequence>> {
        let emissions = self.emissions(symbols)?;
        let decoded = strategy.decode(&emissions, &self.params.chain)?;
        trace!(len = symbols.len(), %strategy, hypotheses = decoded.len(), "decoded word");
        Ok(decoded)
    }

    /// Render class ids as output text, dropping placeholder output.
    pub fn render(&self, labels: &[usize]) -> Result<String> {
        Ok(self.classes.decode(labels)?.concat().replace(PAD_SYMBOL, ""))
    }

    /// Single best transliteration of a word.
    pub fn transliterate<S: AsRef<str>>(&self, symbols: &[S]) -> Result<String> {
        let emissions = self.emissions(symbols)?;
        let best = decode_best(&emissions, &self.params.chain)?;
        self.render(&best.labels)
    }

    /// The `k_best` best transliterations of a word, best first.
    pub fn top_k<S: AsRef<str>>(&self, symbols: &[S], k_best: usize) -> Result<Vec<String>> {
        let strategy = DecodeStrategy::beam_search(k_best)?;
        self.decode(symbols, &strategy)?
            .iter()
            .map(|seq| self.render(&seq.labels))
            .collect()
    }
}
