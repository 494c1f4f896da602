//! Train-from-data workflow: aligned words in, frozen model out.

use std::ops::ControlFlow;
use std::path::Path;

use anyhow::Context;
use lipika_core::{decode_best, Result, TransliterationModel};
use tracing::info;

use crate::data::{build_examples, load_aligned_dataset, AlignedWord};
use crate::perceptron::{EpochReport, StructuredPerceptron, TrainerConfig};

/// A trained model plus how it was obtained.
#[derive(Debug, Clone)]
pub struct TrainingRun {
    pub model: TransliterationModel,
    pub epochs: usize,
    pub seed: u64,
}

/// Exact-match rates of a model over aligned words.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct Accuracy {
    pub words: usize,
    pub words_correct: usize,
    pub symbols: usize,
    pub symbols_correct: usize,
}

impl Accuracy {
    pub fn word_accuracy(&self) -> f64 {
        ratio(self.words_correct, self.words)
    }

    pub fn symbol_accuracy(&self) -> f64 {
        ratio(self.symbols_correct, self.symbols)
    }
}

fn ratio(hits: usize, total: usize) -> f64 {
    if total == 0 { 0.0 } else { hits as f64 / total as f64 }
}

#[derive(Debug, Clone, Default)]
pub struct Trainer {
    config: TrainerConfig,
}

impl Trainer {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train a model on aligned words.
    pub fn train(&self, words: &[AlignedWord]) -> Result<TrainingRun> {
        self.train_with(words, |_| ControlFlow::Continue(()))
    }

    /// Train, forwarding each finished epoch to `on_epoch`.
    pub fn train_with<F>(&self, words: &[AlignedWord], on_epoch: F) -> Result<TrainingRun>
    where
        F: FnMut(&EpochReport) -> ControlFlow<()>,
    {
        let context = self.config.context();
        let (vocabulary, examples) = build_examples(words, context, self.config.encoding)?;
        info!(
            words = examples.len(),
            order = context.order(),
            features = vocabulary.dimension(),
            "encoded training data"
        );

        let trained = StructuredPerceptron::new(self.config.clone()).fit_with(&examples, on_epoch)?;
        let model = TransliterationModel::new(
            context,
            vocabulary,
            trained.classes,
            trained.params,
            self.config.encoding,
        )?;
        Ok(TrainingRun {
            model,
            epochs: trained.epochs,
            seed: trained.seed,
        })
    }

    /// Load aligned words from `path` and train on them.
    pub fn train_on_file<P: AsRef<Path>>(&self, path: P) -> anyhow::Result<TrainingRun> {
        let path = path.as_ref();
        let words = load_aligned_dataset(path)
            .with_context(|| format!("reading training data {}", path.display()))?;
        if words.is_empty() {
            anyhow::bail!("no training words found in {}", path.display());
        }
        info!(words = words.len(), path = %path.display(), "loaded training data");
        Ok(self.train(&words)?)
    }
}

/// Score single-best output of `model` against aligned words.
pub fn evaluate(model: &TransliterationModel, words: &[AlignedWord]) -> Result<Accuracy> {
    let mut acc = Accuracy::default();
    for word in words {
        let emissions = model.emissions(&word.source)?;
        let predicted = decode_best(&emissions, &model.params().chain)?.labels;
        // Outputs never seen in training cannot be predicted.
        let gold: Vec<Option<usize>> = word.target.iter().map(|s| model.classes().id(s)).collect();

        let hits = predicted
            .iter()
            .zip(&gold)
            .filter(|&(p, g)| Some(*p) == *g)
            .count();
        acc.words += 1;
        acc.symbols += gold.len();
        acc.symbols_correct += hits;
        if hits == gold.len() && predicted.len() == gold.len() {
            acc.words_correct += 1;
        }
    }
    Ok(acc)
}
