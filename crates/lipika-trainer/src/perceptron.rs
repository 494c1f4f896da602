//! # Averaged Structured Perceptron
//!
//! Collins-style training of the linear-chain model: each example is decoded
//! with the current parameters and, on any mistake, the parameters move from
//! the predicted sequence toward the gold one. A time-weighted running sum of
//! every update gives the averaged parameters at the end without storing a
//! snapshot per step.
//!
//! Training is sequential on purpose: each update depends on the parameters
//! left behind by the previous one, and the seeded shuffle order is part of
//! the result.

use std::ops::ControlFlow;
use std::time::{SystemTime, UNIX_EPOCH};

use lipika_core::{
    decode_best, ClassAlphabet, EncodingMode, FeatureVector, LipikaError, ModelParameters,
    NgramContext, Result,
};
use oorandom::Rand64;
use tracing::{debug, info};

use crate::update::SparseUpdate;

/// Training configuration.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainerConfig {
    /// Learning rate at epoch `i` is `1 / i^lr_exp`.
    pub lr_exp: f64,
    /// Number of passes over the training set.
    pub n_iter: usize,
    /// Shuffle seed. `None` derives one from the clock.
    pub random_state: Option<u64>,
    /// 0 = quiet, 1 = iterations, 2 = error rates, 3 = first comparison per epoch.
    pub verbose: u8,
    /// N-gram context order used to build features.
    pub order: usize,
    /// Feature vector representation.
    pub encoding: EncodingMode,
}

impl Default for TrainerConfig {
    fn default() -> Self {
        Self {
            lr_exp: 0.1,
            n_iter: 15,
            random_state: None,
            verbose: 0,
            order: 4,
            encoding: EncodingMode::Sparse,
        }
    }
}

impl TrainerConfig {
    pub fn with_lr_exp(mut self, lr_exp: f64) -> Self {
        self.lr_exp = lr_exp;
        self
    }

    pub fn with_n_iter(mut self, n_iter: usize) -> Self {
        self.n_iter = n_iter;
        self
    }

    pub fn with_random_state(mut self, seed: u64) -> Self {
        self.random_state = Some(seed);
        self
    }

    pub fn with_verbose(mut self, verbose: u8) -> Self {
        self.verbose = verbose;
        self
    }

    pub fn with_order(mut self, order: usize) -> Self {
        self.order = order;
        self
    }

    pub fn with_encoding(mut self, encoding: EncodingMode) -> Self {
        self.encoding = encoding;
        self
    }

    /// Feature context described by this configuration.
    pub fn context(&self) -> NgramContext {
        NgramContext::new(self.order)
    }

    /// Reject settings that cannot train.
    pub fn validate(&self) -> Result<()> {
        if self.n_iter == 0 {
            return Err(LipikaError::invalid("n_iter", 0, "at least one iteration is required"));
        }
        if !self.lr_exp.is_finite() || self.lr_exp < 0.0 {
            return Err(LipikaError::invalid(
                "lr_exp",
                self.lr_exp,
                "must be a finite, non-negative exponent",
            ));
        }
        Ok(())
    }

    /// Learning rate for a 1-based epoch.
    pub fn learning_rate(&self, epoch: usize) -> f64 {
        1.0 / (epoch as f64).powf(self.lr_exp)
    }
}

/// One encoded word with its gold output labels, one per position.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainingExample {
    pub features: Vec<FeatureVector>,
    pub labels: Vec<String>,
}

impl TrainingExample {
    pub fn new(features: Vec<FeatureVector>, labels: Vec<String>) -> Self {
        Self { features, labels }
    }

    pub fn len(&self) -> usize {
        self.labels.len()
    }

    pub fn is_empty(&self) -> bool {
        self.labels.is_empty()
    }
}

/// Summary of one finished epoch.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EpochReport {
    /// 1-based epoch number.
    pub epoch: usize,
    pub learning_rate: f64,
    /// Mispredicted positions over the epoch.
    pub mistakes: usize,
    /// Examples that triggered an update.
    pub updated: usize,
    /// `mistakes` divided by the number of labelled positions.
    pub error_rate: f64,
}

/// Result of a training run.
#[derive(Debug, Clone, PartialEq)]
pub struct TrainedParameters {
    pub classes: ClassAlphabet,
    /// Averaged parameters.
    pub params: ModelParameters,
    /// Epochs actually run.
    pub epochs: usize,
    /// Seed the shuffles were drawn from.
    pub seed: u64,
}

/// Averaged structured perceptron trainer.
#[derive(Debug, Clone, Default)]
pub struct StructuredPerceptron {
    config: TrainerConfig,
}

impl StructuredPerceptron {
    pub fn new(config: TrainerConfig) -> Self {
        Self { config }
    }

    pub fn config(&self) -> &TrainerConfig {
        &self.config
    }

    /// Train for the configured number of epochs.
    pub fn fit(&self, examples: &[TrainingExample]) -> Result<TrainedParameters> {
        self.fit_with(examples, |_| ControlFlow::Continue(()))
    }

    /// Train, reporting each finished epoch to `on_epoch`.
    ///
    /// Returning [`ControlFlow::Break`] stops after the current epoch; the
    /// parameters are averaged over the epochs that ran.
    pub fn fit_with<F>(&self, examples: &[TrainingExample], mut on_epoch: F) -> Result<TrainedParameters>
    where
        F: FnMut(&EpochReport) -> ControlFlow<()>,
    {
        let config = &self.config;
        config.validate()?;
        let n_features = check_examples(examples)?;

        let classes = ClassAlphabet::from_labels(examples.iter().flat_map(|ex| ex.labels.iter()));
        let gold: Vec<Vec<usize>> = examples
            .iter()
            .map(|ex| {
                classes.encode(&ex.labels).ok_or_else(|| {
                    LipikaError::invalid("labels", ex.labels.join(" "), "label missing from alphabet")
                })
            })
            .collect::<Result<_>>()?;
        let n_positions: usize = gold.iter().map(Vec::len).sum();

        let seed = config.random_state.unwrap_or_else(clock_seed);
        let mut rng = Rand64::new(u128::from(seed));
        debug!(
            examples = examples.len(),
            classes = classes.len(),
            features = n_features,
            seed,
            "starting perceptron training"
        );

        let mut params = ModelParameters::zeros(classes.len(), n_features);
        let mut sums = ModelParameters::zeros(classes.len(), n_features);
        let mut avg_count = 1.0;
        let mut order: Vec<usize> = (0..examples.len()).collect();
        let mut epochs = 0;

        for epoch in 1..=config.n_iter {
            let lr = config.learning_rate(epoch);
            if config.verbose >= 1 {
                info!(epoch, n_iter = config.n_iter, lr, "perceptron iteration");
            }
            shuffle(&mut order, &mut rng);

            let mut mistakes = 0;
            let mut updated = 0;
            for (step, &i) in order.iter().enumerate() {
                let example = &examples[i];
                let emissions = params.emissions(&example.features)?;
                let predicted = decode_best(&emissions, &params.chain)?.labels;

                if config.verbose >= 3 && step == 0 {
                    let shown = classes.decode(&predicted)?;
                    debug!(epoch, predicted = ?shown, gold = ?example.labels, "first comparison");
                }

                let wrong = predicted.iter().zip(&gold[i]).filter(|(p, g)| p != g).count();
                if wrong == 0 {
                    continue;
                }
                mistakes += wrong;
                updated += 1;

                let update = SparseUpdate::from_mistake(&example.features, &predicted, &gold[i]);
                update.apply(&mut params, lr, 1.0);
                update.apply(&mut sums, lr, avg_count);
            }
            avg_count += 1.0;
            epochs = epoch;

            let report = EpochReport {
                epoch,
                learning_rate: lr,
                mistakes,
                updated,
                error_rate: mistakes as f64 / n_positions as f64,
            };
            if config.verbose >= 2 {
                info!(epoch, mistakes, error_rate = report.error_rate, "train-set error");
            }
            if on_epoch(&report).is_break() {
                info!(epoch, "training stopped early");
                break;
            }
        }

        params.subtract_average(&sums, avg_count);
        debug!(epochs, "perceptron training finished");
        Ok(TrainedParameters {
            classes,
            params,
            epochs,
            seed,
        })
    }
}

/// Check every example before any parameter is touched; returns the
/// feature dimension.
fn check_examples(examples: &[TrainingExample]) -> Result<usize> {
    if examples.is_empty() {
        return Err(LipikaError::invalid("examples", 0, "training set is empty"));
    }
    let mut dimension = None;
    for (i, example) in examples.iter().enumerate() {
        if example.features.len() != example.labels.len() {
            return Err(LipikaError::invalid(
                "examples",
                format!("example {i}"),
                format!(
                    "{} feature rows but {} labels",
                    example.features.len(),
                    example.labels.len()
                ),
            ));
        }
        for x in &example.features {
            match dimension {
                None => dimension = Some(x.dim()),
                Some(d) if d != x.dim() => {
                    return Err(LipikaError::invalid(
                        "examples",
                        format!("example {i}"),
                        format!("feature dimension {} differs from {d}", x.dim()),
                    ));
                }
                Some(_) => {}
            }
        }
    }
    dimension.ok_or_else(|| LipikaError::invalid("examples", examples.len(), "no labelled positions"))
}

/// Fisher-Yates shuffle driven by the seeded generator.
fn shuffle(order: &mut [usize], rng: &mut Rand64) {
    for i in (1..order.len()).rev() {
        let j = rng.rand_range(0..(i as u64 + 1)) as usize;
        order.swap(i, j);
    }
}

fn clock_seed() -> u64 {
    let seed = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_nanos() as u64)
        .unwrap_or_default();
    info!(seed, "no random_state given, seeding shuffles from the clock");
    seed
}
