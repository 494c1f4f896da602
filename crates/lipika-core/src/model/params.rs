use serde::{Deserialize, Serialize};

use crate::decode::ChainParams;
use crate::encoding::FeatureVector;
use crate::error::{LipikaError, Result};
use crate::scoring::{Emissions, WeightMatrix};

/// Emission weights plus chain biases: everything the decoders consume.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawParameters")]
pub struct ModelParameters {
    pub weights: WeightMatrix,
    pub chain: ChainParams,
}

#[derive(Deserialize)]
struct RawParameters {
    weights: WeightMatrix,
    chain: ChainParams,
}

impl TryFrom<RawParameters> for ModelParameters {
    type Error = LipikaError;

    fn try_from(raw: RawParameters) -> Result<Self> {
        Self::new(raw.weights, raw.chain)
    }
}

impl ModelParameters {
    /// Combine weights and biases that agree on the class count.
    pub fn new(weights: WeightMatrix, chain: ChainParams) -> Result<Self> {
        chain.validate()?;
        if weights.n_classes() != chain.n_classes() {
            return Err(LipikaError::invalid(
                "weights",
                format!("{} classes", weights.n_classes()),
                format!("chain biases cover {} classes", chain.n_classes()),
            ));
        }
        Ok(Self { weights, chain })
    }

    /// All-zero parameters.
    pub fn zeros(n_classes: usize, n_features: usize) -> Self {
        Self {
            weights: WeightMatrix::zeros(n_classes, n_features),
            chain: ChainParams::zeros(n_classes),
        }
    }

    pub fn n_classes(&self) -> usize {
        self.weights.n_classes()
    }

    pub fn n_features(&self) -> usize {
        self.weights.n_features()
    }

    /// Emission matrix for an encoded sequence.
    pub fn emissions(&self, xs: &[FeatureVector]) -> Result<Emissions> {
        self.weights.emissions(xs)
    }

    /// `self += scale * other` over every parameter.
    pub fn add_scaled(&mut self, other: &ModelParameters, scale: f64) {
        self.weights.add_scaled(&other.weights, scale);
        self.chain.add_scaled(&other.chain, scale);
    }

    /// `self -= sums / count` over every parameter: turns the current
    /// parameters plus time-weighted update sums into averaged parameters.
    pub fn subtract_average(&mut self, sums: &ModelParameters, count: f64) {
        self.weights.zip_with(&sums.weights, |w, s| w - s / count);
        self.chain.zip_with(&sums.chain, |b, s| b - s / count);
    }
}
