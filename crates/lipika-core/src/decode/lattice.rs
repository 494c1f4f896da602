//! Chain parameters shared by every decoder, and the sequence scoring
//! function they maximize:
//!
//! ```text
//! score(y) = init[y0] + terminal[y(T-1)] + Σ_t emission[t][yt] + Σ_t trans[y(t-1)][yt]
//! ```

use serde::{Deserialize, Serialize};

use crate::error::{LipikaError, Result};

/// Transition and boundary biases of a linear-chain model.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawChain")]
pub struct ChainParams {
    /// `transitions[prev][curr]`: bonus for moving from `prev` to `curr`.
    pub transitions: Vec<Vec<f64>>,
    /// Bias applied to the class at the first position.
    pub initial: Vec<f64>,
    /// Bias applied to the class at the last position.
    pub terminal: Vec<f64>,
}

#[derive(Deserialize)]
struct RawChain {
    transitions: Vec<Vec<f64>>,
    initial: Vec<f64>,
    terminal: Vec<f64>,
}

impl TryFrom<RawChain> for ChainParams {
    type Error = LipikaError;

    fn try_from(raw: RawChain) -> Result<Self> {
        Self::new(raw.transitions, raw.initial, raw.terminal)
    }
}

impl ChainParams {
    /// All-zero biases for `n_classes` classes.
    pub fn zeros(n_classes: usize) -> Self {
        Self {
            transitions: vec![vec![0.0; n_classes]; n_classes],
            initial: vec![0.0; n_classes],
            terminal: vec![0.0; n_classes],
        }
    }

    /// Build from explicit biases, checking that all shapes agree.
    pub fn new(transitions: Vec<Vec<f64>>, initial: Vec<f64>, terminal: Vec<f64>) -> Result<Self> {
        let chain = Self {
            transitions,
            initial,
            terminal,
        };
        chain.validate()?;
        Ok(chain)
    }

    pub fn n_classes(&self) -> usize {
        self.initial.len()
    }

    /// Check that the transition matrix is square and matches both bias vectors.
    pub fn validate(&self) -> Result<()> {
        let n = self.n_classes();
        if self.terminal.len() != n {
            return Err(LipikaError::invalid(
                "terminal",
                format!("{} biases", self.terminal.len()),
                format!("expected {n} to match the initial biases"),
            ));
        }
        if self.transitions.len() != n || self.transitions.iter().any(|row| row.len() != n) {
            return Err(LipikaError::invalid(
                "transitions",
                format!("{} rows", self.transitions.len()),
                format!("expected a {n}x{n} matrix"),
            ));
        }
        Ok(())
    }

    /// Replace every bias `b` with `f(b, o)`, `o` being the matching bias
    /// of `other`.
    pub fn zip_with(&mut self, other: &ChainParams, f: impl Fn(f64, f64) -> f64) {
        for (row, other_row) in self.transitions.iter_mut().zip(&other.transitions) {
            for (t, &o) in row.iter_mut().zip(other_row) {
                *t = f(*t, o);
            }
        }
        for (b, &o) in self.initial.iter_mut().zip(&other.initial) {
            *b = f(*b, o);
        }
        for (b, &o) in self.terminal.iter_mut().zip(&other.terminal) {
            *b = f(*b, o);
        }
    }

    /// `self += scale * other`, element-wise.
    pub fn add_scaled(&mut self, other: &ChainParams, scale: f64) {
        self.zip_with(other, |b, o| b + scale * o);
    }
}

/// A label sequence with its total score.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ScoredSequence {
    pub labels: Vec<usize>,
    pub score: f64,
}

impl ScoredSequence {
    pub fn empty() -> Self {
        Self {
            labels: Vec::new(),
            score: 0.0,
        }
    }
}

/// Check that an emission matrix fits the chain.
pub(crate) fn validate_lattice(emissions: &[Vec<f64>], chain: &ChainParams) -> Result<()> {
    chain.validate()?;
    let n = chain.n_classes();
    if !emissions.is_empty() && n == 0 {
        return Err(LipikaError::invalid(
            "n_classes",
            0,
            "at least one class is required to decode a non-empty sequence",
        ));
    }
    if let Some((pos, row)) = emissions.iter().enumerate().find(|(_, row)| row.len() != n) {
        return Err(LipikaError::invalid(
            "emissions",
            format!("row {pos} with {} scores", row.len()),
            format!("expected {n} classes"),
        ));
    }
    Ok(())
}

/// Index of the largest value; the lowest index wins ties.
pub(crate) fn argmax(values: &[f64]) -> Option<(usize, f64)> {
    let (&first, rest) = values.split_first()?;
    let mut best = (0, first);
    for (i, &v) in rest.iter().enumerate() {
        if v > best.1 {
            best = (i + 1, v);
        }
    }
    Some(best)
}

/// Score any label sequence under the chain model.
pub fn sequence_score(emissions: &[Vec<f64>], chain: &ChainParams, labels: &[usize]) -> Result<f64> {
    validate_lattice(emissions, chain)?;
    if labels.len() != emissions.len() {
        return Err(LipikaError::invalid(
            "labels",
            format!("{} labels", labels.len()),
            format!("expected one per position ({})", emissions.len()),
        ));
    }
    if let Some(&bad) = labels.iter().find(|&&c| c >= chain.n_classes()) {
        return Err(LipikaError::invalid(
            "labels",
            bad,
            format!("class id out of range 0..{}", chain.n_classes()),
        ));
    }
    let (Some(&first), Some(&last)) = (labels.first(), labels.last()) else {
        return Ok(0.0);
    };

    let mut score = chain.initial[first] + chain.terminal[last];
    for (row, &c) in emissions.iter().zip(labels) {
        score += row[c];
    }
    for pair in labels.windows(2) {
        score += chain.transitions[pair[0]][pair[1]];
    }
    Ok(score)
}
