//! # Linear Emission Scoring
//!
//! Per-position, per-class scores `W[c] · x` computed by touching only the
//! set bits of each binary feature vector.

use serde::{Deserialize, Serialize};

use crate::encoding::FeatureVector;
use crate::error::{LipikaError, Result};

/// Emission matrix of shape `[seq_len][n_classes]`.
pub type Emissions = Vec<Vec<f64>>;

/// Class-major weight matrix of shape `n_classes × n_features`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(try_from = "RawWeights")]
pub struct WeightMatrix {
    n_classes: usize,
    n_features: usize,
    data: Vec<f64>,
}

/// Unchecked serialized form of [`WeightMatrix`].
#[derive(Deserialize)]
struct RawWeights {
    n_classes: usize,
    n_features: usize,
    data: Vec<f64>,
}

impl TryFrom<RawWeights> for WeightMatrix {
    type Error = LipikaError;

    fn try_from(raw: RawWeights) -> Result<Self> {
        let expected = raw.n_classes.checked_mul(raw.n_features);
        if expected != Some(raw.data.len()) {
            return Err(LipikaError::invalid(
                "weights",
                format!("{} values", raw.data.len()),
                format!(
                    "shape {} x {} needs n_classes * n_features values",
                    raw.n_classes, raw.n_features
                ),
            ));
        }
        Ok(Self {
            n_classes: raw.n_classes,
            n_features: raw.n_features,
            data: raw.data,
        })
    }
}

impl WeightMatrix {
    /// All-zero weights.
    pub fn zeros(n_classes: usize, n_features: usize) -> Self {
        Self {
            n_classes,
            n_features,
            data: vec![0.0; n_classes * n_features],
        }
    }

    /// Build from one row of weights per class.
    pub fn from_rows(rows: Vec<Vec<f64>>) -> Result<Self> {
        let n_classes = rows.len();
        let n_features = rows.first().map_or(0, Vec::len);
        let mut data = Vec::with_capacity(n_classes * n_features);
        for (c, row) in rows.into_iter().enumerate() {
            if row.len() != n_features {
                return Err(LipikaError::invalid(
                    "rows",
                    format!("class {c} with {} weights", row.len()),
                    format!("every class row must have {n_features} weights"),
                ));
            }
            data.extend(row);
        }
        Ok(Self {
            n_classes,
            n_features,
            data,
        })
    }

    pub fn n_classes(&self) -> usize {
        self.n_classes
    }

    pub fn n_features(&self) -> usize {
        self.n_features
    }

    /// Weights of class `class`.
    pub fn row(&self, class: usize) -> &[f64] {
        let start = class * self.n_features;
        &self.data[start..start + self.n_features]
    }

    pub fn get(&self, class: usize, feature: usize) -> f64 {
        self.data[class * self.n_features + feature]
    }

    /// Add `delta` to a single weight.
    pub fn add_at(&mut self, class: usize, feature: usize, delta: f64) {
        self.data[class * self.n_features + feature] += delta;
    }

    /// Replace every weight `w` with `f(w, o)`, `o` being the matching
    /// weight of `other`.
    pub fn zip_with(&mut self, other: &WeightMatrix, f: impl Fn(f64, f64) -> f64) {
        debug_assert_eq!(self.data.len(), other.data.len());
        for (w, &o) in self.data.iter_mut().zip(&other.data) {
            *w = f(*w, o);
        }
    }

    /// `self += scale * other`, element-wise.
    pub fn add_scaled(&mut self, other: &WeightMatrix, scale: f64) {
        self.zip_with(other, |w, o| w + scale * o);
    }

    /// Score every class for one encoded position. `x` must have
    /// `n_features` dimensions; [`WeightMatrix::emissions`] checks that.
    pub(crate) fn score(&self, x: &FeatureVector) -> Vec<f64> {
        let active: Vec<usize> = x.active_indices().collect();
        (0..self.n_classes)
            .map(|c| {
                let row = self.row(c);
                active.iter().map(|&j| row[j]).sum()
            })
            .collect()
    }

    /// Emission matrix for a whole sequence.
    pub fn emissions(&self, xs: &[FeatureVector]) -> Result<Emissions> {
        if let Some(x) = xs.iter().find(|x| x.dim() != self.n_features) {
            return Err(LipikaError::invalid(
                "features",
                format!("vector of dimension {}", x.dim()),
                format!("model expects {} features", self.n_features),
            ));
        }
        Ok(xs.iter().map(|x| self.score(x)).collect())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::encoding::{EncodingMode, SparseVector};

    fn weights() -> WeightMatrix {
        WeightMatrix::from_rows(vec![
            vec![1.0, 2.0, 3.0, 4.0],
            vec![-1.0, 0.5, 0.0, 10.0],
        ])
        .unwrap()
    }

    #[test]
    fn test_score_sparse_and_dense_agree() {
        let w = weights();
        let sparse = FeatureVector::Sparse(SparseVector::from_indices(4, vec![0, 3]).unwrap());
        let dense = sparse.clone().into_mode(EncodingMode::Dense);
        assert_eq!(w.score(&sparse), vec![5.0, 9.0]);
        assert_eq!(w.score(&dense), vec![5.0, 9.0]);
    }

    #[test]
    fn test_emissions_shape() {
        let w = weights();
        let xs = vec![
            FeatureVector::Sparse(SparseVector::from_indices(4, vec![1]).unwrap()),
            FeatureVector::Sparse(SparseVector::zeros(4)),
            FeatureVector::Dense(vec![true, true, true, true]),
        ];
        let em = w.emissions(&xs).unwrap();
        assert_eq!(em, vec![vec![2.0, 0.5], vec![0.0, 0.0], vec![10.0, 9.5]]);
    }

    #[test]
    fn test_emissions_rejects_dimension_mismatch() {
        let w = weights();
        let xs = vec![FeatureVector::Sparse(SparseVector::zeros(3))];
        assert!(w.emissions(&xs).is_err());

        let xs = vec![
            FeatureVector::Dense(vec![true; 4]),
            FeatureVector::Sparse(SparseVector::from_indices(9, vec![8]).unwrap()),
        ];
        assert!(w.emissions(&xs).is_err());
    }

    #[test]
    fn test_add_scaled_and_add_at() {
        let mut w = WeightMatrix::zeros(2, 4);
        w.add_at(1, 3, 2.0);
        w.add_scaled(&weights(), 0.5);
        assert_eq!(w.get(0, 1), 1.0);
        assert_eq!(w.get(1, 3), 7.0);
        assert_eq!(w.row(1), &[-0.5, 0.25, 0.0, 7.0]);
    }

    #[test]
    fn test_deserialize_checks_shape() {
        let json = serde_json::to_value(weights()).unwrap();
        let back: WeightMatrix = serde_json::from_value(json.clone()).unwrap();
        assert_eq!(back, weights());

        let mut short = json.clone();
        short["data"] = serde_json::json!([1.0, 2.0]);
        let err = serde_json::from_value::<WeightMatrix>(short).unwrap_err();
        assert!(err.to_string().contains("weights"));

        let mut wide = json;
        wide["n_features"] = serde_json::json!(usize::MAX);
        assert!(serde_json::from_value::<WeightMatrix>(wide).is_err());
    }

    #[test]
    fn test_from_rows_rejects_ragged() {
        assert!(WeightMatrix::from_rows(vec![vec![1.0], vec![1.0, 2.0]]).is_err());
    }
}
