//! Binary feature vectors in sparse (index list) or dense (bit array) form.

use std::iter::Enumerate;
use std::slice;

use serde::{Deserialize, Serialize};

use crate::error::{LipikaError, Result};

/// Output representation chosen for encoded rows.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EncodingMode {
    /// Sorted list of set indices.
    #[default]
    Sparse,
    /// One boolean per feature dimension.
    Dense,
}

/// A 0/1 vector stored as its sorted, deduplicated set indices.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct SparseVector {
    dim: usize,
    indices: Vec<usize>,
}

impl SparseVector {
    /// Build a sparse vector, sorting and deduplicating `indices`.
    pub fn from_indices(dim: usize, mut indices: Vec<usize>) -> Result<Self> {
        indices.sort_unstable();
        indices.dedup();
        if let Some(&last) = indices.last() {
            if last >= dim {
                return Err(LipikaError::invalid(
                    "indices",
                    last,
                    format!("index out of range for dimension {dim}"),
                ));
            }
        }
        Ok(Self { dim, indices })
    }

    /// Wrap indices already known to be strictly increasing and below `dim`.
    pub(crate) fn from_sorted(dim: usize, indices: Vec<usize>) -> Self {
        debug_assert!(indices.windows(2).all(|w| w[0] < w[1]));
        debug_assert!(indices.last().is_none_or(|&last| last < dim));
        Self { dim, indices }
    }

    /// All-zero vector of the given dimension.
    pub fn zeros(dim: usize) -> Self {
        Self {
            dim,
            indices: Vec::new(),
        }
    }

    pub fn dim(&self) -> usize {
        self.dim
    }

    pub fn indices(&self) -> &[usize] {
        &self.indices
    }
}

/// An encoded position: the same binary content in either representation.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum FeatureVector {
    Sparse(SparseVector),
    Dense(Vec<bool>),
}

impl FeatureVector {
    /// Total dimensionality.
    pub fn dim(&self) -> usize {
        match self {
            FeatureVector::Sparse(v) => v.dim(),
            FeatureVector::Dense(bits) => bits.len(),
        }
    }

    /// Number of set bits.
    pub fn nnz(&self) -> usize {
        match self {
            FeatureVector::Sparse(v) => v.indices().len(),
            FeatureVector::Dense(bits) => bits.iter().filter(|&&b| b).count(),
        }
    }

    /// Check whether bit `index` is set.
    pub fn contains(&self, index: usize) -> bool {
        match self {
            FeatureVector::Sparse(v) => v.indices().binary_search(&index).is_ok(),
            FeatureVector::Dense(bits) => bits.get(index).copied().unwrap_or(false),
        }
    }

    /// Iterate over set indices in increasing order.
    pub fn active_indices(&self) -> ActiveIndices<'_> {
        match self {
            FeatureVector::Sparse(v) => ActiveIndices::Sparse(v.indices().iter()),
            FeatureVector::Dense(bits) => ActiveIndices::Dense(bits.iter().enumerate()),
        }
    }

    /// Convert into the requested representation.
    pub fn into_mode(self, mode: EncodingMode) -> Self {
        match (self, mode) {
            (FeatureVector::Dense(bits), EncodingMode::Sparse) => {
                let indices = bits
                    .iter()
                    .enumerate()
                    .filter_map(|(i, &b)| b.then_some(i))
                    .collect();
                FeatureVector::Sparse(SparseVector {
                    dim: bits.len(),
                    indices,
                })
            }
            (FeatureVector::Sparse(v), EncodingMode::Dense) => {
                let mut bits = vec![false; v.dim];
                for &i in &v.indices {
                    bits[i] = true;
                }
                FeatureVector::Dense(bits)
            }
            (same, _) => same,
        }
    }
}

/// Iterator over the set indices of a [`FeatureVector`].
#[derive(Debug, Clone)]
pub enum ActiveIndices<'a> {
    Sparse(slice::Iter<'a, usize>),
    Dense(Enumerate<slice::Iter<'a, bool>>),
}

impl Iterator for ActiveIndices<'_> {
    type Item = usize;

    fn next(&mut self) -> Option<usize> {
        match self {
            ActiveIndices::Sparse(it) => it.next().copied(),
            ActiveIndices::Dense(it) => it.find_map(|(i, &b)| b.then_some(i)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_from_indices_sorts_and_dedups() {
        let v = SparseVector::from_indices(8, vec![5, 1, 5, 3]).unwrap();
        assert_eq!(v.indices(), &[1, 3, 5]);
        assert_eq!(v.dim(), 8);
    }

    #[test]
    fn test_from_indices_rejects_out_of_range() {
        let err = SparseVector::from_indices(4, vec![0, 4]).unwrap_err();
        assert!(err.to_string().contains("indices"));
    }

    #[test]
    fn test_modes_carry_same_content() {
        let sparse = FeatureVector::Sparse(SparseVector::from_indices(6, vec![0, 4]).unwrap());
        let dense = sparse.clone().into_mode(EncodingMode::Dense);
        assert_eq!(
            dense,
            FeatureVector::Dense(vec![true, false, false, false, true, false])
        );
        assert_eq!(dense.nnz(), 2);
        assert!(dense.contains(4));
        assert!(!dense.contains(5));
        assert_eq!(dense.active_indices().collect::<Vec<_>>(), vec![0, 4]);
        assert_eq!(dense.into_mode(EncodingMode::Sparse), sparse);
    }
}
