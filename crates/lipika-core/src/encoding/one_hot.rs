//! # One-hot Encoding of Categorical Feature Rows
//!
//! Each feature column owns a disjoint id range; a row is encoded by setting
//! the id of its value in every column. Values never seen during `fit`
//! simply leave their column empty.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::encoding::sparse::{EncodingMode, FeatureVector, SparseVector};
use crate::error::{LipikaError, Result};

/// Frozen per-column mapping from categorical value to feature id.
///
/// Serialized as one value list per column in id order, and rebuilt through
/// [`FeatureVocabulary::from_columns`] when read back.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<Vec<String>>", into = "Vec<Vec<String>>")]
pub struct FeatureVocabulary {
    columns: Vec<HashMap<String, usize>>,
    dimension: usize,
}

impl FeatureVocabulary {
    /// Fit a vocabulary on rows of identical arity.
    ///
    /// Within a column, ids are assigned in sorted value order so that the
    /// same rows always produce the same mapping.
    ///
    /// # Examples
    /// ```
    /// use lipika_core::encoding::{EncodingMode, FeatureVocabulary};
    ///
    /// let vocab = FeatureVocabulary::fit(&[vec!["a", "x"], vec!["b", "y"]]).unwrap();
    /// let v = vocab.transform_row(&["a", "y"], EncodingMode::Sparse);
    /// assert_eq!(v.active_indices().collect::<Vec<_>>(), vec![0, 3]);
    /// ```
    pub fn fit<R, S>(rows: &[R]) -> Result<Self>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        let arity = rows.first().map_or(0, |r| r.as_ref().len());
        let mut values: Vec<BTreeSet<&str>> = vec![BTreeSet::new(); arity];

        for (i, row) in rows.iter().enumerate() {
            let row = row.as_ref();
            if row.len() != arity {
                return Err(LipikaError::invalid(
                    "rows",
                    format!("row {i} with {} values", row.len()),
                    format!("every row must have {arity} values"),
                ));
            }
            for (column, value) in values.iter_mut().zip(row) {
                column.insert(value.as_ref());
            }
        }

        let columns = values
            .into_iter()
            .map(|set| set.into_iter().map(str::to_string).collect())
            .collect();
        let vocab = Self::from_columns(columns)?;
        debug!(
            arity = vocab.arity(),
            dimension = vocab.dimension(),
            "fitted feature vocabulary"
        );
        Ok(vocab)
    }

    /// Build a vocabulary whose ids follow the given per-column value order.
    ///
    /// Used to restore a mapping that was assigned elsewhere instead of
    /// re-deriving it by sorting.
    pub fn from_columns(columns: Vec<Vec<String>>) -> Result<Self> {
        let mut offset = 0;
        let mut maps = Vec::with_capacity(columns.len());

        for (j, values) in columns.into_iter().enumerate() {
            let len = values.len();
            let mut map = HashMap::with_capacity(len);
            for (i, value) in values.into_iter().enumerate() {
                if let Some(prev) = map.insert(value, offset + i) {
                    return Err(LipikaError::invalid(
                        "columns",
                        format!("column {j}"),
                        format!("duplicate value at ids {prev} and {}", offset + i),
                    ));
                }
            }
            maps.push(map);
            offset += len;
        }

        Ok(Self {
            columns: maps,
            dimension: offset,
        })
    }

    /// Per-column values, each list in id order.
    pub fn columns(&self) -> Vec<Vec<String>> {
        self.columns
            .iter()
            .map(|map| {
                let mut pairs: Vec<(&String, usize)> =
                    map.iter().map(|(value, &id)| (value, id)).collect();
                pairs.sort_unstable_by_key(|&(_, id)| id);
                pairs.into_iter().map(|(value, _)| value.clone()).collect()
            })
            .collect()
    }

    /// Number of feature columns.
    pub fn arity(&self) -> usize {
        self.columns.len()
    }

    /// Total number of feature ids across all columns.
    pub fn dimension(&self) -> usize {
        self.dimension
    }

    /// Id of `value` in `column`, if it was seen.
    pub fn lookup(&self, column: usize, value: &str) -> Option<usize> {
        self.columns.get(column)?.get(value).copied()
    }

    /// Encode one row. Unseen values and columns past the fitted arity are
    /// ignored.
    pub fn transform_row<S: AsRef<str>>(&self, row: &[S], mode: EncodingMode) -> FeatureVector {
        let indices = self
            .columns
            .iter()
            .zip(row)
            .filter_map(|(map, value)| map.get(value.as_ref()).copied());

        match mode {
            EncodingMode::Sparse => {
                // Column ranges are disjoint, increasing and below `dimension`.
                let ids: Vec<usize> = indices.collect();
                FeatureVector::Sparse(SparseVector::from_sorted(self.dimension, ids))
            }
            EncodingMode::Dense => {
                let mut bits = vec![false; self.dimension];
                for id in indices {
                    bits[id] = true;
                }
                FeatureVector::Dense(bits)
            }
        }
    }

    /// Encode every row.
    pub fn transform<R, S>(&self, rows: &[R], mode: EncodingMode) -> Vec<FeatureVector>
    where
        R: AsRef<[S]>,
        S: AsRef<str>,
    {
        rows.iter()
            .map(|row| self.transform_row(row.as_ref(), mode))
            .collect()
    }
}

impl TryFrom<Vec<Vec<String>>> for FeatureVocabulary {
    type Error = LipikaError;

    fn try_from(columns: Vec<Vec<String>>) -> Result<Self> {
        Self::from_columns(columns)
    }
}

impl From<FeatureVocabulary> for Vec<Vec<String>> {
    fn from(vocab: FeatureVocabulary) -> Self {
        vocab.columns()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn toy() -> FeatureVocabulary {
        FeatureVocabulary::fit(&[vec!["a", "x"], vec!["b", "y"]]).unwrap()
    }

    #[test]
    fn test_fit_assigns_disjoint_column_ranges() {
        let vocab = toy();
        assert_eq!(vocab.arity(), 2);
        assert_eq!(vocab.dimension(), 4);
        assert_eq!(vocab.lookup(0, "a"), Some(0));
        assert_eq!(vocab.lookup(0, "b"), Some(1));
        assert_eq!(vocab.lookup(1, "x"), Some(2));
        assert_eq!(vocab.lookup(1, "y"), Some(3));
        assert_eq!(vocab.lookup(1, "a"), None);
    }

    #[test]
    fn test_transform_sparse_and_dense() {
        let vocab = toy();
        let sparse = vocab.transform_row(&["a", "y"], EncodingMode::Sparse);
        assert_eq!(sparse.dim(), 4);
        assert_eq!(sparse.active_indices().collect::<Vec<_>>(), vec![0, 3]);

        let dense = vocab.transform_row(&["a", "y"], EncodingMode::Dense);
        assert_eq!(dense, FeatureVector::Dense(vec![true, false, false, true]));
    }

    #[test]
    fn test_unseen_values_are_silent() {
        let vocab = toy();
        let v = vocab.transform_row(&["zzz", "y"], EncodingMode::Sparse);
        assert_eq!(v.active_indices().collect::<Vec<_>>(), vec![3]);

        let v = vocab.transform_row(&["q", "r", "extra"], EncodingMode::Dense);
        assert_eq!(v.nnz(), 0);
        assert_eq!(v.dim(), 4);

        let v = vocab.transform_row::<&str>(&[], EncodingMode::Sparse);
        assert_eq!(v.nnz(), 0);
    }

    #[test]
    fn test_full_coverage_sets_one_bit_per_column() {
        let rows = vec![
            vec!["k", "a", "k|a"],
            vec!["a", "m", "a|m"],
            vec!["m", "_", "m|_"],
        ];
        let vocab = FeatureVocabulary::fit(&rows).unwrap();
        for v in vocab.transform(&rows, EncodingMode::Sparse) {
            assert_eq!(v.nnz(), 3);
        }
    }

    #[test]
    fn test_fit_is_order_independent() {
        let a = FeatureVocabulary::fit(&[vec!["b", "y"], vec!["a", "x"]]).unwrap();
        assert_eq!(a, toy());
    }

    #[test]
    fn test_fit_rejects_ragged_rows() {
        let err = FeatureVocabulary::fit(&[vec!["a", "x"], vec!["b"]]).unwrap_err();
        assert!(matches!(err, LipikaError::InvalidArgument { name: "rows", .. }));
    }

    #[test]
    fn test_from_columns_keeps_given_order() {
        let vocab = FeatureVocabulary::from_columns(vec![
            vec!["b".into(), "a".into()],
            vec!["y".into()],
        ])
        .unwrap();
        assert_eq!(vocab.lookup(0, "b"), Some(0));
        assert_eq!(vocab.lookup(0, "a"), Some(1));
        assert_eq!(vocab.lookup(1, "y"), Some(2));

        assert!(FeatureVocabulary::from_columns(vec![vec!["a".into(), "a".into()]]).is_err());
    }

    #[test]
    fn test_vocabulary_serde_roundtrip() {
        let vocab = toy();
        let json = serde_json::to_string(&vocab).unwrap();
        let back: FeatureVocabulary = serde_json::from_str(&json).unwrap();
        assert_eq!(back, vocab);
    }

    #[test]
    fn test_serialized_form_is_ordered_columns() {
        let vocab = FeatureVocabulary::from_columns(vec![
            vec!["m".into(), "k".into(), "a".into()],
            vec!["x".into()],
        ])
        .unwrap();
        let json = serde_json::to_string(&vocab).unwrap();
        assert_eq!(json, r#"[["m","k","a"],["x"]]"#);

        let a = FeatureVocabulary::fit(&[vec!["q", "x"], vec!["b", "y"], vec!["k", "x"]]).unwrap();
        let b = FeatureVocabulary::fit(&[vec!["k", "y"], vec!["q", "x"], vec!["b", "x"]]).unwrap();
        assert_eq!(
            serde_json::to_string(&a).unwrap(),
            serde_json::to_string(&b).unwrap()
        );
    }

    #[test]
    fn test_deserialize_rejects_duplicate_values() {
        let err = serde_json::from_str::<FeatureVocabulary>(r#"[["a","b","a"]]"#).unwrap_err();
        assert!(err.to_string().contains("duplicate value"));
    }

    #[test]
    fn test_deserialized_vocabulary_encodes_in_range() {
        let vocab: FeatureVocabulary = serde_json::from_str(r#"[["a","b"],["x"]]"#).unwrap();
        assert_eq!(vocab.dimension(), 3);
        let v = vocab.transform_row(&["b", "x"], EncodingMode::Sparse);
        assert_eq!(v.dim(), 3);
        assert_eq!(v.active_indices().collect::<Vec<_>>(), vec![1, 2]);
    }
}
