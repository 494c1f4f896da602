//! # Character n-gram Context Features
//!
//! Turns a symbol sequence into one categorical feature tuple per position.
//! Each tuple holds a `2n + 1` symbol window centered on the position,
//! followed by every contiguous k-gram (`k = 2..=n`) of that window.

use std::iter;

use serde::{Deserialize, Serialize};

/// Placeholder symbol used to pad the window past either end of a word.
pub const PAD_SYMBOL: &str = "_";

/// Separator joining the symbols of a k-gram into a single feature value.
pub const NGRAM_SEPARATOR: &str = "|";

/// Categorical feature values for one position.
pub type FeatureRow = Vec<String>;

/// Builds fixed-arity n-gram context features.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct NgramContext {
    order: usize,
}

impl Default for NgramContext {
    fn default() -> Self {
        Self { order: 4 }
    }
}

impl NgramContext {
    /// Create a feature builder looking `order` symbols to each side.
    pub fn new(order: usize) -> Self {
        Self { order }
    }

    /// Context order `n`.
    pub fn order(&self) -> usize {
        self.order
    }

    /// Number of features in every row, a function of `n` alone.
    ///
    /// `2n + 1` unigrams, then `2n + 2 - k` k-grams for each `k` in `2..=n`.
    /// Saturates instead of overflowing for absurd orders read from disk.
    pub fn arity(&self) -> usize {
        let n = self.order;
        let width = n.saturating_mul(2).saturating_add(1);
        let longer = n
            .saturating_sub(1)
            .saturating_mul(n.saturating_mul(3).saturating_add(2))
            / 2;
        width.saturating_add(longer)
    }

    /// Extract one feature row per input symbol.
    ///
    /// # Examples
    /// ```
    /// use lipika_core::features::NgramContext;
    ///
    /// let rows = NgramContext::new(1).extract(&["k", "a"]);
    /// assert_eq!(rows[0], vec!["_", "k", "a"]);
    /// assert_eq!(rows[1], vec!["k", "a", "_"]);
    /// ```
    pub fn extract<S: AsRef<str>>(&self, symbols: &[S]) -> Vec<FeatureRow> {
        let n = self.order;
        let mut context: Vec<&str> = Vec::with_capacity(symbols.len() + 2 * n);
        context.extend(iter::repeat_n(PAD_SYMBOL, n));
        context.extend(symbols.iter().map(AsRef::as_ref));
        context.extend(iter::repeat_n(PAD_SYMBOL, n));

        let arity = self.arity();
        (0..symbols.len())
            .map(|pos| {
                let window = &context[pos..pos + 2 * n + 1];
                let mut row = Vec::with_capacity(arity);
                row.extend(window.iter().map(|s| s.to_string()));
                for k in 2..=n {
                    row.extend(window.windows(k).map(|gram| gram.join(NGRAM_SEPARATOR)));
                }
                row
            })
            .collect()
    }
}
