//! Sparse parameter updates.
//!
//! A mistaken example only touches the weights of features active at its
//! positions plus a few chain biases. Every touched coordinate is collected
//! as an integer coefficient in a coordinate list, merged, and applied as
//! `lr * coefficient`.

use lipika_core::{FeatureVector, ModelParameters};

/// Coordinate-list update moving the parameters from a predicted label
/// sequence toward the gold one.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SparseUpdate {
    weights: Vec<((usize, usize), i32)>,
    transitions: Vec<((usize, usize), i32)>,
    initial: Vec<(usize, i32)>,
    terminal: Vec<(usize, i32)>,
}

impl SparseUpdate {
    /// Build the (already merged) update for one example.
    ///
    /// At each position the gold class gains `+1` and the predicted class
    /// `-1` on every active feature. Transition bigrams, first and last
    /// labels are counted the same way.
    pub fn from_mistake(features: &[FeatureVector], predicted: &[usize], gold: &[usize]) -> Self {
        debug_assert_eq!(features.len(), predicted.len());
        debug_assert_eq!(predicted.len(), gold.len());

        let mut update = Self::default();
        for ((x, &p), &g) in features.iter().zip(predicted).zip(gold) {
            if p == g {
                continue;
            }
            for j in x.active_indices() {
                update.weights.push(((p, j), -1));
                update.weights.push(((g, j), 1));
            }
        }
        for pair in predicted.windows(2) {
            update.transitions.push(((pair[0], pair[1]), -1));
        }
        for pair in gold.windows(2) {
            update.transitions.push(((pair[0], pair[1]), 1));
        }
        if let (Some(&p), Some(&g)) = (predicted.first(), gold.first()) {
            update.initial.extend([(p, -1), (g, 1)]);
        }
        if let (Some(&p), Some(&g)) = (predicted.last(), gold.last()) {
            update.terminal.extend([(p, -1), (g, 1)]);
        }
        update.coalesce();
        update
    }

    /// Merge duplicate coordinates and drop the ones that cancel out.
    pub fn coalesce(&mut self) {
        merge(&mut self.weights);
        merge(&mut self.transitions);
        merge(&mut self.initial);
        merge(&mut self.terminal);
    }

    /// Number of stored coordinates.
    pub fn len(&self) -> usize {
        self.weights.len() + self.transitions.len() + self.initial.len() + self.terminal.len()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }

    /// Add `(lr * coefficient) * scale` to every touched parameter.
    pub fn apply(&self, params: &mut ModelParameters, lr: f64, scale: f64) {
        let delta = |c: i32| lr * f64::from(c) * scale;
        for &((class, feature), c) in &self.weights {
            params.weights.add_at(class, feature, delta(c));
        }
        for &((prev, curr), c) in &self.transitions {
            params.chain.transitions[prev][curr] += delta(c);
        }
        for &(class, c) in &self.initial {
            params.chain.initial[class] += delta(c);
        }
        for &(class, c) in &self.terminal {
            params.chain.terminal[class] += delta(c);
        }
    }
}

fn merge<K: Ord + Copy>(entries: &mut Vec<(K, i32)>) {
    entries.sort_unstable_by_key(|&(key, _)| key);
    let mut merged: Vec<(K, i32)> = Vec::with_capacity(entries.len());
    for &(key, c) in entries.iter() {
        match merged.last_mut() {
            Some((last, total)) if *last == key => *total += c,
            _ => merged.push((key, c)),
        }
    }
    merged.retain(|&(_, c)| c != 0);
    *entries = merged;
}
