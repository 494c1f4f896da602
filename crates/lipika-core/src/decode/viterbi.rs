//! # Viterbi Decoding
//!
//! Finds the single highest-scoring class sequence given emission scores,
//! transition biases and boundary biases. Ties always resolve to the lowest
//! class id, both when choosing a predecessor and when choosing the final
//! class, so decoding is reproducible.

use crate::decode::lattice::{argmax, validate_lattice, ChainParams, ScoredSequence};
use crate::error::{LipikaError, Result};

/// Viterbi decoder for linear-chain class sequences.
#[derive(Debug, Clone)]
pub struct ViterbiDecoder {
    num_classes: usize,
}

impl ViterbiDecoder {
    /// Create a new Viterbi decoder.
    ///
    /// # Arguments
    /// * `num_classes` - Number of distinct output classes
    pub fn new(num_classes: usize) -> Self {
        Self { num_classes }
    }

    /// Decode the optimal class sequence.
    ///
    /// # Arguments
    /// * `emissions` - Matrix of shape [seq_len, num_classes] with emission scores
    /// * `chain` - Transition and boundary biases for `num_classes` classes
    ///
    /// # Returns
    /// The optimal sequence with its score; empty for an empty input.
    pub fn decode(&self, emissions: &[Vec<f64>], chain: &ChainParams) -> Result<ScoredSequence> {
        if chain.n_classes() != self.num_classes {
            return Err(LipikaError::invalid(
                "chain",
                format!("{} classes", chain.n_classes()),
                format!("decoder was built for {} classes", self.num_classes),
            ));
        }
        validate_lattice(emissions, chain)?;

        let seq_len = emissions.len();
        if seq_len == 0 {
            return Ok(ScoredSequence::empty());
        }

        // DP table and backpointers, one row per position
        let mut dp: Vec<Vec<f64>> = Vec::with_capacity(seq_len);
        let mut backptr: Vec<Vec<Option<usize>>> = Vec::with_capacity(seq_len);

        dp.push(
            emissions[0]
                .iter()
                .zip(&chain.initial)
                .map(|(e, b)| e + b)
                .collect(),
        );
        backptr.push(vec![None; self.num_classes]);

        // Forward pass
        for emission_row in &emissions[1..] {
            let prev_row = &dp[dp.len() - 1];
            let mut row = Vec::with_capacity(self.num_classes);
            let mut back = Vec::with_capacity(self.num_classes);

            for (curr, emission) in emission_row.iter().enumerate() {
                let mut best_prev = 0;
                let mut best_score = prev_row[0] + chain.transitions[0][curr];
                for (prev, &prev_score) in prev_row.iter().enumerate().skip(1) {
                    let score = prev_score + chain.transitions[prev][curr];
                    if score > best_score {
                        best_score = score;
                        best_prev = prev;
                    }
                }
                row.push(best_score + emission);
                back.push(Some(best_prev));
            }

            dp.push(row);
            backptr.push(back);
        }

        let last = &mut dp[seq_len - 1];
        for (score, bias) in last.iter_mut().zip(&chain.terminal) {
            *score += bias;
        }
        let Some((best_final, best_score)) = argmax(last) else {
            return Ok(ScoredSequence::empty());
        };

        // Backtrack
        let mut labels = Vec::with_capacity(seq_len);
        labels.push(best_final);
        let mut curr = best_final;
        for pos in (1..seq_len).rev() {
            curr = backptr[pos][curr].unwrap_or(0);
            labels.push(curr);
        }
        labels.reverse();

        Ok(ScoredSequence {
            labels,
            score: best_score,
        })
    }
}
