//! # Beam Search Decoding
//!
//! Keeps at most `k_best` partial hypotheses per position and returns the
//! surviving full sequences ranked by descending score. Ties between equal
//! scores are broken in favor of the lexicographically smaller sequence.
//! On exactly tied optima this can differ from Viterbi's pick, though the
//! best score is always the same.

use std::cmp::Ordering;

use tracing::trace;

use crate::decode::lattice::{validate_lattice, ChainParams, ScoredSequence};
use crate::error::{LipikaError, Result};

/// k-best decoder for linear-chain class sequences.
#[derive(Debug, Clone)]
pub struct BeamSearchDecoder {
    num_classes: usize,
    k_best: usize,
}

/// A one-class extension of a live hypothesis, not yet materialized.
#[derive(Debug, Clone, Copy)]
struct Candidate {
    parent: usize,
    class: usize,
    score: f64,
}

impl BeamSearchDecoder {
    /// Create a beam search decoder.
    ///
    /// Fails with `InvalidArgument` when `k_best < 2`.
    pub fn new(num_classes: usize, k_best: usize) -> Result<Self> {
        if k_best < 2 {
            return Err(LipikaError::invalid("k_best", k_best, "must be >= 2"));
        }
        Ok(Self {
            num_classes,
            k_best,
        })
    }

    pub fn k_best(&self) -> usize {
        self.k_best
    }

    /// Decode up to `k_best` sequences, best first.
    pub fn decode(&self, emissions: &[Vec<f64>], chain: &ChainParams) -> Result<Vec<ScoredSequence>> {
        if chain.n_classes() != self.num_classes {
            return Err(LipikaError::invalid(
                "chain",
                format!("{} classes", chain.n_classes()),
                format!("decoder was built for {} classes", self.num_classes),
            ));
        }
        validate_lattice(emissions, chain)?;

        let Some(last) = emissions.len().checked_sub(1) else {
            return Ok(Vec::new());
        };

        // Seed with every class at the first position
        let mut beam: Vec<ScoredSequence> = emissions[0]
            .iter()
            .zip(&chain.initial)
            .enumerate()
            .map(|(c, (e, b))| {
                let mut score = e + b;
                if last == 0 {
                    score += chain.terminal[c];
                }
                ScoredSequence {
                    labels: vec![c],
                    score,
                }
            })
            .collect();
        beam.sort_by(|a, b| rank(a.score, b.score).then_with(|| a.labels.cmp(&b.labels)));
        beam.truncate(self.k_best);

        for (pos, emission_row) in emissions.iter().enumerate().skip(1) {
            let mut candidates = Vec::with_capacity(beam.len() * self.num_classes);
            for (parent, hyp) in beam.iter().enumerate() {
                let prev = hyp.labels[hyp.labels.len() - 1];
                for (class, emission) in emission_row.iter().enumerate() {
                    let mut score = hyp.score + chain.transitions[prev][class] + emission;
                    if pos == last {
                        score += chain.terminal[class];
                    }
                    candidates.push(Candidate {
                        parent,
                        class,
                        score,
                    });
                }
            }

            candidates.sort_by(|a, b| {
                rank(a.score, b.score)
                    .then_with(|| beam[a.parent].labels.cmp(&beam[b.parent].labels))
                    .then_with(|| a.class.cmp(&b.class))
            });
            candidates.truncate(self.k_best);
            trace!(pos, live = candidates.len(), "pruned beam");

            beam = candidates
                .into_iter()
                .map(|cand| {
                    let parent = &beam[cand.parent].labels;
                    let mut labels = Vec::with_capacity(parent.len() + 1);
                    labels.extend_from_slice(parent);
                    labels.push(cand.class);
                    ScoredSequence {
                        labels,
                        score: cand.score,
                    }
                })
                .collect();
        }

        Ok(beam)
    }
}

/// Descending score order.
fn rank(a: f64, b: f64) -> Ordering {
    b.total_cmp(&a)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_rejects_k_below_two() {
        for k in [0, 1] {
            let err = BeamSearchDecoder::new(2, k).unwrap_err();
            assert!(matches!(err, LipikaError::InvalidArgument { name: "k_best", .. }));
        }
        assert_eq!(BeamSearchDecoder::new(2, 2).unwrap().k_best(), 2);
    }

    #[test]
    fn test_ranked_output() {
        let decoder = BeamSearchDecoder::new(2, 4).unwrap();
        let emissions = vec![vec![5.0, 1.0], vec![1.0, 5.0]];
        let out = decoder.decode(&emissions, &ChainParams::zeros(2)).unwrap();
        let labels: Vec<_> = out.iter().map(|s| s.labels.clone()).collect();
        assert_eq!(labels, vec![vec![0, 1], vec![0, 0], vec![1, 1], vec![1, 0]]);
        let scores: Vec<_> = out.iter().map(|s| s.score).collect();
        assert_eq!(scores, vec![10.0, 6.0, 6.0, 2.0]);
    }

    #[test]
    fn test_output_capped_by_live_hypotheses() {
        let decoder = BeamSearchDecoder::new(2, 10).unwrap();
        let out = decoder
            .decode(&[vec![0.0, 1.0]], &ChainParams::zeros(2))
            .unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].labels, vec![1]);
    }

    #[test]
    fn test_terminal_bias_applied_once() {
        let decoder = BeamSearchDecoder::new(2, 2).unwrap();
        let mut chain = ChainParams::zeros(2);
        chain.terminal = vec![0.0, 3.0];
        chain.initial = vec![0.5, 0.0];
        let out = decoder.decode(&[vec![1.0, 0.0]], &chain).unwrap();
        assert_eq!(out[0].labels, vec![1]);
        assert_eq!(out[0].score, 3.0);
        assert_eq!(out[1].score, 1.5);

        let out = decoder
            .decode(&[vec![1.0, 0.0], vec![2.0, 0.0]], &chain)
            .unwrap();
        assert_eq!(out[0].labels, vec![0, 1]);
        assert_eq!(out[0].score, 4.5);
    }

    #[test]
    fn test_ties_prefer_smaller_sequence() {
        let decoder = BeamSearchDecoder::new(3, 3).unwrap();
        let out = decoder
            .decode(&[vec![1.0; 3], vec![1.0; 3]], &ChainParams::zeros(3))
            .unwrap();
        let labels: Vec<_> = out.iter().map(|s| s.labels.clone()).collect();
        assert_eq!(labels, vec![vec![0, 0], vec![0, 1], vec![0, 2]]);
    }

    #[test]
    fn test_empty_sequence() {
        let decoder = BeamSearchDecoder::new(2, 3).unwrap();
        assert!(decoder.decode(&[], &ChainParams::zeros(2)).unwrap().is_empty());
    }

    #[test]
    fn test_narrow_beam_can_miss_optimum() {
        // Greedy prefix 0 looks best at t=0 but the transition out of it is poor.
        let decoder = BeamSearchDecoder::new(3, 2).unwrap();
        let mut chain = ChainParams::zeros(3);
        chain.transitions[0] = vec![-10.0, -10.0, -10.0];
        chain.transitions[1] = vec![-10.0, -10.0, -10.0];
        let emissions = vec![vec![3.0, 2.0, 1.0], vec![0.0, 0.0, 0.0]];
        let out = decoder.decode(&emissions, &chain).unwrap();
        assert_eq!(out.len(), 2);
        assert_eq!(out[0].score, -7.0);

        let wide = BeamSearchDecoder::new(3, 9).unwrap().decode(&emissions, &chain).unwrap();
        assert_eq!(wide[0].labels, vec![2, 0]);
        assert_eq!(wide[0].score, 1.0);
    }
}
