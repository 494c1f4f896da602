//! # Lattice Decoding
//!
//! Exact single-best (Viterbi) and approximate k-best (beam search) decoding
//! over a linear chain of classes, selected through [`DecodeStrategy`].

pub mod beam;
pub mod lattice;
pub mod viterbi;

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

use crate::error::{LipikaError, Result};

pub use beam::BeamSearchDecoder;
pub use lattice::{sequence_score, ChainParams, ScoredSequence};
pub use viterbi::ViterbiDecoder;

/// Beam width used when a strategy is chosen by name alone.
pub const DEFAULT_K_BEST: usize = 5;

/// Decode strategy, fixed when a model or request is configured.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum DecodeStrategy {
    /// Single best sequence.
    #[default]
    Viterbi,
    /// The `k_best` highest-scoring sequences.
    BeamSearch { k_best: usize },
}

impl DecodeStrategy {
    /// Beam search strategy; `k_best` must be at least 2.
    pub fn beam_search(k_best: usize) -> Result<Self> {
        check_k_best(k_best)?;
        Ok(Self::BeamSearch { k_best })
    }

    /// Resolve a strategy from its name (`"viterbi"` or `"beamsearch"`).
    pub fn from_name(name: &str, k_best: usize) -> Result<Self> {
        match name {
            "viterbi" => Ok(Self::Viterbi),
            "beamsearch" => Self::beam_search(k_best),
            other => Err(LipikaError::UnknownDecoder(other.to_string())),
        }
    }

    /// Decode a lattice. Viterbi yields at most one sequence.
    pub fn decode(&self, emissions: &[Vec<f64>], chain: &ChainParams) -> Result<Vec<ScoredSequence>> {
        match *self {
            Self::Viterbi => {
                let best = decode_best(emissions, chain)?;
                Ok(if emissions.is_empty() { Vec::new() } else { vec![best] })
            }
            Self::BeamSearch { k_best } => decode_k(emissions, chain, k_best),
        }
    }
}

impl FromStr for DecodeStrategy {
    type Err = LipikaError;

    fn from_str(s: &str) -> Result<Self> {
        Self::from_name(s, DEFAULT_K_BEST)
    }
}

impl fmt::Display for DecodeStrategy {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Viterbi => write!(f, "viterbi"),
            Self::BeamSearch { k_best } => write!(f, "beamsearch(k={k_best})"),
        }
    }
}

fn check_k_best(k_best: usize) -> Result<()> {
    if k_best < 2 {
        return Err(LipikaError::invalid("k_best", k_best, "must be >= 2"));
    }
    Ok(())
}

/// Single best label sequence and its score.
pub fn decode_best(emissions: &[Vec<f64>], chain: &ChainParams) -> Result<ScoredSequence> {
    ViterbiDecoder::new(chain.n_classes()).decode(emissions, chain)
}

/// Up to `k_best` label sequences ranked by descending score.
pub fn decode_k(
    emissions: &[Vec<f64>],
    chain: &ChainParams,
    k_best: usize,
) -> Result<Vec<ScoredSequence>> {
    BeamSearchDecoder::new(chain.n_classes(), k_best)?.decode(emissions, chain)
}

#[cfg(test)]
mod tests {
    use super::*;
    use oorandom::Rand64;

    fn random_lattice(rng: &mut Rand64, seq_len: usize, n: usize) -> (Vec<Vec<f64>>, ChainParams) {
        let mut draw = |rows: usize, cols: usize| -> Vec<Vec<f64>> {
            (0..rows)
                .map(|_| (0..cols).map(|_| rng.rand_float() * 10.0 - 5.0).collect())
                .collect()
        };
        let emissions = draw(seq_len, n);
        let transitions = draw(n, n);
        let mut ends = draw(2, n);
        let terminal = ends.pop().unwrap();
        let initial = ends.pop().unwrap();
        let chain = ChainParams::new(transitions, initial, terminal).unwrap();
        (emissions, chain)
    }

    fn all_sequences(seq_len: usize, n: usize) -> Vec<Vec<usize>> {
        let mut out = vec![Vec::new()];
        for _ in 0..seq_len {
            out = out
                .into_iter()
                .flat_map(|prefix| {
                    (0..n).map(move |c| {
                        let mut next = prefix.clone();
                        next.push(c);
                        next
                    })
                })
                .collect();
        }
        out
    }

    #[test]
    fn test_viterbi_matches_exhaustive_search() {
        let mut rng = Rand64::new(7);
        for n in 1..=4 {
            for seq_len in 1..=4 {
                for _ in 0..5 {
                    let (em, chain) = random_lattice(&mut rng, seq_len, n);
                    let best = decode_best(&em, &chain).unwrap();
                    let brute = all_sequences(seq_len, n)
                        .iter()
                        .map(|y| sequence_score(&em, &chain, y).unwrap())
                        .fold(f64::NEG_INFINITY, f64::max);
                    assert!((best.score - brute).abs() < 1e-9);
                    let rescored = sequence_score(&em, &chain, &best.labels).unwrap();
                    assert!((rescored - best.score).abs() < 1e-9);
                }
            }
        }
    }

    #[test]
    fn test_wide_beam_agrees_with_viterbi() {
        let mut rng = Rand64::new(42);
        for n in 2..=4 {
            for seq_len in 1..=4 {
                let (em, chain) = random_lattice(&mut rng, seq_len, n);
                let k = n.pow(seq_len as u32);
                let best = decode_best(&em, &chain).unwrap();
                let ranked = decode_k(&em, &chain, k).unwrap();
                assert_eq!(ranked.len(), k);
                assert_eq!(ranked[0], best);
                assert!(ranked.windows(2).all(|w| w[0].score >= w[1].score));
            }
        }
    }

    #[test]
    fn test_tied_optima_resolve_differently() {
        // [0, 1] and [1, 0] both score 1.0. Viterbi picks the lowest final
        // class and backtracks, beam search picks the smaller sequence.
        let em = vec![vec![0.0; 2]; 2];
        let chain = ChainParams::new(
            vec![vec![0.0, 1.0], vec![1.0, 0.0]],
            vec![0.0; 2],
            vec![0.0; 2],
        )
        .unwrap();

        let best = decode_best(&em, &chain).unwrap();
        assert_eq!(best.labels, vec![1, 0]);
        assert_eq!(best.score, 1.0);

        let ranked = decode_k(&em, &chain, 4).unwrap();
        assert_eq!(ranked[0].labels, vec![0, 1]);
        assert_eq!(ranked[1].labels, vec![1, 0]);
        assert_eq!(ranked[0].score, best.score);
        assert_eq!(ranked[1].score, best.score);
    }

    #[test]
    fn test_decoding_is_deterministic() {
        let mut rng = Rand64::new(3);
        let (em, chain) = random_lattice(&mut rng, 6, 5);
        let first = decode_k(&em, &chain, 4).unwrap();
        for _ in 0..3 {
            assert_eq!(decode_k(&em, &chain, 4).unwrap(), first);
            assert_eq!(decode_best(&em, &chain).unwrap(), decode_best(&em, &chain).unwrap());
        }
    }

    #[test]
    fn test_strategy_from_name() {
        assert_eq!("viterbi".parse::<DecodeStrategy>().unwrap(), DecodeStrategy::Viterbi);
        assert_eq!(
            "beamsearch".parse::<DecodeStrategy>().unwrap(),
            DecodeStrategy::BeamSearch { k_best: DEFAULT_K_BEST }
        );
        assert!(matches!(
            "greedy".parse::<DecodeStrategy>(),
            Err(LipikaError::UnknownDecoder(_))
        ));
        assert!(matches!(
            DecodeStrategy::from_name("beamsearch", 1),
            Err(LipikaError::InvalidArgument { name: "k_best", .. })
        ));
    }

    #[test]
    fn test_strategy_decode_dispatch() {
        let em = vec![vec![5.0, 1.0], vec![1.0, 5.0]];
        let chain = ChainParams::zeros(2);
        let viterbi = DecodeStrategy::Viterbi.decode(&em, &chain).unwrap();
        assert_eq!(viterbi.len(), 1);
        assert_eq!(viterbi[0].labels, vec![0, 1]);

        let beam = DecodeStrategy::beam_search(3).unwrap().decode(&em, &chain).unwrap();
        assert_eq!(beam.len(), 3);
        assert_eq!(beam[0].labels, vec![0, 1]);

        assert!(DecodeStrategy::Viterbi.decode(&[], &chain).unwrap().is_empty());
    }

    #[test]
    fn test_decode_k_rejects_narrow_beam() {
        let em = vec![vec![0.0, 0.0]];
        let chain = ChainParams::zeros(2);
        let err = decode_k(&em, &chain, 1).unwrap_err();
        assert!(matches!(err, LipikaError::InvalidArgument { name: "k_best", .. }));
        assert!(err.to_string().contains("= 1"));
    }
}
