//! Data loading for aligned transliteration pairs.
//!
//! One aligned symbol pair per line, `input<TAB>output`, with a blank line
//! between words. Lines starting with `#` are comments. An output of `_`
//! marks an input symbol that produces nothing.

use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;

use lipika_core::{EncodingMode, FeatureVocabulary, NgramContext, Result};
use tracing::{debug, warn};

use crate::perceptron::TrainingExample;

/// A word as aligned input and output symbols.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AlignedWord {
    pub source: Vec<String>,
    pub target: Vec<String>,
}

impl AlignedWord {
    pub fn new(source: Vec<String>, target: Vec<String>) -> Self {
        Self { source, target }
    }

    pub fn len(&self) -> usize {
        self.source.len()
    }

    pub fn is_empty(&self) -> bool {
        self.source.is_empty()
    }
}

/// Load an aligned dataset from a file.
pub fn load_aligned_dataset<P: AsRef<Path>>(path: P) -> std::io::Result<Vec<AlignedWord>> {
    let file = File::open(path)?;
    parse_aligned(BufReader::new(file))
}

/// Parse aligned words from any line source. Malformed lines are skipped.
pub fn parse_aligned<R: BufRead>(reader: R) -> std::io::Result<Vec<AlignedWord>> {
    let mut words = Vec::new();
    let mut source = Vec::new();
    let mut target = Vec::new();

    for (n, line) in reader.lines().enumerate() {
        let line = line?;
        let line = line.trim_end_matches(['\r', '\n']);

        if line.trim().is_empty() {
            if !source.is_empty() {
                words.push(AlignedWord::new(
                    std::mem::take(&mut source),
                    std::mem::take(&mut target),
                ));
            }
            continue;
        }

        if line.starts_with('#') {
            continue;
        }

        match line.split_once('\t') {
            Some((input, output)) if !input.is_empty() && !output.is_empty() && !output.contains('\t') => {
                source.push(input.to_string());
                target.push(output.to_string());
            }
            _ => warn!(line = n + 1, content = line, "skipping malformed training line"),
        }
    }

    // Last word may not be followed by a blank line
    if !source.is_empty() {
        words.push(AlignedWord::new(source, target));
    }

    debug!(words = words.len(), "parsed aligned dataset");
    Ok(words)
}

/// Split a word into one symbol per character.
pub fn split_symbols(word: &str) -> Vec<String> {
    word.chars().map(String::from).collect()
}

/// Extract features for every word, fit the vocabulary on all of them and
/// encode each word as a training example.
pub fn build_examples(
    words: &[AlignedWord],
    context: NgramContext,
    mode: EncodingMode,
) -> Result<(FeatureVocabulary, Vec<TrainingExample>)> {
    let rows: Vec<_> = words.iter().map(|w| context.extract(&w.source)).collect();
    let vocabulary = FeatureVocabulary::fit(&rows.concat())?;

    let examples = rows
        .iter()
        .zip(words)
        .map(|(rows, word)| TrainingExample::new(vocabulary.transform(rows, mode), word.target.clone()))
        .collect();
    Ok((vocabulary, examples))
}
