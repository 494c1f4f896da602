//! Closed set of output symbols with contiguous class ids.

use std::collections::{BTreeSet, HashMap};

use serde::{Deserialize, Serialize};

use crate::error::{LipikaError, Result};

/// Bidirectional mapping between output symbols and class ids `0..len`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(try_from = "Vec<String>", into = "Vec<String>")]
pub struct ClassAlphabet {
    symbols: Vec<String>,
    ids: HashMap<String, usize>,
}

impl ClassAlphabet {
    /// Collect the distinct labels, assigning ids in sorted symbol order.
    pub fn from_labels<I, S>(labels: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let distinct: BTreeSet<String> = labels
            .into_iter()
            .map(|s| s.as_ref().to_string())
            .collect();
        let symbols: Vec<String> = distinct.into_iter().collect();
        let ids = index(&symbols);
        Self { symbols, ids }
    }

    /// Use the given symbol order as the id order.
    pub fn from_symbols(symbols: Vec<String>) -> Result<Self> {
        let ids = index(&symbols);
        if ids.len() != symbols.len() {
            return Err(LipikaError::invalid(
                "symbols",
                format!("{} symbols", symbols.len()),
                "class symbols must be distinct",
            ));
        }
        Ok(Self { symbols, ids })
    }

    pub fn len(&self) -> usize {
        self.symbols.len()
    }

    pub fn is_empty(&self) -> bool {
        self.symbols.is_empty()
    }

    pub fn id(&self, symbol: &str) -> Option<usize> {
        self.ids.get(symbol).copied()
    }

    pub fn symbol(&self, id: usize) -> Option<&str> {
        self.symbols.get(id).map(String::as_str)
    }

    pub fn symbols(&self) -> &[String] {
        &self.symbols
    }

    /// Map gold symbols to class ids; `None` if any symbol is unknown.
    pub fn encode<S: AsRef<str>>(&self, labels: &[S]) -> Option<Vec<usize>> {
        labels.iter().map(|s| self.id(s.as_ref())).collect()
    }

    /// Map class ids back to symbols.
    pub fn decode(&self, ids: &[usize]) -> Result<Vec<&str>> {
        ids.iter()
            .map(|&id| {
                self.symbol(id).ok_or_else(|| {
                    LipikaError::invalid(
                        "class_id",
                        id,
                        format!("out of range 0..{}", self.symbols.len()),
                    )
                })
            })
            .collect()
    }
}

fn index(symbols: &[String]) -> HashMap<String, usize> {
    symbols
        .iter()
        .enumerate()
        .map(|(i, s)| (s.clone(), i))
        .collect()
}

impl TryFrom<Vec<String>> for ClassAlphabet {
    type Error = LipikaError;

    fn try_from(symbols: Vec<String>) -> Result<Self> {
        Self::from_symbols(symbols)
    }
}

impl From<ClassAlphabet> for Vec<String> {
    fn from(alphabet: ClassAlphabet) -> Self {
        alphabet.symbols
    }
}
