//! # Model Repository
//!
//! Owns the loaded models, keyed by ordered language pair. Each pair is
//! loaded at most once and handed out as a shared read-only handle, so any
//! number of threads can decode with the same model without locking.
//!
//! Every pair gets its own slot. Loading a pair only serializes callers of
//! that pair; the shared map is locked just long enough to find the slot.

use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use std::sync::{Arc, OnceLock};

use parking_lot::{Mutex, RwLock};
use tracing::{debug, info};

use crate::error::{LipikaError, Result};
use crate::model::TransliterationModel;

/// Ordered `(source, target)` language codes, e.g. `hin-eng`.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct LanguagePair {
    source: String,
    target: String,
}

impl LanguagePair {
    /// Build a pair from language codes; codes are lowercased and must differ.
    pub fn new(source: &str, target: &str) -> Result<Self> {
        let source = source.trim().to_lowercase();
        let target = target.trim().to_lowercase();
        if source.is_empty() || target.is_empty() || source == target {
            return Err(LipikaError::UnsupportedPair {
                source_lang: source,
                target_lang: target,
            });
        }
        Ok(Self { source, target })
    }

    pub fn source(&self) -> &str {
        &self.source
    }

    pub fn target(&self) -> &str {
        &self.target
    }
}

impl FromStr for LanguagePair {
    type Err = LipikaError;

    fn from_str(s: &str) -> Result<Self> {
        match s.split_once('-') {
            Some((source, target)) => Self::new(source, target),
            None => Err(LipikaError::invalid(
                "pair",
                s,
                "expected `source-target`, e.g. `hin-eng`",
            )),
        }
    }
}

impl fmt::Display for LanguagePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}-{}", self.source, self.target)
    }
}

/// Source of frozen models, consulted once per language pair.
pub trait ModelLoader: Send + Sync {
    fn load(&self, pair: &LanguagePair) -> Result<TransliterationModel>;
}

impl<F> ModelLoader for F
where
    F: Fn(&LanguagePair) -> Result<TransliterationModel> + Send + Sync,
{
    fn load(&self, pair: &LanguagePair) -> Result<TransliterationModel> {
        self(pair)
    }
}

/// Load-once cache of models keyed by language pair.
pub struct ModelRepository<L> {
    loader: L,
    slots: RwLock<HashMap<LanguagePair, Arc<Slot>>>,
}

/// One pair's model, filled at most once.
#[derive(Default)]
struct Slot {
    model: OnceLock<Arc<TransliterationModel>>,
    loading: Mutex<()>,
}

impl Slot {
    fn filled(model: TransliterationModel) -> Self {
        let slot = Self::default();
        slot.model.get_or_init(|| Arc::new(model));
        slot
    }

    fn model(&self) -> Option<Arc<TransliterationModel>> {
        self.model.get().cloned()
    }
}

impl<L: ModelLoader> ModelRepository<L> {
    pub fn new(loader: L) -> Self {
        Self {
            loader,
            slots: RwLock::new(HashMap::new()),
        }
    }

    /// Cached model for `pair`, loading it on first use.
    ///
    /// Concurrent callers for the same pair wait for a single load. Callers
    /// for other pairs are never blocked by it.
    pub fn get_or_load(&self, pair: &LanguagePair) -> Result<Arc<TransliterationModel>> {
        if let Some(model) = self.get(pair) {
            return Ok(model);
        }

        let slot = Arc::clone(self.slots.write().entry(pair.clone()).or_default());
        let _loading = slot.loading.lock();
        // Another caller may have loaded it while we waited for the slot.
        if let Some(model) = slot.model() {
            return Ok(model);
        }

        debug!(%pair, "loading model");
        let model = self.loader.load(pair)?;
        info!(
            %pair,
            classes = model.classes().len(),
            features = model.vocabulary().dimension(),
            "model loaded"
        );
        Ok(Arc::clone(slot.model.get_or_init(|| Arc::new(model))))
    }

    /// Cached model for `pair`, without loading.
    pub fn get(&self, pair: &LanguagePair) -> Option<Arc<TransliterationModel>> {
        self.slots.read().get(pair).and_then(|slot| slot.model())
    }

    /// Register an already-built model, replacing any cached one.
    pub fn insert(
        &self,
        pair: LanguagePair,
        model: TransliterationModel,
    ) -> Option<Arc<TransliterationModel>> {
        let previous = self.slots.write().insert(pair, Arc::new(Slot::filled(model)));
        previous.and_then(|slot| slot.model())
    }

    /// Drop the cached model for `pair`. Outstanding handles stay valid.
    pub fn evict(&self, pair: &LanguagePair) -> Option<Arc<TransliterationModel>> {
        let previous = self.slots.write().remove(pair);
        previous.and_then(|slot| slot.model())
    }

    /// Number of loaded models.
    pub fn len(&self) -> usize {
        self.slots
            .read()
            .values()
            .filter(|slot| slot.model.get().is_some())
            .count()
    }

    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

impl<L> fmt::Debug for ModelRepository<L> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let slots = self.slots.read();
        let mut pairs: Vec<String> = slots
            .iter()
            .filter(|(_, slot)| slot.model.get().is_some())
            .map(|(pair, _)| pair.to_string())
            .collect();
        pairs.sort();
        f.debug_struct("ModelRepository").field("loaded", &pairs).finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::sync::Barrier;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::thread;

    use crate::decode::ChainParams;
    use crate::encoding::{EncodingMode, FeatureVocabulary};
    use crate::features::NgramContext;
    use crate::model::{ClassAlphabet, ModelParameters};

    fn tiny_model() -> TransliterationModel {
        let context = NgramContext::new(0);
        let vocabulary = FeatureVocabulary::fit(&context.extract(&["a"])).unwrap();
        let classes = ClassAlphabet::from_labels(["A", "B"]);
        let params = ModelParameters::new(
            crate::scoring::WeightMatrix::zeros(2, vocabulary.dimension()),
            ChainParams::zeros(2),
        )
        .unwrap();
        TransliterationModel::new(context, vocabulary, classes, params, EncodingMode::Sparse)
            .unwrap()
    }

    #[test]
    fn test_language_pair_parsing() {
        let pair: LanguagePair = "HIN-eng".parse().unwrap();
        assert_eq!(pair.source(), "hin");
        assert_eq!(pair.target(), "eng");
        assert_eq!(pair.to_string(), "hin-eng");
        assert!(matches!(
            "hin-hin".parse::<LanguagePair>(),
            Err(LipikaError::UnsupportedPair { .. })
        ));
        assert!("hineng".parse::<LanguagePair>().is_err());
    }

    #[test]
    fn test_loads_each_pair_once() {
        let calls = AtomicUsize::new(0);
        let repo = ModelRepository::new(|_: &LanguagePair| -> Result<TransliterationModel> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(tiny_model())
        });
        let pair = LanguagePair::new("hin", "eng").unwrap();

        let a = repo.get_or_load(&pair).unwrap();
        let b = repo.get_or_load(&pair).unwrap();
        assert!(Arc::ptr_eq(&a, &b));
        assert_eq!(calls.load(Ordering::SeqCst), 1);
        assert_eq!(repo.len(), 1);
    }

    #[test]
    fn test_concurrent_get_or_load() {
        let calls = AtomicUsize::new(0);
        let repo = ModelRepository::new(|_: &LanguagePair| -> Result<TransliterationModel> {
            calls.fetch_add(1, Ordering::SeqCst);
            Ok(tiny_model())
        });
        let pair = LanguagePair::new("eng", "hin").unwrap();

        thread::scope(|s| {
            for _ in 0..8 {
                s.spawn(|| {
                    let model = repo.get_or_load(&pair).unwrap();
                    assert_eq!(model.transliterate(&["a"]).unwrap(), "A");
                });
            }
        });
        assert_eq!(calls.load(Ordering::SeqCst), 1);
    }

    #[test]
    fn test_failed_load_is_not_cached() {
        let calls = AtomicUsize::new(0);
        let repo = ModelRepository::new(|pair: &LanguagePair| -> Result<TransliterationModel> {
            calls.fetch_add(1, Ordering::SeqCst);
            Err(LipikaError::ModelLoad(format!("no model for {pair}")))
        });
        let pair = LanguagePair::new("urd", "eng").unwrap();
        assert!(repo.get_or_load(&pair).is_err());
        assert!(repo.get_or_load(&pair).is_err());
        assert_eq!(calls.load(Ordering::SeqCst), 2);
        assert!(repo.is_empty());
    }

    #[test]
    fn test_slow_load_does_not_block_other_pairs() {
        let slow = LanguagePair::new("tam", "eng").unwrap();
        let cached = LanguagePair::new("hin", "eng").unwrap();
        let fresh = LanguagePair::new("tel", "eng").unwrap();
        let started = Barrier::new(2);
        let release = Barrier::new(2);
        let calls = AtomicUsize::new(0);

        let repo = ModelRepository::new(|pair: &LanguagePair| -> Result<TransliterationModel> {
            calls.fetch_add(1, Ordering::SeqCst);
            if pair.source() == "tam" {
                started.wait();
                release.wait();
            }
            Ok(tiny_model())
        });
        repo.insert(cached.clone(), tiny_model());

        thread::scope(|s| {
            let loading = s.spawn(|| repo.get_or_load(&slow).map(|_| ()));
            started.wait();

            // The slow load is in flight: other pairs stay reachable.
            assert!(repo.get_or_load(&cached).is_ok());
            assert!(repo.get_or_load(&fresh).is_ok());
            assert!(repo.get(&slow).is_none());
            assert_eq!(repo.len(), 2);
            assert!(format!("{repo:?}").contains("tel-eng"));

            release.wait();
            assert!(loading.join().unwrap().is_ok());
        });

        assert!(repo.get(&slow).is_some());
        assert_eq!(repo.len(), 3);
        assert_eq!(calls.load(Ordering::SeqCst), 2);
    }

    #[test]
    fn test_insert_and_evict() {
        let repo = ModelRepository::new(|pair: &LanguagePair| -> Result<TransliterationModel> {
            Err(LipikaError::ModelLoad(pair.to_string()))
        });
        let pair = LanguagePair::new("ben", "eng").unwrap();
        assert!(repo.insert(pair.clone(), tiny_model()).is_none());
        let handle = repo.get_or_load(&pair).unwrap();
        assert!(repo.evict(&pair).is_some());
        assert!(repo.get(&pair).is_none());
        assert_eq!(handle.classes().len(), 2);

        let replaced = repo.insert(pair.clone(), tiny_model());
        assert!(replaced.is_none());
        assert!(repo.insert(pair, tiny_model()).is_some());
        assert_eq!(repo.len(), 1);
    }
}
