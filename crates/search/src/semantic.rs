use std::collections::HashSet;
use std::num::NonZeroUsize;
use std::path::PathBuf;
use std::sync::{Arc, Mutex, PoisonError};

use lru::LruCache;
use planbot_protocol::{Document, DocumentId, MatchResult, PotentialMatch};
use planbot_text::Preprocessor;
use planbot_vector_store::{ModelSpec, SemanticModel};

use crate::error::Result;

pub const LSA_THRESHOLD: f64 = 78.1;
pub const TFIDF_THRESHOLD: f64 = 15.0;
pub const DEFAULT_POTENTIAL_THRESHOLD: f64 = 50.0;
pub const DEFAULT_MODEL_CACHE_CAPACITY: usize = 8;

/// Loads semantic models on first use and keeps them for the lifetime of
/// the engine, keyed by their full [`ModelSpec`].
pub struct SemanticEngine {
    cache: Mutex<LruCache<ModelSpec, Arc<SemanticModel>>>,
}

impl SemanticEngine {
    #[must_use]
    pub fn new(capacity: NonZeroUsize) -> Self {
        Self {
            cache: Mutex::new(LruCache::new(capacity)),
        }
    }

    /// Cached model for `spec`, reading artifacts only on a miss. A model
    /// that fails to load is never cached.
    pub fn model(&self, spec: &ModelSpec) -> Result<Arc<SemanticModel>> {
        let mut cache = self.cache.lock().unwrap_or_else(PoisonError::into_inner);
        if let Some(model) = cache.get(spec) {
            return Ok(Arc::clone(model));
        }
        let model = Arc::new(SemanticModel::load(spec)?);
        cache.put(spec.clone(), Arc::clone(&model));
        Ok(model)
    }

    #[must_use]
    pub fn cached_models(&self) -> usize {
        self.cache
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .len()
    }
}

impl Default for SemanticEngine {
    fn default() -> Self {
        Self::new(NonZeroUsize::new(DEFAULT_MODEL_CACHE_CAPACITY).unwrap_or(NonZeroUsize::MIN))
    }
}

impl std::fmt::Debug for SemanticEngine {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("SemanticEngine")
            .field("cached_models", &self.cached_models())
            .finish()
    }
}

/// Order corpus positions by descending similarity (ties keep corpus
/// order), keep the first entry per document id, and scale to 0-100.
#[must_use]
pub fn rank(ids: &[DocumentId], similarities: &[f64], documents: &[Document]) -> Vec<PotentialMatch> {
    let mut order: Vec<(usize, f64)> = similarities.iter().copied().enumerate().collect();
    order.sort_by(|a, b| b.1.total_cmp(&a.1));

    let mut seen = HashSet::new();
    order
        .into_iter()
        .filter_map(|(position, similarity)| {
            let id = ids.get(position)?;
            if !seen.insert(id.as_str()) {
                return None;
            }
            Some(PotentialMatch {
                document_id: id.clone(),
                document: documents.iter().find(|doc| &doc.id == id).cloned(),
                confidence: similarity * 100.0,
            })
        })
        .collect()
}

/// Similarity against a precomputed model. Always yields a best guess;
/// it becomes a match only above `threshold`.
#[derive(Debug, Clone, PartialEq)]
pub struct SemanticStrategy {
    pub model: ModelSpec,
    pub threshold: f64,
    pub potential_threshold: f64,
    pub preprocessor: Preprocessor,
}

impl SemanticStrategy {
    /// LSI model, calibrated threshold 78.1.
    pub fn lsa(path: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelSpec::lsa(path),
            threshold: LSA_THRESHOLD,
            potential_threshold: DEFAULT_POTENTIAL_THRESHOLD,
            preprocessor: Preprocessor::with_bigrams(),
        }
    }

    /// Tf-idf model, calibrated threshold 15.
    pub fn tfidf(path: impl Into<PathBuf>) -> Self {
        Self {
            model: ModelSpec::tfidf(path),
            threshold: TFIDF_THRESHOLD,
            potential_threshold: DEFAULT_POTENTIAL_THRESHOLD,
            preprocessor: Preprocessor::with_bigrams(),
        }
    }

    #[must_use]
    pub fn with_threshold(mut self, threshold: f64) -> Self {
        self.threshold = threshold;
        self
    }

    pub fn run(
        &self,
        engine: &SemanticEngine,
        documents: &[Document],
        text: &str,
    ) -> Result<MatchResult> {
        let model = engine.model(&self.model)?;
        let tokens = self.preprocessor.preprocess(text);
        let similarities = model.score(&tokens)?;
        let ranked = rank(model.ids(), &similarities, documents);

        let Some(best) = ranked.first() else {
            log::warn!("Model '{}' produced no candidates", self.model.name);
            return Ok(MatchResult {
                potential_matches: Some(Vec::new()),
                ..MatchResult::default()
            });
        };
        log::debug!(
            "Best {} candidate {} at {:.1}",
            self.model.name,
            best.document_id,
            best.confidence
        );

        let match_id = (best.confidence > self.threshold).then(|| best.document_id.clone());
        let confidence = Some(best.confidence);
        let document = best.document.clone();
        let potential_threshold = self.potential_threshold;
        let potential_matches = ranked
            .into_iter()
            .filter(|m| m.confidence > potential_threshold)
            .collect();

        Ok(MatchResult {
            match_id,
            confidence,
            document,
            potential_matches: Some(potential_matches),
            ..MatchResult::default()
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use planbot_vector_store::{
        Corpus, Dictionary, ModelBuilder, RawCluster, SimilarityIndex, Transform,
    };
    use tempfile::TempDir;

    fn corpus() -> Corpus {
        let plans = vec![
            Document::plan("1", "wealth tax", "Ultra-Millionaire Tax", "u1", "s1")
                .with_full_text("A two cent tax on fortunes above fifty million dollars."),
            Document::plan("2", "green manufacturing", "Green Manufacturing", "u2", "s2")
                .with_full_text("Invest in clean energy manufacturing and climate research."),
            Document::plan("3", "student debt", "Cancel Student Debt", "u3", "s3")
                .with_full_text("Cancel student loan debt and make college tuition free."),
        ];
        let clusters = vec![RawCluster {
            id: "c1".to_string(),
            topic: "climate change".to_string(),
            display_title: "Climate Change".to_string(),
            plan_ids: vec!["2".to_string()],
            additional_training_text: None,
        }];
        Corpus::from_parts(plans, clusters, vec![]).unwrap()
    }

    fn trained(corpus: &Corpus) -> TempDir {
        let temp = TempDir::new().unwrap();
        ModelBuilder::default().build(corpus).unwrap().save(temp.path()).unwrap();
        temp
    }

    #[test]
    fn ranking_dedups_and_keeps_corpus_order_on_ties() {
        let ids: Vec<DocumentId> = ["a", "b", "a", "c"].map(String::from).to_vec();
        let ranked = rank(&ids, &[0.5, 0.9, 0.95, 0.5], &[]);
        let order: Vec<&str> = ranked.iter().map(|m| m.document_id.as_str()).collect();
        assert_eq!(order, vec!["a", "b", "c"]);
        assert!((ranked[0].confidence - 95.0).abs() < 1e-9);
        assert!(ranked[0].document.is_none());
    }

    #[test]
    fn engine_loads_each_spec_once() {
        let corpus = corpus();
        let dir = trained(&corpus);
        let engine = SemanticEngine::default();
        let spec = ModelSpec::tfidf(dir.path());

        let first = engine.model(&spec).unwrap();
        let second = engine.model(&spec).unwrap();
        assert!(Arc::ptr_eq(&first, &second));
        assert_eq!(engine.cached_models(), 1);

        engine.model(&ModelSpec::lsa(dir.path())).unwrap();
        assert_eq!(engine.cached_models(), 2);
    }

    #[test]
    fn failed_load_is_not_cached() {
        let temp = TempDir::new().unwrap();
        let engine = SemanticEngine::default();
        assert!(engine.model(&ModelSpec::lsa(temp.path())).is_err());
        assert_eq!(engine.cached_models(), 0);
    }

    #[test]
    fn tfidf_strategy_matches_and_suggests() {
        let corpus = corpus();
        let dir = trained(&corpus);
        let engine = SemanticEngine::default();
        let strategy = SemanticStrategy::tfidf(dir.path());

        let result = strategy
            .run(&engine, corpus.documents(), "cancel my student loans")
            .unwrap();
        assert_eq!(result.match_id.as_deref(), Some("3"));
        assert_eq!(result.document.as_ref().map(|d| d.id.as_str()), Some("3"));
        let potentials = result.potential_matches();
        assert!(potentials.iter().all(|m| m.confidence > DEFAULT_POTENTIAL_THRESHOLD));
        assert!(potentials.windows(2).all(|w| w[0].confidence >= w[1].confidence));
    }

    #[test]
    fn unrelated_text_is_not_a_match() {
        let corpus = corpus();
        let dir = trained(&corpus);
        let engine = SemanticEngine::default();
        let result = SemanticStrategy::lsa(dir.path())
            .run(&engine, corpus.documents(), "zebra xylophone")
            .unwrap();
        assert!(result.match_id.is_none());
        assert_eq!(result.confidence, Some(0.0));
        assert!(result.potential_matches().is_empty());
    }

    #[test]
    fn empty_model_yields_empty_result() {
        let temp = TempDir::new().unwrap();
        let dictionary = Dictionary::fit(&[]);
        let transform = Transform::tfidf(&dictionary);
        let index = SimilarityIndex::from_vectors(0, &[]).unwrap();
        SemanticModel::new(vec![], dictionary, transform, index)
            .unwrap()
            .save(temp.path(), "tfidf")
            .unwrap();

        let result = SemanticStrategy::tfidf(temp.path())
            .run(&SemanticEngine::default(), &[], "anything")
            .unwrap();
        assert!(result.match_id.is_none());
        assert_eq!(result.potential_matches, Some(Vec::new()));
    }
}
