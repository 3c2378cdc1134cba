use std::path::{Path, PathBuf};

use planbot_protocol::DocumentId;
use serde::{Deserialize, Serialize};

use crate::dictionary::Dictionary;
use crate::error::{Result, VectorStoreError};
use crate::index::{SimilarityIndex, SimilarityKind};
use crate::paths::{read_json, write_json_atomic, ModelPaths};
use crate::transform::Transform;

/// Family of trained transform stored under a model name.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ModelKind {
    Tfidf,
    Lsi,
}

impl ModelKind {
    #[must_use]
    pub const fn as_str(self) -> &'static str {
        match self {
            Self::Tfidf => "tfidf",
            Self::Lsi => "lsi",
        }
    }

    fn matches(self, transform: &Transform) -> bool {
        matches!(
            (self, transform),
            (Self::Tfidf, Transform::Tfidf { .. }) | (Self::Lsi, Transform::Lsi { .. })
        )
    }
}

/// Everything that identifies one loaded model; used as the cache key.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct ModelSpec {
    pub name: String,
    pub kind: ModelKind,
    pub similarity: SimilarityKind,
    pub path: PathBuf,
}

impl ModelSpec {
    pub fn new(name: impl Into<String>, kind: ModelKind, path: impl Into<PathBuf>) -> Self {
        Self {
            name: name.into(),
            kind,
            similarity: SimilarityKind::Cosine,
            path: path.into(),
        }
    }

    /// The `lsa` model: LSI projection, cosine similarity.
    pub fn lsa(path: impl Into<PathBuf>) -> Self {
        Self::new("lsa", ModelKind::Lsi, path)
    }

    /// The `tfidf` model: tf-idf weighting, cosine similarity.
    pub fn tfidf(path: impl Into<PathBuf>) -> Self {
        Self::new("tfidf", ModelKind::Tfidf, path)
    }

    #[must_use]
    pub fn paths(&self) -> ModelPaths {
        ModelPaths::new(&self.path, &self.name)
    }
}

/// A loaded, validated model: the corpus id list with the dictionary,
/// transform and index trained for it. Immutable once built.
#[derive(Debug, Clone)]
pub struct SemanticModel {
    ids: Vec<DocumentId>,
    dictionary: Dictionary,
    transform: Transform,
    index: SimilarityIndex,
}

impl SemanticModel {
    pub fn new(
        ids: Vec<DocumentId>,
        dictionary: Dictionary,
        transform: Transform,
        index: SimilarityIndex,
    ) -> Result<Self> {
        let model = Self {
            ids,
            dictionary,
            transform,
            index,
        };
        model.validate()?;
        Ok(model)
    }

    /// Read all four artifacts; nothing is returned unless every one loads
    /// and they agree with each other and with `spec`.
    pub fn load(spec: &ModelSpec) -> Result<Self> {
        let paths = spec.paths();
        log::info!("Loading model '{}' from {}", spec.name, spec.path.display());

        let ids: Vec<DocumentId> = read_json(&paths.ids())?;
        let dictionary: Dictionary = read_json(&paths.dictionary())?;
        let transform: Transform = read_json(&paths.transform())?;
        let index: SimilarityIndex = read_json(&paths.index())?;

        if !spec.kind.matches(&transform) {
            return Err(VectorStoreError::InvalidArtifact(format!(
                "{}: expected a {} transform",
                paths.transform().display(),
                spec.kind.as_str()
            )));
        }
        if index.kind() != spec.similarity {
            return Err(VectorStoreError::InvalidArtifact(format!(
                "{}: similarity kind mismatch",
                paths.index().display()
            )));
        }

        let model = Self::new(ids, dictionary, transform, index)?;
        log::debug!(
            "Model '{}': {} entries, {} terms, {} features",
            spec.name,
            model.len(),
            model.dictionary.len(),
            model.index.num_features()
        );
        Ok(model)
    }

    /// Write the four artifacts under `dir` using `name` for the per-model files.
    pub fn save(&self, dir: impl AsRef<Path>, name: &str) -> Result<()> {
        let paths = ModelPaths::new(dir, name);
        write_json_atomic(&paths.ids(), &self.ids)?;
        write_json_atomic(&paths.dictionary(), &self.dictionary)?;
        write_json_atomic(&paths.transform(), &self.transform)?;
        write_json_atomic(&paths.index(), &self.index)?;
        Ok(())
    }

    pub fn validate(&self) -> Result<()> {
        if !self.dictionary.is_consistent() {
            return Err(VectorStoreError::InvalidArtifact(
                "dictionary ids and frequencies disagree".to_string(),
            ));
        }
        if self.index.len() != self.ids.len() {
            return Err(VectorStoreError::InvalidArtifact(format!(
                "index has {} rows but id list has {} entries",
                self.index.len(),
                self.ids.len()
            )));
        }
        if self.transform.input_dim() != self.dictionary.len() {
            return Err(VectorStoreError::InvalidArtifact(format!(
                "transform expects {} terms but dictionary has {}",
                self.transform.input_dim(),
                self.dictionary.len()
            )));
        }
        if self.transform.output_dim() != self.index.num_features() {
            return Err(VectorStoreError::InvalidArtifact(format!(
                "transform produces {} features but index stores {}",
                self.transform.output_dim(),
                self.index.num_features()
            )));
        }
        Ok(())
    }

    /// One similarity per corpus position, in id-list order.
    pub fn score(&self, tokens: &[String]) -> Result<Vec<f64>> {
        let bow = self.dictionary.doc2bow(tokens);
        let projected = self.transform.apply(&bow)?;
        self.index.similarities(&projected)
    }

    #[must_use]
    pub fn ids(&self) -> &[DocumentId] {
        &self.ids
    }

    #[must_use]
    pub fn dictionary(&self) -> &Dictionary {
        &self.dictionary
    }

    #[must_use]
    pub fn transform(&self) -> &Transform {
        &self.transform
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.ids.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.ids.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn tokens(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    fn tiny_model() -> SemanticModel {
        let docs = vec![tokens(&["tax", "wealth"]), tokens(&["climat", "chang"])];
        let dictionary = Dictionary::fit(&docs);
        let transform = Transform::tfidf(&dictionary);
        let vectors = docs
            .iter()
            .map(|d| transform.apply(&dictionary.doc2bow(d)).unwrap())
            .collect::<Vec<_>>();
        let index = SimilarityIndex::from_vectors(dictionary.len(), &vectors).unwrap();
        SemanticModel::new(vec!["1".into(), "2".into()], dictionary, transform, index).unwrap()
    }

    #[test]
    fn scores_follow_id_order() {
        let model = tiny_model();
        let sims = model.score(&tokens(&["climat", "unknown"])).unwrap();
        assert_eq!(sims.len(), 2);
        assert!((sims[1] - std::f64::consts::FRAC_1_SQRT_2).abs() < 1e-9);
        assert!(sims[0].abs() < 1e-9);
        assert_eq!(model.score(&tokens(&["unknown"])).unwrap(), vec![0.0, 0.0]);
    }

    #[test]
    fn save_then_load_keeps_scores() {
        let temp = TempDir::new().unwrap();
        let model = tiny_model();
        model.save(temp.path(), "tfidf").unwrap();

        let loaded = SemanticModel::load(&ModelSpec::tfidf(temp.path())).unwrap();
        let query = tokens(&["wealth"]);
        assert_eq!(loaded.ids(), model.ids());
        assert_eq!(loaded.score(&query).unwrap(), model.score(&query).unwrap());
    }

    #[test]
    fn load_rejects_kind_mismatch_and_missing_files() {
        let temp = TempDir::new().unwrap();
        tiny_model().save(temp.path(), "tfidf").unwrap();

        let wrong_kind = ModelSpec::new("tfidf", ModelKind::Lsi, temp.path());
        assert!(matches!(
            SemanticModel::load(&wrong_kind),
            Err(VectorStoreError::InvalidArtifact(_))
        ));
        assert!(matches!(
            SemanticModel::load(&ModelSpec::lsa(temp.path())),
            Err(VectorStoreError::MissingArtifact(_))
        ));
    }

    #[test]
    fn inconsistent_id_list_is_rejected() {
        let model = tiny_model();
        let result = SemanticModel::new(
            vec!["1".into()],
            model.dictionary.clone(),
            model.transform.clone(),
            model.index.clone(),
        );
        assert!(result.is_err());
    }

    #[test]
    fn corrupt_artifact_is_rejected() {
        let temp = TempDir::new().unwrap();
        tiny_model().save(temp.path(), "tfidf").unwrap();
        std::fs::write(temp.path().join("tfidf.index.json"), b"{not json").unwrap();
        assert!(matches!(
            SemanticModel::load(&ModelSpec::tfidf(temp.path())),
            Err(VectorStoreError::InvalidArtifact(_))
        ));
    }
}
