use std::path::Path;

use planbot_protocol::{Document, DocumentId};
use planbot_text::Preprocessor;

use crate::corpus::Corpus;
use crate::dictionary::{Dictionary, SparseVector};
use crate::error::{Result, VectorStoreError};
use crate::index::SimilarityIndex;
use crate::lsi::{lsi_projection, DEFAULT_NUM_TOPICS};
use crate::model::{ModelSpec, SemanticModel};
use crate::transform::Transform;

/// The two models trained from one corpus, sharing a dictionary and id list.
#[derive(Debug, Clone)]
pub struct ModelSet {
    pub tfidf: SemanticModel,
    pub lsa: SemanticModel,
}

impl ModelSet {
    /// Write both models into `dir` under their preset names.
    pub fn save(&self, dir: impl AsRef<Path>) -> Result<()> {
        let dir = dir.as_ref();
        self.tfidf.save(dir, &ModelSpec::tfidf(dir).name)?;
        self.lsa.save(dir, &ModelSpec::lsa(dir).name)?;
        log::info!("Wrote models to {}", dir.display());
        Ok(())
    }
}

/// Offline trainer for the semantic models.
///
/// Training documents are every plan's text and every cluster's topic. The
/// matching corpus is the training documents followed by cluster topics,
/// cluster titles, plan topics and plan titles, so a query can hit a plan
/// through its body or through its short labels.
#[derive(Debug, Clone)]
pub struct ModelBuilder {
    preprocessor: Preprocessor,
    num_topics: usize,
}

impl Default for ModelBuilder {
    fn default() -> Self {
        Self {
            preprocessor: Preprocessor::with_bigrams(),
            num_topics: DEFAULT_NUM_TOPICS,
        }
    }
}

impl ModelBuilder {
    #[must_use]
    pub fn with_preprocessor(mut self, preprocessor: Preprocessor) -> Self {
        self.preprocessor = preprocessor;
        self
    }

    #[must_use]
    pub fn with_num_topics(mut self, num_topics: usize) -> Self {
        self.num_topics = num_topics;
        self
    }

    pub fn build(&self, corpus: &Corpus) -> Result<ModelSet> {
        let plans: Vec<&Document> = corpus.pure_plans().collect();
        let clusters: Vec<&Document> = corpus.clusters().collect();
        if plans.is_empty() && clusters.is_empty() {
            return Err(VectorStoreError::InvalidCorpus(
                "cannot train on an empty corpus".to_string(),
            ));
        }

        let training_texts: Vec<String> = plans
            .iter()
            .map(|plan| plan_training_text(plan))
            .chain(clusters.iter().map(|cluster| cluster_training_text(cluster)))
            .collect();

        let matching_texts: Vec<String> = training_texts
            .iter()
            .cloned()
            .chain(clusters.iter().map(|c| c.topic.clone()))
            .chain(clusters.iter().map(|c| c.display_title.clone()))
            .chain(plans.iter().map(|p| p.topic.clone()))
            .chain(plans.iter().map(|p| p.display_title.clone()))
            .collect();

        let ids: Vec<DocumentId> = plans
            .iter()
            .chain(clusters.iter())
            .chain(clusters.iter())
            .chain(clusters.iter())
            .chain(plans.iter())
            .chain(plans.iter())
            .map(|doc| doc.id.clone())
            .collect();

        let training_tokens: Vec<Vec<String>> = training_texts
            .iter()
            .map(|text| self.preprocessor.preprocess(text))
            .collect();
        let matching_tokens: Vec<Vec<String>> = matching_texts
            .iter()
            .map(|text| self.preprocessor.preprocess(text))
            .collect();

        let dictionary = Dictionary::fit(&training_tokens);
        let training_bows: Vec<SparseVector> = training_tokens
            .iter()
            .map(|tokens| dictionary.doc2bow(tokens))
            .collect();
        let matching_bows: Vec<SparseVector> = matching_tokens
            .iter()
            .map(|tokens| dictionary.doc2bow(tokens))
            .collect();
        log::info!(
            "Training on {} documents ({} terms), matching against {}",
            training_bows.len(),
            dictionary.len(),
            matching_bows.len()
        );

        let tfidf_transform = Transform::tfidf(&dictionary);
        let weighted = training_bows
            .iter()
            .map(|bow| tfidf_transform.weigh_sparse(bow))
            .collect::<Result<Vec<_>>>()?;
        let lsi_transform = Transform::Lsi {
            projection: lsi_projection(&weighted, dictionary.len(), self.num_topics),
        };

        let tfidf = Self::assemble(&ids, &dictionary, tfidf_transform, &matching_bows)?;
        let lsa = Self::assemble(&ids, &dictionary, lsi_transform, &matching_bows)?;
        Ok(ModelSet { tfidf, lsa })
    }

    fn assemble(
        ids: &[DocumentId],
        dictionary: &Dictionary,
        transform: Transform,
        matching_bows: &[SparseVector],
    ) -> Result<SemanticModel> {
        let vectors = matching_bows
            .iter()
            .map(|bow| transform.apply(bow))
            .collect::<Result<Vec<_>>>()?;
        let index = SimilarityIndex::from_vectors(transform.output_dim(), &vectors)?;
        SemanticModel::new(ids.to_vec(), dictionary.clone(), transform, index)
    }
}

/// Plans without scraped text train on their summary instead.
fn plan_training_text(plan: &Document) -> String {
    let body = plan.full_text.as_deref().unwrap_or(&plan.summary);
    format!(
        "{body}\n{}\n{}",
        plan.additional_training_text.as_deref().unwrap_or_default(),
        plan.display_title
    )
}

fn cluster_training_text(cluster: &Document) -> String {
    format!(
        "{}\n{}\n{}",
        cluster.topic,
        cluster.additional_training_text.as_deref().unwrap_or_default(),
        cluster.display_title
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::corpus::RawCluster;
    use crate::model::ModelSpec;
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
            additional_training_text: Some("global warming emissions".to_string()),
        }];
        Corpus::from_parts(plans, clusters, vec![]).unwrap()
    }

    #[test]
    fn id_list_follows_matching_document_order() {
        let models = ModelBuilder::default().build(&corpus()).unwrap();
        let ids: Vec<&str> = models.tfidf.ids().iter().map(String::as_str).collect();
        assert_eq!(
            ids,
            vec!["1", "2", "3", "c1", "c1", "c1", "1", "2", "3", "1", "2", "3"]
        );
        assert_eq!(models.lsa.ids(), models.tfidf.ids());
    }

    #[test]
    fn both_models_rank_the_relevant_plan_first() {
        let models = ModelBuilder::default().build(&corpus()).unwrap();
        let query = Preprocessor::with_bigrams().preprocess("cancel my student loans");
        for model in [&models.tfidf, &models.lsa] {
            let sims = model.score(&query).unwrap();
            let best = sims
                .iter()
                .enumerate()
                .max_by(|a, b| a.1.total_cmp(b.1))
                .map(|(i, _)| model.ids()[i].clone())
                .unwrap();
            assert_eq!(best, "3");
        }
    }

    #[test]
    fn saved_models_load_through_presets() {
        let temp = TempDir::new().unwrap();
        ModelBuilder::default().build(&corpus()).unwrap().save(temp.path()).unwrap();
        assert!(SemanticModel::load(&ModelSpec::tfidf(temp.path())).is_ok());
        assert!(SemanticModel::load(&ModelSpec::lsa(temp.path())).is_ok());
    }

    #[test]
    fn empty_corpus_is_rejected() {
        let empty = Corpus::from_parts(vec![], vec![], vec![]).unwrap();
        assert!(ModelBuilder::default().build(&empty).is_err());
    }
}
