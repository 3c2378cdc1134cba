use crate::error::{Result, VectorStoreError};
use crate::paths::{
    read_json, CLUSTERS_FILE_NAME, PLANS_FILE_NAME, PLAN_TEXT_DIR_NAME, VERBATIMS_FILE_NAME,
};
use planbot_protocol::{Document, Verbatim};
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;

/// Cluster entry as stored on disk: members are referenced by id.
#[derive(Debug, Clone, Deserialize)]
pub struct RawCluster {
    pub id: String,
    pub topic: String,
    pub display_title: String,
    pub plan_ids: Vec<String>,
    #[serde(default)]
    pub additional_training_text: Option<String>,
}

#[derive(Debug, Deserialize)]
struct PlanText {
    text: String,
}

/// Read-only set of plans, clusters and scripted replies.
#[derive(Debug, Clone, Default)]
pub struct Corpus {
    documents: Vec<Document>,
    verbatims: Vec<Verbatim>,
}

impl Corpus {
    /// Assemble a corpus, resolving cluster members and checking ids.
    pub fn from_parts(
        plans: Vec<Document>,
        clusters: Vec<RawCluster>,
        verbatims: Vec<Verbatim>,
    ) -> Result<Self> {
        let mut seen = HashSet::new();
        for plan in &plans {
            if plan.is_cluster {
                return Err(VectorStoreError::InvalidCorpus(format!(
                    "plan '{}' is marked as a cluster",
                    plan.id
                )));
            }
            if !seen.insert(plan.id.clone()) {
                return Err(VectorStoreError::InvalidCorpus(format!(
                    "duplicate document id '{}'",
                    plan.id
                )));
            }
        }

        let mut documents = plans;
        let pure_count = documents.len();
        for raw in clusters {
            if !seen.insert(raw.id.clone()) {
                return Err(VectorStoreError::InvalidCorpus(format!(
                    "duplicate document id '{}'",
                    raw.id
                )));
            }
            let members = raw
                .plan_ids
                .iter()
                .map(|member_id| {
                    documents[..pure_count]
                        .iter()
                        .find(|plan| &plan.id == member_id)
                        .cloned()
                        .ok_or_else(|| {
                            VectorStoreError::InvalidCorpus(format!(
                                "cluster '{}' references unknown plan '{member_id}'",
                                raw.id
                            ))
                        })
                })
                .collect::<Result<Vec<_>>>()?;
            let mut cluster = Document::cluster(raw.id, raw.topic, raw.display_title, members);
            cluster.additional_training_text = raw.additional_training_text;
            documents.push(cluster);
        }

        Ok(Self {
            documents,
            verbatims,
        })
    }

    /// Load `plans.json`, `plan_clusters.json`, `verbatims.json` and any
    /// `plan_text/<id>.json` full texts from `dir`.
    pub fn load(dir: impl AsRef<Path>) -> Result<Self> {
        let dir = dir.as_ref();
        log::info!("Loading corpus from {}", dir.display());

        let mut plans: Vec<Document> = read_json(&dir.join(PLANS_FILE_NAME))?;
        let text_dir = dir.join(PLAN_TEXT_DIR_NAME);
        for plan in &mut plans {
            let text_path = text_dir.join(format!("{}.json", plan.id));
            if text_path.exists() {
                let text: PlanText = read_json(&text_path)?;
                plan.full_text = Some(text.text);
            }
        }

        let clusters_path = dir.join(CLUSTERS_FILE_NAME);
        let clusters: Vec<RawCluster> = if clusters_path.exists() {
            read_json(&clusters_path)?
        } else {
            Vec::new()
        };

        let verbatims_path = dir.join(VERBATIMS_FILE_NAME);
        let verbatims: Vec<Verbatim> = if verbatims_path.exists() {
            read_json(&verbatims_path)?
        } else {
            Vec::new()
        };

        let corpus = Self::from_parts(plans, clusters, verbatims)?;
        log::info!(
            "Loaded {} documents and {} verbatims",
            corpus.documents.len(),
            corpus.verbatims.len()
        );
        Ok(corpus)
    }

    /// Pure plans first, then clusters.
    #[must_use]
    pub fn documents(&self) -> &[Document] {
        &self.documents
    }

    #[must_use]
    pub fn verbatims(&self) -> &[Verbatim] {
        &self.verbatims
    }

    pub fn pure_plans(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|doc| !doc.is_cluster)
    }

    pub fn clusters(&self) -> impl Iterator<Item = &Document> {
        self.documents.iter().filter(|doc| doc.is_cluster)
    }

    #[must_use]
    pub fn get(&self, id: &str) -> Option<&Document> {
        self.documents.iter().find(|doc| doc.id == id)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    fn plan(id: &str) -> Document {
        Document::plan(id, format!("{id} topic"), format!("{id} title"), "u", "s")
    }

    fn cluster(id: &str, members: &[&str]) -> RawCluster {
        RawCluster {
            id: id.to_string(),
            topic: "cluster topic".to_string(),
            display_title: "Cluster".to_string(),
            plan_ids: members.iter().map(|s| s.to_string()).collect(),
            additional_training_text: None,
        }
    }

    #[test]
    fn resolves_cluster_members() {
        let corpus = Corpus::from_parts(
            vec![plan("a"), plan("b")],
            vec![cluster("c", &["b", "a"])],
            vec![],
        )
        .unwrap();
        let c = corpus.get("c").unwrap();
        assert!(c.is_cluster);
        assert_eq!(c.members[0].id, "b");
        assert_eq!(corpus.pure_plans().count(), 2);
        assert_eq!(corpus.clusters().count(), 1);
    }

    #[test]
    fn rejects_duplicate_ids_and_dangling_members() {
        assert!(Corpus::from_parts(vec![plan("a"), plan("a")], vec![], vec![]).is_err());
        assert!(Corpus::from_parts(vec![plan("a")], vec![cluster("a", &[])], vec![]).is_err());
        assert!(Corpus::from_parts(vec![plan("a")], vec![cluster("c", &["zz"])], vec![]).is_err());
    }

    #[test]
    fn loads_directory_with_full_texts() {
        let temp = TempDir::new().unwrap();
        let dir = temp.path();
        std::fs::write(
            dir.join(PLANS_FILE_NAME),
            r#"[{"id": 7, "topic": "housing", "display_title": "Housing", "url": "u", "summary": "s"}]"#,
        )
        .unwrap();
        std::fs::create_dir_all(dir.join(PLAN_TEXT_DIR_NAME)).unwrap();
        std::fs::write(
            dir.join(PLAN_TEXT_DIR_NAME).join("7.json"),
            r#"{"text": "affordable housing for everyone"}"#,
        )
        .unwrap();
        std::fs::write(
            dir.join(VERBATIMS_FILE_NAME),
            r#"[{"id": "basic_help", "text": "Basic help."}]"#,
        )
        .unwrap();

        let corpus = Corpus::load(dir).unwrap();
        assert_eq!(corpus.documents().len(), 1);
        assert_eq!(
            corpus.get("7").unwrap().full_text.as_deref(),
            Some("affordable housing for everyone")
        );
        assert_eq!(corpus.verbatims()[0].id, "basic_help");
    }

    #[test]
    fn missing_plans_file_is_reported() {
        let temp = TempDir::new().unwrap();
        let err = Corpus::load(temp.path()).unwrap_err();
        assert!(matches!(err, VectorStoreError::MissingArtifact(_)));
    }
}
