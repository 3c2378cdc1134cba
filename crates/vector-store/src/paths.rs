use std::path::{Path, PathBuf};

use serde::de::DeserializeOwned;
use serde::Serialize;

use crate::error::{Result, VectorStoreError};

pub const PLANS_FILE_NAME: &str = "plans.json";
pub const CLUSTERS_FILE_NAME: &str = "plan_clusters.json";
pub const VERBATIMS_FILE_NAME: &str = "verbatims.json";
pub const PLAN_TEXT_DIR_NAME: &str = "plan_text";

pub const IDS_FILE_NAME: &str = "plan_ids.json";
pub const DICTIONARY_FILE_NAME: &str = "plans.dict.json";

/// File layout of one named model inside an artifact directory.
///
/// The id list and the dictionary are shared by every model trained in the
/// same directory; the transform and index are per model name.
#[derive(Debug, Clone)]
pub struct ModelPaths {
    dir: PathBuf,
    name: String,
}

impl ModelPaths {
    pub fn new(dir: impl AsRef<Path>, name: &str) -> Self {
        Self {
            dir: dir.as_ref().to_path_buf(),
            name: name.to_string(),
        }
    }

    #[must_use]
    pub fn ids(&self) -> PathBuf {
        self.dir.join(IDS_FILE_NAME)
    }

    #[must_use]
    pub fn dictionary(&self) -> PathBuf {
        self.dir.join(DICTIONARY_FILE_NAME)
    }

    #[must_use]
    pub fn transform(&self) -> PathBuf {
        self.dir.join(format!("{}.model.json", self.name))
    }

    #[must_use]
    pub fn index(&self) -> PathBuf {
        self.dir.join(format!("{}.index.json", self.name))
    }
}

pub(crate) fn read_json<T: DeserializeOwned>(path: &Path) -> Result<T> {
    if !path.exists() {
        return Err(VectorStoreError::MissingArtifact(path.to_path_buf()));
    }
    let bytes = std::fs::read(path)?;
    serde_json::from_slice(&bytes).map_err(|err| {
        VectorStoreError::InvalidArtifact(format!("{}: {err}", path.display()))
    })
}

/// Write through a temp file so readers never observe a half-written artifact.
pub(crate) fn write_json_atomic<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    if let Some(parent) = path.parent() {
        std::fs::create_dir_all(parent)?;
    }
    let bytes = serde_json::to_vec(value)?;
    let tmp = path.with_extension("json.tmp");
    std::fs::write(&tmp, bytes)?;
    if let Err(err) = std::fs::rename(&tmp, path) {
        let _ = std::fs::remove_file(&tmp);
        return Err(err.into());
    }
    Ok(())
}
