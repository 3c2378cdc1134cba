//! # Plan Bot Vector Store
//!
//! Corpus loading and the static vector-space models the semantic matcher
//! scores against.
//!
//! ## Architecture
//!
//! ```text
//! corpus dir (plans.json, plan_clusters.json, verbatims.json, plan_text/)
//!     │
//!     ├──> Corpus ─────────────> documents + verbatims (read-only)
//!     │
//!     └──> ModelBuilder (offline)
//!            ├─> Dictionary      token -> term id, document frequencies
//!            ├─> Transform       tf-idf weights | LSI projection
//!            ├─> SimilarityIndex unit-length rows, cosine scoring
//!            └─> plan_ids.json   row -> document id
//!
//! model dir ──> SemanticModel::load(spec) ──> score(tokens) -> Vec<f64>
//! ```
//!
//! Artifacts are plain JSON written atomically; a model only loads when all
//! four files are present and agree on their dimensions.
//!
//! ## Example
//!
//! ```no_run
//! use planbot_text::Preprocessor;
//! use planbot_vector_store::{ModelSpec, SemanticModel};
//!
//! fn main() -> planbot_vector_store::Result<()> {
//!     let model = SemanticModel::load(&ModelSpec::lsa("models"))?;
//!     let tokens = Preprocessor::with_bigrams().preprocess("cancel student debt");
//!     let scores = model.score(&tokens)?;
//!     println!("{} scores", scores.len());
//!     Ok(())
//! }
//! ```

mod builder;
mod corpus;
mod dictionary;
mod error;
mod index;
mod lsi;
mod model;
mod paths;
mod transform;

pub use builder::{ModelBuilder, ModelSet};
pub use corpus::{Corpus, RawCluster};
pub use dictionary::{Dictionary, SparseVector};
pub use error::{Result, VectorStoreError};
pub use index::{SimilarityIndex, SimilarityKind};
pub use lsi::{jacobi_eigen, lsi_projection, DEFAULT_NUM_TOPICS};
pub use model::{ModelKind, ModelSpec, SemanticModel};
pub use paths::{
    ModelPaths, CLUSTERS_FILE_NAME, DICTIONARY_FILE_NAME, IDS_FILE_NAME, PLANS_FILE_NAME,
    PLAN_TEXT_DIR_NAME, VERBATIMS_FILE_NAME,
};
pub use transform::Transform;
