use ndarray::{Array1, Array2};
use serde::{Deserialize, Serialize};

use crate::dictionary::{Dictionary, SparseVector};
use crate::error::{Result, VectorStoreError};

/// Trained projection from a bag of terms into the model's vector space.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum Transform {
    /// `tf * log2(N / df)`, L2-normalized
    Tfidf { idfs: Vec<f64> },
    /// Latent semantic projection, `topics × terms`
    Lsi { projection: Array2<f64> },
}

impl Transform {
    /// Inverse document frequencies from a fitted dictionary.
    pub fn tfidf(dictionary: &Dictionary) -> Self {
        let n = dictionary.num_docs() as f64;
        let idfs = dictionary
            .dfs()
            .iter()
            .map(|&df| if df == 0 { 0.0 } else { (n / df as f64).log2() })
            .collect();
        Self::Tfidf { idfs }
    }

    /// Width of the bag-of-terms vectors this transform accepts.
    #[must_use]
    pub fn input_dim(&self) -> usize {
        match self {
            Self::Tfidf { idfs } => idfs.len(),
            Self::Lsi { projection } => projection.ncols(),
        }
    }

    /// Width of the projected vectors.
    #[must_use]
    pub fn output_dim(&self) -> usize {
        match self {
            Self::Tfidf { idfs } => idfs.len(),
            Self::Lsi { projection } => projection.nrows(),
        }
    }

    /// Tf-idf weights kept sparse; used by the LSI builder.
    pub fn weigh_sparse(&self, bow: &SparseVector) -> Result<SparseVector> {
        let Self::Tfidf { idfs } = self else {
            return Err(VectorStoreError::InvalidArtifact(
                "sparse weighting requires a tfidf transform".to_string(),
            ));
        };
        let mut weighted: SparseVector = bow
            .iter()
            .filter_map(|&(id, tf)| {
                let w = tf * idfs.get(id).copied().unwrap_or(0.0);
                (w != 0.0).then_some((id, w))
            })
            .collect();
        let norm = weighted.iter().map(|(_, w)| w * w).sum::<f64>().sqrt();
        if norm > 0.0 {
            for (_, w) in &mut weighted {
                *w /= norm;
            }
        }
        Ok(weighted)
    }

    /// Project a bag of terms into a dense vector.
    pub fn apply(&self, bow: &SparseVector) -> Result<Array1<f64>> {
        let input_dim = self.input_dim();
        if let Some(&(id, _)) = bow.iter().find(|(id, _)| *id >= input_dim) {
            return Err(VectorStoreError::InvalidDimension {
                expected: input_dim,
                actual: id + 1,
            });
        }

        match self {
            Self::Tfidf { .. } => {
                let mut dense = Array1::zeros(input_dim);
                for (id, w) in self.weigh_sparse(bow)? {
                    dense[id] = w;
                }
                Ok(dense)
            }
            Self::Lsi { projection } => {
                let mut dense = Array1::zeros(projection.nrows());
                for &(id, count) in bow {
                    dense.scaled_add(count, &projection.column(id));
                }
                Ok(dense)
            }
        }
    }
}
