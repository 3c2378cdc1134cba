use ndarray::{Array1, Array2, ArrayView1, Axis};
use serde::{Deserialize, Serialize};

use crate::error::{Result, VectorStoreError};

/// Similarity measure used when scoring a query against the index.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum SimilarityKind {
    #[default]
    Cosine,
}

/// Dense matrix of unit-length document vectors, one row per matchable
/// document. Brute-force scan; the corpus is a few hundred rows.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SimilarityIndex {
    #[serde(default)]
    kind: SimilarityKind,
    rows: Array2<f64>,
}

impl SimilarityIndex {
    /// Build from projected document vectors of equal width.
    pub fn from_vectors(num_features: usize, vectors: &[Array1<f64>]) -> Result<Self> {
        let mut rows = Array2::zeros((vectors.len(), num_features));
        for (i, vector) in vectors.iter().enumerate() {
            if vector.len() != num_features {
                return Err(VectorStoreError::InvalidDimension {
                    expected: num_features,
                    actual: vector.len(),
                });
            }
            rows.row_mut(i).assign(&normalized(vector.view()));
        }
        Ok(Self {
            kind: SimilarityKind::Cosine,
            rows,
        })
    }

    /// Cosine similarity of `query` with every row, in row order.
    ///
    /// A zero query scores zero everywhere.
    pub fn similarities(&self, query: &Array1<f64>) -> Result<Vec<f64>> {
        if query.len() != self.num_features() {
            return Err(VectorStoreError::InvalidDimension {
                expected: self.num_features(),
                actual: query.len(),
            });
        }
        let query = normalized(query.view());
        Ok(self.rows.dot(&query).to_vec())
    }

    #[must_use]
    pub const fn kind(&self) -> SimilarityKind {
        self.kind
    }

    #[must_use]
    pub fn num_features(&self) -> usize {
        self.rows.len_of(Axis(1))
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.rows.len_of(Axis(0))
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.len() == 0
    }
}

fn normalized(vector: ArrayView1<f64>) -> Array1<f64> {
    let norm = vector.dot(&vector).sqrt();
    if norm > 0.0 {
        vector.mapv(|x| x / norm)
    } else {
        vector.to_owned()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use ndarray::array;

    #[test]
    fn scores_rows_by_cosine() {
        let index = SimilarityIndex::from_vectors(
            3,
            &[array![2.0, 0.0, 0.0], array![0.9, 0.1, 0.0], array![0.0, 1.0, 0.0]],
        )
        .unwrap();
        assert_eq!(index.len(), 3);

        let sims = index.similarities(&array![5.0, 0.0, 0.0]).unwrap();
        assert!((sims[0] - 1.0).abs() < 1e-9);
        assert!(sims[1] > 0.9 && sims[1] < 1.0);
        assert!(sims[2].abs() < 1e-9);
    }

    #[test]
    fn zero_query_scores_zero() {
        let index = SimilarityIndex::from_vectors(2, &[array![1.0, 1.0]]).unwrap();
        assert_eq!(index.similarities(&array![0.0, 0.0]).unwrap(), vec![0.0]);
    }

    #[test]
    fn dimension_mismatch() {
        assert!(SimilarityIndex::from_vectors(3, &[array![1.0, 0.0]]).is_err());
        let index = SimilarityIndex::from_vectors(3, &[array![1.0, 0.0, 0.0]]).unwrap();
        assert!(index.similarities(&array![1.0, 0.0]).is_err());
    }

    #[test]
    fn empty_index_has_no_rows() {
        let index = SimilarityIndex::from_vectors(4, &[]).unwrap();
        assert!(index.is_empty());
        assert!(index.similarities(&Array1::zeros(4)).unwrap().is_empty());
    }
}
