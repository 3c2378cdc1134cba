use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

/// Sparse bag of terms: `(term_id, weight)` sorted by term id.
pub type SparseVector = Vec<(usize, f64)>;

/// Fixed vocabulary mapping tokens to term ids, with document frequencies.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Dictionary {
    token2id: BTreeMap<String, usize>,
    /// Document frequency per term id
    dfs: Vec<usize>,
    num_docs: usize,
}

impl Dictionary {
    /// Fit a vocabulary over tokenized training documents.
    ///
    /// Ids are assigned in order of first appearance; within one document
    /// new tokens are numbered in sorted order.
    pub fn fit(documents: &[Vec<String>]) -> Self {
        let mut token2id = BTreeMap::new();
        let mut dfs = Vec::new();

        for doc in documents {
            let unique: BTreeSet<&str> = doc.iter().map(String::as_str).collect();
            for token in unique {
                let next = token2id.len();
                let id = *token2id.entry(token.to_string()).or_insert(next);
                if id == dfs.len() {
                    dfs.push(0);
                }
                dfs[id] += 1;
            }
        }

        Self {
            token2id,
            dfs,
            num_docs: documents.len(),
        }
    }

    /// Count known tokens; unknown tokens are dropped.
    pub fn doc2bow(&self, tokens: &[String]) -> SparseVector {
        let mut counts: BTreeMap<usize, f64> = BTreeMap::new();
        for token in tokens {
            if let Some(&id) = self.token2id.get(token) {
                *counts.entry(id).or_insert(0.0) += 1.0;
            }
        }
        counts.into_iter().collect()
    }

    #[must_use]
    pub fn id(&self, token: &str) -> Option<usize> {
        self.token2id.get(token).copied()
    }

    #[must_use]
    pub fn len(&self) -> usize {
        self.dfs.len()
    }

    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.dfs.is_empty()
    }

    #[must_use]
    pub fn dfs(&self) -> &[usize] {
        &self.dfs
    }

    #[must_use]
    pub const fn num_docs(&self) -> usize {
        self.num_docs
    }

    pub(crate) fn is_consistent(&self) -> bool {
        self.token2id.len() == self.dfs.len() && self.token2id.values().all(|&id| id < self.dfs.len())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn doc(words: &[&str]) -> Vec<String> {
        words.iter().map(|w| w.to_string()).collect()
    }

    #[test]
    fn fit_counts_document_frequency_once_per_doc() {
        let dict = Dictionary::fit(&[doc(&["tax", "wealth", "tax"]), doc(&["wealth", "climat"])]);
        assert_eq!(dict.len(), 3);
        assert_eq!(dict.num_docs(), 2);
        assert_eq!(dict.dfs()[dict.id("wealth").unwrap()], 2);
        assert_eq!(dict.dfs()[dict.id("tax").unwrap()], 1);
    }

    #[test]
    fn doc2bow_drops_unknown_terms() {
        let dict = Dictionary::fit(&[doc(&["tax", "wealth"])]);
        let bow = dict.doc2bow(&doc(&["wealth", "unknown", "wealth", "tax"]));
        assert_eq!(bow, vec![(0, 1.0), (1, 2.0)]);
        assert!(dict.doc2bow(&doc(&["nothing"])).is_empty());
    }
}
