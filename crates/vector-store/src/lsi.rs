//! Truncated SVD of the weighted term-document matrix.
//!
//! With `A` the `terms × docs` matrix, the eigenvectors `v` of the document
//! Gram matrix `AᵀA` give the left singular vectors as `u = A v / sqrt(λ)`.
//! The corpus has a few hundred documents at most, so the dense `docs × docs`
//! eigenproblem is solved directly with cyclic Jacobi rotations.

use ndarray::{Array1, Array2};

use crate::dictionary::SparseVector;

/// Upper bound on retained topics.
pub const DEFAULT_NUM_TOPICS: usize = 300;

const MAX_SWEEPS: usize = 100;
const OFF_DIAGONAL_EPS: f64 = 1e-12;
const RELATIVE_RANK_CUTOFF: f64 = 1e-10;

/// `topics × terms` projection whose rows are the leading left singular
/// vectors of the matrix whose columns are `docs`.
pub fn lsi_projection(docs: &[SparseVector], num_terms: usize, max_topics: usize) -> Array2<f64> {
    let gram = gram_matrix(docs);
    let (values, vectors) = jacobi_eigen(gram);

    let mut order: Vec<usize> = (0..values.len()).collect();
    order.sort_by(|&a, &b| values[b].total_cmp(&values[a]));

    let largest = order.first().map_or(0.0, |&i| values[i]);
    let kept: Vec<usize> = order
        .into_iter()
        .filter(|&i| values[i] > 0.0 && values[i] > largest * RELATIVE_RANK_CUTOFF)
        .take(max_topics)
        .collect();

    let mut projection = Array2::zeros((kept.len(), num_terms));
    for (topic, &i) in kept.iter().enumerate() {
        let scale = values[i].sqrt();
        let mut row = projection.row_mut(topic);
        for (doc, weights) in docs.iter().enumerate() {
            let coeff = vectors[[doc, i]] / scale;
            for &(term, w) in weights {
                if term < num_terms {
                    row[term] += w * coeff;
                }
            }
        }
        // Fix the sign so rebuilding the same corpus yields the same artifact.
        let pivot = row
            .iter()
            .copied()
            .max_by(|a: &f64, b: &f64| a.abs().total_cmp(&b.abs()))
            .unwrap_or(0.0);
        if pivot < 0.0 {
            row.mapv_inplace(|x| -x);
        }
    }

    log::debug!(
        "LSI kept {} of {} topics over {} terms",
        kept.len(),
        values.len(),
        num_terms
    );
    projection
}

fn gram_matrix(docs: &[SparseVector]) -> Array2<f64> {
    let n = docs.len();
    let mut gram = Array2::zeros((n, n));
    for i in 0..n {
        for j in i..n {
            let dot = sparse_dot(&docs[i], &docs[j]);
            gram[[i, j]] = dot;
            gram[[j, i]] = dot;
        }
    }
    gram
}

fn sparse_dot(a: &SparseVector, b: &SparseVector) -> f64 {
    let (mut i, mut j, mut sum) = (0, 0, 0.0);
    while i < a.len() && j < b.len() {
        match a[i].0.cmp(&b[j].0) {
            std::cmp::Ordering::Less => i += 1,
            std::cmp::Ordering::Greater => j += 1,
            std::cmp::Ordering::Equal => {
                sum += a[i].1 * b[j].1;
                i += 1;
                j += 1;
            }
        }
    }
    sum
}

/// Eigen-decomposition of a symmetric matrix: `(eigenvalues, eigenvectors)`
/// with eigenvectors as columns, in no particular order.
pub fn jacobi_eigen(mut a: Array2<f64>) -> (Array1<f64>, Array2<f64>) {
    let n = a.nrows();
    let mut v = Array2::eye(n);

    for _ in 0..MAX_SWEEPS {
        let off: f64 = (0..n)
            .flat_map(|p| ((p + 1)..n).map(move |q| (p, q)))
            .map(|(p, q)| a[[p, q]] * a[[p, q]])
            .sum();
        if off.sqrt() < OFF_DIAGONAL_EPS {
            break;
        }

        for p in 0..n {
            for q in (p + 1)..n {
                let apq = a[[p, q]];
                if apq.abs() < f64::MIN_POSITIVE {
                    continue;
                }
                let theta = (a[[q, q]] - a[[p, p]]) / (2.0 * apq);
                let t = theta.signum() / (theta.abs() + (theta * theta + 1.0).sqrt());
                let c = 1.0 / (t * t + 1.0).sqrt();
                let s = t * c;

                for k in 0..n {
                    let (akp, akq) = (a[[k, p]], a[[k, q]]);
                    a[[k, p]] = c * akp - s * akq;
                    a[[k, q]] = s * akp + c * akq;
                }
                for k in 0..n {
                    let (apk, aqk) = (a[[p, k]], a[[q, k]]);
                    a[[p, k]] = c * apk - s * aqk;
                    a[[q, k]] = s * apk + c * aqk;
                }
                for k in 0..n {
                    let (vkp, vkq) = (v[[k, p]], v[[k, q]]);
                    v[[k, p]] = c * vkp - s * vkq;
                    v[[k, q]] = s * vkp + c * vkq;
                }
            }
        }
    }

    (a.diag().to_owned(), v)
}
