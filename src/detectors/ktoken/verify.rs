//! Semantic verification via greedy threshold-descending bipartite
//! matching.

use crate::core::blocks::{Block, SemanticEntry};

/// Cosine similarity of two token vectors.
///
/// Defined as 0 when either vector is empty or has zero magnitude.
pub fn cosine_similarity(left: &[i64], right: &[i64]) -> f64 {
    if left.is_empty() || right.is_empty() {
        return 0.0;
    }

    let mut dot = 0.0f64;
    let mut left_sq = 0.0f64;
    let mut right_sq = 0.0f64;
    for (&l, &r) in left.iter().zip(right.iter()) {
        let (l, r) = (l as f64, r as f64);
        dot += l * r;
        left_sq += l * l;
        right_sq += r * r;
    }

    let magnitude = left_sq.sqrt() * right_sq.sqrt();
    if magnitude == 0.0 {
        0.0
    } else {
        dot / magnitude
    }
}

/// Greedy bipartite matching score between two semantic groups.
///
/// Starting at threshold 1.0, every unmatched cross pair whose cosine
/// similarity reaches the threshold is matched one-to-one and its
/// similarity accumulated; the threshold then descends by `phi` (which
/// is negative) until it reaches 0. The result is the accumulated
/// similarity over `max(|p|, |q|)`, bounded in [0, 1], symmetric in its
/// arguments, and 0 when both groups are empty.
pub fn verify_sim(p: &[SemanticEntry], q: &[SemanticEntry], phi: f64) -> f64 {
    if p.is_empty() && q.is_empty() {
        return 0.0;
    }

    // Pairwise similarities are threshold-independent; compute them once.
    let sims: Vec<Vec<f64>> = p
        .iter()
        .map(|pe| {
            q.iter()
                .map(|qe| cosine_similarity(&pe.vector, &qe.vector))
                .collect()
        })
        .collect();

    let mut p_matched = vec![false; p.len()];
    let mut q_matched = vec![false; q.len()];
    let mut total = 0.0f64;

    let mut threshold = 1.0f64;
    while threshold > 0.0 {
        for (i, row) in sims.iter().enumerate() {
            if p_matched[i] {
                continue;
            }
            for (j, &sim) in row.iter().enumerate() {
                if q_matched[j] || sim < threshold {
                    continue;
                }
                p_matched[i] = true;
                q_matched[j] = true;
                total += sim;
                break;
            }
        }
        threshold += phi;
    }

    total / p.len().max(q.len()) as f64
}

/// Sum of the three semantic group scores for a candidate pair.
pub fn semantic_score(left: &Block, right: &Block, phi: f64) -> f64 {
    verify_sim(&left.variable, &right.variable, phi)
        + verify_sim(&left.relation, &right.relation, phi)
        + verify_sim(&left.method, &right.method, phi)
}

/// Whether a syntactically retained pair is accepted as a clone: the
/// mean of the three group scores must reach `eta`.
pub fn is_semantic_clone(left: &Block, right: &Block, phi: f64, eta: f64) -> bool {
    semantic_score(left, right, phi) >= eta * 3.0
}
