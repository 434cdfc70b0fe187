//! Candidate generation and syntactic filtering.
//!
//! Candidate generation operates over the store's ascending
//! `total_token_num` order. Token-rich blocks union the index buckets of
//! their k-grams; blocks too short for the index path scan forward
//! through the sorted list until the token-count difference exceeds the
//! configured window, which is a valid cutoff because the list is sorted.

use ahash::AHashSet;

use crate::core::blocks::{Block, BlockStore};
use crate::core::config::DetectionConfig;

use super::index::{hash_gram, KGramIndex};

/// Candidate block indices for the block at sorted position `idx`.
///
/// The block itself never appears in its own candidate set.
pub fn generate_candidates(
    store: &BlockStore,
    index: &KGramIndex,
    config: &DetectionConfig,
    idx: usize,
) -> Vec<u32> {
    let block = store.get(idx);
    let k = config.k;

    if block.total_token_num >= config.token_count_threshold && block.action_tokens.len() >= k {
        let mut seen: AHashSet<u32> = AHashSet::new();
        for window in block.action_tokens.windows(k) {
            for &candidate in index.lookup(hash_gram(window)) {
                if candidate as usize != idx {
                    seen.insert(candidate);
                }
            }
        }
        let mut candidates: Vec<u32> = seen.into_iter().collect();
        candidates.sort_unstable();
        candidates
    } else {
        scan_candidates(store, config, idx)
    }
}

/// Bounded forward scan for blocks below the index-path cutoff.
fn scan_candidates(store: &BlockStore, config: &DetectionConfig, idx: usize) -> Vec<u32> {
    let total = store.get(idx).total_token_num;
    let mut candidates = Vec::new();

    for next in (idx + 1)..store.len() {
        let candidate_total = store.get(next).total_token_num;
        if candidate_total - total > config.token_count_differ {
            break;
        }
        candidates.push(next as u32);
    }

    candidates
}

/// Syntactic filter over one candidate pair.
///
/// Retains the pair iff the action-token overlap ratio `ato` meets
/// `beta` and the token-count ratio `tr` meets `theta`. Raising either
/// threshold can only shrink the retained set.
pub fn passes_syntactic_filter(left: &Block, right: &Block, config: &DetectionConfig) -> bool {
    let min_len = left.action_tokens.len().min(right.action_tokens.len());
    let ato = if min_len == 0 {
        0.0
    } else {
        left.shared_action_tokens(right) as f64 / min_len as f64
    };

    let min_total = left.total_token_num.min(right.total_token_num);
    let max_total = left.total_token_num.max(right.total_token_num);
    let tr = if max_total == 0 {
        0.0
    } else {
        f64::from(min_total) / f64::from(max_total)
    };

    ato >= config.beta && tr >= config.theta
}
