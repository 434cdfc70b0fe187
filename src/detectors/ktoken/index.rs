//! Inverted k-gram index over block action tokens.

use ahash::AHashMap;
use xxhash_rust::xxh3::Xxh3;

use crate::core::blocks::{BlockStore, TokenVector};

/// Inverted index from k-gram structural hash to the blocks containing
/// that gram.
///
/// Built exactly once from the full block store before the parallel
/// phase, then shared read-only across workers. Blocks with fewer than
/// `k` action tokens are not indexed; they stay reachable through the
/// scan fallback of candidate generation. Distinct grams colliding into
/// one bucket only cost extra filtering work downstream, so a fast
/// non-cryptographic hash is used.
#[derive(Debug)]
pub struct KGramIndex {
    k: usize,
    buckets: AHashMap<u64, Vec<u32>>,
}

impl KGramIndex {
    /// Build the index over every block with at least `k` action tokens.
    pub fn build(store: &BlockStore, k: usize) -> Self {
        let mut buckets: AHashMap<u64, Vec<u32>> = AHashMap::new();

        for (idx, block) in store.blocks().iter().enumerate() {
            if block.action_tokens.len() < k {
                continue;
            }
            let idx = idx as u32;
            for window in block.action_tokens.windows(k) {
                let bucket = buckets.entry(hash_gram(window)).or_default();
                // Blocks are visited in ascending index order, so a repeat
                // gram within one block can only collide with the tail.
                if bucket.last() != Some(&idx) {
                    bucket.push(idx);
                }
            }
        }

        Self { k, buckets }
    }

    /// Gram length this index was built with
    pub fn k(&self) -> usize {
        self.k
    }

    /// Number of distinct gram buckets
    pub fn bucket_count(&self) -> usize {
        self.buckets.len()
    }

    /// Blocks whose action tokens contain a gram hashing to `hash`
    pub fn lookup(&self, hash: u64) -> &[u32] {
        self.buckets.get(&hash).map_or(&[], Vec::as_slice)
    }
}

/// Structural hash of one k-gram: the full vector sequence, with vector
/// lengths folded in so `[1, 2] [3]` and `[1] [2, 3]` hash apart.
pub fn hash_gram(window: &[TokenVector]) -> u64 {
    let mut hasher = Xxh3::new();
    for vector in window {
        hasher.update(&(vector.len() as u64).to_le_bytes());
        for &value in vector {
            hasher.update(&value.to_le_bytes());
        }
    }
    hasher.digest()
}
