//! Detection pipeline: load, index, sharded detection, merge.
//!
//! The block store and the k-gram index are built single-threaded before
//! the parallel phase and never mutated afterward; workers read them
//! through shared references only, so the hot path needs no locking.
//! Each worker owns its accepted-pair set and output artifact
//! exclusively. The merged result depends only on set membership, never
//! on worker scheduling order.

use std::ops::Range;
use std::path::Path;

use ahash::AHashSet;
use rayon::prelude::*;
use tracing::{debug, info, warn};

use crate::core::blocks::{BlockStore, ClonePair};
use crate::core::config::{DetectionConfig, RunContext};
use crate::core::errors::{CcsError, Result};
use crate::detectors::ktoken::{
    generate_candidates, is_semantic_clone, passes_syntactic_filter, KGramIndex,
};
use crate::io::{reports, tokens};

/// Summary of one completed detection run.
#[derive(Debug, Clone)]
pub struct RunOutcome {
    /// Number of blocks loaded into the store
    pub blocks_loaded: usize,
    /// Number of unique clone pairs in the merged result
    pub clone_pairs: usize,
    /// Path of the merged result artifact
    pub result_path: std::path::PathBuf,
}

/// End-to-end clone detection over one token-record directory.
#[derive(Debug)]
pub struct DetectionPipeline {
    config: DetectionConfig,
    run: RunContext,
}

impl DetectionPipeline {
    /// Create a pipeline for one run
    pub fn new(config: DetectionConfig, run: RunContext) -> Self {
        Self { config, run }
    }

    /// Execute the full pipeline: load token records, build the index,
    /// run sharded detection, then merge worker artifacts.
    pub fn run(&self, tokens_dir: impl AsRef<Path>) -> Result<RunOutcome> {
        self.config.validate()?;

        let blocks = tokens::load_token_dir(tokens_dir.as_ref())?;
        let store = BlockStore::from_blocks(blocks);
        if store.is_empty() {
            return Err(CcsError::pipeline(
                "load",
                "no valid blocks could be loaded from the token directory",
            ));
        }
        info!(blocks = store.len(), "block store ready");

        let index = KGramIndex::build(&store, self.config.k);
        info!(buckets = index.bucket_count(), k = self.config.k, "k-gram index built");

        self.run.ensure_report_dir()?;
        self.detect(&store, &index)?;

        let summary = reports::merge_reports(&self.run)?;
        info!(
            pairs = summary.unique_pairs,
            artifacts = summary.artifacts_read,
            "merge complete"
        );

        Ok(RunOutcome {
            blocks_loaded: store.len(),
            clone_pairs: summary.unique_pairs,
            result_path: self.run.result_path(),
        })
    }

    /// Sharded detection phase. All workers are joined before any
    /// failure is surfaced, so artifacts flushed by healthy workers
    /// survive a sibling's failure.
    fn detect(&self, store: &BlockStore, index: &KGramIndex) -> Result<()> {
        let workers = self.config.worker_count(store.len());
        let shards = partition(store.len(), workers);
        info!(workers, "starting sharded detection");

        let results: Vec<Result<usize>> = shards
            .into_par_iter()
            .enumerate()
            .map(|(worker, range)| {
                let pairs = detect_range(store, index, &self.config, range);
                let accepted = pairs.len();
                reports::write_worker_artifact(&self.run.worker_artifact(worker), &pairs)?;
                debug!(worker, accepted, "worker finished");
                Ok(accepted)
            })
            .collect();

        let mut first_failure = None;
        for (worker, result) in results.into_iter().enumerate() {
            if let Err(err) = result {
                warn!(worker, error = %err, "worker failed");
                first_failure.get_or_insert(err);
            }
        }
        match first_failure {
            Some(err) => Err(err),
            None => Ok(()),
        }
    }
}

/// Split `len` block positions into `workers` contiguous, near-equal
/// ranges covering the whole span.
pub fn partition(len: usize, workers: usize) -> Vec<Range<usize>> {
    let workers = workers.max(1).min(len.max(1));
    let base = len / workers;
    let remainder = len % workers;

    let mut shards = Vec::with_capacity(workers);
    let mut start = 0;
    for worker in 0..workers {
        let size = base + usize::from(worker < remainder);
        shards.push(start..start + size);
        start += size;
    }
    shards
}

/// Run generation, filtering, and verification over one shard of the
/// sorted block range, returning the worker-local accepted-pair set.
pub fn detect_range(
    store: &BlockStore,
    index: &KGramIndex,
    config: &DetectionConfig,
    range: Range<usize>,
) -> AHashSet<ClonePair> {
    let mut accepted: AHashSet<ClonePair> = AHashSet::new();

    for idx in range {
        let block = store.get(idx);
        for candidate in generate_candidates(store, index, config, idx) {
            let other = store.get(candidate as usize);
            if !passes_syntactic_filter(block, other, config) {
                continue;
            }
            if is_semantic_clone(block, other, config.phi, config.eta) {
                accepted.insert(ClonePair::new(
                    block.endpoint.clone(),
                    other.endpoint.clone(),
                ));
            }
        }
    }

    accepted
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::blocks::{Block, BlockRecord, SemanticEntry};

    fn entry(name: &str, vector: &[i64]) -> SemanticEntry {
        SemanticEntry {
            name: name.to_string(),
            count: 1,
            vector: vector.to_vec(),
        }
    }

    fn block(path: &str, total: u32, seed: i64) -> Block {
        Block::from_record(BlockRecord {
            file_path: path.to_string(),
            start_line: 1,
            end_line: 25,
            total_token_num: total,
            valid_token_num: total,
            variable: vec![
                entry("a", &[seed, 1, 2]),
                entry("b", &[seed, 3, 4]),
                entry("c", &[seed, 5, 6]),
            ],
            method: vec![entry("m", &[seed, 7, 8])],
            r#type: vec![entry("t", &[seed, 9, 10])],
            relation: vec![entry("r", &[seed, 2, 9])],
        })
    }

    fn corpus() -> Vec<Block> {
        vec![
            block("d/a/A.java", 60, 1),
            block("d/b/B.java", 61, 1),
            block("d/c/C.java", 62, 2),
            block("d/e/E.java", 63, 2),
            block("d/f/F.java", 200, 3),
            block("d/g/G.java", 201, 3),
        ]
    }

    #[test]
    fn partition_covers_range_contiguously() {
        for (len, workers) in [(10, 3), (7, 7), (5, 1), (3, 8), (0, 4)] {
            let shards = partition(len, workers);
            let mut expected_start = 0;
            for shard in &shards {
                assert_eq!(shard.start, expected_start);
                expected_start = shard.end;
            }
            assert_eq!(expected_start, len);
        }
    }

    #[test]
    fn accepted_pairs_invariant_under_partitioning() {
        let config = DetectionConfig {
            k: 2,
            token_count_threshold: 50,
            ..Default::default()
        };
        let store = BlockStore::from_blocks(corpus());
        let index = KGramIndex::build(&store, config.k);

        let whole = detect_range(&store, &index, &config, 0..store.len());
        assert!(!whole.is_empty());

        for workers in 1..=4 {
            let mut union: AHashSet<ClonePair> = AHashSet::new();
            for shard in partition(store.len(), workers) {
                union.extend(detect_range(&store, &index, &config, shard));
            }
            assert_eq!(union, whole, "partitioning into {workers} shards diverged");
        }
    }

    #[test]
    fn detect_range_canonicalizes_duplicate_orientations() {
        // Identical neighbors discover each other from both sides within
        // one shard; canonical pairs collapse the two orientations.
        let config = DetectionConfig {
            k: 2,
            token_count_threshold: 50,
            ..Default::default()
        };
        let store = BlockStore::from_blocks(vec![
            block("d/a/A.java", 60, 1),
            block("d/b/B.java", 60, 1),
        ]);
        let index = KGramIndex::build(&store, config.k);

        let pairs = detect_range(&store, &index, &config, 0..store.len());
        assert_eq!(pairs.len(), 1);
    }
}
