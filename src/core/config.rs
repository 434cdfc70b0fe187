//! Configuration types for the detection engine.
//!
//! All tunable thresholds live in [`DetectionConfig`]; per-run output
//! locations live in [`RunContext`]. Both are plain values threaded
//! through the pipeline rather than process-wide state, so two runs with
//! different parameters can coexist in one process.

use std::path::PathBuf;

use serde::{Deserialize, Serialize};

use crate::core::errors::{CcsError, Result};

/// Thresholds and limits for one detection run.
///
/// `k` and `token_count_threshold` are independent knobs: `k` controls
/// the gram length used for indexing, `token_count_threshold` controls
/// which blocks take the index path versus the bounded-scan path during
/// candidate generation.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct DetectionConfig {
    /// Gram length for the inverted index
    pub k: usize,

    /// Syntactic action-token overlap threshold (`ato >= beta` to retain)
    pub beta: f64,

    /// Token-count ratio threshold (`tr >= theta` to retain)
    pub theta: f64,

    /// Semantic threshold step; must be negative (threshold descends from 1.0)
    pub phi: f64,

    /// Semantic acceptance threshold over the mean of the three group scores
    pub eta: f64,

    /// Minimum total token count for a block to use the index path
    pub token_count_threshold: u32,

    /// Maximum total-token-count difference for the scan fallback
    pub token_count_differ: u32,

    /// Upper bound on parallel workers; memory, not core count, is the
    /// binding resource, so this stays conservative
    pub max_workers: usize,
}

impl Default for DetectionConfig {
    fn default() -> Self {
        Self {
            k: 6,
            beta: 0.5,
            theta: 0.4,
            phi: -0.1,
            eta: 0.65,
            token_count_threshold: 50,
            token_count_differ: 15,
            max_workers: 4,
        }
    }
}

impl DetectionConfig {
    /// Load configuration from a YAML file
    pub fn from_yaml_file(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let content = std::fs::read_to_string(&path).map_err(|e| {
            CcsError::io(format!("Failed to read config file: {}", path.display()), e)
        })?;
        let config: Self = serde_yaml::from_str(&content)
            .map_err(|e| CcsError::config(format!("Invalid config file: {e}")))?;
        config.validate()?;
        Ok(config)
    }

    /// Validate all configuration values
    pub fn validate(&self) -> Result<()> {
        if self.k == 0 {
            return Err(CcsError::validation("k must be greater than 0"));
        }

        validate_unit_range(self.beta, "beta")?;
        validate_unit_range(self.theta, "theta")?;
        validate_unit_range(self.eta, "eta")?;

        if self.phi >= 0.0 {
            return Err(CcsError::validation(
                "phi must be negative (the semantic threshold descends from 1.0)",
            ));
        }

        if self.max_workers == 0 {
            return Err(CcsError::validation("max_workers must be greater than 0"));
        }

        Ok(())
    }

    /// Effective worker count for a given block count
    pub fn worker_count(&self, block_count: usize) -> usize {
        let available = std::thread::available_parallelism()
            .map(|n| n.get())
            .unwrap_or(1);
        self.max_workers.min(available).min(block_count).max(1)
    }
}

fn validate_unit_range(value: f64, field: &str) -> Result<()> {
    if !(0.0..=1.0).contains(&value) {
        return Err(CcsError::validation(format!(
            "{field} must be between 0.0 and 1.0, got {value}"
        )));
    }
    Ok(())
}

/// Output locations for one detection run.
///
/// Worker artifacts and the merged result all live under
/// `<output_root>/<run_id>/`.
#[derive(Debug, Clone)]
pub struct RunContext {
    /// Root directory for all run outputs
    pub output_root: PathBuf,

    /// Identifier distinguishing this run's report directory
    pub run_id: String,
}

impl RunContext {
    /// Create a run context from an output root and a run identifier
    pub fn new(output_root: impl Into<PathBuf>, run_id: impl Into<String>) -> Self {
        Self {
            output_root: output_root.into(),
            run_id: run_id.into(),
        }
    }

    /// Directory holding the per-worker clone-pair artifacts
    pub fn report_dir(&self) -> PathBuf {
        self.output_root.join(&self.run_id)
    }

    /// Artifact path for one worker
    pub fn worker_artifact(&self, worker: usize) -> PathBuf {
        self.report_dir().join(format!("clone_pairs_{worker}.txt"))
    }

    /// Path of the merged, deduplicated result artifact
    pub fn result_path(&self) -> PathBuf {
        self.report_dir().join("result.txt")
    }

    /// Create the report directory if it does not exist
    pub fn ensure_report_dir(&self) -> Result<&Self> {
        let dir = self.report_dir();
        std::fs::create_dir_all(&dir).map_err(|e| {
            CcsError::io(
                format!("Failed to create report directory: {}", dir.display()),
                e,
            )
        })?;
        Ok(self)
    }
}
