//! # CCStokener-RS: Token-Based Semantic Clone Detection Engine
//!
//! A Rust implementation of token-based code clone detection, designed for
//! large pre-tokenized corpora. This library provides:
//!
//! - **K-gram Indexing**: inverted index over structural hashes of token k-grams
//! - **Dual-Mode Candidate Generation**: index lookup for token-rich blocks,
//!   bounded scan fallback for short blocks
//! - **Syntactic Filtering**: action-token overlap and token-count-ratio thresholds
//! - **Semantic Verification**: greedy threshold-descending bipartite matching
//!   over named vector groups
//! - **Sharded Parallel Execution**: contiguous block shards over a shared
//!   read-only index, with per-worker result artifacts
//!
//! ## Architecture
//!
//! ```text
//! ┌─────────────────────────────────────────────────────────────┐
//! │                      CLI (ccstokener)                       │
//! ├─────────────────────────────────────────────────────────────┤
//! │  Core Engine     │  Detectors       │  I/O                  │
//! │                  │                  │                       │
//! │ • Block Store    │ • K-gram Index   │ • Token Records       │
//! │ • Pipeline       │ • Candidates     │ • Worker Artifacts    │
//! │ • Config         │ • Verification   │ • Result Merge        │
//! └─────────────────────────────────────────────────────────────┘
//! ```
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use ccstokener_rs::core::config::{DetectionConfig, RunContext};
//! use ccstokener_rs::core::pipeline::DetectionPipeline;
//!
//! fn main() -> ccstokener_rs::core::errors::Result<()> {
//!     let config = DetectionConfig::default();
//!     let run = RunContext::new("./report", "run-001");
//!     let pipeline = DetectionPipeline::new(config, run);
//!     let outcome = pipeline.run("./tokens")?;
//!     println!("{} clone pairs detected", outcome.clone_pairs);
//!     Ok(())
//! }
//! ```

#![warn(missing_docs)]
#![warn(unsafe_code)]
#![allow(clippy::module_name_repetitions)]

// Core engine modules
pub mod core {
    //! Core data structures and the detection pipeline.

    pub mod blocks;
    pub mod config;
    pub mod errors;
    pub mod pipeline;
}

// Detection algorithms
pub mod detectors {
    //! Clone detection algorithms.

    pub mod ktoken;
}

// I/O and result persistence
pub mod io {
    //! Token-record loading and report artifacts.

    pub mod reports;
    pub mod tokens;
}

// Re-export commonly used types at crate root
pub use crate::core::config::{DetectionConfig, RunContext};
pub use crate::core::errors::{CcsError, Result};
pub use crate::core::pipeline::{DetectionPipeline, RunOutcome};
