//! K-token clone detection.
//!
//! The detector runs in three stages per block: candidate generation
//! (inverted-index lookup for token-rich blocks, bounded scan for short
//! ones), a syntactic filter over action-token overlap and token-count
//! ratio, and semantic verification by greedy threshold-descending
//! bipartite matching over the variable, relation, and method vector
//! groups.

pub mod candidates;
pub mod index;
pub mod verify;

pub use candidates::{generate_candidates, passes_syntactic_filter};
pub use index::KGramIndex;
pub use verify::{cosine_similarity, is_semantic_clone, semantic_score, verify_sim};
