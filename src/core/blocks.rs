//! Block records and the in-memory block store.
//!
//! A block is the atomic unit of clone comparison: a contiguous source
//! fragment identified by file and line range, carrying token counts,
//! a sorted action-token sequence for syntactic matching, and three
//! semantic vector groups for verification. Blocks are loaded once and
//! immutable for the remainder of the run.

use std::fmt;

use ahash::AHashSet;
use serde::{Deserialize, Serialize};
use tracing::warn;

/// A token vector; element order is significant, values are exact.
pub type TokenVector = Vec<i64>;

/// Unique key of a block across the whole corpus.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct BlockId {
    /// Path of the source file the block was parsed from
    pub file_path: String,
    /// First source line of the block
    pub start_line: u32,
}

impl BlockId {
    /// Create a block id
    pub fn new(file_path: impl Into<String>, start_line: u32) -> Self {
        Self {
            file_path: file_path.into(),
            start_line,
        }
    }
}

impl fmt::Display for BlockId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}", self.file_path, self.start_line)
    }
}

/// One named entry of a semantic vector group.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SemanticEntry {
    /// Token name (identifier, callee, or relation label)
    pub name: String,
    /// Occurrence count within the block
    pub count: u32,
    /// Numeric context vector
    pub vector: TokenVector,
}

/// Report-facing identity of one clone-pair endpoint.
///
/// Subdirectory and filename are resolved from the block's file path at
/// load time; the ordering derived here fixes the canonical orientation
/// of a [`ClonePair`].
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct CloneEndpoint {
    /// Immediate parent directory of the source file
    pub subdir: String,
    /// Source file name
    pub filename: String,
    /// First source line of the block
    pub start_line: u32,
    /// Last source line of the block
    pub end_line: u32,
}

impl fmt::Display for CloneEndpoint {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{},{},{},{}",
            self.subdir, self.filename, self.start_line, self.end_line
        )
    }
}

/// An unordered pair of clone endpoints, stored in canonical order.
///
/// Construction sorts the endpoints, so `(A, B)` and `(B, A)` compare and
/// hash identically in any deduplicating structure.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ClonePair {
    /// Lesser endpoint under the canonical ordering
    pub left: CloneEndpoint,
    /// Greater endpoint under the canonical ordering
    pub right: CloneEndpoint,
}

impl ClonePair {
    /// Create a canonicalized pair from two endpoints in either order
    pub fn new(a: CloneEndpoint, b: CloneEndpoint) -> Self {
        if a <= b {
            Self { left: a, right: b }
        } else {
            Self { left: b, right: a }
        }
    }
}

impl fmt::Display for ClonePair {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{},{}", self.left, self.right)
    }
}

/// One parsed block record, immutable after construction.
#[derive(Debug, Clone)]
pub struct Block {
    /// Unique key of this block
    pub id: BlockId,
    /// Report-facing endpoint identity
    pub endpoint: CloneEndpoint,
    /// Total token count of the block
    pub total_token_num: u32,
    /// Count of tokens carrying semantic information
    pub valid_token_num: u32,
    /// Lexicographically sorted token vectors from the method, type, and
    /// variable groups; basis of k-grams and the syntactic filter
    pub action_tokens: Vec<TokenVector>,
    /// Exact-equality set over `action_tokens` for overlap computation
    action_token_set: AHashSet<TokenVector>,
    /// Variable semantic group
    pub variable: Vec<SemanticEntry>,
    /// Relation/expression semantic group
    pub relation: Vec<SemanticEntry>,
    /// Method/callee semantic group
    pub method: Vec<SemanticEntry>,
}

/// Raw inputs for constructing a [`Block`].
#[derive(Debug, Clone, Default)]
pub struct BlockRecord {
    /// Source file path
    pub file_path: String,
    /// First source line
    pub start_line: u32,
    /// Last source line
    pub end_line: u32,
    /// Total token count
    pub total_token_num: u32,
    /// Valid (semantic) token count
    pub valid_token_num: u32,
    /// Variable group entries
    pub variable: Vec<SemanticEntry>,
    /// Method/callee group entries
    pub method: Vec<SemanticEntry>,
    /// Type group entries (action tokens only)
    pub r#type: Vec<SemanticEntry>,
    /// Relation/expression group entries
    pub relation: Vec<SemanticEntry>,
}

impl Block {
    /// Build a block from a parsed record, deriving the action-token
    /// sequence and the report endpoint.
    pub fn from_record(record: BlockRecord) -> Self {
        let mut action_tokens: Vec<TokenVector> = record
            .method
            .iter()
            .chain(record.r#type.iter())
            .chain(record.variable.iter())
            .map(|entry| entry.vector.clone())
            .collect();
        action_tokens.sort_unstable();

        let action_token_set: AHashSet<TokenVector> = action_tokens.iter().cloned().collect();

        let (subdir, filename) = split_path(&record.file_path);
        let endpoint = CloneEndpoint {
            subdir,
            filename,
            start_line: record.start_line,
            end_line: record.end_line,
        };

        Self {
            id: BlockId::new(record.file_path, record.start_line),
            endpoint,
            total_token_num: record.total_token_num,
            valid_token_num: record.valid_token_num,
            action_tokens,
            action_token_set,
            variable: record.variable,
            relation: record.relation,
            method: record.method,
        }
    }

    /// Number of shared distinct action tokens with another block
    pub fn shared_action_tokens(&self, other: &Block) -> usize {
        let (small, large) = if self.action_token_set.len() <= other.action_token_set.len() {
            (&self.action_token_set, &other.action_token_set)
        } else {
            (&other.action_token_set, &self.action_token_set)
        };
        small.iter().filter(|token| large.contains(*token)).count()
    }
}

/// Last two path components of a file path, as (subdirectory, filename).
fn split_path(file_path: &str) -> (String, String) {
    let path = std::path::Path::new(file_path);
    let filename = path
        .file_name()
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    let subdir = path
        .parent()
        .and_then(|parent| parent.file_name())
        .map(|name| name.to_string_lossy().into_owned())
        .unwrap_or_default();
    (subdir, filename)
}

/// Immutable collection of all blocks for one run, sorted ascending by
/// `total_token_num`.
///
/// Built single-threaded before the parallel phase; workers access it
/// through a shared reference only.
#[derive(Debug)]
pub struct BlockStore {
    blocks: Vec<Block>,
}

impl BlockStore {
    /// Build a store from loaded blocks, dropping duplicate block ids and
    /// sorting by total token count.
    pub fn from_blocks(mut blocks: Vec<Block>) -> Self {
        let mut seen: AHashSet<BlockId> = AHashSet::with_capacity(blocks.len());
        blocks.retain(|block| {
            if seen.insert(block.id.clone()) {
                true
            } else {
                warn!(block = %block.id, "duplicate block id, keeping first occurrence");
                false
            }
        });
        // Stable sort keeps load order among equal token counts deterministic.
        blocks.sort_by_key(|block| block.total_token_num);
        Self { blocks }
    }

    /// Number of blocks in the store
    pub fn len(&self) -> usize {
        self.blocks.len()
    }

    /// Whether the store holds no blocks
    pub fn is_empty(&self) -> bool {
        self.blocks.is_empty()
    }

    /// Block at a sorted-order position
    pub fn get(&self, index: usize) -> &Block {
        &self.blocks[index]
    }

    /// All blocks in sorted order
    pub fn blocks(&self) -> &[Block] {
        &self.blocks
    }
}
