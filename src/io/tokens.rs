//! Token-record loading.
//!
//! The external tokenizer emits one JSON document per source file, each
//! a list of block records carrying token counts and the nine named
//! vector groups. A file that fails to parse or misses a required group
//! is skipped with a warning; the run only aborts when nothing at all
//! could be loaded (checked by the pipeline, which owns that decision).

use std::path::Path;

use serde::Deserialize;
use tracing::{debug, warn};
use walkdir::WalkDir;

use crate::core::blocks::{Block, BlockRecord, SemanticEntry};
use crate::core::errors::{CcsError, Result};

/// One block record as serialized by the tokenizer.
///
/// All nine groups are required; serde rejects records missing any of
/// them, which is the input-format check. Groups not consumed by
/// detection are still validated here.
#[derive(Debug, Deserialize)]
#[allow(dead_code)]
struct RawBlock {
    #[serde(rename = "filePath")]
    file_path: String,
    startline: u32,
    endline: u32,
    #[serde(rename = "totalTokenNum")]
    total_token_num: u32,
    #[serde(rename = "validTokenNum")]
    valid_token_num: u32,
    variable: Vec<SemanticEntry>,
    field: Vec<SemanticEntry>,
    method: Vec<SemanticEntry>,
    keyword: Vec<SemanticEntry>,
    r#type: Vec<SemanticEntry>,
    basic_type: Vec<SemanticEntry>,
    variable_group: Vec<SemanticEntry>,
    method_group: Vec<SemanticEntry>,
    relation: Vec<SemanticEntry>,
}

impl From<RawBlock> for BlockRecord {
    fn from(raw: RawBlock) -> Self {
        BlockRecord {
            file_path: raw.file_path,
            start_line: raw.startline,
            end_line: raw.endline,
            total_token_num: raw.total_token_num,
            valid_token_num: raw.valid_token_num,
            variable: raw.variable,
            method: raw.method,
            r#type: raw.r#type,
            relation: raw.relation,
        }
    }
}

/// Load every parseable token-record file under `dir`.
pub fn load_token_dir(dir: &Path) -> Result<Vec<Block>> {
    if !dir.is_dir() {
        return Err(CcsError::input_format(
            dir.display().to_string(),
            "token directory does not exist",
        ));
    }

    let mut blocks = Vec::new();
    let mut files_loaded = 0usize;
    let mut files_skipped = 0usize;

    for entry in WalkDir::new(dir).into_iter().filter_map(|e| e.ok()) {
        let path = entry.path();
        if !entry.file_type().is_file() || path.extension().and_then(|e| e.to_str()) != Some("json")
        {
            continue;
        }
        match parse_token_file(path) {
            Ok(mut parsed) => {
                blocks.append(&mut parsed);
                files_loaded += 1;
            }
            Err(err) => {
                warn!(file = %path.display(), error = %err, "skipping unreadable token file");
                files_skipped += 1;
            }
        }
    }

    debug!(files_loaded, files_skipped, blocks = blocks.len(), "token load finished");
    Ok(blocks)
}

/// Parse one token-record file into blocks.
pub fn parse_token_file(path: &Path) -> Result<Vec<Block>> {
    let content = std::fs::read_to_string(path)
        .map_err(|e| CcsError::io(format!("Failed to read token file: {}", path.display()), e))?;

    let raw: Vec<RawBlock> = serde_json::from_str(&content)
        .map_err(|e| CcsError::input_format(path.display().to_string(), e.to_string()))?;

    Ok(raw
        .into_iter()
        .map(|block| Block::from_record(block.into()))
        .collect())
}
