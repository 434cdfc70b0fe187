//! Clone-pair report artifacts and the cross-worker merge.
//!
//! Each worker writes its accepted pairs to its own artifact, one pair
//! per line, 8 comma-separated fields. The merger re-reads every
//! `clone_pairs_*.txt` artifact in the report directory (stale ones from
//! earlier invocations included), canonicalizes, deduplicates, and
//! writes a single `result.txt` in the same layout.

use std::collections::BTreeSet;
use std::fs::File;
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::Path;

use ahash::AHashSet;
use tracing::{debug, warn};

use crate::core::blocks::{CloneEndpoint, ClonePair};
use crate::core::config::RunContext;
use crate::core::errors::{CcsError, Result};

/// Statistics from one merge pass.
#[derive(Debug, Clone, Default)]
pub struct MergeSummary {
    /// Worker artifacts successfully read
    pub artifacts_read: usize,
    /// Total lines seen across all artifacts
    pub lines_seen: usize,
    /// Lines skipped for not having exactly 8 fields
    pub malformed_skipped: usize,
    /// Unique canonical pairs written to the result artifact
    pub unique_pairs: usize,
}

/// Write one worker's accepted pairs to its artifact.
pub fn write_worker_artifact(path: &Path, pairs: &AHashSet<ClonePair>) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        CcsError::io(format!("Failed to create worker artifact: {}", path.display()), e)
    })?;
    let mut writer = BufWriter::new(file);
    for pair in pairs {
        writeln!(writer, "{pair}")
            .map_err(|e| CcsError::io("Failed to write clone pair", e))?;
    }
    writer
        .flush()
        .map_err(|e| CcsError::io("Failed to flush worker artifact", e))?;
    Ok(())
}

/// Merge every worker artifact in the run's report directory into the
/// deduplicated result artifact.
pub fn merge_reports(run: &RunContext) -> Result<MergeSummary> {
    let report_dir = run.report_dir();
    let entries = std::fs::read_dir(&report_dir).map_err(|e| {
        CcsError::io(
            format!("Failed to read report directory: {}", report_dir.display()),
            e,
        )
    })?;

    let mut summary = MergeSummary::default();
    // BTreeSet keeps the result artifact deterministically ordered.
    let mut unique: BTreeSet<ClonePair> = BTreeSet::new();

    for entry in entries.filter_map(|e| e.ok()) {
        let path = entry.path();
        let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
            continue;
        };
        if !name.starts_with("clone_pairs_") || !name.ends_with(".txt") {
            continue;
        }
        let file = match File::open(&path) {
            Ok(file) => file,
            Err(err) => {
                warn!(artifact = %path.display(), error = %err, "skipping unreadable artifact");
                continue;
            }
        };
        summary.artifacts_read += 1;

        for line in BufReader::new(file).lines() {
            let line = match line {
                Ok(line) => line,
                Err(err) => {
                    warn!(artifact = %path.display(), error = %err, "stopping artifact read");
                    break;
                }
            };
            if line.is_empty() {
                continue;
            }
            summary.lines_seen += 1;
            match parse_pair_line(&line) {
                Some(pair) => {
                    unique.insert(pair);
                }
                None => summary.malformed_skipped += 1,
            }
        }
        debug!(artifact = %path.display(), lines = summary.lines_seen, "artifact merged");
    }

    summary.unique_pairs = unique.len();
    write_result(&run.result_path(), &unique)?;
    Ok(summary)
}

/// Parse one 8-field report line into a canonical pair. Returns `None`
/// for any malformed line.
pub fn parse_pair_line(line: &str) -> Option<ClonePair> {
    let fields: Vec<&str> = line.split(',').collect();
    if fields.len() != 8 {
        return None;
    }

    let endpoint = |offset: usize| -> Option<CloneEndpoint> {
        Some(CloneEndpoint {
            subdir: fields[offset].to_string(),
            filename: fields[offset + 1].to_string(),
            start_line: fields[offset + 2].trim().parse().ok()?,
            end_line: fields[offset + 3].trim().parse().ok()?,
        })
    };

    Some(ClonePair::new(endpoint(0)?, endpoint(4)?))
}

fn write_result(path: &Path, pairs: &BTreeSet<ClonePair>) -> Result<()> {
    let file = File::create(path).map_err(|e| {
        CcsError::io(format!("Failed to create result artifact: {}", path.display()), e)
    })?;
    let mut writer = BufWriter::new(file);
    for pair in pairs {
        writeln!(writer, "{pair}").map_err(|e| CcsError::io("Failed to write result line", e))?;
    }
    writer
        .flush()
        .map_err(|e| CcsError::io("Failed to flush result artifact", e))?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::fs;
    use tempfile::tempdir;

    fn run_context() -> (tempfile::TempDir, RunContext) {
        let dir = tempdir().unwrap();
        let run = RunContext::new(dir.path(), "test-run");
        run.ensure_report_dir().unwrap();
        (dir, run)
    }

    #[test]
    fn reversed_duplicates_merge_to_one_line() {
        let (_dir, run) = run_context();
        fs::write(run.worker_artifact(0), "a,b,1,5,c,d,10,20\n").unwrap();
        fs::write(run.worker_artifact(1), "c,d,10,20,a,b,1,5\n").unwrap();

        let summary = merge_reports(&run).unwrap();
        assert_eq!(summary.artifacts_read, 2);
        assert_eq!(summary.unique_pairs, 1);

        let result = fs::read_to_string(run.result_path()).unwrap();
        assert_eq!(result.lines().count(), 1);
        assert_eq!(result.trim(), "a,b,1,5,c,d,10,20");
    }

    #[test]
    fn malformed_lines_are_skipped() {
        let (_dir, run) = run_context();
        fs::write(
            run.worker_artifact(0),
            "a,b,1,5,c,d,10,20\nonly,three,fields\na,b,1,5,c,d,10,20,extra\na,b,x,5,c,d,10,20\n",
        )
        .unwrap();

        let summary = merge_reports(&run).unwrap();
        assert_eq!(summary.lines_seen, 4);
        assert_eq!(summary.malformed_skipped, 3);
        assert_eq!(summary.unique_pairs, 1);
    }

    #[test]
    fn stale_artifacts_from_prior_runs_are_included() {
        let (_dir, run) = run_context();
        fs::write(run.worker_artifact(0), "a,b,1,5,c,d,10,20\n").unwrap();
        fs::write(
            run.report_dir().join("clone_pairs_stale.txt"),
            "e,f,2,6,g,h,11,21\n",
        )
        .unwrap();
        // Not an artifact name; must be ignored.
        fs::write(run.report_dir().join("notes.txt"), "x,y,1,2,z,w,3,4\n").unwrap();

        let summary = merge_reports(&run).unwrap();
        assert_eq!(summary.artifacts_read, 2);
        assert_eq!(summary.unique_pairs, 2);
    }

    #[test]
    fn empty_report_dir_yields_empty_result() {
        let (_dir, run) = run_context();
        let summary = merge_reports(&run).unwrap();
        assert_eq!(summary.unique_pairs, 0);
        assert!(fs::read_to_string(run.result_path()).unwrap().is_empty());
    }

    #[test]
    fn worker_artifact_round_trips_pairs() {
        let (_dir, run) = run_context();
        let mut pairs = AHashSet::new();
        pairs.insert(parse_pair_line("s1,F1.java,1,9,s2,F2.java,4,12").unwrap());
        pairs.insert(parse_pair_line("s3,F3.java,2,8,s1,F1.java,1,9").unwrap());

        let path = run.worker_artifact(0);
        write_worker_artifact(&path, &pairs).unwrap();

        let summary = merge_reports(&run).unwrap();
        assert_eq!(summary.unique_pairs, 2);
    }

    #[test]
    fn pair_line_parsing_is_canonical() {
        let forward = parse_pair_line("a,b,1,5,c,d,10,20").unwrap();
        let reverse = parse_pair_line("c,d,10,20,a,b,1,5").unwrap();
        assert_eq!(forward, reverse);
        assert!(parse_pair_line("a,b,1,5,c,d,10").is_none());
        assert!(parse_pair_line("").is_none());
    }
}
