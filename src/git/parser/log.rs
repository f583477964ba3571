use serde::Serialize;

use super::{FIELD_SEP, RECORD_SEP, non_empty, records};
use super::diff::{DiffStat, DiffSummary, parse_diff_numstat, truncate_patch};

/// Parse `git log` output produced with [`super::LOG_FORMAT`]
pub fn parse_log(output: &str) -> Vec<LogEntry> {
    records(output).filter_map(parse_commit_record).collect()
}

/// Build a [`ShowResult`] from the three halves of a `git show` invocation
///
/// Only the first metadata record is used. When it does not carry at least
/// five fields (the object is a tag or blob, not a commit) the metadata is
/// left at its zero value and [`ShowResult::is_commit`] returns false.
pub fn parse_show(metadata: &str, numstat: &str, patch: &str) -> ShowResult {
    let first = metadata.split(RECORD_SEP).next().unwrap_or_default().trim();
    let commit = parse_commit_record(first).unwrap_or_default();
    let stats = parse_diff_numstat(numstat);

    ShowResult {
        summary: DiffSummary::from_stats(&stats),
        commit,
        stats,
        patch: patch.to_string(),
        truncated: false,
        truncated_at_line: 0,
    }
}

fn parse_commit_record(record: &str) -> Option<LogEntry> {
    let fields: Vec<&str> = record.splitn(6, FIELD_SEP).collect();
    if fields.len() < 5 {
        return None;
    }

    Some(LogEntry {
        hash: fields[0].trim().to_string(),
        author_name: fields[1].trim().to_string(),
        author_email: fields[2].trim().to_string(),
        author_date: fields[3].trim().to_string(),
        subject: fields[4].trim().to_string(),
        body: fields.get(5).and_then(|f| non_empty(f)),
    })
}

/// Represents a commit from git log
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct LogEntry {
    pub hash: String,
    pub author_name: String,
    pub author_email: String,
    pub author_date: String,
    pub subject: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub body: Option<String>,
}

/// A single commit with its per-file stats and patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct ShowResult {
    #[serde(flatten)]
    pub commit: LogEntry,
    pub stats: Vec<DiffStat>,
    pub summary: DiffSummary,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub patch: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "is_zero")]
    pub truncated_at_line: usize,
}

impl ShowResult {
    /// Whether the metadata parsed as a commit
    pub fn is_commit(&self) -> bool {
        !self.commit.hash.is_empty()
    }

    /// Cap the patch at `max_lines` lines; zero or below leaves it whole
    pub fn truncate_patch(mut self, max_lines: i64) -> Self {
        let cut = truncate_patch(&self.patch, max_lines);
        self.patch = cut.text;
        self.truncated = cut.truncated;
        self.truncated_at_line = cut.cut_line;
        self
    }
}

fn is_zero(n: &usize) -> bool {
    *n == 0
}
