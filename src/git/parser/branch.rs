use serde::Serialize;

use super::{FIELD_SEP, non_empty, records};

/// Parse `git branch --format` output produced with [`super::BRANCH_FORMAT`]
pub fn parse_branch_list(output: &str) -> Vec<BranchEntry> {
    records(output).filter_map(parse_branch_record).collect()
}

fn parse_branch_record(record: &str) -> Option<BranchEntry> {
    let fields: Vec<&str> = record.split(FIELD_SEP).collect();
    if fields.len() < 4 {
        return None;
    }

    Some(BranchEntry {
        is_current: fields[0].trim() == "*",
        name: fields[1].trim().to_string(),
        hash: fields[2].trim().to_string(),
        subject: fields[3].trim().to_string(),
        upstream: fields.get(4).and_then(|f| non_empty(f)),
        track: fields.get(5).and_then(|f| non_empty(f)),
    })
}

/// Represents a branch from git branch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchEntry {
    pub name: String,
    pub hash: String,
    pub subject: String,
    pub is_current: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub track: Option<String>,
}
