use std::sync::LazyLock;

use regex::Regex;
use serde::Serialize;

/// `[<branch> <hash>] <subject>`, branch may be `detached HEAD` or carry a
/// `(root-commit)` note
static COMMIT_LINE: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"^\[(.+?)\s+([a-f0-9]+)\]\s+(.*)$").expect("commit line pattern is valid")
});

/// How the first line of `git commit` output was understood
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum CommitOutcome {
    /// The line had the bracketed `[branch hash] subject` shape
    Structured {
        branch: String,
        hash: String,
        subject: String,
    },
    /// Anything else; the whole line is kept as the subject
    Unstructured { subject: String },
}

impl CommitOutcome {
    pub fn from_output(output: &str) -> Self {
        let first_line = output.trim().lines().next().unwrap_or_default().trim();

        match COMMIT_LINE.captures(first_line) {
            Some(caps) => CommitOutcome::Structured {
                branch: caps[1].to_string(),
                hash: caps[2].to_string(),
                subject: caps[3].to_string(),
            },
            None => CommitOutcome::Unstructured {
                subject: first_line.to_string(),
            },
        }
    }
}

/// Parse the output of `git commit`
pub fn parse_commit(output: &str) -> CommitResult {
    CommitResult::from(CommitOutcome::from_output(output))
}

/// Outcome of creating a commit
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct CommitResult {
    pub status: String,
    pub branch: String,
    pub hash: String,
    pub subject: String,
}

impl From<CommitOutcome> for CommitResult {
    fn from(outcome: CommitOutcome) -> Self {
        let status = "committed".to_string();
        match outcome {
            CommitOutcome::Structured { branch, hash, subject } => CommitResult {
                status,
                branch,
                hash,
                subject,
            },
            CommitOutcome::Unstructured { subject } => CommitResult {
                status,
                subject,
                ..Default::default()
            },
        }
    }
}
