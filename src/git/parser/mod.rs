//! Converters from git's text output into typed records.
//!
//! Every parser here is total: any input, including the empty string, yields
//! a value. Malformed records are skipped and unparseable numbers become zero.

mod blame;
mod branch;
mod commit;
mod diff;
mod log;
mod remote;
mod status;

pub use blame::{BlameLine, parse_blame};
pub use branch::{BranchEntry, parse_branch_list};
pub use commit::{CommitOutcome, CommitResult, parse_commit};
pub use diff::{DiffResult, DiffStat, DiffSummary, TruncatedPatch, parse_diff_numstat, truncate_patch};
pub use log::{LogEntry, ShowResult, parse_log, parse_show};
pub use remote::{RemoteEntry, parse_remote_list};
pub use status::{BranchStatus, StatusEntry, StatusResult, parse_status};

/// Separates fields inside one record (ASCII unit separator)
pub const FIELD_SEP: char = '\x1f';

/// Terminates a record (ASCII record separator)
pub const RECORD_SEP: char = '\x1e';

/// `--format` for `git log`: hash, author name, email, ISO date, subject, body
pub const LOG_FORMAT: &str = "%H\x1f%an\x1f%ae\x1f%aI\x1f%s\x1f%b\x1e";

/// `--format` for the metadata half of `git show`
pub const SHOW_FORMAT: &str = LOG_FORMAT;

/// `--format` for `git branch`: current marker, name, short hash, subject,
/// upstream and tracking annotation
pub const BRANCH_FORMAT: &str = "%(HEAD)\x1f%(refname:short)\x1f%(objectname:short)\x1f%(contents:subject)\x1f%(upstream:short)\x1f%(upstream:track)\x1e";

/// Non-empty trimmed field, or `None`
pub(crate) fn non_empty(field: &str) -> Option<String> {
    let field = field.trim();
    if field.is_empty() {
        None
    } else {
        Some(field.to_string())
    }
}

/// Records of a separator-delimited listing, trimmed, with blanks dropped
pub(crate) fn records(output: &str) -> impl Iterator<Item = &str> {
    output
        .split(RECORD_SEP)
        .map(str::trim)
        .filter(|record| !record.is_empty())
}
