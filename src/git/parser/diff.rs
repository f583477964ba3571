use serde::Serialize;

/// Parse `git diff --numstat` output
///
/// Each line is `additions<TAB>deletions<TAB>path`. Binary files report `-`
/// for both counts.
pub fn parse_diff_numstat(output: &str) -> Vec<DiffStat> {
    output
        .trim()
        .lines()
        .filter(|line| !line.is_empty())
        .filter_map(parse_numstat_line)
        .collect()
}

fn parse_numstat_line(line: &str) -> Option<DiffStat> {
    let mut fields = line.splitn(3, '\t');
    let additions = fields.next()?;
    let deletions = fields.next()?;
    let path = fields.next()?.to_string();

    if additions == "-" && deletions == "-" {
        return Some(DiffStat {
            additions: 0,
            deletions: 0,
            path,
            binary: true,
        });
    }

    Some(DiffStat {
        additions: additions.parse().unwrap_or(0),
        deletions: deletions.parse().unwrap_or(0),
        path,
        binary: false,
    })
}

/// Keep at most `max_lines` lines of a patch
///
/// A `max_lines` of zero or below disables truncation.
pub fn truncate_patch(patch: &str, max_lines: i64) -> TruncatedPatch {
    let untouched = || TruncatedPatch {
        text: patch.to_string(),
        truncated: false,
        cut_line: 0,
    };

    let Ok(max) = usize::try_from(max_lines) else {
        return untouched();
    };
    if max == 0 {
        return untouched();
    }

    let segments: Vec<&str> = patch.splitn(max.saturating_add(1), '\n').collect();
    if segments.len() <= max {
        return untouched();
    }

    TruncatedPatch {
        text: segments[..max].join("\n"),
        truncated: true,
        cut_line: max,
    }
}

/// Per-file change counts from numstat
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffStat {
    pub additions: usize,
    pub deletions: usize,
    pub path: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub binary: bool,
}

/// Totals across a list of [`DiffStat`]
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct DiffSummary {
    pub total_files: usize,
    pub total_additions: usize,
    pub total_deletions: usize,
}

impl DiffSummary {
    pub fn from_stats(stats: &[DiffStat]) -> Self {
        stats.iter().fold(
            DiffSummary {
                total_files: stats.len(),
                ..Default::default()
            },
            |mut acc, stat| {
                acc.total_additions += stat.additions;
                acc.total_deletions += stat.deletions;
                acc
            },
        )
    }
}

/// Outcome of [`truncate_patch`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TruncatedPatch {
    pub text: String,
    pub truncated: bool,
    /// Line the patch was cut at, zero when untouched
    pub cut_line: usize,
}

/// Numstat stats, their totals and the (possibly truncated) patch
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct DiffResult {
    pub stats: Vec<DiffStat>,
    pub summary: DiffSummary,
    #[serde(skip_serializing_if = "String::is_empty")]
    pub patch: String,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub truncated: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub truncated_at_line: Option<usize>,
}

impl DiffResult {
    pub fn new(numstat: &str, patch: &str, max_patch_lines: i64) -> Self {
        let stats = parse_diff_numstat(numstat);
        let cut = truncate_patch(patch, max_patch_lines);

        DiffResult {
            summary: DiffSummary::from_stats(&stats),
            stats,
            patch: cut.text,
            truncated: cut.truncated,
            truncated_at_line: cut.truncated.then_some(cut.cut_line),
        }
    }
}
