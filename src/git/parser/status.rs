use serde::Serialize;

/// Space-delimited fields ahead of the path in an ordinary (`1`) entry
const ORDINARY_FIELDS: usize = 8;

/// Space-delimited fields ahead of the tab-separated path pair in a
/// rename/copy (`2`) entry
const RENAME_FIELDS: usize = 9;

/// Parse `git status --porcelain=v2 --branch` output
pub fn parse_status(output: &str) -> StatusResult {
    let mut result = StatusResult::default();

    for line in output.split('\n') {
        if line.is_empty() {
            continue;
        }

        if let Some(header) = line.strip_prefix("# ") {
            result.branch.apply_header(header);
            continue;
        }

        if let Some(entry) = parse_status_entry(line) {
            result.entries.push(entry);
        }
    }

    result
}

fn parse_status_entry(line: &str) -> Option<StatusEntry> {
    match line.as_bytes().first()? {
        b'1' => parse_ordinary_entry(line),
        b'2' => parse_rename_entry(line),
        b'?' => parse_bare_path_entry(line, "?"),
        b'!' => parse_bare_path_entry(line, "!"),
        _ => None,
    }
}

/// `1 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <path>`
fn parse_ordinary_entry(line: &str) -> Option<StatusEntry> {
    let fields: Vec<&str> = line.splitn(ORDINARY_FIELDS + 1, ' ').collect();
    if fields.len() != ORDINARY_FIELDS + 1 || fields[ORDINARY_FIELDS].is_empty() {
        return None;
    }

    Some(StatusEntry {
        state: fields[1].to_string(),
        path: fields[ORDINARY_FIELDS].to_string(),
        orig_path: None,
    })
}

/// `2 <XY> <sub> <mH> <mI> <mW> <hH> <hI> <X><score> <path><TAB><origPath>`
///
/// Paths may contain spaces, so the prefix is counted positionally instead of
/// tokenized, and the remainder is split on the tab.
fn parse_rename_entry(line: &str) -> Option<StatusEntry> {
    let fields: Vec<&str> = line.splitn(RENAME_FIELDS + 1, ' ').collect();
    if fields.len() != RENAME_FIELDS + 1 {
        return None;
    }
    if fields[..RENAME_FIELDS].iter().any(|f| f.is_empty()) {
        return None;
    }

    let (path, orig_path) = match fields[RENAME_FIELDS].split_once('\t') {
        Some((path, orig)) => (path, Some(orig.to_string())),
        None => (fields[RENAME_FIELDS], None),
    };

    Some(StatusEntry {
        state: fields[1].to_string(),
        path: path.to_string(),
        orig_path,
    })
}

/// `? <path>` and `! <path>`
fn parse_bare_path_entry(line: &str, state: &str) -> Option<StatusEntry> {
    let path = line.get(2..).filter(|p| !p.is_empty())?;

    Some(StatusEntry {
        state: state.to_string(),
        path: path.to_string(),
        orig_path: None,
    })
}

/// Current-branch header of a status listing
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BranchStatus {
    pub oid: String,
    pub head: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub upstream: Option<String>,
    pub ahead: u32,
    pub behind: u32,
}

impl BranchStatus {
    fn apply_header(&mut self, header: &str) {
        let Some((key, value)) = header.split_once(' ') else {
            return;
        };

        match key {
            "branch.oid" => self.oid = value.to_string(),
            "branch.head" => self.head = value.to_string(),
            "branch.upstream" => self.upstream = Some(value.to_string()),
            "branch.ab" => {
                for part in value.split_whitespace() {
                    if let Some(n) = part.strip_prefix('+') {
                        self.ahead = n.parse().unwrap_or(0);
                    } else if let Some(n) = part.strip_prefix('-') {
                        self.behind = n.parse().unwrap_or(0);
                    }
                }
            }
            _ => {}
        }
    }
}

/// One changed, untracked or ignored path
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct StatusEntry {
    /// `XY` code for tracked entries, `?` or `!` otherwise
    pub state: String,
    pub path: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub orig_path: Option<String>,
}

/// A full status snapshot
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct StatusResult {
    pub branch: BranchStatus,
    pub entries: Vec<StatusEntry>,
}
