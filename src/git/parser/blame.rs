use std::collections::HashMap;

use serde::Serialize;

/// Parse `git blame --porcelain` output
///
/// Each hunk starts with `<hash> <orig-line> <final-line> [<group-size>]`,
/// followed by `key value` metadata lines and a tab-prefixed content line.
/// Git only prints the metadata the first time a commit appears, so later
/// hunks for the same hash inherit the author fields seen first.
pub fn parse_blame(output: &str) -> Vec<BlameLine> {
    let mut result = Vec::new();
    let mut authors: HashMap<&str, BlameAuthor> = HashMap::new();
    let mut lines = output.split('\n');

    while let Some(header) = lines.next() {
        let mut parts = header.split_whitespace();
        let (Some(hash), Some(orig), Some(fin)) = (parts.next(), parts.next(), parts.next()) else {
            continue;
        };

        let mut author = authors.get(hash).cloned().unwrap_or_default();
        let mut content = String::new();

        for line in lines.by_ref() {
            if let Some(text) = line.strip_prefix('\t') {
                content = text.to_string();
                break;
            }
            author.apply(line);
        }

        authors.entry(hash).or_insert_with(|| author.clone());

        result.push(BlameLine {
            hash: hash.to_string(),
            orig_line: orig.parse().unwrap_or(0),
            final_line: fin.parse().unwrap_or(0),
            author_name: author.name,
            author_email: author.email,
            author_date: author.date,
            summary: author.summary,
            content,
        });
    }

    result
}

/// Metadata git prints once per commit in porcelain mode
#[derive(Debug, Clone, Default)]
struct BlameAuthor {
    name: String,
    email: String,
    date: String,
    summary: String,
}

impl BlameAuthor {
    fn apply(&mut self, line: &str) {
        let (key, value) = line.split_once(' ').unwrap_or((line, ""));

        match key {
            "author" => self.name = value.to_string(),
            "author-mail" => {
                self.email = value.trim_matches(|c| c == '<' || c == '>').to_string()
            }
            "author-time" => self.date = value.to_string(),
            "summary" => self.summary = value.to_string(),
            _ => {}
        }
    }
}

/// Attribution of a single line of a file
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct BlameLine {
    pub hash: String,
    pub orig_line: usize,
    pub final_line: usize,
    pub author_name: String,
    pub author_email: String,
    pub author_date: String,
    pub summary: String,
    pub content: String,
}
