use std::collections::HashMap;

use serde::Serialize;

/// Parse `git remote -v` output
///
/// Lines look like `origin<TAB>https://host/repo.git (fetch)`. Remotes are
/// returned in first-seen order, with fetch and push URLs merged per name.
pub fn parse_remote_list(output: &str) -> Vec<RemoteEntry> {
    let mut remotes: Vec<RemoteEntry> = Vec::new();
    let mut index: HashMap<&str, usize> = HashMap::new();

    for line in output.trim().lines() {
        let Some((name, rest)) = line.split_once('\t') else {
            continue;
        };

        let (url, kind) = match rest.split_once(' ') {
            Some((url, kind)) => (url, kind.trim_matches(|c| c == '(' || c == ')')),
            None => (rest, ""),
        };

        let slot = *index.entry(name).or_insert_with(|| {
            remotes.push(RemoteEntry {
                name: name.to_string(),
                ..Default::default()
            });
            remotes.len() - 1
        });

        match kind {
            "fetch" => remotes[slot].fetch_url = url.to_string(),
            "push" => remotes[slot].push_url = url.to_string(),
            _ => {}
        }
    }

    remotes
}

/// A named remote with its fetch and push URLs
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct RemoteEntry {
    pub name: String,
    pub fetch_url: String,
    pub push_url: String,
}
