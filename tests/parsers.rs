use gitbridge::git::parser::{
    CommitOutcome, parse_blame, parse_branch_list, parse_commit, parse_diff_numstat, parse_log,
    parse_remote_list, parse_show, parse_status, truncate_patch,
};

#[test]
fn test_empty_input_yields_empty_collections() {
    assert!(parse_branch_list("").is_empty());
    assert!(parse_log("").is_empty());
    assert!(parse_blame("").is_empty());
    assert!(parse_remote_list("").is_empty());
    assert!(parse_diff_numstat("").is_empty());

    let status = parse_status("");
    assert!(status.entries.is_empty());
    assert_eq!(serde_json::to_value(&status).unwrap()["entries"], serde_json::json!([]));
}

#[test]
fn test_branch_list_current_and_upstream() {
    let input = "*\x1fmain\x1fabc1\x1fInit\x1forigin/main\x1f[ahead 1]\x1e \x1ffeat\x1fdef2\x1fAdd\x1f\x1f\x1e";
    let branches = parse_branch_list(input);

    assert_eq!(branches.len(), 2);
    assert!(branches[0].is_current);
    assert_eq!(branches[0].name, "main");
    assert_eq!(branches[0].upstream.as_deref(), Some("origin/main"));
    assert_eq!(branches[0].track.as_deref(), Some("[ahead 1]"));
    assert!(!branches[1].is_current);
    assert_eq!(branches[1].name, "feat");
    assert_eq!(branches[1].upstream, None);
}

#[test]
fn test_branch_list_skips_short_records() {
    let input = "*\x1fmain\x1e \x1ffeat\x1fdef2\x1fAdd\x1e";
    let branches = parse_branch_list(input);

    assert_eq!(branches.len(), 1);
    assert_eq!(branches[0].name, "feat");
}

#[test]
fn test_log_skips_malformed_record() {
    let input = "h1\x1fA\x1fa@x\x1f2024-01-01\x1fFirst\x1f\x1e\ngarbage\x1e\nh2\x1fB\x1fb@x\x1f2024-01-02\x1fSecond\x1fbody text\x1e";
    let log = parse_log(input);

    assert_eq!(log.len(), 2);
    assert_eq!(log[0].hash, "h1");
    assert_eq!(log[0].body, None);
    assert_eq!(log[1].subject, "Second");
    assert_eq!(log[1].body.as_deref(), Some("body text"));
}

#[test]
fn test_show_of_non_commit_has_zero_metadata() {
    let result = parse_show("object contents without separators", "", "");

    assert!(!result.is_commit());
    assert_eq!(result.commit.subject, "");
    assert!(result.stats.is_empty());
}

#[test]
fn test_blame_inherits_metadata_for_repeated_hash() {
    let input = "abc 1 1 3\n\
                 author Jane\n\
                 author-mail <jane@example.com>\n\
                 author-time 1700000000\n\
                 summary Initial\n\
                 filename a.txt\n\
                 \tfirst line\n\
                 abc 2 2\n\
                 filename a.txt\n\
                 \tsecond line\n";
    let lines = parse_blame(input);

    assert_eq!(lines.len(), 2);
    assert_eq!(lines[0].author_email, "jane@example.com");
    assert_eq!(lines[1].author_name, "Jane");
    assert_eq!(lines[1].author_email, "jane@example.com");
    assert_eq!(lines[1].author_date, lines[0].author_date);
    assert_eq!(lines[1].summary, "Initial");
    assert_eq!(lines[1].content, "second line");
    assert_eq!(lines[1].final_line, 2);
}

#[test]
fn test_blame_bad_line_numbers_default_to_zero() {
    let lines = parse_blame("abc x y\nauthor Jane\n\tcontent\n");

    assert_eq!(lines.len(), 1);
    assert_eq!(lines[0].orig_line, 0);
    assert_eq!(lines[0].final_line, 0);
}

#[test]
fn test_remote_list_groups_fetch_and_push() {
    let input = "origin\thttps://example.com/a.git (fetch)\n\
                 origin\tssh://example.com/a.git (push)\n\
                 upstream\thttps://example.com/b.git (fetch)\n";
    let remotes = parse_remote_list(input);

    assert_eq!(remotes.len(), 2);
    assert_eq!(remotes[0].name, "origin");
    assert_eq!(remotes[0].fetch_url, "https://example.com/a.git");
    assert_eq!(remotes[0].push_url, "ssh://example.com/a.git");
    assert_eq!(remotes[1].name, "upstream");
    assert_eq!(remotes[1].push_url, "");
}

#[test]
fn test_status_headers_and_entries() {
    let input = "# branch.oid 1234abcd\n\
                 # branch.head main\n\
                 # branch.upstream origin/main\n\
                 # branch.ab +2 -3\n\
                 1 .M N... 100644 100644 100644 aaa bbb src/lib.rs\n\
                 2 R. N... 100644 100644 100644 aaa bbb R100 new name.txt\told name.txt\n\
                 ? untracked file.txt\n\
                 ! target\n\
                 u something unmerged we skip\n";
    let status = parse_status(input);

    assert_eq!(status.branch.oid, "1234abcd");
    assert_eq!(status.branch.head, "main");
    assert_eq!(status.branch.upstream.as_deref(), Some("origin/main"));
    assert_eq!(status.branch.ahead, 2);
    assert_eq!(status.branch.behind, 3);

    assert_eq!(status.entries.len(), 4);
    assert_eq!(status.entries[0].state, ".M");
    assert_eq!(status.entries[0].path, "src/lib.rs");
    assert_eq!(status.entries[1].state, "R.");
    assert_eq!(status.entries[1].path, "new name.txt");
    assert_eq!(status.entries[1].orig_path.as_deref(), Some("old name.txt"));
    assert_eq!(status.entries[2].state, "?");
    assert_eq!(status.entries[2].path, "untracked file.txt");
    assert_eq!(status.entries[3].state, "!");
}

#[test]
fn test_status_short_rename_is_skipped() {
    let status = parse_status("2 R. N... 100644 newpath\toldpath\n");
    assert!(status.entries.is_empty());
}

#[test]
fn test_commit_result_forms() {
    let structured = parse_commit("[main abc1234] Add feature\n 1 file changed, 1 insertion(+)\n");
    assert_eq!(structured.branch, "main");
    assert_eq!(structured.hash, "abc1234");
    assert_eq!(structured.subject, "Add feature");

    let detached = parse_commit("[detached HEAD 0f0f0f0] Fixup\n");
    assert_eq!(detached.branch, "detached HEAD");
    assert_eq!(detached.hash, "0f0f0f0");

    let plain = parse_commit("Something unexpected\nmore\n");
    assert_eq!(plain.branch, "");
    assert_eq!(plain.hash, "");
    assert_eq!(plain.subject, "Something unexpected");

    assert!(matches!(
        CommitOutcome::from_output("Something unexpected"),
        CommitOutcome::Unstructured { .. }
    ));
}

#[test]
fn test_numstat_binary_and_bad_counts() {
    let stats = parse_diff_numstat("-\t-\tbinary.png\nx\t4\tweird.txt\n3\t1\tpath with\ttab.txt\n");

    assert_eq!(stats.len(), 3);
    assert!(stats[0].binary);
    assert_eq!((stats[0].additions, stats[0].deletions), (0, 0));
    assert_eq!(stats[1].additions, 0);
    assert_eq!(stats[1].deletions, 4);
    assert_eq!(stats[2].path, "path with\ttab.txt");
}

#[test]
fn test_patch_truncation_limits() {
    let patch = "l1\nl2\nl3\nl4\nl5";

    let cut = truncate_patch(patch, 3);
    assert_eq!(cut.text, "l1\nl2\nl3");
    assert!(cut.truncated);
    assert_eq!(cut.cut_line, 3);

    for max in [0, -1, 5, 10] {
        let whole = truncate_patch(patch, max);
        assert_eq!(whole.text, patch);
        assert!(!whole.truncated);
    }
}
