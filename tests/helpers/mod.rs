#![allow(dead_code)]

use gitbridge::{GitRunner, RunnerOptions, ToolContext};
use std::fs;
use std::path::{Path, PathBuf};
use std::process::Command;
use tempfile::TempDir;

fn git(repo_path: &Path, args: &[&str]) {
    let output = Command::new("git")
        .args(args)
        .current_dir(repo_path)
        .output()
        .expect("Failed to run git");
    assert!(
        output.status.success(),
        "git {:?} failed: {}",
        args,
        String::from_utf8_lossy(&output.stderr)
    );
}

/// Helper to create a test git repository on branch `main`
pub fn create_test_repo() -> (TempDir, PathBuf) {
    let temp_dir = TempDir::new().unwrap();
    let repo_path = temp_dir.path().to_path_buf();

    git(&repo_path, &["init", "--quiet"]);
    git(&repo_path, &["symbolic-ref", "HEAD", "refs/heads/main"]);
    git(&repo_path, &["config", "user.name", "Test User"]);
    git(&repo_path, &["config", "user.email", "test@example.com"]);
    git(&repo_path, &["config", "commit.gpgsign", "false"]);

    (temp_dir, repo_path)
}

/// Helper to create a commit
pub fn create_commit(repo_path: &Path, file: &str, content: &str, message: &str) {
    let file_path = repo_path.join(file);
    if let Some(dir) = file_path.parent() {
        fs::create_dir_all(dir).expect("Failed to create directory");
    }
    fs::write(&file_path, content).expect("Failed to write file");

    git(repo_path, &["add", "--", file]);
    git(repo_path, &["commit", "--quiet", "-m", message]);
}

/// Tool context with default limits over the system git
pub fn tool_context() -> ToolContext {
    ToolContext::new(GitRunner::new(RunnerOptions::default()))
}
