use crate::error::{GitError, GitResult};
use std::path::Path;
use std::process::{Output, Stdio};
use std::time::Duration;
use tokio::process::Command;
use tracing::{debug, warn};

const TRUNCATION_MARKER: &str = "... (truncated)";

/// Settings for [`GitRunner`]
#[derive(Debug, Clone)]
pub struct RunnerOptions {
    /// Program to invoke, normally `git`
    pub binary: String,
    pub timeout: Duration,
    /// Upper bound on the stderr text carried by a failure
    pub max_stderr_bytes: usize,
}

impl Default for RunnerOptions {
    fn default() -> Self {
        Self {
            binary: "git".to_string(),
            timeout: Duration::from_secs(30),
            max_stderr_bytes: 4096,
        }
    }
}

/// Runs git subcommands and hands back their stdout
///
/// Arguments are passed straight to the process, never through a shell.
#[derive(Debug, Clone, Default)]
pub struct GitRunner {
    options: RunnerOptions,
}

impl GitRunner {
    pub fn new(options: RunnerOptions) -> Self {
        Self { options }
    }

    pub fn options(&self) -> &RunnerOptions {
        &self.options
    }

    /// Run `git <args>` inside `dir` and return its stdout
    ///
    /// A non-zero exit is an error carrying the (truncated) stderr.
    pub async fn run<S: AsRef<str>>(&self, dir: &Path, args: &[S]) -> GitResult<String> {
        if dir.as_os_str().as_encoded_bytes().contains(&0) {
            return Err(GitError::InvalidArgument("dir contains null byte".to_string()));
        }
        let args: Vec<&str> = args.iter().map(|arg| arg.as_ref()).collect();
        if args.iter().any(|arg| arg.contains('\0')) {
            return Err(GitError::InvalidArgument("argument contains null byte".to_string()));
        }

        let joined = args.join(" ");
        debug!(dir = %dir.display(), args = %joined, "running git");

        let child = Command::new(&self.options.binary)
            .args(&args)
            .current_dir(dir)
            .env("GIT_TERMINAL_PROMPT", "0")
            .env("GIT_EDITOR", "true")
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|source| GitError::Spawn {
                binary: self.options.binary.clone(),
                source,
            })?;

        let output = tokio::time::timeout(self.options.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                warn!(args = %joined, "git timed out");
                GitError::Timeout {
                    args: joined.clone(),
                    seconds: self.options.timeout.as_secs(),
                }
            })??;

        self.process_output(output, joined)
    }

    /// Turn a finished process into stdout or a descriptive failure
    fn process_output(&self, output: Output, args: String) -> GitResult<String> {
        if output.status.success() {
            return Ok(String::from_utf8_lossy(&output.stdout).into_owned());
        }

        let stderr = String::from_utf8_lossy(&output.stderr);
        let stderr = limit_stderr(stderr.trim(), self.options.max_stderr_bytes);
        let status = match output.status.code() {
            Some(code) => format!("exit code {}", code),
            None => "terminated by signal".to_string(),
        };

        debug!(args = %args, status = %status, "git failed");

        Err(GitError::CommandFailed {
            args,
            status,
            stderr,
        })
    }
}

/// Cut `stderr` to at most `max_bytes`, on a char boundary
pub fn limit_stderr(stderr: &str, max_bytes: usize) -> String {
    if stderr.len() <= max_bytes {
        return stderr.to_string();
    }

    let mut end = max_bytes;
    while !stderr.is_char_boundary(end) {
        end -= 1;
    }

    format!("{}{}", &stderr[..end], TRUNCATION_MARKER)
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::path::PathBuf;
    use tempfile::TempDir;

    fn create_test_repo() -> (TempDir, PathBuf) {
        let temp_dir = TempDir::new().unwrap();
        let repo_path = temp_dir.path().to_path_buf();

        std::process::Command::new("git")
            .args(["init"])
            .current_dir(&repo_path)
            .output()
            .unwrap();

        (temp_dir, repo_path)
    }

    #[tokio::test]
    async fn test_run_status() {
        let (_temp, repo_path) = create_test_repo();
        let runner = GitRunner::default();

        let output = runner
            .run(&repo_path, &["status", "--porcelain=v2", "--branch"])
            .await
            .unwrap();
        assert!(output.contains("# branch.head"));
    }

    #[tokio::test]
    async fn test_run_failure_carries_stderr() {
        let (_temp, repo_path) = create_test_repo();
        let runner = GitRunner::default();

        // Log fails in an empty repository
        let err = runner.run(&repo_path, &["log"]).await.unwrap_err();
        match err {
            GitError::CommandFailed { args, stderr, .. } => {
                assert_eq!(args, "log");
                assert!(!stderr.is_empty());
            }
            other => panic!("unexpected error: {other}"),
        }
    }

    #[tokio::test]
    async fn test_rejects_null_byte_argument() {
        let (_temp, repo_path) = create_test_repo();
        let runner = GitRunner::default();

        let result = runner.run(&repo_path, &["status", "bad\0arg"]).await;
        assert!(matches!(result, Err(GitError::InvalidArgument(_))));
    }

    #[tokio::test]
    async fn test_missing_binary() {
        let (_temp, repo_path) = create_test_repo();
        let runner = GitRunner::new(RunnerOptions {
            binary: "definitely-not-a-git-binary".to_string(),
            ..Default::default()
        });

        let result = runner.run(&repo_path, &["status"]).await;
        assert!(matches!(result, Err(GitError::Spawn { .. })));
    }

    #[test]
    fn test_limit_stderr() {
        assert_eq!(limit_stderr("short", 10), "short");
        assert_eq!(limit_stderr("abcdefghij", 4), "abcd... (truncated)");
        // Never splits a multi-byte character
        assert_eq!(limit_stderr("ééé", 3), "é... (truncated)");
    }
}
