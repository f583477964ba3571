use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::{Path, PathBuf};

use super::{
    PROTECTED_BRANCHES, ToolCallResult, ToolContext, ToolDescriptor, ToolError, current_branch, parse_args,
    schema,
};
use crate::error::GitError;

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![ToolDescriptor {
        name: "git_rebase",
        description: "Rebase the current branch onto another ref, or continue, abort or skip a rebase in progress (blocked on main/master)",
        input_schema: schema(
            json!({
                "upstream": {"type": "string", "description": "Ref to rebase onto (branch, tag, commit)"},
                "branch": {"type": "string", "description": "Branch to rebase (defaults to current branch)"},
                "autostash": {"type": "boolean", "description": "Stash and restore uncommitted changes around the rebase"},
                "continue": {"type": "boolean", "description": "Continue after resolving conflicts"},
                "abort": {"type": "boolean", "description": "Abort the rebase in progress"},
                "skip": {"type": "boolean", "description": "Skip the current commit and continue"}
            }),
            &[],
        ),
    }]
}

#[derive(Debug, Deserialize)]
struct RebaseParams {
    repo_path: PathBuf,
    #[serde(default)]
    upstream: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    autostash: bool,
    #[serde(default, rename = "continue")]
    continue_: bool,
    #[serde(default)]
    abort: bool,
    #[serde(default)]
    skip: bool,
}

/// The one thing a rebase call asks for
#[derive(Debug, PartialEq, Eq)]
enum RebaseOp {
    Start { upstream: String, branch: Option<String>, autostash: bool },
    Continue,
    Abort,
    Skip,
}

impl RebaseParams {
    fn operation(self) -> Result<RebaseOp, ToolError> {
        let upstream = self.upstream.filter(|u| !u.is_empty());
        let requested = [upstream.is_some(), self.continue_, self.abort, self.skip]
            .iter()
            .filter(|set| **set)
            .count();

        match requested {
            0 => Err(ToolError::Refused(
                "must specify upstream (for a new rebase) or continue/abort/skip (for a rebase in progress)"
                    .to_string(),
            )),
            1 => Ok(if self.continue_ {
                RebaseOp::Continue
            } else if self.abort {
                RebaseOp::Abort
            } else if self.skip {
                RebaseOp::Skip
            } else {
                RebaseOp::Start {
                    upstream: upstream.unwrap_or_default(),
                    branch: self.branch.filter(|b| !b.is_empty()),
                    autostash: self.autostash,
                }
            }),
            _ => Err(ToolError::Refused(
                "only one of upstream, continue, abort or skip can be specified".to_string(),
            )),
        }
    }
}

#[derive(Debug, Default, Serialize)]
struct RebaseResult {
    status: &'static str,
    #[serde(skip_serializing_if = "String::is_empty")]
    branch: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    upstream: String,
    #[serde(skip_serializing_if = "String::is_empty")]
    summary: String,
    #[serde(skip_serializing_if = "Vec::is_empty")]
    conflicts: Vec<String>,
}

pub(super) async fn git_rebase(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: RebaseParams = parse_args(args)?;
    let repo = params.repo_path.clone();

    match params.operation()? {
        RebaseOp::Abort => {
            ctx.git("git rebase --abort", &repo, &["rebase".into(), "--abort".into()])
                .await?;
            ToolCallResult::json(&RebaseResult {
                status: "aborted",
                ..Default::default()
            })
        }
        RebaseOp::Skip => {
            let out = ctx
                .git("git rebase --skip", &repo, &["rebase".into(), "--skip".into()])
                .await?;
            ToolCallResult::json(&RebaseResult {
                status: "skipped",
                summary: out.trim().to_string(),
                ..Default::default()
            })
        }
        RebaseOp::Continue => {
            let result = ctx
                .git("git rebase --continue", &repo, &["rebase".into(), "--continue".into()])
                .await;
            match result {
                Ok(out) => ToolCallResult::json(&RebaseResult {
                    status: "completed",
                    summary: out.trim().to_string(),
                    ..Default::default()
                }),
                Err(err) if stderr_mentions(&err, &["fix conflicts", "still have conflicts"]) => {
                    ToolCallResult::json(&RebaseResult {
                        status: "conflict",
                        conflicts: conflicted_files(ctx, &repo).await,
                        ..Default::default()
                    })
                }
                Err(err) => Err(err),
            }
        }
        RebaseOp::Start {
            upstream,
            branch,
            autostash,
        } => start(ctx, &repo, upstream, branch, autostash).await,
    }
}

async fn start(
    ctx: &ToolContext,
    repo: &Path,
    upstream: String,
    branch: Option<String>,
    autostash: bool,
) -> Result<ToolCallResult, ToolError> {
    let target = match &branch {
        Some(b) => b.clone(),
        None => current_branch(ctx, repo).await.unwrap_or_default(),
    };
    if PROTECTED_BRANCHES.contains(&target.as_str()) {
        return Err(ToolError::Refused("rebasing main/master is blocked for safety".to_string()));
    }

    if rebase_in_progress(ctx, repo).await {
        return Err(ToolError::Refused(
            "a rebase is already in progress; use continue, abort or skip".to_string(),
        ));
    }

    let mut args = vec!["rebase".to_string()];
    if autostash {
        args.push("--autostash".to_string());
    }
    args.push(upstream.clone());
    args.extend(branch);

    match ctx.git("git rebase", repo, &args).await {
        Ok(out) => {
            let up_to_date = out.contains("is up to date");
            ToolCallResult::json(&RebaseResult {
                status: if up_to_date { "up_to_date" } else { "completed" },
                branch: target,
                upstream,
                summary: if up_to_date { String::new() } else { out.trim().to_string() },
                conflicts: Vec::new(),
            })
        }
        Err(err) if stderr_mentions(&err, &["CONFLICT", "could not apply"]) => {
            ToolCallResult::json(&RebaseResult {
                status: "conflict",
                branch: target,
                upstream,
                summary: String::new(),
                conflicts: conflicted_files(ctx, repo).await,
            })
        }
        Err(err) => Err(err),
    }
}

/// Whether git keeps rebase state in the repository's git dir
async fn rebase_in_progress(ctx: &ToolContext, repo: &Path) -> bool {
    for state_dir in ["rebase-merge", "rebase-apply"] {
        let args = ["rev-parse".to_string(), "--git-path".to_string(), state_dir.to_string()];
        if let Ok(out) = ctx.git("git rev-parse", repo, &args).await {
            if repo.join(out.trim()).exists() {
                return true;
            }
        }
    }
    false
}

fn stderr_mentions(err: &ToolError, needles: &[&str]) -> bool {
    match err {
        ToolError::Git {
            source: GitError::CommandFailed { stderr, .. },
            ..
        } => needles.iter().any(|needle| stderr.contains(needle)),
        _ => false,
    }
}

async fn conflicted_files(ctx: &ToolContext, repo: &Path) -> Vec<String> {
    let args = ["diff", "--name-only", "--diff-filter=U"].map(String::from);
    ctx.git("git diff", repo, &args)
        .await
        .map(|out| {
            out.lines()
                .map(str::trim)
                .filter(|line| !line.is_empty())
                .map(String::from)
                .collect()
        })
        .unwrap_or_default()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn op(value: Value) -> Result<RebaseOp, ToolError> {
        parse_args::<RebaseParams>(value).unwrap().operation()
    }

    #[test]
    fn test_operation_selection() {
        assert_eq!(op(json!({"repo_path": "/r", "abort": true})).unwrap(), RebaseOp::Abort);
        assert_eq!(op(json!({"repo_path": "/r", "continue": true})).unwrap(), RebaseOp::Continue);
        assert_eq!(
            op(json!({"repo_path": "/r", "upstream": "origin/main", "autostash": true})).unwrap(),
            RebaseOp::Start {
                upstream: "origin/main".to_string(),
                branch: None,
                autostash: true,
            }
        );
    }

    #[test]
    fn test_operations_are_exclusive() {
        assert!(matches!(
            op(json!({"repo_path": "/r", "upstream": "main", "abort": true})),
            Err(ToolError::Refused(_))
        ));
        assert!(matches!(op(json!({"repo_path": "/r"})), Err(ToolError::Refused(_))));
        assert!(matches!(
            op(json!({"repo_path": "/r", "upstream": ""})),
            Err(ToolError::Refused(_))
        ));
    }

    #[test]
    fn test_stderr_mentions_only_command_failures() {
        let failed = ToolError::Git {
            command: "git rebase",
            source: GitError::CommandFailed {
                args: "rebase main".to_string(),
                status: "exit code 1".to_string(),
                stderr: "error: could not apply 1234abc... change".to_string(),
            },
        };
        assert!(stderr_mentions(&failed, &["CONFLICT", "could not apply"]));
        assert!(!stderr_mentions(&ToolError::Refused("x".to_string()), &["x"]));
    }
}
