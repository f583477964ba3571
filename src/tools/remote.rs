use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{
    PROTECTED_BRANCHES, ToolCallResult, ToolContext, ToolDescriptor, ToolError, current_branch, or_default,
    parse_args, schema,
};
use crate::git::parser;

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "git_fetch",
            description: "Fetch from a remote",
            input_schema: schema(
                json!({
                    "remote": {"type": "string", "description": "Remote to fetch from"},
                    "prune": {"type": "boolean", "description": "Prune deleted remote branches"},
                    "all": {"type": "boolean", "description": "Fetch all remotes"}
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "git_pull",
            description: "Pull changes from a remote",
            input_schema: schema(
                json!({
                    "remote": {"type": "string", "description": "Remote to pull from"},
                    "branch": {"type": "string", "description": "Branch to pull"},
                    "rebase": {"type": "boolean", "description": "Rebase instead of merge"}
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "git_push",
            description: "Push commits to a remote (force pushes to main/master are refused)",
            input_schema: schema(
                json!({
                    "remote": {"type": "string", "description": "Remote to push to"},
                    "branch": {"type": "string", "description": "Branch to push"},
                    "set_upstream": {"type": "boolean", "description": "Set upstream tracking (-u)"},
                    "force": {"type": "boolean", "description": "Force push"}
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "git_remote_list",
            description: "List remotes with their fetch and push URLs",
            input_schema: schema(json!({}), &[]),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct FetchParams {
    repo_path: PathBuf,
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    prune: bool,
    #[serde(default)]
    all: bool,
}

pub(super) async fn git_fetch(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: FetchParams = parse_args(args)?;

    let mut args = vec!["fetch".to_string()];
    if params.prune {
        args.push("--prune".to_string());
    }
    if params.all {
        args.push("--all".to_string());
    } else {
        args.extend(params.remote.filter(|r| !r.is_empty()));
    }

    let out = ctx.git("git fetch", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(out, "fetch completed")))
}

#[derive(Debug, Deserialize)]
struct PullParams {
    repo_path: PathBuf,
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    rebase: bool,
}

pub(super) async fn git_pull(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: PullParams = parse_args(args)?;

    let mut args = vec!["pull".to_string()];
    if params.rebase {
        args.push("--rebase".to_string());
    }
    args.extend(params.remote.filter(|r| !r.is_empty()));
    args.extend(params.branch.filter(|b| !b.is_empty()));

    let out = ctx.git("git pull", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(out, "pull completed")))
}

#[derive(Debug, Deserialize)]
struct PushParams {
    repo_path: PathBuf,
    #[serde(default)]
    remote: Option<String>,
    #[serde(default)]
    branch: Option<String>,
    #[serde(default)]
    set_upstream: bool,
    #[serde(default)]
    force: bool,
}

pub(super) async fn git_push(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: PushParams = parse_args(args)?;
    let branch = params.branch.filter(|b| !b.is_empty());

    if params.force {
        let target = match &branch {
            Some(b) => Some(b.clone()),
            None => current_branch(ctx, &params.repo_path).await,
        };
        if target.is_some_and(|b| PROTECTED_BRANCHES.contains(&b.as_str())) {
            return Err(ToolError::Refused(
                "force push to main/master is blocked for safety".to_string(),
            ));
        }
    }

    let mut args = vec!["push".to_string()];
    if params.force {
        args.push("--force".to_string());
    }
    if params.set_upstream {
        args.push("-u".to_string());
    }
    args.extend(params.remote.filter(|r| !r.is_empty()));
    args.extend(branch);

    let out = ctx.git("git push", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(out, "push completed")))
}

#[derive(Debug, Deserialize)]
struct RemoteListParams {
    repo_path: PathBuf,
}

pub(super) async fn git_remote_list(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: RemoteListParams = parse_args(args)?;
    let args = ["remote", "-v"].map(String::from);

    let out = ctx.git("git remote", &params.repo_path, &args).await?;
    ToolCallResult::json(&parser::parse_remote_list(&out))
}
