use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{ToolCallResult, ToolContext, ToolDescriptor, ToolError, or_default, parse_args, schema};
use crate::git::parser;

fn paths_schema(verb: &str) -> Value {
    json!({
        "paths": {
            "type": "array",
            "items": {"type": "string"},
            "description": format!("File paths to {} (relative to repo root)", verb)
        }
    })
}

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "git_add",
            description: "Stage files for commit",
            input_schema: schema(paths_schema("stage"), &["paths"]),
        },
        ToolDescriptor {
            name: "git_reset",
            description: "Unstage files (does not modify the working tree)",
            input_schema: schema(paths_schema("unstage"), &["paths"]),
        },
        ToolDescriptor {
            name: "git_commit",
            description: "Create a new commit with staged changes",
            input_schema: schema(
                json!({
                    "message": {
                        "type": "string",
                        "description": "Commit message"
                    }
                }),
                &["message"],
            ),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct PathsParams {
    repo_path: PathBuf,
    paths: Vec<String>,
}

impl PathsParams {
    fn require_paths(&self) -> Result<(), ToolError> {
        if self.paths.is_empty() {
            return Err(ToolError::Refused("paths must not be empty".to_string()));
        }
        Ok(())
    }
}

pub(super) async fn git_add(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: PathsParams = parse_args(args)?;
    params.require_paths()?;

    let mut args = vec!["add".to_string(), "--".to_string()];
    args.extend(params.paths.iter().cloned());

    let out = ctx.git("git add", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(out, "files staged successfully")))
}

pub(super) async fn git_reset(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: PathsParams = parse_args(args)?;
    params.require_paths()?;

    let mut args = vec!["reset".to_string(), "HEAD".to_string(), "--".to_string()];
    args.extend(params.paths.iter().cloned());

    let out = ctx.git("git reset", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(out, "files unstaged successfully")))
}

#[derive(Debug, Deserialize)]
struct CommitParams {
    repo_path: PathBuf,
    message: String,
}

pub(super) async fn git_commit(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: CommitParams = parse_args(args)?;
    if params.message.trim().is_empty() {
        return Err(ToolError::Refused("commit message must not be empty".to_string()));
    }

    let args = vec!["commit".to_string(), "-m".to_string(), params.message];
    let out = ctx.git("git commit", &params.repo_path, &args).await?;

    ToolCallResult::json(&parser::parse_commit(&out))
}
