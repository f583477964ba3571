use serde::{Deserialize, Serialize};
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{ToolCallResult, ToolContext, ToolDescriptor, ToolError, parse_args, schema};
use crate::git::parser::{self, LOG_FORMAT, SHOW_FORMAT};

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "git_log",
            description: "Show commit history as structured JSON",
            input_schema: schema(
                json!({
                    "max_count": {
                        "type": "integer",
                        "description": "Maximum number of commits to show (default 10)"
                    },
                    "ref": {
                        "type": "string",
                        "description": "Starting ref (commit, branch, tag)"
                    },
                    "paths": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Limit to commits affecting these paths"
                    },
                    "all": {
                        "type": "boolean",
                        "description": "Show commits from all branches"
                    }
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "git_show",
            description: "Show a commit, tag, or other git object",
            input_schema: schema(
                json!({
                    "ref": {
                        "type": "string",
                        "description": "Ref to show (commit hash, tag, branch, etc.)"
                    }
                }),
                &["ref"],
            ),
        },
        ToolDescriptor {
            name: "git_blame",
            description: "Show line-by-line authorship of a file",
            input_schema: schema(
                json!({
                    "path": {
                        "type": "string",
                        "description": "File path to blame (relative to repo root)"
                    },
                    "ref": {
                        "type": "string",
                        "description": "Blame at a specific ref"
                    },
                    "line_range": {
                        "type": "string",
                        "description": "Line range in format START,END (e.g. '10,20')"
                    }
                }),
                &["path"],
            ),
        },
        ToolDescriptor {
            name: "git_rev_parse",
            description: "Resolve a revision such as HEAD, a branch, a tag or HEAD~3 to its full SHA",
            input_schema: schema(
                json!({
                    "ref": {
                        "type": "string",
                        "description": "Ref to resolve (e.g. HEAD, main, v1.0, HEAD~3, abc1234)"
                    }
                }),
                &["ref"],
            ),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct LogParams {
    repo_path: PathBuf,
    #[serde(default)]
    max_count: Option<i64>,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    all: bool,
}

pub(super) async fn git_log(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: LogParams = parse_args(args)?;

    let max_count = match params.max_count {
        Some(n) if n > 0 => n as usize,
        _ => ctx.default_log_count,
    };

    let mut args = vec![
        "log".to_string(),
        format!("--max-count={}", max_count),
        format!("--format={}", LOG_FORMAT),
    ];
    if params.all {
        args.push("--all".to_string());
    }
    args.extend(params.reference);
    if !params.paths.is_empty() {
        args.push("--".to_string());
        args.extend(params.paths);
    }

    let out = ctx.git("git log", &params.repo_path, &args).await?;
    ToolCallResult::json(&parser::parse_log(&out))
}

#[derive(Debug, Deserialize)]
struct ShowParams {
    repo_path: PathBuf,
    #[serde(rename = "ref")]
    reference: String,
}

pub(super) async fn git_show(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: ShowParams = parse_args(args)?;
    let repo = &params.repo_path;
    let reference = params.reference.clone();

    let metadata = ctx
        .git(
            "git show",
            repo,
            &["show".into(), "--no-patch".into(), format!("--format={}", SHOW_FORMAT), reference.clone()],
        )
        .await;

    let metadata = match metadata {
        Ok(out) => out,
        Err(_) => return show_raw(ctx, &params).await,
    };

    // Stats and patch are best effort; a commit without them is still shown
    let numstat = ctx
        .git("git show", repo, &["show".into(), "--numstat".into(), "--format=".into(), reference.clone()])
        .await
        .unwrap_or_default();
    let patch = ctx
        .git("git show", repo, &["show".into(), "--patch".into(), "--format=".into(), reference])
        .await
        .unwrap_or_default();

    let result = parser::parse_show(&metadata, &numstat, &patch);
    if !result.is_commit() {
        return show_raw(ctx, &params).await;
    }

    ToolCallResult::json(&result.truncate_patch(ctx.max_patch_lines))
}

/// Plain `git show` text for tags, blobs and trees
async fn show_raw(ctx: &ToolContext, params: &ShowParams) -> Result<ToolCallResult, ToolError> {
    let out = ctx
        .git("git show", &params.repo_path, &["show".into(), params.reference.clone()])
        .await?;
    Ok(ToolCallResult::text(out))
}

#[derive(Debug, Deserialize)]
struct BlameParams {
    repo_path: PathBuf,
    path: String,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    line_range: Option<String>,
}

pub(super) async fn git_blame(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: BlameParams = parse_args(args)?;

    let mut args = vec!["blame".to_string(), "--porcelain".to_string()];
    if let Some(range) = params.line_range.filter(|r| !r.is_empty()) {
        args.push(format!("-L{}", range));
    }
    args.extend(params.reference.filter(|r| !r.is_empty()));
    args.push("--".to_string());
    args.push(params.path);

    let out = ctx.git("git blame", &params.repo_path, &args).await?;
    ToolCallResult::json(&parser::parse_blame(&out))
}

#[derive(Debug, Deserialize)]
struct RevParseParams {
    repo_path: PathBuf,
    #[serde(rename = "ref")]
    reference: String,
}

#[derive(Debug, Serialize)]
struct RevParseResult {
    resolved: String,
    #[serde(rename = "ref")]
    reference: String,
}

pub(super) async fn git_rev_parse(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: RevParseParams = parse_args(args)?;

    let args = vec!["rev-parse".to_string(), "--verify".to_string(), params.reference.clone()];
    let out = ctx.git("git rev-parse", &params.repo_path, &args).await?;

    ToolCallResult::json(&RevParseResult {
        resolved: out.trim().to_string(),
        reference: params.reference,
    })
}
