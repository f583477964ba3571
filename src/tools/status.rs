use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{ToolCallResult, ToolContext, ToolDescriptor, ToolError, parse_args, schema};
use crate::git::parser::{self, DiffResult};

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "git_status",
            description: "Show working tree status as structured JSON",
            input_schema: schema(json!({}), &[]),
        },
        ToolDescriptor {
            name: "git_diff",
            description: "Show changes in the working tree or between commits, with per-file stats",
            input_schema: schema(
                json!({
                    "staged": {
                        "type": "boolean",
                        "description": "Show staged changes (--cached)"
                    },
                    "ref": {
                        "type": "string",
                        "description": "Diff against a specific ref (commit, branch, tag)"
                    },
                    "paths": {
                        "type": "array",
                        "items": {"type": "string"},
                        "description": "Limit diff to specific paths"
                    },
                    "stat_only": {
                        "type": "boolean",
                        "description": "Return only per-file stats, no patch"
                    },
                    "max_patch_lines": {
                        "type": "integer",
                        "description": "Truncate the patch after this many lines (0 disables)"
                    }
                }),
                &[],
            ),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct StatusParams {
    repo_path: PathBuf,
}

pub(super) async fn git_status(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: StatusParams = parse_args(args)?;
    let args = ["status", "--porcelain=v2", "--branch"].map(String::from);

    let out = ctx.git("git status", &params.repo_path, &args).await?;
    ToolCallResult::json(&parser::parse_status(&out))
}

#[derive(Debug, Deserialize)]
struct DiffParams {
    repo_path: PathBuf,
    #[serde(default)]
    staged: bool,
    #[serde(default, rename = "ref")]
    reference: Option<String>,
    #[serde(default)]
    paths: Vec<String>,
    #[serde(default)]
    stat_only: bool,
    max_patch_lines: Option<i64>,
}

impl DiffParams {
    /// `git diff [<mode>] [--cached] [<ref>] [-- <paths>]`
    fn args(&self, mode: Option<&str>) -> Vec<String> {
        let mut args = vec!["diff".to_string()];
        args.extend(mode.map(String::from));
        if self.staged {
            args.push("--cached".to_string());
        }
        args.extend(self.reference.clone());
        if !self.paths.is_empty() {
            args.push("--".to_string());
            args.extend(self.paths.iter().cloned());
        }
        args
    }
}

pub(super) async fn git_diff(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: DiffParams = parse_args(args)?;

    let numstat = ctx
        .git("git diff", &params.repo_path, &params.args(Some("--numstat")))
        .await?;
    let patch = if params.stat_only {
        String::new()
    } else {
        ctx.git("git diff", &params.repo_path, &params.args(None)).await?
    };

    let max_lines = params.max_patch_lines.unwrap_or(ctx.max_patch_lines);
    ToolCallResult::json(&DiffResult::new(&numstat, &patch, max_lines))
}
