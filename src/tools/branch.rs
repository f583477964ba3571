use serde::Deserialize;
use serde_json::{Value, json};
use std::path::PathBuf;

use super::{ToolCallResult, ToolContext, ToolDescriptor, ToolError, or_default, parse_args, schema};
use crate::git::parser::{self, BRANCH_FORMAT};

pub(super) fn descriptors() -> Vec<ToolDescriptor> {
    vec![
        ToolDescriptor {
            name: "git_branch_list",
            description: "List branches as structured JSON",
            input_schema: schema(
                json!({
                    "remote": {
                        "type": "boolean",
                        "description": "List remote-tracking branches (-r)"
                    },
                    "all": {
                        "type": "boolean",
                        "description": "List both local and remote branches (-a)"
                    }
                }),
                &[],
            ),
        },
        ToolDescriptor {
            name: "git_branch_create",
            description: "Create a new branch",
            input_schema: schema(
                json!({
                    "name": {
                        "type": "string",
                        "description": "Name of the new branch"
                    },
                    "start_point": {
                        "type": "string",
                        "description": "Commit or branch to start from (default HEAD)"
                    }
                }),
                &["name"],
            ),
        },
        ToolDescriptor {
            name: "git_checkout",
            description: "Switch branches",
            input_schema: schema(
                json!({
                    "ref": {
                        "type": "string",
                        "description": "Branch name or ref to check out"
                    },
                    "create": {
                        "type": "boolean",
                        "description": "Create a new branch and check it out (-b)"
                    }
                }),
                &["ref"],
            ),
        },
    ]
}

#[derive(Debug, Deserialize)]
struct BranchListParams {
    repo_path: PathBuf,
    #[serde(default)]
    remote: bool,
    #[serde(default)]
    all: bool,
}

pub(super) async fn git_branch_list(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: BranchListParams = parse_args(args)?;

    let mut args = vec!["branch".to_string(), format!("--format={}", BRANCH_FORMAT)];
    if params.all {
        args.push("-a".to_string());
    } else if params.remote {
        args.push("-r".to_string());
    }

    let out = ctx.git("git branch", &params.repo_path, &args).await?;
    ToolCallResult::json(&parser::parse_branch_list(&out))
}

#[derive(Debug, Deserialize)]
struct BranchCreateParams {
    repo_path: PathBuf,
    name: String,
    #[serde(default)]
    start_point: Option<String>,
}

pub(super) async fn git_branch_create(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: BranchCreateParams = parse_args(args)?;

    let mut args = vec!["branch".to_string(), params.name.clone()];
    args.extend(params.start_point.filter(|s| !s.is_empty()));

    let out = ctx.git("git branch", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(
        out,
        format!("branch '{}' created", params.name),
    )))
}

#[derive(Debug, Deserialize)]
struct CheckoutParams {
    repo_path: PathBuf,
    #[serde(rename = "ref")]
    reference: String,
    #[serde(default)]
    create: bool,
}

pub(super) async fn git_checkout(ctx: &ToolContext, args: Value) -> Result<ToolCallResult, ToolError> {
    let params: CheckoutParams = parse_args(args)?;

    let mut args = vec!["checkout".to_string()];
    if params.create {
        args.push("-b".to_string());
    }
    args.push(params.reference.clone());

    let out = ctx.git("git checkout", &params.repo_path, &args).await?;
    Ok(ToolCallResult::text(or_default(
        out,
        format!("switched to branch '{}'", params.reference),
    )))
}
