//! Git operations exposed to the client as callable tools.
//!
//! Each tool decodes its JSON arguments, builds a git argument vector, runs
//! it and, where git's output has a structured shape, returns the parsed
//! record as JSON text.

mod branch;
mod history;
mod rebase;
mod remote;
mod staging;
mod status;

use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;
use std::path::Path;
use thiserror::Error;
use tracing::debug;

use crate::error::GitError;
use crate::git::GitRunner;

/// Errors raised while handling a tool call
#[derive(Debug, Error)]
pub enum ToolError {
    #[error("unknown tool: {0}")]
    UnknownTool(String),

    #[error("invalid arguments: {0}")]
    InvalidArguments(#[from] serde_json::Error),

    #[error("{command}: {source}")]
    Git {
        command: &'static str,
        #[source]
        source: GitError,
    },

    #[error("{0}")]
    Refused(String),
}

impl ToolError {
    /// Failures the client should see as a tool result rather than a
    /// protocol error
    pub fn is_tool_failure(&self) -> bool {
        matches!(self, ToolError::Git { .. } | ToolError::Refused(_))
    }
}

/// Name, description and input schema advertised by `tools/list`
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolDescriptor {
    pub name: &'static str,
    pub description: &'static str,
    pub input_schema: Value,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum ContentBlock {
    Text { text: String },
}

/// Payload of a `tools/call` response
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ToolCallResult {
    pub content: Vec<ContentBlock>,
    #[serde(skip_serializing_if = "std::ops::Not::not")]
    pub is_error: bool,
}

impl ToolCallResult {
    pub fn text(text: impl Into<String>) -> Self {
        Self {
            content: vec![ContentBlock::Text { text: text.into() }],
            is_error: false,
        }
    }

    pub fn error(text: impl Into<String>) -> Self {
        Self {
            is_error: true,
            ..Self::text(text)
        }
    }

    /// Serialize `value` as the text content
    pub fn json<T: Serialize>(value: &T) -> Result<Self, ToolError> {
        Ok(Self::text(serde_json::to_string(value)?))
    }

    /// Text of the first content block
    pub fn first_text(&self) -> &str {
        match self.content.first() {
            Some(ContentBlock::Text { text }) => text,
            None => "",
        }
    }
}

/// Everything a tool handler needs besides its arguments
#[derive(Debug, Clone)]
pub struct ToolContext {
    pub runner: GitRunner,
    /// Patch line cap for diff/show; zero or below disables it
    pub max_patch_lines: i64,
    /// `git log` count when the caller gives none
    pub default_log_count: usize,
}

impl ToolContext {
    pub fn new(runner: GitRunner) -> Self {
        Self {
            runner,
            max_patch_lines: 2000,
            default_log_count: 10,
        }
    }

    async fn git(
        &self,
        command: &'static str,
        dir: &Path,
        args: &[String],
    ) -> Result<String, ToolError> {
        self.runner
            .run(dir, args)
            .await
            .map_err(|source| ToolError::Git { command, source })
    }
}

/// All tools, in the order `tools/list` reports them
pub fn descriptors() -> Vec<ToolDescriptor> {
    let mut tools = Vec::new();
    tools.extend(status::descriptors());
    tools.extend(history::descriptors());
    tools.extend(staging::descriptors());
    tools.extend(branch::descriptors());
    tools.extend(remote::descriptors());
    tools.extend(rebase::descriptors());
    tools
}

/// Run the tool called `name`
///
/// Git failures come back as an error result; unknown tools and undecodable
/// arguments are returned as `Err`.
pub async fn call(ctx: &ToolContext, name: &str, args: Value) -> Result<ToolCallResult, ToolError> {
    debug!(tool = name, "tool call");

    let result = match name {
        "git_status" => status::git_status(ctx, args).await,
        "git_diff" => status::git_diff(ctx, args).await,
        "git_log" => history::git_log(ctx, args).await,
        "git_show" => history::git_show(ctx, args).await,
        "git_blame" => history::git_blame(ctx, args).await,
        "git_rev_parse" => history::git_rev_parse(ctx, args).await,
        "git_add" => staging::git_add(ctx, args).await,
        "git_reset" => staging::git_reset(ctx, args).await,
        "git_commit" => staging::git_commit(ctx, args).await,
        "git_branch_list" => branch::git_branch_list(ctx, args).await,
        "git_branch_create" => branch::git_branch_create(ctx, args).await,
        "git_checkout" => branch::git_checkout(ctx, args).await,
        "git_fetch" => remote::git_fetch(ctx, args).await,
        "git_pull" => remote::git_pull(ctx, args).await,
        "git_push" => remote::git_push(ctx, args).await,
        "git_remote_list" => remote::git_remote_list(ctx, args).await,
        "git_rebase" => rebase::git_rebase(ctx, args).await,
        _ => Err(ToolError::UnknownTool(name.to_string())),
    };

    match result {
        Err(err) if err.is_tool_failure() => Ok(ToolCallResult::error(err.to_string())),
        other => other,
    }
}

/// Branches that refuse force-push and rebase
const PROTECTED_BRANCHES: &[&str] = &["main", "master"];

/// Checked-out branch name, `HEAD` when detached
async fn current_branch(ctx: &ToolContext, repo: &Path) -> Option<String> {
    let args = ["rev-parse", "--abbrev-ref", "HEAD"].map(String::from);
    ctx.git("git rev-parse", repo, &args)
        .await
        .ok()
        .map(|out| out.trim().to_string())
}

fn parse_args<T: DeserializeOwned>(args: Value) -> Result<T, ToolError> {
    // A call without arguments decodes like an empty object
    let args = if args.is_null() { Value::Object(Default::default()) } else { args };
    Ok(serde_json::from_value(args)?)
}

/// `text`, or `fallback` when git printed nothing
fn or_default(text: String, fallback: impl Into<String>) -> String {
    if text.trim().is_empty() { fallback.into() } else { text }
}

/// Input schema with a required `repo_path` plus `extra` properties
fn schema(extra: Value, required: &[&str]) -> Value {
    let mut properties = serde_json::json!({
        "repo_path": {
            "type": "string",
            "description": "Path to the git repository"
        }
    });
    if let (Some(props), Value::Object(extra)) = (properties.as_object_mut(), extra) {
        props.extend(extra);
    }

    let mut required_fields = vec!["repo_path"];
    required_fields.extend_from_slice(required);

    serde_json::json!({
        "type": "object",
        "properties": properties,
        "required": required_fields,
    })
}
