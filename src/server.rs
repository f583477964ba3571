//! Dispatch loop: reads requests off a transport, routes them and writes the
//! responses back.

use serde_json::{Value, json};
use std::sync::Arc;
use tracing::{debug, info, warn};

use crate::protocol::{self, Message};
use crate::tools::{self, ToolContext, ToolError};
use crate::transport::{Transport, TransportError};

pub const SERVER_NAME: &str = "gitbridge";
pub const PROTOCOL_VERSION: &str = "2024-11-05";

pub struct Server {
    tools: Arc<ToolContext>,
}

impl Server {
    pub fn new(tools: ToolContext) -> Self {
        Self {
            tools: Arc::new(tools),
        }
    }

    /// Serve `transport` until the client goes away
    ///
    /// Each request is handled on its own task so a slow git command does
    /// not hold up the rest.
    pub async fn run<T: Transport + ?Sized + 'static>(&self, transport: Arc<T>) -> Result<(), TransportError> {
        info!("dispatch loop started");

        while let Some(msg) = transport.recv().await? {
            let tools = Arc::clone(&self.tools);
            let transport = Arc::clone(&transport);

            tokio::spawn(async move {
                let Some(response) = handle_message(&tools, msg).await else {
                    return;
                };
                if let Err(err) = transport.send(&response).await {
                    warn!(error = %err, "failed to send response");
                }
            });
        }

        info!("client stream ended");
        Ok(())
    }
}

/// Produce the response owed for `msg`, if any
pub async fn handle_message(tools: &ToolContext, msg: Message) -> Option<Message> {
    let Some(method) = msg.method.as_deref() else {
        debug!("ignoring message without method");
        return None;
    };

    if msg.is_notification() {
        debug!(method, "notification");
        return None;
    }

    let id = msg.id.clone();
    let params = msg.params.clone().unwrap_or(Value::Null);

    let response = match method {
        "initialize" => Message::response(id, initialize_result()),
        "ping" => Message::response(id, json!({})),
        "tools/list" => Message::response(id, json!({ "tools": tools::descriptors() })),
        "tools/call" => call_tool(tools, id, params).await,
        other => Message::error_response(
            id,
            protocol::METHOD_NOT_FOUND,
            format!("method not found: {}", other),
        ),
    };

    Some(response)
}

fn initialize_result() -> Value {
    json!({
        "protocolVersion": PROTOCOL_VERSION,
        "serverInfo": {
            "name": SERVER_NAME,
            "version": env!("CARGO_PKG_VERSION"),
        },
        "capabilities": {
            "tools": {}
        }
    })
}

async fn call_tool(tools: &ToolContext, id: Option<Value>, params: Value) -> Message {
    let Some(name) = params.get("name").and_then(Value::as_str) else {
        return Message::error_response(id, protocol::INVALID_PARAMS, "missing tool name");
    };
    let arguments = params.get("arguments").cloned().unwrap_or(Value::Null);

    match tools::call(tools, name, arguments).await {
        Ok(result) => match serde_json::to_value(&result) {
            Ok(value) => Message::response(id, value),
            Err(err) => Message::error_response(id, protocol::INTERNAL_ERROR, err.to_string()),
        },
        Err(err @ (ToolError::UnknownTool(_) | ToolError::InvalidArguments(_))) => {
            Message::error_response(id, protocol::INVALID_PARAMS, err.to_string())
        }
        Err(err) => Message::error_response(id, protocol::INTERNAL_ERROR, err.to_string()),
    }
}
