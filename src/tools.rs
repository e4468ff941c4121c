use std::collections::HashMap;
use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use futures::future::BoxFuture;
use futures::FutureExt;
use serde_json::Value;
use tracing::{debug, error};

use crate::errors::{ToolError, ToolResult};
use crate::models::message::{Message, ToolRequest};
use crate::models::tool::{Tool, ToolCall};

/// Feedback appended to the conversation when a tool call fails, so the model
/// can self-correct on its next turn instead of the session aborting.
pub const TOOL_RETRY_FEEDBACK: &str = "The tool responded with an error, please try again with a \
                                       different tool or modify the parameters of the tool";

type ToolHandler = Arc<dyn Fn(Value) -> BoxFuture<'static, ToolResult<String>> + Send + Sync>;

/// Maps tool names to their declared schema and executable handler. Built once
/// at agent construction; immutable afterwards and cheap to share.
#[derive(Clone, Default)]
pub struct ToolRegistry {
    tools: Vec<Tool>,
    handlers: HashMap<String, ToolHandler>,
}

impl ToolRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a tool with its async handler. The handler receives the
    /// model-supplied arguments as a JSON object.
    pub fn register<F, Fut>(&mut self, tool: Tool, handler: F)
    where
        F: Fn(Value) -> Fut + Send + Sync + 'static,
        Fut: Future<Output = ToolResult<String>> + Send + 'static,
    {
        let name = tool.name.clone();
        self.tools.push(tool);
        self.handlers
            .insert(name, Arc::new(move |arguments| handler(arguments).boxed()));
    }

    pub fn tools(&self) -> &[Tool] {
        &self.tools
    }

    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }

    /// Execute one model-requested tool call and render the outcome as a tool
    /// message tagged with the originating call id.
    ///
    /// Handler errors (including unknown tool names and timeouts) are captured
    /// into a failure-outcome message; nothing escapes to the caller.
    pub async fn dispatch(&self, request: &ToolRequest, timeout: Option<Duration>) -> Message {
        let (name, result) = match &request.tool_call {
            Ok(call) => (call.name.clone(), self.invoke(call, timeout).await),
            Err(e) => ("unknown".to_string(), Err(e.clone())),
        };

        match &result {
            Ok(output) => debug!(tool = %name, id = %request.id, "tool call succeeded: {output}"),
            Err(e) => error!(tool = %name, id = %request.id, "tool call failed: {e}"),
        }

        Message::tool().with_tool_response(request.id.clone(), name, result)
    }

    async fn invoke(&self, call: &ToolCall, timeout: Option<Duration>) -> ToolResult<String> {
        let handler = self
            .handlers
            .get(&call.name)
            .ok_or_else(|| ToolError::ToolNotFound(call.name.clone()))?;
        let invocation = handler(call.arguments.clone());
        match timeout {
            Some(limit) => tokio::time::timeout(limit, invocation)
                .await
                .map_err(|_| {
                    ToolError::ExecutionError(format!(
                        "tool '{}' did not finish within {limit:?}",
                        call.name
                    ))
                })?,
            None => invocation.await,
        }
    }
}
