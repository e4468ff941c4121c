use async_trait::async_trait;
use serde::{Deserialize, Serialize};

use crate::errors::AgentResult;
use crate::models::message::Message;
use crate::models::tool::Tool;

/// Output-format hint sent with a completion request.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ResponseFormat {
    Text,
    /// Ask the endpoint for a machine-parseable JSON object.
    JsonObject,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Usage {
    pub input_tokens: Option<i32>,
    pub output_tokens: Option<i32>,
    pub total_tokens: Option<i32>,
}

impl Usage {
    pub fn new(
        input_tokens: Option<i32>,
        output_tokens: Option<i32>,
        total_tokens: Option<i32>,
    ) -> Self {
        Self {
            input_tokens,
            output_tokens,
            total_tokens,
        }
    }
}

/// The abstract channel to a language model.
///
/// Request = model identifier, ordered message list (system message first when
/// present), declared tools, and an output-format hint. Response = the next
/// assistant message plus token accounting. Implementations are shared
/// read-only across agents.
#[async_trait]
pub trait Provider: Send + Sync {
    async fn complete(
        &self,
        model: &str,
        messages: &[Message],
        tools: &[Tool],
        format: ResponseFormat,
    ) -> AgentResult<(Message, Usage)>;
}
