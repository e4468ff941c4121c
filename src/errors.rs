use serde::{Deserialize, Serialize};
use thiserror::Error;

/// Fatal errors surfaced to the caller of an agent invocation.
///
/// The split between this type and [`ToolError`] is a deliberate policy:
/// failures local to one tool call or one vision enrichment are absorbed and
/// converted into model-visible feedback or safe defaults, while failures to
/// parse or validate the terminal structured output abort the call and reach
/// the caller here, carrying enough raw material for an external retry policy.
#[non_exhaustive]
#[derive(Error, Debug, Clone, Serialize, Deserialize)]
pub enum AgentError {
    #[error("Configuration error: {0}")]
    Configuration(String),

    #[error("Model transport error: {0}")]
    Transport(String),

    #[error("Model response is not valid JSON: {detail}")]
    MalformedResponse { detail: String, raw: String },

    #[error("Model response violates the output schema, missing fields: {missing:?}")]
    SchemaViolation {
        missing: Vec<String>,
        detail: String,
        raw: String,
    },

    #[error("Tool-calling loop exceeded the configured limit of {limit} turns")]
    TurnLimitExceeded { limit: usize },

    #[error("Vision analysis failed: {0}")]
    Vision(String),
}

pub type AgentResult<T> = Result<T, AgentError>;

/// Errors raised while resolving or executing a single tool call.
///
/// These never escape the dispatcher: they are rendered into a failure-outcome
/// tool message so the model can self-correct on its next turn.
#[derive(Error, Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum ToolError {
    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid parameters: {0}")]
    InvalidParameters(String),

    #[error("Tool execution failed: {0}")]
    ExecutionError(String),

    #[error("Internal error: {0}")]
    Internal(String),
}

pub type ToolResult<T> = Result<T, ToolError>;
