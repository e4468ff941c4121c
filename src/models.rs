//! The objects passed around by the agent core.
//!
//! Two families live here: the wire-facing conversation model (roles, message
//! content, tool calls) that providers translate to and from each LLM API, and
//! the domain envelopes (tasks, actions, planner/executor/vision inputs and
//! outputs) that callers exchange with agents. The internal structs are not an
//! exact match for any single LLM API; providers convert at the edge.
pub mod content;
pub mod envelopes;
pub mod message;
pub mod role;
pub mod tool;
