//! Schema contracts at the agent boundary.
//!
//! Inputs only need to serialize; outputs carry a `schemars`-derived JSON
//! schema that is both injected into the system message as an instruction and
//! used to repair the model's raw JSON before deserialization. Optionality is
//! decided structurally from the generated schema's `required` set, never by
//! reflecting over the Rust types.

use schemars::{schema_for, JsonSchema};
use serde::de::DeserializeOwned;
use serde::Serialize;
use serde_json::Value;

use crate::errors::AgentError;

/// Raw page markup and location carried by an input envelope. Kept out of the
/// serialized envelope and sent to the model as a separate plain-text message
/// so the schema-conforming JSON payload is never polluted with markup.
#[derive(Debug, Clone, PartialEq)]
pub struct PageContext {
    pub url: Option<String>,
    pub dom: Option<String>,
}

impl PageContext {
    pub fn from_parts(url: Option<String>, dom: Option<String>) -> Option<Self> {
        if url.is_none() && dom.is_none() {
            None
        } else {
            Some(PageContext { url, dom })
        }
    }

    /// Render the page state the way it is presented to the model.
    pub fn render(&self) -> String {
        format!(
            "Current page URL:\n{}\n\nCurrent page DOM:\n{}",
            self.url.as_deref().unwrap_or(""),
            self.dom.as_deref().unwrap_or("")
        )
    }
}

/// A structured value a caller hands to an agent.
pub trait InputEnvelope: Serialize + Send + Sync {
    /// The caller's stated goal, used by vision enrichment.
    fn objective(&self) -> Option<&str> {
        None
    }

    /// Page state to send as a separate message, if the envelope carries any.
    fn page_context(&self) -> Option<PageContext> {
        None
    }
}

/// A structured value an agent returns to its caller. Fields typed `Option<T>`
/// are optional (absent sentinel = `None`); everything else is required.
pub trait OutputEnvelope: DeserializeOwned + JsonSchema {}

impl<T: DeserializeOwned + JsonSchema> OutputEnvelope for T {}

/// The output-schema directive appended to the system message for each call.
/// Byte-identical for a given type within and across calls.
pub fn schema_instruction<T: JsonSchema>() -> String {
    let schema = schema_for!(T);
    let schema_text =
        serde_json::to_string(&schema).expect("a generated json schema always serializes");
    format!(
        "\n\nYou must respond with valid JSON that matches this exact schema: {schema_text}\n\n\
         Important: Optional fields can either be omitted from your response or set to null. \
         Required fields must always be included."
    )
}

/// Parse the model's raw text, default omitted optional fields to null, and
/// deserialize into the declared output type.
///
/// Failure modes are the caller-visible contract: unparseable text raises
/// [`AgentError::MalformedResponse`]; a parseable value that omits required
/// fields or has the wrong shape raises [`AgentError::SchemaViolation`] naming
/// the offending fields. Neither is retried here.
pub fn repair_and_validate<T: OutputEnvelope>(raw: &str) -> Result<T, AgentError> {
    let mut value: Value =
        serde_json::from_str(raw).map_err(|error| AgentError::MalformedResponse {
            detail: error.to_string(),
            raw: raw.to_string(),
        })?;

    let object = match value.as_object_mut() {
        Some(object) => object,
        None => {
            return Err(AgentError::SchemaViolation {
                missing: Vec::new(),
                detail: "response is not a JSON object".to_string(),
                raw: raw.to_string(),
            })
        }
    };

    let schema = schema_for!(T);
    let mut missing = Vec::new();
    if let Some(validation) = &schema.schema.object {
        for name in validation.properties.keys() {
            if object.contains_key(name) {
                continue;
            }
            if validation.required.contains(name) {
                missing.push(name.clone());
            } else {
                object.insert(name.clone(), Value::Null);
            }
        }
    }

    if !missing.is_empty() {
        return Err(AgentError::SchemaViolation {
            missing,
            detail: "required fields omitted by the model".to_string(),
            raw: raw.to_string(),
        });
    }

    serde_json::from_value(value).map_err(|error| AgentError::SchemaViolation {
        missing: Vec::new(),
        detail: error.to_string(),
        raw: raw.to_string(),
    })
}
