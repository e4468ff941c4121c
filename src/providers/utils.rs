use lazy_static::lazy_static;
use regex::Regex;
use serde_json::{json, Value};

use crate::errors::{AgentError, AgentResult, ToolError};
use crate::models::content::ImageContent;
use crate::models::message::{Message, MessageContent};
use crate::models::role::Role;
use crate::models::tool::{Tool, ToolCall};
use crate::tools::TOOL_RETRY_FEEDBACK;

lazy_static! {
    static ref INVALID_NAME_CHARS: Regex = Regex::new(r"[^a-zA-Z0-9_-]").unwrap();
    static ref VALID_NAME: Regex = Regex::new(r"^[a-zA-Z0-9_-]+$").unwrap();
}

/// Convert the internal message list to the OpenAI chat message specification.
/// The system message (when present) converts in place, so the exported
/// conversation order is preserved verbatim on the wire.
pub fn messages_to_openai_spec(messages: &[Message]) -> Vec<Value> {
    let mut messages_spec = Vec::new();

    for message in messages {
        match message.role {
            Role::System => {
                messages_spec.push(json!({
                    "role": "system",
                    "content": message.text(),
                }));
            }
            Role::User => {
                messages_spec.push(user_to_openai_spec(message));
            }
            Role::Assistant => {
                messages_spec.extend(assistant_to_openai_spec(message));
            }
            Role::Tool => {
                for content in &message.content {
                    if let MessageContent::ToolResponse(response) = content {
                        let text = match &response.result {
                            Ok(output) => output.clone(),
                            Err(e) => format!("{TOOL_RETRY_FEEDBACK}\nError: {e}"),
                        };
                        messages_spec.push(json!({
                            "role": "tool",
                            "tool_call_id": response.id,
                            "name": response.name,
                            "content": text,
                        }));
                    }
                }
            }
        }
    }

    messages_spec
}

/// A user message with only text collapses to a plain string; one carrying an
/// image becomes a multi-part content array.
fn user_to_openai_spec(message: &Message) -> Value {
    let has_image = message
        .content
        .iter()
        .any(|content| matches!(content, MessageContent::Image(_)));

    if !has_image {
        return json!({
            "role": "user",
            "content": message.text(),
        });
    }

    let mut parts = Vec::new();
    for content in &message.content {
        match content {
            MessageContent::Text(text) => {
                parts.push(json!({"type": "text", "text": text.text}));
            }
            MessageContent::Image(image) => {
                parts.push(convert_image(image));
            }
            _ => {}
        }
    }
    json!({
        "role": "user",
        "content": parts,
    })
}

fn assistant_to_openai_spec(message: &Message) -> Vec<Value> {
    let mut converted = json!({"role": "assistant"});
    let mut output = Vec::new();

    for content in &message.content {
        match content {
            MessageContent::Text(text) => {
                if !text.text.is_empty() {
                    converted["content"] = json!(text.text);
                }
            }
            MessageContent::ToolRequest(request) => match &request.tool_call {
                Ok(tool_call) => {
                    let sanitized_name = sanitize_function_name(&tool_call.name);
                    let tool_calls = converted
                        .as_object_mut()
                        .unwrap()
                        .entry("tool_calls")
                        .or_insert(json!([]));

                    tool_calls.as_array_mut().unwrap().push(json!({
                        "id": request.id,
                        "type": "function",
                        "function": {
                            "name": sanitized_name,
                            "arguments": tool_call.arguments.to_string(),
                        }
                    }));
                }
                Err(e) => {
                    output.push(json!({
                        "role": "tool",
                        "content": format!("Error: {}", e),
                        "tool_call_id": request.id,
                    }));
                }
            },
            _ => {}
        }
    }

    if converted.get("content").is_some() || converted.get("tool_calls").is_some() {
        output.insert(0, converted);
    }
    output
}

/// Render an image content as an OpenAI data-URL image part.
pub fn convert_image(image: &ImageContent) -> Value {
    json!({
        "type": "image_url",
        "image_url": {
            "url": format!("data:{};base64,{}", image.mime_type, image.data)
        }
    })
}

/// Convert internal Tool format to the OpenAI tool specification.
pub fn tools_to_openai_spec(tools: &[Tool]) -> AgentResult<Vec<Value>> {
    let mut tool_names = std::collections::HashSet::new();
    let mut result = Vec::new();

    for tool in tools {
        if !tool_names.insert(&tool.name) {
            return Err(AgentError::Configuration(format!(
                "Duplicate tool name: {}",
                tool.name
            )));
        }

        result.push(json!({
            "type": "function",
            "function": {
                "name": tool.name,
                "description": tool.description,
                "parameters": tool.input_schema,
            }
        }));
    }

    Ok(result)
}

/// Convert an OpenAI chat-completions response body to the internal Message
/// format. Tool calls with invalid names or unparseable arguments become
/// error-carrying requests rather than failing the whole response.
pub fn openai_response_to_message(response: &Value) -> AgentResult<Message> {
    let original = &response["choices"][0]["message"];
    let mut message = Message::assistant();

    if let Some(text) = original.get("content").and_then(Value::as_str) {
        message = message.with_text(text);
    }

    if let Some(tool_calls) = original.get("tool_calls").and_then(Value::as_array) {
        for tool_call in tool_calls {
            let id = tool_call["id"].as_str().unwrap_or_default().to_string();
            let function_name = tool_call["function"]["name"]
                .as_str()
                .unwrap_or_default()
                .to_string();
            let arguments = tool_call["function"]["arguments"]
                .as_str()
                .unwrap_or_default()
                .to_string();

            if !is_valid_function_name(&function_name) {
                let error = ToolError::ToolNotFound(format!(
                    "The provided function name '{}' had invalid characters, it must match this regex [a-zA-Z0-9_-]+",
                    function_name
                ));
                message = message.with_tool_request(id, Err(error));
            } else {
                match serde_json::from_str::<Value>(&arguments) {
                    Ok(params) => {
                        message = message
                            .with_tool_request(id, Ok(ToolCall::new(&function_name, params)));
                    }
                    Err(e) => {
                        let error = ToolError::InvalidParameters(format!(
                            "Could not interpret tool use parameters for id {}: {}",
                            id, e
                        ));
                        message = message.with_tool_request(id, Err(error));
                    }
                }
            }
        }
    }

    Ok(message)
}

fn sanitize_function_name(name: &str) -> String {
    INVALID_NAME_CHARS.replace_all(name, "_").to_string()
}

fn is_valid_function_name(name: &str) -> bool {
    VALID_NAME.is_match(name)
}

#[cfg(test)]
mod tests {
    use super::*;
    use indoc::indoc;

    const TOOL_USE_RESPONSE: &str = indoc! {r#"{
        "choices": [{
            "message": {
                "tool_calls": [{
                    "id": "1",
                    "function": {
                        "name": "example_fn",
                        "arguments": "{\"param\": \"value\"}"
                    }
                }]
            }
        }]
    }"#};

    #[test]
    fn test_messages_to_openai_spec_text() {
        let message = Message::user().with_text("Hello");
        let spec = messages_to_openai_spec(&[message]);

        assert_eq!(spec.len(), 1);
        assert_eq!(spec[0]["role"], "user");
        assert_eq!(spec[0]["content"], "Hello");
    }

    #[test]
    fn test_messages_to_openai_spec_system_first() {
        let messages = vec![
            Message::system().with_text("be useful"),
            Message::user().with_text("hi"),
        ];
        let spec = messages_to_openai_spec(&messages);
        assert_eq!(spec[0]["role"], "system");
        assert_eq!(spec[0]["content"], "be useful");
    }

    #[test]
    fn test_user_message_with_image_becomes_multipart() {
        let message = Message::user()
            .with_text("what does this show?")
            .with_image("aGVsbG8=", "image/png");
        let spec = messages_to_openai_spec(&[message]);

        let parts = spec[0]["content"].as_array().unwrap();
        assert_eq!(parts.len(), 2);
        assert_eq!(parts[0]["type"], "text");
        assert_eq!(parts[1]["type"], "image_url");
        assert_eq!(
            parts[1]["image_url"]["url"],
            "data:image/png;base64,aGVsbG8="
        );
    }

    #[test]
    fn test_full_tool_round_trip_spec() {
        let messages = vec![
            Message::assistant().with_tool_request(
                "tool1",
                Ok(ToolCall::new("example", json!({"param1": "value1"}))),
            ),
            Message::tool().with_tool_response("tool1", "example", Ok("Result".to_string())),
        ];
        let spec = messages_to_openai_spec(&messages);

        assert_eq!(spec.len(), 2);
        assert_eq!(spec[0]["role"], "assistant");
        assert!(spec[0]["tool_calls"].is_array());
        assert_eq!(spec[1]["role"], "tool");
        assert_eq!(spec[1]["content"], "Result");
        assert_eq!(spec[1]["tool_call_id"], spec[0]["tool_calls"][0]["id"]);
    }

    #[test]
    fn test_failed_tool_response_renders_retry_feedback() {
        let message = Message::tool().with_tool_response(
            "tool1",
            "example",
            Err(ToolError::ExecutionError("boom".to_string())),
        );
        let spec = messages_to_openai_spec(&[message]);
        let content = spec[0]["content"].as_str().unwrap();
        assert!(content.starts_with(TOOL_RETRY_FEEDBACK));
        assert!(content.contains("boom"));
    }

    #[test]
    fn test_tools_to_openai_spec_duplicate_rejected() {
        let schema = json!({"type": "object", "properties": {}});
        let tools = [
            Tool::new("t", "first", schema.clone()),
            Tool::new("t", "second", schema),
        ];
        let result = tools_to_openai_spec(&tools);
        assert!(matches!(result, Err(AgentError::Configuration(_))));
    }

    #[test]
    fn test_response_to_message_text() {
        let response = json!({
            "choices": [{
                "message": {"content": "All done."}
            }]
        });
        let message = openai_response_to_message(&response).unwrap();
        assert_eq!(message.role, Role::Assistant);
        assert_eq!(message.text(), "All done.");
    }

    #[test]
    fn test_response_to_message_valid_tool_request() {
        let response: Value = serde_json::from_str(TOOL_USE_RESPONSE).unwrap();
        let message = openai_response_to_message(&response).unwrap();

        let requests = message.tool_requests();
        assert_eq!(requests.len(), 1);
        let tool_call = requests[0].tool_call.as_ref().unwrap();
        assert_eq!(tool_call.name, "example_fn");
        assert_eq!(tool_call.arguments, json!({"param": "value"}));
    }

    #[test]
    fn test_response_to_message_invalid_function_name() {
        let mut response: Value = serde_json::from_str(TOOL_USE_RESPONSE).unwrap();
        response["choices"][0]["message"]["tool_calls"][0]["function"]["name"] =
            json!("invalid fn");

        let message = openai_response_to_message(&response).unwrap();
        match &message.tool_requests()[0].tool_call {
            Err(ToolError::ToolNotFound(msg)) => {
                assert!(msg.starts_with("The provided function name"));
            }
            other => panic!("expected ToolNotFound, got {other:?}"),
        }
    }

    #[test]
    fn test_response_to_message_unparseable_arguments() {
        let mut response: Value = serde_json::from_str(TOOL_USE_RESPONSE).unwrap();
        response["choices"][0]["message"]["tool_calls"][0]["function"]["arguments"] =
            json!("invalid json {");

        let message = openai_response_to_message(&response).unwrap();
        match &message.tool_requests()[0].tool_call {
            Err(ToolError::InvalidParameters(msg)) => {
                assert!(msg.starts_with("Could not interpret tool use parameters"));
            }
            other => panic!("expected InvalidParameters, got {other:?}"),
        }
    }

    #[test]
    fn test_sanitize_function_name() {
        assert_eq!(sanitize_function_name("hello-world"), "hello-world");
        assert_eq!(sanitize_function_name("hello world"), "hello_world");
        assert_eq!(sanitize_function_name("hello@world"), "hello_world");
    }
}
