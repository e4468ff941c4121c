use chrono::Utc;

use super::content::{ImageContent, TextContent};
use super::role::Role;
use super::tool::ToolCall;
use crate::errors::ToolResult;

/// A tool call the model asked for, as parsed off the wire. The call itself
/// may already be an error (invalid name, unparseable arguments).
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolRequest {
    pub id: String,
    pub tool_call: ToolResult<ToolCall>,
}

/// The outcome of dispatching one tool call, tagged with the originating call
/// id so the model can correlate it.
#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
pub struct ToolResponse {
    pub id: String,
    pub name: String,
    pub result: ToolResult<String>,
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// Content passed inside a message, which can be both simple content and tool content
pub enum MessageContent {
    Text(TextContent),
    Image(ImageContent),
    ToolRequest(ToolRequest),
    ToolResponse(ToolResponse),
}

impl MessageContent {
    pub fn text<S: Into<String>>(text: S) -> Self {
        MessageContent::Text(TextContent { text: text.into() })
    }

    pub fn image<S: Into<String>, T: Into<String>>(data: S, mime_type: T) -> Self {
        MessageContent::Image(ImageContent {
            data: data.into(),
            mime_type: mime_type.into(),
        })
    }

    pub fn tool_request<S: Into<String>>(id: S, tool_call: ToolResult<ToolCall>) -> Self {
        MessageContent::ToolRequest(ToolRequest {
            id: id.into(),
            tool_call,
        })
    }

    pub fn tool_response<S: Into<String>, N: Into<String>>(
        id: S,
        name: N,
        result: ToolResult<String>,
    ) -> Self {
        MessageContent::ToolResponse(ToolResponse {
            id: id.into(),
            name: name.into(),
            result,
        })
    }

    pub fn as_text(&self) -> Option<&str> {
        match self {
            MessageContent::Text(text) => Some(&text.text),
            _ => None,
        }
    }

    pub fn as_tool_request(&self) -> Option<&ToolRequest> {
        if let MessageContent::ToolRequest(ref tool_request) = self {
            Some(tool_request)
        } else {
            None
        }
    }

    pub fn as_tool_response(&self) -> Option<&ToolResponse> {
        if let MessageContent::ToolResponse(ref tool_response) = self {
            Some(tool_response)
        } else {
            None
        }
    }
}

#[derive(Debug, Clone, PartialEq, serde::Serialize, serde::Deserialize)]
/// A message to or from an LLM
pub struct Message {
    pub role: Role,
    pub created: i64,
    pub content: Vec<MessageContent>,
}

impl Message {
    fn new(role: Role) -> Self {
        Message {
            role,
            created: Utc::now().timestamp(),
            content: Vec::new(),
        }
    }

    pub fn system() -> Self {
        Message::new(Role::System)
    }

    pub fn user() -> Self {
        Message::new(Role::User)
    }

    pub fn assistant() -> Self {
        Message::new(Role::Assistant)
    }

    pub fn tool() -> Self {
        Message::new(Role::Tool)
    }

    /// Add any MessageContent to the message
    pub fn with_content(mut self, content: MessageContent) -> Self {
        self.content.push(content);
        self
    }

    /// Add text content to the message
    pub fn with_text<S: Into<String>>(self, text: S) -> Self {
        self.with_content(MessageContent::text(text))
    }

    /// Add image content to the message
    pub fn with_image<S: Into<String>, T: Into<String>>(self, data: S, mime_type: T) -> Self {
        self.with_content(MessageContent::image(data, mime_type))
    }

    /// Add a tool request to the message
    pub fn with_tool_request<S: Into<String>>(
        self,
        id: S,
        tool_call: ToolResult<ToolCall>,
    ) -> Self {
        self.with_content(MessageContent::tool_request(id, tool_call))
    }

    /// Add a tool response to the message
    pub fn with_tool_response<S: Into<String>, N: Into<String>>(
        self,
        id: S,
        name: N,
        result: ToolResult<String>,
    ) -> Self {
        self.with_content(MessageContent::tool_response(id, name, result))
    }

    /// All text parts of the message joined together.
    pub fn text(&self) -> String {
        self.content
            .iter()
            .filter_map(|content| content.as_text())
            .collect::<Vec<_>>()
            .join("\n")
    }

    /// Extend the first text part in place, or add one if none exists. Used to
    /// augment an exported system message without touching stored history.
    pub fn append_text(&mut self, extra: &str) {
        for content in self.content.iter_mut() {
            if let MessageContent::Text(text) = content {
                text.text.push_str(extra);
                return;
            }
        }
        self.content.push(MessageContent::text(extra));
    }

    pub fn tool_requests(&self) -> Vec<&ToolRequest> {
        self.content
            .iter()
            .filter_map(|content| content.as_tool_request())
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_text_joins_parts() {
        let message = Message::assistant().with_text("one").with_text("two");
        assert_eq!(message.text(), "one\ntwo");
    }

    #[test]
    fn test_append_text_extends_first_part() {
        let mut message = Message::system().with_text("base");
        message.append_text(" extra");
        assert_eq!(message.text(), "base extra");
        assert_eq!(message.content.len(), 1);
    }

    #[test]
    fn test_append_text_on_empty_message() {
        let mut message = Message::system();
        message.append_text("only");
        assert_eq!(message.text(), "only");
    }

    #[test]
    fn test_tool_requests_filter() {
        let message = Message::assistant()
            .with_text("calling a tool")
            .with_tool_request("1", Ok(ToolCall::new("open_url", json!({"url": "x"}))));
        assert_eq!(message.tool_requests().len(), 1);
        assert_eq!(message.tool_requests()[0].id, "1");
    }
}
