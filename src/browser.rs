//! The browser-automation boundary.
//!
//! The crate never drives a browser itself: all page interaction goes through
//! [`BrowserDriver`], implemented elsewhere over a real automation backend.
//! The backend is one shared mutable page/session, so drivers are handed
//! around as `Arc<dyn BrowserDriver>` and callers serialize access to it.
//! [`browser_toolkit`] wraps a driver into the standard tool registry exposed
//! to models.

use std::sync::Arc;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use serde_json::{json, Value};

use crate::errors::{ToolError, ToolResult};
use crate::models::content::ImageContent;
use crate::models::tool::Tool;
use crate::tools::ToolRegistry;

/// How much of the page to include in a DOM snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomContentKind {
    AllFields,
    InputFields,
    TextOnly,
}

/// Asynchronous interface to the page-automation backend.
#[async_trait]
pub trait BrowserDriver: Send + Sync {
    /// Navigate to a URL, waiting `timeout_secs` after load. Returns the page
    /// title.
    async fn open_url(&self, url: &str, timeout_secs: u64) -> ToolResult<String>;

    /// Click the element matching a CSS selector.
    async fn click(&self, selector: &str) -> ToolResult<()>;

    /// Type text into the input matching a CSS selector.
    async fn enter_text(&self, selector: &str, text: &str) -> ToolResult<()>;

    /// Enter text into one element, then click another, as one step.
    async fn enter_text_and_click(
        &self,
        text_selector: &str,
        text: &str,
        click_selector: &str,
    ) -> ToolResult<()>;

    /// Press a key or key combination, e.g. "Enter" or "Control+A".
    async fn press_key(&self, key_combination: &str) -> ToolResult<()>;

    async fn current_url(&self) -> ToolResult<String>;

    /// Snapshot of the page DOM at the requested detail level.
    async fn page_dom(&self, kind: DomContentKind) -> ToolResult<String>;

    /// Screenshot of the current viewport.
    async fn screenshot(&self) -> ToolResult<ImageContent>;

    /// Upload a local file through the file input matching a selector.
    async fn upload_file(&self, selector: &str, file_path: &str) -> ToolResult<()>;

    /// Wait until the page finishes loading, up to `timeout_secs`.
    async fn wait_for_page_load(&self, timeout_secs: u64) -> ToolResult<()>;
}

fn required_str(arguments: &Value, key: &str) -> ToolResult<String> {
    arguments
        .get(key)
        .and_then(Value::as_str)
        .map(String::from)
        .ok_or_else(|| ToolError::InvalidParameters(format!("'{key}' must be a string")))
}

fn selector_schema(description: &str) -> Value {
    json!({"type": "string", "description": description})
}

/// The standard browser tool surface handed to agents, built over a shared
/// driver.
pub fn browser_toolkit(driver: Arc<dyn BrowserDriver>) -> ToolRegistry {
    let mut registry = ToolRegistry::new();

    let d = driver.clone();
    registry.register(
        Tool::new(
            "open_url",
            "Opens a specified URL in the web browser instance and waits for it to load. \
             Returns a confirmation with the title of the new page if successful, or an \
             appropriate error message if the page could not be opened.",
            json!({
                "type": "object",
                "properties": {
                    "url": {
                        "type": "string",
                        "description": "The full URL to navigate to, including the protocol (http:// or https://)."
                    },
                    "timeout": {
                        "type": "integer",
                        "description": "Optional wait time in seconds after the page loads.",
                        "default": 5
                    }
                },
                "required": ["url"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let url = required_str(&arguments, "url")?;
                if url::Url::parse(&url).is_err() {
                    return Err(ToolError::InvalidParameters(format!(
                        "'{url}' is not a valid absolute URL"
                    )));
                }
                let timeout = arguments
                    .get("timeout")
                    .and_then(Value::as_u64)
                    .unwrap_or(5);
                let title = driver.open_url(&url, timeout).await?;
                Ok(format!("Successfully navigated to page: {title}"))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "get_dom_content",
            "Retrieves the DOM of the current page. Specify 'all_fields' for a detailed \
             DOM tree, 'input_fields' for form elements, or 'text_only' for page text. \
             Elements carry an 'mmid' attribute used to address them in other tools.",
            json!({
                "type": "object",
                "properties": {
                    "content_type": {
                        "type": "string",
                        "enum": ["all_fields", "input_fields", "text_only"],
                        "default": "all_fields"
                    }
                },
                "required": []
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let kind = match arguments.get("content_type").and_then(Value::as_str) {
                    None => DomContentKind::AllFields,
                    Some(raw) => serde_json::from_value(json!(raw)).map_err(|_| {
                        ToolError::InvalidParameters(format!(
                            "unknown content_type '{raw}', expected all_fields, input_fields or text_only"
                        ))
                    })?,
                };
                driver.page_dom(kind).await
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "click",
            "Performs a click on the element identified by its CSS selector, e.g. \
             '[mmid=\"123\"]'. Use the 'mmid' attribute from the DOM content.",
            json!({
                "type": "object",
                "properties": {
                    "selector": selector_schema("The CSS selector of the element to click.")
                },
                "required": ["selector"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let selector = required_str(&arguments, "selector")?;
                driver.click(&selector).await?;
                Ok(format!(
                    "Successfully clicked element with selector: {selector}"
                ))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "enter_text",
            "Enters text into the input field identified by its CSS selector, using the \
             'mmid' attribute from the DOM content.",
            json!({
                "type": "object",
                "properties": {
                    "selector": selector_schema("The CSS selector for the input field."),
                    "text_to_enter": {
                        "type": "string",
                        "description": "The text to type into the input field."
                    }
                },
                "required": ["selector", "text_to_enter"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let selector = required_str(&arguments, "selector")?;
                let text = required_str(&arguments, "text_to_enter")?;
                driver.enter_text(&selector, &text).await?;
                Ok(format!(
                    "Successfully entered text '{text}' into element: {selector}"
                ))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "enter_text_and_click",
            "Enters text into one element and then clicks another element, as a single \
             step. Useful for search boxes and login forms.",
            json!({
                "type": "object",
                "properties": {
                    "text_selector": selector_schema("The CSS selector for the text input field."),
                    "text_to_enter": {"type": "string", "description": "The text to enter."},
                    "click_selector": selector_schema("The CSS selector for the element to click after text entry.")
                },
                "required": ["text_selector", "text_to_enter", "click_selector"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let text_selector = required_str(&arguments, "text_selector")?;
                let text = required_str(&arguments, "text_to_enter")?;
                let click_selector = required_str(&arguments, "click_selector")?;
                driver
                    .enter_text_and_click(&text_selector, &text, &click_selector)
                    .await?;
                Ok(format!(
                    "Successfully entered text '{text}' and clicked element"
                ))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "get_current_url",
            "Returns the URL of the current page.",
            json!({"type": "object", "properties": {}, "required": []}),
        ),
        move |_arguments| {
            let driver = d.clone();
            async move { driver.current_url().await }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "get_screenshot",
            "Captures a screenshot of the current viewport.",
            json!({"type": "object", "properties": {}, "required": []}),
        ),
        move |_arguments| {
            let driver = d.clone();
            async move {
                let image = driver.screenshot().await?;
                Ok(format!(
                    "Screenshot captured successfully (length: {} characters)",
                    image.data.len()
                ))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "press_key",
            "Presses a key or key combination on the current page, e.g. 'Enter', \
             'PageDown', 'Control+A'.",
            json!({
                "type": "object",
                "properties": {
                    "key_combination": {
                        "type": "string",
                        "description": "The key or key combination to press."
                    }
                },
                "required": ["key_combination"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let combination = required_str(&arguments, "key_combination")?;
                driver.press_key(&combination).await?;
                Ok(format!(
                    "Successfully pressed key combination: {combination}"
                ))
            }
        },
    );

    let d = driver.clone();
    registry.register(
        Tool::new(
            "upload_file",
            "Uploads a local file to the webpage through a file input element.",
            json!({
                "type": "object",
                "properties": {
                    "selector": selector_schema("The CSS selector for the file input element."),
                    "file_path": {
                        "type": "string",
                        "description": "The local path to the file to be uploaded."
                    }
                },
                "required": ["selector", "file_path"]
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let selector = required_str(&arguments, "selector")?;
                let file_path = required_str(&arguments, "file_path")?;
                driver.upload_file(&selector, &file_path).await?;
                Ok(format!("File upload attempted for: {file_path}"))
            }
        },
    );

    let d = driver;
    registry.register(
        Tool::new(
            "wait_for_page_load",
            "Waits for the page to finish loading.",
            json!({
                "type": "object",
                "properties": {
                    "timeout": {
                        "type": "integer",
                        "description": "Maximum time to wait in seconds.",
                        "default": 10
                    }
                },
                "required": []
            }),
        ),
        move |arguments| {
            let driver = d.clone();
            async move {
                let timeout = arguments
                    .get("timeout")
                    .and_then(Value::as_u64)
                    .unwrap_or(10);
                driver.wait_for_page_load(timeout).await?;
                Ok("Page has finished loading".to_string())
            }
        },
    );

    registry
}
