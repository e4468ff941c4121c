use std::sync::Arc;

use anyhow::Result;
use async_trait::async_trait;
use serde_json::json;

use webpilot::agent::{Agent, AgentConfig};
use webpilot::browser::{browser_toolkit, BrowserDriver, DomContentKind};
use webpilot::errors::{AgentError, ToolError, ToolResult};
use webpilot::models::content::ImageContent;
use webpilot::models::envelopes::{Action, DecisionInput, DecisionOutput};
use webpilot::models::message::Message;
use webpilot::models::role::Role;
use webpilot::models::tool::ToolCall;
use webpilot::providers::mock::MockProvider;

struct ScriptedDriver;

#[async_trait]
impl BrowserDriver for ScriptedDriver {
    async fn open_url(&self, _url: &str, _timeout_secs: u64) -> ToolResult<String> {
        Ok("Example Domain".to_string())
    }
    async fn click(&self, _selector: &str) -> ToolResult<()> {
        Ok(())
    }
    async fn enter_text(&self, _selector: &str, _text: &str) -> ToolResult<()> {
        Ok(())
    }
    async fn enter_text_and_click(
        &self,
        _text_selector: &str,
        _text: &str,
        _click_selector: &str,
    ) -> ToolResult<()> {
        Ok(())
    }
    async fn press_key(&self, _key_combination: &str) -> ToolResult<()> {
        Ok(())
    }
    async fn current_url(&self) -> ToolResult<String> {
        Ok("https://example.com".to_string())
    }
    async fn page_dom(&self, _kind: DomContentKind) -> ToolResult<String> {
        Ok("<a mmid=\"1\">More information</a>".to_string())
    }
    async fn screenshot(&self) -> ToolResult<ImageContent> {
        Ok(ImageContent::new("aGVsbG8=", "image/png"))
    }
    async fn upload_file(&self, _selector: &str, _file_path: &str) -> ToolResult<()> {
        Ok(())
    }
    async fn wait_for_page_load(&self, _timeout_secs: u64) -> ToolResult<()> {
        Ok(())
    }
}

fn decision_agent(provider: Arc<MockProvider>) -> Agent<DecisionInput, DecisionOutput> {
    let config = AgentConfig::new("decision", "test-model");
    Agent::new(config, "You decide web actions.", provider)
        .with_tools(browser_toolkit(Arc::new(ScriptedDriver)))
}

fn objective(text: &str) -> DecisionInput {
    DecisionInput {
        objective: text.to_string(),
        ..Default::default()
    }
}

#[tokio::test]
async fn scenario_a_structured_plan_with_goto_action() -> Result<()> {
    let provider = Arc::new(MockProvider::new(vec![Message::assistant().with_text(
        r#"{
            "plan": [{"id": 1, "description": "open example.com", "url": null, "result": null}],
            "next_task": {"id": 1, "description": "open example.com", "url": null, "result": null},
            "next_task_actions": [{"type": "GOTO_URL", "website": "https://example.com"}],
            "is_complete": false,
            "final_response": null
        }"#,
    )]));
    let mut agent = decision_agent(provider);

    let output = agent.run(&objective("open example.com")).await?;

    assert!(!output.is_complete);
    let actions = output.next_task_actions.unwrap();
    assert_eq!(actions.len(), 1);
    assert_eq!(
        actions[0],
        Action::GotoUrl {
            website: "https://example.com".to_string()
        }
    );
    // omitted optional field repaired to its absent sentinel
    assert!(output.thought.is_none());
    Ok(())
}

#[tokio::test]
async fn scenario_b_missing_required_field_names_plan() {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant().with_text(r#"{"thought": "done"}"#)
    ]));
    let mut agent = decision_agent(provider);

    let error = agent.run(&objective("anything")).await.unwrap_err();
    match error {
        AgentError::SchemaViolation { missing, raw, .. } => {
            assert!(missing.contains(&"plan".to_string()));
            assert!(raw.contains("done"));
        }
        other => panic!("expected SchemaViolation, got {other:?}"),
    }
}

#[tokio::test]
async fn scenario_c_unknown_tool_call_recovers_conversationally() -> Result<()> {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant()
            .with_tool_request("call_9", Ok(ToolCall::new("nonexistent_tool", json!({})))),
        Message::assistant()
            .with_text(r#"{"plan": [], "is_complete": true, "final_response": "recovered"}"#),
    ]));
    let mut agent = decision_agent(provider);

    let output = agent.run(&objective("try the wrong tool")).await?;
    assert!(output.is_complete);
    assert_eq!(output.final_response.as_deref(), Some("recovered"));

    // exactly one failure-outcome tool message, tagged with the call id
    let tool_messages: Vec<_> = agent
        .conversation()
        .messages()
        .iter()
        .filter(|m| m.role == Role::Tool)
        .collect();
    assert_eq!(tool_messages.len(), 1);
    let response = tool_messages[0].content[0].as_tool_response().unwrap();
    assert_eq!(response.id, "call_9");
    assert!(matches!(response.result, Err(ToolError::ToolNotFound(_))));
    Ok(())
}

#[tokio::test]
async fn browser_tool_turn_feeds_result_back_to_model() -> Result<()> {
    let provider = Arc::new(MockProvider::new(vec![
        Message::assistant().with_tool_request(
            "call_1",
            Ok(ToolCall::new(
                "open_url",
                json!({"url": "https://example.com"}),
            )),
        ),
        Message::assistant()
            .with_text(r#"{"plan": [], "is_complete": true, "final_response": "navigated"}"#),
    ]));
    let mut agent = decision_agent(provider.clone());

    let output = agent.run(&objective("open example.com")).await?;
    assert!(output.is_complete);

    // the second model call saw the dispatched tool result
    let second_request = &provider.requests()[1];
    let tool_turn = second_request
        .iter()
        .find(|m| m.role == Role::Tool)
        .expect("tool turn present");
    let response = tool_turn.content[0].as_tool_response().unwrap();
    assert_eq!(response.id, "call_1");
    assert_eq!(
        response.result,
        Ok("Successfully navigated to page: Example Domain".to_string())
    );
    Ok(())
}
