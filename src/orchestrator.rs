//! Drives a planner/executor pair through the plan → browse cycle until the
//! objective is complete.

use std::sync::Arc;

use tracing::{info, warn};
use uuid::Uuid;

use crate::agents::{ExecutorAgent, PlannerAgent};
use crate::browser::{BrowserDriver, DomContentKind};
use crate::errors::{AgentError, AgentResult};
use crate::models::envelopes::{ExecutorInput, Memory, PlannerInput, State};

const DEFAULT_MAX_CYCLES: usize = 25;

pub struct Orchestrator {
    planner: PlannerAgent,
    executor: ExecutorAgent,
    driver: Arc<dyn BrowserDriver>,
    session_id: Uuid,
    /// Upper bound on plan/browse cycles for one objective.
    max_cycles: usize,
}

impl Orchestrator {
    pub fn new(
        planner: PlannerAgent,
        executor: ExecutorAgent,
        driver: Arc<dyn BrowserDriver>,
    ) -> Self {
        Self {
            planner,
            executor,
            driver,
            session_id: Uuid::new_v4(),
            max_cycles: DEFAULT_MAX_CYCLES,
        }
    }

    pub fn with_max_cycles(mut self, max_cycles: usize) -> Self {
        self.max_cycles = max_cycles;
        self
    }

    pub fn session_id(&self) -> Uuid {
        self.session_id
    }

    /// Run one objective to completion, returning the accumulated memory
    /// (plan, completed tasks, final response).
    pub async fn execute(&mut self, objective: &str) -> AgentResult<Memory> {
        info!(session = %self.session_id, objective, "executing command");
        let mut memory = Memory::new(objective);

        let mut cycles = 0;
        while memory.current_state != State::Completed {
            if cycles >= self.max_cycles {
                return Err(AgentError::TurnLimitExceeded {
                    limit: self.max_cycles,
                });
            }
            cycles += 1;
            self.step(&mut memory).await?;
        }

        info!(session = %self.session_id, final_response = ?memory.final_response, "objective finished");
        Ok(memory)
    }

    async fn step(&mut self, memory: &mut Memory) -> AgentResult<()> {
        match memory.current_state {
            State::Plan => self.handle_plan(memory).await,
            State::Browse => self.handle_browse(memory).await,
            State::Completed => Ok(()),
        }
    }

    async fn handle_plan(&mut self, memory: &mut Memory) -> AgentResult<()> {
        let input = PlannerInput {
            objective: memory.objective.clone(),
            // The previous plan is withheld on purpose: feeding it back tends
            // to anchor the model on stale steps instead of replanning.
            plan: None,
            task_for_review: memory.current_task.take(),
            completed_tasks: Some(memory.completed_tasks.clone()),
        };

        let output = match self.driver.screenshot().await {
            Ok(screenshot) => self.planner.plan_with_screenshot(&input, screenshot).await?,
            Err(e) => {
                warn!(session = %self.session_id, "screenshot unavailable for planning: {e}");
                self.planner.plan(&input).await?
            }
        };

        memory.thought = output.thought;
        if let Some(plan) = output.plan {
            memory.plan = plan;
        }

        if output.is_complete {
            memory.final_response = output.final_response;
            memory.current_state = State::Completed;
        } else if let Some(next_task) = output.next_task {
            info!(session = %self.session_id, task = %next_task.description, "task handed to executor");
            memory.current_task = Some(next_task);
            memory.current_state = State::Browse;
        } else {
            return Err(AgentError::Configuration(
                "planner produced neither a next task nor a completed objective".to_string(),
            ));
        }
        Ok(())
    }

    async fn handle_browse(&mut self, memory: &mut Memory) -> AgentResult<()> {
        let task = memory.current_task.clone().ok_or_else(|| {
            AgentError::Configuration("browse state entered without a current task".to_string())
        })?;

        let input = ExecutorInput {
            task,
            current_page_dom: self.driver.page_dom(DomContentKind::AllFields).await.ok(),
            current_page_url: self.driver.current_url().await.ok(),
        };

        let output = self.executor.execute(&input).await?;
        memory.completed_tasks.push(output.completed_task.clone());
        // Completed task goes back to the planner for review.
        memory.current_task = Some(output.completed_task);
        memory.current_state = State::Plan;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::errors::{ToolError, ToolResult};
    use crate::models::content::ImageContent;
    use crate::models::message::Message;
    use crate::providers::mock::MockProvider;
    use async_trait::async_trait;

    struct StaticPageDriver;

    #[async_trait]
    impl BrowserDriver for StaticPageDriver {
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
            Err(ToolError::ExecutionError("no display".to_string()))
        }
        async fn upload_file(&self, _selector: &str, _file_path: &str) -> ToolResult<()> {
            Ok(())
        }
        async fn wait_for_page_load(&self, _timeout_secs: u64) -> ToolResult<()> {
            Ok(())
        }
    }

    fn planner_turn_one() -> Message {
        Message::assistant().with_text(
            r#"{
                "plan": [{"id": 1, "description": "open example.com", "url": null, "result": null}],
                "thought": "navigate first",
                "next_task": {"id": 1, "description": "open example.com", "url": null, "result": null},
                "is_complete": false,
                "final_response": null
            }"#,
        )
    }

    fn executor_turn() -> Message {
        Message::assistant().with_text(
            r#"{
                "completed_task": {
                    "id": 1,
                    "description": "open example.com",
                    "url": "https://example.com",
                    "result": "page opened"
                }
            }"#,
        )
    }

    fn planner_turn_complete() -> Message {
        Message::assistant().with_text(
            r#"{
                "plan": null,
                "thought": "objective met",
                "next_task": null,
                "is_complete": true,
                "final_response": "Opened example.com"
            }"#,
        )
    }

    #[tokio::test]
    async fn test_plan_browse_completed_walk() {
        let planner_provider = Arc::new(MockProvider::new(vec![
            planner_turn_one(),
            planner_turn_complete(),
        ]));
        let executor_provider = Arc::new(MockProvider::new(vec![executor_turn()]));
        let driver: Arc<dyn BrowserDriver> = Arc::new(StaticPageDriver);

        let planner = PlannerAgent::new(planner_provider).unwrap();
        let executor = ExecutorAgent::new(executor_provider.clone(), driver.clone());
        let mut orchestrator = Orchestrator::new(planner, executor, driver);

        let memory = orchestrator.execute("open example.com").await.unwrap();

        assert_eq!(memory.current_state, State::Completed);
        assert_eq!(memory.completed_tasks.len(), 1);
        assert_eq!(
            memory.completed_tasks[0].result.as_deref(),
            Some("page opened")
        );
        assert_eq!(memory.final_response.as_deref(), Some("Opened example.com"));

        // the executor saw the page state in its separate context message
        let executor_request = &executor_provider.requests()[0];
        assert!(executor_request
            .iter()
            .any(|m| m.text().contains("Current page URL:")));
    }

    #[tokio::test]
    async fn test_cycle_cap_fails_closed() {
        // A planner that never declares completion.
        let looping: Vec<Message> = (0..6).map(|_| planner_turn_one()).collect();
        let executor_responses: Vec<Message> = (0..6).map(|_| executor_turn()).collect();
        let driver: Arc<dyn BrowserDriver> = Arc::new(StaticPageDriver);

        let planner = PlannerAgent::new(Arc::new(MockProvider::new(looping))).unwrap();
        let executor = ExecutorAgent::new(
            Arc::new(MockProvider::new(executor_responses)),
            driver.clone(),
        );
        let mut orchestrator = Orchestrator::new(planner, executor, driver).with_max_cycles(4);

        let error = orchestrator.execute("never finishes").await.unwrap_err();
        assert!(matches!(error, AgentError::TurnLimitExceeded { limit: 4 }));
    }

    #[tokio::test]
    async fn test_planner_without_next_task_or_completion_is_error() {
        let planner_provider = Arc::new(MockProvider::new(vec![Message::assistant().with_text(
            r#"{
                "plan": null,
                "thought": "stuck",
                "next_task": null,
                "is_complete": false,
                "final_response": null
            }"#,
        )]));
        let driver: Arc<dyn BrowserDriver> = Arc::new(StaticPageDriver);

        let planner = PlannerAgent::new(planner_provider).unwrap();
        let executor = ExecutorAgent::new(Arc::new(MockProvider::new(vec![])), driver.clone());
        let mut orchestrator = Orchestrator::new(planner, executor, driver);

        let error = orchestrator.execute("stuck objective").await.unwrap_err();
        assert!(matches!(error, AgentError::Configuration(_)));
    }
}
