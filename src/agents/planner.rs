use std::sync::Arc;

use crate::agent::{Agent, AgentConfig, VisionPolicy};
use crate::errors::AgentResult;
use crate::models::content::ImageContent;
use crate::models::envelopes::{PlannerInput, PlannerOutput};
use crate::prompts;
use crate::providers::base::Provider;
use crate::providers::configs;
use crate::vision::VisionAnalyst;

/// Produces and revises the task plan; never touches the browser itself.
/// Keeps its conversation across calls so earlier reviews inform later plans.
pub struct PlannerAgent {
    agent: Agent<PlannerInput, PlannerOutput>,
}

impl PlannerAgent {
    pub fn new(provider: Arc<dyn Provider>) -> AgentResult<Self> {
        Self::with_profile(provider, None)
    }

    pub fn with_profile(
        provider: Arc<dyn Provider>,
        user_profile: Option<&str>,
    ) -> AgentResult<Self> {
        let config = AgentConfig::new("planner", configs::default_model());
        let prompt = prompts::planner_prompt(user_profile)?;
        Ok(Self {
            agent: Agent::new(config, prompt, provider),
        })
    }

    /// Fuse vision summaries into planning from screenshots.
    pub fn with_vision(mut self, analyst: VisionAnalyst) -> Self {
        self.agent = self
            .agent
            .with_vision(VisionPolicy::Analyst(Box::new(analyst)));
        self
    }

    pub async fn plan(&mut self, input: &PlannerInput) -> AgentResult<PlannerOutput> {
        self.agent.run(input).await
    }

    pub async fn plan_with_screenshot(
        &mut self,
        input: &PlannerInput,
        screenshot: ImageContent,
    ) -> AgentResult<PlannerOutput> {
        self.agent.run_with_screenshot(input, screenshot).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::message::Message;
    use crate::providers::mock::MockProvider;

    #[tokio::test]
    async fn test_plan_hands_over_next_task() {
        let provider = Arc::new(MockProvider::new(vec![Message::assistant().with_text(
            r#"{
                "plan": [{"id": 1, "description": "search flights", "url": null, "result": null}],
                "thought": "start with the search",
                "next_task": {"id": 1, "description": "search flights", "url": null, "result": null},
                "is_complete": false,
                "final_response": null
            }"#,
        )]));
        let mut planner = PlannerAgent::new(provider).unwrap();

        let input = PlannerInput {
            objective: "book a flight".to_string(),
            ..Default::default()
        };
        let output = planner.plan(&input).await.unwrap();

        assert_eq!(output.thought, "start with the search");
        assert_eq!(output.next_task.unwrap().id, 1);
        assert!(!output.is_complete);
    }
}
