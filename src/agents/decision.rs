use std::sync::Arc;

use crate::agent::{Agent, AgentConfig, VisionPolicy};
use crate::browser::{browser_toolkit, BrowserDriver};
use crate::errors::AgentResult;
use crate::models::content::ImageContent;
use crate::models::envelopes::{DecisionInput, DecisionOutput};
use crate::prompts;
use crate::providers::base::Provider;
use crate::providers::configs;
use crate::vision::VisionAnalyst;

/// Combined plan-and-act agent: given the objective and progress so far, it
/// updates the plan and either performs browser actions through its tools or
/// reports the next step. Stateless across calls — each decision is made fresh
/// from the envelope.
pub struct DecisionAgent {
    agent: Agent<DecisionInput, DecisionOutput>,
}

impl DecisionAgent {
    pub fn new(
        provider: Arc<dyn Provider>,
        driver: Arc<dyn BrowserDriver>,
    ) -> AgentResult<Self> {
        Self::with_profile(provider, driver, None)
    }

    /// As [`DecisionAgent::new`], with basic user information woven into the
    /// system prompt.
    pub fn with_profile(
        provider: Arc<dyn Provider>,
        driver: Arc<dyn BrowserDriver>,
        user_profile: Option<&str>,
    ) -> AgentResult<Self> {
        let config = AgentConfig::new("decision", configs::default_model()).reset_per_call();
        let prompt = prompts::decision_prompt(user_profile)?;
        let agent = Agent::new(config, prompt, provider).with_tools(browser_toolkit(driver));
        Ok(Self { agent })
    }

    /// Fuse vision summaries into decisions made from screenshots.
    pub fn with_vision(mut self, analyst: VisionAnalyst) -> Self {
        self.agent = self
            .agent
            .with_vision(VisionPolicy::Analyst(Box::new(analyst)));
        self
    }

    pub async fn decide(&mut self, input: &DecisionInput) -> AgentResult<DecisionOutput> {
        self.agent.run(input).await
    }

    pub async fn decide_with_screenshot(
        &mut self,
        input: &DecisionInput,
        screenshot: ImageContent,
    ) -> AgentResult<DecisionOutput> {
        self.agent.run_with_screenshot(input, screenshot).await
    }
}
