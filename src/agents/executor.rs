use std::sync::Arc;

use crate::agent::{Agent, AgentConfig};
use crate::browser::{browser_toolkit, BrowserDriver};
use crate::errors::AgentResult;
use crate::models::envelopes::{ExecutorInput, ExecutorOutput};
use crate::prompts;
use crate::providers::base::Provider;
use crate::providers::configs;

/// Carries out one planned task against the page using the browser toolkit,
/// reporting the task back with its result filled in.
pub struct ExecutorAgent {
    agent: Agent<ExecutorInput, ExecutorOutput>,
}

impl ExecutorAgent {
    pub fn new(provider: Arc<dyn Provider>, driver: Arc<dyn BrowserDriver>) -> Self {
        let config = AgentConfig::new("executor", configs::default_model());
        let agent = Agent::new(config, prompts::executor_prompt(), provider)
            .with_tools(browser_toolkit(driver));
        Self { agent }
    }

    pub async fn execute(&mut self, input: &ExecutorInput) -> AgentResult<ExecutorOutput> {
        self.agent.run(input).await
    }
}
