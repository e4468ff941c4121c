//! Vision sub-agents: constrained instances of the enforcement loop that take
//! a screenshot plus a short objective and return a small fixed-schema
//! verdict. Their failures never propagate — visual context is an enhancement,
//! not a correctness requirement.

use std::sync::Arc;

use tracing::warn;

use crate::agent::{Agent, AgentConfig, VisionPolicy};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::ImageContent;
use crate::models::envelopes::{VisionAnalysis, VisionInput, VisionVerdict};
use crate::prompts;
use crate::providers::base::Provider;

/// Fallback summary when the vision model cannot be reached or misbehaves.
pub const VISION_UNAVAILABLE: &str =
    "Vision analysis unavailable - proceeding with DOM-only analysis";

/// Summarizes what a screenshot shows, for fusion into a text-only model's
/// context.
pub struct VisionAnalyst {
    agent: Agent<VisionInput, VisionAnalysis>,
}

impl VisionAnalyst {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let config = AgentConfig::new("vision-analyst", model).reset_per_call();
        let agent = Agent::new(config, prompts::VISION_ANALYST_PROMPT, provider)
            .with_vision(VisionPolicy::AttachImage);
        Self { agent }
    }

    pub async fn try_analyze(
        &mut self,
        objective: &str,
        screenshot: ImageContent,
    ) -> AgentResult<String> {
        let input = VisionInput {
            objective: objective.to_string(),
        };
        self.agent
            .run_with_screenshot(&input, screenshot)
            .await
            .map(|analysis| analysis.visual_analysis)
            .map_err(|e| AgentError::Vision(e.to_string()))
    }

    /// Infallible variant: any failure degrades to [`VISION_UNAVAILABLE`].
    pub async fn analyze(&mut self, objective: &str, screenshot: ImageContent) -> String {
        match self.try_analyze(objective, screenshot).await {
            Ok(analysis) => analysis,
            Err(e) => {
                warn!("{e}");
                VISION_UNAVAILABLE.to_string()
            }
        }
    }
}

/// Judges from visual evidence alone whether an objective has been met.
pub struct VisionJudge {
    agent: Agent<VisionInput, VisionVerdict>,
}

impl VisionJudge {
    pub fn new(provider: Arc<dyn Provider>, model: impl Into<String>) -> Self {
        let config = AgentConfig::new("vision-judge", model).reset_per_call();
        let agent = Agent::new(config, prompts::VISION_JUDGE_PROMPT, provider)
            .with_vision(VisionPolicy::AttachImage);
        Self { agent }
    }

    pub async fn try_is_terminal(
        &mut self,
        objective: &str,
        screenshot: ImageContent,
    ) -> AgentResult<bool> {
        let input = VisionInput {
            objective: objective.to_string(),
        };
        self.agent
            .run_with_screenshot(&input, screenshot)
            .await
            .map(|verdict| verdict.is_terminal)
            .map_err(|e| AgentError::Vision(e.to_string()))
    }

    /// Infallible variant: any failure reads as "not terminal".
    pub async fn is_terminal(&mut self, objective: &str, screenshot: ImageContent) -> bool {
        match self.try_is_terminal(objective, screenshot).await {
            Ok(is_terminal) => is_terminal,
            Err(e) => {
                warn!("{e}");
                false
            }
        }
    }
}
