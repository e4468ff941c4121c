use std::marker::PhantomData;
use std::sync::Arc;
use std::time::Duration;

use tracing::{debug, warn};

use crate::conversation::{Conversation, HistoryRetention};
use crate::errors::{AgentError, AgentResult};
use crate::models::content::ImageContent;
use crate::models::message::Message;
use crate::providers::base::{Provider, ResponseFormat};
use crate::schema::{self, InputEnvelope, OutputEnvelope};
use crate::tools::ToolRegistry;
use crate::vision::VisionAnalyst;

pub const DEFAULT_MAX_TURNS: usize = 10;

/// Immutable per-agent settings, fixed at construction.
#[derive(Debug, Clone)]
pub struct AgentConfig {
    pub name: String,
    pub model: String,
    pub retention: HistoryRetention,
    /// Upper bound on model-call/tool-dispatch cycles within one invocation.
    pub max_turns: usize,
    /// Optional bound on each model call and each tool invocation.
    pub turn_timeout: Option<Duration>,
}

impl AgentConfig {
    pub fn new(name: impl Into<String>, model: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            model: model.into(),
            retention: HistoryRetention::Keep,
            max_turns: DEFAULT_MAX_TURNS,
            turn_timeout: None,
        }
    }

    pub fn reset_per_call(mut self) -> Self {
        self.retention = HistoryRetention::ResetPerCall;
        self
    }

    pub fn with_max_turns(mut self, max_turns: usize) -> Self {
        self.max_turns = max_turns;
        self
    }

    pub fn with_turn_timeout(mut self, timeout: Duration) -> Self {
        self.turn_timeout = Some(timeout);
        self
    }
}

/// What to do with a screenshot supplied alongside an input envelope.
pub enum VisionPolicy {
    /// Screenshots are ignored (with a warning).
    Disabled,
    /// Attach the image to the user message; requires a vision-capable model.
    AttachImage,
    /// Have a vision sub-agent summarize the image, then fuse the summary into
    /// the user message for a text-only model.
    Analyst(Box<VisionAnalyst>),
}

/// An LLM-backed agent with a typed input/output contract.
///
/// The conversation log is owned by the instance; `run` takes `&mut self`, so
/// a second in-flight call on the same instance is a compile error. Callers
/// needing parallelism construct independent agents over the same shared
/// provider.
pub struct Agent<I, O> {
    config: AgentConfig,
    provider: Arc<dyn Provider>,
    registry: ToolRegistry,
    vision: VisionPolicy,
    conversation: Conversation,
    schema_instruction: String,
    _io: PhantomData<fn(I) -> O>,
}

impl<I: InputEnvelope, O: OutputEnvelope> Agent<I, O> {
    pub fn new(
        config: AgentConfig,
        system_prompt: impl Into<String>,
        provider: Arc<dyn Provider>,
    ) -> Self {
        Self {
            config,
            provider,
            registry: ToolRegistry::new(),
            vision: VisionPolicy::Disabled,
            conversation: Conversation::new(system_prompt),
            schema_instruction: schema::schema_instruction::<O>(),
            _io: PhantomData,
        }
    }

    /// An agent whose system prompt requires async assembly; install it with
    /// [`Agent::set_system_prompt`] before the first call.
    pub fn deferred(config: AgentConfig, provider: Arc<dyn Provider>) -> Self {
        Self {
            config,
            provider,
            registry: ToolRegistry::new(),
            vision: VisionPolicy::Disabled,
            conversation: Conversation::deferred(),
            schema_instruction: schema::schema_instruction::<O>(),
            _io: PhantomData,
        }
    }

    pub fn with_tools(mut self, registry: ToolRegistry) -> Self {
        self.registry = registry;
        self
    }

    pub fn with_vision(mut self, policy: VisionPolicy) -> Self {
        self.vision = policy;
        self
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.conversation.set_system_prompt(prompt);
    }

    pub fn name(&self) -> &str {
        &self.config.name
    }

    pub fn conversation(&self) -> &Conversation {
        &self.conversation
    }

    /// Run one invocation: fuse the envelope into the conversation, then drive
    /// the model until it produces a schema-conforming output.
    pub async fn run(&mut self, input: &I) -> AgentResult<O> {
        self.run_inner(input, None).await
    }

    /// As [`Agent::run`], with a page screenshot handled per the vision policy.
    pub async fn run_with_screenshot(
        &mut self,
        input: &I,
        screenshot: ImageContent,
    ) -> AgentResult<O> {
        self.run_inner(input, Some(screenshot)).await
    }

    async fn run_inner(&mut self, input: &I, screenshot: Option<ImageContent>) -> AgentResult<O> {
        if self.config.retention == HistoryRetention::ResetPerCall {
            self.conversation.reset();
        }

        let envelope_json = serde_json::to_string(input).map_err(|e| {
            AgentError::Configuration(format!("input envelope failed to serialize: {e}"))
        })?;

        let user_message = match (screenshot, &mut self.vision) {
            (None, _) => Message::user().with_text(envelope_json),
            (Some(image), VisionPolicy::AttachImage) => Message::user()
                .with_text(envelope_json)
                .with_image(image.data, image.mime_type),
            (Some(image), VisionPolicy::Analyst(analyst)) => {
                let objective = input.objective().unwrap_or_default().to_string();
                let summary = analyst.analyze(&objective, image).await;
                Message::user().with_text(format!(
                    "VISUAL ANALYSIS: {summary}\n\nUSER INPUT: {envelope_json}"
                ))
            }
            (Some(_), VisionPolicy::Disabled) => {
                warn!(
                    agent = %self.config.name,
                    "screenshot supplied but vision is disabled; proceeding without it"
                );
                Message::user().with_text(envelope_json)
            }
        };
        self.conversation.append_user(user_message)?;

        // Raw markup and location travel in their own message so the JSON
        // envelope above stays schema-clean.
        if let Some(page) = input.page_context() {
            self.conversation
                .append_user(Message::user().with_text(page.render()))?;
        }

        self.enforce().await
    }

    /// The output-enforcement loop: call the model, dispatch any requested
    /// tools, and repeat until a terminal structured output arrives or the
    /// turn budget runs out.
    async fn enforce(&mut self) -> AgentResult<O> {
        let tools = self.registry.tools().to_vec();

        for turn in 0..self.config.max_turns {
            let outgoing = self.conversation.export(&self.schema_instruction);
            debug!(
                agent = %self.config.name,
                turn,
                messages = outgoing.len(),
                "calling model"
            );

            let completion = self.provider.complete(
                &self.config.model,
                &outgoing,
                &tools,
                ResponseFormat::JsonObject,
            );
            let (response, usage) = match self.config.turn_timeout {
                Some(limit) => tokio::time::timeout(limit, completion).await.map_err(|_| {
                    AgentError::Transport(format!("model call did not finish within {limit:?}"))
                })??,
                None => completion.await?,
            };
            debug!(
                agent = %self.config.name,
                input_tokens = ?usage.input_tokens,
                output_tokens = ?usage.output_tokens,
                "model responded"
            );

            let tool_requests: Vec<_> = response.tool_requests().into_iter().cloned().collect();
            if !tool_requests.is_empty() {
                // The assistant's own message precedes its tool results.
                self.conversation.append_assistant(response)?;
                for request in &tool_requests {
                    let tool_message = self
                        .registry
                        .dispatch(request, self.config.turn_timeout)
                        .await;
                    self.conversation.append_tool(tool_message)?;
                }
                continue;
            }

            // Parse and validate before touching the conversation: a failed
            // attempt must leave no partial assistant message behind.
            let raw = response.text();
            let output = schema::repair_and_validate::<O>(&raw)?;
            self.conversation.append_assistant(response)?;
            return Ok(output);
        }

        Err(AgentError::TurnLimitExceeded {
            limit: self.config.max_turns,
        })
    }
}
