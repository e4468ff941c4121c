use std::collections::VecDeque;
use std::sync::Mutex;

use async_trait::async_trait;

use super::base::{Provider, ResponseFormat, Usage};
use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::tool::Tool;

/// A provider that replays pre-configured responses and records every request
/// it receives. Used by tests in place of a live endpoint.
pub struct MockProvider {
    responses: Mutex<VecDeque<Message>>,
    requests: Mutex<Vec<Vec<Message>>>,
    failure: Option<String>,
}

impl MockProvider {
    /// Replay the given responses in order; once exhausted, an empty assistant
    /// message is returned.
    pub fn new(responses: Vec<Message>) -> Self {
        Self {
            responses: Mutex::new(responses.into()),
            requests: Mutex::new(Vec::new()),
            failure: None,
        }
    }

    /// A provider whose every call fails with a transport error.
    pub fn failing(message: impl Into<String>) -> Self {
        Self {
            responses: Mutex::new(VecDeque::new()),
            requests: Mutex::new(Vec::new()),
            failure: Some(message.into()),
        }
    }

    /// The message lists of every completion request seen so far.
    pub fn requests(&self) -> Vec<Vec<Message>> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl Provider for MockProvider {
    async fn complete(
        &self,
        _model: &str,
        messages: &[Message],
        _tools: &[Tool],
        _format: ResponseFormat,
    ) -> AgentResult<(Message, Usage)> {
        self.requests.lock().unwrap().push(messages.to_vec());

        if let Some(failure) = &self.failure {
            return Err(AgentError::Transport(failure.clone()));
        }

        let mut responses = self.responses.lock().unwrap();
        match responses.pop_front() {
            Some(response) => Ok((response, Usage::default())),
            None => Ok((Message::assistant().with_text(""), Usage::default())),
        }
    }
}
