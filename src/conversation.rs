use crate::errors::{AgentError, AgentResult};
use crate::models::message::Message;
use crate::models::role::Role;

/// Whether an agent's conversation survives across calls.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HistoryRetention {
    /// History grows monotonically; every call sees prior turns.
    Keep,
    /// The log is cleared back to the system message at the start of each call.
    ResetPerCall,
}

/// The ordered message log owned by one agent instance.
///
/// Invariant: index 0 is the single system message whenever a system prompt is
/// configured. The output-schema instruction is appended only to the exported
/// copy sent to the model, so retained history never accumulates duplicates.
#[derive(Debug, Clone)]
pub struct Conversation {
    system_prompt: Option<String>,
    messages: Vec<Message>,
}

impl Conversation {
    pub fn new(system_prompt: impl Into<String>) -> Self {
        let mut conversation = Conversation {
            system_prompt: Some(system_prompt.into()),
            messages: Vec::new(),
        };
        conversation.reset();
        conversation
    }

    /// A conversation whose system prompt requires async assembly and is
    /// installed later via [`Conversation::set_system_prompt`]. Appending
    /// before that happens is a configuration error.
    pub fn deferred() -> Self {
        Conversation {
            system_prompt: None,
            messages: Vec::new(),
        }
    }

    /// Replace the message log with the single configured system message.
    pub fn reset(&mut self) {
        self.messages.clear();
        if let Some(prompt) = &self.system_prompt {
            self.messages.push(Message::system().with_text(prompt.clone()));
        }
    }

    pub fn set_system_prompt(&mut self, prompt: impl Into<String>) {
        self.system_prompt = Some(prompt.into());
        self.reset();
    }

    pub fn append_user(&mut self, message: Message) -> AgentResult<()> {
        self.append(Role::User, message)
    }

    pub fn append_assistant(&mut self, message: Message) -> AgentResult<()> {
        self.append(Role::Assistant, message)
    }

    pub fn append_tool(&mut self, message: Message) -> AgentResult<()> {
        self.append(Role::Tool, message)
    }

    fn append(&mut self, role: Role, message: Message) -> AgentResult<()> {
        if self.system_prompt.is_none() {
            return Err(AgentError::Configuration(
                "conversation has no system prompt installed; messages cannot be appended yet"
                    .to_string(),
            ));
        }
        if message.role != role {
            return Err(AgentError::Configuration(format!(
                "message role {:?} does not match append target {:?}",
                message.role, role
            )));
        }
        self.messages.push(message);
        Ok(())
    }

    /// The message list for one model call: a copy of the log with the
    /// output-schema instruction appended to the system message. The stored
    /// log is never mutated by export.
    pub fn export(&self, schema_instruction: &str) -> Vec<Message> {
        let mut exported = self.messages.clone();
        if let Some(first) = exported.first_mut() {
            if first.role == Role::System {
                first.append_text(schema_instruction);
            }
        }
        exported
    }

    pub fn messages(&self) -> &[Message] {
        &self.messages
    }

    pub fn len(&self) -> usize {
        self.messages.len()
    }

    pub fn is_empty(&self) -> bool {
        self.messages.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_starts_with_system_message() {
        let conversation = Conversation::new("you are a pilot");
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
        assert_eq!(conversation.messages()[0].text(), "you are a pilot");
    }

    #[test]
    fn test_append_before_prompt_installed_is_configuration_error() {
        let mut conversation = Conversation::deferred();
        let error = conversation
            .append_user(Message::user().with_text("hello"))
            .unwrap_err();
        assert!(matches!(error, AgentError::Configuration(_)));

        conversation.set_system_prompt("late prompt");
        conversation
            .append_user(Message::user().with_text("hello"))
            .unwrap();
        assert_eq!(conversation.len(), 2);
    }

    #[test]
    fn test_append_preserves_call_order() {
        let mut conversation = Conversation::new("system");
        conversation
            .append_user(Message::user().with_text("first"))
            .unwrap();
        conversation
            .append_assistant(Message::assistant().with_text("second"))
            .unwrap();
        conversation
            .append_tool(Message::tool().with_tool_response("1", "open_url", Ok("ok".into())))
            .unwrap();
        let roles: Vec<Role> = conversation.messages().iter().map(|m| m.role).collect();
        assert_eq!(
            roles,
            vec![Role::System, Role::User, Role::Assistant, Role::Tool]
        );
    }

    #[test]
    fn test_role_mismatch_rejected() {
        let mut conversation = Conversation::new("system");
        let error = conversation
            .append_user(Message::assistant().with_text("not a user message"))
            .unwrap_err();
        assert!(matches!(error, AgentError::Configuration(_)));
    }

    #[test]
    fn test_export_augments_copy_not_stored_history() {
        let mut conversation = Conversation::new("base prompt");
        conversation
            .append_user(Message::user().with_text("hi"))
            .unwrap();

        let exported = conversation.export(" SCHEMA");
        assert_eq!(exported[0].text(), "base prompt SCHEMA");
        assert_eq!(conversation.messages()[0].text(), "base prompt");

        // A second export over retained history must not stack instructions.
        let again = conversation.export(" SCHEMA");
        assert_eq!(again[0].text(), "base prompt SCHEMA");
    }

    #[test]
    fn test_reset_clears_back_to_system() {
        let mut conversation = Conversation::new("system");
        conversation
            .append_user(Message::user().with_text("hi"))
            .unwrap();
        conversation.reset();
        assert_eq!(conversation.len(), 1);
        assert_eq!(conversation.messages()[0].role, Role::System);
    }
}
