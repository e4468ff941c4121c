//! Structured values exchanged with agents at their call boundary.
//!
//! Inputs serialize into the model-facing user message; raw page markup and
//! location are declared `skip_serializing` and travel in a separate message
//! (see [`crate::schema::InputEnvelope`]). Outputs derive `JsonSchema` so the
//! enforcement loop can inject their schema into the system message and repair
//! omitted optional fields structurally.

use schemars::JsonSchema;
use serde::{Deserialize, Serialize};

use crate::schema::{InputEnvelope, PageContext};

/// One concrete browser action the model can ask for.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
#[serde(tag = "type")]
pub enum Action {
    #[serde(rename = "CLICK")]
    Click { mmid: String },
    #[serde(rename = "TYPE")]
    Type { mmid: String, content: String },
    #[serde(rename = "GOTO_URL")]
    GotoUrl { website: String },
}

/// A unit of work in a plan. `url` and `result` are filled in as the task is
/// attempted.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize, JsonSchema)]
pub struct Task {
    pub id: i64,
    pub description: String,
    pub url: Option<String>,
    pub result: Option<String>,
}

impl Task {
    pub fn new(id: i64, description: impl Into<String>) -> Self {
        Task {
            id,
            description: description.into(),
            url: None,
            result: None,
        }
    }
}

/// Input to the combined plan-and-act decision agent.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DecisionInput {
    pub objective: String,
    pub current_task: Option<Task>,
    pub completed_tasks: Option<Vec<Task>>,
    #[serde(skip_serializing, default)]
    pub current_page_dom: Option<String>,
    #[serde(skip_serializing, default)]
    pub current_page_url: Option<String>,
}

impl InputEnvelope for DecisionInput {
    fn objective(&self) -> Option<&str> {
        Some(&self.objective)
    }

    fn page_context(&self) -> Option<PageContext> {
        PageContext::from_parts(self.current_page_url.clone(), self.current_page_dom.clone())
    }
}

/// Output of the decision agent: an updated plan plus the next step to take.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct DecisionOutput {
    pub plan: Vec<Task>,
    pub thought: Option<String>,
    pub next_task: Option<Task>,
    pub next_task_actions: Option<Vec<Action>>,
    pub is_complete: bool,
    pub final_response: Option<String>,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlannerInput {
    pub objective: String,
    pub plan: Option<Vec<Task>>,
    pub completed_tasks: Option<Vec<Task>>,
    pub task_for_review: Option<Task>,
}

impl InputEnvelope for PlannerInput {
    fn objective(&self) -> Option<&str> {
        Some(&self.objective)
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct PlannerOutput {
    pub plan: Option<Vec<Task>>,
    pub thought: String,
    pub next_task: Option<Task>,
    pub is_complete: bool,
    pub final_response: Option<String>,
}

/// Input to the browser-navigation executor: the task to carry out plus the
/// page state it acts against.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutorInput {
    pub task: Task,
    #[serde(skip_serializing, default)]
    pub current_page_dom: Option<String>,
    #[serde(skip_serializing, default)]
    pub current_page_url: Option<String>,
}

impl InputEnvelope for ExecutorInput {
    fn objective(&self) -> Option<&str> {
        Some(&self.task.description)
    }

    fn page_context(&self) -> Option<PageContext> {
        PageContext::from_parts(self.current_page_url.clone(), self.current_page_dom.clone())
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct ExecutorOutput {
    pub completed_task: Task,
}

/// Input to a vision sub-agent: the screenshot itself travels as image content
/// alongside this envelope.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct VisionInput {
    pub objective: String,
}

impl InputEnvelope for VisionInput {
    fn objective(&self) -> Option<&str> {
        Some(&self.objective)
    }
}

/// Short textual summary of what a screenshot shows.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisionAnalysis {
    pub visual_analysis: String,
}

/// Terminal-state judgement from visual evidence alone.
#[derive(Debug, Clone, Serialize, Deserialize, JsonSchema)]
pub struct VisionVerdict {
    pub is_terminal: bool,
}

/// Where the orchestrator currently is in its plan/browse cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum State {
    Plan,
    Browse,
    Completed,
}

/// Accumulated progress of one orchestrated objective.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Memory {
    pub objective: String,
    pub current_state: State,
    pub plan: Vec<Task>,
    pub thought: String,
    pub completed_tasks: Vec<Task>,
    pub current_task: Option<Task>,
    pub final_response: Option<String>,
}

impl Memory {
    pub fn new(objective: impl Into<String>) -> Self {
        Memory {
            objective: objective.into(),
            current_state: State::Plan,
            plan: Vec::new(),
            thought: String::new(),
            completed_tasks: Vec::new(),
            current_task: None,
            final_response: None,
        }
    }
}
