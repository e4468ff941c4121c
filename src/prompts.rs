//! System-prompt templates for the stock agents, embedded at compile time and
//! rendered with tera.

use chrono::Local;
use serde::Serialize;
use tera::{Context, Error as TeraError, Tera};

use crate::errors::{AgentError, AgentResult};

pub const DECISION_TEMPLATE: &str = include_str!("prompts/decision.md");
pub const PLANNER_TEMPLATE: &str = include_str!("prompts/planner.md");
pub const EXECUTOR_TEMPLATE: &str = include_str!("prompts/executor.md");
pub const VISION_ANALYST_PROMPT: &str = include_str!("prompts/vision_analyst.md");
pub const VISION_JUDGE_PROMPT: &str = include_str!("prompts/vision_judge.md");

/// Render a template against serializable context data.
pub fn render_prompt<T: Serialize>(template: &str, context_data: &T) -> Result<String, TeraError> {
    let mut tera = Tera::default();
    tera.add_raw_template("inline_template", template)?;
    let context = Context::from_serialize(context_data)?;
    tera.render("inline_template", &context)
}

#[derive(Serialize)]
struct ProfileContext<'a> {
    user_profile: Option<&'a str>,
}

/// System prompt for the combined plan-and-act decision agent.
pub fn decision_prompt(user_profile: Option<&str>) -> AgentResult<String> {
    let rendered = render_prompt(DECISION_TEMPLATE, &ProfileContext { user_profile })
        .map_err(|e| AgentError::Configuration(format!("decision prompt failed to render: {e}")))?;
    Ok(stamp_current_date(rendered))
}

/// System prompt for the task planner.
pub fn planner_prompt(user_profile: Option<&str>) -> AgentResult<String> {
    let rendered = render_prompt(PLANNER_TEMPLATE, &ProfileContext { user_profile })
        .map_err(|e| AgentError::Configuration(format!("planner prompt failed to render: {e}")))?;
    Ok(stamp_current_date(rendered))
}

/// System prompt for the browser-navigation executor.
pub fn executor_prompt() -> String {
    EXECUTOR_TEMPLATE.to_string()
}

/// Models reason about relative dates ("next Friday") surprisingly often, so
/// planning prompts always carry today's date.
fn stamp_current_date(prompt: String) -> String {
    let today = Local::now();
    format!(
        "{prompt}\nToday's date is: {}\nCurrent weekday is: {}",
        today.format("%d/%m/%Y"),
        today.format("%A")
    )
}
