//! The stock agents: a combined plan-and-act decision agent, and the
//! planner/executor pair driven by the orchestrator.
pub mod decision;
pub mod executor;
pub mod planner;

pub use decision::DecisionAgent;
pub use executor::ExecutorAgent;
pub use planner::PlannerAgent;
