//! Planner Agent + Planner Tool — the `ExecutionPlan`/`Task` data model
//! and the components that produce and mutate it.
//!
//! Adapted from the teacher's `src/agent/planner.rs` (single-shot plan
//! generation) and `src/database/tasks.rs` (task lifecycle): the plan
//! lives behind the crate's own `Tool` seam instead of a `sqlx`-backed
//! store, and planning is a full bounded ReAct loop instead of one LLM
//! call.

pub mod agent;
pub mod tool;
pub mod types;

pub use agent::{PlannerAgent, PlannerAgentConfig};
pub use tool::{PlannerTool, PLANNER_TOOL_NAME};
pub use types::{ExecutionPlan, ExecutionStrategy, FailureHandling, PlanStatus, Task, TaskInput, TaskPhase, TaskPriority, TaskStatus, TaskType};
