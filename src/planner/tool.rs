//! Planner Tool — in-memory plan CRUD plus dependency-aware next-task
//! selection.
//!
//! Implements the crate's own `Tool` seam rather than a bespoke
//! interface, so it plugs into `ToolRegistry`/`BaseAgent` exactly like
//! any other tool — the Planner Agent just happens to be the one that
//! calls it. Grounded in the teacher's `AgentTask`/`TaskStore` lifecycle
//! operations (`src/database/tasks.rs`), moved from a `sqlx`-backed
//! store to a single `Mutex<Option<ExecutionPlan>>` since at most one
//! plan is active per instance.

use std::sync::Arc;

use async_trait::async_trait;
use serde::Deserialize;
use serde_json::{json, Value};
use tokio::sync::Mutex;
use tracing::warn;

use crate::core::ToolResult;
use crate::error::{Error, Result};
use crate::tools::{Tool, ToolContext};

use super::types::{ExecutionPlan, PlanStatus, Task, TaskInput, TaskStatus};

/// The name this tool advertises to the model and that the Hybrid Agent
/// matches on when partitioning tools into planning/execution sets.
pub const PLANNER_TOOL_NAME: &str = "planner_tool";

#[derive(Debug, Deserialize)]
struct UpdatePlanFields {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    status: Option<PlanStatus>,
}

#[derive(Debug, Deserialize)]
struct UpdateTaskFields {
    #[serde(default)]
    status: Option<TaskStatus>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    result: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(tag = "operation", rename_all = "snake_case")]
enum PlannerOperation {
    CreatePlan { objective: String },
    CreatePlanWithTasks { objective: String, #[serde(default)] tasks: Vec<TaskInput> },
    GetPlan {},
    UpdatePlan { #[serde(default)] fields: UpdatePlanFields },
    DeletePlan {},
    AddTask { task: TaskInput },
    AddTasks { tasks: Vec<TaskInput> },
    UpdateTask { task_id: String, #[serde(default)] fields: UpdateTaskFields },
    GetNextTask {},
}

/// In-memory holder of at most one active plan.
#[derive(Clone, Default)]
pub struct PlannerTool {
    plan: Arc<Mutex<Option<ExecutionPlan>>>,
}

impl PlannerTool {
    pub fn new() -> Self {
        PlannerTool { plan: Arc::new(Mutex::new(None)) }
    }

    /// Read-only snapshot of the current plan, for external observers —
    /// this is the weak read reference the Hybrid Agent holds into its
    /// embedded planner's tool.
    pub async fn current_plan(&self) -> Option<ExecutionPlan> {
        self.plan.lock().await.clone()
    }

    async fn create_plan(&self, objective: String) -> Result<Value> {
        let plan = ExecutionPlan::new(objective);
        let snapshot = plan.clone();
        *self.plan.lock().await = Some(plan);
        Ok(json!({ "plan": snapshot }))
    }

    async fn create_plan_with_tasks(&self, objective: String, tasks: Vec<TaskInput>) -> Result<Value> {
        let mut plan = ExecutionPlan::new(objective);
        plan.tasks = tasks.into_iter().map(Task::from_input).collect();
        if !plan.dependencies_acyclic() {
            return Err(Error::InvalidInput("task dependency graph is not acyclic".into()));
        }
        plan.recompute();
        let snapshot = plan.clone();
        *self.plan.lock().await = Some(plan);
        Ok(json!({ "plan": snapshot }))
    }

    async fn get_plan(&self) -> Result<Value> {
        let plan = self.plan.lock().await.clone();
        Ok(json!({ "plan": plan }))
    }

    async fn update_plan(&self, fields: UpdatePlanFields) -> Result<Value> {
        let mut guard = self.plan.lock().await;
        let plan = guard.as_mut().ok_or_else(|| Error::NotFound("no active plan".into()))?;
        if let Some(title) = fields.title {
            plan.title = title;
        }
        if let Some(description) = fields.description {
            plan.description = description;
        }
        if let Some(status) = fields.status {
            plan.status = status;
        }
        plan.recompute();
        Ok(json!({ "plan": plan.clone() }))
    }

    async fn delete_plan(&self) -> Result<Value> {
        *self.plan.lock().await = None;
        Ok(json!({ "plan": Value::Null }))
    }

    async fn add_task(&self, input: TaskInput) -> Result<Value> {
        let mut guard = self.plan.lock().await;
        let plan = guard.as_mut().ok_or_else(|| Error::NotFound("no active plan; call create_plan first".into()))?;
        let task = Task::from_input(input);
        plan.tasks.push(task);
        if !plan.dependencies_acyclic() {
            plan.tasks.pop();
            return Err(Error::InvalidInput("task dependency graph is not acyclic".into()));
        }
        plan.recompute();
        let snapshot = plan.tasks.last().cloned().expect("just pushed");
        Ok(json!({ "task": snapshot }))
    }

    async fn add_tasks(&self, inputs: Vec<TaskInput>) -> Result<Value> {
        let mut guard = self.plan.lock().await;
        let plan = guard.as_mut().ok_or_else(|| Error::NotFound("no active plan; call create_plan first".into()))?;
        let before = plan.tasks.len();
        plan.tasks.extend(inputs.into_iter().map(Task::from_input));
        if !plan.dependencies_acyclic() {
            plan.tasks.truncate(before);
            return Err(Error::InvalidInput("task dependency graph is not acyclic".into()));
        }
        plan.recompute();
        let added = plan.tasks[before..].to_vec();
        Ok(json!({ "tasks": added }))
    }

    async fn update_task(&self, task_id: String, fields: UpdateTaskFields) -> Result<Value> {
        let mut guard = self.plan.lock().await;
        let plan = guard.as_mut().ok_or_else(|| Error::NotFound("no active plan".into()))?;
        let task = plan.tasks.iter_mut().find(|t| t.id == task_id).ok_or_else(|| Error::NotFound(format!("task '{task_id}' not found")))?;

        if let Some(title) = fields.title {
            task.title = title;
        }
        if let Some(description) = fields.description {
            task.description = description;
        }
        if let Some(result) = fields.result {
            task.result = Some(result);
        }
        if let Some(status) = fields.status {
            task.set_status(status);
        }
        let snapshot = task.clone();
        plan.recompute();
        Ok(json!({ "task": snapshot }))
    }

    async fn get_next_task(&self) -> Result<Value> {
        let guard = self.plan.lock().await;
        let plan = guard.as_ref().ok_or_else(|| Error::NotFound("no active plan".into()))?;
        Ok(json!({ "next_task": plan.next_task().cloned() }))
    }
}

#[async_trait]
impl Tool for PlannerTool {
    fn name(&self) -> &str {
        PLANNER_TOOL_NAME
    }

    fn description(&self) -> &str {
        "Create and manage the in-memory execution plan: create_plan, create_plan_with_tasks, \
         get_plan, update_plan, delete_plan, add_task, add_tasks, update_task, get_next_task."
    }

    fn parameters_schema(&self) -> Value {
        json!({
            "type": "object",
            "properties": {
                "operation": {
                    "type": "string",
                    "enum": [
                        "create_plan", "create_plan_with_tasks", "get_plan", "update_plan",
                        "delete_plan", "add_task", "add_tasks", "update_task", "get_next_task"
                    ]
                },
                "objective": { "type": "string" },
                "tasks": { "type": "array" },
                "task": { "type": "object" },
                "task_id": { "type": "string" },
                "fields": { "type": "object" }
            },
            "required": ["operation"]
        })
    }

    async fn execute(&self, args: Value, _context: &ToolContext) -> Result<ToolResult> {
        let operation: PlannerOperation = match serde_json::from_value(args) {
            Ok(op) => op,
            Err(err) => {
                warn!(error = %err, "planner_tool received unrecognized operation payload");
                return Ok(ToolResult::failure(format!("invalid planner_tool arguments: {err}")));
            }
        };

        let outcome = match operation {
            PlannerOperation::CreatePlan { objective } => self.create_plan(objective).await,
            PlannerOperation::CreatePlanWithTasks { objective, tasks } => self.create_plan_with_tasks(objective, tasks).await,
            PlannerOperation::GetPlan {} => self.get_plan().await,
            PlannerOperation::UpdatePlan { fields } => self.update_plan(fields).await,
            PlannerOperation::DeletePlan {} => self.delete_plan().await,
            PlannerOperation::AddTask { task } => self.add_task(task).await,
            PlannerOperation::AddTasks { tasks } => self.add_tasks(tasks).await,
            PlannerOperation::UpdateTask { task_id, fields } => self.update_task(task_id, fields).await,
            PlannerOperation::GetNextTask {} => self.get_next_task().await,
        };

        Ok(match outcome {
            Ok(value) => ToolResult::success(value),
            Err(err) => ToolResult::failure(err.to_string()),
        })
    }
}
