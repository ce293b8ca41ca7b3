//! Planner Agent — a Base Agent restricted to planning tools.
//!
//! Adapted from the teacher's `Planner` (`src/agent/planner.rs`), which
//! drove a single one-shot "ask the model for a JSON plan" call. Here the
//! planner is instead a full, bounded ReAct loop (reusing `BaseAgent`
//! wholesale) whose only side effect is populating a plan through the
//! `PlannerTool` — generalizing the teacher's single-shot call into an
//! iterative "analyze, then create the plan atomically through tool
//! calls" loop.

use std::sync::Arc;

use tracing::warn;

use crate::agent::{BaseAgent, BaseAgentConfig};
use crate::core::AgentTrajectory;
use crate::error::{Error, Result};
use crate::hooks::HookManager;
use crate::interruption::InterruptionManager;
use crate::llm::LLMClient;
use crate::tools::{ToolRegistry, THINKING_TOOL_NAMES};
use crate::trajectory::TrajectoryRecorder;

use super::tool::PLANNER_TOOL_NAME;
use super::types::{ExecutionPlan, Task};

const DEFAULT_PLANNER_SYSTEM_PROMPT: &str = "\
You are the planning phase of a software-engineering agent. You do not perform \
substantive work yourself. Your job, in order, is to:\n\
1. Analyze the objective and break it into a dependency-ordered set of tasks.\n\
2. Create a plan and add its tasks atomically through the planner tool \
(create_plan or create_plan_with_tasks, then add_task/add_tasks as needed).\n\
3. Once the plan is complete, call complete_task to signal you are done.\n\
Do not call any execution tool directly; your only outputs are planner tool \
calls and the final complete_task call.";

/// Construction parameters for a `PlannerAgent`.
pub struct PlannerAgentConfig {
    pub agent_id: String,
    pub max_steps: u32,
    pub working_directory: String,
}

impl Default for PlannerAgentConfig {
    fn default() -> Self {
        PlannerAgentConfig { agent_id: uuid::Uuid::new_v4().to_string(), max_steps: 12, working_directory: ".".to_string() }
    }
}

/// A Base Agent whose tool set is restricted to planning tools.
pub struct PlannerAgent {
    inner: BaseAgent,
}

impl PlannerAgent {
    /// Construct a planner agent. Rejects construction as a configuration
    /// error, raised immediately rather than surfacing later as a run-time
    /// failure, if `tools` carries neither a registered `planner_tool` nor
    /// a recognized thinking tool.
    pub fn new(
        config: PlannerAgentConfig,
        llm_client: Arc<dyn LLMClient>,
        tools: Arc<ToolRegistry>,
        hooks: HookManager,
        interruption: InterruptionManager,
        trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
    ) -> Result<Self> {
        if tools.get(PLANNER_TOOL_NAME).is_none() {
            return Err(Error::Config(format!(
                "PlannerAgent requires a registered '{PLANNER_TOOL_NAME}' tool"
            )));
        }
        if !THINKING_TOOL_NAMES.iter().any(|name| tools.get(name).is_some()) {
            return Err(Error::Config(format!(
                "PlannerAgent requires one of {THINKING_TOOL_NAMES:?} to be registered as a thinking tool"
            )));
        }

        let base_config = BaseAgentConfig {
            agent_id: config.agent_id,
            system_prompt: DEFAULT_PLANNER_SYSTEM_PROMPT.to_string(),
            max_steps: config.max_steps,
            working_directory: config.working_directory,
            ..Default::default()
        };

        Ok(PlannerAgent { inner: BaseAgent::new(base_config, llm_client, tools, hooks, interruption, trajectory_recorder) })
    }

    pub fn agent_id(&self) -> &str {
        self.inner.agent_id()
    }

    /// Run the bounded planning loop and extract the `ExecutionPlan`
    /// produced through the planner tool.
    ///
    /// Returns the raw trajectory alongside the extracted plan so
    /// callers (the Hybrid Agent) can record the planning-phase step.
    pub async fn run(&self, objective: &str) -> Result<(AgentTrajectory, Option<ExecutionPlan>)> {
        let trajectory = self.inner.run(objective).await?;
        let plan = extract_plan_from_trajectory(&trajectory);
        Ok((trajectory, plan))
    }
}

/// Scan `trajectory` top-to-bottom for the first `planner_tool` result
/// carrying a `plan`, then merge any subsequent `task`/`tasks` payloads
/// into its task list. The Planner Agent does not peek at the
/// `PlannerTool`'s internal state directly — it only has the trajectory
/// it produced, so reconstruction happens the same way an external
/// observer's would.
fn extract_plan_from_trajectory(trajectory: &AgentTrajectory) -> Option<ExecutionPlan> {
    let mut plan: Option<ExecutionPlan> = None;

    for step in &trajectory.steps {
        for result in &step.tool_results {
            let Some(payload) = result.result.as_ref() else { continue };

            if plan.is_none() {
                if let Some(plan_value) = payload.get("plan") {
                    match serde_json::from_value::<ExecutionPlan>(plan_value.clone()) {
                        Ok(parsed) => {
                            plan = Some(parsed);
                            continue;
                        }
                        Err(err) => {
                            warn!(error = %err, "planner tool result carried an unparseable plan");
                        }
                    }
                }
            }

            let Some(plan) = plan.as_mut() else { continue };

            if let Some(task_value) = payload.get("task") {
                if let Ok(task) = serde_json::from_value::<Task>(task_value.clone()) {
                    merge_task(plan, task);
                }
            }
            if let Some(tasks_value) = payload.get("tasks") {
                if let Ok(tasks) = serde_json::from_value::<Vec<Task>>(tasks_value.clone()) {
                    for task in tasks {
                        merge_task(plan, task);
                    }
                }
            }
        }
    }

    if let Some(plan) = plan.as_mut() {
        plan.recompute();
    }
    plan
}

/// Insert `task`, replacing an existing entry with the same id so a
/// later `update_task` result supersedes the `add_task` snapshot that
/// preceded it.
fn merge_task(plan: &mut ExecutionPlan, task: Task) {
    if let Some(existing) = plan.tasks.iter_mut().find(|t| t.id == task.id) {
        *existing = task;
    } else {
        plan.tasks.push(task);
    }
}

/// Success criterion for a planner run: the trajectory contains at least
/// one planner-tool call whose structured result carries a plan.
pub fn trajectory_contains_plan_call(trajectory: &AgentTrajectory) -> bool {
    trajectory.steps.iter().any(|step| {
        step.tool_calls.iter().any(|c| c.function_name == PLANNER_TOOL_NAME)
            && step.tool_results.iter().any(|r| r.result.as_ref().is_some_and(|v| v.get("plan").is_some()))
    })
}
