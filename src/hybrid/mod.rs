//! Hybrid Agent — the two-phase planner-then-executor orchestrator.
//!
//! Adapted from the teacher's `PlannerWorkerReflector` state machine
//! (`src/agent/state_machine.rs`): the same "plan, then work through
//! steps one at a time, recording a result per step" shape, generalized
//! from the teacher's single internal `Planning -> Executing ->
//! Reflecting -> Complete` enum into two fully independent, reusable
//! loops — an embedded `PlannerAgent` for the planning phase and one
//! `BaseAgent` invocation per task for the execution phase — instead of
//! hand-rolled state transitions. The teacher's `Reflecting` state (an
//! LLM call judging whether to replan) has no counterpart here, since
//! this is a strictly linear plan-then-execute sequence with no
//! replanning step, and is intentionally not carried over.

use std::sync::Arc;
use std::time::Duration;

use tracing::{info, warn};

use crate::agent::{BaseAgent, BaseAgentConfig};
use crate::core::{AgentStep, AgentTrajectory, HookContext};
use crate::error::{Error, Result};
use crate::hooks::{HookManager, HookPhase};
use crate::interruption::InterruptionManager;
use crate::llm::{GenerationOptions, LLMClient};
use crate::planner::tool::PLANNER_TOOL_NAME;
use crate::planner::{ExecutionPlan, FailureHandling, PlannerAgent, PlannerAgentConfig, PlannerTool, Task};
use crate::tools::{Tool, ToolContext, ToolRegistry, TERMINAL_TOOL_NAMES, THINKING_TOOL_NAMES};
use crate::trajectory::TrajectoryRecorder;

/// Upper bound on the embedded Planner Agent's step budget.
const MAX_PLANNING_STEPS: u32 = 12;

/// Default per-task execution step budget when the configured execution
/// max is larger: each task draws `min(8, configured execution max)`.
const DEFAULT_TASK_STEP_BUDGET: u32 = 8;

/// Construction parameters for a `HybridAgent`.
pub struct HybridAgentConfig {
    pub agent_id: String,
    pub working_directory: String,
    /// Step budget for the embedded Planner Agent; clamped to
    /// `MAX_PLANNING_STEPS`.
    pub planning_max_steps: u32,
    /// Step budget ceiling each task's execution-phase `BaseAgent` draws
    /// `min(8, this)` from.
    pub execution_max_steps: u32,
    /// Small pause between tasks.
    pub inter_task_sleep: Duration,
    pub generation_options: GenerationOptions,
}

impl Default for HybridAgentConfig {
    fn default() -> Self {
        HybridAgentConfig {
            agent_id: uuid::Uuid::new_v4().to_string(),
            working_directory: ".".to_string(),
            planning_max_steps: MAX_PLANNING_STEPS,
            execution_max_steps: 30,
            inter_task_sleep: Duration::from_millis(200),
            generation_options: GenerationOptions::default(),
        }
    }
}

/// Result of one task's execution-phase invocation.
#[derive(Debug, Clone)]
struct TaskOutcome {
    task_id: String,
    success: bool,
    steps: usize,
    final_content: Option<String>,
}

/// Two-phase orchestrator: drives an embedded Planner Agent, then
/// iterates the resulting plan with a fresh Base Agent per task.
pub struct HybridAgent {
    config: HybridAgentConfig,
    llm_client: Arc<dyn LLMClient>,
    planner: PlannerAgent,
    /// Weak read reference into the plan the embedded planner produces —
    /// a clone of the same `PlannerTool` registered into the planner's
    /// own tool set.
    planner_tool: PlannerTool,
    execution_tools: Arc<ToolRegistry>,
    hooks: HookManager,
    interruption: InterruptionManager,
    trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
}

impl HybridAgent {
    /// Partition `tools` into a planning set (planner tool, thinking
    /// tool, `complete_task`/`task_done`) and an execution set
    /// (everything else), construct the embedded Planner Agent from the
    /// former, and retain the latter for the execution phase.
    ///
    /// `planner_tool` is the same instance `tools` must also carry under
    /// `PLANNER_TOOL_NAME` (it is `Clone`, cheaply, behind an internal
    /// `Arc`) — passed separately here because `Tool` trait objects
    /// don't support downcasting, so the Hybrid Agent can't recover its
    /// own read handle from the partitioned `Box<dyn Tool>` otherwise.
    pub fn new(
        config: HybridAgentConfig,
        llm_client: Arc<dyn LLMClient>,
        planner_tool: PlannerTool,
        tools: Vec<Box<dyn Tool>>,
        hooks: HookManager,
        interruption: InterruptionManager,
        trajectory_recorder: Option<Arc<TrajectoryRecorder>>,
    ) -> Result<Self> {
        let mut planning_registry = ToolRegistry::new();
        let mut execution_registry = ToolRegistry::new();

        for tool in tools {
            if is_planning_tool(tool.name()) {
                planning_registry.register_boxed(tool);
            } else {
                execution_registry.register_boxed(tool);
            }
        }

        if planning_registry.get(PLANNER_TOOL_NAME).is_none() {
            return Err(Error::Config(format!("HybridAgent requires a registered '{PLANNER_TOOL_NAME}' tool among `tools`")));
        }

        let planner_config = PlannerAgentConfig {
            agent_id: format!("{}-planner", config.agent_id),
            max_steps: config.planning_max_steps.min(MAX_PLANNING_STEPS),
            working_directory: config.working_directory.clone(),
        };
        let planner = PlannerAgent::new(
            planner_config,
            llm_client.clone(),
            Arc::new(planning_registry),
            HookManager::new(),
            interruption.clone(),
            None,
        )?;

        Ok(HybridAgent {
            config,
            llm_client,
            planner,
            planner_tool,
            execution_tools: Arc::new(execution_registry),
            hooks,
            interruption,
            trajectory_recorder,
        })
    }

    pub fn agent_id(&self) -> &str {
        &self.config.agent_id
    }

    /// Live read access to the plan the embedded planner is building or
    /// has built, independent of this run's returned trajectory.
    pub async fn current_plan(&self) -> Option<ExecutionPlan> {
        self.planner_tool.current_plan().await
    }

    /// Forward a stop/interrupt request to both this agent and the
    /// embedded planner. Both share one `InterruptionManager` instance
    /// by construction, so a single `interrupt()` call reaches both.
    pub async fn stop(&self, reason: impl Into<String>) {
        self.interruption.interrupt(reason).await;
    }

    /// Run the full two-phase sequence for `objective`.
    pub async fn run(&self, objective: &str) -> Result<AgentTrajectory> {
        let mut trajectory = AgentTrajectory::new(self.config.agent_id.clone(), objective.to_string());
        let hook_ctx = HookContext { agent_id: self.config.agent_id.clone(), task: Some(objective.to_string()), ..Default::default() };

        self.interruption.check_interrupted()?;

        // --- Planning phase (hooked as phase = planning) ---------------
        let mut planning_ctx = hook_ctx.clone();
        planning_ctx.extra.insert("phase".to_string(), serde_json::json!("planning"));
        self.hooks.execute(HookPhase::PreReasoning, &planning_ctx, None).await;

        let plan = match self.planner.run(objective).await {
            Ok((planner_trajectory, Some(plan))) => {
                trajectory.push_step(planning_step(objective, &planner_trajectory));
                plan
            }
            Ok((planner_trajectory, None)) => {
                trajectory.push_step(planning_step(objective, &planner_trajectory));
                trajectory.finish(false, Some("planning phase produced no execution plan".to_string()));
                self.hooks.execute(HookPhase::PostReasoning, &planning_ctx, None).await;
                return Ok(trajectory);
            }
            Err(err) => {
                self.hooks.execute(HookPhase::PostReasoning, &planning_ctx, None).await;
                trajectory.finish(false, Some(err.to_string()));
                return Err(err);
            }
        };
        self.hooks.execute(HookPhase::PostReasoning, &planning_ctx, None).await;

        // --- Execution phase (hooked as phase = executing) -------------
        let mut executing_ctx = hook_ctx.clone();
        executing_ctx.extra.insert("phase".to_string(), serde_json::json!("executing"));
        self.hooks.execute(HookPhase::PreActing, &executing_ctx, None).await;

        let continue_on_error = !matches!(plan.strategy.failure_handling, FailureHandling::Stop);
        let task_budget = self.config.execution_max_steps.min(DEFAULT_TASK_STEP_BUDGET);

        let mut overall_success = true;
        for (index, task) in plan.tasks.iter().enumerate() {
            self.interruption.check_interrupted()?;

            self.mark_task_status(&task.id, "in_progress").await;
            let outcome = self.run_task(&plan, task, task_budget).await;
            self.mark_task_status(&task.id, if outcome.success { "completed" } else { "failed" }).await;
            trajectory.push_step(task_step(index, task, &outcome));

            if !outcome.success {
                overall_success = false;
                if !continue_on_error {
                    warn!(task_id = %task.id, "task failed; aborting execution phase (failure_handling=stop)");
                    break;
                }
                info!(task_id = %task.id, "task failed; continuing per failure_handling");
            }

            if index + 1 < plan.tasks.len() {
                tokio::time::sleep(self.config.inter_task_sleep).await;
            }
        }

        self.hooks.execute(HookPhase::PostActing, &executing_ctx, None).await;

        let final_plan = self.planner_tool.current_plan().await.unwrap_or(plan);
        let summary = format!("executed {} task(s), progress={:.2}", final_plan.tasks.len(), final_plan.progress);
        trajectory.finish(overall_success, Some(summary));

        if let Some(recorder) = &self.trajectory_recorder {
            recorder.flush(&trajectory).await.ok();
        }

        Ok(trajectory)
    }

    /// Drive the task's status transition (`pending -> in_progress ->
    /// {completed | failed}`) through the same `planner_tool` the
    /// planner populated, so `current_plan()`'s progress reflects
    /// execution-phase results.
    async fn mark_task_status(&self, task_id: &str, status: &str) {
        let args = serde_json::json!({
            "operation": "update_task",
            "task_id": task_id,
            "fields": { "status": status },
        });
        if let Ok(result) = self.planner_tool.execute(args, &ToolContext::default()).await {
            if !result.success {
                warn!(task_id, status, error = ?result.error, "failed to update task status on planner_tool");
            }
        }
    }

    /// Run one task's execution phase through a fresh `BaseAgent` scoped
    /// to the execution tool subset.
    async fn run_task(&self, plan: &ExecutionPlan, task: &Task, max_steps: u32) -> TaskOutcome {
        let prompt = execution_prompt(plan, task, &self.config.working_directory);

        let base_config = BaseAgentConfig {
            agent_id: format!("{}-task-{}", self.config.agent_id, task.id),
            system_prompt: "You are executing one task from an already-approved plan. Use the \
                available tools to complete it, then respond with a final summary."
                .to_string(),
            max_steps,
            working_directory: self.config.working_directory.clone(),
            generation_options: self.config.generation_options.clone(),
            ..Default::default()
        };

        let base_agent =
            BaseAgent::new(base_config, self.llm_client.clone(), self.execution_tools.clone(), HookManager::new(), self.interruption.clone(), None);

        match base_agent.run(&prompt).await {
            Ok(task_trajectory) => TaskOutcome {
                task_id: task.id.clone(),
                success: task_trajectory.success,
                steps: task_trajectory.len(),
                final_content: task_trajectory.final_result,
            },
            Err(err) => TaskOutcome { task_id: task.id.clone(), success: false, steps: 0, final_content: Some(err.to_string()) },
        }
    }
}

/// Whether `name` belongs in the planning tool set: the planner tool
/// itself, a thinking tool, or the terminal marker tool.
fn is_planning_tool(name: &str) -> bool {
    name == PLANNER_TOOL_NAME || THINKING_TOOL_NAMES.contains(&name) || TERMINAL_TOOL_NAMES.contains(&name)
}

/// Compose the execution prompt for one task: title, description,
/// priority, estimated duration, plan context, and working directory.
fn execution_prompt(plan: &ExecutionPlan, task: &Task, working_directory: &str) -> String {
    format!(
        "Plan: {plan_title}\nObjective: {objective}\n\nTask: {title}\nDescription: {description}\n\
         Priority: {priority:?}\nEstimated duration: {duration} minutes\nWorking directory: {working_directory}\n\n\
         Complete this task using the available tools, then summarize what you did.",
        plan_title = plan.title,
        objective = plan.objective,
        title = task.title,
        description = task.description,
        priority = task.priority,
        duration = task.estimated_duration_minutes,
    )
}

/// Build the planning-phase synthetic step recorded into the Hybrid
/// Agent's own trajectory.
fn planning_step(objective: &str, planner_trajectory: &AgentTrajectory) -> AgentStep {
    AgentStep::new(objective)
        .annotate("phase", serde_json::json!("planning"))
        .annotate("planner_steps", serde_json::json!(planner_trajectory.len()))
        .annotate("planner_success", serde_json::json!(planner_trajectory.success))
}

/// Build the execution-phase synthetic step for one task, tagged with
/// its index in the plan.
fn task_step(index: usize, task: &Task, outcome: &TaskOutcome) -> AgentStep {
    AgentStep::new(task.title.clone())
        .annotate("phase", serde_json::json!("executing"))
        .annotate("task_index", serde_json::json!(index))
        .annotate("task_id", serde_json::json!(outcome.task_id))
        .annotate("success", serde_json::json!(outcome.success))
        .annotate("steps", serde_json::json!(outcome.steps))
        .annotate("final_content", serde_json::json!(outcome.final_content))
}
