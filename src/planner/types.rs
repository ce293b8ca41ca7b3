//! Planning data model — `Task`/`ExecutionPlan`/`ExecutionStrategy`.
//!
//! Adapted from the teacher's `AgentTask`/`TaskStatus` pair in
//! `src/database/tasks.rs` — same "lifecycle status enum + created/
//! started/completed timestamps" shape — generalized to a richer
//! status/phase/priority vocabulary and moved in-memory (the Planner
//! Tool owns at most one plan per instance; no `sqlx`/Postgres backing
//! here).

use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Kind of work a task represents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskType {
    Analysis,
    Development,
    Testing,
    Deployment,
    Research,
    Review,
    Other,
}

/// Lifecycle status of a task. Transitions are monotonic along
/// `pending -> in_progress -> {completed | failed | skipped}`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskStatus {
    Pending,
    InProgress,
    Completed,
    Failed,
    Skipped,
}

impl TaskStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, TaskStatus::Completed | TaskStatus::Failed | TaskStatus::Skipped)
    }
}

/// Lifecycle phase a task belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TaskPhase {
    ResearchSetup,
    Planning,
    Implementation,
    Testing,
    Completion,
}

/// Task priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TaskPriority {
    High,
    Medium,
    Low,
}

/// A single unit of work inside an `ExecutionPlan`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    pub id: String,
    pub title: String,
    pub description: String,
    #[serde(rename = "type")]
    pub task_type: TaskType,
    pub status: TaskStatus,
    pub phase: TaskPhase,
    pub priority: TaskPriority,
    /// Ids of tasks that must be `completed` before this one may start.
    /// Invariant (checked by `ExecutionPlan::dependencies_acyclic`):
    /// references stay within the same plan and the graph is acyclic.
    #[serde(default)]
    pub dependencies: Vec<String>,
    pub estimated_duration_minutes: u32,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub started_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<chrono::DateTime<chrono::Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub result: Option<String>,
}

/// Input payload for `PlannerTool::add_task`. Every field but
/// `title`/`description` has a documented default, so callers (the
/// model, via JSON arguments) only need to supply what they care about.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct TaskInput {
    pub title: String,
    #[serde(default)]
    pub description: String,
    #[serde(rename = "type", default)]
    pub task_type: Option<TaskType>,
    #[serde(default)]
    pub phase: Option<TaskPhase>,
    #[serde(default)]
    pub priority: Option<TaskPriority>,
    #[serde(default)]
    pub dependencies: Vec<String>,
    #[serde(default)]
    pub estimated_duration_minutes: Option<u32>,
}

impl Task {
    /// Build a fresh task from `input`, applying the documented defaults:
    /// status `pending`, phase `planning`, priority `medium`, duration 15.
    pub fn from_input(input: TaskInput) -> Self {
        Task {
            id: Uuid::new_v4().to_string(),
            title: input.title,
            description: input.description,
            task_type: input.task_type.unwrap_or(TaskType::Other),
            status: TaskStatus::Pending,
            phase: input.phase.unwrap_or(TaskPhase::Planning),
            priority: input.priority.unwrap_or(TaskPriority::Medium),
            dependencies: input.dependencies,
            estimated_duration_minutes: input.estimated_duration_minutes.unwrap_or(15),
            created_at: chrono::Utc::now(),
            started_at: None,
            completed_at: None,
            result: None,
        }
    }

    /// Apply a status transition, stamping `started_at` on the move into
    /// `in_progress` and `completed_at` on the move into `completed`.
    pub fn set_status(&mut self, status: TaskStatus) {
        if status == TaskStatus::InProgress && self.started_at.is_none() {
            self.started_at = Some(chrono::Utc::now());
        }
        if status == TaskStatus::Completed && self.completed_at.is_none() {
            self.completed_at = Some(chrono::Utc::now());
        }
        self.status = status;
    }
}

/// How an `ExecutionPlan`'s tasks should be driven to completion.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionStrategy {
    pub allow_parallel: bool,
    pub max_parallel_tasks: u32,
    pub failure_handling: FailureHandling,
    pub auto_retry: bool,
    pub max_retries: u32,
    pub retry_interval_seconds: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub timeout_minutes: Option<u32>,
}

impl Default for ExecutionStrategy {
    fn default() -> Self {
        ExecutionStrategy {
            allow_parallel: false,
            max_parallel_tasks: 1,
            failure_handling: FailureHandling::Stop,
            auto_retry: false,
            max_retries: 0,
            retry_interval_seconds: 5,
            timeout_minutes: None,
        }
    }
}

/// How the executor reacts to a failed task.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum FailureHandling {
    Stop,
    Continue,
    Retry,
    Skip,
}

/// Lifecycle status of a whole plan.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlanStatus {
    Planning,
    Ready,
    InProgress,
    Completed,
    Failed,
}

/// Optional plan-level metadata the planner may attach.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct PlanMetadata {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub complexity: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub risk: Option<String>,
    #[serde(default, skip_serializing_if = "Vec::is_empty")]
    pub techniques: Vec<String>,
}

/// A dependency-annotated task list produced by the planner and consumed
/// by the executor.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ExecutionPlan {
    pub id: String,
    pub title: String,
    pub description: String,
    pub objective: String,
    pub status: PlanStatus,
    pub tasks: Vec<Task>,
    pub strategy: ExecutionStrategy,
    pub created_at: chrono::DateTime<chrono::Utc>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub updated_at: Option<chrono::DateTime<chrono::Utc>>,
    /// `completed_tasks / total_tasks`, recomputed on every task mutation.
    /// Zero when the plan has no tasks yet.
    pub progress: f64,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub metadata: Option<PlanMetadata>,
}

impl ExecutionPlan {
    /// Build a fresh plan: status `planning`, empty tasks, default
    /// strategy.
    pub fn new(objective: impl Into<String>) -> Self {
        let objective = objective.into();
        ExecutionPlan {
            id: Uuid::new_v4().to_string(),
            title: objective.clone(),
            description: String::new(),
            objective,
            status: PlanStatus::Planning,
            tasks: Vec::new(),
            strategy: ExecutionStrategy::default(),
            created_at: chrono::Utc::now(),
            updated_at: None,
            progress: 0.0,
            metadata: None,
        }
    }

    /// Recompute `progress` and `status` from the current task list:
    /// `progress = completed / total`, and `status` becomes `completed`
    /// iff all tasks are terminal and at least one exists.
    pub fn recompute(&mut self) {
        self.updated_at = Some(chrono::Utc::now());
        if self.tasks.is_empty() {
            self.progress = 0.0;
            return;
        }
        let completed = self.tasks.iter().filter(|t| t.status == TaskStatus::Completed).count();
        self.progress = completed as f64 / self.tasks.len() as f64;

        let all_terminal = self.tasks.iter().all(|t| t.status.is_terminal());
        if all_terminal {
            self.status = if self.tasks.iter().all(|t| t.status == TaskStatus::Completed) {
                PlanStatus::Completed
            } else {
                PlanStatus::Failed
            };
        } else if self.tasks.iter().any(|t| t.status == TaskStatus::InProgress) {
            self.status = PlanStatus::InProgress;
        }
    }

    /// First task whose status is `pending` and all of whose
    /// dependencies are `completed`. Does not mutate plan status when
    /// nothing qualifies.
    pub fn next_task(&self) -> Option<&Task> {
        self.tasks.iter().find(|t| {
            t.status == TaskStatus::Pending
                && t.dependencies.iter().all(|dep| {
                    self.tasks.iter().any(|other| other.id == *dep && other.status == TaskStatus::Completed)
                })
        })
    }

    /// Whether the dependency graph among this plan's tasks is acyclic.
    /// Run as a guard before adding/merging tasks whose dependencies
    /// reference ids already in the plan.
    pub fn dependencies_acyclic(&self) -> bool {
        let mut visiting: std::collections::HashSet<&str> = std::collections::HashSet::new();
        let mut done: std::collections::HashSet<&str> = std::collections::HashSet::new();

        fn visit<'a>(
            id: &'a str,
            tasks: &'a [Task],
            visiting: &mut std::collections::HashSet<&'a str>,
            done: &mut std::collections::HashSet<&'a str>,
        ) -> bool {
            if done.contains(id) {
                return true;
            }
            if !visiting.insert(id) {
                return false;
            }
            if let Some(task) = tasks.iter().find(|t| t.id == id) {
                for dep in &task.dependencies {
                    if !visit(dep, tasks, visiting, done) {
                        return false;
                    }
                }
            }
            visiting.remove(id);
            done.insert(id);
            true
        }

        self.tasks.iter().all(|t| visit(&t.id, &self.tasks, &mut visiting, &mut done))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn input(title: &str) -> TaskInput {
        TaskInput { title: title.to_string(), ..Default::default() }
    }

    #[test]
    fn task_from_input_applies_spec_defaults() {
        let task = Task::from_input(input("write tests"));
        assert_eq!(task.status, TaskStatus::Pending);
        assert_eq!(task.phase, TaskPhase::Planning);
        assert_eq!(task.priority, TaskPriority::Medium);
        assert_eq!(task.estimated_duration_minutes, 15);
        assert!(task.dependencies.is_empty());
    }

    #[test]
    fn set_status_stamps_timestamps_once() {
        let mut task = Task::from_input(input("build"));
        task.set_status(TaskStatus::InProgress);
        assert!(task.started_at.is_some());
        let first_start = task.started_at;
        task.set_status(TaskStatus::InProgress);
        assert_eq!(task.started_at, first_start);

        task.set_status(TaskStatus::Completed);
        assert!(task.completed_at.is_some());
    }

    #[test]
    fn progress_recomputed_from_tasks() {
        let mut plan = ExecutionPlan::new("ship feature");
        plan.tasks.push(Task::from_input(input("a")));
        plan.tasks.push(Task::from_input(input("b")));
        plan.recompute();
        assert_eq!(plan.progress, 0.0);

        plan.tasks[0].set_status(TaskStatus::Completed);
        plan.recompute();
        assert_eq!(plan.progress, 0.5);
        assert_eq!(plan.status, PlanStatus::InProgress);

        plan.tasks[1].set_status(TaskStatus::Completed);
        plan.recompute();
        assert_eq!(plan.progress, 1.0);
        assert_eq!(plan.status, PlanStatus::Completed);
    }

    #[test]
    fn next_task_respects_dependencies() {
        let mut plan = ExecutionPlan::new("ship feature");
        let mut first = Task::from_input(input("a"));
        first.id = "t1".to_string();
        let mut second = Task::from_input(TaskInput { title: "b".into(), dependencies: vec!["t1".into()], ..Default::default() });
        second.id = "t2".to_string();
        plan.tasks.push(first);
        plan.tasks.push(second);

        let next = plan.next_task().unwrap();
        assert_eq!(next.id, "t1");

        plan.tasks[0].set_status(TaskStatus::Completed);
        let next = plan.next_task().unwrap();
        assert_eq!(next.id, "t2");
    }

    #[test]
    fn dependency_cycle_is_detected() {
        let mut plan = ExecutionPlan::new("x");
        let mut a = Task::from_input(TaskInput { title: "a".into(), dependencies: vec!["b".into()], ..Default::default() });
        a.id = "a".to_string();
        let mut b = Task::from_input(TaskInput { title: "b".into(), dependencies: vec!["a".into()], ..Default::default() });
        b.id = "b".to_string();
        plan.tasks.push(a);
        plan.tasks.push(b);
        assert!(!plan.dependencies_acyclic());
    }
}
