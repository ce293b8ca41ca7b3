//! # openagent-core
//!
//! The ReAct execution loop, planner/executor decomposition, and
//! resilience substrate for LLM-driven software-engineering agents.
//!
//! ## Architecture
//!
//! - **Core data model** (`core`): `Message`/`ToolCall`/`ToolResult`,
//!   `AgentStep`/`AgentTrajectory`, `HookContext` — the shapes every
//!   other module builds on.
//! - **Configuration** (`config`): the Agent factory API's config shape;
//!   loading from file/env is a caller concern, not this crate's.
//! - **Hook Manager** (`hooks`): named callbacks at ten well-known loop
//!   phases.
//! - **State Manager** (`state`): shared, watchable agent state.
//! - **Interruption Manager** (`interruption`): cooperative cancellation.
//! - **Resilience Manager** (`resilience`): retry-with-backoff, circuit
//!   breaker, race/parallel composition.
//! - **Tool Registry & Dispatcher** (`tools`): the `Tool` seam and
//!   normalized-name dispatch.
//! - **Trajectory Recorder** (`trajectory`): debounced trajectory
//!   persistence with a mandatory final flush.
//! - **LLM client boundary** (`llm`): the `LLMClient` trait; concrete
//!   provider adapters are out of scope.
//! - **Base Agent** (`agent`): the Reason-Act-Observe loop itself.
//! - **Planner Agent + Planner Tool** (`planner`): plan generation and
//!   in-memory plan/task CRUD.
//! - **Hybrid Agent** (`hybrid`): the two-phase plan-then-execute
//!   orchestrator built on top of the Base and Planner Agents.
//!
//! ## Quick Start
//!
//! ```rust,no_run
//! use openagent_core::config::Config;
//! use openagent_core::Result;
//!
//! fn main() -> Result<()> {
//!     // Callers load `Config` however they like (file, env, hardcoded);
//!     // this crate only validates and consumes the resulting value.
//!     let config = Config::default();
//!     openagent_core::config::validate_config(&config)?;
//!     Ok(())
//! }
//! ```

pub mod agent;
pub mod config;
pub mod core;
pub mod error;
pub mod hooks;
pub mod hybrid;
pub mod interruption;
pub mod llm;
pub mod planner;
pub mod resilience;
pub mod state;
pub mod tools;
pub mod trajectory;

pub use error::{Error, Result};

pub use core::{AgentStep, AgentTrajectory, HookContext, Message, Role, ToolCall, ToolDefinition, ToolResult};

/// Crate version, from Cargo.toml.
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Crate name, from Cargo.toml.
pub const NAME: &str = env!("CARGO_PKG_NAME");
