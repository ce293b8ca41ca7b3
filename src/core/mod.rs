//! Core module — the shared data model.
//!
//! Messages, tool calls/results, agent steps, and trajectories are defined
//! once here and shared by every other module (hooks, state, interruption,
//! resilience, tools, trajectory, agent, planner, hybrid) rather than each
//! owning its own copy, the way the teacher centralizes its wire types
//! under `core/types.rs`.

pub mod types;

pub use types::*;
