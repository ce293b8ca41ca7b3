//! Base Agent — the ReAct execution loop.
//!
//! `base` holds the loop itself; `repetition` holds the repetition-aware
//! advisory guard it uses. The Planner Agent (`crate::planner::agent`)
//! and Hybrid Agent (`crate::hybrid`) both build on `BaseAgent` rather
//! than duplicating the loop.

mod base;
mod repetition;

pub use base::{BaseAgent, BaseAgentConfig};
pub use repetition::RepetitionGuard;
