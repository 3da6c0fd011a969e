//! Execution engine for modvar
//!
//! The engine orchestrates:
//! 1. Planning - Compare recorded state with the config per instance
//! 2. Display - Render the plan with sensitive values redacted
//! 3. Executing - Apply changes on a worker pool and persist state

pub mod differ;
pub mod executor;
pub mod planner;

pub use executor::{ExecuteOptions, execute, run_parallel};
pub use planner::{ExecutionPlan, Target, plan_apply, plan_destroy};
