//! Planner seam.
//!
//! The planner is an opaque capability: given a shared-environment snapshot
//! it returns one action per agent. It is the only component allowed to burn
//! time or fail; all defensive logic (deadline, arity check, validity gate)
//! lives around the call, not inside it.

use std::time::Duration;

use thiserror::Error;

use crate::env::SharedEnvironment;
use crate::types::Action;

/// Planner errors.
#[derive(Debug, Error)]
pub enum PlanError {
    #[error("planner initialization failed: {0}")]
    Initialize(String),
    #[error("planning failed: {0}")]
    Plan(String),
}

/// Joint-action planner.
///
/// `plan` is a synchronous, possibly long-running call; the caller bounds it
/// with a wall-clock budget and substitutes waits when the budget is blown or
/// an error comes back. Implementations must return exactly
/// `env.num_of_agents` actions.
pub trait Planner: Send + Sync {
    /// One-time preprocessing, bounded by `preprocess_time_limit`.
    fn initialize(&mut self, preprocess_time_limit: Duration) -> Result<(), PlanError>;

    /// Produce a joint action for the current timestep.
    fn plan(&self, env: &SharedEnvironment) -> Result<Vec<Action>, PlanError>;
}
