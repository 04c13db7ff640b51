//! Shared-environment snapshot handed to the planner.

use std::sync::Arc;

use crate::grid::Grid;
use crate::types::{AgentState, CellIndex};

/// Value snapshot of the world for one planning call.
///
/// Built fresh before every plan and moved onto the planner thread, so the
/// planner never aliases the dispatcher's mutable state.
#[derive(Debug, Clone)]
pub struct SharedEnvironment {
    pub grid: Arc<Grid>,
    pub num_of_agents: usize,
    pub curr_timestep: i32,
    pub curr_states: Vec<AgentState>,
    /// Per-agent goal list; each entry is `(goal location, timestep assigned)`.
    /// In lifelong mode there is exactly one entry per agent.
    pub goal_locations: Vec<Vec<(CellIndex, i32)>>,
}
