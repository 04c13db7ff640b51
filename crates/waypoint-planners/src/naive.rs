//! Single-agent greedy steering.

use std::time::Duration;

use waypoint_core::env::SharedEnvironment;
use waypoint_core::planner::{PlanError, Planner};
use waypoint_core::types::{Action, AgentState, CellIndex, Orientation};

/// Steers every agent independently toward its goal: rotate to face the goal
/// (columns first), then step forward when the cell ahead is traversable.
/// Agents with no goal, or already at it, wait.
#[derive(Debug, Default)]
pub struct NaivePlanner;

impl NaivePlanner {
    pub fn new() -> Self {
        Self
    }

    fn step_toward(&self, env: &SharedEnvironment, state: &AgentState, goal: CellIndex) -> Action {
        let grid = &env.grid;
        let row = grid.row_of(state.location);
        let col = grid.col_of(state.location);
        let goal_row = grid.row_of(goal);
        let goal_col = grid.col_of(goal);

        let target = if goal_col > col {
            Orientation::East
        } else if goal_col < col {
            Orientation::West
        } else if goal_row > row {
            Orientation::South
        } else {
            Orientation::North
        };

        if state.orientation == target {
            match grid.step(state.location, state.orientation) {
                Some(ahead) if !grid.is_obstacle(ahead) => Action::FW,
                _ => Action::W,
            }
        } else {
            let turns = (target.index() + 4 - state.orientation.index()) % 4;
            if turns == 3 {
                Action::CCR
            } else {
                Action::CR
            }
        }
    }
}

impl Planner for NaivePlanner {
    fn initialize(&mut self, _preprocess_time_limit: Duration) -> Result<(), PlanError> {
        Ok(())
    }

    fn plan(&self, env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
        let mut actions = Vec::with_capacity(env.num_of_agents);
        for (agent, state) in env.curr_states.iter().enumerate() {
            let goal = env
                .goal_locations
                .get(agent)
                .and_then(|goals| goals.first())
                .map(|&(location, _)| location);
            let action = match goal {
                Some(goal) if goal != state.location => self.step_toward(env, state, goal),
                _ => Action::W,
            };
            actions.push(action);
        }
        Ok(actions)
    }
}

/// Holds every agent in place. Useful as a stand-in planner and in tests.
#[derive(Debug, Default)]
pub struct WaitPlanner;

impl WaitPlanner {
    pub fn new() -> Self {
        Self
    }
}

impl Planner for WaitPlanner {
    fn initialize(&mut self, _preprocess_time_limit: Duration) -> Result<(), PlanError> {
        Ok(())
    }

    fn plan(&self, env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
        Ok(vec![Action::W; env.num_of_agents])
    }
}
