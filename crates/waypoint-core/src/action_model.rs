//! Rotate-kinematics action model.
//!
//! Computes the joint next state for a joint action and checks its validity:
//! map bounds, obstacles, vertex conflicts (two agents entering the same
//! cell), and edge conflicts (two agents swapping cells).

use std::sync::Arc;

use crate::grid::Grid;
use crate::types::{Action, AgentState, CellIndex};

/// One fault found while validating a joint action. `agent_b` is -1 for
/// single-agent faults such as leaving the map or entering an obstacle.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Conflict {
    pub agent_a: i32,
    pub agent_b: i32,
    pub message: String,
}

impl Conflict {
    fn single(agent: usize, message: String) -> Self {
        Self {
            agent_a: agent as i32,
            agent_b: -1,
            message,
        }
    }

    fn pair(agent_a: usize, agent_b: usize, message: String) -> Self {
        Self {
            agent_a: agent_a as i32,
            agent_b: agent_b as i32,
            message,
        }
    }
}

/// Kinematics for agents that rotate in place and move along their heading.
#[derive(Debug, Clone)]
pub struct ActionModel {
    grid: Arc<Grid>,
}

impl ActionModel {
    pub fn new(grid: Arc<Grid>) -> Self {
        Self { grid }
    }

    /// The state one agent reaches by applying `action`. A forward move that
    /// would leave the map or enter an obstacle keeps the agent in place;
    /// `validate` is the gate that reports such moves.
    pub fn result_state(&self, state: &AgentState, action: Action) -> AgentState {
        let mut next = *state;
        next.timestep = state.timestep + 1;
        match action {
            Action::FW => {
                if let Some(ahead) = self.grid.step(state.location, state.orientation) {
                    if !self.grid.is_obstacle(ahead) {
                        next.location = ahead;
                    }
                }
            }
            Action::CR => next.orientation = state.orientation.clockwise(),
            Action::CCR => next.orientation = state.orientation.counter_clockwise(),
            Action::W | Action::NA => {}
        }
        next
    }

    /// The joint next state for a joint action.
    pub fn result_states(&self, prev: &[AgentState], actions: &[Action]) -> Vec<AgentState> {
        prev.iter()
            .zip(actions)
            .map(|(state, action)| self.result_state(state, *action))
            .collect()
    }

    /// All faults in the joint action. Empty means the action is valid.
    pub fn validate(&self, prev: &[AgentState], actions: &[Action]) -> Vec<Conflict> {
        let mut conflicts = Vec::new();
        let mut targets: Vec<CellIndex> = Vec::with_capacity(prev.len());

        for (agent, (state, action)) in prev.iter().zip(actions).enumerate() {
            let target = if *action == Action::FW {
                match self.grid.step(state.location, state.orientation) {
                    Some(ahead) if !self.grid.is_obstacle(ahead) => ahead,
                    Some(ahead) => {
                        conflicts.push(Conflict::single(
                            agent,
                            format!("agent {agent} moves into an obstacle at {ahead}"),
                        ));
                        state.location
                    }
                    None => {
                        conflicts.push(Conflict::single(
                            agent,
                            format!("agent {agent} moves off the map from {}", state.location),
                        ));
                        state.location
                    }
                }
            } else {
                state.location
            };
            targets.push(target);
        }

        for i in 0..targets.len() {
            for j in (i + 1)..targets.len() {
                if targets[i] == targets[j] {
                    conflicts.push(Conflict::pair(
                        i,
                        j,
                        format!(
                            "vertex conflict between agents {i} and {j} at {}",
                            targets[i]
                        ),
                    ));
                }
                if prev[i].location != prev[j].location
                    && targets[i] == prev[j].location
                    && targets[j] == prev[i].location
                {
                    conflicts.push(Conflict::pair(
                        i,
                        j,
                        format!("edge conflict between agents {i} and {j}"),
                    ));
                }
            }
        }

        conflicts
    }

    pub fn is_valid(&self, prev: &[AgentState], actions: &[Action]) -> bool {
        self.validate(prev, actions).is_empty()
    }
}
