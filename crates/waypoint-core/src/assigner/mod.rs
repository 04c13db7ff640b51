//! Task assignment policies.
//!
//! A policy moves pending tasks onto agents' queues, bounded by the
//! `num_tasks_reveal` lookahead. The policy is chosen once at session start
//! and never changes mid-session.

use std::str::FromStr;

use thiserror::Error;

use crate::grid::Grid;
use crate::store::TaskStore;
use crate::types::{AgentState, CellIndex};

#[derive(Debug, Clone, Error)]
#[error("unknown task assignment strategy '{0}'")]
pub struct ParseStrategyError(String);

/// How pending tasks are matched to free agents.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AssignmentStrategy {
    /// FIFO queue drained by agents in ascending id order.
    Greedy,
    /// Head task goes to the Manhattan-nearest free agent, ties to the
    /// lowest id.
    Nearest,
    /// Task `i` is pre-bound to agent `i mod team_size` and waits for it.
    RoundRobinFixed,
}

impl FromStr for AssignmentStrategy {
    type Err = ParseStrategyError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value.trim().to_ascii_lowercase().as_str() {
            "greedy" => Ok(Self::Greedy),
            "nearest" => Ok(Self::Nearest),
            "roundrobin" | "roundrobin_fixed" => Ok(Self::RoundRobinFixed),
            other => Err(ParseStrategyError(other.to_string())),
        }
    }
}

/// Runs one assignment pass per timestep under the configured policy.
#[derive(Debug, Clone)]
pub struct Assigner {
    strategy: AssignmentStrategy,
    num_tasks_reveal: usize,
}

impl Assigner {
    pub fn new(strategy: AssignmentStrategy, num_tasks_reveal: usize) -> Self {
        Self {
            strategy,
            num_tasks_reveal: num_tasks_reveal.max(1),
        }
    }

    pub fn strategy(&self) -> AssignmentStrategy {
        self.strategy
    }

    /// Move zero or more pending tasks to agents' queues.
    pub fn run(
        &self,
        store: &mut TaskStore,
        current_states: &[AgentState],
        grid: &Grid,
        timestep: i32,
    ) {
        match self.strategy {
            AssignmentStrategy::Greedy => self.run_greedy(store, timestep),
            AssignmentStrategy::Nearest => {
                self.run_nearest(store, current_states, grid, timestep)
            }
            AssignmentStrategy::RoundRobinFixed => self.run_round_robin(store, timestep),
        }
    }

    fn run_greedy(&self, store: &mut TaskStore, timestep: i32) {
        for agent in 0..store.team_size() {
            while store.is_free(agent, self.num_tasks_reveal) {
                match store.pop_pending() {
                    Some(task) => store.assign(agent, task, timestep),
                    None => return,
                }
            }
        }
    }

    fn run_nearest(
        &self,
        store: &mut TaskStore,
        current_states: &[AgentState],
        grid: &Grid,
        timestep: i32,
    ) {
        while let Some(start) = store.pending_front().map(|task| task.start_location) {
            let nearest = (0..store.team_size())
                .filter(|&agent| store.is_free(agent, self.num_tasks_reveal))
                .min_by_key(|&agent| {
                    (
                        manhattan_distance(grid, start, current_states[agent].location),
                        agent,
                    )
                });
            let Some(agent) = nearest else { break };
            if let Some(task) = store.pop_pending() {
                store.assign(agent, task, timestep);
            }
        }
    }

    fn run_round_robin(&self, store: &mut TaskStore, timestep: i32) {
        let team_size = store.team_size();
        if team_size == 0 {
            return;
        }
        let mut capacity: Vec<usize> = (0..team_size)
            .map(|agent| {
                self.num_tasks_reveal
                    .saturating_sub(store.assigned_count(agent))
            })
            .collect();
        let mut deliverable = Vec::new();
        for task in store.pending_iter() {
            let agent = task.task_id as usize % team_size;
            if capacity[agent] > 0 {
                capacity[agent] -= 1;
                deliverable.push((task.task_id, agent));
            }
        }
        for (task_id, agent) in deliverable {
            if let Some(task) = store.take_pending(task_id) {
                store.assign(agent, task, timestep);
            }
        }
    }
}

fn manhattan_distance(grid: &Grid, a: CellIndex, b: CellIndex) -> usize {
    grid.row_of(a).abs_diff(grid.row_of(b)) + grid.col_of(a).abs_diff(grid.col_of(b))
}
