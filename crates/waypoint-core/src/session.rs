//! Per-session trajectory and cost bookkeeping.

use crate::types::{Action, AgentState};

/// One fault accumulated for the report's `errors` array. `agent_a` and
/// `agent_b` are -1 for faults not attributable to an agent pair, such as a
/// planner timeout.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ErrorRecord {
    pub agent_a: i32,
    pub agent_b: i32,
    pub timestep: i32,
    pub message: String,
}

/// Cumulative state of one simulation session.
///
/// `planned` and `executed` diverge on any timestep where the planner's
/// output was rejected: `executed` then records waits while `planned` keeps
/// what the planner returned (or `NA` when it returned nothing usable).
#[derive(Debug, Clone)]
pub struct SessionState {
    pub active: bool,
    pub team_size: usize,
    /// Number of completed plan cycles.
    pub timestep: i32,
    pub initial_states: Vec<AgentState>,
    pub current_states: Vec<AgentState>,
    pub planned: Vec<Vec<Action>>,
    pub executed: Vec<Vec<Action>>,
    /// Wall-clock seconds per plan call.
    pub planning_times: Vec<f64>,
    pub solution_costs: Vec<i32>,
    /// True until any executed step had to substitute waits.
    pub all_valid: bool,
    pub errors: Vec<ErrorRecord>,
}

impl Default for SessionState {
    fn default() -> Self {
        Self {
            active: false,
            team_size: 0,
            timestep: 0,
            initial_states: Vec::new(),
            current_states: Vec::new(),
            planned: Vec::new(),
            executed: Vec::new(),
            planning_times: Vec::new(),
            solution_costs: Vec::new(),
            all_valid: true,
            errors: Vec::new(),
        }
    }
}

impl SessionState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Clear every per-session field.
    pub fn reset(&mut self) {
        *self = Self::default();
    }

    /// Begin a session from the given joint start state. The caller ensures
    /// no session is active.
    pub fn start(&mut self, initial: &[AgentState]) {
        debug_assert!(!self.active);
        let team_size = initial.len();
        self.active = true;
        self.team_size = team_size;
        self.timestep = 0;
        self.initial_states = initial.to_vec();
        self.current_states = initial.to_vec();
        self.planned = vec![Vec::new(); team_size];
        self.executed = vec![Vec::new(); team_size];
        self.planning_times = Vec::new();
        self.solution_costs = vec![0; team_size];
        self.all_valid = true;
        self.errors = Vec::new();
    }

    /// Append one completed plan cycle and advance the clock.
    pub fn advance(
        &mut self,
        planned: Vec<Action>,
        executed: Vec<Action>,
        new_states: Vec<AgentState>,
        plan_time: f64,
    ) {
        for (agent, action) in planned.into_iter().enumerate() {
            self.planned[agent].push(action);
        }
        for (agent, action) in executed.into_iter().enumerate() {
            self.executed[agent].push(action);
        }
        self.planning_times.push(plan_time);
        self.current_states = new_states;
        self.timestep += 1;
    }

    pub fn mark_invalid(&mut self) {
        self.all_valid = false;
    }

    pub fn record_error(&mut self, record: ErrorRecord) {
        self.errors.push(record);
    }

    /// Charge one timestep of cost to an agent with a non-trivial goal.
    pub fn bump_cost(&mut self, agent: usize) {
        self.solution_costs[agent] += 1;
    }

    pub fn sum_of_cost(&self) -> i32 {
        self.solution_costs.iter().sum()
    }

    pub fn makespan(&self) -> i32 {
        self.solution_costs.iter().copied().max().unwrap_or(0)
    }
}
