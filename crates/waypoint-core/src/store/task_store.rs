//! Task queue, per-agent assignment queues, and lifecycle history.

use std::collections::VecDeque;

use crate::types::{CellIndex, Task, TaskId};

/// Lifecycle transition recorded for the session report.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TaskEventKind {
    Assigned,
    Finished,
}

impl TaskEventKind {
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Assigned => "assigned",
            Self::Finished => "finished",
        }
    }
}

/// One `(task, timestep, transition)` record for one agent.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TaskEvent {
    pub task_id: TaskId,
    pub timestep: i32,
    pub kind: TaskEventKind,
}

/// Queue of pending tasks plus per-agent assigned/finished queues.
///
/// Per-agent structures are sized by `bind_team` at session bootstrap; every
/// task ever admitted stays in `history` for reporting, and `definitions`
/// remembers the admitted `(start, goal)` pairs so a reset can re-materialize
/// the pending queue with ids restarting from 0.
#[derive(Debug, Default)]
pub struct TaskStore {
    definitions: Vec<(CellIndex, CellIndex)>,
    pending: VecDeque<Task>,
    assigned: Vec<VecDeque<Task>>,
    finished: Vec<Vec<Task>>,
    history: Vec<Task>,
    events: Vec<Vec<TaskEvent>>,
    carrying: Vec<bool>,
    next_task_id: TaskId,
    num_finished: usize,
}

impl TaskStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// Seed the store from `(start, goal)` pairs loaded from a task file.
    pub fn from_definitions(definitions: Vec<(CellIndex, CellIndex)>) -> Self {
        let mut store = Self::default();
        for (start, goal) in definitions {
            store.admit(start, goal);
        }
        store
    }

    /// Allocate the next task id and append the task to the pending queue,
    /// the history, and the definition list.
    pub fn admit(&mut self, start: CellIndex, goal: CellIndex) -> TaskId {
        let task_id = self.next_task_id;
        self.next_task_id += 1;
        let task = Task::new(task_id, start, goal);
        self.definitions.push((start, goal));
        self.history.push(task.clone());
        self.pending.push_back(task);
        task_id
    }

    /// Size the per-agent structures for a new session.
    pub fn bind_team(&mut self, team_size: usize) {
        self.assigned = vec![VecDeque::new(); team_size];
        self.finished = vec![Vec::new(); team_size];
        self.events = vec![Vec::new(); team_size];
        self.carrying = vec![false; team_size];
    }

    pub fn team_size(&self) -> usize {
        self.assigned.len()
    }

    pub fn pending_len(&self) -> usize {
        self.pending.len()
    }

    pub fn pending_front(&self) -> Option<&Task> {
        self.pending.front()
    }

    pub fn pending_iter(&self) -> impl Iterator<Item = &Task> {
        self.pending.iter()
    }

    pub fn pop_pending(&mut self) -> Option<Task> {
        self.pending.pop_front()
    }

    /// Remove a specific pending task, preserving the order of the rest.
    pub fn take_pending(&mut self, task_id: TaskId) -> Option<Task> {
        let index = self.pending.iter().position(|task| task.task_id == task_id)?;
        self.pending.remove(index)
    }

    /// Hand a task to an agent: stamp assignment fields, record the event,
    /// and push it onto the agent's queue.
    pub fn assign(&mut self, agent: usize, mut task: Task, timestep: i32) {
        task.t_assigned = timestep;
        task.agent_assigned = agent as i32;
        self.events[agent].push(TaskEvent {
            task_id: task.task_id,
            timestep,
            kind: TaskEventKind::Assigned,
        });
        self.assigned[agent].push_back(task);
    }

    pub fn head_assigned(&self, agent: usize) -> Option<&Task> {
        self.assigned[agent].front()
    }

    pub fn assigned_count(&self, agent: usize) -> usize {
        self.assigned[agent].len()
    }

    /// Whether the agent can take on another task under the reveal bound.
    pub fn is_free(&self, agent: usize, num_tasks_reveal: usize) -> bool {
        self.assigned[agent].len() < num_tasks_reveal
    }

    pub fn is_carrying(&self, agent: usize) -> bool {
        self.carrying[agent]
    }

    pub fn set_carrying(&mut self, agent: usize, carrying: bool) {
        self.carrying[agent] = carrying;
    }

    /// Pop the head assigned task as delivered at `now`. The caller verifies
    /// the precondition (agent at the goal and carrying).
    pub fn pop_delivered(&mut self, agent: usize, now: i32) -> Option<Task> {
        let mut task = self.assigned[agent].pop_front()?;
        task.t_completed = now;
        self.events[agent].push(TaskEvent {
            task_id: task.task_id,
            timestep: now,
            kind: TaskEventKind::Finished,
        });
        self.carrying[agent] = false;
        self.num_finished += 1;
        self.finished[agent].push(task.clone());
        Some(task)
    }

    pub fn num_finished(&self) -> usize {
        self.num_finished
    }

    pub fn finished_count(&self, agent: usize) -> usize {
        self.finished[agent].len()
    }

    pub fn events(&self) -> &[Vec<TaskEvent>] {
        &self.events
    }

    pub fn history(&self) -> &[Task] {
        &self.history
    }

    pub fn definitions(&self) -> &[(CellIndex, CellIndex)] {
        &self.definitions
    }

    /// Nothing pending and no agent holds a task.
    pub fn all_tasks_finished(&self) -> bool {
        self.pending.is_empty() && self.assigned.iter().all(|queue| queue.is_empty())
    }

    /// Drop all session progress and rebuild the pending queue from the
    /// admitted definitions, in insertion order, with ids restarting at 0.
    pub fn reset_preserving_definitions(&mut self) {
        let definitions = std::mem::take(&mut self.definitions);
        *self = Self::default();
        for (start, goal) in definitions {
            self.admit(start, goal);
        }
    }
}
