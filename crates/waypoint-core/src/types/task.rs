//! Pickup/delivery tasks.

use super::state::CellIndex;

/// Session-scoped task identifier, allocated monotonically from 0.
pub type TaskId = u32;

/// A pickup-and-deliver errand. A task whose start and goal coincide
/// degenerates to a single visit: the pickup phase auto-satisfies on arrival.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Task {
    pub task_id: TaskId,
    pub start_location: CellIndex,
    pub goal_location: CellIndex,
    /// Timestep the task was handed to an agent, -1 while unassigned.
    pub t_assigned: i32,
    /// Timestep the task was delivered, -1 until then.
    pub t_completed: i32,
    /// Agent carrying out the task, -1 while unassigned.
    pub agent_assigned: i32,
}

impl Task {
    pub fn new(task_id: TaskId, start_location: CellIndex, goal_location: CellIndex) -> Self {
        Self {
            task_id,
            start_location,
            goal_location,
            t_assigned: -1,
            t_completed: -1,
            agent_assigned: -1,
        }
    }

    pub fn is_single_visit(&self) -> bool {
        self.start_location == self.goal_location
    }

    pub fn is_delivered(&self) -> bool {
        self.t_completed >= 0
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_new_task_is_unassigned() {
        let task = Task::new(0, 3, 7);
        assert_eq!(task.t_assigned, -1);
        assert_eq!(task.agent_assigned, -1);
        assert!(!task.is_delivered());
        assert!(!task.is_single_visit());
        assert!(Task::new(1, 5, 5).is_single_visit());
    }
}
