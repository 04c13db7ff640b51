//! Canonical session report.

use serde::Serialize;

use waypoint_core::grid::Grid;
use waypoint_core::session::SessionState;
use waypoint_core::store::TaskStore;
use waypoint_core::types::Action;

/// The cumulative report served by `/report` and checkpointed to disk.
/// Field names follow the established evaluation format.
#[derive(Debug, Clone, Serialize)]
pub struct Report {
    #[serde(rename = "actionModel")]
    pub action_model: &'static str,
    #[serde(rename = "AllValid")]
    pub all_valid: &'static str,
    #[serde(rename = "teamSize")]
    pub team_size: usize,
    /// Initial agent poses as `[row, col, orientation character]`.
    pub start: Vec<(usize, usize, char)>,
    #[serde(rename = "numTaskFinished")]
    pub num_task_finished: usize,
    #[serde(rename = "sumOfCost")]
    pub sum_of_cost: i32,
    pub makespan: i32,
    /// Comma-joined executed actions, one string per agent.
    #[serde(rename = "actualPaths")]
    pub actual_paths: Vec<String>,
    /// Comma-joined planner outputs, one string per agent.
    #[serde(rename = "plannerPaths")]
    pub planner_paths: Vec<String>,
    #[serde(rename = "plannerTimes")]
    pub planner_times: Vec<f64>,
    /// `[agent_a, agent_b, timestep, message]` rows.
    pub errors: Vec<(i32, i32, i32, String)>,
    /// Per-agent `[task_id, timestep, "assigned"|"finished"]` rows.
    pub events: Vec<Vec<(u32, i32, String)>>,
    /// `[task_id, goal_row, goal_col]` rows for every task ever created.
    pub tasks: Vec<(u32, usize, usize)>,
}

impl Report {
    pub fn build(session: &SessionState, tasks: &TaskStore, grid: &Grid) -> Self {
        let start = session
            .initial_states
            .iter()
            .map(|state| {
                (
                    grid.row_of(state.location),
                    grid.col_of(state.location),
                    state.orientation.as_char(),
                )
            })
            .collect();

        let errors = session
            .errors
            .iter()
            .map(|record| {
                (
                    record.agent_a,
                    record.agent_b,
                    record.timestep,
                    record.message.clone(),
                )
            })
            .collect();

        let events = tasks
            .events()
            .iter()
            .map(|agent_events| {
                agent_events
                    .iter()
                    .map(|event| (event.task_id, event.timestep, event.kind.as_str().to_string()))
                    .collect()
            })
            .collect();

        let task_rows = tasks
            .history()
            .iter()
            .map(|task| {
                (
                    task.task_id,
                    grid.row_of(task.goal_location),
                    grid.col_of(task.goal_location),
                )
            })
            .collect();

        Self {
            action_model: "MAPF_T",
            all_valid: if session.all_valid { "Yes" } else { "No" },
            team_size: session.team_size,
            start,
            num_task_finished: tasks.num_finished(),
            sum_of_cost: session.sum_of_cost(),
            makespan: session.makespan(),
            actual_paths: session.executed.iter().map(|path| join_actions(path)).collect(),
            planner_paths: session.planned.iter().map(|path| join_actions(path)).collect(),
            planner_times: session.planning_times.clone(),
            errors,
            events,
            tasks: task_rows,
        }
    }
}

fn join_actions(actions: &[Action]) -> String {
    let mut path = String::with_capacity(actions.len() * 2);
    for (index, action) in actions.iter().enumerate() {
        if index > 0 {
            path.push(',');
        }
        path.push(action.as_char());
    }
    path
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::types::{AgentState, Orientation};

    #[test]
    fn test_join_actions() {
        assert_eq!(join_actions(&[]), "");
        assert_eq!(join_actions(&[Action::FW]), "F");
        assert_eq!(
            join_actions(&[Action::FW, Action::W, Action::NA]),
            "F,W,T"
        );
    }

    #[test]
    fn test_report_shape() {
        let grid = Grid::unobstructed(3, 3);
        let mut session = SessionState::new();
        session.start(&[AgentState::new(4, Orientation::South, 0)]);
        session.advance(
            vec![Action::FW],
            vec![Action::FW],
            vec![AgentState::new(7, Orientation::South, 1)],
            0.002,
        );
        session.bump_cost(0);

        let mut tasks = TaskStore::from_definitions(vec![(7, 7)]);
        tasks.bind_team(1);

        let report = Report::build(&session, &tasks, &grid);
        assert_eq!(report.action_model, "MAPF_T");
        assert_eq!(report.all_valid, "Yes");
        assert_eq!(report.start, vec![(1, 1, 'S')]);
        assert_eq!(report.actual_paths, vec!["F".to_string()]);
        assert_eq!(report.tasks, vec![(0, 2, 1)]);

        let value = serde_json::to_value(&report).unwrap();
        assert_eq!(value["teamSize"], 1);
        assert_eq!(value["sumOfCost"], 1);
        assert_eq!(value["start"][0][2], "S");
    }
}
