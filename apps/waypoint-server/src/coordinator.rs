//! The per-timestep coordination pipeline.
//!
//! One `plan_step` call runs the full cycle: session bootstrap, pickup and
//! delivery progression, assignment, environment snapshot, bounded planner
//! invocation, validity gate, execution, cost update, advance, checkpoint.
//! The planner is the only component allowed to burn time or fail; every
//! failure mode collapses to a joint wait so session state never corrupts.

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use tracing::{info, warn};

use waypoint_core::action_model::ActionModel;
use waypoint_core::assigner::Assigner;
use waypoint_core::env::SharedEnvironment;
use waypoint_core::grid::Grid;
use waypoint_core::planner::Planner;
use waypoint_core::session::{ErrorRecord, SessionState};
use waypoint_core::store::TaskStore;
use waypoint_core::types::{Action, AgentState, CellIndex};

use crate::dto::{
    AddTaskRequest, AddTaskResponse, AgentActionDto, AgentTaskStatus, CurrentTaskDto,
    PlanResponse,
};
use crate::error::ApiError;
use crate::report::Report;

const DEFAULT_CHECKPOINT_PATH: &str = "test.json";

/// Owns the session, the task store, and the planner. Every mutating
/// endpoint runs through one instance behind the session mutex.
pub struct Coordinator {
    grid: Arc<Grid>,
    action_model: ActionModel,
    planner: Arc<dyn Planner>,
    assigner: Assigner,
    session: SessionState,
    tasks: TaskStore,
    /// Authoritative start poses from the problem configuration, adopted on
    /// the first `/plan` after a reset.
    start_states: Option<Vec<AgentState>>,
    plan_time_limit: Duration,
    task_file: Option<PathBuf>,
    checkpoint_path: PathBuf,
}

impl Coordinator {
    pub fn new(
        grid: Arc<Grid>,
        planner: Arc<dyn Planner>,
        assigner: Assigner,
        tasks: TaskStore,
        start_states: Option<Vec<AgentState>>,
        plan_time_limit: Duration,
    ) -> Self {
        let action_model = ActionModel::new(Arc::clone(&grid));
        Self {
            grid,
            action_model,
            planner,
            assigner,
            session: SessionState::new(),
            tasks,
            start_states,
            plan_time_limit,
            task_file: None,
            checkpoint_path: PathBuf::from(DEFAULT_CHECKPOINT_PATH),
        }
    }

    /// Persist admitted tasks to this file on `/add_task`.
    pub fn with_task_file(mut self, path: PathBuf) -> Self {
        self.task_file = Some(path);
        self
    }

    /// Write the per-step report checkpoint here instead of `test.json`.
    pub fn with_checkpoint_path(mut self, path: PathBuf) -> Self {
        self.checkpoint_path = path;
        self
    }

    pub fn grid(&self) -> &Grid {
        &self.grid
    }

    pub fn session(&self) -> &SessionState {
        &self.session
    }

    pub fn tasks(&self) -> &TaskStore {
        &self.tasks
    }

    /// Run one plan cycle.
    pub async fn plan_step(&mut self, reported: Vec<AgentState>) -> Result<PlanResponse, ApiError> {
        if reported.is_empty() {
            return Err(ApiError::InvalidRequest(
                "planning request contains no agents".to_string(),
            ));
        }

        if !self.session.active {
            let initial = match &self.start_states {
                Some(states) if !states.is_empty() => states.clone(),
                _ => reported.clone(),
            };
            if reported.len() != initial.len() {
                return Err(ApiError::InvalidRequest(format!(
                    "expected {} agents, got {}",
                    initial.len(),
                    reported.len()
                )));
            }
            self.session.start(&initial);
            self.tasks.bind_team(initial.len());
            info!(team_size = initial.len(), "session started");
        } else if reported.len() != self.session.team_size {
            return Err(ApiError::InvalidRequest(format!(
                "expected {} agents, got {}",
                self.session.team_size,
                reported.len()
            )));
        }

        let team_size = self.session.team_size;
        let timestep = self.session.timestep;

        // Pickup and delivery progression on the observed state.
        for agent in 0..team_size {
            let location = self.session.current_states[agent].location;
            let Some((head_start, head_goal)) = self.head_locations(agent) else {
                continue;
            };
            if !self.tasks.is_carrying(agent) && location == head_start {
                self.tasks.set_carrying(agent, true);
            }
            if self.tasks.is_carrying(agent) && location == head_goal {
                self.tasks.pop_delivered(agent, timestep);
            }
        }

        self.assigner.run(
            &mut self.tasks,
            &self.session.current_states,
            &self.grid,
            timestep,
        );

        let env = self.build_env();
        let goals: Vec<CellIndex> = env
            .goal_locations
            .iter()
            .map(|agent_goals| agent_goals[0].0)
            .collect();

        // Bounded planner invocation. Timeout, panic, error, and wrong arity
        // all collapse to a joint wait.
        let planner = Arc::clone(&self.planner);
        let plan_env = env.clone();
        let started = Instant::now();
        let outcome = tokio::time::timeout(
            self.plan_time_limit,
            tokio::task::spawn_blocking(move || planner.plan(&plan_env)),
        )
        .await;
        let plan_time = started.elapsed().as_secs_f64();

        let proposed = match outcome {
            Ok(Ok(Ok(actions))) if actions.len() == team_size => Ok(actions),
            Ok(Ok(Ok(actions))) => Err(format!(
                "planner returned {} actions for {team_size} agents",
                actions.len()
            )),
            Ok(Ok(Err(err))) => Err(err.to_string()),
            Ok(Err(join_err)) => Err(format!("planner task aborted: {join_err}")),
            Err(_) => Err(format!(
                "planner exceeded the {:.1}s time limit",
                self.plan_time_limit.as_secs_f64()
            )),
        };

        let (planned, executed) = match proposed {
            Ok(actions) => {
                let conflicts = self
                    .action_model
                    .validate(&self.session.current_states, &actions);
                if conflicts.is_empty() {
                    (actions.clone(), actions)
                } else {
                    warn!(
                        timestep,
                        conflicts = conflicts.len(),
                        "joint action rejected; substituting waits"
                    );
                    self.session.mark_invalid();
                    for conflict in conflicts {
                        self.session.record_error(ErrorRecord {
                            agent_a: conflict.agent_a,
                            agent_b: conflict.agent_b,
                            timestep,
                            message: conflict.message,
                        });
                    }
                    (actions, vec![Action::W; team_size])
                }
            }
            Err(message) => {
                warn!(timestep, %message, "planner failure; substituting waits");
                self.session.mark_invalid();
                self.session.record_error(ErrorRecord {
                    agent_a: -1,
                    agent_b: -1,
                    timestep,
                    message,
                });
                (vec![Action::NA; team_size], vec![Action::W; team_size])
            }
        };

        let next_states = self
            .action_model
            .result_states(&self.session.current_states, &executed);

        // Delivery detection on the post-move state. A single-visit task
        // auto-satisfies its pickup phase on arrival.
        for agent in 0..team_size {
            let Some((head_start, head_goal)) = self.head_locations(agent) else {
                continue;
            };
            let single_visit = head_start == head_goal;
            if next_states[agent].location == head_goal
                && (self.tasks.is_carrying(agent) || single_visit)
            {
                self.tasks.pop_delivered(agent, timestep);
            }
        }

        for agent in 0..team_size {
            if goals[agent] != self.session.current_states[agent].location {
                self.session.bump_cost(agent);
            }
        }

        self.session
            .advance(planned, executed.clone(), next_states.clone(), plan_time);

        self.write_checkpoint();

        Ok(PlanResponse {
            status: "success",
            timestep: self.session.timestep,
            actions: executed
                .iter()
                .zip(&next_states)
                .enumerate()
                .map(|(agent, (action, state))| AgentActionDto {
                    agent_id: agent,
                    action: action.as_char(),
                    location: state.location,
                    orientation: state.orientation.index(),
                })
                .collect(),
            task_status: self.task_status_entries(),
            tasks_remaining: self.tasks.pending_len(),
            total_tasks_completed: self.tasks.num_finished(),
            all_tasks_finished: self.tasks.all_tasks_finished(),
        })
    }

    /// Admit a task from `/add_task`. No planning happens here.
    pub fn add_task(&mut self, request: AddTaskRequest) -> Result<AddTaskResponse, ApiError> {
        let (start, goal) = request.locations();
        for location in [start, goal] {
            if !self.grid.in_bounds(location) {
                return Err(ApiError::InvalidRequest(format!(
                    "location {location} is outside the {}x{} map",
                    self.grid.rows, self.grid.cols
                )));
            }
            if self.grid.is_obstacle(location) {
                return Err(ApiError::InvalidRequest(format!(
                    "location {location} is an obstacle"
                )));
            }
        }

        let task_id = self.tasks.admit(start, goal);
        info!(task_id, start, goal, "task admitted");
        if let Some(path) = &self.task_file {
            if let Err(err) = waypoint_config::write_task_file(path, self.tasks.definitions()) {
                warn!(path = %path.display(), %err, "failed to persist task file");
            }
        }

        Ok(AddTaskResponse {
            status: "success",
            task_id,
            location: goal,
            tasks_in_queue: self.tasks.pending_len(),
        })
    }

    /// Clear the session and re-prime the task queue from the admitted
    /// definitions.
    pub fn reset(&mut self) {
        self.session.reset();
        self.tasks.reset_preserving_definitions();
        info!("session reset");
    }

    pub fn report(&self) -> Result<Report, ApiError> {
        self.require_active()?;
        Ok(Report::build(&self.session, &self.tasks, &self.grid))
    }

    pub fn task_status(&self) -> Result<Vec<AgentTaskStatus>, ApiError> {
        self.require_active()?;
        Ok(self.task_status_entries())
    }

    fn require_active(&self) -> Result<(), ApiError> {
        if self.session.active {
            Ok(())
        } else {
            Err(ApiError::NoActiveSession(
                "no simulation data yet; send a /plan request first".to_string(),
            ))
        }
    }

    fn head_locations(&self, agent: usize) -> Option<(CellIndex, CellIndex)> {
        self.tasks
            .head_assigned(agent)
            .map(|task| (task.start_location, task.goal_location))
    }

    fn build_env(&self) -> SharedEnvironment {
        let team_size = self.session.team_size;
        let mut goal_locations = Vec::with_capacity(team_size);
        for agent in 0..team_size {
            let goals = match self.tasks.head_assigned(agent) {
                Some(task) => {
                    let goal = if self.tasks.is_carrying(agent) {
                        task.goal_location
                    } else {
                        task.start_location
                    };
                    vec![(goal, task.t_assigned)]
                }
                None => vec![(
                    self.session.current_states[agent].location,
                    self.session.timestep,
                )],
            };
            goal_locations.push(goals);
        }
        SharedEnvironment {
            grid: Arc::clone(&self.grid),
            num_of_agents: team_size,
            curr_timestep: self.session.timestep,
            curr_states: self.session.current_states.clone(),
            goal_locations,
        }
    }

    fn task_status_entries(&self) -> Vec<AgentTaskStatus> {
        (0..self.session.team_size)
            .map(|agent| {
                let head = self.tasks.head_assigned(agent);
                let has_task = head.is_some();
                AgentTaskStatus {
                    agent_id: agent,
                    has_task,
                    is_carrying_task: has_task.then(|| self.tasks.is_carrying(agent)),
                    current_task: head.map(|task| {
                        if task.is_single_visit() {
                            CurrentTaskDto {
                                task_id: task.task_id,
                                location: Some(task.goal_location),
                                start_location: None,
                                goal_location: None,
                                assigned_at: task.t_assigned,
                            }
                        } else {
                            CurrentTaskDto {
                                task_id: task.task_id,
                                location: None,
                                start_location: Some(task.start_location),
                                goal_location: Some(task.goal_location),
                                assigned_at: task.t_assigned,
                            }
                        }
                    }),
                    tasks_completed: self.tasks.finished_count(agent),
                }
            })
            .collect()
    }

    fn write_checkpoint(&self) {
        let report = Report::build(&self.session, &self.tasks, &self.grid);
        match serde_json::to_string_pretty(&report) {
            Ok(body) => {
                if let Err(err) = std::fs::write(&self.checkpoint_path, body) {
                    warn!(
                        path = %self.checkpoint_path.display(),
                        %err,
                        "failed to write report checkpoint"
                    );
                }
            }
            Err(err) => warn!(%err, "failed to serialize report checkpoint"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use waypoint_core::assigner::AssignmentStrategy;
    use waypoint_core::planner::PlanError;
    use waypoint_core::types::Orientation;
    use waypoint_planners::NaivePlanner;

    struct SleepyPlanner {
        delay: Duration,
    }

    impl Planner for SleepyPlanner {
        fn initialize(&mut self, _limit: Duration) -> Result<(), PlanError> {
            Ok(())
        }

        fn plan(&self, env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
            std::thread::sleep(self.delay);
            Ok(vec![Action::W; env.num_of_agents])
        }
    }

    struct FailingPlanner;

    impl Planner for FailingPlanner {
        fn initialize(&mut self, _limit: Duration) -> Result<(), PlanError> {
            Ok(())
        }

        fn plan(&self, _env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
            Err(PlanError::Plan("solver blew up".to_string()))
        }
    }

    struct ShortPlanner;

    impl Planner for ShortPlanner {
        fn initialize(&mut self, _limit: Duration) -> Result<(), PlanError> {
            Ok(())
        }

        fn plan(&self, _env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
            Ok(Vec::new())
        }
    }

    struct ForwardPlanner;

    impl Planner for ForwardPlanner {
        fn initialize(&mut self, _limit: Duration) -> Result<(), PlanError> {
            Ok(())
        }

        fn plan(&self, env: &SharedEnvironment) -> Result<Vec<Action>, PlanError> {
            Ok(vec![Action::FW; env.num_of_agents])
        }
    }

    fn make_coordinator(
        planner: Arc<dyn Planner>,
        grid: Grid,
        definitions: Vec<(usize, usize)>,
        starts: Option<Vec<AgentState>>,
        dir: &tempfile::TempDir,
    ) -> Coordinator {
        Coordinator::new(
            Arc::new(grid),
            planner,
            Assigner::new(AssignmentStrategy::Greedy, 1),
            TaskStore::from_definitions(definitions),
            starts,
            Duration::from_secs(1),
        )
        .with_checkpoint_path(dir.path().join("test.json"))
    }

    fn agent(location: usize) -> AgentState {
        AgentState::new(location, Orientation::East, 0)
    }

    #[test]
    fn test_single_visit_completion_on_3x3() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                vec![(2, 2)],
                Some(vec![agent(0)]),
                &dir,
            );

            let first = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(first.timestep, 1);
            assert_eq!(first.actions[0].action, 'F');
            assert_eq!(first.actions[0].location, 1);
            assert!(!first.all_tasks_finished);

            let second = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(second.timestep, 2);
            assert_eq!(second.actions[0].action, 'F');
            assert_eq!(second.actions[0].location, 2);
            assert_eq!(second.total_tasks_completed, 1);
            assert!(second.all_tasks_finished);

            let session = coordinator.session();
            assert_eq!(session.executed[0], vec![Action::FW, Action::FW]);
            assert_eq!(session.sum_of_cost(), 2);
            assert_eq!(session.makespan(), 2);
            assert!(session.all_valid);

            let report = coordinator.report().unwrap();
            assert_eq!(report.all_valid, "Yes");
            assert_eq!(report.num_task_finished, 1);
            assert_eq!(report.actual_paths, vec!["F,F".to_string()]);

            let checkpoint = std::fs::read_to_string(dir.path().join("test.json")).unwrap();
            let value: serde_json::Value = serde_json::from_str(&checkpoint).unwrap();
            assert_eq!(value["teamSize"], 1);
            assert_eq!(value["numTaskFinished"], 1);
        });
    }

    #[test]
    fn test_planner_deadline_substitutes_waits() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = Coordinator::new(
                Arc::new(Grid::unobstructed(3, 3)),
                Arc::new(SleepyPlanner {
                    delay: Duration::from_millis(600),
                }),
                Assigner::new(AssignmentStrategy::Greedy, 1),
                TaskStore::from_definitions(vec![(2, 2)]),
                Some(vec![agent(0)]),
                Duration::from_millis(100),
            )
            .with_checkpoint_path(dir.path().join("test.json"));

            let started = Instant::now();
            let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert!(started.elapsed() < Duration::from_millis(500));

            assert_eq!(response.status, "success");
            assert_eq!(response.timestep, 1);
            assert!(response.actions.iter().all(|action| action.action == 'W'));

            let session = coordinator.session();
            assert!(!session.all_valid);
            assert_eq!(session.planned[0], vec![Action::NA]);
            assert_eq!(session.executed[0], vec![Action::W]);
            assert_eq!(session.errors.len(), 1);
            assert_eq!(coordinator.report().unwrap().all_valid, "No");
        });
    }

    #[test]
    fn test_planner_error_and_short_arity_substitute_waits() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            for planner in [
                Arc::new(FailingPlanner) as Arc<dyn Planner>,
                Arc::new(ShortPlanner) as Arc<dyn Planner>,
            ] {
                let mut coordinator = make_coordinator(
                    planner,
                    Grid::unobstructed(3, 3),
                    vec![(2, 2)],
                    Some(vec![agent(0)]),
                    &dir,
                );
                let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
                assert_eq!(response.actions[0].action, 'W');
                assert_eq!(response.actions[0].location, 0);
                assert_eq!(coordinator.session().planned[0], vec![Action::NA]);
                assert!(!coordinator.session().all_valid);
            }
        });
    }

    #[test]
    fn test_invalid_joint_action_is_rejected() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            // Two agents facing each other on a 1x2 strip; joint forward is
            // an edge conflict.
            let starts = vec![
                AgentState::new(0, Orientation::East, 0),
                AgentState::new(1, Orientation::West, 0),
            ];
            let mut coordinator = make_coordinator(
                Arc::new(ForwardPlanner),
                Grid::unobstructed(1, 2),
                Vec::new(),
                Some(starts.clone()),
                &dir,
            );

            let response = coordinator.plan_step(starts.clone()).await.unwrap();
            assert!(response.actions.iter().all(|action| action.action == 'W'));
            assert_eq!(response.actions[0].location, 0);
            assert_eq!(response.actions[1].location, 1);

            let session = coordinator.session();
            assert!(!session.all_valid);
            // The planner's output is kept in the planned log.
            assert_eq!(session.planned[0], vec![Action::FW]);
            assert_eq!(session.executed[0], vec![Action::W]);
            assert!(!session.errors.is_empty());
        });
    }

    #[test]
    fn test_add_task_persists_and_gets_assigned() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let task_file = dir.path().join("tasks.txt");
            waypoint_config::write_task_file(&task_file, &[(2, 2)]).unwrap();
            let definitions = waypoint_config::read_task_file(&task_file).unwrap();

            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                definitions,
                Some(vec![agent(0)]),
                &dir,
            )
            .with_task_file(task_file.clone());

            coordinator.plan_step(vec![agent(0)]).await.unwrap();

            let added = coordinator
                .add_task(AddTaskRequest::Single { location: 6 })
                .unwrap();
            assert_eq!(added.task_id, 1);
            assert_eq!(added.location, 6);
            assert_eq!(added.tasks_in_queue, 1);

            let on_disk = waypoint_config::read_task_file(&task_file).unwrap();
            assert_eq!(on_disk, vec![(2, 2), (6, 6)]);

            // The next assignment pass hands the new task to the only agent
            // once it finishes the first one.
            let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(response.total_tasks_completed, 1);
            let third = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(third.tasks_remaining, 0);
            assert!(third.task_status[0].has_task);
        });
    }

    #[test]
    fn test_add_task_rejects_bad_locations() {
        let dir = tempfile::tempdir().unwrap();
        let mut grid = Grid::unobstructed(3, 3);
        grid.map[4] = true;
        let mut coordinator = make_coordinator(
            Arc::new(NaivePlanner::new()),
            grid,
            Vec::new(),
            None,
            &dir,
        );

        assert!(matches!(
            coordinator.add_task(AddTaskRequest::Single { location: 99 }),
            Err(ApiError::InvalidRequest(_))
        ));
        assert!(matches!(
            coordinator.add_task(AddTaskRequest::Pair {
                start_location: 0,
                goal_location: 4
            }),
            Err(ApiError::InvalidRequest(_))
        ));
    }

    #[test]
    fn test_reset_clears_and_reprimes() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                vec![(2, 2)],
                Some(vec![agent(0)]),
                &dir,
            );

            coordinator.plan_step(vec![agent(0)]).await.unwrap();
            coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(coordinator.tasks().num_finished(), 1);

            coordinator.reset();
            assert!(!coordinator.session().active);
            assert_eq!(coordinator.session().timestep, 0);
            assert_eq!(coordinator.tasks().pending_len(), 1);
            assert_eq!(coordinator.tasks().pending_front().unwrap().task_id, 0);
            assert!(matches!(
                coordinator.report(),
                Err(ApiError::NoActiveSession(_))
            ));

            let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert_eq!(response.timestep, 1);
            assert_eq!(coordinator.session().initial_states[0].location, 0);
        });
    }

    #[test]
    fn test_two_phase_pickup_and_delivery() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(1, 8),
                vec![(3, 7)],
                Some(vec![agent(0)]),
                &dir,
            );

            // Three steps to reach the pickup cell.
            for _ in 0..3 {
                let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
                assert_eq!(response.total_tasks_completed, 0);
            }
            assert_eq!(coordinator.session().current_states[0].location, 3);
            assert!(!coordinator.tasks().is_carrying(0));

            // The next call observes the agent at the pickup and flips the
            // carrying flag without popping the task.
            let response = coordinator.plan_step(vec![agent(0)]).await.unwrap();
            assert!(coordinator.tasks().is_carrying(0));
            assert_eq!(response.total_tasks_completed, 0);
            let status = coordinator.task_status().unwrap();
            assert_eq!(status[0].is_carrying_task, Some(true));
            let current = status[0].current_task.as_ref().unwrap();
            assert_eq!(current.start_location, Some(3));
            assert_eq!(current.goal_location, Some(7));

            // Three more steps to the delivery cell.
            for _ in 0..3 {
                coordinator.plan_step(vec![agent(0)]).await.unwrap();
            }
            assert_eq!(coordinator.session().current_states[0].location, 7);
            assert_eq!(coordinator.tasks().num_finished(), 1);
            assert!(!coordinator.tasks().is_carrying(0));

            let delivered = &coordinator.tasks().history()[0];
            assert!(delivered.t_assigned <= coordinator.session().timestep);
        });
    }

    #[test]
    fn test_bootstrap_adopts_reported_states_without_config() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                Vec::new(),
                None,
                &dir,
            );

            let reported = vec![AgentState::new(4, Orientation::South, 0)];
            coordinator.plan_step(reported.clone()).await.unwrap();
            assert_eq!(coordinator.session().initial_states, reported);
        });
    }

    #[test]
    fn test_arity_mismatch_is_rejected() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                Vec::new(),
                Some(vec![agent(0)]),
                &dir,
            );

            let result = coordinator.plan_step(vec![agent(0), agent(1)]).await;
            assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
            assert!(!coordinator.session().active);

            coordinator.plan_step(vec![agent(0)]).await.unwrap();
            let result = coordinator.plan_step(vec![agent(0), agent(1)]).await;
            assert!(matches!(result, Err(ApiError::InvalidRequest(_))));
            assert_eq!(coordinator.session().timestep, 1);
        });
    }

    #[test]
    fn test_report_is_stable_between_calls() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                vec![(2, 2)],
                Some(vec![agent(0)]),
                &dir,
            );
            coordinator.plan_step(vec![agent(0)]).await.unwrap();

            let first = serde_json::to_string(&coordinator.report().unwrap()).unwrap();
            let second = serde_json::to_string(&coordinator.report().unwrap()).unwrap();
            assert_eq!(first, second);
        });
    }

    #[test]
    fn test_trajectory_logs_stay_in_lockstep() {
        tokio_test::block_on(async {
            let dir = tempfile::tempdir().unwrap();
            let mut coordinator = make_coordinator(
                Arc::new(NaivePlanner::new()),
                Grid::unobstructed(3, 3),
                vec![(2, 2), (6, 6), (8, 8)],
                Some(vec![agent(0)]),
                &dir,
            );

            for _ in 0..6 {
                coordinator.plan_step(vec![agent(0)]).await.unwrap();
                let session = coordinator.session();
                let timestep = session.timestep as usize;
                assert_eq!(session.planned[0].len(), timestep);
                assert_eq!(session.executed[0].len(), timestep);
                assert_eq!(session.planning_times.len(), timestep);
                assert!(session.solution_costs[0] <= session.timestep);
            }
        });
    }
}
