use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::{Duration, Instant};

use anyhow::Context;
use clap::Parser;
use tokio::sync::Mutex;
use tracing::{error, info};

use waypoint_core::assigner::{Assigner, AssignmentStrategy};
use waypoint_core::grid::Grid;
use waypoint_core::planner::Planner;
use waypoint_core::store::TaskStore;
use waypoint_core::types::{AgentState, Orientation};
use waypoint_server::coordinator::Coordinator;
use waypoint_server::{run_server, AppState, ServerInfo};

const EXIT_PREPROCESS_TIMEOUT: i32 = 124;

#[derive(Debug, Parser)]
#[command(name = "waypoint-server", about = "Lifelong MAPF coordination server")]
struct Args {
    /// Map file path
    #[arg(long = "mapFile", short = 'm')]
    map_file: PathBuf,
    /// Problem configuration file path
    #[arg(long = "configFile", short = 'c')]
    config_file: PathBuf,
    /// Server port
    #[arg(long, short = 'p', default_value_t = 8080)]
    port: u16,
    /// Planner preprocessing time limit in seconds
    #[arg(long = "preprocessTimeLimit", default_value_t = 30)]
    preprocess_time_limit: u64,
}

extern "C" fn fatal_signal_handler(_signal: libc::c_int) {
    // Only async-signal-safe work is allowed here.
    unsafe { libc::_exit(1) }
}

/// A crash inside the foreign planner is not recoverable; exit 1
/// deterministically instead of masking it.
fn install_fatal_signal_handlers() {
    unsafe {
        libc::signal(libc::SIGSEGV, fatal_signal_handler as libc::sighandler_t);
        libc::signal(libc::SIGABRT, fatal_signal_handler as libc::sighandler_t);
    }
}

fn init_tracing() {
    let filter = tracing_subscriber::EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| tracing_subscriber::EnvFilter::new("info"));
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .try_init();
}

async fn initialize_planner(
    kind: &str,
    preprocess_time_limit: Duration,
) -> anyhow::Result<Arc<dyn Planner>> {
    let mut planner = waypoint_planners::create_planner(kind)?;
    let handle =
        tokio::task::spawn_blocking(move || planner.initialize(preprocess_time_limit).map(|_| planner));
    match tokio::time::timeout(preprocess_time_limit, handle).await {
        Ok(Ok(Ok(planner))) => Ok(Arc::from(planner)),
        Ok(Ok(Err(err))) => Err(err.into()),
        Ok(Err(join_err)) => Err(anyhow::anyhow!("planner initialization aborted: {join_err}")),
        Err(_) => {
            error!(
                limit_secs = preprocess_time_limit.as_secs(),
                "planner preprocessing exceeded its time limit"
            );
            std::process::exit(EXIT_PREPROCESS_TIMEOUT);
        }
    }
}

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    init_tracing();
    let args = Args::parse();

    let grid = Arc::new(
        Grid::load(&args.map_file)
            .with_context(|| format!("load map file {}", args.map_file.display()))?,
    );
    info!(
        map = %args.map_file.display(),
        rows = grid.rows,
        cols = grid.cols,
        "map loaded"
    );

    let config = waypoint_config::load_config(&args.config_file)
        .with_context(|| format!("load config file {}", args.config_file.display()))?;

    let start_states = match &config.agent_file {
        Some(path) => {
            let locations = waypoint_config::read_agent_file(path)
                .with_context(|| format!("load agent file {}", path.display()))?;
            if locations.len() != config.team_size {
                anyhow::bail!(
                    "agent file lists {} agents but teamSize is {}",
                    locations.len(),
                    config.team_size
                );
            }
            for &location in &locations {
                if !grid.is_traversable(location) {
                    anyhow::bail!("agent start location {location} is blocked or out of bounds");
                }
            }
            Some(
                locations
                    .into_iter()
                    .map(|location| AgentState::new(location, Orientation::East, 0))
                    .collect::<Vec<_>>(),
            )
        }
        None => None,
    };

    let definitions = match &config.task_file {
        Some(path) => {
            let definitions = waypoint_config::read_task_file(path)
                .with_context(|| format!("load task file {}", path.display()))?;
            for &(start, goal) in &definitions {
                if !grid.is_traversable(start) || !grid.is_traversable(goal) {
                    anyhow::bail!("task ({start}, {goal}) touches a blocked or out-of-bounds cell");
                }
            }
            definitions
        }
        None => Vec::new(),
    };
    info!(tasks = definitions.len(), "task definitions loaded");

    let strategy: AssignmentStrategy = config.task_assignment_strategy.parse()?;
    let assigner = Assigner::new(strategy, config.num_tasks_reveal);
    let tasks = TaskStore::from_definitions(definitions);

    // The foreign planner reads its own settings from this variable.
    std::env::set_var("CONFIG_PATH", &args.config_file);
    let planner = initialize_planner(
        &config.planner,
        Duration::from_secs(args.preprocess_time_limit),
    )
    .await?;
    info!(planner = %config.planner, "planner initialized");

    install_fatal_signal_handlers();

    let mut coordinator = Coordinator::new(
        Arc::clone(&grid),
        planner,
        assigner,
        tasks,
        start_states,
        Duration::from_secs_f64(config.plan_time_limit),
    );
    if let Some(path) = config.task_file.clone() {
        coordinator = coordinator.with_task_file(path);
    }

    let state = AppState {
        coordinator: Arc::new(Mutex::new(coordinator)),
        info: Arc::new(ServerInfo {
            map_file: args.map_file.display().to_string(),
            rows: grid.rows,
            cols: grid.cols,
            port: args.port,
            started_at: Instant::now(),
        }),
    };

    let listen = SocketAddr::from(([0, 0, 0, 0], args.port));
    run_server(state, listen).await
}
