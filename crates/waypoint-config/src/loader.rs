//! Configuration loading and validation.

use std::fs;
use std::io::Write;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use waypoint_core::assigner::AssignmentStrategy;
use waypoint_core::types::CellIndex;

/// Planner wall-clock budget per step, in seconds.
pub const DEFAULT_PLAN_TIME_LIMIT: f64 = 5.0;

const DEFAULT_PLANNER: &str = "naive";

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("JSON parse error: {0}")]
    Parse(#[from] serde_json::Error),
    #[error("Invalid config: {0}")]
    Invalid(String),
    #[error("malformed {kind} file, line {line}: {message}")]
    MalformedFile {
        kind: &'static str,
        line: usize,
        message: String,
    },
}

/// Problem description for one server deployment.
#[derive(Debug, Clone, Deserialize)]
#[serde(deny_unknown_fields, rename_all = "camelCase")]
pub struct ProblemConfig {
    pub team_size: usize,
    /// How many tasks an agent may hold at once.
    #[serde(default = "default_num_tasks_reveal")]
    pub num_tasks_reveal: usize,
    #[serde(default = "default_strategy")]
    pub task_assignment_strategy: String,
    #[serde(default)]
    pub agent_file: Option<PathBuf>,
    #[serde(default)]
    pub task_file: Option<PathBuf>,
    /// Planner wall-clock budget per step, in seconds.
    #[serde(default = "default_plan_time_limit")]
    pub plan_time_limit: f64,
    /// Built-in planner name.
    #[serde(default = "default_planner")]
    pub planner: String,
}

fn default_num_tasks_reveal() -> usize {
    1
}

fn default_strategy() -> String {
    "greedy".to_string()
}

fn default_plan_time_limit() -> f64 {
    DEFAULT_PLAN_TIME_LIMIT
}

fn default_planner() -> String {
    DEFAULT_PLANNER.to_string()
}

/// Load and validate a problem configuration. Relative `agentFile` and
/// `taskFile` paths are resolved against the configuration file's directory.
pub fn load_config(path: &Path) -> Result<ProblemConfig, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut config: ProblemConfig = serde_json::from_str(&content)?;
    validate_config(&config)?;

    let base = path.parent().unwrap_or_else(|| Path::new("."));
    config.agent_file = config.agent_file.map(|file| resolve(base, file));
    config.task_file = config.task_file.map(|file| resolve(base, file));
    Ok(config)
}

fn resolve(base: &Path, file: PathBuf) -> PathBuf {
    if file.is_absolute() {
        file
    } else {
        base.join(file)
    }
}

fn validate_config(config: &ProblemConfig) -> Result<(), ConfigError> {
    if config.team_size == 0 {
        return Err(ConfigError::Invalid(
            "teamSize must be greater than 0".to_string(),
        ));
    }
    if config.num_tasks_reveal == 0 {
        return Err(ConfigError::Invalid(
            "numTasksReveal must be greater than 0".to_string(),
        ));
    }
    if config
        .task_assignment_strategy
        .parse::<AssignmentStrategy>()
        .is_err()
    {
        return Err(ConfigError::Invalid(format!(
            "taskAssignmentStrategy '{}' is not one of greedy, nearest, roundrobin, roundrobin_fixed",
            config.task_assignment_strategy
        )));
    }
    if !config.plan_time_limit.is_finite() || config.plan_time_limit <= 0.0 {
        return Err(ConfigError::Invalid(
            "planTimeLimit must be a positive number of seconds".to_string(),
        ));
    }
    Ok(())
}

/// Read an agent file: a count line followed by one start location per line.
/// Lines beginning with `#` are comments.
pub fn read_agent_file(path: &Path) -> Result<Vec<CellIndex>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut lines = meaningful_lines(&content);

    let (line, count) = next_count(&mut lines, "agent")?;
    let mut locations = Vec::with_capacity(count);
    for _ in 0..count {
        let (line_number, text) = lines.next().ok_or_else(|| ConfigError::MalformedFile {
            kind: "agent",
            line,
            message: format!("expected {count} agent lines"),
        })?;
        let location = text.parse().map_err(|_| ConfigError::MalformedFile {
            kind: "agent",
            line: line_number,
            message: format!("invalid location '{text}'"),
        })?;
        locations.push(location);
    }
    Ok(locations)
}

/// Read a task file: a count line followed by one task per line, either a
/// single visit location or a `start goal` pair. Both forms are accepted.
pub fn read_task_file(path: &Path) -> Result<Vec<(CellIndex, CellIndex)>, ConfigError> {
    let content = fs::read_to_string(path)?;
    let mut lines = meaningful_lines(&content);

    let (line, count) = next_count(&mut lines, "task")?;
    let mut tasks = Vec::with_capacity(count);
    for _ in 0..count {
        let (line_number, text) = lines.next().ok_or_else(|| ConfigError::MalformedFile {
            kind: "task",
            line,
            message: format!("expected {count} task lines"),
        })?;
        let fields: Vec<&str> = text.split_whitespace().collect();
        let parse = |field: &str| {
            field
                .parse::<CellIndex>()
                .map_err(|_| ConfigError::MalformedFile {
                    kind: "task",
                    line: line_number,
                    message: format!("invalid location '{field}'"),
                })
        };
        match fields.as_slice() {
            [location] => {
                let location = parse(location)?;
                tasks.push((location, location));
            }
            [start, goal] => tasks.push((parse(start)?, parse(goal)?)),
            _ => {
                return Err(ConfigError::MalformedFile {
                    kind: "task",
                    line: line_number,
                    message: format!("expected one or two locations, got '{text}'"),
                })
            }
        }
    }
    Ok(tasks)
}

/// Rewrite a task file from the full definition list: count line first, then
/// one task per line. Single-visit form is kept when every task is a single
/// visit; otherwise every line uses the `start goal` pair form. The write
/// goes through a temporary file renamed into place.
pub fn write_task_file(
    path: &Path,
    definitions: &[(CellIndex, CellIndex)],
) -> Result<(), std::io::Error> {
    let all_single = definitions.iter().all(|(start, goal)| start == goal);
    let mut content = format!("{}\n", definitions.len());
    for (start, goal) in definitions {
        if all_single {
            content.push_str(&format!("{start}\n"));
        } else {
            content.push_str(&format!("{start} {goal}\n"));
        }
    }

    let tmp = path.with_extension("tmp");
    {
        let mut file = fs::File::create(&tmp)?;
        file.write_all(content.as_bytes())?;
    }
    fs::rename(&tmp, path)
}

fn meaningful_lines(content: &str) -> impl Iterator<Item = (usize, &str)> {
    content
        .lines()
        .enumerate()
        .map(|(index, line)| (index + 1, line.trim()))
        .filter(|(_, line)| !line.is_empty() && !line.starts_with('#'))
}

fn next_count<'a>(
    lines: &mut impl Iterator<Item = (usize, &'a str)>,
    kind: &'static str,
) -> Result<(usize, usize), ConfigError> {
    let (line, text) = lines.next().ok_or_else(|| ConfigError::MalformedFile {
        kind,
        line: 0,
        message: "file is empty".to_string(),
    })?;
    let count = text.parse().map_err(|_| ConfigError::MalformedFile {
        kind,
        line,
        message: format!("invalid count '{text}'"),
    })?;
    Ok((line, count))
}
