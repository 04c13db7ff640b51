//! Problem configuration loading and input-file readers.
//!
//! A problem is described by a JSON configuration file plus two plain-text
//! companions: an agent file (start locations) and a task file (errand
//! locations). Paths in the configuration are resolved relative to the
//! configuration file itself.

mod loader;

pub use loader::{
    load_config, read_agent_file, read_task_file, write_task_file, ConfigError, ProblemConfig,
    DEFAULT_PLAN_TIME_LIMIT,
};
