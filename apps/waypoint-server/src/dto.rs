//! Wire types for the HTTP endpoints.

use serde::{Deserialize, Serialize};

use waypoint_core::types::{AgentState, Orientation};

use crate::error::ApiError;

/// `POST /plan` request body. The `goals` field is accepted for backward
/// compatibility but ignored: tasks drive goals in lifelong mode.
#[derive(Debug, Deserialize)]
pub struct PlanRequest {
    pub agents: Vec<AgentDto>,
    #[serde(default)]
    pub goals: Option<serde_json::Value>,
}

/// One agent's reported pose.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AgentDto {
    pub location: usize,
    #[serde(default)]
    pub orientation: u8,
    #[serde(default)]
    pub timestep: i32,
}

impl AgentDto {
    pub fn to_state(&self) -> Result<AgentState, ApiError> {
        let orientation = Orientation::from_index(self.orientation).ok_or_else(|| {
            ApiError::InvalidRequest(format!(
                "orientation {} is not in 0..=3",
                self.orientation
            ))
        })?;
        Ok(AgentState::new(self.location, orientation, self.timestep))
    }
}

/// `POST /plan` response body.
#[derive(Debug, Clone, Serialize)]
pub struct PlanResponse {
    pub status: &'static str,
    pub timestep: i32,
    pub actions: Vec<AgentActionDto>,
    pub task_status: Vec<AgentTaskStatus>,
    pub tasks_remaining: usize,
    pub total_tasks_completed: usize,
    pub all_tasks_finished: bool,
}

/// One agent's executed action and post-move pose.
#[derive(Debug, Clone, Serialize)]
pub struct AgentActionDto {
    pub agent_id: usize,
    pub action: char,
    pub location: usize,
    pub orientation: u8,
}

/// One agent's entry in `/task_status` (and in the `/plan` response).
#[derive(Debug, Clone, Serialize)]
pub struct AgentTaskStatus {
    pub agent_id: usize,
    pub has_task: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_carrying_task: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub current_task: Option<CurrentTaskDto>,
    pub tasks_completed: usize,
}

/// The head task of one agent. Single-visit tasks use `location`;
/// pickup-and-deliver tasks use `start_location` and `goal_location`.
#[derive(Debug, Clone, Serialize)]
pub struct CurrentTaskDto {
    pub task_id: u32,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub location: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_location: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub goal_location: Option<usize>,
    pub assigned_at: i32,
}

/// `POST /add_task` request body: a single visit location or a pickup and
/// delivery pair.
#[derive(Debug, Clone, Copy, Deserialize)]
#[serde(untagged)]
pub enum AddTaskRequest {
    Pair {
        start_location: usize,
        goal_location: usize,
    },
    Single {
        location: usize,
    },
}

impl AddTaskRequest {
    pub fn locations(self) -> (usize, usize) {
        match self {
            Self::Pair {
                start_location,
                goal_location,
            } => (start_location, goal_location),
            Self::Single { location } => (location, location),
        }
    }
}

/// `POST /add_task` response body.
#[derive(Debug, Clone, Serialize)]
pub struct AddTaskResponse {
    pub status: &'static str,
    pub task_id: u32,
    pub location: usize,
    pub tasks_in_queue: usize,
}

/// `POST /reset` response body.
#[derive(Debug, Clone, Serialize)]
pub struct ResetResponse {
    pub status: &'static str,
}

/// `GET /health` response body.
#[derive(Debug, Clone, Serialize)]
pub struct HealthResponse {
    pub status: &'static str,
    pub timestamp: i64,
}

/// `GET /status` response body.
#[derive(Debug, Clone, Serialize)]
pub struct StatusResponse {
    pub status: &'static str,
    pub map_file: String,
    pub map_size: (usize, usize),
    pub port: u16,
    pub uptime: u64,
}
