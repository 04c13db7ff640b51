//! Planner factory keyed by configured name.

use thiserror::Error;

use waypoint_core::planner::Planner;

use crate::naive::{NaivePlanner, WaitPlanner};

/// Errors that can occur when building a planner.
#[derive(Debug, Error)]
pub enum PlannerBuildError {
    #[error("unknown planner kind: {0}")]
    UnknownKind(String),
}

/// Build a planner from its configured name.
pub fn create_planner(kind: &str) -> Result<Box<dyn Planner>, PlannerBuildError> {
    match kind.trim().to_ascii_lowercase().as_str() {
        "naive" => Ok(Box::new(NaivePlanner::new())),
        "wait" => Ok(Box::new(WaitPlanner::new())),
        other => Err(PlannerBuildError::UnknownKind(other.to_string())),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_known_kinds() {
        assert!(create_planner("naive").is_ok());
        assert!(create_planner(" Wait ").is_ok());
    }

    #[test]
    fn test_unknown_kind() {
        assert!(matches!(
            create_planner("cbs"),
            Err(PlannerBuildError::UnknownKind(_))
        ));
    }
}
