//! Built-in planners.
//!
//! These exist so the server runs end to end without a foreign planner
//! attached. They make no optimality claims: the naive planner steers each
//! agent independently and relies on the server's validity gate to reject
//! colliding joint actions.

mod factory;
mod naive;

pub use factory::{create_planner, PlannerBuildError};
pub use naive::{NaivePlanner, WaitPlanner};
