//! Replen core model builder and solver contract.

pub mod config;
pub mod iis;
pub mod model;
pub mod solver;
pub mod types;

pub use config::SolverConfig;
pub use iis::{IisError, find_infeasible_subset};
pub use model::{
    CoefficientView, ConstraintView, InspectOptions, Model, ModelError, ModelSnapshot,
    ObjectiveView, SnapshotMetadata, VariableView,
};
pub use solver::{Solution, Solver, SolverError, SolverStatus, WarmStart};
pub use types::{Bounds, Constraint, Objective, Sense, Variable};
