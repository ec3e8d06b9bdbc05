//! Solver trait and common types for solver backends.
//!
//! Backends translate a [`Model`] into their own representation, run it, and
//! report back a [`Solution`]. A non-optimal outcome such as infeasibility is
//! a status on the solution, not an error.

use crate::Model;
use crate::config::SolverConfig;
use replen_expr::ids::VariableId;
use std::collections::BTreeMap;

/// Status of a solver solution.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum SolverStatus {
    /// Optimal solution found.
    Optimal,
    /// Problem is infeasible.
    Infeasible,
    /// Problem is unbounded.
    Unbounded,
    /// Solver reached time limit (may have feasible solution).
    TimeLimit,
    /// Solver reached iteration limit (may have feasible solution).
    IterationLimit,
    /// Status is unknown or solver did not complete.
    Unknown,
}

impl SolverStatus {
    pub fn is_optimal(self) -> bool {
        matches!(self, SolverStatus::Optimal)
    }

    /// Whether the primal values may describe a feasible point.
    pub fn is_feasible(self) -> bool {
        matches!(
            self,
            SolverStatus::Optimal | SolverStatus::TimeLimit | SolverStatus::IterationLimit
        )
    }

    pub fn is_infeasible(self) -> bool {
        matches!(self, SolverStatus::Infeasible)
    }

    pub fn is_unbounded(self) -> bool {
        matches!(self, SolverStatus::Unbounded)
    }

    pub fn as_str(self) -> &'static str {
        match self {
            SolverStatus::Optimal => "optimal",
            SolverStatus::Infeasible => "infeasible",
            SolverStatus::Unbounded => "unbounded",
            SolverStatus::TimeLimit => "time_limit",
            SolverStatus::IterationLimit => "iteration_limit",
            SolverStatus::Unknown => "unknown",
        }
    }
}

impl std::fmt::Display for SolverStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.as_str())
    }
}

/// Error type for solver operations.
#[derive(Debug, Clone, PartialEq)]
pub enum SolverError {
    /// Model has no variables.
    EmptyModel,
    /// No objective function set.
    NoObjective,
    /// Variable id referenced by the model does not exist.
    InvalidVariableId(u32),
    /// Configuration value out of range.
    InvalidConfig(String),
    /// Solver is not available (e.g., library not installed).
    SolverNotAvailable(String),
    /// Solver-specific error not covered by other variants.
    SolverSpecific(String),
}

impl SolverError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            SolverError::EmptyModel => "SOLVER_EMPTY_MODEL",
            SolverError::NoObjective => "SOLVER_NO_OBJECTIVE",
            SolverError::InvalidVariableId(_) => "SOLVER_INVALID_VARIABLE_ID",
            SolverError::InvalidConfig(_) => "SOLVER_INVALID_CONFIG",
            SolverError::SolverNotAvailable(_) => "SOLVER_NOT_AVAILABLE",
            SolverError::SolverSpecific(_) => "SOLVER_SPECIFIC",
        }
    }
}

impl std::fmt::Display for SolverError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SolverError::EmptyModel => write!(f, "[{}] Model has no variables", self.code()),
            SolverError::NoObjective => write!(f, "[{}] Model has no objective", self.code()),
            SolverError::InvalidVariableId(id) => {
                write!(f, "[{}] Variable ID {} does not exist", self.code(), id)
            }
            SolverError::InvalidConfig(msg) => {
                write!(f, "[{}] Invalid solver config: {}", self.code(), msg)
            }
            SolverError::SolverNotAvailable(msg) => {
                write!(f, "[{}] Solver not available: {}", self.code(), msg)
            }
            SolverError::SolverSpecific(msg) => {
                write!(f, "[{}] Solver error: {}", self.code(), msg)
            }
        }
    }
}

impl std::error::Error for SolverError {}

/// Solver-agnostic solution from an optimization solve.
#[derive(Debug, Clone)]
pub struct Solution {
    pub status: SolverStatus,
    /// Objective of the incumbent, if the solver has one.
    pub objective_value: Option<f64>,
    /// Relative MIP gap at termination, if reported.
    pub mip_gap: Option<f64>,
    /// Primal values indexed by `VariableId::index()`. Empty without an incumbent.
    pub primal_values: Vec<f64>,
    pub solve_time_seconds: f64,
}

impl Solution {
    /// Solution carrying only a status, for outcomes without an incumbent.
    pub fn without_incumbent(status: SolverStatus, solve_time_seconds: f64) -> Self {
        Self {
            status,
            objective_value: None,
            mip_gap: None,
            primal_values: Vec::new(),
            solve_time_seconds,
        }
    }

    /// Primal value of a variable.
    pub fn value(&self, id: VariableId) -> Option<f64> {
        self.primal_values.get(id.index()).copied()
    }

    pub fn is_optimal(&self) -> bool {
        self.status.is_optimal()
    }

    pub fn is_feasible(&self) -> bool {
        self.status.is_feasible()
    }

    pub fn is_infeasible(&self) -> bool {
        self.status.is_infeasible()
    }

    pub fn status_string(&self) -> &'static str {
        self.status.as_str()
    }
}

/// Sparse starting assignment handed to a backend as a MIP start.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct WarmStart {
    values: BTreeMap<VariableId, f64>,
}

impl WarmStart {
    pub fn new() -> Self {
        Self::default()
    }

    /// Set the hint for a variable, replacing any earlier hint.
    pub fn set(&mut self, id: VariableId, value: f64) {
        self.values.insert(id, value);
    }

    pub fn get(&self, id: VariableId) -> Option<f64> {
        self.values.get(&id).copied()
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }

    /// Hints in variable id order.
    pub fn iter(&self) -> impl Iterator<Item = (VariableId, f64)> + '_ {
        self.values.iter().map(|(id, value)| (*id, *value))
    }
}

impl FromIterator<(VariableId, f64)> for WarmStart {
    fn from_iter<I: IntoIterator<Item = (VariableId, f64)>>(iter: I) -> Self {
        Self {
            values: iter.into_iter().collect(),
        }
    }
}

/// Trait that all solver backends must implement.
pub trait Solver {
    /// Solve `model` under `config`, optionally seeded with a starting assignment.
    fn solve(
        &mut self,
        model: &Model,
        config: &SolverConfig,
        warm_start: Option<&WarmStart>,
    ) -> Result<Solution, SolverError>;
}
