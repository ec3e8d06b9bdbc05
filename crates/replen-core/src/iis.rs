//! Minimal infeasible subset search over any [`Solver`].
//!
//! Uses a deletion filter: every constraint is relaxed in turn and stays
//! relaxed if the rest of the model is still infeasible. What survives is a
//! set of constraints that is infeasible together, and feasible once any one
//! member is dropped.

use std::time::Instant;

use crate::config::SolverConfig;
use crate::model::{Model, ModelError};
use crate::solver::{Solver, SolverError, SolverStatus};
use crate::types::{Objective, Sense};
use replen_expr::ids::ConstraintId;

/// Errors raised while searching for an infeasible subset.
#[derive(Debug, Clone, PartialEq)]
pub enum IisError {
    /// The model solved without infeasibility, so there is nothing to isolate.
    ModelFeasible { status: SolverStatus },
    /// A subset solve ended without a definite feasibility answer.
    Undetermined { status: SolverStatus },
    Model(ModelError),
    Solver(SolverError),
}

impl IisError {
    pub fn code(&self) -> &'static str {
        match self {
            IisError::ModelFeasible { .. } => "IIS_MODEL_FEASIBLE",
            IisError::Undetermined { .. } => "IIS_UNDETERMINED",
            IisError::Model(err) => err.code(),
            IisError::Solver(err) => err.code(),
        }
    }
}

impl std::fmt::Display for IisError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            IisError::ModelFeasible { status } => write!(
                f,
                "[{}] Model is not infeasible (status: {})",
                self.code(),
                status
            ),
            IisError::Undetermined { status } => write!(
                f,
                "[{}] Subset solve returned {} instead of a feasibility verdict",
                self.code(),
                status
            ),
            IisError::Model(err) => write!(f, "{err}"),
            IisError::Solver(err) => write!(f, "{err}"),
        }
    }
}

impl std::error::Error for IisError {}

impl From<ModelError> for IisError {
    fn from(err: ModelError) -> Self {
        IisError::Model(err)
    }
}

impl From<SolverError> for IisError {
    fn from(err: SolverError) -> Self {
        IisError::Solver(err)
    }
}

/// Find a minimal set of constraints that are infeasible together.
///
/// The objective is replaced by zero for the subset solves so that only feasibility
/// matters. Constraint ids refer to `model`. Costs one solve per constraint.
pub fn find_infeasible_subset<S: Solver>(
    solver: &mut S,
    model: &Model,
    config: &SolverConfig,
) -> Result<Vec<ConstraintId>, IisError> {
    let started = Instant::now();
    let mut working = model.clone();
    working.set_objective(Objective {
        sense: Some(Sense::Minimize),
        terms: Vec::new(),
    })?;

    let status = solver.solve(&working, config, None)?.status;
    if status != SolverStatus::Infeasible {
        return Err(if status.is_feasible() || status.is_unbounded() {
            IisError::ModelFeasible { status }
        } else {
            IisError::Undetermined { status }
        });
    }

    let ids: Vec<ConstraintId> = working.constraints().map(|(id, _)| id).collect();
    let mut subset = Vec::new();
    for id in ids {
        let previous = working.relax_constraint(id)?;
        if is_feasible(solver, &working, config)? {
            working.set_constraint_bounds(id, previous)?;
            subset.push(id);
        }
    }

    tracing::info!(
        component = "iis",
        operation = "deletion_filter",
        status = "success",
        constraints = model.num_constraints(),
        subset = subset.len(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Isolated infeasible constraint subset"
    );
    Ok(subset)
}

fn is_feasible<S: Solver>(
    solver: &mut S,
    model: &Model,
    config: &SolverConfig,
) -> Result<bool, IisError> {
    let solution = solver.solve(model, config, None)?;
    match solution.status {
        SolverStatus::Infeasible => Ok(false),
        status if status.is_feasible() || status.is_unbounded() => Ok(true),
        status => Err(IisError::Undetermined { status }),
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::solver::{Solution, WarmStart};
    use crate::types::{Bounds, Variable};
    use replen_expr::expr::Expr;

    /// Decides feasibility of one-variable models by interval intersection.
    struct IntervalSolver {
        solves: usize,
    }

    impl Solver for IntervalSolver {
        fn solve(
            &mut self,
            model: &Model,
            _config: &SolverConfig,
            _warm_start: Option<&WarmStart>,
        ) -> Result<Solution, SolverError> {
            self.solves += 1;
            let (var_id, var) = model.variables().next().ok_or(SolverError::EmptyModel)?;
            let mut lower = var.bounds.lower;
            let mut upper = var.bounds.upper;
            for (id, constraint) in model.constraints() {
                let coeff = model
                    .row(id)
                    .into_iter()
                    .find(|(v, _)| *v == var_id)
                    .map_or(0.0, |(_, c)| c);
                if coeff > 0.0 {
                    lower = lower.max(constraint.bounds.lower / coeff);
                    upper = upper.min(constraint.bounds.upper / coeff);
                }
            }
            let status = if lower <= upper {
                SolverStatus::Optimal
            } else {
                SolverStatus::Infeasible
            };
            Ok(Solution::without_incumbent(status, 0.0))
        }
    }

    fn interval_model(constraints: &[(f64, f64)]) -> Model {
        let mut model = Model::new();
        let x = model
            .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
            .unwrap();
        for (lower, upper) in constraints {
            model
                .add_expr_constraint(Expr::var(x), Bounds::new(*lower, *upper))
                .unwrap();
        }
        model
    }

    #[test]
    fn deletion_filter_keeps_conflicting_pair() {
        let inf = f64::INFINITY;
        let model = interval_model(&[
            (8.0, inf),
            (-inf, 5.0),
            (-inf, 9.0),
            (6.0, inf),
        ]);
        let mut solver = IntervalSolver { solves: 0 };

        let subset = find_infeasible_subset(&mut solver, &model, &SolverConfig::new()).unwrap();

        assert_eq!(subset, vec![ConstraintId::new(1), ConstraintId::new(3)]);
        assert_eq!(solver.solves, 1 + model.num_constraints());
    }

    #[test]
    fn subset_is_minimal() {
        let inf = f64::INFINITY;
        let model = interval_model(&[(8.0, inf), (-inf, 5.0), (7.0, inf)]);
        let mut solver = IntervalSolver { solves: 0 };
        let subset = find_infeasible_subset(&mut solver, &model, &SolverConfig::new()).unwrap();

        for dropped in &subset {
            let mut reduced = model.clone();
            for (id, _) in model.constraints() {
                if !subset.contains(&id) || id == *dropped {
                    reduced.relax_constraint(id).unwrap();
                }
            }
            let solution = solver.solve(&reduced, &SolverConfig::new(), None).unwrap();
            assert!(solution.is_feasible());
        }
    }

    #[test]
    fn feasible_model_is_rejected() {
        let model = interval_model(&[(1.0, 4.0)]);
        let mut solver = IntervalSolver { solves: 0 };
        let err = find_infeasible_subset(&mut solver, &model, &SolverConfig::new()).unwrap_err();
        assert_eq!(err.code(), "IIS_MODEL_FEASIBLE");
    }
}
