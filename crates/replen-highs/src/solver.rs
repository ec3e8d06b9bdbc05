//! HiGHS implementation of the [`replen_core::Solver`] contract.

use crate::ffi::{HighsModel, HighsModelError, HighsOption, HighsStatus, ObjectiveSense};
use crate::status::{highs_has_solution, highs_status_string, highs_to_core_status};
use replen_core::{Model, Sense, Solution, Solver, SolverConfig, SolverError, WarmStart};
use std::time::Instant;
use tracing::{debug, info, trace, warn};

fn highs_model_error_to_solver_error(err: HighsModelError) -> SolverError {
    SolverError::SolverSpecific(err.to_string())
}

/// Stateless HiGHS backend. Every `solve` builds a fresh HiGHS problem.
#[derive(Debug, Clone, Copy, Default)]
pub struct HighsSolver;

impl HighsSolver {
    pub fn new() -> Self {
        Self
    }
}

impl Solver for HighsSolver {
    fn solve(
        &mut self,
        model: &Model,
        config: &SolverConfig,
        warm_start: Option<&WarmStart>,
    ) -> Result<Solution, SolverError> {
        solve_model(model, config, warm_start)
    }
}

/// Validate that a model is ready for solving.
fn validate_model(model: &Model) -> Result<Sense, SolverError> {
    if model.num_variables() == 0 {
        return Err(SolverError::EmptyModel);
    }
    model.objective().sense.ok_or(SolverError::NoObjective)
}

fn objective_coefficients(model: &Model) -> Result<Vec<f64>, SolverError> {
    let mut coeffs = vec![0.0; model.num_variables()];
    for (var_id, coeff) in &model.objective().terms {
        let slot = coeffs
            .get_mut(var_id.index())
            .ok_or(SolverError::InvalidVariableId(var_id.inner()))?;
        *slot += *coeff;
    }
    Ok(coeffs)
}

fn apply_solver_config(highs_model: &mut HighsModel, config: &SolverConfig) {
    highs_model.set_log_to_console(config.log_to_console.unwrap_or(false));

    if let Some(limit) = config.time_limit {
        highs_model.set_option("time_limit", HighsOption::Float(limit));
    }
    if let Some(gap) = config.mip_gap {
        highs_model.set_option("mip_rel_gap", HighsOption::Float(gap));
    }
    if let Some(level) = config.verbosity {
        highs_model.set_verbosity(level);
    }
    if let Some(presolve) = config.presolve {
        let presolve_str = if presolve { "on" } else { "off" };
        highs_model.set_option("presolve", HighsOption::Str(presolve_str.to_string()));
    }
    if let Some(threads) = config.threads {
        highs_model.set_option("threads", HighsOption::Int(threads as i32));
    }
    if let Some(tolerance) = config.tolerance {
        highs_model.set_option(
            "primal_feasibility_tolerance",
            HighsOption::Float(tolerance),
        );
        highs_model.set_option("mip_feasibility_tolerance", HighsOption::Float(tolerance));
    }
}

/// Columns are added in id order, so column index equals `VariableId::index()`.
fn add_variables_to_highs(model: &Model, highs_model: &mut HighsModel, objective: &[f64]) {
    for (var_id, var) in model.variables() {
        let cost = objective.get(var_id.index()).copied().unwrap_or(0.0);
        if var.is_integer {
            highs_model.add_integer_col(var.bounds.lower, var.bounds.upper, cost);
        } else {
            highs_model.add_col(var.bounds.lower, var.bounds.upper, cost);
        }
    }
    trace!(
        component = "solver",
        operation = "add_variables",
        status = "success",
        num_vars = model.num_variables(),
        "Added all variables to HiGHS"
    );
}

fn add_constraints_to_highs(
    model: &Model,
    highs_model: &mut HighsModel,
) -> Result<(), SolverError> {
    let started = Instant::now();
    let mut rows: Vec<(Vec<usize>, Vec<f64>)> =
        vec![(Vec::new(), Vec::new()); model.num_constraints()];
    for (var_id, column) in model.columns() {
        for (constraint_id, coeff) in column {
            if let Some(row) = rows.get_mut(constraint_id.index()) {
                row.0.push(var_id.index());
                row.1.push(*coeff);
            }
        }
    }

    for ((_, constraint), (cols, coeffs)) in model.constraints().zip(rows) {
        highs_model
            .add_row(constraint.bounds.lower, constraint.bounds.upper, &cols, &coeffs)
            .map_err(highs_model_error_to_solver_error)?;
    }

    debug!(
        component = "solver",
        operation = "add_constraints",
        status = "success",
        num_constraints = model.num_constraints(),
        nnz = model.num_coefficients(),
        duration_ms = started.elapsed().as_secs_f64() * 1000.0,
        "Added all constraints to HiGHS"
    );
    Ok(())
}

/// Dense MIP start: hinted columns take their hint, the rest a bound-feasible default.
///
/// Hints for ids outside the model are dropped with a warning.
fn prepare_warm_start_columns(model: &Model, warm_start: &WarmStart) -> Vec<f64> {
    let mut cols: Vec<f64> = model
        .variables()
        .map(|(_, var)| default_primal_value(var.bounds.lower, var.bounds.upper))
        .collect();

    let mut dropped = 0usize;
    for (var_id, value) in warm_start.iter() {
        match cols.get_mut(var_id.index()) {
            Some(slot) => *slot = value,
            None => dropped += 1,
        }
    }

    if dropped > 0 {
        warn!(
            component = "solver",
            operation = "prepare_warm_start",
            status = "warn",
            dropped,
            num_vars = model.num_variables(),
            "Dropped warm-start hints for unknown variables"
        );
    }
    debug!(
        component = "solver",
        operation = "prepare_warm_start",
        status = "success",
        num_hints = warm_start.len() - dropped,
        "Prepared warm-start solution"
    );
    cols
}

fn solve_model(
    model: &Model,
    config: &SolverConfig,
    warm_start: Option<&WarmStart>,
) -> Result<Solution, SolverError> {
    let sense = validate_model(model)?;
    config.validate()?;
    let solve_started = Instant::now();

    info!(
        component = "solver",
        operation = "solve",
        status = "start",
        solver = "highs",
        variables = model.num_variables(),
        constraints = model.num_constraints(),
        nnz = model.num_coefficients(),
        warm_start = warm_start.is_some(),
        "Starting solve"
    );

    let objective = objective_coefficients(model)?;
    let mut highs_model = HighsModel::new();
    apply_solver_config(&mut highs_model, config);
    highs_model.set_objective_sense(match sense {
        Sense::Minimize => ObjectiveSense::Minimize,
        Sense::Maximize => ObjectiveSense::Maximize,
    });

    add_variables_to_highs(model, &mut highs_model, &objective);
    add_constraints_to_highs(model, &mut highs_model)?;

    if let Some(start) = warm_start {
        highs_model
            .set_primal_start(prepare_warm_start_columns(model, start))
            .map_err(highs_model_error_to_solver_error)?;
    }

    let status = highs_model
        .solve()
        .map_err(highs_model_error_to_solver_error)?;
    let solve_time_seconds = solve_started.elapsed().as_secs_f64();

    let mut solution =
        Solution::without_incumbent(highs_to_core_status(status), solve_time_seconds);
    if highs_has_solution(status) {
        let primal_values = highs_model
            .col_values()
            .map_err(highs_model_error_to_solver_error)?;
        let objective_value = highs_model
            .objective_value()
            .map_err(highs_model_error_to_solver_error)?;
        if primal_values.len() == model.num_variables() && objective_value.is_finite() {
            solution.primal_values = primal_values;
            solution.objective_value = Some(objective_value);
            solution.mip_gap = highs_model.mip_gap().ok().filter(|gap| gap.is_finite());
        }
    }

    if status == HighsStatus::Optimal {
        info!(
            component = "solver",
            operation = "solve",
            status = "success",
            solver = "highs",
            solver_status = highs_status_string(status),
            objective_value = solution.objective_value,
            mip_gap = solution.mip_gap,
            duration_ms = solve_time_seconds * 1000.0,
            "HiGHS solve completed"
        );
    } else {
        warn!(
            component = "solver",
            operation = "solve",
            status = "warn",
            solver = "highs",
            solver_status = highs_status_string(status),
            has_incumbent = solution.objective_value.is_some(),
            duration_ms = solve_time_seconds * 1000.0,
            "HiGHS did not prove optimality"
        );
    }

    Ok(solution)
}

fn default_primal_value(lower: f64, upper: f64) -> f64 {
    if lower.is_finite() && upper.is_finite() {
        if lower <= 0.0 && 0.0 <= upper {
            0.0
        } else if 0.0 < lower {
            lower
        } else {
            upper
        }
    } else if lower.is_finite() {
        if 0.0 < lower { lower } else { 0.0 }
    } else if upper.is_finite() {
        if 0.0 > upper { upper } else { 0.0 }
    } else {
        0.0
    }
}
