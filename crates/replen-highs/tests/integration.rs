#![allow(clippy::float_cmp)]

use replen_core::{
    Bounds, Constraint, Model, Objective, Sense, Solver, SolverConfig, SolverStatus, Variable,
    WarmStart, find_infeasible_subset,
};
use replen_expr::{ConstraintId, Expr, VariableId};
use replen_highs::HighsSolver;

/// minimize 2x + 3y subject to x + y >= 5, x,y >= 0
#[test]
fn test_simple_lp() {
    let mut model = Model::new();
    let x = model.add_variable(Variable::non_negative()).unwrap();
    let y = model.add_variable(Variable::non_negative()).unwrap();

    let constraint = model
        .add_constraint(Constraint {
            bounds: Bounds::new(5.0, f64::INFINITY),
        })
        .unwrap();
    model.set_coefficient(x, constraint, 1.0).unwrap();
    model.set_coefficient(y, constraint, 1.0).unwrap();
    model
        .set_objective(Objective {
            sense: Some(Sense::Minimize),
            terms: vec![(x, 2.0), (y, 3.0)],
        })
        .unwrap();

    let solution = HighsSolver::new()
        .solve(&model, &SolverConfig::new(), None)
        .expect("Failed to solve");

    assert!(solution.is_optimal());
    let objective = solution.objective_value.expect("objective");
    assert!((objective - 10.0).abs() < 1e-6, "objective {objective}");
    assert!((solution.value(x).unwrap() - 5.0).abs() < 1e-6);
    assert!(solution.value(y).unwrap().abs() < 1e-6);
}

/// maximize integer x subject to x <= 1.5
#[test]
fn test_integer_variable_solution() {
    let mut model = Model::new();
    let x = model
        .add_variable(Variable::integer(Bounds::new(0.0, 10.0)))
        .unwrap();
    model
        .add_constraint_expr(Expr::var(x).le_scalar(1.5))
        .unwrap();
    model.maximize(Expr::var(x)).unwrap();

    let solution = HighsSolver::new()
        .solve(&model, &SolverConfig::new().with_mip_gap(0.0), None)
        .unwrap();

    assert!((solution.value(x).unwrap() - 1.0).abs() < 1e-6);
    assert!((solution.objective_value.unwrap() - 1.0).abs() < 1e-6);
    assert!(solution.mip_gap.is_some_and(|gap| gap <= 1e-6));
}

fn knapsack() -> (Model, Vec<VariableId>) {
    let mut model = Model::new();
    let items: Vec<VariableId> = (0..4)
        .map(|_| model.add_variable(Variable::binary()).unwrap())
        .collect();
    let weights = [3.0, 4.0, 5.0, 2.0];
    let values = [4.0, 5.0, 6.0, 3.0];
    let weight = Expr::from_linear(items.iter().copied().zip(weights).collect());
    model.add_constraint_expr(weight.le_scalar(9.0)).unwrap();
    model
        .maximize(Expr::from_linear(items.iter().copied().zip(values).collect()))
        .unwrap();
    (model, items)
}

#[test]
fn test_warm_start_does_not_change_optimum() {
    let (model, items) = knapsack();

    let cold = HighsSolver::new()
        .solve(&model, &SolverConfig::new(), None)
        .unwrap();

    let mut start = WarmStart::new();
    start.set(items[0], 1.0);
    start.set(items[3], 1.0);
    // Ids outside the model are dropped, not rejected.
    start.set(VariableId::new(99), 1.0);
    let warm = HighsSolver::new()
        .solve(&model, &SolverConfig::new(), Some(&start))
        .unwrap();

    assert!(cold.is_optimal());
    assert!(warm.is_optimal());
    assert!((cold.objective_value.unwrap() - 12.0).abs() < 1e-6);
    assert!((warm.objective_value.unwrap() - cold.objective_value.unwrap()).abs() < 1e-6);
}

#[test]
fn test_infeasible_status_is_returned_not_raised() {
    let mut model = Model::new();
    let x = model
        .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
        .unwrap();
    model
        .add_constraint_expr(Expr::var(x).ge_scalar(8.0))
        .unwrap();
    model
        .add_constraint_expr(Expr::var(x).le_scalar(5.0))
        .unwrap();
    model.minimize(Expr::var(x)).unwrap();

    let solution = HighsSolver::new()
        .solve(&model, &SolverConfig::new().with_presolve(false), None)
        .expect("infeasibility is a status");

    assert_eq!(solution.status, SolverStatus::Infeasible);
    assert!(solution.objective_value.is_none());
    assert!(solution.primal_values.is_empty());
}

#[test]
fn test_unbounded_status_is_returned() {
    let mut model = Model::new();
    let y = model.add_variable(Variable::non_negative()).unwrap();
    model.maximize(Expr::var(y)).unwrap();

    let solution = HighsSolver::new()
        .solve(&model, &SolverConfig::new().with_presolve(false), None)
        .expect("unboundedness is a status");

    assert!(!solution.is_optimal());
    assert!(solution.objective_value.is_none());
}

#[test]
fn test_infeasible_subset_with_highs() {
    let mut model = Model::new();
    let x = model
        .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
        .unwrap();
    let y = model
        .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
        .unwrap();
    model
        .add_named_constraint("x_high", Expr::var(x).ge_scalar(6.0))
        .unwrap();
    model
        .add_named_constraint("y_free", Expr::var(y).le_scalar(9.0))
        .unwrap();
    model
        .add_named_constraint("sum_low", (Expr::var(x) + Expr::var(y)).le_scalar(4.0))
        .unwrap();
    model.minimize(Expr::var(x) + Expr::var(y)).unwrap();

    let config = SolverConfig::new().with_presolve(false);
    let mut solver = HighsSolver::new();
    let subset = find_infeasible_subset(&mut solver, &model, &config).unwrap();

    assert_eq!(subset, vec![ConstraintId::new(0), ConstraintId::new(2)]);
    let names: Vec<&str> = subset
        .iter()
        .filter_map(|id| model.get_constraint_name(*id))
        .collect();
    assert_eq!(names, vec!["x_high", "sum_low"]);
}
