//! Model module for building optimization models.
//!
//! This module provides the core [`Model`] type and related structures for building
//! linear and mixed-integer programming models.
//!
//! # Module Organization
//!
//! - [`error`]: Model error types
//! - [`builder`]: Methods for adding variables, constraints, and objectives
//! - [`storage`]: Column-first sparse storage access
//! - [`metadata`]: Variable and constraint naming and metadata
//! - [`inspect`]: Model inspection and snapshots

mod builder;
mod error;
mod inspect;
mod metadata;
mod storage;

use crate::types::{Constraint, Objective, Variable};
use replen_expr::ids::{ConstraintId, VariableId};
use std::collections::BTreeMap;
use std::time::Instant;

pub use error::ModelError;
pub use inspect::{
    CoefficientView, ConstraintView, InspectOptions, ModelSnapshot, ObjectiveView,
    SnapshotMetadata, VariableView,
};

/// A model builder for linear and mixed-integer programs.
///
/// Ids are dense: the n-th variable added gets `VariableId::new(n)`, and
/// likewise for constraints. The coefficient matrix is stored column-first.
#[derive(Debug, Clone, Default)]
pub struct Model {
    pub(crate) variables: Vec<Variable>,
    pub(crate) constraints: Vec<Constraint>,
    pub(crate) objective: Objective,
    pub(crate) objective_name: Option<String>,
    // variable_id -> vec of (constraint_id, coefficient)
    pub(crate) columns: BTreeMap<VariableId, Vec<(ConstraintId, f64)>>,
    // Lazy-allocated metadata storage
    pub(crate) variable_names: Option<BTreeMap<VariableId, String>>,
    pub(crate) constraint_names: Option<BTreeMap<ConstraintId, String>>,
    pub(crate) variable_metadata: Option<BTreeMap<VariableId, serde_json::Value>>,
    pub(crate) constraint_metadata: Option<BTreeMap<ConstraintId, serde_json::Value>>,
}

impl Model {
    /// Create a new empty model.
    pub fn new() -> Self {
        Self::default()
    }

    /// Get the objective
    pub fn objective(&self) -> &Objective {
        &self.objective
    }

    pub(crate) fn ensure_variable_exists(&self, id: VariableId) -> Result<(), ModelError> {
        if id.index() < self.variables.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidVariableId(id))
        }
    }

    pub(crate) fn ensure_constraint_exists(&self, id: ConstraintId) -> Result<(), ModelError> {
        if id.index() < self.constraints.len() {
            Ok(())
        } else {
            Err(ModelError::InvalidConstraintId(id))
        }
    }

    pub(crate) fn normalize_terms(&self, terms: Vec<(VariableId, f64)>) -> Vec<(VariableId, f64)> {
        let started = Instant::now();
        let terms_in = terms.len();

        let mut merged: BTreeMap<VariableId, f64> = BTreeMap::new();
        for (var_id, coeff) in terms {
            if coeff == 0.0 {
                continue;
            }
            *merged.entry(var_id).or_insert(0.0) += coeff;
        }

        let normalized: Vec<(VariableId, f64)> = merged
            .into_iter()
            .filter(|(_, coeff)| *coeff != 0.0)
            .collect();

        tracing::trace!(
            component = "model",
            operation = "lower_expr",
            status = "success",
            expr_terms_in = terms_in,
            expr_terms_out = normalized.len(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Lowered linear expression"
        );

        normalized
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::types::{Bounds, Constraint, Objective, Sense, Variable};
    use replen_expr::expr::{ComparisonSense, ConstraintExpr, Expr};

    mod metadata_inspect;
    mod support;

    #[test]
    fn test_new_model_is_empty() {
        let model = Model::new();
        assert_eq!(model.num_variables(), 0);
        assert_eq!(model.num_constraints(), 0);
    }

    #[test]
    fn test_add_variable() {
        let mut model = Model::new();
        let var = Variable::continuous(Bounds::new(0.0, 10.0));

        let id = model.add_variable(var).unwrap();
        assert_eq!(model.num_variables(), 1);
        assert_eq!(model.get_variable(id).unwrap(), &var);
    }

    #[test]
    fn test_ids_are_dense() {
        let mut model = Model::new();
        let a = model.add_variable(Variable::binary()).unwrap();
        let b = model.add_variable(Variable::non_negative()).unwrap();
        assert_eq!(a.index(), 0);
        assert_eq!(b.index(), 1);
    }

    #[test]
    fn test_add_constraint() {
        let mut model = Model::new();
        let constraint = Constraint {
            bounds: Bounds::new(0.0, 100.0),
        };

        let id = model.add_constraint(constraint).unwrap();
        assert_eq!(model.num_constraints(), 1);
        assert_eq!(model.get_constraint(id).unwrap(), &constraint);
    }

    #[test]
    fn test_set_objective() {
        let mut model = Model::new();
        let var_id = model
            .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
            .unwrap();

        let objective = Objective {
            sense: Some(Sense::Minimize),
            terms: vec![(var_id, 1.0)],
        };

        model.set_objective(objective).unwrap();
        assert_eq!(model.objective().sense, Some(Sense::Minimize));
        assert_eq!(model.objective().terms.len(), 1);
    }

    #[test]
    fn test_set_objective_rejects_missing_sense() {
        let mut model = Model::new();
        let result = model.set_objective(Objective::new());
        assert_eq!(result, Err(ModelError::NoObjective));
    }

    #[test]
    fn test_objective_name_cleared_on_replace() {
        let mut model = Model::new();
        let var_id = model.add_variable(Variable::binary()).unwrap();
        model.minimize(Expr::term(var_id, 1.0)).unwrap();
        model.set_objective_name(Some("cost".to_string()));
        assert_eq!(model.get_objective_name(), Some("cost"));

        model
            .set_objective(Objective {
                sense: Some(Sense::Maximize),
                terms: vec![(var_id, 2.0)],
            })
            .unwrap();
        assert!(model.get_objective_name().is_none());
    }

    #[test]
    fn test_multiple_objectives_rejected() {
        let mut model = Model::new();
        let var_id = model.add_variable(Variable::non_negative()).unwrap();

        model.minimize(Expr::term(var_id, 1.0)).unwrap();

        let result = model.maximize(Expr::term(var_id, 1.0));
        assert_eq!(result, Err(ModelError::MultipleObjectives));
    }

    #[test]
    fn test_objective_terms_are_merged() {
        let mut model = Model::new();
        let var_id = model.add_variable(Variable::non_negative()).unwrap();
        model
            .minimize(Expr::term(var_id, 1.5) + Expr::term(var_id, 2.5))
            .unwrap();
        assert_eq!(model.objective().terms, vec![(var_id, 4.0)]);
    }

    #[test]
    fn test_set_coefficient_with_invalid_variable_fails() {
        let mut model = Model::new();
        let invalid_var_id = VariableId::new(999);
        let constraint_id = model
            .add_constraint(Constraint {
                bounds: Bounds::new(0.0, 100.0),
            })
            .unwrap();

        let result = model.set_coefficient(invalid_var_id, constraint_id, 2.5);
        assert_eq!(result, Err(ModelError::InvalidVariableId(invalid_var_id)));
    }

    #[test]
    fn test_set_coefficient_with_invalid_constraint_fails() {
        let mut model = Model::new();
        let var_id = model.add_variable(Variable::non_negative()).unwrap();
        let invalid_constraint_id = ConstraintId::new(999);

        let result = model.set_coefficient(var_id, invalid_constraint_id, 2.5);
        assert_eq!(
            result,
            Err(ModelError::InvalidConstraintId(invalid_constraint_id))
        );
    }

    #[test]
    fn test_set_coefficient_rejects_non_finite() {
        let mut model = Model::new();
        let var_id = model.add_variable(Variable::non_negative()).unwrap();
        let con = model
            .add_constraint(Constraint {
                bounds: Bounds::free(),
            })
            .unwrap();
        let result = model.set_coefficient(var_id, con, f64::INFINITY);
        assert!(matches!(result, Err(ModelError::InvalidCoefficient { .. })));
    }

    #[test]
    fn test_coefficients_persist_in_columns() {
        let mut model = Model::new();
        let v1 = model
            .add_variable(Variable::continuous(Bounds::new(0.0, 10.0)))
            .unwrap();
        let v2 = model
            .add_variable(Variable::integer(Bounds::new(-5.0, 5.0)))
            .unwrap();

        let c1 = model
            .add_constraint(Constraint {
                bounds: Bounds::new(0.0, 15.0),
            })
            .unwrap();
        let c2 = model
            .add_constraint(Constraint {
                bounds: Bounds::new(-10.0, 10.0),
            })
            .unwrap();

        model.set_coefficient(v1, c1, 1.5).unwrap();
        model.set_coefficient(v1, c2, -2.0).unwrap();
        model.set_coefficient(v2, c2, 3.5).unwrap();
        model.set_coefficient(v2, c2, 4.0).unwrap();

        assert_eq!(model.get_column(v1).unwrap(), &vec![(c1, 1.5), (c2, -2.0)]);
        assert_eq!(model.get_column(v2).unwrap(), &vec![(c2, 4.0)]);
        assert_eq!(model.row(c2), vec![(v1, -2.0), (v2, 4.0)]);
        assert_eq!(model.num_coefficients(), 3);
    }

    #[test]
    fn test_add_constraint_expr() {
        let mut model = Model::new();
        let var = model
            .add_variable(Variable::continuous(Bounds::new(0.0, 1.0)))
            .unwrap();
        let expr = Expr::term(var, 1.0);
        let constraint = ConstraintExpr::new(expr, ComparisonSense::GreaterEqual, 2.0);

        let con = model.add_constraint_expr(constraint).unwrap();
        let stored = model.get_constraint(con).unwrap();
        assert_eq!(stored.bounds.lower, 2.0);
        assert!(stored.bounds.upper.is_infinite());
    }

    #[test]
    fn test_add_named_constraint_merges_duplicate_terms() {
        let mut model = Model::new();
        let x = model.add_variable(Variable::non_negative()).unwrap();
        let y = model.add_variable(Variable::non_negative()).unwrap();
        let expr = Expr::var(x) + Expr::var(y) - Expr::var(x);
        let con = model
            .add_named_constraint("only_y", expr.eq_scalar(3.0))
            .unwrap();
        assert_eq!(model.row(con), vec![(y, 1.0)]);
        assert_eq!(model.get_constraint_name(con), Some("only_y"));
    }

    #[test]
    fn test_relax_constraint_frees_bounds() {
        let mut model = Model::new();
        let con = model
            .add_constraint(Constraint {
                bounds: Bounds::new(1.0, 1.0),
            })
            .unwrap();
        let previous = model.relax_constraint(con).unwrap();
        assert_eq!(previous, Bounds::new(1.0, 1.0));
        assert!(model.get_constraint(con).unwrap().bounds.is_free());
    }

    #[test]
    fn test_variable_bounds_validation() {
        let mut model = Model::new();
        let result = model.add_variable(Variable::continuous(Bounds::new(5.0, 1.0)));
        assert!(matches!(
            result,
            Err(ModelError::InvalidVariableBounds { .. })
        ));
    }

    #[test]
    fn test_constraint_bounds_validation() {
        let mut model = Model::new();
        let result = model.add_constraint(Constraint {
            bounds: Bounds::new(10.0, 0.0),
        });
        assert!(matches!(
            result,
            Err(ModelError::InvalidConstraintBounds { .. })
        ));
    }
}
