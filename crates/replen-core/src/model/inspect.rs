//! Model inspection and snapshot methods.

use std::collections::HashSet;

use crate::types::{Bounds, Sense};
use replen_expr::ids::{ConstraintId, VariableId};

use crate::model::Model;

/// View of a variable in a model snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct VariableView {
    pub id: VariableId,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub is_integer: bool,
    pub metadata: Option<serde_json::Value>,
}

/// View of a constraint in a model snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ConstraintView {
    pub id: ConstraintId,
    pub name: Option<String>,
    pub bounds: Bounds,
    pub nnz: usize,
    pub metadata: Option<serde_json::Value>,
}

/// View of a coefficient in a model snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct CoefficientView {
    pub variable_id: VariableId,
    pub constraint_id: ConstraintId,
    pub value: f64,
}

/// View of the objective in a model snapshot.
#[derive(Debug, Clone, PartialEq)]
pub struct ObjectiveView {
    pub sense: Option<Sense>,
    pub terms: Vec<(VariableId, f64)>,
    pub name: Option<String>,
}

/// Metadata about a model snapshot.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct SnapshotMetadata {
    pub variables: usize,
    pub constraints: usize,
    pub coefficients: usize,
    pub integer_variables: usize,
}

/// A complete snapshot of a model.
#[derive(Debug, Clone)]
pub struct ModelSnapshot {
    pub variables: Vec<VariableView>,
    pub constraints: Vec<ConstraintView>,
    pub coefficients: Option<Vec<CoefficientView>>,
    pub objective: Option<ObjectiveView>,
    pub metadata: SnapshotMetadata,
}

impl ModelSnapshot {
    /// Names of all named variables in the snapshot.
    pub fn variable_names(&self) -> Vec<&str> {
        self.variables
            .iter()
            .filter_map(|view| view.name.as_deref())
            .collect()
    }

    /// Names of all named constraints in the snapshot.
    pub fn constraint_names(&self) -> Vec<&str> {
        self.constraints
            .iter()
            .filter_map(|view| view.name.as_deref())
            .collect()
    }
}

/// Options for inspecting a model.
#[derive(Debug, Clone, Default)]
pub struct InspectOptions {
    pub include_coefficients: bool,
    pub variable_filter: Option<Vec<VariableId>>,
    pub constraint_filter: Option<Vec<ConstraintId>>,
}

impl Model {
    /// Inspect the model structure and return a structured snapshot.
    pub fn inspect(&self, options: InspectOptions) -> ModelSnapshot {
        let InspectOptions {
            include_coefficients,
            variable_filter,
            constraint_filter,
        } = options;

        let var_filter: Option<HashSet<VariableId>> =
            variable_filter.map(|ids| ids.into_iter().collect());
        let con_filter: Option<HashSet<ConstraintId>> =
            constraint_filter.map(|ids| ids.into_iter().collect());

        let mut nnz = vec![0usize; self.num_constraints()];
        let mut coefficients: Vec<CoefficientView> = Vec::new();

        for (var_id, coeffs) in &self.columns {
            if var_filter
                .as_ref()
                .is_some_and(|filter| !filter.contains(var_id))
            {
                continue;
            }
            for (constraint_id, coeff) in coeffs {
                if con_filter
                    .as_ref()
                    .is_some_and(|filter| !filter.contains(constraint_id))
                {
                    continue;
                }
                if let Some(entry) = nnz.get_mut(constraint_id.index()) {
                    *entry += 1;
                }
                if include_coefficients {
                    coefficients.push(CoefficientView {
                        variable_id: *var_id,
                        constraint_id: *constraint_id,
                        value: *coeff,
                    });
                }
            }
        }

        let variables = self
            .variables()
            .filter(|(id, _)| var_filter.as_ref().is_none_or(|filter| filter.contains(id)))
            .map(|(id, var)| VariableView {
                id,
                name: self.get_variable_name(id).map(str::to_string),
                bounds: var.bounds,
                is_integer: var.is_integer,
                metadata: self.get_variable_metadata(id).cloned(),
            })
            .collect();

        let constraints = self
            .constraints()
            .filter(|(id, _)| con_filter.as_ref().is_none_or(|filter| filter.contains(id)))
            .map(|(id, constraint)| ConstraintView {
                id,
                name: self.get_constraint_name(id).map(str::to_string),
                bounds: constraint.bounds,
                nnz: nnz.get(id.index()).copied().unwrap_or(0),
                metadata: self.get_constraint_metadata(id).cloned(),
            })
            .collect();

        let objective = if self.objective.sense.is_some() || !self.objective.terms.is_empty() {
            Some(ObjectiveView {
                sense: self.objective.sense,
                terms: self.objective.terms.clone(),
                name: self.objective_name.clone(),
            })
        } else {
            None
        };

        ModelSnapshot {
            variables,
            constraints,
            coefficients: include_coefficients.then_some(coefficients),
            objective,
            metadata: SnapshotMetadata {
                variables: self.num_variables(),
                constraints: self.num_constraints(),
                coefficients: self.num_coefficients(),
                integer_variables: self.variables.iter().filter(|v| v.is_integer).count(),
            },
        }
    }
}
