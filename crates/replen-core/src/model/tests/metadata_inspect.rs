use super::support::{bounded_constraint, continuous_variable};
use super::*;

#[test]
fn test_variable_name_lifecycle() {
    let mut model = Model::new();
    let var = model
        .add_variable(continuous_variable(0.0, 10.0))
        .unwrap();
    assert!(model.get_variable_name(var).is_none());
    model.set_variable_name(var, "x".to_string()).unwrap();
    assert_eq!(model.get_variable_name(var), Some("x"));
}

#[test]
fn test_variable_metadata() {
    let mut model = Model::new();
    let var = model
        .add_variable(continuous_variable(0.0, 10.0))
        .unwrap();
    let meta = serde_json::json!({"unit": "MW", "description": "power"});
    model.set_variable_metadata(var, meta.clone()).unwrap();
    assert_eq!(model.get_variable_metadata(var), Some(&meta));
}

#[test]
fn test_constraint_name_lifecycle() {
    let mut model = Model::new();
    let con = model
        .add_constraint(bounded_constraint(0.0, 100.0))
        .unwrap();
    assert!(model.get_constraint_name(con).is_none());
    model
        .set_constraint_name(con, "capacity".to_string())
        .unwrap();
    assert_eq!(model.get_constraint_name(con), Some("capacity"));
}

#[test]
fn test_name_lookup_helpers() {
    let mut model = Model::new();
    let var = model
        .add_variable(continuous_variable(0.0, 1.0))
        .unwrap();
    let con = model.add_constraint(bounded_constraint(0.0, 1.0)).unwrap();
    model.set_variable_name(var, "x".to_string()).unwrap();
    model.set_constraint_name(con, "limit".to_string()).unwrap();

    assert_eq!(model.get_variable_by_name("x"), Some(var));
    assert_eq!(model.get_constraint_by_name("limit"), Some(con));
    assert!(model.get_variable_by_name("missing").is_none());
    assert!(model.get_constraint_by_name("missing").is_none());
}

#[test]
fn test_constraint_metadata() {
    let mut model = Model::new();
    let con = model
        .add_constraint(bounded_constraint(0.0, 100.0))
        .unwrap();
    let meta = serde_json::json!({"type": "capacity", "region": "north"});
    model.set_constraint_metadata(con, meta.clone()).unwrap();
    assert_eq!(model.get_constraint_metadata(con), Some(&meta));
}

#[test]
fn inspect_includes_coefficients_and_metadata() {
    let mut model = Model::new();
    let x = model
        .add_named_variable("inventory[W1,1]", continuous_variable(0.0, 10.0))
        .unwrap();
    let y = model.add_variable(Variable::binary()).unwrap();
    let var_meta = serde_json::json!({"family": "inventory", "entity": "W1", "period": 1});
    model
        .set_variable_metadata(x, var_meta.clone())
        .expect("meta set");

    let c = model.add_constraint(bounded_constraint(5.0, 5.0)).unwrap();
    model
        .set_constraint_name(c, "balance[W1,1]".to_string())
        .expect("name set");
    let con_meta = serde_json::json!({"family": "balance"});
    model
        .set_constraint_metadata(c, con_meta.clone())
        .expect("meta set");

    model.set_coefficient(x, c, 1.5).unwrap();
    model.set_coefficient(y, c, -2.0).unwrap();
    model
        .minimize(Expr::term(x, 1.0) + Expr::term(y, 30.0))
        .expect("objective set");
    model.set_objective_name(Some("total_cost".to_string()));

    let snapshot = model.inspect(InspectOptions {
        include_coefficients: true,
        ..InspectOptions::default()
    });

    assert_eq!(snapshot.variables.len(), 2);
    assert_eq!(snapshot.variable_names(), vec!["inventory[W1,1]"]);
    let var_view = &snapshot.variables[0];
    assert_eq!(var_view.metadata, Some(var_meta));
    assert!(!var_view.is_integer);
    assert!(snapshot.variables[1].is_integer);

    assert_eq!(snapshot.constraint_names(), vec!["balance[W1,1]"]);
    let con_view = &snapshot.constraints[0];
    assert_eq!(con_view.nnz, 2);
    assert_eq!(con_view.metadata, Some(con_meta));

    let coeffs = snapshot
        .coefficients
        .as_ref()
        .expect("coefficients missing");
    assert_eq!(coeffs.len(), 2);
    assert!(
        coeffs
            .iter()
            .any(|coeff| coeff.variable_id == x && coeff.constraint_id == c && coeff.value == 1.5)
    );

    let objective = snapshot.objective.as_ref().expect("objective missing");
    assert_eq!(objective.sense, Some(Sense::Minimize));
    assert_eq!(objective.terms, vec![(x, 1.0), (y, 30.0)]);
    assert_eq!(objective.name.as_deref(), Some("total_cost"));

    assert_eq!(snapshot.metadata.variables, 2);
    assert_eq!(snapshot.metadata.integer_variables, 1);
    assert_eq!(snapshot.metadata.coefficients, 2);
}

#[test]
fn inspect_respects_filters() {
    let mut model = Model::new();
    let x = model.add_variable(continuous_variable(0.0, 10.0)).unwrap();
    let y = model.add_variable(continuous_variable(0.0, 5.0)).unwrap();

    let c1 = model.add_constraint(bounded_constraint(0.0, 10.0)).unwrap();
    let c2 = model.add_constraint(bounded_constraint(0.0, 10.0)).unwrap();

    model.set_coefficient(x, c1, 1.0).unwrap();
    model.set_coefficient(y, c2, 2.0).unwrap();
    model.set_coefficient(y, c1, 3.0).unwrap();

    let snapshot = model.inspect(InspectOptions {
        include_coefficients: true,
        variable_filter: Some(vec![x]),
        constraint_filter: Some(vec![c1]),
    });

    assert_eq!(snapshot.variables.len(), 1);
    assert_eq!(snapshot.variables[0].id, x);
    assert_eq!(snapshot.constraints.len(), 1);
    assert_eq!(snapshot.constraints[0].id, c1);
    assert_eq!(snapshot.constraints[0].nnz, 1);

    let coeffs = snapshot.coefficients.as_ref().expect("coeffs missing");
    assert_eq!(coeffs.len(), 1);
    assert_eq!(coeffs[0].variable_id, x);
    assert_eq!(coeffs[0].constraint_id, c1);
    assert!(snapshot.objective.is_none());
}

#[test]
fn inspect_without_coefficients_omits_them() {
    let mut model = Model::new();
    let x = model.add_variable(continuous_variable(0.0, 1.0)).unwrap();
    let c = model.add_constraint(bounded_constraint(0.0, 1.0)).unwrap();
    model.set_coefficient(x, c, 1.0).unwrap();

    let snapshot = model.inspect(InspectOptions::default());
    assert!(snapshot.coefficients.is_none());
    assert_eq!(snapshot.constraints[0].nnz, 1);
}
