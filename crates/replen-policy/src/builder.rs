//! Translation of a [`NetworkConfig`] into a replenishment MILP.

use std::time::Instant;

use replen_core::{Model, Variable};
use replen_expr::{ConstraintExpr, ConstraintId, Expr, VariableId};
use serde_json::json;
use tracing::{debug, info};

use crate::error::ModelBuildError;
use crate::handles::{ConstraintFamily, ModelHandles};
use crate::network::{EntityIndex, EntityKind, Lane, NetworkConfig, Period};
use crate::options::{BuildOptions, ReorderPolicy, Sourcing};

/// A built model together with the ids of everything in it.
#[derive(Debug, Clone)]
pub struct InventoryModel {
    pub model: Model,
    pub handles: ModelHandles,
}

/// Emits variables, constraints and the cost objective for one network.
pub struct ModelBuilder<'a> {
    network: &'a NetworkConfig,
    options: BuildOptions,
    model: Model,
    handles: ModelHandles,
}

impl<'a> ModelBuilder<'a> {
    pub fn new(network: &'a NetworkConfig, options: BuildOptions) -> Self {
        Self {
            network,
            options,
            model: Model::new(),
            handles: ModelHandles::default(),
        }
    }

    /// Lanes that get shipment variables: every supply lane, and per retailer
    /// its home lane or all of its inbound lanes.
    fn active_lanes(&self) -> Vec<Lane> {
        let net = self.network;
        let supply = net.warehouses().filter_map(|w| net.supply_lane(w).copied());
        let inbound = net.retailers().flat_map(|r| -> Vec<Lane> {
            match self.options.sourcing {
                Sourcing::Home => net.home_lane(r).copied().into_iter().collect(),
                Sourcing::Multi => net.lanes_into(r).copied().collect(),
            }
        });
        supply.chain(inbound).collect()
    }

    pub fn build(mut self) -> Result<InventoryModel, ModelBuildError> {
        let started = Instant::now();
        self.options.validate()?;
        if self.options.emissions.is_some() {
            self.check_emission_factors()?;
        }

        let lanes = self.active_lanes();
        self.add_variables(&lanes)?;
        self.add_balance_rows(&lanes)?;
        self.add_profile_rows()?;
        self.add_gating_rows()?;
        match self.options.reorder_policy {
            ReorderPolicy::Explicit => self.add_explicit_reorder_rows()?,
            ReorderPolicy::Simplified => self.add_simplified_reorder_rows()?,
        }
        self.add_shipment_order_rows(&lanes)?;
        if self.options.capacity_cap {
            self.add_capacity_rows()?;
        }
        if self.options.emissions.is_some() {
            self.add_emission_rows(&lanes)?;
        }
        if self.options.closed_horizon {
            self.add_closed_horizon_rows()?;
        }
        self.set_cost_objective(&lanes)?;

        info!(
            component = "model_builder",
            operation = "build",
            status = "success",
            reorder_policy = self.options.reorder_policy.as_str(),
            sourcing = self.options.sourcing.as_str(),
            capacity_cap = self.options.capacity_cap,
            emissions = self.options.emissions.is_some(),
            closed_horizon = self.options.closed_horizon,
            variables = self.model.num_variables(),
            constraints = self.model.num_constraints(),
            nnz = self.model.num_coefficients(),
            big_m = self.network.big_m(),
            duration_ms = started.elapsed().as_secs_f64() * 1000.0,
            "Built replenishment model"
        );

        Ok(InventoryModel {
            model: self.model,
            handles: self.handles,
        })
    }

    fn check_emission_factors(&self) -> Result<(), ModelBuildError> {
        let net = self.network;
        match net
            .lanes()
            .iter()
            .find(|lane| lane.spec.emission_factor.is_none())
        {
            Some(lane) => Err(ModelBuildError::MissingEmissionFactor {
                origin: net.name(lane.origin).to_string(),
                destination: net.name(lane.destination).to_string(),
            }),
            None => Ok(()),
        }
    }

    fn variable(
        &mut self,
        family: &'static str,
        label: &str,
        period: Option<Period>,
        variable: Variable,
    ) -> Result<VariableId, ModelBuildError> {
        let name = match period {
            Some(t) => format!("{family}[{label},{t}]"),
            None => format!("{family}[{label}]"),
        };
        let id = self.model.add_named_variable(name, variable)?;
        self.model.set_variable_metadata(
            id,
            json!({ "family": family, "entity": label, "period": period }),
        )?;
        Ok(id)
    }

    fn row(
        &mut self,
        family: ConstraintFamily,
        entity: EntityIndex,
        period: Option<Period>,
        constraint: ConstraintExpr,
    ) -> Result<ConstraintId, ModelBuildError> {
        let net = self.network;
        let entity_name = net.name(entity);
        let name = match period {
            Some(t) => format!("{}[{entity_name},{t}]", family.as_str()),
            None => format!("{}[{entity_name}]", family.as_str()),
        };
        let metadata = json!({
            "family": family.as_str(),
            "entity": entity_name,
            "period": period,
        });
        let id = self.model.add_named_constraint(name, constraint)?;
        self.model.set_constraint_metadata(id, metadata)?;
        self.handles.push_constraint(family, id);
        Ok(id)
    }

    fn log_family(&self, family: ConstraintFamily) {
        debug!(
            component = "model_builder",
            operation = "add_constraints",
            status = "success",
            family = family.as_str(),
            rows = self.handles.constraints(family).len(),
            "Added constraint family"
        );
    }

    fn add_variables(&mut self, lanes: &[Lane]) -> Result<(), ModelBuildError> {
        let net = self.network;
        let explicit = self.options.reorder_policy == ReorderPolicy::Explicit;

        for entity in net.stocked() {
            let label = net.name(entity).to_string();
            for t in net.periods() {
                let inventory =
                    self.variable("inventory", &label, Some(t), Variable::non_negative())?;
                self.handles.inventory.insert((entity, t), inventory);
                let allowed = self.variable("allowed", &label, Some(t), Variable::binary())?;
                self.handles.allowed.insert((entity, t), allowed);
                let placed = self.variable("placed", &label, Some(t), Variable::binary())?;
                self.handles.placed.insert((entity, t), placed);
                let order_qty =
                    self.variable("order_qty", &label, Some(t), Variable::non_negative())?;
                self.handles.order_qty.insert((entity, t), order_qty);
                if explicit {
                    let below = self.variable("below", &label, Some(t), Variable::binary())?;
                    self.handles.below.insert((entity, t), below);
                }
            }
            for profile in net.profile_indices() {
                let profile_name = &net.profile(profile).name;
                let id = self.variable(
                    "profile",
                    &format!("{label},{profile_name}"),
                    None,
                    Variable::binary(),
                )?;
                self.model.set_variable_metadata(
                    id,
                    json!({ "family": "profile", "entity": label, "profile": profile_name }),
                )?;
                self.handles.profile.insert((entity, profile), id);
            }
        }

        for lane in lanes {
            let origin = lane.origin;
            let destination = lane.destination;
            for t in net.periods() {
                if net.kind(origin) == EntityKind::Supply {
                    let label = net.name(destination).to_string();
                    let id =
                        self.variable("ship_supply", &label, Some(t), Variable::non_negative())?;
                    self.handles.ship_supply.insert((destination, t), id);
                } else {
                    let label = format!("{},{}", net.name(origin), net.name(destination));
                    let id = self.variable("ship", &label, Some(t), Variable::non_negative())?;
                    self.handles.ship.insert((origin, destination, t), id);
                }
            }
        }

        if self.options.emissions.is_some() {
            let id = self.model.add_named_variable("total_emissions", Variable::non_negative())?;
            self.model
                .set_variable_metadata(id, json!({ "family": "total_emissions" }))?;
            self.handles.total_emissions = Some(id);
        }

        debug!(
            component = "model_builder",
            operation = "add_variables",
            status = "success",
            variables = self.model.num_variables(),
            lanes = lanes.len(),
            "Added decision variables"
        );
        Ok(())
    }

    /// Shipment on `lane` sent at `period`, if that variable exists.
    fn shipment(&self, lane: &Lane, period: Period) -> Option<VariableId> {
        if self.network.kind(lane.origin) == EntityKind::Supply {
            self.handles.ship_supply(lane.destination, period)
        } else {
            self.handles.ship(lane.origin, lane.destination, period)
        }
    }

    fn add_balance_rows(&mut self, lanes: &[Lane]) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            let Some(stock) = net.stock(entity).copied() else {
                continue;
            };
            for t in net.periods() {
                let mut expr = Expr::new_empty();
                if let Some(inv) = self.handles.inventory(entity, t) {
                    expr.push_term(inv, 1.0);
                }
                if t > 1 {
                    if let Some(prev) = self.handles.inventory(entity, t - 1) {
                        expr.push_term(prev, -1.0);
                    }
                }
                for lane in lanes.iter().filter(|lane| lane.destination == entity) {
                    // Shipments sent before period 1 do not exist.
                    let Some(sent) = t.checked_sub(lane.spec.lead_time).filter(|s| *s >= 1)
                    else {
                        continue;
                    };
                    if let Some(ship) = self.shipment(lane, sent) {
                        expr.push_term(ship, -1.0);
                    }
                }
                match net.kind(entity) {
                    EntityKind::Warehouse => {
                        for lane in lanes.iter().filter(|lane| lane.origin == entity) {
                            if let Some(ship) = self.shipment(lane, t) {
                                expr.push_term(ship, 1.0);
                            }
                        }
                    }
                    EntityKind::Retailer => expr.push_constant(net.demand(entity, t)),
                    EntityKind::Supply => {}
                }
                let rhs = if t == 1 { stock.initial_inventory } else { 0.0 };
                self.row(
                    ConstraintFamily::Balance,
                    entity,
                    Some(t),
                    expr.eq_scalar(rhs),
                )?;
            }
        }
        self.log_family(ConstraintFamily::Balance);
        Ok(())
    }

    fn add_profile_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            let choice: Vec<(VariableId, f64)> = net
                .profile_indices()
                .filter_map(|p| self.handles.profile(entity, p).map(|id| (id, 1.0)))
                .collect();
            self.row(
                ConstraintFamily::ProfilePartition,
                entity,
                None,
                Expr::from_linear(choice).eq_scalar(1.0),
            )?;

            for t in net.periods() {
                let Some(allowed) = self.handles.allowed(entity, t) else {
                    continue;
                };
                let mut expr = Expr::var(allowed);
                for p in net.profile_indices() {
                    if net.profile(p).permits(t) {
                        if let Some(id) = self.handles.profile(entity, p) {
                            expr.push_term(id, -1.0);
                        }
                    }
                }
                self.row(
                    ConstraintFamily::ProfileMask,
                    entity,
                    Some(t),
                    expr.eq_scalar(0.0),
                )?;
            }
        }
        self.log_family(ConstraintFamily::ProfilePartition);
        self.log_family(ConstraintFamily::ProfileMask);
        Ok(())
    }

    fn add_gating_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            for t in net.periods() {
                let (Some(placed), Some(allowed)) =
                    (self.handles.placed(entity, t), self.handles.allowed(entity, t))
                else {
                    continue;
                };
                self.row(
                    ConstraintFamily::OrderGating,
                    entity,
                    Some(t),
                    (Expr::var(placed) - Expr::var(allowed)).le_scalar(0.0),
                )?;
            }
        }
        self.log_family(ConstraintFamily::OrderGating);
        Ok(())
    }

    fn add_explicit_reorder_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        let big_m = net.big_m();
        let epsilon = self.options.reorder_tolerance;
        for entity in net.stocked() {
            let Some(stock) = net.stock(entity).copied() else {
                continue;
            };
            let s = stock.reorder_point;
            for t in net.periods() {
                let h = &self.handles;
                let (Some(inv), Some(below), Some(placed), Some(allowed), Some(qty)) = (
                    h.inventory(entity, t),
                    h.below(entity, t),
                    h.placed(entity, t),
                    h.allowed(entity, t),
                    h.order_qty(entity, t),
                ) else {
                    continue;
                };
                let period = Some(t);
                self.row(
                    ConstraintFamily::BelowReorderLow,
                    entity,
                    period,
                    (Expr::var(inv) + Expr::term(below, big_m)).ge_scalar(s),
                )?;
                self.row(
                    ConstraintFamily::BelowReorderHigh,
                    entity,
                    period,
                    (Expr::var(inv) + Expr::term(below, big_m)).le_scalar(s - epsilon + big_m),
                )?;
                self.row(
                    ConstraintFamily::PlacedRequiresBelow,
                    entity,
                    period,
                    (Expr::var(placed) - Expr::var(below)).le_scalar(0.0),
                )?;
                self.row(
                    ConstraintFamily::PlacedWhenAllowedAndBelow,
                    entity,
                    period,
                    (Expr::var(placed) - Expr::var(allowed) - Expr::var(below)).ge_scalar(-1.0),
                )?;
                self.order_quantity_rows(entity, t, inv, placed, qty, stock.order_up_to, true)?;
            }
        }
        for family in [
            ConstraintFamily::BelowReorderLow,
            ConstraintFamily::BelowReorderHigh,
            ConstraintFamily::PlacedRequiresBelow,
            ConstraintFamily::PlacedWhenAllowedAndBelow,
            ConstraintFamily::OrderQuantityLink,
            ConstraintFamily::OrderUpToLower,
            ConstraintFamily::OrderUpToUpper,
        ] {
            self.log_family(family);
        }
        Ok(())
    }

    fn add_simplified_reorder_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            let Some(stock) = net.stock(entity).copied() else {
                continue;
            };
            for t in net.periods() {
                let h = &self.handles;
                let (Some(inv), Some(placed), Some(qty)) = (
                    h.inventory(entity, t),
                    h.placed(entity, t),
                    h.order_qty(entity, t),
                ) else {
                    continue;
                };
                self.order_quantity_rows(entity, t, inv, placed, qty, stock.order_up_to, false)?;
            }
        }
        self.log_family(ConstraintFamily::OrderQuantityLink);
        self.log_family(ConstraintFamily::OrderUpToLower);
        Ok(())
    }

    /// `order_qty ≤ M·placed`; placed lifts `inv + order_qty` to at least `S`
    /// and, when `exact`, to at most `S` as well.
    #[allow(clippy::too_many_arguments)]
    fn order_quantity_rows(
        &mut self,
        entity: EntityIndex,
        t: Period,
        inv: VariableId,
        placed: VariableId,
        qty: VariableId,
        order_up_to: f64,
        exact: bool,
    ) -> Result<(), ModelBuildError> {
        let big_m = self.network.big_m();
        let period = Some(t);
        self.row(
            ConstraintFamily::OrderQuantityLink,
            entity,
            period,
            (Expr::var(qty) - Expr::term(placed, big_m)).le_scalar(0.0),
        )?;
        self.row(
            ConstraintFamily::OrderUpToLower,
            entity,
            period,
            (Expr::var(inv) + Expr::var(qty) - Expr::term(placed, big_m))
                .ge_scalar(order_up_to - big_m),
        )?;
        if exact {
            self.row(
                ConstraintFamily::OrderUpToUpper,
                entity,
                period,
                (Expr::var(inv) + Expr::var(qty) + Expr::term(placed, big_m))
                    .le_scalar(order_up_to + big_m),
            )?;
        }
        Ok(())
    }

    fn add_shipment_order_rows(&mut self, lanes: &[Lane]) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            for t in net.periods() {
                let Some(qty) = self.handles.order_qty(entity, t) else {
                    continue;
                };
                let mut expr = Expr::term(qty, -1.0);
                for lane in lanes.iter().filter(|lane| lane.destination == entity) {
                    if let Some(ship) = self.shipment(lane, t) {
                        expr.push_term(ship, 1.0);
                    }
                }
                self.row(
                    ConstraintFamily::ShipmentOrder,
                    entity,
                    Some(t),
                    expr.eq_scalar(0.0),
                )?;
            }
        }
        self.log_family(ConstraintFamily::ShipmentOrder);
        Ok(())
    }

    fn add_capacity_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        for entity in net.stocked() {
            let Some(capacity) = net.stock(entity).and_then(|stock| stock.capacity) else {
                continue;
            };
            for t in net.periods() {
                if let Some(inv) = self.handles.inventory(entity, t) {
                    self.row(
                        ConstraintFamily::Capacity,
                        entity,
                        Some(t),
                        Expr::var(inv).le_scalar(capacity),
                    )?;
                }
            }
        }
        self.log_family(ConstraintFamily::Capacity);
        Ok(())
    }

    fn add_emission_rows(&mut self, lanes: &[Lane]) -> Result<(), ModelBuildError> {
        let Some(total) = self.handles.total_emissions else {
            return Ok(());
        };
        let net = self.network;
        let mut expr = Expr::var(total);
        for lane in lanes {
            let factor = lane.spec.emission_factor.unwrap_or(0.0);
            for t in net.periods() {
                if let Some(ship) = self.shipment(lane, t) {
                    expr.push_term(ship, -factor);
                }
            }
        }
        let name = ConstraintFamily::EmissionsAccounting.as_str();
        let id = self
            .model
            .add_named_constraint(name, expr.eq_scalar(0.0))?;
        self.model
            .set_constraint_metadata(id, json!({ "family": name }))?;
        self.handles
            .push_constraint(ConstraintFamily::EmissionsAccounting, id);
        self.log_family(ConstraintFamily::EmissionsAccounting);
        Ok(())
    }

    fn add_closed_horizon_rows(&mut self) -> Result<(), ModelBuildError> {
        let net = self.network;
        let last = net.horizon();
        for entity in net.stocked() {
            let (Some(stock), Some(inv)) =
                (net.stock(entity).copied(), self.handles.inventory(entity, last))
            else {
                continue;
            };
            self.row(
                ConstraintFamily::ClosedHorizon,
                entity,
                None,
                Expr::var(inv).eq_scalar(stock.initial_inventory),
            )?;
        }
        self.log_family(ConstraintFamily::ClosedHorizon);
        Ok(())
    }

    fn set_cost_objective(&mut self, lanes: &[Lane]) -> Result<(), ModelBuildError> {
        let net = self.network;
        let mut objective = Expr::new_empty();
        for entity in net.stocked() {
            let Some(stock) = net.stock(entity).copied() else {
                continue;
            };
            for t in net.periods() {
                if let Some(placed) = self.handles.placed(entity, t) {
                    objective.push_term(placed, stock.ordering_cost);
                }
                if let Some(inv) = self.handles.inventory(entity, t) {
                    objective.push_term(inv, stock.holding_cost);
                }
            }
        }
        for lane in lanes {
            for t in net.periods() {
                if let Some(ship) = self.shipment(lane, t) {
                    objective.push_term(ship, lane.spec.unit_cost);
                }
            }
        }
        if let (Some(total), Some(pricing)) = (self.handles.total_emissions, self.options.emissions)
        {
            objective.push_term(total, pricing.cost_weight);
        }
        self.model.minimize(objective)?;
        self.model.set_objective_name(Some("total_cost".to_string()));
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;
    use crate::scenario::single_chain;

    #[test]
    fn balance_rows_fold_demand_and_initial_inventory_into_rhs() {
        let net = single_chain().unwrap();
        let built = ModelBuilder::new(&net, BuildOptions::new()).build().unwrap();
        let retailer = net.entity_index("R").unwrap();
        let first = built
            .model
            .get_constraint_by_name("balance[R,1]")
            .unwrap();
        let bounds = built.model.get_constraint(first).unwrap().bounds;
        assert_eq!(bounds.lower, 10.0);
        assert_eq!(bounds.upper, 10.0);

        // No inflow at t = 1 since the lane has lead 1.
        let row = built.model.row(first);
        assert_eq!(row.len(), 1);
        assert_eq!(row[0].0, built.handles.inventory(retailer, 1).unwrap());
    }

    #[test]
    fn emissions_need_a_factor_on_every_lane() {
        let net = single_chain().unwrap();
        let err = ModelBuilder::new(
            &net,
            BuildOptions::new().with_emissions(crate::options::EmissionPricing::new(1.0)),
        )
        .build()
        .unwrap_err();
        assert_eq!(err.code(), "BUILD_MISSING_EMISSION_FACTOR");
    }

    #[test]
    fn variables_carry_metadata() {
        let net = single_chain().unwrap();
        let built = ModelBuilder::new(&net, BuildOptions::new()).build().unwrap();
        let id = built.model.get_variable_by_name("inventory[W,2]").unwrap();
        let meta = built.model.get_variable_metadata(id).unwrap();
        assert_eq!(meta["family"], "inventory");
        assert_eq!(meta["entity"], "W");
        assert_eq!(meta["period"], 2);
    }

    #[test]
    fn rows_carry_family_metadata() {
        let net = single_chain().unwrap();
        let built = ModelBuilder::new(&net, BuildOptions::new().with_closed_horizon(true))
            .build()
            .unwrap();
        let row = built.model.get_constraint_by_name("placed_requires_below[R,3]").unwrap();
        let meta = built.model.get_constraint_metadata(row).unwrap();
        assert_eq!(meta["family"], "placed_requires_below");
        assert_eq!(meta["entity"], "R");
        assert_eq!(meta["period"], 3);

        let closed = built.model.get_constraint_by_name("closed_horizon[W]").unwrap();
        assert!(built.model.get_constraint_metadata(closed).unwrap()["period"].is_null());
    }
}
