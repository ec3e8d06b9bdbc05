//! Constructive warm start: one profile for everyone, one early order each.

use std::collections::BTreeMap;

use replen_core::WarmStart;
use tracing::{debug, info};

use crate::error::HeuristicError;
use crate::handles::ModelHandles;
use crate::network::{EntityIndex, EntityKind, NetworkConfig, Period, ProfileIndex};
use crate::options::DEFAULT_REORDER_TOLERANCE;

/// Which catalog profile every entity is started on.
#[derive(Debug, Clone, PartialEq, Eq, Default)]
pub enum ProfileChoice {
    /// The first profile permitting every period, else the first profile.
    #[default]
    AlwaysAllowed,
    Named(String),
}

/// Order-up-to shipment placed at the first permitted period.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct PlannedOrder {
    pub entity: EntityIndex,
    pub profile: ProfileIndex,
    pub period: Period,
    pub quantity: f64,
}

#[derive(Debug, Clone, PartialEq)]
pub struct WarmStartPlan {
    profile: ProfileIndex,
    orders: BTreeMap<EntityIndex, PlannedOrder>,
    inventory: BTreeMap<EntityIndex, Vec<f64>>,
}

impl WarmStartPlan {
    pub fn profile(&self) -> ProfileIndex {
        self.profile
    }

    /// Orders with a positive quantity.
    pub fn orders(&self) -> impl Iterator<Item = &PlannedOrder> {
        self.orders.values()
    }

    pub fn order(&self, entity: EntityIndex) -> Option<&PlannedOrder> {
        self.orders.get(&entity)
    }

    /// Ending inventory per period implied by conservation under this plan.
    ///
    /// Values may be negative when a single order cannot cover the horizon.
    pub fn projected_inventory(&self, entity: EntityIndex) -> Option<&[f64]> {
        self.inventory.get(&entity).map(Vec::as_slice)
    }
}

pub struct WarmStartHeuristic<'a> {
    network: &'a NetworkConfig,
    choice: ProfileChoice,
}

impl<'a> WarmStartHeuristic<'a> {
    pub fn new(network: &'a NetworkConfig) -> Self {
        Self {
            network,
            choice: ProfileChoice::default(),
        }
    }

    pub fn with_profile_choice(mut self, choice: ProfileChoice) -> Self {
        self.choice = choice;
        self
    }

    fn resolve_profile(&self) -> Result<ProfileIndex, HeuristicError> {
        let net = self.network;
        match &self.choice {
            ProfileChoice::AlwaysAllowed => net
                .profile_indices()
                .find(|p| net.profile(*p).is_always())
                .or_else(|| net.profile_indices().next())
                .ok_or_else(|| HeuristicError::UnknownProfile {
                    name: "always".to_string(),
                }),
            ProfileChoice::Named(name) => net
                .profile_index(name)
                .ok_or_else(|| HeuristicError::UnknownProfile { name: name.clone() }),
        }
    }

    /// Plan retailers from their demand, then warehouses from what their
    /// retailers pull through the home lanes.
    pub fn plan(&self) -> Result<WarmStartPlan, HeuristicError> {
        let net = self.network;
        let profile = self.resolve_profile()?;
        let first = net.profile(profile).first_permitted();
        let horizon = net.horizon();

        let mut orders = BTreeMap::new();
        let mut inventory = BTreeMap::new();
        // Per-warehouse outflow caused by planned retailer orders.
        let mut pulled: BTreeMap<EntityIndex, Vec<f64>> = BTreeMap::new();

        for retailer in net.retailers() {
            let outflow: Vec<f64> = net.periods().map(|t| net.demand(retailer, t)).collect();
            let lead = net.home_lane(retailer).map_or(0, |lane| lane.spec.lead_time);
            let (order, path) = self.plan_entity(retailer, profile, first, lead, &outflow);
            if let (Some(order), Some(home)) = (order, net.entity(retailer).home) {
                let series = pulled.entry(home).or_insert_with(|| vec![0.0; horizon]);
                series[order.period - 1] += order.quantity;
                orders.insert(retailer, order);
            }
            inventory.insert(retailer, path);
        }

        for warehouse in net.warehouses() {
            let outflow = pulled
                .remove(&warehouse)
                .unwrap_or_else(|| vec![0.0; horizon]);
            let lead = net
                .supply_lane(warehouse)
                .map_or(0, |lane| lane.spec.lead_time);
            let (order, path) = self.plan_entity(warehouse, profile, first, lead, &outflow);
            if let Some(order) = order {
                orders.insert(warehouse, order);
            }
            inventory.insert(warehouse, path);
        }

        info!(
            component = "heuristic",
            operation = "plan",
            status = "success",
            profile = net.profile(profile).name.as_str(),
            first_period = first,
            orders = orders.len(),
            "Planned warm start"
        );
        Ok(WarmStartPlan {
            profile,
            orders,
            inventory,
        })
    }

    fn plan_entity(
        &self,
        entity: EntityIndex,
        profile: ProfileIndex,
        first: Option<Period>,
        lead: usize,
        outflow: &[f64],
    ) -> (Option<PlannedOrder>, Vec<f64>) {
        let net = self.network;
        let (initial, order_up_to) = net
            .stock(entity)
            .map_or((0.0, 0.0), |stock| (stock.initial_inventory, stock.order_up_to));

        let order = first.and_then(|period| {
            let drawn: f64 = outflow.iter().take(period).sum();
            let available = initial - drawn;
            let quantity = (order_up_to - available).max(0.0);
            (quantity > 0.0).then_some(PlannedOrder {
                entity,
                profile,
                period,
                quantity,
            })
        });

        let mut level = initial;
        let path = net
            .periods()
            .map(|t| {
                if let Some(order) = order.as_ref().filter(|o| o.period + lead == t) {
                    level += order.quantity;
                }
                level -= outflow.get(t - 1).copied().unwrap_or(0.0);
                level
            })
            .collect();
        (order, path)
    }

    /// Hint values for every handle the plan touches.
    ///
    /// Handles the built variant does not have are skipped.
    pub fn apply(&self, plan: &WarmStartPlan, handles: &ModelHandles) -> WarmStart {
        let net = self.network;
        let chosen = net.profile(plan.profile);
        let mut start = WarmStart::new();

        for entity in net.stocked() {
            for p in net.profile_indices() {
                if let Some(id) = handles.profile(entity, p) {
                    start.set(id, if p == plan.profile { 1.0 } else { 0.0 });
                }
            }
            for t in net.periods() {
                if let Some(id) = handles.allowed(entity, t) {
                    start.set(id, if chosen.permits(t) { 1.0 } else { 0.0 });
                }
            }
            let reorder_point = net.stock(entity).map(|stock| stock.reorder_point);
            if let Some(path) = plan.projected_inventory(entity) {
                for (offset, level) in path.iter().enumerate() {
                    let t = offset + 1;
                    let level = level.max(0.0);
                    if let Some(id) = handles.inventory(entity, t) {
                        start.set(id, level);
                    }
                    // Matches the threshold rows for the hinted level.
                    if let (Some(id), Some(s)) = (handles.below(entity, t), reorder_point) {
                        let below = level <= s - DEFAULT_REORDER_TOLERANCE;
                        start.set(id, if below { 1.0 } else { 0.0 });
                    }
                }
            }

            let Some(order) = plan.order(entity) else {
                continue;
            };
            let t = order.period;
            if let Some(id) = handles.placed(entity, t) {
                start.set(id, 1.0);
            }
            if let Some(id) = handles.order_qty(entity, t) {
                start.set(id, order.quantity);
            }
            let carrier = match net.kind(entity) {
                EntityKind::Warehouse => handles.ship_supply(entity, t),
                EntityKind::Retailer => net
                    .entity(entity)
                    .home
                    .and_then(|home| handles.ship(home, entity, t)),
                EntityKind::Supply => None,
            };
            if let Some(id) = carrier {
                start.set(id, order.quantity);
            }
        }

        debug!(
            component = "heuristic",
            operation = "apply",
            status = "success",
            hints = start.len(),
            "Translated plan into warm start"
        );
        start
    }
}
