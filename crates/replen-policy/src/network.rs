//! Immutable description of a supply network and its planning horizon.
//!
//! A [`NetworkConfig`] is assembled once through [`NetworkBuilder`] and
//! validated in [`NetworkBuilder::build`]; afterwards it is only read.

use std::collections::{BTreeMap, BTreeSet};
use std::ops::RangeInclusive;

use crate::error::ConfigError;

/// One-based period index inside the horizon.
pub type Period = usize;

/// Dense index of an entity in [`NetworkConfig::entities`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct EntityIndex(usize);

impl EntityIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

/// Dense index of a profile in [`NetworkConfig::profiles`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub struct ProfileIndex(usize);

impl ProfileIndex {
    pub fn index(self) -> usize {
        self.0
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum EntityKind {
    /// Infinite source with no cost attributes.
    Supply,
    Warehouse,
    Retailer,
}

impl EntityKind {
    pub fn as_str(self) -> &'static str {
        match self {
            EntityKind::Supply => "supply",
            EntityKind::Warehouse => "warehouse",
            EntityKind::Retailer => "retailer",
        }
    }
}

/// Stocking parameters of a warehouse or retailer.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct StockParams {
    pub holding_cost: f64,
    pub ordering_cost: f64,
    pub initial_inventory: f64,
    /// Reorder point `s`.
    pub reorder_point: f64,
    /// Order-up-to level `S`.
    pub order_up_to: f64,
    pub capacity: Option<f64>,
}

impl StockParams {
    pub fn new(
        holding_cost: f64,
        ordering_cost: f64,
        initial_inventory: f64,
        reorder_point: f64,
        order_up_to: f64,
    ) -> Self {
        Self {
            holding_cost,
            ordering_cost,
            initial_inventory,
            reorder_point,
            order_up_to,
            capacity: None,
        }
    }

    pub fn with_capacity(mut self, capacity: f64) -> Self {
        self.capacity = Some(capacity);
        self
    }
}

/// Transport attributes of a directed lane.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct LaneSpec {
    pub unit_cost: f64,
    pub lead_time: usize,
    pub emission_factor: Option<f64>,
}

impl LaneSpec {
    pub fn new(unit_cost: f64, lead_time: usize) -> Self {
        Self {
            unit_cost,
            lead_time,
            emission_factor: None,
        }
    }

    pub fn with_emission_factor(mut self, factor: f64) -> Self {
        self.emission_factor = Some(factor);
        self
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct Entity {
    pub name: String,
    pub kind: EntityKind,
    /// `None` only for the supply node.
    pub stock: Option<StockParams>,
    /// Home warehouse of a retailer.
    pub home: Option<EntityIndex>,
}

#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Lane {
    pub origin: EntityIndex,
    pub destination: EntityIndex,
    pub spec: LaneSpec,
}

/// Named calendar mask: `permits(t)` is true when an order may be placed at `t`.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ReplenishmentProfile {
    pub name: String,
    mask: Vec<bool>,
}

impl ReplenishmentProfile {
    pub fn new(name: impl Into<String>, mask: Vec<bool>) -> Self {
        Self {
            name: name.into(),
            mask,
        }
    }

    /// Mask from a predicate over periods `1..=horizon`.
    pub fn from_fn(
        name: impl Into<String>,
        horizon: usize,
        permits: impl Fn(Period) -> bool,
    ) -> Self {
        Self::new(name, (1..=horizon).map(permits).collect())
    }

    pub fn permits(&self, period: Period) -> bool {
        period >= 1 && self.mask.get(period - 1).copied().unwrap_or(false)
    }

    pub fn mask(&self) -> &[bool] {
        &self.mask
    }

    pub fn is_always(&self) -> bool {
        self.mask.iter().all(|allowed| *allowed)
    }

    /// First period the profile permits.
    pub fn first_permitted(&self) -> Option<Period> {
        self.mask.iter().position(|allowed| *allowed).map(|idx| idx + 1)
    }
}

/// Validated, read-only network data.
#[derive(Debug, Clone)]
pub struct NetworkConfig {
    horizon: usize,
    entities: Vec<Entity>,
    lanes: Vec<Lane>,
    profiles: Vec<ReplenishmentProfile>,
    demand: BTreeMap<EntityIndex, Vec<f64>>,
    big_m: f64,
}

impl NetworkConfig {
    pub fn horizon(&self) -> usize {
        self.horizon
    }

    pub fn periods(&self) -> RangeInclusive<Period> {
        1..=self.horizon
    }

    pub fn entities(&self) -> &[Entity] {
        &self.entities
    }

    pub fn entity(&self, index: EntityIndex) -> &Entity {
        &self.entities[index.0]
    }

    pub fn entity_index(&self, name: &str) -> Option<EntityIndex> {
        self.entities
            .iter()
            .position(|entity| entity.name == name)
            .map(EntityIndex)
    }

    pub fn name(&self, index: EntityIndex) -> &str {
        &self.entity(index).name
    }

    pub fn kind(&self, index: EntityIndex) -> EntityKind {
        self.entity(index).kind
    }

    /// Stock parameters of a warehouse or retailer.
    pub fn stock(&self, index: EntityIndex) -> Option<&StockParams> {
        self.entity(index).stock.as_ref()
    }

    fn of_kind(&self, kind: EntityKind) -> impl Iterator<Item = EntityIndex> + '_ {
        self.entities
            .iter()
            .enumerate()
            .filter(move |(_, entity)| entity.kind == kind)
            .map(|(idx, _)| EntityIndex(idx))
    }

    pub fn supply(&self) -> EntityIndex {
        self.of_kind(EntityKind::Supply)
            .next()
            .unwrap_or(EntityIndex(0))
    }

    pub fn warehouses(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.of_kind(EntityKind::Warehouse)
    }

    pub fn retailers(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.of_kind(EntityKind::Retailer)
    }

    /// Warehouses then retailers: every entity that holds stock and orders.
    pub fn stocked(&self) -> impl Iterator<Item = EntityIndex> + '_ {
        self.warehouses().chain(self.retailers())
    }

    pub fn lanes(&self) -> &[Lane] {
        &self.lanes
    }

    pub fn lane(&self, origin: EntityIndex, destination: EntityIndex) -> Option<&Lane> {
        self.lanes
            .iter()
            .find(|lane| lane.origin == origin && lane.destination == destination)
    }

    /// Every configured lane ending at `destination`.
    pub fn lanes_into(&self, destination: EntityIndex) -> impl Iterator<Item = &Lane> + '_ {
        self.lanes
            .iter()
            .filter(move |lane| lane.destination == destination)
    }

    /// The supply lane of a warehouse.
    pub fn supply_lane(&self, warehouse: EntityIndex) -> Option<&Lane> {
        self.lane(self.supply(), warehouse)
    }

    /// The lane from a retailer's home warehouse.
    pub fn home_lane(&self, retailer: EntityIndex) -> Option<&Lane> {
        let home = self.entity(retailer).home?;
        self.lane(home, retailer)
    }

    pub fn profiles(&self) -> &[ReplenishmentProfile] {
        &self.profiles
    }

    pub fn profile_indices(&self) -> impl Iterator<Item = ProfileIndex> {
        (0..self.profiles.len()).map(ProfileIndex)
    }

    pub fn profile(&self, index: ProfileIndex) -> &ReplenishmentProfile {
        &self.profiles[index.0]
    }

    pub fn profile_index(&self, name: &str) -> Option<ProfileIndex> {
        self.profiles
            .iter()
            .position(|profile| profile.name == name)
            .map(ProfileIndex)
    }

    /// Demand of a retailer at a period; zero for non-retailers.
    pub fn demand(&self, retailer: EntityIndex, period: Period) -> f64 {
        self.demand
            .get(&retailer)
            .and_then(|series| series.get(period.wrapping_sub(1)))
            .copied()
            .unwrap_or(0.0)
    }

    /// Linearization constant used by every conditional constraint.
    pub fn big_m(&self) -> f64 {
        self.big_m
    }
}

/// Accumulates network data; all checks happen in [`NetworkBuilder::build`].
#[derive(Debug, Clone, Default)]
pub struct NetworkBuilder {
    horizon: usize,
    entities: Vec<(String, EntityKind, Option<StockParams>, Option<String>)>,
    lanes: Vec<(String, String, LaneSpec)>,
    profiles: Vec<ReplenishmentProfile>,
    demand: Vec<(String, Period, f64)>,
    big_m: Option<f64>,
}

impl NetworkBuilder {
    pub fn new(horizon: usize) -> Self {
        Self {
            horizon,
            ..Self::default()
        }
    }

    pub fn supply(mut self, name: impl Into<String>) -> Self {
        self.entities
            .push((name.into(), EntityKind::Supply, None, None));
        self
    }

    pub fn warehouse(mut self, name: impl Into<String>, stock: StockParams) -> Self {
        self.entities
            .push((name.into(), EntityKind::Warehouse, Some(stock), None));
        self
    }

    pub fn retailer(
        mut self,
        name: impl Into<String>,
        home: impl Into<String>,
        stock: StockParams,
    ) -> Self {
        self.entities.push((
            name.into(),
            EntityKind::Retailer,
            Some(stock),
            Some(home.into()),
        ));
        self
    }

    pub fn lane(
        mut self,
        origin: impl Into<String>,
        destination: impl Into<String>,
        spec: LaneSpec,
    ) -> Self {
        self.lanes.push((origin.into(), destination.into(), spec));
        self
    }

    pub fn profile(mut self, profile: ReplenishmentProfile) -> Self {
        self.profiles.push(profile);
        self
    }

    /// Demand at a single period.
    pub fn demand_at(mut self, retailer: impl Into<String>, period: Period, quantity: f64) -> Self {
        self.demand.push((retailer.into(), period, quantity));
        self
    }

    /// Demand series starting at period 1.
    pub fn demand(
        mut self,
        retailer: impl Into<String>,
        series: impl IntoIterator<Item = f64>,
    ) -> Self {
        let retailer = retailer.into();
        for (offset, quantity) in series.into_iter().enumerate() {
            self.demand.push((retailer.clone(), offset + 1, quantity));
        }
        self
    }

    /// Override the derived big-M.
    pub fn big_m(mut self, value: f64) -> Self {
        self.big_m = Some(value);
        self
    }

    pub fn build(self) -> Result<NetworkConfig, ConfigError> {
        if self.horizon == 0 {
            return Err(ConfigError::EmptyHorizon);
        }

        let mut names: BTreeMap<String, EntityIndex> = BTreeMap::new();
        for (idx, (name, _, _, _)) in self.entities.iter().enumerate() {
            if names.insert(name.clone(), EntityIndex(idx)).is_some() {
                return Err(ConfigError::DuplicateEntity { name: name.clone() });
            }
        }

        let supply_count = self
            .entities
            .iter()
            .filter(|(_, kind, _, _)| *kind == EntityKind::Supply)
            .count();
        if supply_count != 1 {
            return Err(ConfigError::SupplyCount {
                count: supply_count,
            });
        }

        let mut entities = Vec::with_capacity(self.entities.len());
        for (name, kind, stock, home) in self.entities {
            if let Some(params) = stock.as_ref() {
                validate_stock(&name, params)?;
            }
            let home = match home {
                Some(home_name) => {
                    let home_idx = names.get(&home_name).copied().ok_or_else(|| {
                        ConfigError::UnknownHomeWarehouse {
                            retailer: name.clone(),
                            warehouse: home_name.clone(),
                        }
                    })?;
                    Some(home_idx)
                }
                None => None,
            };
            entities.push(Entity {
                name,
                kind,
                stock,
                home,
            });
        }

        for entity in &entities {
            if let Some(home) = entity.home {
                if entities[home.0].kind != EntityKind::Warehouse {
                    return Err(ConfigError::UnknownHomeWarehouse {
                        retailer: entity.name.clone(),
                        warehouse: entities[home.0].name.clone(),
                    });
                }
            }
        }

        let mut lanes: Vec<Lane> = Vec::with_capacity(self.lanes.len());
        let mut seen_lanes = BTreeSet::new();
        for (origin_name, destination_name, spec) in self.lanes {
            let origin = *names
                .get(&origin_name)
                .ok_or_else(|| ConfigError::UnknownEntity {
                    name: origin_name.clone(),
                })?;
            let destination = *names
                .get(&destination_name)
                .ok_or_else(|| ConfigError::UnknownEntity {
                    name: destination_name.clone(),
                })?;
            let legal = matches!(
                (entities[origin.0].kind, entities[destination.0].kind),
                (EntityKind::Supply, EntityKind::Warehouse)
                    | (EntityKind::Warehouse, EntityKind::Retailer)
            );
            if !legal {
                return Err(ConfigError::IllegalLane {
                    origin: origin_name,
                    destination: destination_name,
                });
            }
            if !seen_lanes.insert((origin, destination)) {
                return Err(ConfigError::DuplicateLane {
                    origin: origin_name,
                    destination: destination_name,
                });
            }
            check_non_negative(&origin_name, "unit_cost", spec.unit_cost)?;
            if let Some(factor) = spec.emission_factor {
                check_non_negative(&origin_name, "emission_factor", factor)?;
            }
            lanes.push(Lane {
                origin,
                destination,
                spec,
            });
        }

        for (idx, entity) in entities.iter().enumerate() {
            let target = EntityIndex(idx);
            match entity.kind {
                EntityKind::Warehouse => {
                    let has_supply = lanes.iter().any(|lane| {
                        lane.destination == target
                            && entities[lane.origin.0].kind == EntityKind::Supply
                    });
                    if !has_supply {
                        return Err(ConfigError::MissingSupplyLane {
                            warehouse: entity.name.clone(),
                        });
                    }
                }
                EntityKind::Retailer => {
                    let home = entity.home;
                    let has_home = lanes
                        .iter()
                        .any(|lane| lane.destination == target && Some(lane.origin) == home);
                    if !has_home {
                        let warehouse = home
                            .map(|home| entities[home.0].name.clone())
                            .unwrap_or_default();
                        return Err(ConfigError::MissingHomeLane {
                            retailer: entity.name.clone(),
                            warehouse,
                        });
                    }
                }
                EntityKind::Supply => {}
            }
        }

        if self.profiles.is_empty() {
            return Err(ConfigError::EmptyProfileCatalog);
        }
        let mut profile_names = BTreeSet::new();
        for profile in &self.profiles {
            if profile.mask.len() != self.horizon {
                return Err(ConfigError::ProfileLength {
                    profile: profile.name.clone(),
                    expected: self.horizon,
                    got: profile.mask.len(),
                });
            }
            if !profile_names.insert(profile.name.clone()) {
                return Err(ConfigError::DuplicateProfile {
                    name: profile.name.clone(),
                });
            }
        }

        let mut demand: BTreeMap<EntityIndex, Vec<Option<f64>>> = BTreeMap::new();
        for (idx, entity) in entities.iter().enumerate() {
            if entity.kind == EntityKind::Retailer {
                demand.insert(EntityIndex(idx), vec![None; self.horizon]);
            }
        }
        for (name, period, quantity) in self.demand {
            let idx = *names
                .get(&name)
                .ok_or_else(|| ConfigError::UnknownEntity { name: name.clone() })?;
            let series = demand
                .get_mut(&idx)
                .ok_or_else(|| ConfigError::NotARetailer { name: name.clone() })?;
            if period == 0 || period > self.horizon {
                return Err(ConfigError::DemandOutOfHorizon {
                    retailer: name,
                    period,
                });
            }
            check_non_negative(&name, "demand", quantity)?;
            series[period - 1] = Some(quantity);
        }
        let mut complete: BTreeMap<EntityIndex, Vec<f64>> = BTreeMap::new();
        for (idx, series) in demand {
            let mut values = Vec::with_capacity(series.len());
            for (offset, value) in series.into_iter().enumerate() {
                let value = value.ok_or_else(|| ConfigError::MissingDemand {
                    retailer: entities[idx.0].name.clone(),
                    period: offset + 1,
                })?;
                values.push(value);
            }
            complete.insert(idx, values);
        }

        let big_m = match self.big_m {
            Some(value) => {
                if !(value.is_finite() && value > 0.0) {
                    return Err(ConfigError::InvalidBigM { value });
                }
                value
            }
            None => derive_big_m(self.horizon, &entities, &complete),
        };

        let config = NetworkConfig {
            horizon: self.horizon,
            entities,
            lanes,
            profiles: self.profiles,
            demand: complete,
            big_m,
        };
        tracing::debug!(
            component = "network",
            operation = "build",
            status = "success",
            horizon = config.horizon,
            entities = config.entities.len(),
            lanes = config.lanes.len(),
            profiles = config.profiles.len(),
            big_m = config.big_m,
            "Validated network configuration"
        );
        Ok(config)
    }
}

/// `max(N·max_demand + max_initial, max_initial + (N+1)·max_S)`, at least 1.
fn derive_big_m(
    horizon: usize,
    entities: &[Entity],
    demand: &BTreeMap<EntityIndex, Vec<f64>>,
) -> f64 {
    let max_demand = demand
        .values()
        .flatten()
        .copied()
        .fold(0.0_f64, f64::max);
    let (max_initial, max_order_up_to) = entities
        .iter()
        .filter_map(|entity| entity.stock.as_ref())
        .fold((0.0_f64, 0.0_f64), |(initial, order_up_to), stock| {
            (
                initial.max(stock.initial_inventory),
                order_up_to.max(stock.order_up_to),
            )
        });
    let n = horizon as f64;
    let demand_bound = n * max_demand + max_initial;
    let order_bound = max_initial + (n + 1.0) * max_order_up_to;
    demand_bound.max(order_bound).max(1.0)
}

fn check_non_negative(entity: &str, field: &'static str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() && value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::InvalidValue {
            entity: entity.to_string(),
            field,
            value,
        })
    }
}

fn validate_stock(name: &str, stock: &StockParams) -> Result<(), ConfigError> {
    check_non_negative(name, "holding_cost", stock.holding_cost)?;
    check_non_negative(name, "ordering_cost", stock.ordering_cost)?;
    check_non_negative(name, "initial_inventory", stock.initial_inventory)?;
    check_non_negative(name, "reorder_point", stock.reorder_point)?;
    check_non_negative(name, "order_up_to", stock.order_up_to)?;
    if let Some(capacity) = stock.capacity {
        check_non_negative(name, "capacity", capacity)?;
    }
    if stock.reorder_point > stock.order_up_to {
        return Err(ConfigError::ReorderAboveOrderUpTo {
            entity: name.to_string(),
            reorder_point: stock.reorder_point,
            order_up_to: stock.order_up_to,
        });
    }
    Ok(())
}
