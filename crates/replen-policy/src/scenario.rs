//! Ready-made networks.
//!
//! [`reference_network`] is the two-warehouse, four-retailer case with a
//! 15-period horizon. [`single_chain`] is a one-warehouse, one-retailer,
//! 4-period network small enough to solve by hand.

use crate::error::ConfigError;
use crate::network::{LaneSpec, NetworkBuilder, NetworkConfig, ReplenishmentProfile, StockParams};

const REFERENCE_HORIZON: usize = 15;
const REFERENCE_LEAD: usize = 3;
const REFERENCE_ORDERING_COST: f64 = 30.0;

/// (name, holding, initial, order-up-to)
const REFERENCE_WAREHOUSES: [(&str, f64, f64, f64); 2] =
    [("W1", 0.20, 1200.0, 1600.0), ("W2", 0.20, 1100.0, 1500.0)];

/// (name, home, holding, initial, order-up-to, demand per period)
const REFERENCE_RETAILERS: [(&str, &str, f64, f64, f64, f64); 4] = [
    ("R1", "W1", 0.60, 350.0, 900.0, 50.0),
    ("R2", "W1", 0.60, 450.0, 950.0, 60.0),
    ("R3", "W1", 0.60, 500.0, 1000.0, 70.0),
    ("R4", "W2", 0.60, 600.0, 1050.0, 80.0),
];

const REFERENCE_SUPPLY_COSTS: [(&str, f64); 2] = [("W1", 0.55), ("W2", 0.22)];

const REFERENCE_RETAIL_COSTS: [(&str, [f64; 4]); 2] = [
    ("W1", [0.22, 0.20, 0.32, 0.38]),
    ("W2", [0.68, 0.52, 0.34, 0.10]),
];

/// The six calendar profiles of the reference case.
pub fn reference_profiles(horizon: usize) -> Vec<ReplenishmentProfile> {
    vec![
        ReplenishmentProfile::from_fn("every", horizon, |_| true),
        ReplenishmentProfile::from_fn("odd", horizon, |t| t % 2 == 1),
        ReplenishmentProfile::from_fn("even", horizon, |t| t % 2 == 0),
        ReplenishmentProfile::from_fn("cycle3_1", horizon, |t| t % 3 == 1),
        ReplenishmentProfile::from_fn("cycle3_2", horizon, |t| t % 3 == 2),
        ReplenishmentProfile::from_fn("cycle3_0", horizon, |t| t % 3 == 0),
    ]
}

fn reference_builder(
    warehouse_capacity: Option<f64>,
    retailer_capacity: Option<f64>,
) -> NetworkBuilder {
    let mut builder = NetworkBuilder::new(REFERENCE_HORIZON).supply("W0");

    for (name, holding, initial, order_up_to) in REFERENCE_WAREHOUSES {
        let mut stock = StockParams::new(
            holding,
            REFERENCE_ORDERING_COST,
            initial,
            order_up_to / 2.0,
            order_up_to,
        );
        if let Some(capacity) = warehouse_capacity {
            stock = stock.with_capacity(capacity);
        }
        builder = builder.warehouse(name, stock);
    }
    for (name, home, holding, initial, order_up_to, demand) in REFERENCE_RETAILERS {
        let mut stock = StockParams::new(
            holding,
            REFERENCE_ORDERING_COST,
            initial,
            order_up_to / 2.0,
            order_up_to,
        );
        if let Some(capacity) = retailer_capacity {
            stock = stock.with_capacity(capacity);
        }
        builder = builder
            .retailer(name, home, stock)
            .demand(name, std::iter::repeat_n(demand, REFERENCE_HORIZON));
    }

    // Emission factors track unit cost so the priced variant stays comparable.
    for (warehouse, cost) in REFERENCE_SUPPLY_COSTS {
        builder = builder.lane(
            "W0",
            warehouse,
            LaneSpec::new(cost, REFERENCE_LEAD).with_emission_factor(cost),
        );
    }
    for (warehouse, costs) in REFERENCE_RETAIL_COSTS {
        for ((retailer, ..), cost) in REFERENCE_RETAILERS.iter().zip(costs) {
            builder = builder.lane(
                warehouse,
                *retailer,
                LaneSpec::new(cost, REFERENCE_LEAD).with_emission_factor(cost),
            );
        }
    }

    for profile in reference_profiles(REFERENCE_HORIZON) {
        builder = builder.profile(profile);
    }
    builder
}

/// Reference network without storage capacities.
///
/// Reorder points are half the order-up-to level.
pub fn reference_network() -> Result<NetworkConfig, ConfigError> {
    reference_builder(None, None).build()
}

/// Reference network with 2000 units of storage at warehouses and 1200 at retailers.
pub fn reference_network_with_capacity() -> Result<NetworkConfig, ConfigError> {
    reference_builder(Some(2000.0), Some(1200.0)).build()
}

fn chain_builder(retailer_capacity: Option<f64>, emission_factors: bool) -> NetworkBuilder {
    let horizon = 4;
    let mut retailer = StockParams::new(1.0, 5.0, 20.0, 10.0, 30.0);
    if let Some(capacity) = retailer_capacity {
        retailer = retailer.with_capacity(capacity);
    }
    let (mut supply_lane, mut retail_lane) = (LaneSpec::new(1.0, 1), LaneSpec::new(1.0, 1));
    if emission_factors {
        supply_lane = supply_lane.with_emission_factor(0.5);
        retail_lane = retail_lane.with_emission_factor(2.0);
    }

    NetworkBuilder::new(horizon)
        .supply("S")
        .warehouse("W", StockParams::new(1.0, 5.0, 40.0, 15.0, 50.0))
        .retailer("R", "W", retailer)
        .lane("S", "W", supply_lane)
        .lane("W", "R", retail_lane)
        .demand("R", [10.0; 4])
        .profile(ReplenishmentProfile::from_fn("always", horizon, |_| true))
        .profile(ReplenishmentProfile::from_fn("odd", horizon, |t| t % 2 == 1))
        .profile(ReplenishmentProfile::from_fn("even", horizon, |t| t % 2 == 0))
}

/// Supply `S` → warehouse `W` → retailer `R`, lead 1 and unit cost 1 on both lanes.
///
/// `W` holds 40 with `(s, S) = (15, 50)`; `R` holds 20 with `(s, S) = (10, 30)` and
/// sees 10 units of demand per period. Holding costs 1, ordering 5.
pub fn single_chain() -> Result<NetworkConfig, ConfigError> {
    chain_builder(None, false).build()
}

/// [`single_chain`] with emission factors 0.5 (`S→W`) and 2.0 (`W→R`).
pub fn single_chain_with_emission_factors() -> Result<NetworkConfig, ConfigError> {
    chain_builder(None, true).build()
}

/// [`single_chain`] with a storage capacity on the retailer.
pub fn single_chain_with_retailer_capacity(capacity: f64) -> Result<NetworkConfig, ConfigError> {
    chain_builder(Some(capacity), false).build()
}

#[cfg(test)]
#[allow(clippy::float_cmp)]
mod tests {
    use super::*;

    #[test]
    fn reference_tables_are_complete() {
        let net = reference_network().unwrap();
        assert_eq!(net.horizon(), 15);
        assert_eq!(net.warehouses().count(), 2);
        assert_eq!(net.retailers().count(), 4);
        assert_eq!(net.lanes().len(), 10);
        assert_eq!(net.profiles().len(), 6);

        let r4 = net.entity_index("R4").unwrap();
        let w2 = net.entity_index("W2").unwrap();
        assert_eq!(net.entity(r4).home, Some(w2));
        assert_eq!(net.home_lane(r4).unwrap().spec.unit_cost, 0.10);
        assert_eq!(net.demand(r4, 15), 80.0);
        assert_eq!(net.stock(r4).unwrap().reorder_point, 525.0);
    }

    #[test]
    fn reference_big_m_is_derived_from_data() {
        // max(15·80 + 1200, 1200 + 16·1600)
        assert_eq!(reference_network().unwrap().big_m(), 26_800.0);
    }

    #[test]
    fn capacity_variant_caps_every_stocked_entity() {
        let net = reference_network_with_capacity().unwrap();
        for entity in net.stocked() {
            assert!(net.stock(entity).unwrap().capacity.is_some());
        }
    }

    #[test]
    fn chain_big_m() {
        // max(4·10 + 40, 40 + 5·50)
        assert_eq!(single_chain().unwrap().big_m(), 290.0);
    }
}
