#![allow(clippy::float_cmp)]

use replen_policy::{LaneSpec, NetworkBuilder, ReplenishmentProfile, StockParams};

fn stock() -> StockParams {
    StockParams::new(1.0, 5.0, 20.0, 5.0, 20.0)
}

fn always(horizon: usize) -> ReplenishmentProfile {
    ReplenishmentProfile::from_fn("always", horizon, |_| true)
}

/// Valid supply → warehouse → retailer chain; tests add one defect each.
fn chain(horizon: usize) -> NetworkBuilder {
    NetworkBuilder::new(horizon)
        .supply("S")
        .warehouse("W", stock())
        .retailer("R", "W", stock())
        .lane("S", "W", LaneSpec::new(1.0, 1))
        .lane("W", "R", LaneSpec::new(1.0, 1))
        .demand("R", vec![5.0; horizon])
        .profile(always(horizon))
}

fn error_code(builder: NetworkBuilder) -> &'static str {
    builder.build().unwrap_err().code()
}

#[test]
fn valid_chain_builds() {
    let net = chain(3).build().unwrap();
    assert_eq!(net.horizon(), 3);
    assert_eq!(net.periods().collect::<Vec<_>>(), vec![1, 2, 3]);
    let retailer = net.entity_index("R").unwrap();
    assert_eq!(net.demand(retailer, 2), 5.0);
    assert!(net.home_lane(retailer).is_some());
}

#[test]
fn empty_horizon_is_rejected() {
    let builder = NetworkBuilder::new(0).supply("S").profile(always(0));
    assert_eq!(error_code(builder), "CONFIG_EMPTY_HORIZON");
}

#[test]
fn duplicate_entity_is_rejected() {
    assert_eq!(
        error_code(chain(3).warehouse("W", stock())),
        "CONFIG_DUPLICATE_ENTITY"
    );
}

#[test]
fn exactly_one_supply_node_is_required() {
    assert_eq!(error_code(chain(3).supply("S2")), "CONFIG_SUPPLY_COUNT");
}

#[test]
fn negative_cost_is_rejected() {
    let builder = chain(3).warehouse("W2", StockParams::new(-1.0, 5.0, 0.0, 0.0, 10.0));
    let err = builder.build().unwrap_err();
    assert_eq!(err.code(), "CONFIG_INVALID_VALUE");
    assert!(err.to_string().contains("holding_cost"));
}

#[test]
fn reorder_point_above_order_up_to_is_rejected() {
    let builder = chain(3).warehouse("W2", StockParams::new(1.0, 5.0, 0.0, 30.0, 10.0));
    assert_eq!(error_code(builder), "CONFIG_REORDER_ABOVE_ORDER_UP_TO");
}

#[test]
fn lanes_must_follow_the_echelons() {
    assert_eq!(
        error_code(chain(3).lane("R", "W", LaneSpec::new(1.0, 1))),
        "CONFIG_ILLEGAL_LANE"
    );
    assert_eq!(
        error_code(chain(3).lane("S", "R", LaneSpec::new(1.0, 1))),
        "CONFIG_ILLEGAL_LANE"
    );
}

#[test]
fn duplicate_and_dangling_lanes_are_rejected() {
    assert_eq!(
        error_code(chain(3).lane("W", "R", LaneSpec::new(2.0, 2))),
        "CONFIG_DUPLICATE_LANE"
    );
    assert_eq!(
        error_code(chain(3).lane("W", "R9", LaneSpec::new(1.0, 1))),
        "CONFIG_UNKNOWN_ENTITY"
    );
}

#[test]
fn warehouse_needs_a_supply_lane() {
    assert_eq!(
        error_code(chain(3).warehouse("W2", stock())),
        "CONFIG_MISSING_SUPPLY_LANE"
    );
}

#[test]
fn retailer_needs_its_home_lane() {
    let builder = chain(3)
        .retailer("R2", "W", stock())
        .demand("R2", [1.0; 3]);
    assert_eq!(error_code(builder), "CONFIG_MISSING_HOME_LANE");
}

#[test]
fn home_must_be_a_known_warehouse() {
    assert_eq!(
        error_code(chain(3).retailer("R2", "X", stock())),
        "CONFIG_UNKNOWN_HOME"
    );
    assert_eq!(
        error_code(chain(3).retailer("R2", "S", stock())),
        "CONFIG_UNKNOWN_HOME"
    );
}

#[test]
fn demand_is_never_defaulted() {
    let builder = chain(3)
        .retailer("R2", "W", stock())
        .lane("W", "R2", LaneSpec::new(1.0, 1))
        .demand_at("R2", 1, 4.0)
        .demand_at("R2", 3, 4.0);
    let err = builder.build().unwrap_err();
    assert_eq!(err.code(), "CONFIG_MISSING_DEMAND");
    assert!(err.to_string().contains("period 2"));
}

#[test]
fn demand_outside_horizon_or_off_retailer_is_rejected() {
    assert_eq!(
        error_code(chain(3).demand_at("R", 4, 1.0)),
        "CONFIG_DEMAND_OUT_OF_HORIZON"
    );
    assert_eq!(
        error_code(chain(3).demand_at("W", 1, 1.0)),
        "CONFIG_NOT_A_RETAILER"
    );
    assert_eq!(
        error_code(chain(3).demand_at("R", 1, -1.0)),
        "CONFIG_INVALID_VALUE"
    );
}

#[test]
fn profile_catalog_is_checked() {
    let no_profiles = NetworkBuilder::new(2)
        .supply("S")
        .warehouse("W", stock())
        .lane("S", "W", LaneSpec::new(1.0, 1));
    assert_eq!(error_code(no_profiles), "CONFIG_EMPTY_PROFILES");

    let short = chain(3).profile(ReplenishmentProfile::new("short", vec![true, false]));
    assert_eq!(error_code(short), "CONFIG_PROFILE_LENGTH");

    assert_eq!(error_code(chain(3).profile(always(3))), "CONFIG_DUPLICATE_PROFILE");
}

#[test]
fn big_m_override_must_be_positive() {
    assert_eq!(error_code(chain(3).big_m(0.0)), "CONFIG_INVALID_BIG_M");
    assert_eq!(chain(3).big_m(500.0).build().unwrap().big_m(), 500.0);
}

#[test]
fn big_m_is_floored_for_all_zero_data() {
    let zero = StockParams::new(0.0, 0.0, 0.0, 0.0, 0.0);
    let net = NetworkBuilder::new(2)
        .supply("S")
        .warehouse("W", zero)
        .retailer("R", "W", zero)
        .lane("S", "W", LaneSpec::new(0.0, 0))
        .lane("W", "R", LaneSpec::new(0.0, 0))
        .demand("R", [0.0, 0.0])
        .profile(always(2))
        .build()
        .unwrap();
    assert_eq!(net.big_m(), 1.0);
}

#[test]
fn profile_masks_are_one_based() {
    let odd = ReplenishmentProfile::from_fn("odd", 4, |t| t % 2 == 1);
    assert!(odd.permits(1));
    assert!(!odd.permits(2));
    assert!(!odd.permits(0));
    assert!(!odd.permits(5));
    assert_eq!(odd.first_permitted(), Some(1));
    assert_eq!(
        ReplenishmentProfile::from_fn("even", 4, |t| t % 2 == 0).first_permitted(),
        Some(2)
    );
}
