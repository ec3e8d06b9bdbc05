//! Periodic-review (s,S) replenishment planning for multi-echelon networks.
//!
//! A [`NetworkConfig`] describes supply, warehouses, retailers, lanes and
//! calendar profiles. [`ModelBuilder`] turns it into a `replen_core::Model`
//! and [`WarmStartHeuristic`] builds a starting assignment for it.

pub mod builder;
pub mod error;
pub mod handles;
pub mod heuristic;
pub mod network;
pub mod options;
pub mod scenario;

pub use builder::{InventoryModel, ModelBuilder};
pub use error::{ConfigError, HeuristicError, ModelBuildError};
pub use handles::{ConstraintFamily, ModelHandles};
pub use heuristic::{PlannedOrder, ProfileChoice, WarmStartHeuristic, WarmStartPlan};
pub use network::{
    Entity, EntityIndex, EntityKind, Lane, LaneSpec, NetworkBuilder, NetworkConfig, Period,
    ProfileIndex, ReplenishmentProfile, StockParams,
};
pub use options::{BuildOptions, EmissionPricing, ReorderPolicy, Sourcing};
