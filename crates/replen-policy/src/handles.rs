//! Typed lookups from domain keys to model ids.

use std::collections::BTreeMap;

use replen_expr::{ConstraintId, VariableId};

use crate::network::{EntityIndex, Period, ProfileIndex};

/// Group a constraint row belongs to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum ConstraintFamily {
    Balance,
    /// One active profile per entity.
    ProfilePartition,
    /// `allowed[e,t]` equals the mask of the active profile.
    ProfileMask,
    /// `placed ≤ allowed`.
    OrderGating,
    /// Not below implies `inv ≥ s`.
    BelowReorderLow,
    /// Below implies `inv ≤ s − ε`.
    BelowReorderHigh,
    /// `placed ≤ below`.
    PlacedRequiresBelow,
    /// `placed ≥ allowed + below − 1`.
    PlacedWhenAllowedAndBelow,
    /// `order_qty ≤ M·placed`.
    OrderQuantityLink,
    /// Placed implies `inv + order_qty ≥ S`.
    OrderUpToLower,
    /// Placed implies `inv + order_qty ≤ S`.
    OrderUpToUpper,
    ShipmentOrder,
    Capacity,
    EmissionsAccounting,
    ClosedHorizon,
}

impl ConstraintFamily {
    pub const ALL: [ConstraintFamily; 15] = [
        ConstraintFamily::Balance,
        ConstraintFamily::ProfilePartition,
        ConstraintFamily::ProfileMask,
        ConstraintFamily::OrderGating,
        ConstraintFamily::BelowReorderLow,
        ConstraintFamily::BelowReorderHigh,
        ConstraintFamily::PlacedRequiresBelow,
        ConstraintFamily::PlacedWhenAllowedAndBelow,
        ConstraintFamily::OrderQuantityLink,
        ConstraintFamily::OrderUpToLower,
        ConstraintFamily::OrderUpToUpper,
        ConstraintFamily::ShipmentOrder,
        ConstraintFamily::Capacity,
        ConstraintFamily::EmissionsAccounting,
        ConstraintFamily::ClosedHorizon,
    ];

    /// Row name prefix, e.g. `balance[W1,3]`.
    pub fn as_str(self) -> &'static str {
        match self {
            ConstraintFamily::Balance => "balance",
            ConstraintFamily::ProfilePartition => "profile_partition",
            ConstraintFamily::ProfileMask => "profile_mask",
            ConstraintFamily::OrderGating => "order_gating",
            ConstraintFamily::BelowReorderLow => "below_reorder_low",
            ConstraintFamily::BelowReorderHigh => "below_reorder_high",
            ConstraintFamily::PlacedRequiresBelow => "placed_requires_below",
            ConstraintFamily::PlacedWhenAllowedAndBelow => "placed_when_allowed_and_below",
            ConstraintFamily::OrderQuantityLink => "order_quantity_link",
            ConstraintFamily::OrderUpToLower => "order_up_to_lower",
            ConstraintFamily::OrderUpToUpper => "order_up_to_upper",
            ConstraintFamily::ShipmentOrder => "shipment_order",
            ConstraintFamily::Capacity => "capacity",
            ConstraintFamily::EmissionsAccounting => "emissions",
            ConstraintFamily::ClosedHorizon => "closed_horizon",
        }
    }
}

/// Ids of every variable and row the builder emitted.
///
/// Lookups return `None` for keys the chosen variant did not create.
#[derive(Debug, Clone, Default)]
pub struct ModelHandles {
    pub(crate) inventory: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) ship_supply: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) ship: BTreeMap<(EntityIndex, EntityIndex, Period), VariableId>,
    pub(crate) profile: BTreeMap<(EntityIndex, ProfileIndex), VariableId>,
    pub(crate) allowed: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) placed: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) order_qty: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) below: BTreeMap<(EntityIndex, Period), VariableId>,
    pub(crate) total_emissions: Option<VariableId>,
    pub(crate) constraints: BTreeMap<ConstraintFamily, Vec<ConstraintId>>,
}

impl ModelHandles {
    pub fn inventory(&self, entity: EntityIndex, period: Period) -> Option<VariableId> {
        self.inventory.get(&(entity, period)).copied()
    }

    pub fn ship_supply(&self, warehouse: EntityIndex, period: Period) -> Option<VariableId> {
        self.ship_supply.get(&(warehouse, period)).copied()
    }

    pub fn ship(
        &self,
        warehouse: EntityIndex,
        retailer: EntityIndex,
        period: Period,
    ) -> Option<VariableId> {
        self.ship.get(&(warehouse, retailer, period)).copied()
    }

    pub fn profile(&self, entity: EntityIndex, profile: ProfileIndex) -> Option<VariableId> {
        self.profile.get(&(entity, profile)).copied()
    }

    pub fn allowed(&self, entity: EntityIndex, period: Period) -> Option<VariableId> {
        self.allowed.get(&(entity, period)).copied()
    }

    pub fn placed(&self, entity: EntityIndex, period: Period) -> Option<VariableId> {
        self.placed.get(&(entity, period)).copied()
    }

    pub fn order_qty(&self, entity: EntityIndex, period: Period) -> Option<VariableId> {
        self.order_qty.get(&(entity, period)).copied()
    }

    /// Only present under the explicit reorder policy.
    pub fn below(&self, entity: EntityIndex, period: Period) -> Option<VariableId> {
        self.below.get(&(entity, period)).copied()
    }

    pub fn total_emissions(&self) -> Option<VariableId> {
        self.total_emissions
    }

    /// Rows of one family, in emission order. Empty when the family is off.
    pub fn constraints(&self, family: ConstraintFamily) -> &[ConstraintId] {
        self.constraints
            .get(&family)
            .map(Vec::as_slice)
            .unwrap_or(&[])
    }

    /// Every shipment variable, keyed by `(warehouse, retailer, period)`.
    pub fn shipments(
        &self,
    ) -> impl Iterator<Item = ((EntityIndex, EntityIndex, Period), VariableId)> + '_ {
        self.ship.iter().map(|(key, id)| (*key, *id))
    }

    pub(crate) fn push_constraint(&mut self, family: ConstraintFamily, id: ConstraintId) {
        self.constraints.entry(family).or_default().push(id);
    }
}
