//! Formulation switches for [`crate::ModelBuilder`].

use crate::error::ModelBuildError;

/// How reorder-point semantics are linearized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ReorderPolicy {
    /// Threshold detection with a `below` indicator: an order is placed exactly
    /// when the calendar allows it and inventory is under the reorder point.
    #[default]
    Explicit,
    /// Order-up-to coupling only; the solver decides when to order.
    Simplified,
}

impl ReorderPolicy {
    pub fn as_str(self) -> &'static str {
        match self {
            ReorderPolicy::Explicit => "explicit",
            ReorderPolicy::Simplified => "simplified",
        }
    }
}

/// Which lanes may carry shipments into a retailer.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Sourcing {
    #[default]
    Home,
    /// Every configured lane into a retailer; their sum equals the order.
    Multi,
}

impl Sourcing {
    pub fn as_str(self) -> &'static str {
        match self {
            Sourcing::Home => "home",
            Sourcing::Multi => "multi",
        }
    }
}

/// Emission accounting priced into the objective.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct EmissionPricing {
    pub cost_weight: f64,
}

impl EmissionPricing {
    pub fn new(cost_weight: f64) -> Self {
        Self { cost_weight }
    }
}

impl Default for EmissionPricing {
    fn default() -> Self {
        Self { cost_weight: 1.0 }
    }
}

pub const DEFAULT_REORDER_TOLERANCE: f64 = 1e-3;

#[derive(Debug, Clone, PartialEq)]
pub struct BuildOptions {
    pub reorder_policy: ReorderPolicy,
    /// Cap inventory at each entity's storage capacity.
    pub capacity_cap: bool,
    pub emissions: Option<EmissionPricing>,
    /// Force ending inventory back to its initial level.
    pub closed_horizon: bool,
    pub sourcing: Sourcing,
    /// Gap below the reorder point that counts as "below" (explicit policy).
    pub reorder_tolerance: f64,
}

impl Default for BuildOptions {
    fn default() -> Self {
        Self {
            reorder_policy: ReorderPolicy::default(),
            capacity_cap: false,
            emissions: None,
            closed_horizon: false,
            sourcing: Sourcing::default(),
            reorder_tolerance: DEFAULT_REORDER_TOLERANCE,
        }
    }
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_reorder_policy(mut self, policy: ReorderPolicy) -> Self {
        self.reorder_policy = policy;
        self
    }

    pub fn with_capacity_cap(mut self, enabled: bool) -> Self {
        self.capacity_cap = enabled;
        self
    }

    pub fn with_emissions(mut self, pricing: EmissionPricing) -> Self {
        self.emissions = Some(pricing);
        self
    }

    pub fn with_closed_horizon(mut self, enabled: bool) -> Self {
        self.closed_horizon = enabled;
        self
    }

    pub fn with_sourcing(mut self, sourcing: Sourcing) -> Self {
        self.sourcing = sourcing;
        self
    }

    pub fn with_reorder_tolerance(mut self, tolerance: f64) -> Self {
        self.reorder_tolerance = tolerance;
        self
    }

    pub(crate) fn validate(&self) -> Result<(), ModelBuildError> {
        if !(self.reorder_tolerance.is_finite() && self.reorder_tolerance > 0.0) {
            return Err(ModelBuildError::InvalidOption {
                option: "reorder_tolerance",
                value: self.reorder_tolerance,
            });
        }
        if let Some(pricing) = self.emissions {
            if !(pricing.cost_weight.is_finite() && pricing.cost_weight >= 0.0) {
                return Err(ModelBuildError::InvalidOption {
                    option: "emissions.cost_weight",
                    value: pricing.cost_weight,
                });
            }
        }
        Ok(())
    }
}
