//! Error types for network validation, model construction and warm starts.

use replen_core::ModelError;

/// Rejected network data. Raised by [`crate::NetworkBuilder::build`].
#[derive(Debug, Clone, PartialEq)]
pub enum ConfigError {
    EmptyHorizon,
    DuplicateEntity {
        name: String,
    },
    SupplyCount {
        count: usize,
    },
    UnknownEntity {
        name: String,
    },
    NotARetailer {
        name: String,
    },
    UnknownHomeWarehouse {
        retailer: String,
        warehouse: String,
    },
    /// Cost, inventory, demand or capacity that is negative or not finite.
    InvalidValue {
        entity: String,
        field: &'static str,
        value: f64,
    },
    ReorderAboveOrderUpTo {
        entity: String,
        reorder_point: f64,
        order_up_to: f64,
    },
    /// Lane that is neither supply→warehouse nor warehouse→retailer.
    IllegalLane {
        origin: String,
        destination: String,
    },
    DuplicateLane {
        origin: String,
        destination: String,
    },
    MissingSupplyLane {
        warehouse: String,
    },
    MissingHomeLane {
        retailer: String,
        warehouse: String,
    },
    EmptyProfileCatalog,
    ProfileLength {
        profile: String,
        expected: usize,
        got: usize,
    },
    DuplicateProfile {
        name: String,
    },
    MissingDemand {
        retailer: String,
        period: usize,
    },
    DemandOutOfHorizon {
        retailer: String,
        period: usize,
    },
    InvalidBigM {
        value: f64,
    },
}

impl ConfigError {
    /// Returns a semantic error code for programmatic handling.
    pub fn code(&self) -> &'static str {
        match self {
            ConfigError::EmptyHorizon => "CONFIG_EMPTY_HORIZON",
            ConfigError::DuplicateEntity { .. } => "CONFIG_DUPLICATE_ENTITY",
            ConfigError::SupplyCount { .. } => "CONFIG_SUPPLY_COUNT",
            ConfigError::UnknownEntity { .. } => "CONFIG_UNKNOWN_ENTITY",
            ConfigError::NotARetailer { .. } => "CONFIG_NOT_A_RETAILER",
            ConfigError::UnknownHomeWarehouse { .. } => "CONFIG_UNKNOWN_HOME",
            ConfigError::InvalidValue { .. } => "CONFIG_INVALID_VALUE",
            ConfigError::ReorderAboveOrderUpTo { .. } => "CONFIG_REORDER_ABOVE_ORDER_UP_TO",
            ConfigError::IllegalLane { .. } => "CONFIG_ILLEGAL_LANE",
            ConfigError::DuplicateLane { .. } => "CONFIG_DUPLICATE_LANE",
            ConfigError::MissingSupplyLane { .. } => "CONFIG_MISSING_SUPPLY_LANE",
            ConfigError::MissingHomeLane { .. } => "CONFIG_MISSING_HOME_LANE",
            ConfigError::EmptyProfileCatalog => "CONFIG_EMPTY_PROFILES",
            ConfigError::ProfileLength { .. } => "CONFIG_PROFILE_LENGTH",
            ConfigError::DuplicateProfile { .. } => "CONFIG_DUPLICATE_PROFILE",
            ConfigError::MissingDemand { .. } => "CONFIG_MISSING_DEMAND",
            ConfigError::DemandOutOfHorizon { .. } => "CONFIG_DEMAND_OUT_OF_HORIZON",
            ConfigError::InvalidBigM { .. } => "CONFIG_INVALID_BIG_M",
        }
    }
}

impl std::fmt::Display for ConfigError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let code = self.code();
        match self {
            ConfigError::EmptyHorizon => write!(f, "[{code}] Planning horizon must be at least 1"),
            ConfigError::DuplicateEntity { name } => {
                write!(f, "[{code}] Entity '{name}' is defined more than once")
            }
            ConfigError::SupplyCount { count } => write!(
                f,
                "[{code}] Network needs exactly one supply node (found {count})"
            ),
            ConfigError::UnknownEntity { name } => {
                write!(f, "[{code}] Entity '{name}' is not defined")
            }
            ConfigError::NotARetailer { name } => {
                write!(f, "[{code}] Demand given for '{name}', which is not a retailer")
            }
            ConfigError::UnknownHomeWarehouse {
                retailer,
                warehouse,
            } => write!(
                f,
                "[{code}] Retailer '{retailer}' names '{warehouse}' as home, \
                 which is not a warehouse"
            ),
            ConfigError::InvalidValue {
                entity,
                field,
                value,
            } => write!(
                f,
                "[{code}] {field} of '{entity}' must be finite and non-negative (got {value})"
            ),
            ConfigError::ReorderAboveOrderUpTo {
                entity,
                reorder_point,
                order_up_to,
            } => write!(
                f,
                "[{code}] Reorder point of '{entity}' ({reorder_point}) exceeds \
                 order-up-to level ({order_up_to})"
            ),
            ConfigError::IllegalLane {
                origin,
                destination,
            } => write!(
                f,
                "[{code}] Lane {origin} -> {destination} must run supply -> warehouse \
                 or warehouse -> retailer"
            ),
            ConfigError::DuplicateLane {
                origin,
                destination,
            } => write!(f, "[{code}] Lane {origin} -> {destination} is defined twice"),
            ConfigError::MissingSupplyLane { warehouse } => {
                write!(f, "[{code}] Warehouse '{warehouse}' has no supply lane")
            }
            ConfigError::MissingHomeLane {
                retailer,
                warehouse,
            } => write!(
                f,
                "[{code}] Retailer '{retailer}' has no lane from its home warehouse '{warehouse}'"
            ),
            ConfigError::EmptyProfileCatalog => {
                write!(f, "[{code}] At least one replenishment profile is required")
            }
            ConfigError::ProfileLength {
                profile,
                expected,
                got,
            } => write!(
                f,
                "[{code}] Profile '{profile}' covers {got} periods, horizon has {expected}"
            ),
            ConfigError::DuplicateProfile { name } => {
                write!(f, "[{code}] Profile '{name}' is defined more than once")
            }
            ConfigError::MissingDemand { retailer, period } => write!(
                f,
                "[{code}] Retailer '{retailer}' has no demand for period {period}"
            ),
            ConfigError::DemandOutOfHorizon { retailer, period } => write!(
                f,
                "[{code}] Demand of '{retailer}' at period {period} is outside the horizon"
            ),
            ConfigError::InvalidBigM { value } => {
                write!(f, "[{code}] Big-M must be finite and positive (got {value})")
            }
        }
    }
}

impl std::error::Error for ConfigError {}

/// Failure while translating a network into a MILP.
#[derive(Debug, Clone, PartialEq)]
pub enum ModelBuildError {
    Model(ModelError),
    /// Emission pricing is on but a lane carries no factor.
    MissingEmissionFactor {
        origin: String,
        destination: String,
    },
    InvalidOption {
        option: &'static str,
        value: f64,
    },
}

impl ModelBuildError {
    pub fn code(&self) -> &'static str {
        match self {
            ModelBuildError::Model(err) => err.code(),
            ModelBuildError::MissingEmissionFactor { .. } => "BUILD_MISSING_EMISSION_FACTOR",
            ModelBuildError::InvalidOption { .. } => "BUILD_INVALID_OPTION",
        }
    }
}

impl std::fmt::Display for ModelBuildError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ModelBuildError::Model(err) => err.fmt(f),
            ModelBuildError::MissingEmissionFactor {
                origin,
                destination,
            } => write!(
                f,
                "[{}] Lane {origin} -> {destination} has no emission factor",
                self.code()
            ),
            ModelBuildError::InvalidOption { option, value } => write!(
                f,
                "[{}] Build option {option} must be finite and non-negative (got {value})",
                self.code()
            ),
        }
    }
}

impl std::error::Error for ModelBuildError {
    fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
        match self {
            ModelBuildError::Model(err) => Some(err),
            _ => None,
        }
    }
}

impl From<ModelError> for ModelBuildError {
    fn from(err: ModelError) -> Self {
        ModelBuildError::Model(err)
    }
}

/// Failure while computing a warm-start plan.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum HeuristicError {
    UnknownProfile { name: String },
}

impl HeuristicError {
    pub fn code(&self) -> &'static str {
        match self {
            HeuristicError::UnknownProfile { .. } => "HEURISTIC_UNKNOWN_PROFILE",
        }
    }
}

impl std::fmt::Display for HeuristicError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            HeuristicError::UnknownProfile { name } => {
                write!(f, "[{}] Profile '{name}' is not in the catalog", self.code())
            }
        }
    }
}

impl std::error::Error for HeuristicError {}
