use serde::{Deserialize, Serialize};

/// A simulation condition raised on a region during a tick.
///
/// Conditions are never errors. They are cleared at the start of every tick,
/// so a region only carries the conditions of the most recent one.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum RegionCondition {
    /// Consumption demand for a resource exceeded the available stock.
    UnmetNeed {
        resource: String,
        demand: f64,
        shortfall: f64,
    },

    /// Maintenance could not be paid in full without breaching the wealth floor.
    InfrastructureUnderfunded { cost: f64, unpaid: f64 },

    /// Infrastructure lost one or more levels to wear.
    InfrastructureDecayed { from: u32, to: u32 },

    /// Wealth was clamped at the configured floor.
    WealthFloorReached { floor: f64, shortfall: f64 },
}

impl RegionCondition {
    pub fn label(&self) -> &'static str {
        match self {
            RegionCondition::UnmetNeed { .. } => "unmet_need",
            RegionCondition::InfrastructureUnderfunded { .. } => "infrastructure_underfunded",
            RegionCondition::InfrastructureDecayed { .. } => "infrastructure_decayed",
            RegionCondition::WealthFloorReached { .. } => "wealth_floor_reached",
        }
    }
}
