use serde::{Deserialize, Serialize};

use crate::model::{CyclePhase, RegionCondition, RegionId};

/// Topic a [`Notification`] is published on.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Topic {
    RegionUpdated,
    TickCompleted,
    Condition,
    CyclePhase,
}

/// A typed notification published by the orchestrator after a tick.
///
/// Payloads carry identifiers, not region data: subscribers re-fetch committed
/// state between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum Notification {
    /// A region finished the pipeline this tick.
    RegionUpdated { region_id: RegionId },

    /// A simulation condition was raised on a region.
    Condition {
        region_id: RegionId,
        condition: RegionCondition,
    },

    /// The economic cycle moved to a new phase.
    CyclePhaseChanged {
        tick: u64,
        from: CyclePhase,
        to: CyclePhase,
    },

    /// Every region has been processed. Always the last notification of a tick.
    TickCompleted { tick: u64 },
}

impl Notification {
    pub fn topic(&self) -> Topic {
        match self {
            Notification::RegionUpdated { .. } => Topic::RegionUpdated,
            Notification::Condition { .. } => Topic::Condition,
            Notification::CyclePhaseChanged { .. } => Topic::CyclePhase,
            Notification::TickCompleted { .. } => Topic::TickCompleted,
        }
    }

    pub fn region_id(&self) -> Option<&RegionId> {
        match self {
            Notification::RegionUpdated { region_id } | Notification::Condition { region_id, .. } => {
                Some(region_id)
            }
            _ => None,
        }
    }
}
