use serde::{Deserialize, Serialize};

use super::cycle::CyclePhase;
use super::region::Region;

/// Owned copy of a region's committed state between ticks.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct RegionSnapshot {
    /// Number of ticks completed when the snapshot was taken.
    pub tick: u64,
    /// Cycle phase the next tick will apply.
    pub phase: CyclePhase,
    pub region: Region,
}
