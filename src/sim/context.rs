use rand::RngCore;

use crate::config::EconomyConfig;
use crate::model::CycleState;

/// Context passed to each stage for every region it processes.
///
/// Bundled so stages take `(region, ctx)` and never hold a reference back to
/// the orchestrator.
pub struct TickContext<'a> {
    pub config: &'a EconomyConfig,
    /// Number of the tick being processed (the first tick is 1).
    pub tick: u64,
    /// Cycle state applied during this tick. Advanced only after every region ran.
    pub cycle: &'a CycleState,
    /// Stage-local RNG, reseeded each tick from the run seed.
    pub rng: &'a mut dyn RngCore,
}

impl TickContext<'_> {
    pub fn wealth_floor(&self) -> f64 {
        self.config.wealth.floor
    }
}
