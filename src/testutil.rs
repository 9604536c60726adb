use crate::config::EconomyConfig;
use crate::model::{CyclePhase, CycleState, Region};
use crate::sim::{EconomicSubsystem, TickContext, stage_rng};

// ---------------------------------------------------------------------------
// Region helpers
// ---------------------------------------------------------------------------

/// A mid-sized region with stock of every default resource.
pub fn test_region(id: &str) -> Region {
    Region::builder(id, format!("Region {id}"))
        .wealth(500.0)
        .infrastructure(3)
        .population(1000)
        .satisfaction(0.5)
        .resource("Food", 200.0)
        .resource("Materials", 100.0)
        .resource("Fuel", 50.0)
        .build()
}

// ---------------------------------------------------------------------------
// Stage execution helpers
// ---------------------------------------------------------------------------

/// Run one stage against one region in the first phase of the cycle.
pub fn run_stage(
    stage: &mut dyn EconomicSubsystem,
    region: &mut Region,
    config: &EconomyConfig,
    tick: u64,
) {
    let cycle = cycle_in(config, CyclePhase::Expansion);
    run_stage_in(stage, region, config, &cycle, tick);
}

/// Run one stage against one region with an explicit cycle state.
pub fn run_stage_in(
    stage: &mut dyn EconomicSubsystem,
    region: &mut Region,
    config: &EconomyConfig,
    cycle: &CycleState,
    tick: u64,
) {
    let mut rng = stage_rng(config.seed.unwrap_or(0), stage.name(), tick);
    let mut ctx = TickContext {
        config,
        tick,
        cycle,
        rng: &mut rng,
    };
    stage.process(region, &mut ctx);
}

/// A cycle state for the given phase using the config's multiplier.
pub fn cycle_in(config: &EconomyConfig, phase: CyclePhase) -> CycleState {
    CycleState::new(
        phase,
        config.cycle.phase(phase).duration,
        config.cycle.effect(phase),
    )
}
