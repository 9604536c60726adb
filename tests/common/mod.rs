#![allow(dead_code)]

use region_econ::{EconomicOrchestrator, EconomyConfig, Region};

/// Seeded config with the cycle's duration jitter switched off.
pub fn steady_config(seed: u64) -> EconomyConfig {
    let mut config = EconomyConfig::seeded(seed);
    config.cycle.jitter = 0;
    config
}

/// A working farm region: enough labor and stock to run without shortages.
pub fn farmland(id: &str) -> Region {
    Region::builder(id, format!("Farmland {id}"))
        .wealth(400.0)
        .infrastructure(4)
        .population(2000)
        .satisfaction(0.6)
        .resource("Food", 500.0)
        .resource("Materials", 200.0)
        .resource("Fuel", 100.0)
        .build()
}

/// A struggling region with no stock and no capital to produce any.
pub fn wasteland(id: &str) -> Region {
    Region::builder(id, format!("Wasteland {id}"))
        .wealth(10.0)
        .infrastructure(0)
        .population(800)
        .satisfaction(0.4)
        .build()
}

pub fn build_economy(config: EconomyConfig, regions: Vec<Region>) -> EconomicOrchestrator {
    let mut engine = EconomicOrchestrator::new(config).unwrap();
    for region in regions {
        engine.register_region(region).unwrap();
    }
    engine
}
