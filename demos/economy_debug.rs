use region_econ::model::RegionCondition;
use region_econ::{EconomicOrchestrator, EconomyConfig, Notification, Region, RegionId, Topic};
use tracing_subscriber::EnvFilter;

fn main() {
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .init();

    let mut engine = EconomicOrchestrator::new(EconomyConfig::seeded(42)).unwrap();
    let regions = [
        Region::builder("breadbasket", "The Breadbasket")
            .wealth(800.0)
            .infrastructure(5)
            .population(4000)
            .resource("Food", 900.0)
            .resource("Materials", 300.0)
            .resource("Fuel", 150.0)
            .build(),
        Region::builder("ironhills", "Iron Hills")
            .wealth(300.0)
            .infrastructure(3)
            .population(1500)
            .labor(1100.0)
            .resource("Materials", 400.0)
            .build(),
        Region::builder("saltmarsh", "Saltmarsh")
            .wealth(-200.0)
            .infrastructure(1)
            .population(900)
            .satisfaction(0.3)
            .build(),
    ];
    for region in regions {
        engine.register_region(region).unwrap();
    }

    engine.bus_mut().subscribe(Topic::CyclePhase, |n| {
        if let Notification::CyclePhaseChanged { tick, from, to } = n {
            eprintln!("  tick {tick}: cycle {from} -> {to}");
        }
    });

    let mut shortages = 0;
    let mut underfunded = 0;
    for report in engine.run(40) {
        for n in &report.notifications {
            match n {
                Notification::Condition {
                    condition: RegionCondition::UnmetNeed { .. },
                    ..
                } => shortages += 1,
                Notification::Condition {
                    condition: RegionCondition::InfrastructureUnderfunded { .. },
                    ..
                } => underfunded += 1,
                _ => {}
            }
        }
    }

    eprintln!("After {} ticks (phase {}):", engine.tick_count(), engine.cycle().phase);
    for id in engine.region_ids() {
        let Some(r) = engine.get_region(&id) else { continue };
        eprintln!(
            "Region {} ({}): wealth={:.1} treasury={:.1} gdp={:.2} growth={:+.3} infra={} satisfaction={:.3}",
            r.id,
            r.name,
            r.economy.wealth,
            r.economy.treasury,
            r.economy.gdp,
            r.economy.gdp_growth,
            r.infrastructure.level,
            r.population.satisfaction,
        );
        for (resource, quote) in r.market.iter() {
            eprintln!(
                "    {resource:<10} stock={:>9.1} price={:>7.2} ref={:>7.2} supply={:.1} demand={:.1}",
                r.resources.get(resource),
                quote.price,
                quote.reference_price,
                quote.supply,
                quote.demand,
            );
        }
    }
    eprintln!("Unmet needs: {shortages} Underfunded ticks: {underfunded}");

    if let Some(snapshot) = engine.snapshot(&RegionId::new("saltmarsh")) {
        println!("{}", serde_json::to_string_pretty(&snapshot).unwrap());
    }
}
