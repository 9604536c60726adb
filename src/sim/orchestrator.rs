use super::bus::NotificationBus;
use super::consumption::ConsumptionManager;
use super::context::TickContext;
use super::cycle::{self, CycleManager};
use super::infrastructure::{InfrastructureManager, maintenance_cost};
use super::market::MarketBalancer;
use super::production::ProductionCalculator;
use super::rng::stage_rng;
use super::signal::Notification;
use super::system::EconomicSubsystem;
use super::volatility::PriceVolatilityManager;
use super::wealth::WealthManager;
use crate::config::EconomyConfig;
use crate::error::{EngineError, Result};
use crate::model::{
    CyclePhase, CycleState, LedgerKind, PipelineStage, Region, RegionId, RegionRegistry,
    RegionSnapshot,
};

/// Stream name for the cycle's phase-duration jitter.
const CYCLE_TRANSITION_STREAM: &str = "cycle-transition";

/// Instantiate the subsystem for each stage, in the given order.
pub fn build_pipeline(order: &[PipelineStage]) -> Vec<Box<dyn EconomicSubsystem>> {
    order
        .iter()
        .map(|stage| -> Box<dyn EconomicSubsystem> {
            match stage {
                PipelineStage::Production => Box::new(ProductionCalculator),
                PipelineStage::Infrastructure => Box::new(InfrastructureManager),
                PipelineStage::Consumption => Box::new(ConsumptionManager),
                PipelineStage::Wealth => Box::new(WealthManager),
                PipelineStage::Cycle => Box::new(CycleManager),
                PipelineStage::Volatility => Box::new(PriceVolatilityManager),
                PipelineStage::Market => Box::new(MarketBalancer),
            }
        })
        .collect()
}

/// Cost of raising infrastructure from `from` to `to`: `per_level × n` for
/// each new level `n`, summed in closed form.
pub fn upgrade_cost(from: u32, to: u32, per_level: f64) -> f64 {
    let triangle = |n: u32| {
        let n = u64::from(n);
        n * (n + 1) / 2
    };
    let levels = triangle(to).saturating_sub(triangle(from));
    levels as f64 * per_level
}

/// What one call to [`EconomicOrchestrator::tick`] did.
#[derive(Debug, Clone, PartialEq)]
pub struct TickReport {
    /// Number of the tick just completed (the first tick is 1).
    pub tick: u64,
    /// Phase whose multiplier was applied during this tick.
    pub phase: CyclePhase,
    /// Every notification published, in publication order.
    pub notifications: Vec<Notification>,
}

/// Owns the region registry and every subsystem, and advances the
/// simulation one tick at a time.
///
/// `tick` is the only mutation entry point for simulation state. It takes
/// `&mut self`, so no reader can observe a region halfway through a tick.
pub struct EconomicOrchestrator {
    config: EconomyConfig,
    seed: u64,
    registry: RegionRegistry,
    stages: Vec<Box<dyn EconomicSubsystem>>,
    cycle: CycleState,
    tick: u64,
    bus: NotificationBus,
}

impl EconomicOrchestrator {
    /// Validate `config` and build the engine. A bad config is refused here
    /// rather than producing NaN mid-run.
    pub fn new(config: EconomyConfig) -> Result<Self> {
        config.validate()?;
        let seed = config.seed.unwrap_or_else(rand::random);
        let stages = build_pipeline(&config.pipeline);
        let cycle = cycle::initial_state(&config.cycle);
        tracing::info!(
            seed,
            pipeline = ?config.pipeline,
            "economic orchestrator ready"
        );
        Ok(Self {
            config,
            seed,
            registry: RegionRegistry::new(),
            stages,
            cycle,
            tick: 0,
            bus: NotificationBus::new(),
        })
    }

    pub fn config(&self) -> &EconomyConfig {
        &self.config
    }

    /// The seed actually in use (drawn from entropy if the config had none).
    pub fn seed(&self) -> u64 {
        self.seed
    }

    /// Number of ticks completed so far.
    pub fn tick_count(&self) -> u64 {
        self.tick
    }

    pub fn cycle(&self) -> &CycleState {
        &self.cycle
    }

    pub fn bus_mut(&mut self) -> &mut NotificationBus {
        &mut self.bus
    }

    // -- Registry access --

    /// Add a region. Duplicate ids and invariant violations are rejected and
    /// leave the registry unchanged.
    pub fn register_region(&mut self, region: Region) -> Result<()> {
        self.check_region(&region)?;
        let id = region.id.clone();
        self.registry
            .insert(region)
            .map_err(|rejected| EngineError::DuplicateRegion(rejected.id))?;
        tracing::debug!(region = %id, "region registered");
        Ok(())
    }

    /// Register a region from its starting wealth and output, leaving every
    /// other component at the builder's defaults.
    pub fn register(
        &mut self,
        id: impl Into<RegionId>,
        name: impl Into<String>,
        initial_wealth: f64,
        initial_production: f64,
    ) -> Result<()> {
        let region = Region::builder(id, name)
            .wealth(initial_wealth)
            .production(initial_production)
            .build();
        self.register_region(region)
    }

    /// Committed state of a region, or `None` if it was never registered.
    pub fn get_region(&self, id: &RegionId) -> Option<&Region> {
        self.registry.get(id)
    }

    /// Owned copy of a region together with the tick it reflects.
    pub fn snapshot(&self, id: &RegionId) -> Option<RegionSnapshot> {
        self.registry.get(id).map(|region| self.snapshot_of(region))
    }

    /// Snapshots of every region in tick order.
    pub fn snapshots(&self) -> Vec<RegionSnapshot> {
        self.registry.iter().map(|r| self.snapshot_of(r)).collect()
    }

    /// Every registered id, in tick order.
    pub fn region_ids(&self) -> Vec<RegionId> {
        self.registry.ids()
    }

    pub fn region_count(&self) -> usize {
        self.registry.len()
    }

    /// Replace a region with an externally edited copy (e.g. a narrative
    /// choice). Validated exactly like registration.
    pub fn update_region(&mut self, region: Region) -> Result<()> {
        if !self.registry.contains(&region.id) {
            return Err(EngineError::UnknownRegion(region.id));
        }
        self.check_region(&region)?;
        self.registry
            .replace(region)
            .map_err(|rejected| EngineError::UnknownRegion(rejected.id))?;
        Ok(())
    }

    /// Raise a region's infrastructure by `levels`, paying
    /// `upgrade_cost_per_level × n` for each new level `n` out of wealth.
    ///
    /// Returns the new level. Fails without charging anything if the cost
    /// would push wealth below the floor.
    pub fn upgrade_infrastructure(&mut self, id: &RegionId, levels: u32) -> Result<u32> {
        let floor = self.config.wealth.floor;
        let cfg = &self.config.infrastructure;
        let region = self
            .registry
            .get_mut(id)
            .ok_or_else(|| EngineError::UnknownRegion(id.clone()))?;

        let from = region.infrastructure.level;
        let to = from.saturating_add(levels);
        if to == from {
            return Ok(from);
        }
        let cost = upgrade_cost(from, to, cfg.upgrade_cost_per_level);
        let available = region.economy.wealth - floor;
        if cost > available {
            return Err(EngineError::InsufficientFunds {
                id: id.clone(),
                cost,
                available,
            });
        }

        region.apply_wealth_delta(LedgerKind::Upgrade, -cost, floor);
        region.infrastructure.level = to;
        region.infrastructure.maintenance_cost =
            maintenance_cost(to, cfg.maintenance_cost_multiplier);
        tracing::info!(region = %id, from, to, cost, "infrastructure upgraded");
        Ok(to)
    }

    /// Drop every region and return the cycle and tick counter to their
    /// starting state. Subscriptions survive.
    pub fn reset(&mut self) {
        self.registry.clear();
        self.cycle = cycle::initial_state(&self.config.cycle);
        self.tick = 0;
        tracing::info!("economy reset");
    }

    // -- Simulation --

    /// Advance the simulation by exactly one turn.
    ///
    /// Every region runs the full pipeline in id order. The cycle advances
    /// once all regions are done, then notifications are published: per
    /// region its conditions and a `RegionUpdated`, then any phase change,
    /// then a single `TickCompleted`.
    pub fn tick(&mut self) -> TickReport {
        let tick = self.tick + 1;
        let phase = self.cycle.phase;
        let mut rngs: Vec<_> = self
            .stages
            .iter()
            .map(|stage| stage_rng(self.seed, stage.name(), tick))
            .collect();

        let mut notifications = Vec::new();
        for region in self.registry.iter_mut() {
            region.begin_tick();
            for (stage, rng) in self.stages.iter_mut().zip(rngs.iter_mut()) {
                let mut ctx = TickContext {
                    config: &self.config,
                    tick,
                    cycle: &self.cycle,
                    rng,
                };
                stage.process(region, &mut ctx);
            }
            for condition in &region.conditions {
                notifications.push(Notification::Condition {
                    region_id: region.id.clone(),
                    condition: condition.clone(),
                });
            }
            notifications.push(Notification::RegionUpdated {
                region_id: region.id.clone(),
            });
        }

        let mut transition_rng = stage_rng(self.seed, CYCLE_TRANSITION_STREAM, tick);
        if let Some((from, to)) = cycle::advance(&mut self.cycle, &self.config.cycle, &mut transition_rng)
        {
            tracing::info!(tick, %from, %to, duration = self.cycle.phase_duration, "cycle phase changed");
            notifications.push(Notification::CyclePhaseChanged { tick, from, to });
        }

        self.tick = tick;
        notifications.push(Notification::TickCompleted { tick });
        for notification in &notifications {
            self.bus.publish(notification);
        }

        tracing::info!(tick, %phase, regions = self.registry.len(), "tick completed");
        TickReport {
            tick,
            phase,
            notifications,
        }
    }

    /// Run `n` ticks, returning each report.
    pub fn run(&mut self, n: u64) -> Vec<TickReport> {
        (0..n).map(|_| self.tick()).collect()
    }

    fn check_region(&self, region: &Region) -> Result<()> {
        region
            .validate(self.config.wealth.floor)
            .map_err(|reason| EngineError::InvalidRegion {
                id: region.id.clone(),
                reason,
            })
    }

    fn snapshot_of(&self, region: &Region) -> RegionSnapshot {
        RegionSnapshot {
            tick: self.tick,
            phase: self.cycle.phase,
            region: region.clone(),
        }
    }
}

impl std::fmt::Debug for EconomicOrchestrator {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("EconomicOrchestrator")
            .field("seed", &self.seed)
            .field("tick", &self.tick)
            .field("cycle", &self.cycle)
            .field("regions", &self.registry.len())
            .field("pipeline", &self.config.pipeline)
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use std::cell::RefCell;
    use std::rc::Rc;

    use super::*;
    use crate::sim::signal::Topic;
    use crate::testutil::test_region;

    fn engine() -> EconomicOrchestrator {
        let mut config = EconomyConfig::seeded(42);
        config.cycle.jitter = 0;
        EconomicOrchestrator::new(config).unwrap()
    }

    // -- Construction --

    #[test]
    fn invalid_config_is_refused() {
        let mut config = EconomyConfig::seeded(1);
        config.market.elasticity = 0.0;
        let err = EconomicOrchestrator::new(config).unwrap_err();
        assert!(matches!(err, EngineError::InvalidConfig(_)));
    }

    #[test]
    fn pipeline_follows_configured_order() {
        let order = [PipelineStage::Market, PipelineStage::Production];
        let names: Vec<String> = build_pipeline(&order)
            .iter()
            .map(|s| s.name().to_string())
            .collect();
        assert_eq!(names, vec!["market", "production"]);
        assert_eq!(build_pipeline(&PipelineStage::default_order()).len(), 7);
    }

    // -- Registry --

    #[test]
    fn duplicate_registration_leaves_registry_unchanged() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();

        let mut imposter = test_region("r1");
        imposter.economy.wealth = 1.0;
        let err = engine.register_region(imposter).unwrap_err();

        assert!(matches!(err, EngineError::DuplicateRegion(ref id) if id.as_str() == "r1"));
        assert_eq!(engine.region_count(), 1);
        assert_eq!(engine.get_region(&"r1".into()).unwrap().economy.wealth, 500.0);
    }

    #[test]
    fn invalid_region_is_rejected() {
        let mut engine = engine();
        let mut region = test_region("r1");
        region.population.satisfaction = 1.5;
        let err = engine.register_region(region).unwrap_err();
        assert!(matches!(err, EngineError::InvalidRegion { .. }));
        assert_eq!(engine.region_count(), 0);
    }

    #[test]
    fn unknown_region_reads_as_none() {
        let engine = engine();
        assert!(engine.get_region(&"nowhere".into()).is_none());
        assert!(engine.snapshot(&"nowhere".into()).is_none());
    }

    #[test]
    fn update_replaces_known_regions_only() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();

        let mut edited = test_region("r1");
        edited.economy.treasury = 75.0;
        engine.update_region(edited).unwrap();
        assert_eq!(engine.get_region(&"r1".into()).unwrap().economy.treasury, 75.0);

        let err = engine.update_region(test_region("r2")).unwrap_err();
        assert!(matches!(err, EngineError::UnknownRegion(_)));
    }

    #[test]
    fn update_is_validated() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();
        let mut edited = test_region("r1");
        edited.economy.wealth = f64::NAN;
        assert!(matches!(
            engine.update_region(edited),
            Err(EngineError::InvalidRegion { .. })
        ));
        assert_eq!(engine.get_region(&"r1".into()).unwrap().economy.wealth, 500.0);
    }

    // -- Upgrades --

    #[test]
    fn upgrade_charges_per_new_level() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();

        // Level 3 -> 5 costs 100·4 + 100·5.
        let level = engine.upgrade_infrastructure(&"r1".into(), 2).unwrap();
        let region = engine.get_region(&"r1".into()).unwrap();

        assert_eq!(level, 5);
        assert_eq!(region.infrastructure.level, 5);
        assert_eq!(region.economy.wealth, 500.0 - 900.0);
        assert_eq!(region.ledger_total(LedgerKind::Upgrade), -900.0);
    }

    #[test]
    fn upgrade_cost_matches_level_by_level_sum() {
        let stepwise: f64 = (4..=9).map(|n| f64::from(n) * 100.0).sum();
        assert_eq!(upgrade_cost(3, 9, 100.0), stepwise);
        assert_eq!(upgrade_cost(3, 3, 100.0), 0.0);
    }

    #[test]
    fn huge_upgrade_is_refused_without_iterating() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();

        let err = engine
            .upgrade_infrastructure(&"r1".into(), u32::MAX)
            .unwrap_err();

        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        assert_eq!(engine.get_region(&"r1".into()).unwrap().infrastructure.level, 3);
    }

    #[test]
    fn unaffordable_upgrade_charges_nothing() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();

        let err = engine.upgrade_infrastructure(&"r1".into(), 10).unwrap_err();

        assert!(matches!(err, EngineError::InsufficientFunds { .. }));
        let region = engine.get_region(&"r1".into()).unwrap();
        assert_eq!(region.infrastructure.level, 3);
        assert_eq!(region.economy.wealth, 500.0);
    }

    // -- Ticking --

    #[test]
    fn tick_counts_and_snapshots_carry_the_tick() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();
        assert_eq!(engine.tick_count(), 0);

        let report = engine.tick();

        assert_eq!(report.tick, 1);
        assert_eq!(report.phase, CyclePhase::Expansion);
        assert_eq!(engine.tick_count(), 1);
        assert_eq!(engine.snapshot(&"r1".into()).unwrap().tick, 1);
    }

    #[test]
    fn empty_economy_still_completes_ticks() {
        let mut engine = engine();
        let report = engine.tick();
        assert_eq!(report.notifications, vec![Notification::TickCompleted { tick: 1 }]);
    }

    #[test]
    fn regions_are_announced_in_id_order_before_completion() {
        let mut engine = engine();
        for id in ["gamma", "alpha", "beta"] {
            engine.register_region(test_region(id)).unwrap();
        }

        let report = engine.tick();
        let updated: Vec<&str> = report
            .notifications
            .iter()
            .filter(|n| n.topic() == Topic::RegionUpdated)
            .filter_map(|n| n.region_id().map(RegionId::as_str))
            .collect();

        assert_eq!(updated, vec!["alpha", "beta", "gamma"]);
        assert_eq!(
            report.notifications.last(),
            Some(&Notification::TickCompleted { tick: 1 })
        );
    }

    #[test]
    fn subscribers_receive_published_notifications() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();
        let seen = Rc::new(RefCell::new(Vec::new()));
        let sink = Rc::clone(&seen);
        engine.bus_mut().subscribe(Topic::TickCompleted, move |n| {
            sink.borrow_mut().push(n.clone());
        });

        engine.run(3);

        assert_eq!(
            *seen.borrow(),
            vec![
                Notification::TickCompleted { tick: 1 },
                Notification::TickCompleted { tick: 2 },
                Notification::TickCompleted { tick: 3 },
            ]
        );
    }

    #[test]
    fn phase_change_is_announced_once() {
        let mut engine = engine();
        let expansion = engine.config().cycle.expansion.duration;
        let reports = engine.run(u64::from(expansion));

        let changes: Vec<&Notification> = reports
            .iter()
            .flat_map(|r| &r.notifications)
            .filter(|n| n.topic() == Topic::CyclePhase)
            .collect();
        assert_eq!(
            changes,
            vec![&Notification::CyclePhaseChanged {
                tick: u64::from(expansion),
                from: CyclePhase::Expansion,
                to: CyclePhase::Peak,
            }]
        );
        assert_eq!(engine.cycle().phase, CyclePhase::Peak);
    }

    #[test]
    fn reset_clears_regions_and_cycle() {
        let mut engine = engine();
        engine.register_region(test_region("r1")).unwrap();
        engine.run(15);
        assert_eq!(engine.cycle().phase, CyclePhase::Peak);

        engine.reset();

        assert_eq!(engine.region_count(), 0);
        assert_eq!(engine.tick_count(), 0);
        assert_eq!(engine.cycle().phase, CyclePhase::Expansion);
        assert_eq!(engine.cycle().turns_in_phase, 0);
    }

    #[test]
    fn same_seed_same_run() {
        let run = || {
            let mut engine = engine();
            engine.register_region(test_region("r1")).unwrap();
            engine.register_region(test_region("r2")).unwrap();
            engine.run(10);
            engine.snapshots()
        };
        assert_eq!(run(), run());
    }
}
