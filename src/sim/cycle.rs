use rand::{Rng, RngCore};

use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::config::CycleConfig;
use crate::model::{CyclePhase, CycleState, LedgerKind, PipelineStage, Region, RegionCondition};

/// Cycle state at the start of a run: Expansion at its base duration.
pub fn initial_state(config: &CycleConfig) -> CycleState {
    CycleState::new(
        CyclePhase::Expansion,
        config.expansion.duration,
        config.effect(CyclePhase::Expansion),
    )
}

/// Draw a phase duration of `base ± jitter` ticks, never shorter than one.
pub fn draw_duration(base: u32, jitter: u32, rng: &mut dyn RngCore) -> u32 {
    if jitter == 0 {
        return base.max(1);
    }
    let jitter = i64::from(jitter);
    let offset = rng.random_range(-jitter..=jitter);
    let drawn = (i64::from(base) + offset).clamp(1, i64::from(u32::MAX));
    u32::try_from(drawn).unwrap_or(u32::MAX)
}

/// Count one completed tick against the current phase, moving to the next
/// phase once its duration has elapsed.
///
/// Returns `(from, to)` when a transition happened. With zero jitter every
/// phase lasts exactly its configured duration, so a full cycle takes
/// `config.total_duration()` ticks.
pub fn advance(
    state: &mut CycleState,
    config: &CycleConfig,
    rng: &mut dyn RngCore,
) -> Option<(CyclePhase, CyclePhase)> {
    state.turns_in_phase += 1;
    if state.turns_in_phase < state.phase_duration {
        return None;
    }

    let from = state.phase;
    let to = from.next();
    let duration = draw_duration(config.phase(to).duration, config.jitter, rng);
    *state = CycleState::new(to, duration, config.effect(to));
    Some((from, to))
}

/// Applies the current phase's effect multiplicatively to every region's
/// production and wealth.
///
/// The phase itself is economy-wide and advanced by the orchestrator once all
/// regions have run, so every region in a tick sees the same phase.
pub struct CycleManager;

impl EconomicSubsystem for CycleManager {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Cycle
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let effect = ctx.cycle.multiplier;
        let floor = ctx.wealth_floor();

        region.production.output *= effect;
        for (resource, produced) in region.production.produced.iter_mut() {
            let adjusted = *produced * effect;
            let delta = adjusted - *produced;
            if delta >= 0.0 {
                region.resources.deposit(resource, delta);
            } else {
                region.resources.withdraw(resource, -delta);
            }
            *produced = adjusted;
        }

        let wealth = region.economy.wealth;
        let target = wealth * effect;
        region.apply_wealth_delta(LedgerKind::CycleEffect, target - wealth, floor);
        if target < floor {
            region.raise(RegionCondition::WealthFloorReached {
                floor,
                shortfall: floor - target,
            });
        }

        tracing::debug!(
            region = %region.id,
            tick = ctx.tick,
            phase = %ctx.cycle.phase,
            effect,
            wealth = region.economy.wealth,
            "cycle"
        );
    }
}

#[cfg(test)]
mod tests {
    use rand::SeedableRng;
    use rand::rngs::SmallRng;

    use super::*;
    use crate::config::EconomyConfig;
    use crate::testutil::{cycle_in, run_stage_in, test_region};

    fn no_jitter() -> CycleConfig {
        CycleConfig {
            jitter: 0,
            ..CycleConfig::default()
        }
    }

    #[test]
    fn full_cycle_returns_to_expansion() {
        let config = no_jitter();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut state = initial_state(&config);

        let total = config.total_duration();
        for tick in 1..total {
            advance(&mut state, &config, &mut rng);
            assert!(
                tick < u64::from(config.expansion.duration) || state.phase != CyclePhase::Expansion,
                "returned to expansion early at tick {tick}"
            );
        }
        advance(&mut state, &config, &mut rng);
        assert_eq!(state.phase, CyclePhase::Expansion);
        assert_eq!(state.turns_in_phase, 0);
    }

    #[test]
    fn transitions_in_order_with_durations() {
        let config = no_jitter();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut state = initial_state(&config);
        let mut transitions = Vec::new();

        for tick in 1..=config.total_duration() {
            if let Some(change) = advance(&mut state, &config, &mut rng) {
                transitions.push((tick, change));
            }
        }

        assert_eq!(
            transitions,
            vec![
                (12, (CyclePhase::Expansion, CyclePhase::Peak)),
                (16, (CyclePhase::Peak, CyclePhase::Contraction)),
                (24, (CyclePhase::Contraction, CyclePhase::Trough)),
                (28, (CyclePhase::Trough, CyclePhase::Expansion)),
            ]
        );
    }

    #[test]
    fn jittered_duration_stays_in_bounds() {
        let mut rng = SmallRng::seed_from_u64(3);
        for _ in 0..200 {
            let d = draw_duration(5, 2, &mut rng);
            assert!((3..=7).contains(&d));
        }
        for _ in 0..200 {
            assert!(draw_duration(1, 4, &mut rng) >= 1);
        }
    }

    #[test]
    fn longest_phase_never_wraps() {
        let mut rng = SmallRng::seed_from_u64(11);
        for _ in 0..50 {
            let d = draw_duration(u32::MAX, 5, &mut rng);
            assert!(d >= u32::MAX - 5, "wrapped to {d}");
        }
    }

    #[test]
    fn entering_a_phase_sets_its_multiplier() {
        let config = no_jitter();
        let mut rng = SmallRng::seed_from_u64(7);
        let mut state = initial_state(&config);
        for _ in 0..config.expansion.duration {
            advance(&mut state, &config, &mut rng);
        }
        assert_eq!(state.phase, CyclePhase::Peak);
        assert_eq!(state.multiplier, config.effect(CyclePhase::Peak));
    }

    #[test]
    fn effect_scales_output_stock_and_wealth() {
        let mut config = EconomyConfig::seeded(1);
        config.cycle.contraction.multiplier = 0.5;
        let cycle = cycle_in(&config, CyclePhase::Contraction);
        let mut region = test_region("r1");
        region.economy.wealth = 200.0;
        region.production.output = 40.0;
        region.production.produced.insert("Food".to_string(), 20.0);
        region.resources.set("Food", 100.0);

        run_stage_in(&mut CycleManager, &mut region, &config, &cycle, 1);

        assert_eq!(region.production.output, 20.0);
        assert_eq!(region.production.produced("Food"), 10.0);
        assert_eq!(region.resources.get("Food"), 90.0);
        assert_eq!(region.economy.wealth, 100.0);
        assert_eq!(region.ledger_total(LedgerKind::CycleEffect), -100.0);
    }

    #[test]
    fn expansion_grows_wealth() {
        let mut config = EconomyConfig::seeded(1);
        config.cycle.expansion.multiplier = 1.5;
        let cycle = cycle_in(&config, CyclePhase::Expansion);
        let mut region = test_region("r1");
        region.economy.wealth = 100.0;

        run_stage_in(&mut CycleManager, &mut region, &config, &cycle, 1);

        assert_eq!(region.economy.wealth, 150.0);
    }

    #[test]
    fn amplified_debt_is_clamped() {
        let mut config = EconomyConfig::seeded(1);
        config.wealth.floor = -100.0;
        config.cycle.expansion.multiplier = 2.0;
        let cycle = cycle_in(&config, CyclePhase::Expansion);
        let mut region = test_region("r1");
        region.economy.wealth = -80.0;

        run_stage_in(&mut CycleManager, &mut region, &config, &cycle, 1);

        assert_eq!(region.economy.wealth, -100.0);
        assert!(region.has_condition("wealth_floor_reached"));
    }
}
