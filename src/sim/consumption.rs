use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::config::ConsumptionConfig;
use crate::model::{PipelineStage, Region, RegionCondition};

/// Move `current` toward `target` by `rate`, clamped to `[0, 1]`.
pub fn blend(current: f64, target: f64, rate: f64) -> f64 {
    let next = current + rate * (target - current);
    if next.is_finite() { next.clamp(0.0, 1.0) } else { current.clamp(0.0, 1.0) }
}

/// Richer populations consume proportionally more, up to `max_wealth_factor`.
pub fn wealth_factor(cfg: &ConsumptionConfig, wealth: f64, population: u32) -> f64 {
    if population == 0 {
        return 1.0;
    }
    let per_capita = wealth.max(0.0) / f64::from(population);
    (1.0 + cfg.wealth_elasticity * per_capita).clamp(1.0, cfg.max_wealth_factor)
}

/// Draws the population's needs from resource stocks and updates satisfaction.
///
/// A full supply pulls satisfaction toward 1 at `recovery_rate`; any shortage
/// pulls it toward 0 at `decline_rate` scaled by the overall shortage ratio,
/// and raises one `UnmetNeed` per short resource.
pub struct ConsumptionManager;

impl EconomicSubsystem for ConsumptionManager {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Consumption
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.consumption;
        let size = region.population.size;
        let factor = wealth_factor(cfg, region.economy.wealth, size);

        region.population.demand.clear();
        region.population.consumed.clear();

        let mut total_demand = 0.0;
        let mut total_shortfall = 0.0;
        for (resource, need) in &cfg.per_capita_need {
            let demand = f64::from(size) * need * factor;
            let withdrawal = region.resources.withdraw(resource, demand);
            region.population.demand.insert(resource.clone(), demand);
            region.population.consumed.insert(resource.clone(), withdrawal.taken);

            total_demand += demand;
            total_shortfall += withdrawal.shortfall;
            if withdrawal.shortfall > 0.0 {
                region.raise(RegionCondition::UnmetNeed {
                    resource: resource.clone(),
                    demand,
                    shortfall: withdrawal.shortfall,
                });
            }
        }

        let shortage = if total_demand > 0.0 {
            (total_shortfall / total_demand).clamp(0.0, 1.0)
        } else {
            0.0
        };
        let current = region.population.satisfaction;
        region.population.satisfaction = if shortage > 0.0 {
            blend(current, 0.0, cfg.decline_rate * shortage)
        } else {
            blend(current, 1.0, cfg.recovery_rate)
        };

        tracing::debug!(
            region = %region.id,
            tick = ctx.tick,
            demand = total_demand,
            shortage,
            satisfaction = region.population.satisfaction,
            "consumption"
        );
    }
}
