use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::model::{LedgerKind, PipelineStage, Region, RegionCondition};

const UNPAID_EPSILON: f64 = 1e-9;

/// `level × multiplier`.
pub fn maintenance_cost(level: u32, multiplier: f64) -> f64 {
    f64::from(level) * multiplier
}

/// Charges maintenance against wealth and applies passive decay.
///
/// Maintenance is paid down to the wealth floor and never past it; the unpaid
/// remainder raises `InfrastructureUnderfunded`. Decay accumulates as wear and
/// each whole unit removes a level, stopping at `min_level`. Levels only ever
/// rise through explicit upgrades.
pub struct InfrastructureManager;

impl EconomicSubsystem for InfrastructureManager {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Infrastructure
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.infrastructure;
        let floor = ctx.wealth_floor();

        let cost = maintenance_cost(region.infrastructure.level, cfg.maintenance_cost_multiplier);
        region.infrastructure.maintenance_cost = cost;

        let paid = if cost > 0.0 {
            -region.apply_wealth_delta(LedgerKind::Maintenance, -cost, floor)
        } else {
            0.0
        };
        let unpaid = cost - paid;
        let underfunded = unpaid > UNPAID_EPSILON;
        if underfunded {
            tracing::warn!(region = %region.id, tick = ctx.tick, cost, unpaid, "infrastructure underfunded");
            region.raise(RegionCondition::InfrastructureUnderfunded { cost, unpaid });
        }

        let mut decay = cfg.decay_rate;
        if underfunded {
            decay *= cfg.underfunded_decay_multiplier;
        }
        let infra = &mut region.infrastructure;
        infra.wear += decay;
        let whole = infra.wear.floor();
        infra.wear -= whole;

        let from = infra.level;
        if whole >= 1.0 && from > cfg.min_level {
            let lost = whole.min(f64::from(u32::MAX)) as u32;
            infra.level = from.saturating_sub(lost).max(cfg.min_level);
        }
        let to = infra.level;
        if to != from {
            tracing::debug!(region = %region.id, tick = ctx.tick, from, to, "infrastructure decayed");
            region.raise(RegionCondition::InfrastructureDecayed { from, to });
        }
    }
}
