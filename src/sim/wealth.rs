use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::model::{LedgerKind, PipelineStage, Region, RegionCondition};

/// Accrues the value of this tick's production plus compounding baseline
/// growth, and refreshes the derived GDP figures.
///
/// Maintenance has already been deducted by the infrastructure stage, so
/// growth compounds on post-maintenance wealth. Wealth is clamped at the
/// floor, raising `WealthFloorReached` when the clamp engages.
pub struct WealthManager;

impl EconomicSubsystem for WealthManager {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Wealth
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.wealth;
        let floor = cfg.floor;

        let value = region.production.output * cfg.value_per_unit;
        let growth = cfg.growth_rate * region.economy.wealth;
        let target = region.economy.wealth + value + growth;

        region.apply_wealth_delta(LedgerKind::ProductionValue, value, floor);
        region.apply_wealth_delta(LedgerKind::Growth, growth, floor);
        if target < floor {
            tracing::warn!(region = %region.id, target, floor, "wealth clamped at floor");
            region.raise(RegionCondition::WealthFloorReached {
                floor,
                shortfall: floor - target,
            });
        }

        let economy = &mut region.economy;
        let previous_gdp = economy.gdp;
        economy.gdp = value;
        economy.gdp_growth = if previous_gdp > 0.0 {
            (value - previous_gdp) / previous_gdp
        } else {
            0.0
        };
        economy.treasury += value * cfg.tax_rate;

        tracing::debug!(
            region = %region.id,
            tick = ctx.tick,
            value,
            growth,
            wealth = region.economy.wealth,
            "wealth"
        );
    }
}
