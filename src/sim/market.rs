use std::collections::BTreeSet;

use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::config::EconomyConfig;
use crate::model::{PipelineStage, Region};

/// `base × (1 + (demand − supply) / elasticity)`, never negative.
///
/// A non-positive elasticity or a non-finite result falls back to the base
/// price, so a bad input can never publish NaN or infinity.
pub fn price_signal(base_price: f64, elasticity: f64, demand: f64, supply: f64) -> f64 {
    let base = if base_price.is_finite() { base_price.max(0.0) } else { 0.0 };
    if !elasticity.is_finite() || elasticity <= 0.0 {
        return base;
    }
    let price = base * (1.0 + (demand - supply) / elasticity);
    if price.is_finite() { price.max(0.0) } else { base }
}

/// Resources priced in a region: anything stocked, produced, or needed.
pub(crate) fn traded_resources(region: &Region, config: &EconomyConfig) -> BTreeSet<String> {
    region
        .resources
        .names()
        .map(str::to_string)
        .chain(config.production.output_mix.keys().cloned())
        .chain(config.consumption.per_capita_need.keys().cloned())
        .collect()
}

/// Everything on the market this tick: the remaining stock plus what was
/// already consumed from it (existing stock and this tick's production).
pub(crate) fn market_supply(region: &Region, resource: &str) -> f64 {
    region.resources.get(resource) + region.population.consumed(resource)
}

pub(crate) fn market_demand(region: &Region, resource: &str) -> f64 {
    region.population.demand(resource)
}

/// Publishes a price per resource from the supply/demand imbalance, using
/// the volatility-evolved reference price as the base.
///
/// Runs last by default, so prices reflect every other stage's effect on
/// supply.
pub struct MarketBalancer;

impl EconomicSubsystem for MarketBalancer {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Market
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.market;
        for resource in traded_resources(region, ctx.config) {
            let supply = market_supply(region, &resource);
            let demand = market_demand(region, &resource);
            let base = cfg.base_price(&resource);

            let quote = region.market.quote_or_open(&resource, base, supply, demand);
            let price = price_signal(quote.reference_price, cfg.elasticity, demand, supply)
                .max(cfg.min_price);
            quote.price = price;
            quote.supply = supply;
            quote.demand = demand;

            tracing::debug!(
                region = %region.id,
                tick = ctx.tick,
                resource = %resource,
                supply,
                demand,
                price,
                "market"
            );
        }
    }
}
