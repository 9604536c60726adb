use rand::Rng;

use super::context::TickContext;
use super::market::{market_demand, market_supply, traded_resources};
use super::system::EconomicSubsystem;
use crate::config::VolatilityConfig;
use crate::model::{PipelineStage, Region};

/// Fractional drop from `previous` to `current`. Positive when shrinking.
pub fn contraction(previous: f64, current: f64) -> f64 {
    if previous > f64::EPSILON {
        (previous - current) / previous
    } else {
        0.0
    }
}

/// `price + α·(supply_shock − consumption_trend) + noise`, held within the
/// configured band around `base_price`.
pub fn next_reference_price(
    cfg: &VolatilityConfig,
    price: f64,
    base_price: f64,
    supply_shock: f64,
    consumption_trend: f64,
    noise: f64,
) -> f64 {
    let next = price + cfg.shock_sensitivity * (supply_shock - consumption_trend) + noise;
    let low = base_price * cfg.min_price_ratio;
    let high = base_price * cfg.max_price_ratio;
    if next.is_finite() {
        next.clamp(low, high)
    } else if price.is_finite() {
        price.clamp(low, high)
    } else {
        base_price.clamp(low, high)
    }
}

/// Random walk on each resource's reference price, driven by supply and
/// demand shocks since the last tick plus bounded noise.
///
/// Noise is `U(−1, 1) × volatility × phase volatility`, so prices swing
/// harder in Contraction. Draws come from the stage's own seeded RNG in
/// resource-name order.
pub struct PriceVolatilityManager;

impl EconomicSubsystem for PriceVolatilityManager {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Volatility
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.volatility;
        let scale = cfg.volatility * ctx.config.cycle.phase(ctx.cycle.phase).volatility;

        for resource in traded_resources(region, ctx.config) {
            let supply = market_supply(region, &resource);
            let demand = market_demand(region, &resource);
            let base = ctx.config.market.base_price(&resource);
            let noise = if scale > 0.0 {
                ctx.rng.random_range(-1.0..=1.0) * scale
            } else {
                0.0
            };

            let quote = region.market.quote_or_open(&resource, base, supply, demand);
            let shock = contraction(quote.supply, supply);
            let trend = contraction(quote.demand, demand);
            quote.reference_price =
                next_reference_price(cfg, quote.reference_price, base, shock, trend, noise);

            tracing::debug!(
                region = %region.id,
                tick = ctx.tick,
                resource = %resource,
                shock,
                trend,
                noise,
                reference = quote.reference_price,
                "volatility"
            );
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::model::CyclePhase;
    use crate::testutil::{cycle_in, run_stage, run_stage_in, test_region};

    fn quiet() -> EconomyConfig {
        let mut config = EconomyConfig::seeded(9);
        config.volatility.volatility = 0.0;
        config.volatility.shock_sensitivity = 10.0;
        config
    }

    #[test]
    fn contraction_is_relative_drop() {
        assert_eq!(contraction(100.0, 75.0), 0.25);
        assert_eq!(contraction(100.0, 150.0), -0.5);
        assert_eq!(contraction(0.0, 50.0), 0.0);
    }

    #[test]
    fn reference_price_is_banded() {
        let cfg = VolatilityConfig {
            shock_sensitivity: 100.0,
            volatility: 0.0,
            min_price_ratio: 0.5,
            max_price_ratio: 2.0,
        };
        assert_eq!(next_reference_price(&cfg, 10.0, 10.0, 1.0, 0.0, 0.0), 20.0);
        assert_eq!(next_reference_price(&cfg, 10.0, 10.0, 0.0, 1.0, 0.0), 5.0);
        assert_eq!(next_reference_price(&cfg, 10.0, 10.0, f64::NAN, 0.0, 0.0), 10.0);
    }

    #[test]
    fn nan_reference_price_recovers_to_base() {
        let cfg = VolatilityConfig::default();
        assert_eq!(next_reference_price(&cfg, f64::NAN, 10.0, 0.0, 0.0, 0.0), 10.0);
        assert_eq!(next_reference_price(&cfg, f64::INFINITY, 10.0, 0.1, 0.0, 0.0), 10.0);
    }

    #[test]
    fn first_tick_opens_at_base_price() {
        let config = quiet();
        let mut region = test_region("r1");

        run_stage(&mut PriceVolatilityManager, &mut region, &config, 1);

        let food = region.market.quote("Food").unwrap();
        assert_eq!(food.reference_price, 10.0);
    }

    #[test]
    fn supply_contraction_raises_reference_price() {
        let config = quiet();
        let mut region = test_region("r1");
        region.resources.set("Food", 200.0);
        run_stage(&mut PriceVolatilityManager, &mut region, &config, 1);

        // Supply halves; the quote still remembers 200.
        region.resources.set("Food", 100.0);
        run_stage(&mut PriceVolatilityManager, &mut region, &config, 2);

        // 10 + 10 × 0.5
        assert_eq!(region.market.quote("Food").unwrap().reference_price, 15.0);
    }

    #[test]
    fn noise_is_bounded_by_volatility() {
        let mut config = EconomyConfig::seeded(9);
        config.volatility.volatility = 0.5;
        config.volatility.shock_sensitivity = 0.0;
        config.cycle.contraction.volatility = 2.0;
        let cycle = cycle_in(&config, CyclePhase::Contraction);

        for tick in 1..=50 {
            let mut region = test_region("r1");
            run_stage_in(&mut PriceVolatilityManager, &mut region, &config, &cycle, tick);
            let price = region.market.quote("Food").unwrap().reference_price;
            assert!((9.0..=11.0).contains(&price), "tick {tick}: {price}");
        }
    }

    #[test]
    fn same_seed_same_prices() {
        let mut config = EconomyConfig::seeded(9);
        config.volatility.volatility = 1.0;
        let mut a = test_region("r1");
        let mut b = test_region("r1");
        for tick in 1..=5 {
            run_stage(&mut PriceVolatilityManager, &mut a, &config, tick);
            run_stage(&mut PriceVolatilityManager, &mut b, &config, tick);
        }
        assert_eq!(a.market, b.market);
    }
}
