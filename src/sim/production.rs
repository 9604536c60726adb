use super::context::TickContext;
use super::system::EconomicSubsystem;
use crate::model::{PipelineStage, Region};

/// Cobb-Douglas production: `A · L^α · K^β`.
///
/// Negative or non-finite labor and capital are treated as zero, and zero
/// labor or capital yields zero output. Any non-finite result resolves to 0.
/// Positive inputs whose true output lies below the `f64` range underflow
/// to 0 as well; region-scale labor and capital never get near that.
pub fn cobb_douglas(
    productivity: f64,
    labor: f64,
    capital: f64,
    labor_elasticity: f64,
    capital_elasticity: f64,
) -> f64 {
    let labor = non_negative(labor);
    let capital = non_negative(capital);
    if labor == 0.0 || capital == 0.0 || productivity <= 0.0 {
        return 0.0;
    }
    let output = productivity * labor.powf(labor_elasticity) * capital.powf(capital_elasticity);
    if output.is_finite() { output } else { 0.0 }
}

fn non_negative(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

/// Computes this tick's output from labor and infrastructure capital and
/// deposits it into the region's resource stocks.
pub struct ProductionCalculator;

impl EconomicSubsystem for ProductionCalculator {
    fn stage(&self) -> PipelineStage {
        PipelineStage::Production
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext) {
        let cfg = &ctx.config.production;
        let capital = f64::from(region.infrastructure.level) * cfg.capital_per_level;
        let output = cobb_douglas(
            cfg.productivity,
            region.population.labor,
            capital,
            cfg.labor_elasticity,
            cfg.capital_elasticity,
        );

        let production = &mut region.production;
        production.previous_output = production.output;
        production.output = output;
        production.produced.clear();

        for (resource, share) in &cfg.output_mix {
            let added = region.resources.deposit(resource, output * share);
            region.production.produced.insert(resource.clone(), added);
        }

        tracing::debug!(
            region = %region.id,
            tick = ctx.tick,
            labor = region.population.labor,
            capital,
            output,
            "production"
        );
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::EconomyConfig;
    use crate::testutil::{run_stage, test_region};

    #[test]
    fn zero_labor_or_capital_gives_zero() {
        assert_eq!(cobb_douglas(1.0, 0.0, 50.0, 0.5, 0.5), 0.0);
        assert_eq!(cobb_douglas(1.0, 50.0, 0.0, 0.5, 0.5), 0.0);
        assert_eq!(cobb_douglas(1.0, 0.0, 0.0, 0.5, 0.5), 0.0);
    }

    #[test]
    fn negative_inputs_clamp_to_zero() {
        assert_eq!(cobb_douglas(1.0, -10.0, 50.0, 0.5, 0.5), 0.0);
        assert_eq!(cobb_douglas(1.0, 10.0, -50.0, 0.5, 0.5), 0.0);
        assert_eq!(cobb_douglas(1.0, f64::NAN, 50.0, 0.5, 0.5), 0.0);
    }

    #[test]
    fn output_below_f64_range_underflows_to_zero() {
        assert_eq!(cobb_douglas(1.0, 1e-200, 1e-200, 1.0, 1.0), 0.0);
        assert!(cobb_douglas(1.0, 1e-100, 1e-100, 1.0, 1.0) > 0.0);
    }

    #[test]
    fn known_value() {
        // 2 · 16^0.5 · 81^0.5 = 2 · 4 · 9
        let out = cobb_douglas(2.0, 16.0, 81.0, 0.5, 0.5);
        assert!((out - 72.0).abs() < 1e-9);
    }

    #[test]
    fn constant_returns_to_scale() {
        let base = cobb_douglas(1.0, 10.0, 20.0, 0.6, 0.4);
        let doubled = cobb_douglas(1.0, 20.0, 40.0, 0.6, 0.4);
        assert!((doubled - 2.0 * base).abs() < 1e-9);
    }

    #[test]
    fn process_writes_output_and_deposits_mix() {
        let config = EconomyConfig::seeded(1);
        let mut region = test_region("r1");
        region.production.output = 12.0;
        let food_before = region.resources.get("Food");

        run_stage(&mut ProductionCalculator, &mut region, &config, 1);

        let capital = f64::from(region.infrastructure.level) * config.production.capital_per_level;
        let expected = cobb_douglas(1.0, region.population.labor, capital, 0.6, 0.4);
        assert!((region.production.output - expected).abs() < 1e-9);
        assert_eq!(region.production.previous_output, 12.0);
        let food = region.production.produced("Food");
        assert!((food - expected * 0.5).abs() < 1e-9);
        assert!((region.resources.get("Food") - (food_before + food)).abs() < 1e-9);
    }

    #[test]
    fn no_infrastructure_means_no_output() {
        let config = EconomyConfig::seeded(1);
        let mut region = test_region("r1");
        region.infrastructure.level = 0;
        run_stage(&mut ProductionCalculator, &mut region, &config, 1);
        assert_eq!(region.production.output, 0.0);
        assert_eq!(region.production.produced("Food"), 0.0);
    }
}
