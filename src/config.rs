use std::collections::{BTreeMap, BTreeSet};

use serde::{Deserialize, Serialize};

use crate::error::ConfigError;
use crate::model::{CyclePhase, PipelineStage};

/// Parameters for the whole engine. Immutable once handed to the orchestrator.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct EconomyConfig {
    /// RNG seed. `None` draws one from OS entropy at construction.
    pub seed: Option<u64>,
    /// Stage order applied to every region each tick.
    pub pipeline: Vec<PipelineStage>,
    pub production: ProductionConfig,
    pub infrastructure: InfrastructureConfig,
    pub consumption: ConsumptionConfig,
    pub wealth: WealthConfig,
    pub cycle: CycleConfig,
    pub volatility: VolatilityConfig,
    pub market: MarketConfig,
}

impl Default for EconomyConfig {
    fn default() -> Self {
        Self {
            seed: None,
            pipeline: PipelineStage::default_order(),
            production: ProductionConfig::default(),
            infrastructure: InfrastructureConfig::default(),
            consumption: ConsumptionConfig::default(),
            wealth: WealthConfig::default(),
            cycle: CycleConfig::default(),
            volatility: VolatilityConfig::default(),
            market: MarketConfig::default(),
        }
    }
}

/// Cobb-Douglas parameters: `output = A · L^α · K^β`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ProductionConfig {
    /// Total factor productivity `A`.
    pub productivity: f64,
    /// Labor exponent `α`.
    pub labor_elasticity: f64,
    /// Capital exponent `β`.
    pub capital_elasticity: f64,
    /// Capital contributed by each infrastructure level.
    pub capital_per_level: f64,
    /// Share of output deposited into each resource stock.
    pub output_mix: BTreeMap<String, f64>,
}

impl Default for ProductionConfig {
    fn default() -> Self {
        Self {
            productivity: 1.0,
            labor_elasticity: 0.6,
            capital_elasticity: 0.4,
            capital_per_level: 25.0,
            output_mix: BTreeMap::from([
                ("Food".to_string(), 0.5),
                ("Materials".to_string(), 0.3),
                ("Fuel".to_string(), 0.2),
            ]),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct InfrastructureConfig {
    /// Wealth charged per infrastructure level each tick.
    pub maintenance_cost_multiplier: f64,
    /// Levels lost per tick (fractions accumulate as wear).
    pub decay_rate: f64,
    /// Decay never takes a region below this level ("ruins").
    pub min_level: u32,
    /// Decay is multiplied by this while maintenance is underfunded.
    pub underfunded_decay_multiplier: f64,
    /// Upgrading to level `n` costs `n × upgrade_cost_per_level`.
    pub upgrade_cost_per_level: f64,
}

impl Default for InfrastructureConfig {
    fn default() -> Self {
        Self {
            maintenance_cost_multiplier: 5.0,
            decay_rate: 0.02,
            min_level: 0,
            underfunded_decay_multiplier: 3.0,
            upgrade_cost_per_level: 100.0,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConsumptionConfig {
    /// Units of each resource one person needs per tick.
    pub per_capita_need: BTreeMap<String, f64>,
    /// How strongly per-capita wealth raises consumption.
    pub wealth_elasticity: f64,
    /// Upper bound on the wealth factor.
    pub max_wealth_factor: f64,
    /// Blend rate toward full satisfaction when every need is met.
    pub recovery_rate: f64,
    /// Blend rate toward zero satisfaction at a 100% shortage.
    pub decline_rate: f64,
}

impl Default for ConsumptionConfig {
    fn default() -> Self {
        Self {
            per_capita_need: BTreeMap::from([
                ("Food".to_string(), 0.05),
                ("Materials".to_string(), 0.02),
                ("Fuel".to_string(), 0.01),
            ]),
            wealth_elasticity: 0.1,
            max_wealth_factor: 2.0,
            recovery_rate: 0.1,
            decline_rate: 0.25,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct WealthConfig {
    /// Lowest wealth a region can reach (heavy debt).
    pub floor: f64,
    /// Compounding baseline growth applied to current wealth each tick.
    pub growth_rate: f64,
    /// Wealth earned per unit of production output.
    pub value_per_unit: f64,
    /// Share of production value collected into the treasury.
    pub tax_rate: f64,
}

impl Default for WealthConfig {
    fn default() -> Self {
        Self {
            floor: -1000.0,
            growth_rate: 0.01,
            value_per_unit: 0.2,
            tax_rate: 0.15,
        }
    }
}

/// Duration and effect of one cycle phase.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PhaseConfig {
    /// Base length in ticks.
    pub duration: u32,
    /// Multiplier applied to production and wealth each tick.
    pub multiplier: f64,
    /// Scale on price noise while in this phase.
    pub volatility: f64,
}

impl PhaseConfig {
    pub fn new(duration: u32, multiplier: f64, volatility: f64) -> Self {
        Self {
            duration,
            multiplier,
            volatility,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CycleConfig {
    /// Scales every phase multiplier.
    pub coefficient: f64,
    /// Maximum ticks added to or removed from a phase's base duration.
    pub jitter: u32,
    pub expansion: PhaseConfig,
    pub peak: PhaseConfig,
    pub contraction: PhaseConfig,
    pub trough: PhaseConfig,
}

impl Default for CycleConfig {
    fn default() -> Self {
        Self {
            coefficient: 1.0,
            jitter: 2,
            expansion: PhaseConfig::new(12, 1.01, 1.0),
            peak: PhaseConfig::new(4, 1.005, 1.2),
            contraction: PhaseConfig::new(8, 0.99, 2.0),
            trough: PhaseConfig::new(4, 0.995, 1.5),
        }
    }
}

impl CycleConfig {
    pub fn phase(&self, phase: CyclePhase) -> &PhaseConfig {
        match phase {
            CyclePhase::Expansion => &self.expansion,
            CyclePhase::Peak => &self.peak,
            CyclePhase::Contraction => &self.contraction,
            CyclePhase::Trough => &self.trough,
        }
    }

    /// `multiplier[phase] × coefficient`.
    pub fn effect(&self, phase: CyclePhase) -> f64 {
        self.phase(phase).multiplier * self.coefficient
    }

    /// Length of one full cycle without jitter.
    pub fn total_duration(&self) -> u64 {
        CyclePhase::ALL
            .iter()
            .map(|p| u64::from(self.phase(*p).duration))
            .sum()
    }
}

/// `Price(t+1) = Price(t) + α·(SupplyShock − ConsumptionTrend) + noise`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct VolatilityConfig {
    /// `α`: price units per unit of net shock.
    pub shock_sensitivity: f64,
    /// Half-width of the uniform noise draw, before the phase scale.
    pub volatility: f64,
    /// Reference prices stay within `[min, max] × base price`.
    pub min_price_ratio: f64,
    pub max_price_ratio: f64,
}

impl Default for VolatilityConfig {
    fn default() -> Self {
        Self {
            shock_sensitivity: 2.0,
            volatility: 0.05,
            min_price_ratio: 0.2,
            max_price_ratio: 5.0,
        }
    }
}

/// `price = base × (1 + (demand − supply) / elasticity)`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct MarketConfig {
    /// Must be strictly positive.
    pub elasticity: f64,
    pub base_prices: BTreeMap<String, f64>,
    /// Base price for resources missing from `base_prices`.
    pub default_base_price: f64,
    /// Published prices never drop below this.
    pub min_price: f64,
}

impl Default for MarketConfig {
    fn default() -> Self {
        Self {
            elasticity: 200.0,
            base_prices: BTreeMap::from([
                ("Food".to_string(), 10.0),
                ("Materials".to_string(), 15.0),
                ("Fuel".to_string(), 20.0),
            ]),
            default_base_price: 10.0,
            min_price: 0.01,
        }
    }
}

impl MarketConfig {
    pub fn base_price(&self, resource: &str) -> f64 {
        self.base_prices
            .get(resource)
            .copied()
            .unwrap_or(self.default_base_price)
    }
}

// ---------------------------------------------------------------------------
// Validation
// ---------------------------------------------------------------------------

impl EconomyConfig {
    /// Config with a fixed seed, for reproducible runs.
    pub fn seeded(seed: u64) -> Self {
        Self {
            seed: Some(seed),
            ..Self::default()
        }
    }

    /// Reject any value that could produce NaN or infinities mid-run.
    pub fn validate(&self) -> Result<(), ConfigError> {
        validate_pipeline(&self.pipeline)?;

        let p = &self.production;
        positive("production.productivity", p.productivity)?;
        exponent("production.labor_elasticity", p.labor_elasticity)?;
        exponent("production.capital_elasticity", p.capital_elasticity)?;
        non_negative("production.capital_per_level", p.capital_per_level)?;
        for (name, share) in &p.output_mix {
            non_negative(&format!("production.output_mix.{name}"), *share)?;
        }

        let i = &self.infrastructure;
        non_negative("infrastructure.maintenance_cost_multiplier", i.maintenance_cost_multiplier)?;
        non_negative("infrastructure.decay_rate", i.decay_rate)?;
        non_negative("infrastructure.underfunded_decay_multiplier", i.underfunded_decay_multiplier)?;
        non_negative("infrastructure.upgrade_cost_per_level", i.upgrade_cost_per_level)?;

        let c = &self.consumption;
        for (name, need) in &c.per_capita_need {
            non_negative(&format!("consumption.per_capita_need.{name}"), *need)?;
        }
        non_negative("consumption.wealth_elasticity", c.wealth_elasticity)?;
        in_range("consumption.max_wealth_factor", c.max_wealth_factor, 1.0, f64::MAX)?;
        in_range("consumption.recovery_rate", c.recovery_rate, 0.0, 1.0)?;
        in_range("consumption.decline_rate", c.decline_rate, 0.0, 1.0)?;

        let w = &self.wealth;
        finite("wealth.floor", w.floor)?;
        in_range("wealth.growth_rate", w.growth_rate, -1.0, 1.0)?;
        non_negative("wealth.value_per_unit", w.value_per_unit)?;
        in_range("wealth.tax_rate", w.tax_rate, 0.0, 1.0)?;

        let cy = &self.cycle;
        positive("cycle.coefficient", cy.coefficient)?;
        for phase in CyclePhase::ALL {
            let pc = cy.phase(*phase);
            if pc.duration == 0 {
                return Err(ConfigError::ZeroDuration(*phase));
            }
            positive(&format!("cycle.{phase}.multiplier"), pc.multiplier)?;
            non_negative(&format!("cycle.{phase}.volatility"), pc.volatility)?;
        }

        let v = &self.volatility;
        non_negative("volatility.shock_sensitivity", v.shock_sensitivity)?;
        non_negative("volatility.volatility", v.volatility)?;
        positive("volatility.min_price_ratio", v.min_price_ratio)?;
        positive("volatility.max_price_ratio", v.max_price_ratio)?;
        if v.min_price_ratio > v.max_price_ratio {
            return Err(ConfigError::PriceBounds {
                min: v.min_price_ratio,
                max: v.max_price_ratio,
            });
        }

        let m = &self.market;
        positive("market.elasticity", m.elasticity)?;
        positive("market.default_base_price", m.default_base_price)?;
        for (name, price) in &m.base_prices {
            positive(&format!("market.base_prices.{name}"), *price)?;
        }
        non_negative("market.min_price", m.min_price)?;

        Ok(())
    }
}

fn validate_pipeline(pipeline: &[PipelineStage]) -> Result<(), ConfigError> {
    let unique: BTreeSet<PipelineStage> = pipeline.iter().copied().collect();
    if unique.len() != pipeline.len() {
        return Err(ConfigError::Pipeline("a stage appears more than once".to_string()));
    }
    if let Some(missing) = PipelineStage::ALL.iter().find(|s| !unique.contains(s)) {
        return Err(ConfigError::Pipeline(format!("missing stage {missing}")));
    }
    Ok(())
}

fn finite(field: &str, value: f64) -> Result<(), ConfigError> {
    if value.is_finite() {
        Ok(())
    } else {
        Err(ConfigError::NonFinite {
            field: field.to_string(),
            value,
        })
    }
}

fn positive(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 {
        Ok(())
    } else {
        Err(ConfigError::NotPositive {
            field: field.to_string(),
            value,
        })
    }
}

fn non_negative(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value >= 0.0 {
        Ok(())
    } else {
        Err(ConfigError::Negative {
            field: field.to_string(),
            value,
        })
    }
}

fn in_range(field: &str, value: f64, min: f64, max: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if (min..=max).contains(&value) {
        Ok(())
    } else {
        Err(ConfigError::OutOfRange {
            field: field.to_string(),
            value,
            min,
            max,
        })
    }
}

fn exponent(field: &str, value: f64) -> Result<(), ConfigError> {
    finite(field, value)?;
    if value > 0.0 && value <= 1.0 {
        Ok(())
    } else {
        Err(ConfigError::Exponent {
            field: field.to_string(),
            value,
        })
    }
}
