use std::collections::BTreeMap;
use std::fmt;

use serde::{Deserialize, Serialize};

use super::condition::RegionCondition;

/// Opaque region identifier. Ordering is lexical and fixes tick order.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RegionId(String);

impl RegionId {
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for RegionId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl From<&str> for RegionId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl From<String> for RegionId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

// ---------------------------------------------------------------------------
// Resources
// ---------------------------------------------------------------------------

/// Outcome of withdrawing from a resource stock.
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Withdrawal {
    pub taken: f64,
    pub shortfall: f64,
}

/// Named resource stocks. Quantities are finite and never negative.
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Resources {
    stock: BTreeMap<String, f64>,
}

impl Resources {
    pub fn new() -> Self {
        Self::default()
    }

    /// Quantity held, zero for unknown resources.
    pub fn get(&self, name: &str) -> f64 {
        self.stock.get(name).copied().unwrap_or(0.0)
    }

    /// Overwrite a quantity. Negative or non-finite values are stored as zero.
    pub fn set(&mut self, name: impl Into<String>, quantity: f64) {
        self.stock.insert(name.into(), sanitize(quantity));
    }

    /// Add to a stock and return the amount actually added.
    pub fn deposit(&mut self, name: &str, amount: f64) -> f64 {
        let amount = sanitize(amount);
        if amount > 0.0 {
            *self.stock.entry(name.to_string()).or_insert(0.0) += amount;
        }
        amount
    }

    /// Remove up to `amount`, clamping the stock at zero.
    ///
    /// Whatever could not be taken is reported as `shortfall`.
    pub fn withdraw(&mut self, name: &str, amount: f64) -> Withdrawal {
        let wanted = sanitize(amount);
        let held = self.get(name);
        let taken = wanted.min(held);
        if let Some(q) = self.stock.get_mut(name) {
            *q = (*q - taken).max(0.0);
        }
        Withdrawal {
            taken,
            shortfall: wanted - taken,
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, f64)> {
        self.stock.iter().map(|(k, v)| (k.as_str(), *v))
    }

    pub fn names(&self) -> impl Iterator<Item = &str> {
        self.stock.keys().map(String::as_str)
    }

    pub fn total(&self) -> f64 {
        self.stock.values().sum()
    }

    pub fn is_empty(&self) -> bool {
        self.stock.is_empty()
    }

    fn check(&self) -> Result<(), String> {
        for (name, q) in &self.stock {
            if !q.is_finite() || *q < 0.0 {
                return Err(format!("resource {name} has invalid quantity {q}"));
            }
        }
        Ok(())
    }
}

fn check_quantities(label: &str, values: &BTreeMap<String, f64>) -> Result<(), String> {
    for (name, q) in values {
        if !q.is_finite() || *q < 0.0 {
            return Err(format!("{label} of {name} has invalid quantity {q}"));
        }
    }
    Ok(())
}

fn sanitize(value: f64) -> f64 {
    if value.is_finite() { value.max(0.0) } else { 0.0 }
}

// ---------------------------------------------------------------------------
// Components
// ---------------------------------------------------------------------------

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Production {
    /// Output of the most recent tick.
    pub output: f64,
    /// Output of the tick before, kept for delta display.
    pub previous_output: f64,
    /// Quantity of each resource produced on the most recent tick.
    #[serde(default)]
    pub produced: BTreeMap<String, f64>,
}

impl Production {
    pub fn delta(&self) -> f64 {
        self.output - self.previous_output
    }

    pub fn produced(&self, resource: &str) -> f64 {
        self.produced.get(resource).copied().unwrap_or(0.0)
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Economy {
    /// Net wealth. May be negative but never below the configured floor.
    pub wealth: f64,
    pub treasury: f64,
    pub gdp: f64,
    pub gdp_growth: f64,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Infrastructure {
    pub level: u32,
    /// Cost charged on the most recent tick (`level × multiplier`).
    pub maintenance_cost: f64,
    /// Fractional decay carried between ticks, in `[0, 1)`.
    pub wear: f64,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Population {
    pub size: u32,
    pub labor: f64,
    /// Contentment in `[0, 1]`.
    pub satisfaction: f64,
    /// Consumption demand per resource on the most recent tick.
    #[serde(default)]
    pub demand: BTreeMap<String, f64>,
    /// Quantity actually consumed per resource on the most recent tick.
    #[serde(default)]
    pub consumed: BTreeMap<String, f64>,
}

impl Default for Population {
    fn default() -> Self {
        Self {
            size: 0,
            labor: 0.0,
            satisfaction: 0.5,
            demand: BTreeMap::new(),
            consumed: BTreeMap::new(),
        }
    }
}

impl Population {
    pub fn demand(&self, resource: &str) -> f64 {
        self.demand.get(resource).copied().unwrap_or(0.0)
    }

    pub fn consumed(&self, resource: &str) -> f64 {
        self.consumed.get(resource).copied().unwrap_or(0.0)
    }
}

/// Price state for one resource in one region.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct MarketQuote {
    /// Volatility-evolved base the market price is computed from.
    pub reference_price: f64,
    /// Price published by the market balancer.
    pub price: f64,
    pub supply: f64,
    pub demand: f64,
}

impl MarketQuote {
    pub fn opening(base_price: f64, supply: f64, demand: f64) -> Self {
        Self {
            reference_price: base_price,
            price: base_price,
            supply,
            demand,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct Market {
    quotes: BTreeMap<String, MarketQuote>,
}

impl Market {
    pub fn quote(&self, resource: &str) -> Option<&MarketQuote> {
        self.quotes.get(resource)
    }

    pub fn price(&self, resource: &str) -> Option<f64> {
        self.quotes.get(resource).map(|q| q.price)
    }

    /// Quote for `resource`, opened with the given values if absent.
    pub fn quote_or_open(
        &mut self,
        resource: &str,
        base_price: f64,
        supply: f64,
        demand: f64,
    ) -> &mut MarketQuote {
        self.quotes
            .entry(resource.to_string())
            .or_insert_with(|| MarketQuote::opening(base_price, supply, demand))
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &MarketQuote)> {
        self.quotes.iter().map(|(k, v)| (k.as_str(), v))
    }
}

/// What moved wealth during a tick.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum LedgerKind {
    Maintenance,
    ProductionValue,
    Growth,
    CycleEffect,
    Upgrade,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct LedgerEntry {
    pub kind: LedgerKind,
    /// Signed change actually applied to wealth (after floor clamping).
    pub amount: f64,
}

// ---------------------------------------------------------------------------
// Region
// ---------------------------------------------------------------------------

/// The unit of simulation: identity plus its economic components.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Region {
    pub id: RegionId,
    pub name: String,
    /// Owning nation, if any. Aggregation only.
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub nation: Option<String>,
    pub resources: Resources,
    pub production: Production,
    pub economy: Economy,
    pub infrastructure: Infrastructure,
    pub population: Population,
    #[serde(default)]
    pub market: Market,
    /// Conditions raised on the most recent tick.
    #[serde(default)]
    pub conditions: Vec<RegionCondition>,
    /// Wealth movements of the most recent tick, in application order.
    #[serde(default)]
    pub ledger: Vec<LedgerEntry>,
}

impl Region {
    pub fn builder(id: impl Into<RegionId>, name: impl Into<String>) -> RegionBuilder {
        RegionBuilder::new(id, name)
    }

    /// Clear per-tick bookkeeping before the pipeline runs.
    pub fn begin_tick(&mut self) {
        self.conditions.clear();
        self.ledger.clear();
    }

    pub fn raise(&mut self, condition: RegionCondition) {
        self.conditions.push(condition);
    }

    pub fn has_condition(&self, label: &str) -> bool {
        self.conditions.iter().any(|c| c.label() == label)
    }

    /// Apply `delta` to wealth without letting it drop below `floor`.
    ///
    /// Records the applied amount in the ledger and returns it. Non-finite
    /// deltas are ignored.
    pub fn apply_wealth_delta(&mut self, kind: LedgerKind, delta: f64, floor: f64) -> f64 {
        if !delta.is_finite() {
            return 0.0;
        }
        let before = self.economy.wealth;
        let after = (before + delta).max(floor);
        let applied = after - before;
        self.economy.wealth = after;
        self.ledger.push(LedgerEntry {
            kind,
            amount: applied,
        });
        applied
    }

    /// Sum of ledger entries of one kind.
    pub fn ledger_total(&self, kind: LedgerKind) -> f64 {
        self.ledger
            .iter()
            .filter(|e| e.kind == kind)
            .map(|e| e.amount)
            .sum()
    }

    /// Check structural invariants. Used on registration and external updates.
    pub fn validate(&self, wealth_floor: f64) -> Result<(), String> {
        if self.id.as_str().is_empty() {
            return Err("region id cannot be empty".to_string());
        }
        self.resources.check()?;
        let e = &self.economy;
        if !e.wealth.is_finite() || e.wealth < wealth_floor {
            return Err(format!(
                "wealth {} is below the floor {wealth_floor}",
                e.wealth
            ));
        }
        if !e.treasury.is_finite() || !e.gdp.is_finite() || !e.gdp_growth.is_finite() {
            return Err("economy fields must be finite".to_string());
        }
        let p = &self.population;
        if !p.labor.is_finite() || p.labor < 0.0 {
            return Err(format!("labor {} must be non-negative", p.labor));
        }
        if !(0.0..=1.0).contains(&p.satisfaction) {
            return Err(format!("satisfaction {} is outside [0, 1]", p.satisfaction));
        }
        let w = self.infrastructure.wear;
        if !(0.0..1.0).contains(&w) {
            return Err(format!("infrastructure wear {w} is outside [0, 1)"));
        }
        let prod = &self.production;
        for (label, value) in [("output", prod.output), ("previous output", prod.previous_output)] {
            if !value.is_finite() || value < 0.0 {
                return Err(format!("production {label} {value} must be non-negative"));
            }
        }
        check_quantities("produced", &prod.produced)?;
        check_quantities("demand", &p.demand)?;
        check_quantities("consumed", &p.consumed)?;
        for (resource, quote) in self.market.iter() {
            let fields = [
                ("reference price", quote.reference_price),
                ("price", quote.price),
                ("supply", quote.supply),
                ("demand", quote.demand),
            ];
            for (label, value) in fields {
                if !value.is_finite() || value < 0.0 {
                    return Err(format!("market {resource} {label} {value} must be non-negative"));
                }
            }
        }
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Builder
// ---------------------------------------------------------------------------

/// Builds a [`Region`] with every invariant established at creation.
///
/// Out-of-range inputs are clamped: negative quantities become zero and
/// satisfaction is clamped to `[0, 1]`. Wealth is only checked against the
/// floor on registration, since the floor is configuration.
#[derive(Debug, Clone)]
pub struct RegionBuilder {
    region: Region,
}

impl RegionBuilder {
    pub fn new(id: impl Into<RegionId>, name: impl Into<String>) -> Self {
        Self {
            region: Region {
                id: id.into(),
                name: name.into(),
                nation: None,
                resources: Resources::new(),
                production: Production::default(),
                economy: Economy::default(),
                infrastructure: Infrastructure::default(),
                population: Population::default(),
                market: Market::default(),
                conditions: Vec::new(),
                ledger: Vec::new(),
            },
        }
    }

    pub fn nation(mut self, nation: impl Into<String>) -> Self {
        self.region.nation = Some(nation.into());
        self
    }

    pub fn wealth(mut self, wealth: f64) -> Self {
        self.region.economy.wealth = wealth;
        self
    }

    pub fn treasury(mut self, treasury: f64) -> Self {
        self.region.economy.treasury = if treasury.is_finite() { treasury } else { 0.0 };
        self
    }

    /// Seed the production record, as if `output` had been produced last tick.
    pub fn production(mut self, output: f64) -> Self {
        let output = sanitize(output);
        self.region.production.output = output;
        self.region.production.previous_output = output;
        self
    }

    pub fn infrastructure(mut self, level: u32) -> Self {
        self.region.infrastructure.level = level;
        self
    }

    /// Headcount. Labor defaults to half the population unless set explicitly.
    pub fn population(mut self, size: u32) -> Self {
        self.region.population.size = size;
        self.region.population.labor = f64::from(size) * 0.5;
        self
    }

    pub fn labor(mut self, labor: f64) -> Self {
        self.region.population.labor = sanitize(labor);
        self
    }

    pub fn satisfaction(mut self, satisfaction: f64) -> Self {
        self.region.population.satisfaction = if satisfaction.is_finite() {
            satisfaction.clamp(0.0, 1.0)
        } else {
            0.5
        };
        self
    }

    pub fn resource(mut self, name: impl Into<String>, quantity: f64) -> Self {
        self.region.resources.set(name, quantity);
        self
    }

    pub fn build(self) -> Region {
        self.region
    }
}
