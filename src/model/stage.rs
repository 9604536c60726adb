use serde::{Deserialize, Serialize};

/// One step of the per-region economic pipeline.
///
/// Declaration order is the default pipeline order; each stage reads fields
/// written by the stages before it.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum PipelineStage {
    Production,
    Infrastructure,
    Consumption,
    Wealth,
    Cycle,
    Volatility,
    Market,
}

string_enum!(PipelineStage {
    Production => "production",
    Infrastructure => "infrastructure",
    Consumption => "consumption",
    Wealth => "wealth",
    Cycle => "cycle",
    Volatility => "volatility",
    Market => "market",
});

impl PipelineStage {
    /// Production → Infrastructure → Consumption → Wealth → Cycle → Volatility → Market.
    pub fn default_order() -> Vec<PipelineStage> {
        Self::ALL.to_vec()
    }
}
