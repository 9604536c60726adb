#[macro_use]
mod macros;

pub mod condition;
pub mod cycle;
pub mod region;
pub mod registry;
pub mod snapshot;
pub mod stage;

pub use condition::RegionCondition;
pub use cycle::{CyclePhase, CycleState};
pub use region::{
    Economy, Infrastructure, LedgerEntry, LedgerKind, Market, MarketQuote, Population,
    Production, Region, RegionBuilder, RegionId, Resources, Withdrawal,
};
pub use registry::RegionRegistry;
pub use snapshot::RegionSnapshot;
pub use stage::PipelineStage;
