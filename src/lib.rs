pub mod config;
pub mod error;
pub mod id;
pub mod model;
pub mod sim;

#[cfg(test)]
mod testutil;

pub use config::EconomyConfig;
pub use error::{ConfigError, EngineError, Result};
pub use id::SubscriptionId;
pub use model::{
    CyclePhase, CycleState, PipelineStage, Region, RegionBuilder, RegionCondition, RegionId,
    RegionSnapshot,
};
pub use sim::{
    EconomicOrchestrator, EconomicSubsystem, Notification, NotificationBus, TickReport, Topic,
};
