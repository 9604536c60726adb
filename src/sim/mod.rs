mod bus;
mod consumption;
mod context;
mod cycle;
mod infrastructure;
mod market;
mod orchestrator;
mod production;
mod rng;
mod signal;
mod system;
mod volatility;
mod wealth;

pub use bus::NotificationBus;
pub use consumption::{ConsumptionManager, blend, wealth_factor};
pub use context::TickContext;
pub use cycle::{CycleManager, advance as advance_cycle, draw_duration, initial_state};
pub use infrastructure::{InfrastructureManager, maintenance_cost};
pub use market::{MarketBalancer, price_signal};
pub use orchestrator::{EconomicOrchestrator, TickReport, build_pipeline, upgrade_cost};
pub use production::{ProductionCalculator, cobb_douglas};
pub use rng::{derive_stage_seed, stage_rng};
pub use signal::{Notification, Topic};
pub use system::EconomicSubsystem;
pub use volatility::{PriceVolatilityManager, contraction, next_reference_price};
pub use wealth::WealthManager;
