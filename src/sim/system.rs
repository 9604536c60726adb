use super::context::TickContext;
use crate::model::{PipelineStage, Region};

/// One economic subsystem in the per-region pipeline.
///
/// Object-safe so the orchestrator can hold stages as `Box<dyn EconomicSubsystem>`
/// in configured order. A stage mutates only the region it is handed and must
/// not keep a reference to it.
pub trait EconomicSubsystem {
    fn stage(&self) -> PipelineStage;

    fn name(&self) -> &str {
        self.stage().as_str()
    }

    fn process(&mut self, region: &mut Region, ctx: &mut TickContext);
}
