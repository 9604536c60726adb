use std::hash::{DefaultHasher, Hash, Hasher};

use rand::SeedableRng;
use rand::rngs::SmallRng;

/// Derive a deterministic per-stage seed from the run seed, stage name, and tick.
///
/// Each stage draws from its own stream, so adding randomness to one stage
/// never shifts the draws another stage sees.
pub fn derive_stage_seed(seed: u64, stage: &str, tick: u64) -> u64 {
    let mut hasher = DefaultHasher::new();
    seed.hash(&mut hasher);
    stage.hash(&mut hasher);
    tick.hash(&mut hasher);
    hasher.finish()
}

pub fn stage_rng(seed: u64, stage: &str, tick: u64) -> SmallRng {
    SmallRng::seed_from_u64(derive_stage_seed(seed, stage, tick))
}
