use serde::{Deserialize, Serialize};

/// Phase of the macro-economic cycle.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(into = "String", try_from = "String")]
pub enum CyclePhase {
    Expansion,
    Peak,
    Contraction,
    Trough,
}

string_enum!(CyclePhase {
    Expansion => "expansion",
    Peak => "peak",
    Contraction => "contraction",
    Trough => "trough",
});

impl CyclePhase {
    /// The phase that follows this one. The cycle has no terminal state.
    pub fn next(self) -> CyclePhase {
        match self {
            CyclePhase::Expansion => CyclePhase::Peak,
            CyclePhase::Peak => CyclePhase::Contraction,
            CyclePhase::Contraction => CyclePhase::Trough,
            CyclePhase::Trough => CyclePhase::Expansion,
        }
    }
}

/// Economy-wide cycle state. Persists across ticks independently of regions.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CycleState {
    pub phase: CyclePhase,
    /// Ticks already spent in `phase`.
    pub turns_in_phase: u32,
    /// Length of the current phase, drawn (with jitter) when it was entered.
    pub phase_duration: u32,
    /// Effect applied to production and wealth while in `phase`.
    pub multiplier: f64,
}

impl CycleState {
    pub fn new(phase: CyclePhase, phase_duration: u32, multiplier: f64) -> Self {
        Self {
            phase,
            turns_in_phase: 0,
            phase_duration: phase_duration.max(1),
            multiplier,
        }
    }

    /// Ticks left before the next transition.
    pub fn remaining(&self) -> u32 {
        self.phase_duration.saturating_sub(self.turns_in_phase)
    }
}
