use nalgebra::Point3;
use std::path::PathBuf;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RunnerState {
    Init,
    Stepping { step: usize },
    Done,
}

impl RunnerState {
    /// State after one completed transition for a run of `total` steps.
    pub fn advance(self, total: usize) -> Self {
        let next = match self {
            Self::Init => 0,
            Self::Stepping { step } => step + 1,
            Self::Done => return Self::Done,
        };
        if next < total {
            Self::Stepping { step: next }
        } else {
            Self::Done
        }
    }
}

/// One persisted Monte Carlo step.
#[derive(Debug, Clone, PartialEq)]
pub struct McStep {
    pub index: usize,
    pub geometry: Vec<Point3<f64>>,
    /// Per-atom `round(charge) - Z` decoded from the refined snapshot.
    pub charge_offsets: Vec<i32>,
    pub consistent: bool,
    pub mismatches: usize,
    /// Mismatches in the noisier snapshots of the chain; only counted when
    /// full-chain validation is on.
    pub intermediate_mismatches: usize,
}

/// The ground state and every step of one accepted molecule.
#[derive(Debug, Clone, PartialEq)]
pub struct Trajectory {
    pub sample_index: usize,
    pub directory: PathBuf,
    pub ground_state: Vec<Point3<f64>>,
    pub steps: Vec<McStep>,
}

impl Trajectory {
    pub fn mismatch_count(&self) -> usize {
        self.steps.iter().map(|s| s.mismatches).sum()
    }

    pub fn intermediate_mismatch_count(&self) -> usize {
        self.steps.iter().map(|s| s.intermediate_mismatches).sum()
    }

    pub fn inconsistent_steps(&self) -> impl Iterator<Item = usize> + '_ {
        self.steps.iter().filter(|s| !s.consistent).map(|s| s.index)
    }
}
