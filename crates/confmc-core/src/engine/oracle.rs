//! The contract between the Monte Carlo runner and a pretrained diffusion model.
//!
//! The model is never implemented in this crate. A backend only has to turn an
//! anchor bundle, a window of the noise schedule and a seed into a chain of
//! snapshots over that window.

use super::config::StepRange;
use super::encoder::PaddedTensorBundle;
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error)]
pub enum OracleError {
    #[error("Oracle backend is unavailable: {0}")]
    Unavailable(String),

    #[error("Oracle I/O failure: {0}")]
    Io(#[from] std::io::Error),

    #[error("Oracle returned a malformed response: {0}")]
    Protocol(String),

    #[error("Oracle reported a failure: {0}")]
    Backend(String),
}

/// One refinement call: re-noise `anchor` to `range.start()` and denoise it
/// back down to `range.end()`.
#[derive(Debug, Clone)]
pub struct OracleRequest<'a> {
    pub anchor: &'a PaddedTensorBundle,
    pub num_atoms: usize,
    pub range: StepRange,
    pub seed: u64,
}

pub trait DiffusionOracle {
    fn refine(&mut self, request: &OracleRequest<'_>) -> Result<DiffusionChain, OracleError>;
}

impl<T: DiffusionOracle + ?Sized> DiffusionOracle for &mut T {
    fn refine(&mut self, request: &OracleRequest<'_>) -> Result<DiffusionChain, OracleError> {
        (**self).refine(request)
    }
}

impl<T: DiffusionOracle + ?Sized> DiffusionOracle for Box<T> {
    fn refine(&mut self, request: &OracleRequest<'_>) -> Result<DiffusionChain, OracleError> {
        (**self).refine(request)
    }
}

/// Ordered snapshots of one refinement call.
///
/// Oracles produce chains most-noised first. [`DiffusionChain::reversed`] flips
/// the order so that index 0 is the most refined structure.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(transparent)]
pub struct DiffusionChain {
    snapshots: Vec<PaddedTensorBundle>,
}

impl DiffusionChain {
    pub fn new(snapshots: Vec<PaddedTensorBundle>) -> Self {
        Self { snapshots }
    }

    pub fn len(&self) -> usize {
        self.snapshots.len()
    }

    pub fn is_empty(&self) -> bool {
        self.snapshots.is_empty()
    }

    pub fn get(&self, index: usize) -> Option<&PaddedTensorBundle> {
        self.snapshots.get(index)
    }

    pub fn snapshots(&self) -> &[PaddedTensorBundle] {
        &self.snapshots
    }

    pub fn reversed(mut self) -> Self {
        self.snapshots.reverse();
        self
    }

    /// First element; after [`DiffusionChain::reversed`], the most refined one.
    pub fn first(&self) -> Option<&PaddedTensorBundle> {
        self.snapshots.first()
    }
}
