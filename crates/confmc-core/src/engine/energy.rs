//! Optional post-trajectory energy analysis.
//!
//! No quantum-chemistry engine ships with this crate. A caller that has one
//! implements [`EnergyEvaluator`] and enables `energy_deltas` in the run
//! configuration.

use super::state::Trajectory;
use nalgebra::Point3;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum EnergyError {
    #[error("Energy evaluation failed: {0}")]
    Evaluation(String),
    #[error("Energy is not finite: {0}")]
    NonFinite(f64),
}

pub trait EnergyEvaluator {
    fn energy(
        &mut self,
        atomic_numbers: &[u8],
        positions: &[Point3<f64>],
    ) -> Result<f64, EnergyError>;
}

impl<T: EnergyEvaluator + ?Sized> EnergyEvaluator for &mut T {
    fn energy(
        &mut self,
        atomic_numbers: &[u8],
        positions: &[Point3<f64>],
    ) -> Result<f64, EnergyError> {
        (**self).energy(atomic_numbers, positions)
    }
}

impl<T: EnergyEvaluator + ?Sized> EnergyEvaluator for Box<T> {
    fn energy(
        &mut self,
        atomic_numbers: &[u8],
        positions: &[Point3<f64>],
    ) -> Result<f64, EnergyError> {
        (**self).energy(atomic_numbers, positions)
    }
}

fn finite(value: f64) -> Result<f64, EnergyError> {
    if value.is_finite() {
        Ok(value)
    } else {
        Err(EnergyError::NonFinite(value))
    }
}

/// `E(step) - E(gs)` for every step, in step order. The ground-state energy
/// is evaluated once.
pub fn energy_deltas<E: EnergyEvaluator + ?Sized>(
    evaluator: &mut E,
    atomic_numbers: &[u8],
    trajectory: &Trajectory,
) -> Result<Vec<f64>, EnergyError> {
    let reference = finite(evaluator.energy(atomic_numbers, &trajectory.ground_state)?)?;
    trajectory
        .steps
        .iter()
        .map(|step| {
            let e = finite(evaluator.energy(atomic_numbers, &step.geometry)?)?;
            Ok(e - reference)
        })
        .collect()
}
