use super::config::{RefineConfig, StepRange};
use super::encoder::{ConformerEncoder, PaddedTensorBundle};
use super::error::EngineError;
use super::oracle::{DiffusionChain, DiffusionOracle, OracleRequest};
use super::progress::{Progress, ProgressReporter};
use super::state::{McStep, RunnerState, Trajectory};
use super::trajectory::TrajectoryWriter;
use super::validation::ConsistencyValidator;
use crate::core::dataset::info::DatasetInfo;
use crate::core::models::molecule::Molecule;
use rand::RngCore;
use tracing::{debug, info, warn};

/// Runs the Monte Carlo loop for one accepted molecule.
///
/// Each step encodes the current geometry, asks the oracle for a chain over
/// the configured window, validates the most refined snapshot and carries its
/// real-atom positions into the next step. Nothing but the geometry is
/// carried forward.
pub struct TrajectoryRunner<'r, 'p> {
    encoder: ConformerEncoder,
    validator: ConsistencyValidator,
    range: StepRange,
    steps: usize,
    validate_full_chain: bool,
    reporter: &'r ProgressReporter<'p>,
}

impl<'r, 'p> TrajectoryRunner<'r, 'p> {
    pub fn new(info: &DatasetInfo, config: &RefineConfig, reporter: &'r ProgressReporter<'p>) -> Self {
        Self {
            encoder: ConformerEncoder::new(info),
            validator: ConsistencyValidator::new(info, config.validation.check_charge_drift),
            range: config.range,
            steps: config.mc_steps,
            validate_full_chain: config.validation.validate_full_chain,
            reporter,
        }
    }

    /// Writes the ground state, then one frame per step. `molecule` must
    /// already be recentered; its positions are the ground-state geometry.
    pub fn run<O, R>(
        &self,
        oracle: &mut O,
        rng: &mut R,
        molecule: &Molecule,
        writer: &TrajectoryWriter,
        sample: usize,
    ) -> Result<Trajectory, EngineError>
    where
        O: DiffusionOracle + ?Sized,
        R: RngCore + ?Sized,
    {
        let n = molecule.len();
        writer.write_ground_state(molecule)?;

        let mut geometry = molecule.positions().to_vec();
        let mut steps = Vec::with_capacity(self.steps);
        let mut state = RunnerState::Init;
        let mut inconsistent = 0usize;

        self.reporter.report(Progress::TaskStart {
            total: self.steps as u64,
        });

        loop {
            state = state.advance(self.steps);
            let RunnerState::Stepping { step } = state else {
                break;
            };

            let anchor = self
                .encoder
                .encode(molecule, &geometry)
                .map_err(|source| EngineError::Encoding { sample, source })?;
            let request = OracleRequest {
                anchor: &anchor,
                num_atoms: n,
                range: self.range,
                seed: rng.next_u64(),
            };
            let chain = oracle
                .refine(&request)
                .map_err(|source| EngineError::Oracle {
                    sample,
                    step,
                    source,
                })?
                .reversed();
            let refined = self.most_refined(&chain, sample, step)?;

            let report = self.validator.check(molecule, refined, sample, step);
            let intermediate_mismatches = if self.validate_full_chain {
                self.validate_rest_of_chain(&chain, molecule, sample, step)
            } else {
                0
            };

            geometry = refined.positions_slice(n);
            let charge_offsets = refined
                .rounded_charges(n)
                .into_iter()
                .zip(molecule.atomic_numbers())
                .map(|(q, &z)| q - z as i32)
                .collect();

            let mc_step = McStep {
                index: step,
                geometry: geometry.clone(),
                charge_offsets,
                consistent: report.is_consistent(),
                mismatches: report.mismatches.len(),
                intermediate_mismatches,
            };
            writer.write_step(&mc_step)?;
            debug!(sample, step, consistent = mc_step.consistent, "MC step written.");
            if !mc_step.consistent {
                inconsistent += 1;
                self.reporter.report(Progress::StatusUpdate {
                    text: format!("{} inconsistent", inconsistent),
                });
            }
            steps.push(mc_step);

            self.reporter.report(Progress::TaskIncrement { amount: 1 });
        }

        self.reporter.report(Progress::TaskFinish);

        let trajectory = Trajectory {
            sample_index: sample,
            directory: writer.directory().to_path_buf(),
            ground_state: molecule.positions().to_vec(),
            steps,
        };
        info!(
            sample,
            steps = trajectory.steps.len(),
            mismatches = trajectory.mismatch_count(),
            "Trajectory complete."
        );
        Ok(trajectory)
    }

    /// Index 0 of a reversed chain, after checking the chain has the length
    /// of the window and every snapshot has the padded shape.
    fn most_refined<'c>(
        &self,
        chain: &'c DiffusionChain,
        sample: usize,
        step: usize,
    ) -> Result<&'c PaddedTensorBundle, EngineError> {
        let invalid = |reason: String| EngineError::InvalidChain {
            sample,
            step,
            reason,
        };

        if chain.len() != self.range.len() {
            return Err(invalid(format!(
                "expected {} snapshot(s) for window {}, got {}",
                self.range.len(),
                self.range,
                chain.len()
            )));
        }
        let (capacity, num_types) = (self.encoder.capacity(), self.encoder.num_types());
        if let Some(pos) = chain
            .snapshots()
            .iter()
            .position(|s| !s.has_shape(capacity, num_types))
        {
            return Err(invalid(format!(
                "snapshot {} is not {}x{}",
                pos, capacity, num_types
            )));
        }
        chain
            .first()
            .ok_or_else(|| invalid("chain is empty".to_string()))
    }

    /// Mismatches summed over every snapshot but the most refined one.
    fn validate_rest_of_chain(
        &self,
        chain: &DiffusionChain,
        molecule: &Molecule,
        sample: usize,
        step: usize,
    ) -> usize {
        let mut total = 0;
        for (position, snapshot) in chain.snapshots().iter().enumerate().skip(1) {
            let report = self.validator.validate(molecule, snapshot);
            total += report.mismatches.len();
            if !report.is_consistent() {
                warn!(
                    sample,
                    step,
                    chain_position = position,
                    "Intermediate snapshot has {} atom-type mismatch(es).",
                    report.mismatches.len()
                );
            }
        }
        total
    }
}
