use crate::core::dataset::error::DatasetError;
use crate::core::dataset::info::DatasetInfo;
use crate::core::dataset::source::DatasetSample;
use crate::core::models::molecule::Molecule;
use crate::core::notation::StructureNotation;
use crate::engine::config::{ConfigError, RefineConfig};
use crate::engine::energy::{EnergyEvaluator, energy_deltas};
use crate::engine::error::EngineError;
use crate::engine::filter::{CandidateDecision, MoleculeFilter, RejectReason};
use crate::engine::oracle::DiffusionOracle;
use crate::engine::progress::{Progress, ProgressReporter};
use crate::engine::runner::TrajectoryRunner;
use crate::engine::trajectory::TrajectoryWriter;
use rand::{SeedableRng, rngs::StdRng};
use std::path::PathBuf;
use tracing::{debug, info, instrument, warn};

/// External collaborators a refinement run is driven by.
pub struct Collaborators<'c> {
    pub oracle: &'c mut dyn DiffusionOracle,
    pub notation: &'c dyn StructureNotation,
    /// Only consulted when `energy_deltas` is enabled.
    pub energy: Option<&'c mut dyn EnergyEvaluator>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct RejectionCounts {
    pub unparseable: usize,
    pub ring: usize,
    pub multiple_bond: usize,
    pub branching: usize,
    pub charge: usize,
}

impl RejectionCounts {
    pub fn record(&mut self, reason: RejectReason) {
        let slot = match reason {
            RejectReason::Unparseable => &mut self.unparseable,
            RejectReason::RingPresent => &mut self.ring,
            RejectReason::MultipleBond => &mut self.multiple_bond,
            RejectReason::ExcessiveBranching { .. } => &mut self.branching,
            RejectReason::ChargeInconsistent { .. } => &mut self.charge,
        };
        *slot += 1;
    }

    pub fn total(&self) -> usize {
        self.unparseable + self.ring + self.multiple_bond + self.branching + self.charge
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct TrajectorySummary {
    pub sample_index: usize,
    pub directory: PathBuf,
    pub steps: usize,
    pub mismatches: usize,
    pub intermediate_mismatches: usize,
    pub inconsistent_steps: Vec<usize>,
    /// `E(step) - E(gs)` per step, when energy deltas are enabled.
    pub energy_deltas: Option<Vec<f64>>,
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct RefineSummary {
    pub examined: usize,
    pub accepted: usize,
    pub rejections: RejectionCounts,
    pub trajectories: Vec<TrajectorySummary>,
}

impl RefineSummary {
    pub fn total_mismatches(&self) -> usize {
        self.trajectories.iter().map(|t| t.mismatches).sum()
    }
}

/// Walks `samples` in order, up to the configured cap, and runs one Monte
/// Carlo trajectory for every molecule the filter accepts.
///
/// Rejected samples are skipped. Consistency findings are logged and written
/// anyway. Dataset, oracle and I/O faults abort the whole run.
#[instrument(skip_all, name = "refine_workflow")]
pub fn run<I>(
    samples: I,
    info: &DatasetInfo,
    config: &RefineConfig,
    collaborators: Collaborators<'_>,
    reporter: &ProgressReporter,
) -> Result<RefineSummary, EngineError>
where
    I: IntoIterator<Item = Result<DatasetSample, DatasetError>>,
{
    let Collaborators {
        oracle,
        notation,
        mut energy,
    } = collaborators;

    if config.validation.energy_deltas && energy.is_none() {
        return Err(ConfigError::MissingParameter("energy_evaluator").into());
    }

    info!(
        dataset = %info.name,
        range = %config.range.label(),
        mc_steps = config.mc_steps,
        max_samples = config.max_samples,
        "Starting Monte Carlo refinement."
    );

    let filter = MoleculeFilter::new(&config.filter);
    let runner = TrajectoryRunner::new(info, config, reporter);
    let mut rng = StdRng::seed_from_u64(config.model_seed);
    let mut summary = RefineSummary::default();

    for (index, sample) in samples.into_iter().take(config.max_samples).enumerate() {
        let sample = sample?;
        summary.examined += 1;

        let mut molecule = Molecule::from_sample(&sample, info)
            .map_err(|source| EngineError::Molecule { sample: index, source })?;
        let line = notation.notation(&molecule);

        if let CandidateDecision::Rejected(reason) = filter.evaluate(&molecule, line.as_deref()) {
            match reason {
                RejectReason::ChargeInconsistent { deviation } => {
                    warn!(
                        sample = index,
                        deviation,
                        "Formal charges do not match atomic numbers; skipping."
                    );
                    reporter.report(Progress::Message(format!(
                        "Sample {:04} skipped: charges deviate by {}",
                        index, deviation
                    )));
                }
                _ => debug!(
                    sample = index,
                    reason = reason.code(),
                    notation = line.as_deref().unwrap_or("-"),
                    "Candidate rejected."
                ),
            }
            summary.rejections.record(reason);
            continue;
        }

        molecule.recenter();
        summary.accepted += 1;
        info!(
            sample = index,
            atoms = molecule.len(),
            notation = line.as_deref().unwrap_or("-"),
            "Candidate accepted."
        );
        reporter.report(Progress::PhaseStart {
            name: format!("Sample {:04}", index),
        });

        let directory = TrajectoryWriter::directory_for(&config.output, &config.range, index);
        let writer = TrajectoryWriter::create(directory, &molecule)?;
        let trajectory = runner.run(&mut *oracle, &mut rng, &molecule, &writer, index)?;

        let deltas = match energy.as_deref_mut() {
            Some(evaluator) if config.validation.energy_deltas => Some(
                energy_deltas(evaluator, molecule.atomic_numbers(), &trajectory)
                    .map_err(|source| EngineError::Energy { sample: index, source })?,
            ),
            _ => None,
        };

        reporter.report(Progress::PhaseFinish);

        summary.trajectories.push(TrajectorySummary {
            sample_index: index,
            directory: trajectory.directory.clone(),
            steps: trajectory.steps.len(),
            mismatches: trajectory.mismatch_count(),
            intermediate_mismatches: trajectory.intermediate_mismatch_count(),
            inconsistent_steps: trajectory.inconsistent_steps().collect(),
            energy_deltas: deltas,
        });
    }

    info!(
        examined = summary.examined,
        accepted = summary.accepted,
        rejected = summary.rejections.total(),
        mismatches = summary.total_mismatches(),
        "Refinement finished."
    );
    Ok(summary)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rejection_counts_bucket_by_reason() {
        let mut counts = RejectionCounts::default();
        counts.record(RejectReason::RingPresent);
        counts.record(RejectReason::RingPresent);
        counts.record(RejectReason::ExcessiveBranching { branches: 16 });
        counts.record(RejectReason::ChargeInconsistent { deviation: 1 });
        assert_eq!(counts.ring, 2);
        assert_eq!(counts.branching, 1);
        assert_eq!(counts.charge, 1);
        assert_eq!(counts.total(), 4);
    }
}
