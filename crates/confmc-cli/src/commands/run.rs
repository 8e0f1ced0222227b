use crate::cli::RunArgs;
use crate::config::{PartialRunConfig, RunConfig, defaults::DefaultsConfig};
use crate::error::Result;
use crate::oracle::ProcessOracle;
use crate::ui::{ProgressForwarder, UiEvent};
use confmc::{
    core::{
        checkpoint::Checkpoint,
        dataset::{info::DatasetInfo, source::JsonlDataset},
        notation::writer::LineNotation,
    },
    engine::progress::ProgressReporter,
    workflows::{
        self,
        refine::{Collaborators, RefineSummary},
    },
};
use tokio::sync::mpsc;
use tracing::{info, warn};

pub async fn run(args: RunArgs, ui_sender: mpsc::Sender<UiEvent>) -> Result<()> {
    let partial_config = match &args.config {
        Some(path) => PartialRunConfig::from_file(path)?,
        None => PartialRunConfig::default(),
    };
    info!("Merging configuration from file and CLI arguments...");
    let run_config = partial_config.merge_with_cli(&args, &DefaultsConfig::default())?;

    let checkpoint = Checkpoint::load(&run_config.model_dir, run_config.epoch)?;
    let info = DatasetInfo::get(&checkpoint.args.dataset, checkpoint.args.remove_h)?;
    let refine_config = run_config.refine_config(&checkpoint.tag())?;

    info!("Loading validation split from {:?}", &run_config.dataset_path);
    let dataset = JsonlDataset::load(&run_config.dataset_path)?.shuffled(run_config.dataset_seed);
    info!(samples = dataset.len(), "Validation split loaded.");

    let mut oracle = ProcessOracle::spawn(&run_config.oracle_command, &checkpoint)?;
    let notation = LineNotation;

    let forwarder = ProgressForwarder::new(ui_sender);
    let reporter = ProgressReporter::with_callback(forwarder.callback());

    println!(
        "Starting Monte Carlo refinement with checkpoint {} ({} steps per molecule)...",
        checkpoint.tag(),
        refine_config.mc_steps
    );
    info!("Invoking the core refinement workflow...");

    let summary = tokio::task::block_in_place(|| {
        workflows::refine::run(
            dataset,
            &info,
            &refine_config,
            Collaborators {
                oracle: &mut oracle,
                notation: &notation,
                energy: None,
            },
            &reporter,
        )
    })?;

    report_summary(&summary, &run_config);
    Ok(())
}

fn report_summary(summary: &RefineSummary, config: &RunConfig) {
    let rejections = &summary.rejections;
    println!(
        "Examined {} molecule(s): {} refined, {} rejected (ring {}, multiple bond {}, branching {}, charge {}, unparseable {}).",
        summary.examined,
        summary.accepted,
        rejections.total(),
        rejections.ring,
        rejections.multiple_bond,
        rejections.branching,
        rejections.charge,
        rejections.unparseable,
    );

    if summary.trajectories.is_empty() {
        warn!("No molecule passed the filter; nothing was written.");
        println!("Warning: no trajectories were written.");
        return;
    }

    let mismatches = summary.total_mismatches();
    if mismatches > 0 {
        warn!(mismatches, "Some steps changed atom identities; see the log for details.");
        println!(
            "Warning: {} atom identity mismatch(es) across {} trajectory(ies).",
            mismatches,
            summary
                .trajectories
                .iter()
                .filter(|t| t.mismatches > 0)
                .count()
        );
    }

    println!(
        "✓ {} trajectory(ies) written under: {}",
        summary.trajectories.len(),
        config.output_root.display()
    );
}
