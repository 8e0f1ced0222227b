use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

const HELP_TEMPLATE: &str = "\
{before-help}{name} {version}
{author-with-newline}{about-with-newline}
{usage-heading} {usage}

{all-args}{after-help}
";

#[derive(Parser, Debug)]
#[command(
    version,
    about = "confmc - Monte Carlo conformer refinement driven by a pretrained diffusion model.",
    help_template = HELP_TEMPLATE,
)]
#[command(propagate_version = true)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,

    /// Increase verbosity level (-v for INFO, -vv for DEBUG, -vvv for TRACE)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Suppress all log output except for errors
    #[arg(short, long, global = true, conflicts_with = "verbose")]
    pub quiet: bool,

    /// Write logs to a specified file in addition to the console output
    #[arg(long, global = true, value_name = "PATH")]
    pub log_file: Option<PathBuf>,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Run Monte Carlo refinement trajectories for molecules of a validation split.
    ///
    /// Energy deltas against the ground state are not computed here: they
    /// need an energy evaluator and are only available through the library
    /// API (`confmc::workflows::refine::run` with an `EnergyEvaluator`).
    Run(RunArgs),
}

/// Arguments for the `run` subcommand.
#[derive(Args, Debug)]
pub struct RunArgs {
    /// Training epoch of the checkpoint to load (selects args_<EPOCH>.toml).
    #[arg(short, long, default_value_t = 5150, value_name = "EPOCH")]
    pub epoch: u32,

    /// Path to a run configuration file in TOML format.
    #[arg(short, long, value_name = "PATH")]
    pub config: Option<PathBuf>,

    // --- Path Overrides ---
    /// Override the directory holding the model checkpoint.
    #[arg(short, long, value_name = "DIR")]
    pub model_dir: Option<PathBuf>,

    /// Override the validation split (JSON Lines).
    #[arg(short, long, value_name = "PATH")]
    pub dataset: Option<PathBuf>,

    /// Override the root directory trajectories are written under.
    #[arg(short, long, value_name = "DIR")]
    pub output: Option<PathBuf>,

    /// Override the sampler command. Arguments are split on whitespace.
    #[arg(long, value_name = "COMMAND")]
    pub sampler: Option<String>,

    // --- Validation Overrides ---
    /// Also compare the rounded charge channel against atomic numbers.
    #[arg(long)]
    pub check_charge_drift: bool,

    /// Validate every snapshot of each returned chain, not just the most refined.
    #[arg(long)]
    pub validate_full_chain: bool,

    /// Set a specific configuration value, overriding the config file.
    /// Can be used multiple times. Example: -S seeds.model=7
    #[arg(short = 'S', long = "set", value_name = "KEY=VALUE", num_args(0..))]
    pub set_values: Vec<String>,
}
