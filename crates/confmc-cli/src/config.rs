pub mod defaults;

use crate::cli::RunArgs;
use crate::error::{CliError, Result};
use confmc::engine::config as core_config;
use defaults::DefaultsConfig;
use serde::Deserialize;
use std::path::{Path, PathBuf};
use std::str::FromStr;
use tracing::debug;

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialModelConfig {
    dir: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialDatasetConfig {
    path: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOutputConfig {
    root: Option<PathBuf>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialOracleConfig {
    command: Option<Vec<String>>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
struct PartialSeedsConfig {
    model: Option<u64>,
    dataset: Option<u64>,
}

/// Energy deltas have no key here; they need an evaluator and are only
/// reachable through the library API.
#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields, rename_all = "kebab-case")]
struct PartialValidationConfig {
    check_charge_drift: Option<bool>,
    validate_full_chain: Option<bool>,
}

#[derive(Deserialize, Debug, Default)]
#[serde(deny_unknown_fields)]
pub struct PartialRunConfig {
    model: Option<PartialModelConfig>,
    dataset: Option<PartialDatasetConfig>,
    output: Option<PartialOutputConfig>,
    oracle: Option<PartialOracleConfig>,
    seeds: Option<PartialSeedsConfig>,
    validation: Option<PartialValidationConfig>,
}

/// Fully resolved settings of one `run` invocation.
#[derive(Debug, Clone, PartialEq)]
pub struct RunConfig {
    pub epoch: u32,
    pub model_dir: PathBuf,
    pub dataset_path: PathBuf,
    pub output_root: PathBuf,
    pub oracle_command: Vec<String>,
    pub model_seed: u64,
    pub dataset_seed: u64,
    pub check_charge_drift: bool,
    pub validate_full_chain: bool,
}

impl RunConfig {
    /// Core refinement settings for a checkpoint identified by `model_tag`.
    pub fn refine_config(&self, model_tag: &str) -> Result<core_config::RefineConfig> {
        core_config::RefineConfigBuilder::new()
            .output_root(self.output_root.clone())
            .model_tag(model_tag)
            .model_seed(self.model_seed)
            .check_charge_drift(self.check_charge_drift)
            .validate_full_chain(self.validate_full_chain)
            .build()
            .map_err(|e| CliError::Config(e.to_string()))
    }
}

impl PartialRunConfig {
    pub fn from_file(path: &Path) -> Result<Self> {
        debug!("Loading configuration from file: {:?}", path);
        let content = std::fs::read_to_string(path)?;
        toml::from_str(&content).map_err(|e| CliError::FileParsing {
            path: path.to_path_buf(),
            source: e.into(),
        })
    }

    /// Precedence, highest first: dedicated CLI flags, `--set` values, the
    /// config file, built-in defaults.
    pub fn merge_with_cli(mut self, args: &RunArgs, defaults: &DefaultsConfig) -> Result<RunConfig> {
        self.apply_set_values(&args.set_values)?;

        let model = self.model.take().unwrap_or_default();
        let dataset = self.dataset.take().unwrap_or_default();
        let output = self.output.take().unwrap_or_default();
        let oracle = self.oracle.take().unwrap_or_default();
        let seeds = self.seeds.take().unwrap_or_default();
        let validation = self.validation.take().unwrap_or_default();

        let oracle_command = match &args.sampler {
            Some(command) => split_command(command),
            None => oracle.command.unwrap_or_default(),
        };
        if oracle_command.is_empty() {
            return Err(CliError::Config(
                "A sampler command is required, either as `oracle.command` in the config file or via --sampler."
                    .to_string(),
            ));
        }

        Ok(RunConfig {
            epoch: args.epoch,
            model_dir: args
                .model_dir
                .clone()
                .or(model.dir)
                .unwrap_or_else(|| PathBuf::from(&defaults.model_dir)),
            dataset_path: args
                .dataset
                .clone()
                .or(dataset.path)
                .unwrap_or_else(|| PathBuf::from(&defaults.dataset_path)),
            output_root: args
                .output
                .clone()
                .or(output.root)
                .unwrap_or_else(|| PathBuf::from(&defaults.output_root)),
            oracle_command,
            model_seed: seeds.model.unwrap_or(defaults.model_seed),
            dataset_seed: seeds.dataset.unwrap_or(defaults.dataset_seed),
            check_charge_drift: args.check_charge_drift
                || validation
                    .check_charge_drift
                    .unwrap_or(defaults.check_charge_drift),
            validate_full_chain: args.validate_full_chain
                || validation
                    .validate_full_chain
                    .unwrap_or(defaults.validate_full_chain),
        })
    }

    fn apply_set_values(&mut self, set_values: &[String]) -> Result<()> {
        for kv_pair in set_values {
            let Some((key, value_str)) = kv_pair.split_once('=') else {
                return Err(CliError::Config(format!(
                    "Invalid --set format: '{}'. Expected KEY=VALUE.",
                    kv_pair
                )));
            };

            match key {
                "model.dir" => {
                    self.model.get_or_insert_with(Default::default).dir =
                        Some(PathBuf::from(value_str));
                }
                "dataset.path" => {
                    self.dataset.get_or_insert_with(Default::default).path =
                        Some(PathBuf::from(value_str));
                }
                "output.root" => {
                    self.output.get_or_insert_with(Default::default).root =
                        Some(PathBuf::from(value_str));
                }
                "oracle.command" => {
                    self.oracle.get_or_insert_with(Default::default).command =
                        Some(split_command(value_str));
                }
                "seeds.model" => {
                    self.seeds.get_or_insert_with(Default::default).model =
                        Some(parse_value(key, value_str)?);
                }
                "seeds.dataset" => {
                    self.seeds.get_or_insert_with(Default::default).dataset =
                        Some(parse_value(key, value_str)?);
                }
                "validation.check-charge-drift" => {
                    self.validation
                        .get_or_insert_with(Default::default)
                        .check_charge_drift = Some(parse_value(key, value_str)?);
                }
                "validation.validate-full-chain" => {
                    self.validation
                        .get_or_insert_with(Default::default)
                        .validate_full_chain = Some(parse_value(key, value_str)?);
                }
                _ => {
                    return Err(CliError::Config(format!(
                        "Unsupported configuration key for --set: '{}'",
                        key
                    )));
                }
            }
        }
        Ok(())
    }
}

fn parse_value<T: FromStr>(key: &str, value: &str) -> Result<T> {
    value
        .trim()
        .parse()
        .map_err(|_| CliError::Config(format!("Invalid value for {}: {}", key, value)))
}

fn split_command(command: &str) -> Vec<String> {
    command.split_whitespace().map(str::to_string).collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::cli::{Cli, Commands};
    use clap::Parser;
    use std::fs;
    use tempfile::tempdir;

    fn run_args(extra: &[&str]) -> RunArgs {
        let mut argv = vec!["confmc", "run"];
        argv.extend_from_slice(extra);
        match Cli::parse_from(argv).command {
            Commands::Run(args) => args,
        }
    }

    fn parse(content: &str) -> PartialRunConfig {
        toml::from_str(content).unwrap()
    }

    #[test]
    fn defaults_fill_everything_but_the_sampler() {
        let config = parse("")
            .merge_with_cli(&run_args(&["--sampler", "python sample.py"]), &DefaultsConfig::default())
            .unwrap();

        assert_eq!(config.epoch, 5150);
        assert_eq!(config.model_dir, PathBuf::from("outputs/edm_qm9"));
        assert_eq!(config.oracle_command, vec!["python", "sample.py"]);
        assert_eq!(config.model_seed, 4);
        assert_eq!(config.dataset_seed, 1);
        assert!(!config.check_charge_drift);
        assert!(!config.validate_full_chain);
    }

    #[test]
    fn missing_sampler_is_a_config_error() {
        let err = parse("")
            .merge_with_cli(&run_args(&[]), &DefaultsConfig::default())
            .unwrap_err();
        assert!(matches!(err, CliError::Config(msg) if msg.contains("sampler")));
    }

    #[test]
    fn file_values_are_used_and_cli_flags_win() {
        let partial = parse(
            r#"
            [model]
            dir = "ckpt/edm"

            [output]
            root = "from-file"

            [oracle]
            command = ["python", "-u", "sampler.py"]

            [seeds]
            model = 11

            [validation]
            check-charge-drift = true
            "#,
        );
        let config = partial
            .merge_with_cli(
                &run_args(&["--epoch", "10", "-o", "from-cli", "--validate-full-chain"]),
                &DefaultsConfig::default(),
            )
            .unwrap();

        assert_eq!(config.epoch, 10);
        assert_eq!(config.model_dir, PathBuf::from("ckpt/edm"));
        assert_eq!(config.output_root, PathBuf::from("from-cli"));
        assert_eq!(config.oracle_command, vec!["python", "-u", "sampler.py"]);
        assert_eq!(config.model_seed, 11);
        assert!(config.check_charge_drift);
        assert!(config.validate_full_chain);
    }

    #[test]
    fn set_values_override_file() {
        let partial = parse("[seeds]\nmodel = 11\n[oracle]\ncommand = [\"a\"]\n");
        let config = partial
            .merge_with_cli(
                &run_args(&["-S", "seeds.model=7", "-S", "dataset.path=valid.jsonl"]),
                &DefaultsConfig::default(),
            )
            .unwrap();
        assert_eq!(config.model_seed, 7);
        assert_eq!(config.dataset_path, PathBuf::from("valid.jsonl"));
    }

    #[test]
    fn set_values_reject_bad_input() {
        for bad in ["seeds.model", "seeds.model=abc", "optimizer.steps=3"] {
            let err = parse("[oracle]\ncommand = [\"a\"]\n")
                .merge_with_cli(&run_args(&["-S", bad]), &DefaultsConfig::default())
                .unwrap_err();
            assert!(matches!(err, CliError::Config(_)), "{}", bad);
        }
    }

    #[test]
    fn unknown_file_keys_are_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[output]\ndirectory = \"x\"\n").unwrap();
        let err = PartialRunConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn energy_deltas_key_is_rejected() {
        let dir = tempdir().unwrap();
        let path = dir.path().join("run.toml");
        fs::write(&path, "[validation]\nenergy-deltas = true\n").unwrap();
        let err = PartialRunConfig::from_file(&path).unwrap_err();
        assert!(matches!(err, CliError::FileParsing { .. }));
    }

    #[test]
    fn refine_config_carries_tag_and_flags() {
        let config = parse("")
            .merge_with_cli(
                &run_args(&["--sampler", "s", "--check-charge-drift"]),
                &DefaultsConfig::default(),
            )
            .unwrap();
        let refine = config.refine_config("edm_qm9-e5150").unwrap();
        assert_eq!(refine.output.model_tag, "edm_qm9-e5150");
        assert!(refine.validation.check_charge_drift);
        assert!(!refine.validation.energy_deltas);
        assert_eq!(refine.mc_steps, core_config::DEFAULT_MC_STEPS);
    }
}
