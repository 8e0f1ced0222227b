use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, info};

fn default_dataset() -> String {
    "qm9".to_string()
}

fn default_normalization_factor() -> f64 {
    1.0
}

fn default_aggregation_method() -> String {
    "sum".to_string()
}

/// Training-time arguments stored next to a model checkpoint.
///
/// Only the fields this crate reads are named. Every optional field carries
/// its default here, so older checkpoints that predate a field deserialize
/// without special handling. All remaining keys are kept verbatim in `extra`
/// and forwarded to the sampler untouched.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct TrainingArgs {
    #[serde(default = "default_dataset")]
    pub dataset: String,
    #[serde(default)]
    pub remove_h: bool,
    #[serde(default)]
    pub no_cuda: bool,
    /// Exponential-moving-average decay; a positive value means EMA weights
    /// were saved and should be used.
    #[serde(default)]
    pub ema_decay: f64,
    #[serde(default = "default_normalization_factor")]
    pub normalization_factor: f64,
    #[serde(default = "default_aggregation_method")]
    pub aggregation_method: String,
    #[serde(flatten)]
    pub extra: toml::Table,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "kebab-case")]
pub enum WeightsVariant {
    Plain,
    Ema,
}

/// A resolved checkpoint: training arguments plus the weight artifact to load.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Checkpoint {
    pub name: String,
    pub epoch: u32,
    pub args: TrainingArgs,
    pub args_path: PathBuf,
    pub weights_variant: WeightsVariant,
    pub weights_path: PathBuf,
}

#[derive(Debug, Error)]
pub enum CheckpointError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },
    #[error("TOML parsing error for '{path}': {source}")]
    Toml {
        path: String,
        source: toml::de::Error,
    },
    #[error("Weight artifact not found: '{0}'")]
    MissingWeights(String),
}

impl Checkpoint {
    pub fn args_file_name(epoch: u32) -> String {
        format!("args_{}.toml", epoch)
    }

    pub fn weights_file_name(epoch: u32, variant: WeightsVariant) -> String {
        match variant {
            WeightsVariant::Plain => format!("generative_model_{}.npy", epoch),
            WeightsVariant::Ema => format!("generative_model_ema_{}.npy", epoch),
        }
    }

    /// Loads `args_{epoch}.toml` from `model_dir` and resolves the weight
    /// artifact the arguments call for.
    pub fn load(model_dir: &Path, epoch: u32) -> Result<Self, CheckpointError> {
        let args_path = model_dir.join(Self::args_file_name(epoch));
        debug!("Loading training arguments from {:?}", args_path);
        let content = std::fs::read_to_string(&args_path).map_err(|e| CheckpointError::Io {
            path: args_path.to_string_lossy().to_string(),
            source: e,
        })?;
        let args: TrainingArgs = toml::from_str(&content).map_err(|e| CheckpointError::Toml {
            path: args_path.to_string_lossy().to_string(),
            source: e,
        })?;

        let weights_variant = args.weights_variant();
        let weights_path = model_dir.join(Self::weights_file_name(epoch, weights_variant));
        if !weights_path.is_file() {
            return Err(CheckpointError::MissingWeights(
                weights_path.to_string_lossy().to_string(),
            ));
        }

        let name = model_dir
            .file_name()
            .map(|n| n.to_string_lossy().to_string())
            .unwrap_or_else(|| "model".to_string());

        info!(
            checkpoint = %name,
            epoch,
            weights = ?weights_variant,
            dataset = %args.dataset,
            "Checkpoint resolved."
        );

        Ok(Self {
            name,
            epoch,
            args,
            args_path,
            weights_variant,
            weights_path,
        })
    }

    /// Directory component identifying this checkpoint in output paths.
    pub fn tag(&self) -> String {
        format!("{}-e{}", self.name, self.epoch)
    }
}

impl TrainingArgs {
    pub fn weights_variant(&self) -> WeightsVariant {
        if self.ema_decay > 0.0 {
            WeightsVariant::Ema
        } else {
            WeightsVariant::Plain
        }
    }
}
