use thiserror::Error;

use super::config::ConfigError;
use super::encoder::EncodingError;
use super::energy::EnergyError;
use super::oracle::OracleError;
use crate::core::dataset::error::DatasetError;
use crate::core::io::xyz::XyzError;
use crate::core::models::molecule::MoleculeError;

#[derive(Debug, Error)]
pub enum EngineError {
    #[error("Invalid configuration: {0}")]
    Config(#[from] ConfigError),

    #[error("Dataset error: {0}")]
    Dataset(#[from] DatasetError),

    #[error("Sample {sample} cannot be turned into a molecule: {source}")]
    Molecule {
        sample: usize,
        #[source]
        source: MoleculeError,
    },

    #[error("Failed to encode sample {sample}: {source}")]
    Encoding {
        sample: usize,
        #[source]
        source: EncodingError,
    },

    #[error("Diffusion oracle failed on sample {sample}, step {step}: {source}")]
    Oracle {
        sample: usize,
        step: usize,
        #[source]
        source: OracleError,
    },

    #[error("Oracle returned an unusable chain for sample {sample}, step {step}: {reason}")]
    InvalidChain {
        sample: usize,
        step: usize,
        reason: String,
    },

    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to write frame '{path}': {source}")]
    Xyz {
        path: String,
        #[source]
        source: XyzError,
    },

    #[error("Energy evaluation failed for sample {sample}: {source}")]
    Energy {
        sample: usize,
        #[source]
        source: EnergyError,
    },
}
