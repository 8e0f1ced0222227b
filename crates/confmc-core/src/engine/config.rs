use std::fmt;
use std::path::PathBuf;
use thiserror::Error;

pub const DEFAULT_MC_STEPS: usize = 5000;
pub const DEFAULT_MAX_SAMPLES: usize = 1501;
pub const DEFAULT_START_STEP: u32 = 65;
pub const DEFAULT_END_STEP: u32 = 64;
pub const DEFAULT_MAX_BRANCHES: usize = 15;
pub const DEFAULT_MODEL_SEED: u64 = 4;
pub const DEFAULT_DATASET_SEED: u64 = 1;

#[derive(Debug, Error, PartialEq, Eq, Clone)]
pub enum ConfigError {
    #[error("Missing required parameter: {0}")]
    MissingParameter(&'static str),
    #[error("Invalid value for '{name}': {reason}")]
    InvalidParameter { name: &'static str, reason: String },
}

/// A window of the diffusion noise schedule, from `start` (more noised) down
/// to `end` (less noised).
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub struct StepRange {
    start: u32,
    end: u32,
}

impl StepRange {
    pub fn new(start: u32, end: u32) -> Result<Self, ConfigError> {
        if start <= end {
            return Err(ConfigError::InvalidParameter {
                name: "step_range",
                reason: format!("start ({}) must be greater than end ({})", start, end),
            });
        }
        Ok(Self { start, end })
    }

    pub fn start(&self) -> u32 {
        self.start
    }

    pub fn end(&self) -> u32 {
        self.end
    }

    /// Number of snapshots a chain over this window contains.
    pub fn len(&self) -> usize {
        (self.start - self.end) as usize
    }

    pub fn is_empty(&self) -> bool {
        false
    }

    /// Directory label, e.g. `T65-64`.
    pub fn label(&self) -> String {
        format!("T{}-{}", self.start, self.end)
    }
}

impl Default for StepRange {
    fn default() -> Self {
        Self {
            start: DEFAULT_START_STEP,
            end: DEFAULT_END_STEP,
        }
    }
}

impl fmt::Display for StepRange {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}->{}", self.start, self.end)
    }
}

#[derive(Debug, Clone, PartialEq)]
pub struct FilterConfig {
    /// A notation with at least this many branch openings is rejected.
    pub max_branches: usize,
}

impl Default for FilterConfig {
    fn default() -> Self {
        Self {
            max_branches: DEFAULT_MAX_BRANCHES,
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq)]
pub struct ValidationConfig {
    /// Validate every chain element instead of only the most refined one.
    pub validate_full_chain: bool,
    /// Compare the rounded charge channel against atomic numbers.
    pub check_charge_drift: bool,
    /// Compute `E(step) - E(gs)` after each trajectory. Needs an evaluator.
    pub energy_deltas: bool,
}

#[derive(Debug, Clone, PartialEq)]
pub struct OutputConfig {
    pub root: PathBuf,
    pub model_tag: String,
}

#[derive(Debug, Clone, PartialEq)]
pub struct RefineConfig {
    pub output: OutputConfig,
    pub range: StepRange,
    pub mc_steps: usize,
    pub max_samples: usize,
    pub model_seed: u64,
    pub filter: FilterConfig,
    pub validation: ValidationConfig,
}

#[derive(Default)]
pub struct RefineConfigBuilder {
    output_root: Option<PathBuf>,
    model_tag: Option<String>,
    range: Option<StepRange>,
    mc_steps: Option<usize>,
    max_samples: Option<usize>,
    model_seed: Option<u64>,
    max_branches: Option<usize>,
    validation: ValidationConfig,
}

impl RefineConfigBuilder {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn output_root(mut self, path: PathBuf) -> Self {
        self.output_root = Some(path);
        self
    }
    pub fn model_tag(mut self, tag: impl Into<String>) -> Self {
        self.model_tag = Some(tag.into());
        self
    }
    pub fn range(mut self, range: StepRange) -> Self {
        self.range = Some(range);
        self
    }
    pub fn mc_steps(mut self, steps: usize) -> Self {
        self.mc_steps = Some(steps);
        self
    }
    pub fn max_samples(mut self, n: usize) -> Self {
        self.max_samples = Some(n);
        self
    }
    pub fn model_seed(mut self, seed: u64) -> Self {
        self.model_seed = Some(seed);
        self
    }
    pub fn max_branches(mut self, n: usize) -> Self {
        self.max_branches = Some(n);
        self
    }
    pub fn validate_full_chain(mut self, enabled: bool) -> Self {
        self.validation.validate_full_chain = enabled;
        self
    }
    pub fn check_charge_drift(mut self, enabled: bool) -> Self {
        self.validation.check_charge_drift = enabled;
        self
    }
    pub fn energy_deltas(mut self, enabled: bool) -> Self {
        self.validation.energy_deltas = enabled;
        self
    }

    pub fn build(self) -> Result<RefineConfig, ConfigError> {
        let output = OutputConfig {
            root: self
                .output_root
                .ok_or(ConfigError::MissingParameter("output_root"))?,
            model_tag: self
                .model_tag
                .ok_or(ConfigError::MissingParameter("model_tag"))?,
        };
        if output.model_tag.trim().is_empty() {
            return Err(ConfigError::InvalidParameter {
                name: "model_tag",
                reason: "must not be empty".to_string(),
            });
        }

        let mc_steps = self.mc_steps.unwrap_or(DEFAULT_MC_STEPS);
        if mc_steps == 0 {
            return Err(ConfigError::InvalidParameter {
                name: "mc_steps",
                reason: "at least one step is required".to_string(),
            });
        }

        Ok(RefineConfig {
            output,
            range: self.range.unwrap_or_default(),
            mc_steps,
            max_samples: self.max_samples.unwrap_or(DEFAULT_MAX_SAMPLES),
            model_seed: self.model_seed.unwrap_or(DEFAULT_MODEL_SEED),
            filter: FilterConfig {
                max_branches: self.max_branches.unwrap_or(DEFAULT_MAX_BRANCHES),
            },
            validation: self.validation,
        })
    }
}
