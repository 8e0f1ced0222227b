use confmc::engine::config::{DEFAULT_DATASET_SEED, DEFAULT_MODEL_SEED};

pub struct DefaultsConfig {
    pub model_dir: String,
    pub dataset_path: String,
    pub output_root: String,
    pub model_seed: u64,
    pub dataset_seed: u64,
    pub check_charge_drift: bool,
    pub validate_full_chain: bool,
}

impl Default for DefaultsConfig {
    fn default() -> Self {
        Self {
            model_dir: "outputs/edm_qm9".to_string(),
            dataset_path: "data/qm9/valid.jsonl".to_string(),
            output_root: "outputs/qm9_mc/flexible_mols/diffusion".to_string(),
            model_seed: DEFAULT_MODEL_SEED,
            dataset_seed: DEFAULT_DATASET_SEED,
            check_charge_drift: false,
            validate_full_chain: false,
        }
    }
}
