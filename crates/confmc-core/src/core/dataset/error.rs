use thiserror::Error;

#[derive(Debug, Error)]
pub enum DatasetError {
    #[error("File I/O error for '{path}': {source}")]
    Io {
        path: String,
        source: std::io::Error,
    },

    #[error("JSON parsing error for '{path}' on line {line}: {source}")]
    Json {
        path: String,
        line: usize,
        source: serde_json::Error,
    },

    #[error("No built-in dataset table for '{name}' (remove_h = {remove_h})")]
    UnknownDataset { name: String, remove_h: bool },

    #[error("Unknown element symbol in atom decoder: '{0}'")]
    UnknownElement(String),

    #[error("Malformed sample: {0}")]
    MalformedSample(String),
}
