use super::error::DatasetError;
use rand::{SeedableRng, rngs::StdRng, seq::SliceRandom};
use serde::{Deserialize, Deserializer};
use std::fs::File;
use std::io::{BufRead, BufReader};
use std::path::Path;
use tracing::debug;

/// One labelled molecule from a validation split, exactly as stored on disk.
///
/// `one_hot` accepts either numbers or booleans per cell so that exports of
/// boolean one-hot tensors load without conversion.
#[derive(Debug, Clone, Deserialize, PartialEq)]
pub struct DatasetSample {
    pub positions: Vec<[f64; 3]>,
    #[serde(deserialize_with = "deserialize_one_hot")]
    pub one_hot: Vec<Vec<f64>>,
    pub charges: Vec<f64>,
}

impl DatasetSample {
    pub fn num_atoms(&self) -> usize {
        self.positions.len()
    }
}

#[derive(Deserialize)]
#[serde(untagged)]
enum OneHotCell {
    Flag(bool),
    Value(f64),
}

fn deserialize_one_hot<'de, D>(deserializer: D) -> Result<Vec<Vec<f64>>, D::Error>
where
    D: Deserializer<'de>,
{
    let rows: Vec<Vec<OneHotCell>> = Vec::deserialize(deserializer)?;
    Ok(rows
        .into_iter()
        .map(|row| {
            row.into_iter()
                .map(|cell| match cell {
                    OneHotCell::Flag(true) => 1.0,
                    OneHotCell::Flag(false) => 0.0,
                    OneHotCell::Value(v) => v,
                })
                .collect()
        })
        .collect())
}

/// A validation split stored as JSON Lines, one [`DatasetSample`] per line.
///
/// Lines are parsed lazily while iterating; the iteration order is either file
/// order or a permutation fixed by a seed.
#[derive(Debug, Clone)]
pub struct JsonlDataset {
    label: String,
    records: Vec<(usize, String)>,
}

impl JsonlDataset {
    pub fn load(path: &Path) -> Result<Self, DatasetError> {
        let label = path.to_string_lossy().to_string();
        let file = File::open(path).map_err(|e| DatasetError::Io {
            path: label.clone(),
            source: e,
        })?;
        Self::from_reader(BufReader::new(file), &label)
    }

    pub fn from_reader(reader: impl BufRead, label: &str) -> Result<Self, DatasetError> {
        let mut records = Vec::new();
        for (idx, line) in reader.lines().enumerate() {
            let line = line.map_err(|e| DatasetError::Io {
                path: label.to_string(),
                source: e,
            })?;
            if line.trim().is_empty() {
                continue;
            }
            records.push((idx + 1, line));
        }
        debug!(records = records.len(), source = label, "Dataset records indexed.");
        Ok(Self {
            label: label.to_string(),
            records,
        })
    }

    pub fn shuffled(mut self, seed: u64) -> Self {
        let mut rng = StdRng::seed_from_u64(seed);
        self.records.shuffle(&mut rng);
        self
    }

    pub fn len(&self) -> usize {
        self.records.len()
    }

    pub fn is_empty(&self) -> bool {
        self.records.is_empty()
    }
}

impl IntoIterator for JsonlDataset {
    type Item = Result<DatasetSample, DatasetError>;
    type IntoIter = JsonlSamples;

    fn into_iter(self) -> Self::IntoIter {
        JsonlSamples {
            label: self.label,
            records: self.records.into_iter(),
        }
    }
}

pub struct JsonlSamples {
    label: String,
    records: std::vec::IntoIter<(usize, String)>,
}

impl Iterator for JsonlSamples {
    type Item = Result<DatasetSample, DatasetError>;

    fn next(&mut self) -> Option<Self::Item> {
        let (line, text) = self.records.next()?;
        Some(
            serde_json::from_str(&text).map_err(|source| DatasetError::Json {
                path: self.label.clone(),
                line,
                source,
            }),
        )
    }

    fn size_hint(&self) -> (usize, Option<usize>) {
        self.records.size_hint()
    }
}
