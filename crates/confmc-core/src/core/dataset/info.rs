use super::error::DatasetError;
use crate::core::elements;

const QM9_DECODER: &[&str] = &["H", "C", "N", "O", "F"];
const QM9_NO_H_DECODER: &[&str] = &["C", "N", "O", "F"];
const GEOM_DECODER: &[&str] = &[
    "H", "B", "C", "N", "O", "F", "Al", "Si", "P", "S", "Cl", "As", "Br", "I", "Hg", "Bi",
];

/// Static description of a molecular dataset as seen by the diffusion model.
///
/// The `atom_decoder` maps a one-hot column index to an element symbol, and
/// `max_n_nodes` is the padded capacity `M` every encoded molecule must fit in.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct DatasetInfo {
    pub name: String,
    pub atom_decoder: Vec<String>,
    pub max_n_nodes: usize,
    atomic_numbers: Vec<u8>,
}

impl DatasetInfo {
    /// Looks up the built-in table for a dataset name as stored in a training
    /// checkpoint (`qm9`, `qm9_first_half`, `qm9_second_half` or `geom`).
    pub fn get(dataset: &str, remove_h: bool) -> Result<Self, DatasetError> {
        let (decoder, max_n_nodes): (&[&str], usize) = match (dataset, remove_h) {
            ("qm9" | "qm9_first_half" | "qm9_second_half", false) => (QM9_DECODER, 29),
            ("qm9" | "qm9_first_half" | "qm9_second_half", true) => (QM9_NO_H_DECODER, 9),
            ("geom", false) => (GEOM_DECODER, 181),
            _ => {
                return Err(DatasetError::UnknownDataset {
                    name: dataset.to_string(),
                    remove_h,
                });
            }
        };
        Self::new(dataset, decoder.iter().map(|s| s.to_string()).collect(), max_n_nodes)
    }

    pub fn new(
        name: &str,
        atom_decoder: Vec<String>,
        max_n_nodes: usize,
    ) -> Result<Self, DatasetError> {
        let atomic_numbers = atom_decoder
            .iter()
            .map(|symbol| {
                elements::atomic_number(symbol)
                    .ok_or_else(|| DatasetError::UnknownElement(symbol.clone()))
            })
            .collect::<Result<Vec<_>, _>>()?;

        Ok(Self {
            name: name.to_string(),
            atom_decoder,
            max_n_nodes,
            atomic_numbers,
        })
    }

    pub fn num_types(&self) -> usize {
        self.atom_decoder.len()
    }

    pub fn atomic_number_of(&self, type_index: usize) -> Option<u8> {
        self.atomic_numbers.get(type_index).copied()
    }

    pub fn type_index_of(&self, atomic_number: u8) -> Option<usize> {
        self.atomic_numbers.iter().position(|&z| z == atomic_number)
    }
}
