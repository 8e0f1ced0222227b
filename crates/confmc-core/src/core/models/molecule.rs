use crate::core::dataset::info::DatasetInfo;
use crate::core::dataset::source::DatasetSample;
use nalgebra::{Point3, Vector3};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum MoleculeError {
    #[error("Molecule has no atoms")]
    Empty,

    #[error("Inconsistent per-atom data: {field} has {found} entries, expected {expected}")]
    LengthMismatch {
        field: &'static str,
        expected: usize,
        found: usize,
    },

    #[error("One-hot row for atom {atom} has width {found}, expected {expected}")]
    OneHotWidth {
        atom: usize,
        expected: usize,
        found: usize,
    },

    #[error("Atom {atom} has type index {type_index}, which the dataset decoder cannot map")]
    UnknownType { atom: usize, type_index: usize },
}

/// A molecule drawn from the dataset.
///
/// Identity (atom count, atomic numbers, dataset type indices, formal charges)
/// is fixed at construction. Only the positions may change, and only through
/// [`Molecule::recenter`]; trajectory geometry evolves outside this type.
#[derive(Debug, Clone, PartialEq)]
pub struct Molecule {
    atomic_numbers: Vec<u8>,
    type_indices: Vec<usize>,
    charges: Vec<i32>,
    positions: Vec<Point3<f64>>,
}

impl Molecule {
    pub fn new(
        atomic_numbers: Vec<u8>,
        type_indices: Vec<usize>,
        charges: Vec<i32>,
        positions: Vec<Point3<f64>>,
    ) -> Result<Self, MoleculeError> {
        let n = atomic_numbers.len();
        if n == 0 {
            return Err(MoleculeError::Empty);
        }
        for (field, found) in [
            ("type_indices", type_indices.len()),
            ("charges", charges.len()),
            ("positions", positions.len()),
        ] {
            if found != n {
                return Err(MoleculeError::LengthMismatch {
                    field,
                    expected: n,
                    found,
                });
            }
        }
        Ok(Self {
            atomic_numbers,
            type_indices,
            charges,
            positions,
        })
    }

    /// Builds a molecule from a raw dataset sample. Atom types are the arg-max
    /// of each one-hot row; formal charges are rounded to integers.
    pub fn from_sample(sample: &DatasetSample, info: &DatasetInfo) -> Result<Self, MoleculeError> {
        let n = sample.num_atoms();
        if sample.one_hot.len() != n {
            return Err(MoleculeError::LengthMismatch {
                field: "one_hot",
                expected: n,
                found: sample.one_hot.len(),
            });
        }

        let mut type_indices = Vec::with_capacity(n);
        let mut atomic_numbers = Vec::with_capacity(n);
        for (atom, row) in sample.one_hot.iter().enumerate() {
            if row.len() != info.num_types() {
                return Err(MoleculeError::OneHotWidth {
                    atom,
                    expected: info.num_types(),
                    found: row.len(),
                });
            }
            let type_index = argmax(row);
            let z = info
                .atomic_number_of(type_index)
                .ok_or(MoleculeError::UnknownType { atom, type_index })?;
            type_indices.push(type_index);
            atomic_numbers.push(z);
        }

        let charges = sample.charges.iter().map(|c| c.round() as i32).collect();
        let positions = sample
            .positions
            .iter()
            .map(|[x, y, z]| Point3::new(*x, *y, *z))
            .collect();

        Self::new(atomic_numbers, type_indices, charges, positions)
    }

    pub fn len(&self) -> usize {
        self.atomic_numbers.len()
    }

    pub fn is_empty(&self) -> bool {
        self.atomic_numbers.is_empty()
    }

    pub fn atomic_numbers(&self) -> &[u8] {
        &self.atomic_numbers
    }

    pub fn type_indices(&self) -> &[usize] {
        &self.type_indices
    }

    pub fn charges(&self) -> &[i32] {
        &self.charges
    }

    pub fn positions(&self) -> &[Point3<f64>] {
        &self.positions
    }

    pub fn centroid(&self) -> Point3<f64> {
        let sum = self
            .positions
            .iter()
            .fold(Vector3::zeros(), |acc, p| acc + p.coords);
        Point3::from(sum / self.positions.len() as f64)
    }

    /// Translates the molecule so its centroid sits at the origin.
    pub fn recenter(&mut self) {
        let shift = self.centroid().coords;
        for p in &mut self.positions {
            *p = Point3::from(p.coords - shift);
        }
    }

    /// Total absolute difference between declared formal charges and atomic
    /// numbers. Zero for every molecule the dataset stores as neutral.
    pub fn charge_deviation(&self) -> i64 {
        self.charges
            .iter()
            .zip(&self.atomic_numbers)
            .map(|(&q, &z)| (q as i64 - z as i64).abs())
            .sum()
    }

    /// Per-atom `charge - Z` attribute written next to the ground state.
    pub fn charge_offsets(&self) -> Vec<i32> {
        self.charges
            .iter()
            .zip(&self.atomic_numbers)
            .map(|(&q, &z)| q - z as i32)
            .collect()
    }
}

pub(crate) fn argmax(values: &[f64]) -> usize {
    values
        .iter()
        .enumerate()
        .fold((0, f64::NEG_INFINITY), |(best_idx, best), (idx, &v)| {
            if v > best { (idx, v) } else { (best_idx, best) }
        })
        .0
}
