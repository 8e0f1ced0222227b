use crate::core::dataset::info::DatasetInfo;
use crate::core::models::molecule::{Molecule, argmax};
use nalgebra::{DMatrix, Point3};
use serde::{Deserialize, Serialize};
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum EncodingError {
    #[error("Molecule has {atoms} atoms but the padded capacity is {capacity}")]
    TooManyAtoms { atoms: usize, capacity: usize },

    #[error("Atom {atom} has type index {type_index}, but only {num_types} types exist")]
    TypeOutOfRange {
        atom: usize,
        type_index: usize,
        num_types: usize,
    },

    #[error("Geometry has {found} positions, molecule has {expected} atoms")]
    GeometryLength { expected: usize, found: usize },

    #[error("Channel '{channel}' has shape {found:?}, expected {expected:?}")]
    Shape {
        channel: &'static str,
        expected: (usize, usize),
        found: (usize, usize),
    },
}

/// Fixed-capacity encoding of one molecule: one-hot types `[M x T]`, charges
/// `[M x 1]` and positions `[M x 3]`.
///
/// Rows at or beyond the real atom count are zero for every bundle built by
/// [`ConformerEncoder::encode`]. The real count itself is not stored; callers
/// carry it alongside.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(into = "BundleRows", try_from = "BundleRows")]
pub struct PaddedTensorBundle {
    one_hot: DMatrix<f64>,
    charges: DMatrix<f64>,
    positions: DMatrix<f64>,
}

impl PaddedTensorBundle {
    pub fn zeros(capacity: usize, num_types: usize) -> Self {
        Self {
            one_hot: DMatrix::zeros(capacity, num_types),
            charges: DMatrix::zeros(capacity, 1),
            positions: DMatrix::zeros(capacity, 3),
        }
    }

    pub fn from_parts(
        one_hot: DMatrix<f64>,
        charges: DMatrix<f64>,
        positions: DMatrix<f64>,
    ) -> Result<Self, EncodingError> {
        let capacity = one_hot.nrows();
        check_shape("charges", &charges, (capacity, 1))?;
        check_shape("positions", &positions, (capacity, 3))?;
        Ok(Self {
            one_hot,
            charges,
            positions,
        })
    }

    pub fn capacity(&self) -> usize {
        self.one_hot.nrows()
    }

    pub fn num_types(&self) -> usize {
        self.one_hot.ncols()
    }

    pub fn one_hot(&self) -> &DMatrix<f64> {
        &self.one_hot
    }

    pub fn charges(&self) -> &DMatrix<f64> {
        &self.charges
    }

    pub fn positions(&self) -> &DMatrix<f64> {
        &self.positions
    }

    pub fn has_shape(&self, capacity: usize, num_types: usize) -> bool {
        self.capacity() == capacity && self.num_types() == num_types
    }

    /// Arg-max type index of each of the first `n` rows.
    pub fn decode_type_indices(&self, n: usize) -> Vec<usize> {
        (0..n.min(self.capacity()))
            .map(|i| {
                let row: Vec<f64> = self.one_hot.row(i).iter().copied().collect();
                argmax(&row)
            })
            .collect()
    }

    /// Positions of the first `n` rows.
    pub fn positions_slice(&self, n: usize) -> Vec<Point3<f64>> {
        (0..n.min(self.capacity()))
            .map(|i| {
                Point3::new(
                    self.positions[(i, 0)],
                    self.positions[(i, 1)],
                    self.positions[(i, 2)],
                )
            })
            .collect()
    }

    /// Charge channel of the first `n` rows, rounded to the nearest integer.
    pub fn rounded_charges(&self, n: usize) -> Vec<i32> {
        (0..n.min(self.capacity()))
            .map(|i| self.charges[(i, 0)].round() as i32)
            .collect()
    }

    pub fn is_zero_beyond(&self, n: usize) -> bool {
        let zero_tail = |m: &DMatrix<f64>| {
            (n..m.nrows()).all(|i| m.row(i).iter().all(|&v| v == 0.0))
        };
        zero_tail(&self.one_hot) && zero_tail(&self.charges) && zero_tail(&self.positions)
    }
}

fn check_shape(
    channel: &'static str,
    m: &DMatrix<f64>,
    expected: (usize, usize),
) -> Result<(), EncodingError> {
    let found = m.shape();
    if found != expected {
        return Err(EncodingError::Shape {
            channel,
            expected,
            found,
        });
    }
    Ok(())
}

/// Row-major wire form of a bundle, as exchanged with sampler processes.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct BundleRows {
    pub positions: Vec<[f64; 3]>,
    pub one_hot: Vec<Vec<f64>>,
    pub charges: Vec<[f64; 1]>,
}

impl From<PaddedTensorBundle> for BundleRows {
    fn from(bundle: PaddedTensorBundle) -> Self {
        let m = bundle.capacity();
        Self {
            positions: (0..m)
                .map(|i| {
                    [
                        bundle.positions[(i, 0)],
                        bundle.positions[(i, 1)],
                        bundle.positions[(i, 2)],
                    ]
                })
                .collect(),
            one_hot: (0..m)
                .map(|i| bundle.one_hot.row(i).iter().copied().collect())
                .collect(),
            charges: (0..m).map(|i| [bundle.charges[(i, 0)]]).collect(),
        }
    }
}

impl TryFrom<BundleRows> for PaddedTensorBundle {
    type Error = EncodingError;

    fn try_from(rows: BundleRows) -> Result<Self, Self::Error> {
        let m = rows.one_hot.len();
        let t = rows.one_hot.first().map_or(0, Vec::len);
        for (i, row) in rows.one_hot.iter().enumerate() {
            if row.len() != t {
                return Err(EncodingError::Shape {
                    channel: "one_hot",
                    expected: (m, t),
                    found: (i, row.len()),
                });
            }
        }
        let one_hot = DMatrix::from_fn(m, t, |i, j| rows.one_hot[i][j]);
        let charges = DMatrix::from_fn(rows.charges.len(), 1, |i, _| rows.charges[i][0]);
        let positions = DMatrix::from_fn(rows.positions.len(), 3, |i, j| rows.positions[i][j]);
        Self::from_parts(one_hot, charges, positions)
    }
}

/// Turns a molecule plus its current geometry into the padded bundle the
/// diffusion model consumes.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ConformerEncoder {
    capacity: usize,
    num_types: usize,
}

impl ConformerEncoder {
    pub fn new(info: &DatasetInfo) -> Self {
        Self::with_dimensions(info.max_n_nodes, info.num_types())
    }

    pub fn with_dimensions(capacity: usize, num_types: usize) -> Self {
        Self {
            capacity,
            num_types,
        }
    }

    pub fn capacity(&self) -> usize {
        self.capacity
    }

    pub fn num_types(&self) -> usize {
        self.num_types
    }

    /// Encodes `molecule`'s fixed identity with `geometry` as positions.
    /// Rows `0..n` hold the real atoms; the rest stays zero.
    pub fn encode(
        &self,
        molecule: &Molecule,
        geometry: &[Point3<f64>],
    ) -> Result<PaddedTensorBundle, EncodingError> {
        let n = molecule.len();
        if n > self.capacity {
            return Err(EncodingError::TooManyAtoms {
                atoms: n,
                capacity: self.capacity,
            });
        }
        if geometry.len() != n {
            return Err(EncodingError::GeometryLength {
                expected: n,
                found: geometry.len(),
            });
        }

        let mut bundle = PaddedTensorBundle::zeros(self.capacity, self.num_types);
        for (atom, ((&type_index, &charge), p)) in molecule
            .type_indices()
            .iter()
            .zip(molecule.charges())
            .zip(geometry)
            .enumerate()
        {
            if type_index >= self.num_types {
                return Err(EncodingError::TypeOutOfRange {
                    atom,
                    type_index,
                    num_types: self.num_types,
                });
            }
            bundle.one_hot[(atom, type_index)] = 1.0;
            bundle.charges[(atom, 0)] = charge as f64;
            bundle.positions[(atom, 0)] = p.x;
            bundle.positions[(atom, 1)] = p.y;
            bundle.positions[(atom, 2)] = p.z;
        }
        Ok(bundle)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn methane() -> Molecule {
        Molecule::new(
            vec![6, 1, 1, 1, 1],
            vec![1, 0, 0, 0, 0],
            vec![6, 1, 1, 1, 1],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.63, 0.63, 0.63),
                Point3::new(-0.63, -0.63, 0.63),
                Point3::new(-0.63, 0.63, -0.63),
                Point3::new(0.63, -0.63, -0.63),
            ],
        )
        .unwrap()
    }

    fn qm9_encoder() -> ConformerEncoder {
        ConformerEncoder::new(&DatasetInfo::get("qm9", false).unwrap())
    }

    #[test]
    fn encode_produces_full_capacity_shapes() {
        let mol = methane();
        let bundle = qm9_encoder().encode(&mol, mol.positions()).unwrap();
        assert_eq!(bundle.one_hot().shape(), (29, 5));
        assert_eq!(bundle.charges().shape(), (29, 1));
        assert_eq!(bundle.positions().shape(), (29, 3));
    }

    #[test]
    fn encode_leaves_padding_rows_zero() {
        let mol = methane();
        let bundle = qm9_encoder().encode(&mol, mol.positions()).unwrap();
        assert!(bundle.is_zero_beyond(mol.len()));
        assert!(!bundle.is_zero_beyond(mol.len() - 1));
    }

    #[test]
    fn encode_writes_identity_and_geometry_for_real_rows() {
        let mol = methane();
        let bundle = qm9_encoder().encode(&mol, mol.positions()).unwrap();
        assert_eq!(bundle.decode_type_indices(5), vec![1, 0, 0, 0, 0]);
        assert_eq!(bundle.rounded_charges(5), vec![6, 1, 1, 1, 1]);
        assert_eq!(bundle.positions_slice(5), mol.positions().to_vec());
    }

    #[test]
    fn encode_uses_supplied_geometry_not_stored_positions() {
        let mol = methane();
        let shifted: Vec<_> = mol
            .positions()
            .iter()
            .map(|p| Point3::new(p.x + 1.0, p.y, p.z))
            .collect();
        let bundle = qm9_encoder().encode(&mol, &shifted).unwrap();
        assert_eq!(bundle.positions_slice(5), shifted);
    }

    #[test]
    fn encode_rejects_molecule_larger_than_capacity() {
        let mol = methane();
        let err = ConformerEncoder::with_dimensions(4, 5)
            .encode(&mol, mol.positions())
            .unwrap_err();
        assert_eq!(
            err,
            EncodingError::TooManyAtoms {
                atoms: 5,
                capacity: 4
            }
        );
    }

    #[test]
    fn encode_rejects_type_index_beyond_table() {
        let mol = methane();
        let err = ConformerEncoder::with_dimensions(29, 1)
            .encode(&mol, mol.positions())
            .unwrap_err();
        assert!(matches!(err, EncodingError::TypeOutOfRange { atom: 0, type_index: 1, .. }));
    }

    #[test]
    fn encode_rejects_geometry_of_wrong_length() {
        let mol = methane();
        let err = qm9_encoder().encode(&mol, &mol.positions()[..3]).unwrap_err();
        assert_eq!(err, EncodingError::GeometryLength { expected: 5, found: 3 });
    }

    #[test]
    fn from_parts_validates_channel_shapes() {
        let err = PaddedTensorBundle::from_parts(
            DMatrix::zeros(4, 5),
            DMatrix::zeros(4, 1),
            DMatrix::zeros(3, 3),
        )
        .unwrap_err();
        assert!(matches!(err, EncodingError::Shape { channel: "positions", .. }));
    }

    #[test]
    fn wire_form_preserves_bundle() {
        let mol = methane();
        let bundle = qm9_encoder().encode(&mol, mol.positions()).unwrap();
        let json = serde_json::to_string(&bundle).unwrap();
        let back: PaddedTensorBundle = serde_json::from_str(&json).unwrap();
        assert_eq!(back, bundle);
    }

    #[test]
    fn wire_form_rejects_ragged_channels() {
        let json = r#"{"positions":[[0,0,0]],"one_hot":[[1,0],[0,1]],"charges":[[1],[1]]}"#;
        assert!(serde_json::from_str::<PaddedTensorBundle>(json).is_err());
    }
}
