use super::encoder::PaddedTensorBundle;
use crate::core::dataset::info::DatasetInfo;
use crate::core::models::molecule::Molecule;
use tracing::warn;

/// An atom whose decoded type no longer matches its atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct AtomMismatch {
    pub atom: usize,
    pub expected: u8,
    /// `None` when the decoded type index has no entry in the decoder table.
    pub found: Option<u8>,
}

/// An atom whose rounded charge channel differs from its atomic number.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ChargeDrift {
    pub atom: usize,
    pub expected: u8,
    pub found: i32,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ConsistencyReport {
    pub mismatches: Vec<AtomMismatch>,
    pub charge_drift: Vec<ChargeDrift>,
}

impl ConsistencyReport {
    pub fn is_consistent(&self) -> bool {
        self.mismatches.is_empty()
    }
}

/// Compares the atom identity implied by an oracle snapshot with the ground
/// truth of the molecule being refined. Findings are logged and returned;
/// they never stop a trajectory.
#[derive(Debug, Clone)]
pub struct ConsistencyValidator {
    decoder: Vec<Option<u8>>,
    check_charge_drift: bool,
}

impl ConsistencyValidator {
    pub fn new(info: &DatasetInfo, check_charge_drift: bool) -> Self {
        Self {
            decoder: (0..info.num_types())
                .map(|t| info.atomic_number_of(t))
                .collect(),
            check_charge_drift,
        }
    }

    pub fn validate(&self, molecule: &Molecule, snapshot: &PaddedTensorBundle) -> ConsistencyReport {
        let n = molecule.len();
        let expected = molecule.atomic_numbers();

        let mismatches = snapshot
            .decode_type_indices(n)
            .into_iter()
            .enumerate()
            .filter_map(|(atom, type_index)| {
                let found = self.decoder.get(type_index).copied().flatten();
                (found != Some(expected[atom])).then_some(AtomMismatch {
                    atom,
                    expected: expected[atom],
                    found,
                })
            })
            .collect();

        let charge_drift = if self.check_charge_drift {
            snapshot
                .rounded_charges(n)
                .into_iter()
                .enumerate()
                .filter(|&(atom, q)| q != expected[atom] as i32)
                .map(|(atom, found)| ChargeDrift {
                    atom,
                    expected: expected[atom],
                    found,
                })
                .collect()
        } else {
            Vec::new()
        };

        ConsistencyReport {
            mismatches,
            charge_drift,
        }
    }

    /// [`ConsistencyValidator::validate`], logging every finding against the
    /// sample and step it belongs to.
    pub fn check(
        &self,
        molecule: &Molecule,
        snapshot: &PaddedTensorBundle,
        sample: usize,
        step: usize,
    ) -> ConsistencyReport {
        let report = self.validate(molecule, snapshot);
        if !report.mismatches.is_empty() {
            warn!(
                sample,
                step,
                atoms = ?report.mismatches.iter().map(|m| m.atom).collect::<Vec<_>>(),
                "Atom types changed during refinement: {} mismatch(es).",
                report.mismatches.len()
            );
        }
        if !report.charge_drift.is_empty() {
            warn!(
                sample,
                step,
                "Charge channel drifted from atomic numbers on {} atom(s).",
                report.charge_drift.len()
            );
        }
        report
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::engine::encoder::ConformerEncoder;
    use nalgebra::Point3;

    fn qm9() -> DatasetInfo {
        DatasetInfo::get("qm9", false).unwrap()
    }

    fn water() -> Molecule {
        Molecule::new(
            vec![8, 1, 1],
            vec![3, 0, 0],
            vec![8, 1, 1],
            vec![
                Point3::new(0.0, 0.0, 0.0),
                Point3::new(0.96, 0.0, 0.0),
                Point3::new(-0.24, 0.93, 0.0),
            ],
        )
        .unwrap()
    }

    fn encoded(mol: &Molecule) -> PaddedTensorBundle {
        ConformerEncoder::new(&qm9()).encode(mol, mol.positions()).unwrap()
    }

    fn with_one_hot_row(bundle: &PaddedTensorBundle, atom: usize, type_index: usize) -> PaddedTensorBundle {
        let mut one_hot = bundle.one_hot().clone();
        one_hot.row_mut(atom).fill(0.0);
        one_hot[(atom, type_index)] = 1.0;
        PaddedTensorBundle::from_parts(one_hot, bundle.charges().clone(), bundle.positions().clone())
            .unwrap()
    }

    #[test]
    fn unchanged_snapshot_is_consistent() {
        let mol = water();
        let report = ConsistencyValidator::new(&qm9(), true).validate(&mol, &encoded(&mol));
        assert!(report.is_consistent());
        assert!(report.charge_drift.is_empty());
    }

    #[test]
    fn changed_type_is_reported_per_atom() {
        let mol = water();
        let snapshot = with_one_hot_row(&encoded(&mol), 1, 2);
        let report = ConsistencyValidator::new(&qm9(), false).validate(&mol, &snapshot);
        assert_eq!(
            report.mismatches,
            vec![AtomMismatch {
                atom: 1,
                expected: 1,
                found: Some(7)
            }]
        );
    }

    #[test]
    fn soft_one_hot_rows_decode_by_arg_max() {
        let mol = water();
        let base = encoded(&mol);
        let mut one_hot = base.one_hot().clone();
        one_hot[(0, 3)] = 0.6;
        one_hot[(0, 1)] = 0.4;
        let snapshot =
            PaddedTensorBundle::from_parts(one_hot, base.charges().clone(), base.positions().clone())
                .unwrap();
        let report = ConsistencyValidator::new(&qm9(), false).validate(&mol, &snapshot);
        assert!(report.is_consistent());
    }

    #[test]
    fn charge_drift_is_only_checked_when_enabled() {
        let mol = water();
        let base = encoded(&mol);
        let mut charges = base.charges().clone();
        charges[(2, 0)] = 2.4;
        let snapshot =
            PaddedTensorBundle::from_parts(base.one_hot().clone(), charges, base.positions().clone())
                .unwrap();

        let off = ConsistencyValidator::new(&qm9(), false).validate(&mol, &snapshot);
        assert!(off.charge_drift.is_empty());

        let on = ConsistencyValidator::new(&qm9(), true).check(&mol, &snapshot, 0, 0);
        assert_eq!(
            on.charge_drift,
            vec![ChargeDrift {
                atom: 2,
                expected: 1,
                found: 2
            }]
        );
        assert!(on.is_consistent());
    }

    #[test]
    fn padding_rows_are_ignored() {
        let mol = water();
        let base = encoded(&mol);
        let mut one_hot = base.one_hot().clone();
        one_hot[(10, 4)] = 1.0;
        let snapshot = PaddedTensorBundle::from_parts(
            one_hot,
            base.charges().clone(),
            base.positions().clone(),
        )
        .unwrap();
        assert!(ConsistencyValidator::new(&qm9(), false)
            .validate(&mol, &snapshot)
            .is_consistent());
    }
}
