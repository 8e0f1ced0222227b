use super::config::FilterConfig;
use crate::core::models::molecule::Molecule;
use std::fmt;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord)]
pub enum RejectReason {
    /// No structural notation could be derived.
    Unparseable,
    /// The notation contains a ring-closure digit.
    RingPresent,
    /// The notation contains a double or triple bond symbol.
    MultipleBond,
    /// Branch openings reached the configured threshold.
    ExcessiveBranching { branches: usize },
    /// Formal charges do not match atomic numbers.
    ChargeInconsistent { deviation: i64 },
}

impl RejectReason {
    pub fn code(&self) -> &'static str {
        match self {
            Self::Unparseable => "unparseable",
            Self::RingPresent => "ring",
            Self::MultipleBond => "multiple-bond",
            Self::ExcessiveBranching { .. } => "branching",
            Self::ChargeInconsistent { .. } => "charge",
        }
    }
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Unparseable => write!(f, "structure notation unavailable"),
            Self::RingPresent => write!(f, "ring closure present"),
            Self::MultipleBond => write!(f, "multiple bond present"),
            Self::ExcessiveBranching { branches } => write!(f, "{} branches", branches),
            Self::ChargeInconsistent { deviation } => {
                write!(f, "charges deviate from atomic numbers by {}", deviation)
            }
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateDecision {
    Accepted,
    Rejected(RejectReason),
}

impl CandidateDecision {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Self::Accepted)
    }
}

/// Admits only structurally simple molecules: acyclic, single-bonded, lightly
/// branched and charge-consistent.
#[derive(Debug, Clone)]
pub struct MoleculeFilter {
    max_branches: usize,
}

impl MoleculeFilter {
    pub fn new(config: &FilterConfig) -> Self {
        Self {
            max_branches: config.max_branches,
        }
    }

    /// Structural checks run on the notation in a fixed order; the charge
    /// check runs last. The first failing check decides the reason.
    pub fn evaluate(&self, molecule: &Molecule, notation: Option<&str>) -> CandidateDecision {
        let Some(notation) = notation else {
            return CandidateDecision::Rejected(RejectReason::Unparseable);
        };

        if notation.chars().any(|c| c.is_ascii_digit()) {
            return CandidateDecision::Rejected(RejectReason::RingPresent);
        }
        if notation.contains(['=', '#']) {
            return CandidateDecision::Rejected(RejectReason::MultipleBond);
        }
        let branches = notation.matches('(').count();
        if branches >= self.max_branches {
            return CandidateDecision::Rejected(RejectReason::ExcessiveBranching { branches });
        }

        let deviation = molecule.charge_deviation();
        if deviation != 0 {
            return CandidateDecision::Rejected(RejectReason::ChargeInconsistent { deviation });
        }

        CandidateDecision::Accepted
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn molecule_with_charges(charges: Vec<i32>) -> Molecule {
        let n = charges.len();
        Molecule::new(
            vec![6; n],
            vec![1; n],
            charges,
            vec![Point3::origin(); n],
        )
        .unwrap()
    }

    fn filter() -> MoleculeFilter {
        MoleculeFilter::new(&FilterConfig::default())
    }

    #[test]
    fn accepts_simple_neutral_chain() {
        let mol = molecule_with_charges(vec![6, 6, 6]);
        assert_eq!(filter().evaluate(&mol, Some("CCC")), CandidateDecision::Accepted);
        assert_eq!(filter().evaluate(&mol, Some("CC(C)C")), CandidateDecision::Accepted);
    }

    #[test]
    fn rejects_missing_notation() {
        let mol = molecule_with_charges(vec![6]);
        assert_eq!(
            filter().evaluate(&mol, None),
            CandidateDecision::Rejected(RejectReason::Unparseable)
        );
    }

    #[test]
    fn rejects_any_digit() {
        let mol = molecule_with_charges(vec![6; 6]);
        for notation in ["C1CCCCC1", "C%10CC%10", "[13CH4]"] {
            assert_eq!(
                filter().evaluate(&mol, Some(notation)),
                CandidateDecision::Rejected(RejectReason::RingPresent),
                "{}",
                notation
            );
        }
    }

    #[test]
    fn rejects_double_and_triple_bonds() {
        let mol = molecule_with_charges(vec![6, 6]);
        for notation in ["C=C", "C#N"] {
            assert_eq!(
                filter().evaluate(&mol, Some(notation)),
                CandidateDecision::Rejected(RejectReason::MultipleBond)
            );
        }
    }

    #[test]
    fn branch_threshold_is_inclusive() {
        let mol = molecule_with_charges(vec![6]);
        let below = format!("C{}", "(C)".repeat(14));
        let at = format!("C{}", "(C)".repeat(15));
        assert_eq!(filter().evaluate(&mol, Some(&below)), CandidateDecision::Accepted);
        assert_eq!(
            filter().evaluate(&mol, Some(&at)),
            CandidateDecision::Rejected(RejectReason::ExcessiveBranching { branches: 15 })
        );

        let strict = MoleculeFilter::new(&FilterConfig { max_branches: 1 });
        assert!(!strict.evaluate(&mol, Some("C(C)C")).is_accepted());
    }

    #[test]
    fn rejects_charge_inconsistency_after_structural_checks() {
        let mol = molecule_with_charges(vec![6, 7, 5]);
        assert_eq!(
            filter().evaluate(&mol, Some("CCC")),
            CandidateDecision::Rejected(RejectReason::ChargeInconsistent { deviation: 2 })
        );
        assert_eq!(
            filter().evaluate(&mol, Some("C1CC1")),
            CandidateDecision::Rejected(RejectReason::RingPresent)
        );
    }

    #[test]
    fn reason_codes_are_stable() {
        assert_eq!(RejectReason::RingPresent.code(), "ring");
        assert_eq!(
            RejectReason::ExcessiveBranching { branches: 20 }.to_string(),
            "20 branches"
        );
    }
}
