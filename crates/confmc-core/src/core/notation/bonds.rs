use crate::core::elements;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};

const SINGLE_MARGIN_PM: f64 = 10.0;
const DOUBLE_MARGIN_PM: f64 = 5.0;
const TRIPLE_MARGIN_PM: f64 = 3.0;

/// Reference single-bond lengths in picometres.
fn single_bond_length(a: u8, b: u8) -> Option<f64> {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let pm = match (a, b) {
        (1, 1) => 74.0,
        (1, 6) => 109.0,
        (1, 7) => 101.0,
        (1, 8) => 96.0,
        (1, 9) => 92.0,
        (1, 14) => 148.0,
        (1, 15) => 144.0,
        (1, 16) => 134.0,
        (1, 17) => 127.0,
        (1, 35) => 141.0,
        (6, 6) => 154.0,
        (6, 7) => 147.0,
        (6, 8) => 143.0,
        (6, 9) => 135.0,
        (6, 14) => 185.0,
        (6, 15) => 184.0,
        (6, 16) => 182.0,
        (6, 17) => 177.0,
        (6, 35) => 194.0,
        (6, 53) => 214.0,
        (7, 7) => 145.0,
        (7, 8) => 140.0,
        (7, 9) => 136.0,
        (7, 17) => 175.0,
        (8, 8) => 148.0,
        (8, 9) => 142.0,
        (8, 15) => 163.0,
        (8, 16) => 151.0,
        (9, 9) => 142.0,
        (16, 16) => 204.0,
        (17, 17) => 199.0,
        _ => return None,
    };
    Some(pm)
}

fn double_bond_length(a: u8, b: u8) -> Option<f64> {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let pm = match (a, b) {
        (6, 6) => 134.0,
        (6, 7) => 129.0,
        (6, 8) => 120.0,
        (6, 16) => 160.0,
        (7, 7) => 125.0,
        (7, 8) => 121.0,
        (8, 8) => 121.0,
        (8, 15) => 150.0,
        (8, 16) => 143.0,
        _ => return None,
    };
    Some(pm)
}

fn triple_bond_length(a: u8, b: u8) -> Option<f64> {
    let (a, b) = if a <= b { (a, b) } else { (b, a) };
    let pm = match (a, b) {
        (6, 6) => 120.0,
        (6, 7) => 116.0,
        (6, 8) => 113.0,
        (7, 7) => 110.0,
        _ => return None,
    };
    Some(pm)
}

/// Classifies the bond between two elements at the given distance (in
/// Angstroms), or `None` when the atoms are too far apart to be bonded.
pub fn bond_order(a: u8, b: u8, distance: f64) -> Option<BondOrder> {
    let d = distance * 100.0;
    let single = single_bond_length(a, b)?;
    if d >= single + SINGLE_MARGIN_PM {
        return None;
    }
    match double_bond_length(a, b) {
        Some(double) if d < double + DOUBLE_MARGIN_PM => match triple_bond_length(a, b) {
            Some(triple) if d < triple + TRIPLE_MARGIN_PM => Some(BondOrder::Triple),
            _ => Some(BondOrder::Double),
        },
        _ => Some(BondOrder::Single),
    }
}

/// Infers all bonds of a molecule from pairwise distances.
pub fn perceive_bonds(molecule: &Molecule) -> Vec<Bond> {
    let z = molecule.atomic_numbers();
    let pos = molecule.positions();
    let mut bonds = Vec::new();
    for i in 0..molecule.len() {
        for j in (i + 1)..molecule.len() {
            let distance = (pos[i] - pos[j]).norm();
            if let Some(order) = bond_order(z[i], z[j], distance) {
                bonds.push(Bond::new(i, j, order));
            }
        }
    }
    bonds
}

/// Returns `true` when every atom's bond-order sum stays within its maximum
/// valence. Elements without a valence entry fail the check.
pub fn valences_satisfied(molecule: &Molecule, bonds: &[Bond]) -> bool {
    let mut used = vec![0u32; molecule.len()];
    for bond in bonds {
        used[bond.atom1] += bond.order.valence() as u32;
        used[bond.atom2] += bond.order.valence() as u32;
    }
    molecule
        .atomic_numbers()
        .iter()
        .zip(&used)
        .all(|(&z, &u)| elements::max_valence(z).is_some_and(|max| u <= max as u32))
}
