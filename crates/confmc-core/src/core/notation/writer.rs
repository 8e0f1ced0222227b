use super::StructureNotation;
use super::bonds::{perceive_bonds, valences_satisfied};
use crate::core::elements;
use crate::core::models::molecule::Molecule;
use crate::core::models::topology::{Bond, BondOrder};
use std::collections::{BTreeMap, HashSet};

const ORGANIC_SUBSET: &[&str] = &["B", "C", "N", "O", "P", "S", "F", "Cl", "Br", "I"];

/// Writes a SMILES-style line notation from a molecule's 3D geometry.
///
/// Bonds are perceived from interatomic distances. Hydrogens are implicit
/// unless the molecule contains no heavy atom. Ring closures are written as
/// digits, double and triple bonds as `=` and `#`, side branches in
/// parentheses and disconnected fragments separated by `.`. The output is not
/// canonical, but the presence of each of these features is independent of
/// atom ordering.
#[derive(Debug, Clone, Copy, Default)]
pub struct LineNotation;

impl StructureNotation for LineNotation {
    fn notation(&self, molecule: &Molecule) -> Option<String> {
        let bonds = perceive_bonds(molecule);
        if !valences_satisfied(molecule, &bonds) {
            return None;
        }
        let graph = HeavyAtomGraph::new(molecule, &bonds);
        Some(graph.write(molecule))
    }
}

struct HeavyAtomGraph {
    nodes: Vec<usize>,
    adjacency: BTreeMap<usize, Vec<(usize, BondOrder)>>,
}

struct Traversal {
    visited: HashSet<usize>,
    children: BTreeMap<usize, Vec<(usize, BondOrder)>>,
    ring_bonds: Vec<Bond>,
}

impl HeavyAtomGraph {
    fn new(molecule: &Molecule, bonds: &[Bond]) -> Self {
        let z = molecule.atomic_numbers();
        let heavy: Vec<usize> = (0..molecule.len())
            .filter(|&i| !elements::is_hydrogen(z[i]))
            .collect();
        let nodes = if heavy.is_empty() {
            (0..molecule.len()).collect()
        } else {
            heavy
        };
        let included: HashSet<usize> = nodes.iter().copied().collect();

        let mut adjacency: BTreeMap<usize, Vec<(usize, BondOrder)>> =
            nodes.iter().map(|&n| (n, Vec::new())).collect();
        for bond in bonds {
            if included.contains(&bond.atom1) && included.contains(&bond.atom2) {
                adjacency
                    .entry(bond.atom1)
                    .or_default()
                    .push((bond.atom2, bond.order));
                adjacency
                    .entry(bond.atom2)
                    .or_default()
                    .push((bond.atom1, bond.order));
            }
        }
        for neighbors in adjacency.values_mut() {
            neighbors.sort_unstable_by_key(|(n, _)| *n);
        }

        Self { nodes, adjacency }
    }

    fn write(&self, molecule: &Molecule) -> String {
        let mut traversal = Traversal {
            visited: HashSet::new(),
            children: BTreeMap::new(),
            ring_bonds: Vec::new(),
        };
        let mut roots = Vec::new();
        for &node in &self.nodes {
            if !traversal.visited.contains(&node) {
                roots.push(node);
                self.explore(node, None, &mut traversal);
            }
        }

        let mut ring_labels: BTreeMap<usize, Vec<(usize, BondOrder)>> = BTreeMap::new();
        for (idx, bond) in traversal.ring_bonds.iter().enumerate() {
            let label = idx + 1;
            ring_labels
                .entry(bond.atom1)
                .or_default()
                .push((label, bond.order));
            ring_labels
                .entry(bond.atom2)
                .or_default()
                .push((label, bond.order));
        }

        let fragments: Vec<String> = roots
            .into_iter()
            .map(|root| {
                let mut out = String::new();
                self.emit(root, molecule, &traversal, &ring_labels, &mut out);
                out
            })
            .collect();
        fragments.join(".")
    }

    fn explore(&self, atom: usize, parent: Option<usize>, traversal: &mut Traversal) {
        traversal.visited.insert(atom);
        for &(neighbor, order) in &self.adjacency[&atom] {
            if Some(neighbor) == parent {
                continue;
            }
            if traversal.visited.contains(&neighbor) {
                let closure = Bond::new(neighbor.min(atom), neighbor.max(atom), order);
                if !traversal.ring_bonds.contains(&closure) {
                    traversal.ring_bonds.push(closure);
                }
                continue;
            }
            traversal
                .children
                .entry(atom)
                .or_default()
                .push((neighbor, order));
            self.explore(neighbor, Some(atom), traversal);
        }
    }

    fn emit(
        &self,
        atom: usize,
        molecule: &Molecule,
        traversal: &Traversal,
        ring_labels: &BTreeMap<usize, Vec<(usize, BondOrder)>>,
        out: &mut String,
    ) {
        out.push_str(&atom_token(molecule.atomic_numbers()[atom]));
        if let Some(labels) = ring_labels.get(&atom) {
            for &(label, order) in labels {
                out.push_str(order.symbol());
                out.push_str(&ring_label(label));
            }
        }

        let Some(children) = traversal.children.get(&atom) else {
            return;
        };
        let last = children.len() - 1;
        for (i, &(child, order)) in children.iter().enumerate() {
            if i < last {
                out.push('(');
            }
            out.push_str(order.symbol());
            self.emit(child, molecule, traversal, ring_labels, out);
            if i < last {
                out.push(')');
            }
        }
    }
}

fn atom_token(atomic_number: u8) -> String {
    match elements::symbol(atomic_number) {
        Some(sym) if ORGANIC_SUBSET.contains(&sym) => sym.to_string(),
        Some(sym) => format!("[{}]", sym),
        None => format!("[#{}]", atomic_number),
    }
}

fn ring_label(label: usize) -> String {
    if label < 10 {
        label.to_string()
    } else {
        format!("%{}", label)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use nalgebra::Point3;

    fn molecule(atoms: &[(u8, [f64; 3])]) -> Molecule {
        Molecule::new(
            atoms.iter().map(|(z, _)| *z).collect(),
            vec![0; atoms.len()],
            atoms.iter().map(|(z, _)| *z as i32).collect(),
            atoms
                .iter()
                .map(|(_, [x, y, z])| Point3::new(*x, *y, *z))
                .collect(),
        )
        .unwrap()
    }

    fn methane() -> Molecule {
        molecule(&[
            (6, [0.0, 0.0, 0.0]),
            (1, [0.629, 0.629, 0.629]),
            (1, [-0.629, -0.629, 0.629]),
            (1, [-0.629, 0.629, -0.629]),
            (1, [0.629, -0.629, -0.629]),
        ])
    }

    fn hexagon(z: u8, radius: f64) -> Molecule {
        let atoms: Vec<(u8, [f64; 3])> = (0..6)
            .map(|k| {
                let angle = k as f64 * std::f64::consts::PI / 3.0;
                (z, [radius * angle.cos(), radius * angle.sin(), 0.0])
            })
            .collect();
        molecule(&atoms)
    }

    #[test]
    fn methane_is_a_single_carbon() {
        assert_eq!(LineNotation.notation(&methane()).as_deref(), Some("C"));
    }

    #[test]
    fn ethanol_backbone_is_linear() {
        let mol = molecule(&[
            (6, [0.0, 0.0, 0.0]),
            (6, [1.52, 0.0, 0.0]),
            (8, [2.0, 1.35, 0.0]),
        ]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("CCO"));
    }

    #[test]
    fn isobutane_center_carbon_gets_branches() {
        let mol = molecule(&[
            (6, [0.0, 0.0, 0.0]),
            (6, [1.53, 0.0, 0.0]),
            (6, [-0.51, 1.44, 0.0]),
            (6, [-0.51, -0.72, 1.25]),
        ]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("C(C)(C)C"));
    }

    #[test]
    fn six_membered_ring_contains_a_closure_digit() {
        let notation = LineNotation.notation(&hexagon(6, 1.53)).unwrap();
        assert_eq!(notation, "C1CCCCC1");
        assert!(notation.chars().any(|c| c.is_ascii_digit()));
    }

    #[test]
    fn carbonyl_is_written_with_double_bond() {
        let mol = molecule(&[(6, [0.0, 0.0, 0.0]), (8, [1.21, 0.0, 0.0])]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("C=O"));
    }

    #[test]
    fn nitrile_is_written_with_triple_bond() {
        let mol = molecule(&[(6, [0.0, 0.0, 0.0]), (7, [1.16, 0.0, 0.0])]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("C#N"));
    }

    #[test]
    fn fragments_are_dot_separated() {
        let mol = molecule(&[(6, [0.0, 0.0, 0.0]), (8, [6.0, 0.0, 0.0])]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("C.O"));
    }

    #[test]
    fn hydrogen_only_molecule_keeps_explicit_atoms() {
        let mol = molecule(&[(1, [0.0, 0.0, 0.0]), (1, [0.74, 0.0, 0.0])]);
        assert_eq!(LineNotation.notation(&mol).as_deref(), Some("[H][H]"));
    }

    #[test]
    fn overbonded_geometry_has_no_notation() {
        let mol = molecule(&[
            (8, [0.0, 0.0, 0.0]),
            (6, [1.43, 0.0, 0.0]),
            (6, [-1.43, 0.0, 0.0]),
            (6, [0.0, 1.43, 0.0]),
        ]);
        assert_eq!(LineNotation.notation(&mol), None);
    }

    #[test]
    fn ring_labels_above_nine_use_percent_form() {
        assert_eq!(ring_label(3), "3");
        assert_eq!(ring_label(12), "%12");
    }
}
