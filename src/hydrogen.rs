use petgraph::stable_graph::NodeIndex;

use crate::atom::Atom;
use crate::bond::Bond;
use crate::element::Element;
use crate::molecule::Molecule;

/// Copy of `mol` with every implicit hydrogen turned into an explicit
/// vertex singly bonded to its parent. New hydrogens are appended after the
/// existing atoms, parent by parent.
pub fn add_hydrogens(mol: &Molecule) -> Molecule {
    let mut result = mol.clone();
    let parents: Vec<(NodeIndex, u8)> = mol
        .atoms()
        .filter_map(|idx| {
            let count = mol.atom(idx).ok()?.implicit_hydrogens;
            (count > 0).then_some((idx, count))
        })
        .collect();

    for (parent, count) in parents {
        let attached = (0..count)
            .filter_map(|_| result.add_leaf_atom(parent, Atom::new(Element::H), Bond::single()))
            .count();
        if let Ok(atom) = result.atom_mut(parent) {
            atom.implicit_hydrogens = count - attached as u8;
        }
    }
    result
}

/// Copy of `mol` with removable hydrogens folded into their neighbour's
/// implicit count.
///
/// A hydrogen is removable when it is neutral, has no radical electrons,
/// and has exactly one bond, a single bond to a non-hydrogen atom. Others
/// (H2, bridging or charged hydrogens) stay explicit.
pub fn remove_hydrogens(mol: &Molecule) -> Molecule {
    let mut result = mol.clone();
    let removable: Vec<(NodeIndex, NodeIndex)> = mol
        .atoms()
        .filter_map(|idx| {
            let atom = mol.atom(idx).ok()?;
            if !atom.is_hydrogen() || atom.formal_charge != 0 || atom.radical_electrons != 0 {
                return None;
            }
            let mut bonds = mol.bonds_of(idx);
            let (parent, bond) = bonds.next()?;
            if bonds.next().is_some() || !bond.is_single() {
                return None;
            }
            let heavy = mol.atom(parent).ok()?;
            (!heavy.is_hydrogen()).then_some((idx, parent))
        })
        .collect();

    for (h, parent) in removable {
        if result.remove_atom(h).is_ok() {
            if let Ok(atom) = result.atom_mut(parent) {
                atom.implicit_hydrogens += 1;
            }
        }
    }
    result
}

impl Molecule {
    pub fn with_explicit_hydrogens(&self) -> Molecule {
        add_hydrogens(self)
    }

    pub fn with_implicit_hydrogens(&self) -> Molecule {
        remove_hydrogens(self)
    }

    /// Hydrogens bonded to `idx`, implicit and explicit.
    pub fn total_hydrogens(&self, idx: NodeIndex) -> u32 {
        let implicit = self.atom(idx).map_or(0, |a| u32::from(a.implicit_hydrogens));
        let explicit = self
            .neighbors(idx)
            .filter(|&n| self.atom(n).is_ok_and(Atom::is_hydrogen))
            .count() as u32;
        implicit + explicit
    }
}
