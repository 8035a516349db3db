use std::cell::OnceCell;

use petgraph::stable_graph::{EdgeIndex, NodeIndex};
use tracing::trace;

use crate::atom::{Atom, AtomType};
use crate::bond::Bond;
use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::isomorphism::VertexMapping;
use crate::pattern::MoleculePattern;

/// Graph of [`Atom`]s joined by [`Bond`]s, with lazily perceived rings.
///
/// The ring set is computed on first request and dropped by every
/// structural mutation (adding or removing atoms and bonds); changing a
/// bond order or atom payload keeps it. [`has_cached_rings`] reports
/// whether a computed set is currently held.
///
/// Cloning is a deep copy: the clone owns its own atoms and bonds and keeps
/// the original's atom handles and insertion order.
///
/// [`has_cached_rings`]: Molecule::has_cached_rings
#[derive(Debug, Clone, Default)]
pub struct Molecule {
    graph: Graph<Atom, Bond>,
    rings: OnceCell<Vec<Vec<NodeIndex>>>,
}

impl Molecule {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn graph(&self) -> &Graph<Atom, Bond> {
        &self.graph
    }

    pub fn into_graph(self) -> Graph<Atom, Bond> {
        self.graph
    }

    pub fn atom_count(&self) -> usize {
        self.graph.vertex_count()
    }

    pub fn bond_count(&self) -> usize {
        self.graph.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.graph.is_empty()
    }

    pub fn atoms(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.vertices()
    }

    pub fn bonds(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &Bond)> + '_ {
        self.graph.edges()
    }

    pub fn atom(&self, idx: NodeIndex) -> Result<&Atom> {
        self.graph.vertex(idx)
    }

    /// Mutable access to an atom. Its cached atom type is cleared.
    pub fn atom_mut(&mut self, idx: NodeIndex) -> Result<&mut Atom> {
        let atom = self.graph.vertex_mut(idx)?;
        atom.atom_type = None;
        Ok(atom)
    }

    pub fn bond(&self, a: NodeIndex, b: NodeIndex) -> Result<&Bond> {
        self.graph.edge(a, b)
    }

    /// Mutable access to a bond. Both endpoints lose their cached types.
    pub fn bond_mut(&mut self, a: NodeIndex, b: NodeIndex) -> Result<&mut Bond> {
        self.graph.edge_id(a, b)?;
        self.clear_atom_types([a, b]);
        self.graph.edge_mut(a, b)
    }

    pub fn has_bond(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.graph.has_edge(a, b)
    }

    pub fn neighbors(&self, idx: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.graph.neighbors(idx)
    }

    pub fn bonds_of(&self, idx: NodeIndex) -> impl Iterator<Item = (NodeIndex, &Bond)> + '_ {
        self.graph.incident_edges(idx)
    }

    pub fn add_atom(&mut self, atom: Atom) -> NodeIndex {
        self.rings.take();
        self.graph.add_vertex(atom)
    }

    pub fn add_bond(&mut self, a: NodeIndex, b: NodeIndex, bond: Bond) -> Result<EdgeIndex> {
        let id = self.graph.add_edge(a, b, bond)?;
        self.rings.take();
        self.clear_atom_types([a, b]);
        Ok(id)
    }

    /// Add `atom` bonded to `parent`; `None` if `parent` is absent.
    pub fn add_leaf_atom(&mut self, parent: NodeIndex, atom: Atom, bond: Bond) -> Option<NodeIndex> {
        let leaf = self.graph.add_leaf(parent, atom, bond)?;
        self.rings.take();
        self.clear_atom_types([parent]);
        Some(leaf)
    }

    pub fn remove_atom(&mut self, idx: NodeIndex) -> Result<Atom> {
        let neighbors: Vec<NodeIndex> = self.graph.neighbors(idx).collect();
        let atom = self.graph.remove_vertex(idx)?;
        self.rings.take();
        self.clear_atom_types(neighbors);
        Ok(atom)
    }

    pub fn remove_bond(&mut self, a: NodeIndex, b: NodeIndex) -> Result<Bond> {
        let bond = self.graph.remove_edge(a, b)?;
        self.rings.take();
        self.clear_atom_types([a, b]);
        Ok(bond)
    }

    fn clear_atom_types(&mut self, atoms: impl IntoIterator<Item = NodeIndex>) {
        for idx in atoms {
            if let Ok(atom) = self.graph.vertex_mut(idx) {
                atom.atom_type = None;
            }
        }
    }

    pub fn has_cached_rings(&self) -> bool {
        self.rings.get().is_some()
    }

    /// The smallest set of smallest rings, computed on first use after any
    /// structural change.
    pub fn smallest_set_of_smallest_rings(&self) -> &[Vec<NodeIndex>] {
        self.rings
            .get_or_init(|| self.graph.smallest_set_of_smallest_rings())
    }

    pub fn is_cyclic(&self) -> bool {
        self.graph.is_cyclic()
    }

    pub fn rings_containing(&self, idx: NodeIndex) -> Vec<&[NodeIndex]> {
        self.smallest_set_of_smallest_rings()
            .iter()
            .filter(|ring| ring.contains(&idx))
            .map(Vec::as_slice)
            .collect()
    }

    /// Recompute the atom type of every atom from its current bonds.
    pub fn update_atom_types(&mut self) {
        let atoms: Vec<NodeIndex> = self.graph.vertices().collect();
        for idx in atoms {
            let orders: Vec<_> = self.graph.incident_edges(idx).map(|(_, b)| b.order).collect();
            let element = self.graph[idx].element;
            self.graph[idx].atom_type = Some(AtomType::classify(element, orders));
        }
    }

    /// Set each atom's lone pairs from its valence electrons minus charge,
    /// radicals, bonding electrons and implicit hydrogens.
    pub fn update_lone_pairs(&mut self) {
        let atoms: Vec<NodeIndex> = self.graph.vertices().collect();
        for idx in atoms {
            let bonding: f64 = self
                .graph
                .incident_edges(idx)
                .map(|(_, b)| b.order.value())
                .sum();
            let atom = &self.graph[idx];
            let free = f64::from(atom.element.valence_electrons())
                - f64::from(atom.formal_charge)
                - f64::from(atom.radical_electrons)
                - f64::from(atom.implicit_hydrogens)
                - bonding;
            let pairs = (free.max(0.0) / 2.0).floor() as u8;
            self.graph[idx].lone_pairs = pairs;
        }
    }

    pub fn radical_count(&self) -> u32 {
        self.graph
            .vertices()
            .map(|v| u32::from(self.graph[v].radical_electrons))
            .sum()
    }

    pub fn is_radical(&self) -> bool {
        self.radical_count() > 0
    }

    pub fn is_isomorphic(&self, other: &Molecule) -> bool {
        self.graph.is_isomorphic(&other.graph)
    }

    pub fn find_isomorphism(&self, other: &Molecule) -> Option<VertexMapping> {
        self.graph.find_isomorphism(&other.graph)
    }

    pub fn is_isomorphic_with(
        &self,
        other: &Molecule,
        initial: &[(NodeIndex, NodeIndex)],
    ) -> Result<bool> {
        self.graph.is_isomorphic_with(&other.graph, initial)
    }

    pub fn is_subgraph_isomorphic(&self, pattern: &MoleculePattern) -> bool {
        self.graph.is_subgraph_isomorphic(pattern)
    }

    /// Substructure test with `(molecule atom, pattern atom)` pairs pinned.
    pub fn is_subgraph_isomorphic_with(
        &self,
        pattern: &MoleculePattern,
        initial: &[(NodeIndex, NodeIndex)],
    ) -> Result<bool> {
        self.graph.is_subgraph_isomorphic_with(pattern, initial)
    }

    /// Every embedding of `pattern`, as `(molecule atom, pattern atom)`
    /// pairs.
    pub fn find_subgraph_isomorphisms(&self, pattern: &MoleculePattern) -> Vec<VertexMapping> {
        self.graph.find_subgraph_isomorphisms(pattern)
    }

    /// One molecule per connected fragment, keeping atom handles.
    pub fn split(&self) -> Vec<Molecule> {
        self.graph.split().into_iter().map(Molecule::from).collect()
    }

    /// Move every atom and bond of `other` into `self`. Returns
    /// `(handle in other, handle in self)` for each moved atom.
    pub fn merge(&mut self, other: Molecule) -> Vec<(NodeIndex, NodeIndex)> {
        self.rings.take();
        self.graph.merge(other.graph)
    }

    /// Resonance structures one radical shift away.
    ///
    /// For every path `a1 - a2 = a3` where `a1` carries a radical, the bond
    /// `a1 - a2` is single or double and `a2 - a3` is double or triple,
    /// the radical moves from `a1` to `a3`, `a1 - a2` gains one order and
    /// `a2 - a3` loses one. Each result is an independent copy.
    pub fn adjacent_resonance_isomers(&self) -> Vec<Molecule> {
        let mut isomers = Vec::new();
        for a1 in self.graph.vertices() {
            if self.graph[a1].radical_electrons == 0 {
                continue;
            }
            for (a2, b12) in self.graph.incident_edges(a1) {
                if !(b12.is_single() || b12.is_double()) {
                    continue;
                }
                for (a3, b23) in self.graph.incident_edges(a2) {
                    if a3 == a1 || !(b23.is_double() || b23.is_triple()) {
                        continue;
                    }
                    match self.shift_radical(a1, a2, a3) {
                        Ok(isomer) => isomers.push(isomer),
                        Err(err) => trace!(%err, "skipped radical shift"),
                    }
                }
            }
        }
        isomers
    }

    fn shift_radical(&self, a1: NodeIndex, a2: NodeIndex, a3: NodeIndex) -> Result<Molecule> {
        let mut isomer = self.clone();
        isomer.atom_mut(a1)?.decrement_radical()?;
        isomer.atom_mut(a3)?.increment_radical();
        isomer.bond_mut(a1, a2)?.increment_order()?;
        isomer.bond_mut(a2, a3)?.decrement_order()?;
        Ok(isomer)
    }

    /// Build a molecule from `(atom, bonds)` where bonds are given as
    /// `(i, j, bond)` positions into `atoms`.
    pub fn from_parts(atoms: Vec<Atom>, bonds: Vec<(usize, usize, Bond)>) -> Result<Molecule> {
        let mut mol = Molecule::new();
        let handles: Vec<NodeIndex> = atoms.into_iter().map(|a| mol.add_atom(a)).collect();
        for (i, j, bond) in bonds {
            let lookup = |k: usize| {
                handles.get(k).copied().ok_or_else(|| {
                    GraphError::InvalidStructure(format!("bond refers to atom {k} of {}", handles.len()))
                })
            };
            mol.add_bond(lookup(i)?, lookup(j)?, bond)?;
        }
        Ok(mol)
    }
}

impl From<Graph<Atom, Bond>> for Molecule {
    fn from(graph: Graph<Atom, Bond>) -> Self {
        Self {
            graph,
            rings: OnceCell::new(),
        }
    }
}

/// Handle-wise equality: same atoms at the same handles in the same order,
/// same bonds between the same handles.
impl PartialEq for Molecule {
    fn eq(&self, other: &Self) -> bool {
        self.atom_count() == other.atom_count()
            && self.bond_count() == other.bond_count()
            && self
                .atoms()
                .zip(other.atoms())
                .all(|(a, b)| a == b && self.graph[a] == other.graph[b])
            && self
                .bonds()
                .all(|(a, b, bond)| other.bond(a, b).is_ok_and(|o| o == bond))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn carbon() -> Atom {
        Atom::new(Element::C)
    }

    /// Allyl radical: CH2=CH-CH2*
    fn allyl() -> (Molecule, [NodeIndex; 3]) {
        let mut m = Molecule::new();
        let a = m.add_atom(carbon().with_implicit_hydrogens(2));
        let b = m.add_atom(carbon().with_implicit_hydrogens(1));
        let c = m.add_atom(carbon().with_implicit_hydrogens(2).with_radical_electrons(1));
        m.add_bond(a, b, Bond::double()).unwrap();
        m.add_bond(b, c, Bond::single()).unwrap();
        (m, [a, b, c])
    }

    fn cyclopropane() -> Molecule {
        Molecule::from_parts(
            vec![carbon(), carbon(), carbon()],
            vec![(0, 1, Bond::single()), (1, 2, Bond::single()), (2, 0, Bond::single())],
        )
        .unwrap()
    }

    #[test]
    fn ring_cache_is_dropped_by_structural_changes() {
        let mut m = cyclopropane();
        assert!(!m.has_cached_rings());
        assert_eq!(m.smallest_set_of_smallest_rings().len(), 1);
        assert!(m.has_cached_rings());

        let atoms: Vec<_> = m.atoms().collect();
        m.bond_mut(atoms[0], atoms[1]).unwrap().increment_order().unwrap();
        assert!(m.has_cached_rings(), "order changes keep the ring set");

        m.remove_bond(atoms[0], atoms[1]).unwrap();
        assert!(!m.has_cached_rings());
        assert!(m.smallest_set_of_smallest_rings().is_empty());

        let extra = m.add_atom(carbon());
        assert!(!m.has_cached_rings());
        m.add_bond(atoms[0], extra, Bond::single()).unwrap();
        assert!(m.smallest_set_of_smallest_rings().is_empty());
    }

    #[test]
    fn failed_mutation_keeps_cache() {
        let mut m = cyclopropane();
        let atoms: Vec<_> = m.atoms().collect();
        m.smallest_set_of_smallest_rings();
        assert!(m.add_bond(atoms[0], atoms[1], Bond::single()).is_err());
        assert!(m.has_cached_rings());
        assert_eq!(m.bond_count(), 3);
    }

    #[test]
    fn remove_atom_cascades() {
        let mut m = cyclopropane();
        let atoms: Vec<_> = m.atoms().collect();
        m.remove_atom(atoms[0]).unwrap();
        assert_eq!(m.atom_count(), 2);
        assert_eq!(m.bond_count(), 1);
        assert!(m.bonds().all(|(a, b, _)| a != atoms[0] && b != atoms[0]));
        assert!(m.remove_atom(atoms[0]).is_err());
    }

    #[test]
    fn atom_types_follow_bond_orders() {
        let (mut m, [a, b, c]) = allyl();
        m.update_atom_types();
        assert_eq!(m.atom(a).unwrap().atom_type(), Some(AtomType::Cd));
        assert_eq!(m.atom(c).unwrap().atom_type(), Some(AtomType::Cs));
        m.bond_mut(a, b).unwrap();
        assert_eq!(m.atom(a).unwrap().atom_type(), None);
        assert_eq!(m.atom(b).unwrap().atom_type(), None);
        assert_eq!(m.atom(c).unwrap().atom_type(), Some(AtomType::Cs));
    }

    #[test]
    fn lone_pairs_of_water_and_carbonyl() {
        let mut water = Molecule::new();
        water.add_atom(Atom::new(Element::O).with_implicit_hydrogens(2));
        water.update_lone_pairs();
        let o = water.atoms().next().unwrap();
        assert_eq!(water.atom(o).unwrap().lone_pairs, 2);

        let mut formaldehyde = Molecule::from_parts(
            vec![carbon().with_implicit_hydrogens(2), Atom::new(Element::O)],
            vec![(0, 1, Bond::double())],
        )
        .unwrap();
        formaldehyde.update_lone_pairs();
        let atoms: Vec<_> = formaldehyde.atoms().collect();
        assert_eq!(formaldehyde.atom(atoms[0]).unwrap().lone_pairs, 0);
        assert_eq!(formaldehyde.atom(atoms[1]).unwrap().lone_pairs, 2);
    }

    #[test]
    fn allyl_shift_moves_radical_and_double_bond() {
        let (m, [a, b, c]) = allyl();
        let isomers = m.adjacent_resonance_isomers();
        assert_eq!(isomers.len(), 1);
        let iso = &isomers[0];
        assert_eq!(iso.atom(a).unwrap().radical_electrons, 1);
        assert_eq!(iso.atom(c).unwrap().radical_electrons, 0);
        assert!(iso.bond(a, b).unwrap().is_single());
        assert!(iso.bond(b, c).unwrap().is_double());
        assert!(iso.is_isomorphic(&m));
        // the source is untouched
        assert_eq!(m.atom(c).unwrap().radical_electrons, 1);
    }

    #[test]
    fn closed_shell_has_no_adjacent_isomers() {
        assert!(cyclopropane().adjacent_resonance_isomers().is_empty());
    }

    #[test]
    fn deep_copy_is_independent() {
        let (m, [a, ..]) = allyl();
        let mut copy = m.clone();
        assert_eq!(copy, m);
        copy.atom_mut(a).unwrap().formal_charge = 1;
        assert_ne!(copy, m);
        assert_eq!(m.atom(a).unwrap().formal_charge, 0);
        assert!(!copy.is_isomorphic(&m));
    }

    #[test]
    fn split_and_merge_fragments() {
        let mut m = cyclopropane();
        let mapping = m.merge(cyclopropane());
        assert_eq!(mapping.len(), 3);
        assert_eq!(m.atom_count(), 6);
        assert_eq!(m.smallest_set_of_smallest_rings().len(), 2);
        let parts = m.split();
        assert_eq!(parts.len(), 2);
        assert!(parts[0].is_isomorphic(&parts[1]));
    }

    #[test]
    fn from_parts_rejects_bad_positions() {
        let err = Molecule::from_parts(vec![carbon()], vec![(0, 3, Bond::single())]);
        assert!(matches!(err, Err(GraphError::InvalidStructure(_))));
    }

    #[test]
    fn radical_counting() {
        let (m, _) = allyl();
        assert_eq!(m.radical_count(), 1);
        assert!(m.is_radical());
        assert!(!cyclopropane().is_radical());
    }
}
