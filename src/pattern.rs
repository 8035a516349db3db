use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::element::Element;
use crate::graph::Graph;
use crate::molecule::Molecule;
use crate::traits::Equivalent;

pub type MoleculePattern = Graph<AtomPattern, BondPattern>;

/// Query atom. An empty list accepts any value; otherwise the atom's value
/// must be one of those listed.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct AtomPattern {
    pub elements: Vec<Element>,
    pub radical_electrons: Vec<u8>,
    pub formal_charges: Vec<i8>,
}

impl AtomPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn element(element: Element) -> Self {
        Self::any().with_elements([element])
    }

    pub fn with_elements(mut self, elements: impl IntoIterator<Item = Element>) -> Self {
        self.elements = elements.into_iter().collect();
        self
    }

    pub fn with_radical_electrons(mut self, counts: impl IntoIterator<Item = u8>) -> Self {
        self.radical_electrons = counts.into_iter().collect();
        self
    }

    pub fn with_formal_charges(mut self, charges: impl IntoIterator<Item = i8>) -> Self {
        self.formal_charges = charges.into_iter().collect();
        self
    }

    pub fn matches(&self, atom: &Atom) -> bool {
        accepts(&self.elements, &atom.element)
            && accepts(&self.radical_electrons, &atom.radical_electrons)
            && accepts(&self.formal_charges, &atom.formal_charge)
    }
}

impl From<&Atom> for AtomPattern {
    /// Exact pattern for one atom.
    fn from(atom: &Atom) -> Self {
        Self {
            elements: vec![atom.element],
            radical_electrons: vec![atom.radical_electrons],
            formal_charges: vec![atom.formal_charge],
        }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct BondPattern {
    pub orders: Vec<BondOrder>,
}

impl BondPattern {
    pub fn any() -> Self {
        Self::default()
    }

    pub fn new(orders: impl IntoIterator<Item = BondOrder>) -> Self {
        Self {
            orders: orders.into_iter().collect(),
        }
    }

    pub fn matches(&self, bond: &Bond) -> bool {
        accepts(&self.orders, &bond.order)
    }
}

impl From<&Bond> for BondPattern {
    fn from(bond: &Bond) -> Self {
        Self::new([bond.order])
    }
}

fn accepts<T: PartialEq>(allowed: &[T], value: &T) -> bool {
    allowed.is_empty() || allowed.contains(value)
}

impl Equivalent<AtomPattern> for Atom {
    fn equivalent(&self, pattern: &AtomPattern) -> bool {
        pattern.matches(self)
    }
}

impl Equivalent<BondPattern> for Bond {
    fn equivalent(&self, pattern: &BondPattern) -> bool {
        pattern.matches(self)
    }
}

/// Exact pattern with the molecule's topology and handles. Implicit
/// hydrogen counts are not part of the pattern.
pub fn pattern_from_molecule(mol: &Molecule) -> MoleculePattern {
    mol.graph()
        .map(|_, atom| AtomPattern::from(atom), |bond| BondPattern::from(bond))
}

#[cfg(test)]
mod tests {
    use super::*;

    fn carbonyl() -> MoleculePattern {
        let mut p = MoleculePattern::new();
        let c = p.add_vertex(AtomPattern::element(Element::C));
        let o = p.add_vertex(AtomPattern::element(Element::O));
        p.add_edge(c, o, BondPattern::new([BondOrder::Double])).unwrap();
        p
    }

    fn acetaldehyde() -> Molecule {
        Molecule::from_parts(
            vec![
                Atom::new(Element::C).with_implicit_hydrogens(3),
                Atom::new(Element::C).with_implicit_hydrogens(1),
                Atom::new(Element::O),
            ],
            vec![(0, 1, Bond::single()), (1, 2, Bond::double())],
        )
        .unwrap()
    }

    #[test]
    fn empty_lists_are_wildcards() {
        let any = AtomPattern::any();
        assert!(any.matches(&Atom::new(Element::Fe).with_formal_charge(3)));
        assert!(BondPattern::any().matches(&Bond::triple()));
    }

    #[test]
    fn listed_values_restrict() {
        let p = AtomPattern::any()
            .with_elements([Element::C, Element::N])
            .with_radical_electrons([1]);
        assert!(p.matches(&Atom::new(Element::N).with_radical_electrons(1)));
        assert!(!p.matches(&Atom::new(Element::N)));
        assert!(!p.matches(&Atom::new(Element::O).with_radical_electrons(1)));
    }

    #[test]
    fn carbonyl_found_in_acetaldehyde() {
        let mol = acetaldehyde();
        let pattern = carbonyl();
        assert!(mol.is_subgraph_isomorphic(&pattern));
        let hits = mol.find_subgraph_isomorphisms(&pattern);
        assert_eq!(hits.len(), 1);
        let atoms: Vec<_> = mol.atoms().collect();
        assert!(hits[0].contains(&(atoms[1], pattern.vertices().next().unwrap())));
    }

    #[test]
    fn pinned_carbonyl_carbon() {
        let mol = acetaldehyde();
        let pattern = carbonyl();
        let atoms: Vec<_> = mol.atoms().collect();
        let c = pattern.vertices().next().unwrap();
        assert!(mol.is_subgraph_isomorphic_with(&pattern, &[(atoms[1], c)]).unwrap());
        assert!(!mol.is_subgraph_isomorphic_with(&pattern, &[(atoms[0], c)]).unwrap());
    }

    #[test]
    fn single_bond_pattern_rejects_double() {
        let mut p = MoleculePattern::new();
        let c = p.add_vertex(AtomPattern::element(Element::C));
        let o = p.add_vertex(AtomPattern::element(Element::O));
        p.add_edge(c, o, BondPattern::new([BondOrder::Single])).unwrap();
        assert!(!acetaldehyde().is_subgraph_isomorphic(&p));
    }

    #[test]
    fn exact_pattern_matches_its_source() {
        let mol = acetaldehyde();
        let pattern = pattern_from_molecule(&mol);
        assert_eq!(pattern.vertex_count(), 3);
        assert!(mol.is_subgraph_isomorphic(&pattern));
    }
}
