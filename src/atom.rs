use crate::bond::BondOrder;
use crate::element::Element;
use crate::error::{GraphError, Result};
use crate::traits::Equivalent;

/// Coarse bonding-environment label derived from an atom's element and the
/// orders of its incident bonds: the element, then `s`, `d`, `dd`, `t` or
/// `b` for only single bonds, one double, two doubles, a triple or aromatic.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub enum AtomType {
    H,
    Cs,
    Cd,
    Cdd,
    Ct,
    Cb,
    Os,
    Od,
    Ot,
    Ns,
    Nd,
    Nt,
    Nb,
    Ss,
    Sd,
    Sis,
    Sid,
    Other,
}

impl AtomType {
    pub fn classify(element: Element, orders: impl IntoIterator<Item = BondOrder>) -> AtomType {
        let (mut double, mut triple, mut aromatic) = (0u8, 0u8, 0u8);
        for order in orders {
            match order {
                BondOrder::Single => {}
                BondOrder::Double => double += 1,
                BondOrder::Triple => triple += 1,
                BondOrder::Aromatic => aromatic += 1,
            }
        }
        match element {
            Element::H => AtomType::H,
            Element::C => match (double, triple, aromatic) {
                (0, 0, 0) => AtomType::Cs,
                (1, 0, 0) => AtomType::Cd,
                (2, 0, 0) => AtomType::Cdd,
                (0, 1, 0) => AtomType::Ct,
                (0, 0, _) => AtomType::Cb,
                _ => AtomType::Other,
            },
            Element::O => match (double, triple, aromatic) {
                (0, 0, 0) => AtomType::Os,
                (1, 0, 0) => AtomType::Od,
                (0, 1, 0) => AtomType::Ot,
                _ => AtomType::Other,
            },
            Element::N => match (double, triple, aromatic) {
                (0, 0, 0) => AtomType::Ns,
                (1, 0, 0) => AtomType::Nd,
                (0, 1, 0) => AtomType::Nt,
                (0, 0, _) => AtomType::Nb,
                _ => AtomType::Other,
            },
            Element::S => match (double, triple, aromatic) {
                (0, 0, 0) => AtomType::Ss,
                (1, 0, 0) => AtomType::Sd,
                _ => AtomType::Other,
            },
            Element::Si => match (double, triple, aromatic) {
                (0, 0, 0) => AtomType::Sis,
                (1, 0, 0) => AtomType::Sid,
                _ => AtomType::Other,
            },
            _ => AtomType::Other,
        }
    }
}

/// Chemistry-labelled vertex.
///
/// Equivalence compares element, formal charge, radical electron count and
/// implicit hydrogen count. Lone pairs are derivable from the other fields
/// and may lag behind during resonance moves, so they are not compared.
///
/// ```
/// use chemgraph::{Atom, Element};
///
/// let methyl = Atom::new(Element::C)
///     .with_radical_electrons(1)
///     .with_implicit_hydrogens(3);
/// assert_eq!(methyl.radical_electrons, 1);
/// ```
#[derive(Debug, Clone)]
#[cfg_attr(feature = "serde", derive(serde::Serialize, serde::Deserialize))]
pub struct Atom {
    pub element: Element,
    pub formal_charge: i8,
    pub radical_electrons: u8,
    pub lone_pairs: u8,
    pub implicit_hydrogens: u8,
    /// Free-text tag, e.g. a reaction-template label such as `*1`.
    pub label: String,
    #[cfg_attr(feature = "serde", serde(skip))]
    pub(crate) atom_type: Option<AtomType>,
}

impl Atom {
    pub fn new(element: Element) -> Self {
        Self {
            element,
            formal_charge: 0,
            radical_electrons: 0,
            lone_pairs: 0,
            implicit_hydrogens: 0,
            label: String::new(),
            atom_type: None,
        }
    }

    pub fn with_formal_charge(mut self, charge: i8) -> Self {
        self.formal_charge = charge;
        self
    }

    pub fn with_radical_electrons(mut self, radicals: u8) -> Self {
        self.radical_electrons = radicals;
        self
    }

    pub fn with_lone_pairs(mut self, lone_pairs: u8) -> Self {
        self.lone_pairs = lone_pairs;
        self
    }

    pub fn with_implicit_hydrogens(mut self, count: u8) -> Self {
        self.implicit_hydrogens = count;
        self
    }

    pub fn with_label(mut self, label: impl Into<String>) -> Self {
        self.label = label.into();
        self
    }

    pub fn atom_type(&self) -> Option<AtomType> {
        self.atom_type
    }

    pub fn is_hydrogen(&self) -> bool {
        self.element == Element::H
    }

    pub fn is_carbon(&self) -> bool {
        self.element == Element::C
    }

    /// Spin multiplicity implied by the radical count (high spin).
    pub fn spin_multiplicity(&self) -> u8 {
        self.radical_electrons + 1
    }

    pub fn increment_radical(&mut self) {
        self.radical_electrons += 1;
    }

    pub fn decrement_radical(&mut self) -> Result<()> {
        if self.radical_electrons == 0 {
            return Err(GraphError::InvalidStructure(format!(
                "{} atom has no radical electron to remove",
                self.element
            )));
        }
        self.radical_electrons -= 1;
        Ok(())
    }
}

// The cached atom type is not part of an atom's identity.
impl PartialEq for Atom {
    fn eq(&self, other: &Self) -> bool {
        self.element == other.element
            && self.formal_charge == other.formal_charge
            && self.radical_electrons == other.radical_electrons
            && self.lone_pairs == other.lone_pairs
            && self.implicit_hydrogens == other.implicit_hydrogens
            && self.label == other.label
    }
}

impl Eq for Atom {}

impl Equivalent for Atom {
    fn equivalent(&self, other: &Atom) -> bool {
        if let (Some(a), Some(b)) = (self.atom_type, other.atom_type) {
            if a != b {
                return false;
            }
        }
        self.element == other.element
            && self.formal_charge == other.formal_charge
            && self.radical_electrons == other.radical_electrons
            && self.implicit_hydrogens == other.implicit_hydrogens
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn classify_carbon_environments() {
        use BondOrder::*;
        assert_eq!(AtomType::classify(Element::C, [Single, Single]), AtomType::Cs);
        assert_eq!(AtomType::classify(Element::C, [Double, Single]), AtomType::Cd);
        assert_eq!(AtomType::classify(Element::C, [Double, Double]), AtomType::Cdd);
        assert_eq!(AtomType::classify(Element::C, [Triple, Single]), AtomType::Ct);
        assert_eq!(
            AtomType::classify(Element::C, [Aromatic, Aromatic, Single]),
            AtomType::Cb
        );
        assert_eq!(AtomType::classify(Element::C, []), AtomType::Cs);
    }

    #[test]
    fn classify_heteroatoms() {
        use BondOrder::*;
        assert_eq!(AtomType::classify(Element::O, [Double]), AtomType::Od);
        assert_eq!(AtomType::classify(Element::O, [Single, Single]), AtomType::Os);
        assert_eq!(AtomType::classify(Element::N, [Triple]), AtomType::Nt);
        assert_eq!(AtomType::classify(Element::H, [Single]), AtomType::H);
        assert_eq!(AtomType::classify(Element::Fe, [Single]), AtomType::Other);
    }

    #[test]
    fn equivalence_ignores_lone_pairs_and_label() {
        let a = Atom::new(Element::O).with_lone_pairs(2).with_label("*1");
        let b = Atom::new(Element::O).with_lone_pairs(3);
        assert!(a.equivalent(&b));
    }

    #[test]
    fn equivalence_compares_charge_radicals_and_hydrogens() {
        let c = Atom::new(Element::C);
        assert!(!c.equivalent(&Atom::new(Element::N)));
        assert!(!c.equivalent(&c.clone().with_formal_charge(1)));
        assert!(!c.equivalent(&c.clone().with_radical_electrons(1)));
        assert!(!c.equivalent(&c.clone().with_implicit_hydrogens(2)));
    }

    #[test]
    fn atom_types_reject_only_when_both_known() {
        let mut a = Atom::new(Element::C);
        let mut b = Atom::new(Element::C);
        a.atom_type = Some(AtomType::Cs);
        assert!(a.equivalent(&b));
        b.atom_type = Some(AtomType::Cd);
        assert!(!a.equivalent(&b));
    }

    #[test]
    fn radical_bookkeeping() {
        let mut a = Atom::new(Element::C).with_radical_electrons(1);
        assert_eq!(a.spin_multiplicity(), 2);
        a.decrement_radical().unwrap();
        assert!(a.decrement_radical().is_err());
        assert_eq!(a.radical_electrons, 0);
        a.increment_radical();
        assert_eq!(a.radical_electrons, 1);
    }
}
