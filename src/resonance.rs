//! Resonance isomer enumeration.
//!
//! [`enumerate_isomers`] is a breadth-first worklist over a list of forms:
//! each form, in list order, is expanded with a [`MoveGenerator`], and every
//! candidate not structurally equal to a form already in the list is
//! finalized and appended. The list is both the result and the queue, so
//! the loop ends once the last appended form has been expanded. It knows
//! nothing about chemistry; [`Molecule`] plugs in through [`ResonanceForm`]
//! and its radical-shift moves.

use tracing::{debug, instrument, trace};

use crate::molecule::Molecule;

/// Produces the forms one move away from a given form.
pub trait MoveGenerator<M> {
    fn adjacent(&self, form: &M) -> Vec<M>;
}

impl<M, F> MoveGenerator<M> for F
where
    F: Fn(&M) -> Vec<M>,
{
    fn adjacent(&self, form: &M) -> Vec<M> {
        self(form)
    }
}

/// A form that can be deduplicated and finalized by the worklist.
pub trait ResonanceForm {
    /// True if both describe the same structure.
    fn same_structure(&self, other: &Self) -> bool;

    /// Called once on each newly accepted form before it is stored.
    fn finalize(&mut self) {}
}

impl ResonanceForm for Molecule {
    fn same_structure(&self, other: &Self) -> bool {
        self.is_isomorphic(other)
    }

    fn finalize(&mut self) {
        self.update_atom_types();
    }
}

/// Radical shifts along allyl-type paths; see
/// [`Molecule::adjacent_resonance_isomers`].
#[derive(Debug, Clone, Copy, Default)]
pub struct RadicalShift;

impl MoveGenerator<Molecule> for RadicalShift {
    fn adjacent(&self, form: &Molecule) -> Vec<Molecule> {
        form.adjacent_resonance_isomers()
    }
}

/// Expand `isomers` in place until no new form appears. Returns the number
/// of forms appended.
#[instrument(skip_all, name = "resonance", fields(seeds = isomers.len()))]
pub fn enumerate_isomers<M, G>(isomers: &mut Vec<M>, generator: &G) -> usize
where
    M: ResonanceForm,
    G: MoveGenerator<M> + ?Sized,
{
    let seeds = isomers.len();
    let mut index = 0;
    while index < isomers.len() {
        let candidates = generator.adjacent(&isomers[index]);
        trace!(index, candidates = candidates.len(), "expanding form");
        for mut candidate in candidates {
            if isomers.iter().any(|known| known.same_structure(&candidate)) {
                continue;
            }
            candidate.finalize();
            isomers.push(candidate);
        }
        index += 1;
    }
    let added = isomers.len() - seeds;
    debug!(added, total = isomers.len(), "resonance enumeration finished");
    added
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::atom::Atom;
    use crate::bond::Bond;
    use crate::element::Element;

    #[derive(Debug, Clone, PartialEq)]
    struct Cyclic {
        value: u32,
        finalized: bool,
    }

    impl ResonanceForm for Cyclic {
        fn same_structure(&self, other: &Self) -> bool {
            self.value == other.value
        }

        fn finalize(&mut self) {
            self.finalized = true;
        }
    }

    fn form(value: u32) -> Cyclic {
        Cyclic {
            value,
            finalized: false,
        }
    }

    #[test]
    fn synthetic_cycle_closes() {
        let step = |f: &Cyclic| vec![form((f.value + 1) % 5), form((f.value + 4) % 5)];
        let mut forms = vec![form(0)];
        let added = enumerate_isomers(&mut forms, &step);
        assert_eq!(added, 4);
        let values: Vec<u32> = forms.iter().map(|f| f.value).collect();
        assert_eq!(values, vec![0, 1, 4, 2, 3]);
        assert!(!forms[0].finalized);
        assert!(forms[1..].iter().all(|f| f.finalized));
    }

    #[test]
    fn no_moves_means_no_growth() {
        let none = |_: &Cyclic| Vec::new();
        let mut forms = vec![form(7)];
        assert_eq!(enumerate_isomers(&mut forms, &none), 0);
        assert_eq!(forms, vec![form(7)]);
    }

    #[test]
    fn rerun_adds_nothing() {
        let step = |f: &Cyclic| vec![form((f.value + 1) % 3)];
        let mut forms = vec![form(0)];
        enumerate_isomers(&mut forms, &step);
        let before = forms.len();
        assert_eq!(enumerate_isomers(&mut forms, &step), 0);
        assert_eq!(forms.len(), before);
    }

    #[test]
    fn pentadienyl_has_three_forms() {
        // CH2=CH-CH=CH-CH2*
        let mol = Molecule::from_parts(
            vec![
                Atom::new(Element::C).with_implicit_hydrogens(2),
                Atom::new(Element::C).with_implicit_hydrogens(1),
                Atom::new(Element::C).with_implicit_hydrogens(1),
                Atom::new(Element::C).with_implicit_hydrogens(1),
                Atom::new(Element::C)
                    .with_implicit_hydrogens(2)
                    .with_radical_electrons(1),
            ],
            vec![
                (0, 1, Bond::double()),
                (1, 2, Bond::single()),
                (2, 3, Bond::double()),
                (3, 4, Bond::single()),
            ],
        )
        .unwrap();
        let mut forms = vec![mol];
        let added = enumerate_isomers(&mut forms, &RadicalShift);
        // terminal radicals are mirror images; the central one is distinct
        assert_eq!(added, 1);
        let centre = forms[1].atoms().nth(2).unwrap();
        assert_eq!(forms[1].atom(centre).unwrap().radical_electrons, 1);
        assert!(forms[1].atom(centre).unwrap().atom_type().is_some());
    }
}
