use std::fmt;

use tracing::debug;

use crate::molecule::Molecule;
use crate::resonance::{enumerate_isomers, RadicalShift};

/// A chemical species: one or more resonance forms of the same molecule.
#[derive(Debug, Clone, Default)]
pub struct Species {
    pub index: Option<usize>,
    pub label: String,
    pub molecules: Vec<Molecule>,
}

impl Species {
    pub fn new(label: impl Into<String>, molecule: Molecule) -> Self {
        Self {
            index: None,
            label: label.into(),
            molecules: vec![molecule],
        }
    }

    pub fn with_index(mut self, index: usize) -> Self {
        self.index = Some(index);
        self
    }

    /// Fill `molecules` with the resonance isomers of its only molecule.
    ///
    /// Does nothing unless exactly one molecule is present and it has at
    /// least one radical electron, so repeated calls leave the list as the
    /// first call produced it. Returns the number of isomers added.
    pub fn generate_resonance_isomers(&mut self) -> usize {
        if self.molecules.len() != 1 {
            return 0;
        }
        if !self.molecules[0].is_radical() {
            debug!(species = %self, "closed shell, no resonance search");
            return 0;
        }
        enumerate_isomers(&mut self.molecules, &RadicalShift)
    }

    pub fn is_isomorphic(&self, molecule: &Molecule) -> bool {
        self.molecules.iter().any(|m| m.is_isomorphic(molecule))
    }
}

impl fmt::Display for Species {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self.index {
            Some(index) => write!(f, "{}({})", self.label, index),
            None => write!(f, "{}", self.label),
        }
    }
}
