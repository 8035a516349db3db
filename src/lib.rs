pub mod atom;
pub mod bond;
pub mod element;
pub mod error;
pub mod formula;
pub mod graph;
pub mod hydrogen;
pub mod isomorphism;
pub mod molecule;
pub mod pattern;
pub mod resonance;
pub mod rings;
pub mod species;
pub mod symmetry;
pub mod traits;

pub use atom::{Atom, AtomType};
pub use bond::{Bond, BondOrder, ParseBondOrderError};
pub use element::{Element, ParseElementError};
pub use error::{GraphError, Result};
pub use formula::{formula, molecular_weight};
pub use graph::Graph;
pub use hydrogen::{add_hydrogens, remove_hydrogens};
pub use isomorphism::VertexMapping;
pub use molecule::Molecule;
pub use pattern::{pattern_from_molecule, AtomPattern, BondPattern, MoleculePattern};
pub use petgraph::stable_graph::{EdgeIndex, NodeIndex};
pub use resonance::{enumerate_isomers, MoveGenerator, RadicalShift, ResonanceForm};
pub use species::Species;
pub use traits::Equivalent;
