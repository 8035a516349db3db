//! External symmetry number estimation.
//!
//! The estimate is a product of local factors, each found by comparing the
//! groups hanging off an atom, a bond or a ring with pinned isomorphism
//! tests:
//!
//! * an sp3-like centre with interchangeable substituents contributes the
//!   size of its rotation group (CH4: 12, CH3-X: 3, CH2X2: 2, *CH3: 6,
//!   NH3: 3, H2O: 2);
//! * a centre with two double bonds to equivalent groups contributes 2;
//! * a single or triple bond whose two halves are equivalent contributes 2;
//! * a double bond whose ends each carry either nothing or two equivalent
//!   single-bonded substituents contributes 2, and a further 2 if its two
//!   halves are equivalent;
//! * a ring sharing no atom with another ring contributes the number of its
//!   rotations and reflections that extend to a symmetry of the whole
//!   molecule, treating the ring as planar (cyclopropane: 6, aromatic
//!   benzene: 12).
//!
//! Fused ring systems and the twisted axis of cumulenes are not modelled
//! and contribute 1.

use petgraph::stable_graph::NodeIndex;
use tracing::{debug, instrument};

use crate::atom::Atom;
use crate::bond::{Bond, BondOrder};
use crate::graph::Graph;
use crate::molecule::Molecule;
use crate::traits::Equivalent;

type Skeleton = Graph<Atom, Bond>;

impl Molecule {
    /// Estimated external symmetry number; at least 1.
    ///
    /// Returned as `f64`: the product grows geometrically with the number
    /// of symmetric groups (3 per methyl) and is consumed as a divisor of
    /// partition functions.
    #[instrument(skip_all, name = "symmetry_number", fields(atoms = self.atom_count()))]
    pub fn symmetry_number(&self) -> f64 {
        let explicit = self.with_explicit_hydrogens();
        let graph = explicit.graph();
        let atoms: f64 = graph
            .vertices()
            .map(|v| f64::from(atom_factor(graph, v)))
            .product();
        let bonds: f64 = graph
            .edges()
            .map(|(a, b, bond)| f64::from(bond_factor(graph, a, b, bond)))
            .product();
        let rings: f64 = isolated_rings(explicit.smallest_set_of_smallest_rings())
            .map(|ring| f64::from(ring_factor(graph, ring)))
            .product();
        debug!(atoms, bonds, rings, "estimated symmetry number");
        atoms * bonds * rings
    }
}

fn atom_factor(graph: &Skeleton, centre: NodeIndex) -> u32 {
    if graph.degree(centre) < 2 {
        return 1;
    }
    let (mut single, mut double) = (0u8, 0u8);
    for (_, bond) in graph.incident_edges(centre) {
        match bond.order {
            BondOrder::Single => single += 1,
            BondOrder::Double => double += 1,
            _ => return 1,
        }
    }
    let Some(classes) = substituent_classes(graph, centre) else {
        return 1;
    };
    let radicals = graph[centre].radical_electrons;
    match (radicals, single, double, classes.as_slice()) {
        (0, 4, 0, [4]) => 12,
        (0, 4, 0, [3, 1]) => 3,
        (0, 4, 0, [2, 2]) => 2,
        (1, 3, 0, [3]) => 6,
        (1, 3, 0, [2, 1]) => 2,
        (0, 3, 0, [3]) => 3,
        (0 | 2, 2, 0, [2]) => 2,
        (_, 0, 2, [2]) => 2,
        _ => 1,
    }
}

/// Sizes of the classes of interchangeable substituents around `centre`,
/// largest first. `None` if two neighbours are joined through the rest of
/// the molecule (a ring atom).
fn substituent_classes(graph: &Skeleton, centre: NodeIndex) -> Option<Vec<usize>> {
    let mut rest = graph.clone();
    rest.remove_vertex(centre).ok()?;
    let groups = rest.split();

    // (attachment atom, bond to centre, group index, class size)
    let mut classes: Vec<(NodeIndex, &Bond, usize, usize)> = Vec::new();
    let mut used = Vec::new();
    for neighbor in graph.sorted_neighbors(centre) {
        let group = groups.iter().position(|g| g.has_vertex(neighbor))?;
        if used.contains(&group) {
            return None;
        }
        used.push(group);
        let bond = graph.edge(centre, neighbor).ok()?;
        let existing = classes.iter_mut().find(|(rep, rep_bond, rep_group, _)| {
            (*rep_bond).equivalent(bond)
                && groups[*rep_group]
                    .is_isomorphic_with(&groups[group], &[(*rep, neighbor)])
                    .unwrap_or(false)
        });
        match existing {
            Some(class) => class.3 += 1,
            None => classes.push((neighbor, bond, group, 1)),
        }
    }

    let mut sizes: Vec<usize> = classes.iter().map(|c| c.3).collect();
    sizes.sort_unstable_by(|a, b| b.cmp(a));
    Some(sizes)
}

fn bond_factor(graph: &Skeleton, a: NodeIndex, b: NodeIndex, bond: &Bond) -> u32 {
    match bond.order {
        BondOrder::Single | BondOrder::Triple => {
            if halves_match(graph, a, b) {
                2
            } else {
                1
            }
        }
        BondOrder::Double => {
            if !(is_balanced_end(graph, a, b) && is_balanced_end(graph, b, a)) {
                1
            } else if halves_match(graph, a, b) {
                4
            } else {
                2
            }
        }
        BondOrder::Aromatic => 1,
    }
}

/// True if cutting `a - b` leaves two pieces that map onto each other with
/// `a` sent to `b`.
fn halves_match(graph: &Skeleton, a: NodeIndex, b: NodeIndex) -> bool {
    let mut cut = graph.clone();
    if cut.remove_edge(a, b).is_err() {
        return false;
    }
    let pieces = cut.split();
    let side_a = pieces.iter().position(|p| p.has_vertex(a));
    let side_b = pieces.iter().position(|p| p.has_vertex(b));
    match (side_a, side_b) {
        (Some(pa), Some(pb)) if pa != pb => pieces[pa]
            .is_isomorphic_with(&pieces[pb], &[(a, b)])
            .unwrap_or(false),
        _ => false,
    }
}

/// Rings that share no atom with any other ring.
fn isolated_rings(rings: &[Vec<NodeIndex>]) -> impl Iterator<Item = &Vec<NodeIndex>> + '_ {
    rings.iter().enumerate().filter_map(move |(i, ring)| {
        let fused = rings
            .iter()
            .enumerate()
            .any(|(j, other)| j != i && other.iter().any(|v| ring.contains(v)));
        (!fused).then_some(ring)
    })
}

/// Rotations and reflections of `ring` that extend to an automorphism of
/// the whole graph.
///
/// A reflection stands for a two-fold axis in the ring plane, so a ring
/// atom on that axis with two exocyclic substituents must swap them.
fn ring_factor(graph: &Skeleton, ring: &[NodeIndex]) -> u32 {
    let n = ring.len();
    let mut count = 0;
    for reflect in [false, true] {
        for shift in 0..n {
            let mut pins: Vec<(NodeIndex, NodeIndex)> = Vec::with_capacity(n + 2);
            for i in 0..n {
                let j = if reflect { (shift + n - i) % n } else { (shift + i) % n };
                pins.push((ring[i], ring[j]));
                if reflect && i == j {
                    let exocyclic: Vec<NodeIndex> = graph
                        .neighbors(ring[i])
                        .filter(|v| !ring.contains(v))
                        .collect();
                    if let [x, y] = exocyclic[..] {
                        pins.push((x, y));
                        pins.push((y, x));
                    }
                }
            }
            if graph.is_isomorphic_with(graph, &pins).unwrap_or(false) {
                count += 1;
            }
        }
    }
    count.max(1)
}

/// A double-bond end is balanced when, apart from `partner`, it carries no
/// substituents or exactly two equivalent single-bonded ones.
fn is_balanced_end(graph: &Skeleton, end: NodeIndex, partner: NodeIndex) -> bool {
    let others: Vec<(NodeIndex, &Bond)> = graph
        .incident_edges(end)
        .filter(|&(n, _)| n != partner)
        .collect();
    match others.as_slice() {
        [] => true,
        [(x, bx), (y, by)] if bx.is_single() && by.is_single() => {
            let mut rest = graph.clone();
            if rest.remove_vertex(end).is_err() {
                return false;
            }
            let groups = rest.split();
            let gx = groups.iter().position(|g| g.has_vertex(*x));
            let gy = groups.iter().position(|g| g.has_vertex(*y));
            match (gx, gy) {
                (Some(gx), Some(gy)) if gx != gy => groups[gx]
                    .is_isomorphic_with(&groups[gy], &[(*x, *y)])
                    .unwrap_or(false),
                _ => false,
            }
        }
        _ => false,
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::element::Element;

    fn build(atoms: &[(Element, u8, u8)], bonds: &[(usize, usize, BondOrder)]) -> Molecule {
        Molecule::from_parts(
            atoms
                .iter()
                .map(|&(e, h, r)| {
                    Atom::new(e)
                        .with_implicit_hydrogens(h)
                        .with_radical_electrons(r)
                })
                .collect(),
            bonds
                .iter()
                .map(|&(i, j, order)| (i, j, Bond::new(order)))
                .collect(),
        )
        .unwrap()
    }

    use BondOrder::{Double, Single, Triple};
    use Element::{Cl, C, H, N, O};

    #[test]
    fn alkanes() {
        assert_eq!(build(&[(C, 4, 0)], &[]).symmetry_number(), 12.0);
        assert_eq!(build(&[(C, 3, 0), (C, 3, 0)], &[(0, 1, Single)]).symmetry_number(), 18.0);
        let propane = build(
            &[(C, 3, 0), (C, 2, 0), (C, 3, 0)],
            &[(0, 1, Single), (1, 2, Single)],
        );
        assert_eq!(propane.symmetry_number(), 18.0);
    }

    #[test]
    fn methyl_radical() {
        assert_eq!(build(&[(C, 3, 1)], &[]).symmetry_number(), 6.0);
    }

    #[test]
    fn chloromethanes() {
        let ch3cl = build(&[(C, 3, 0), (Cl, 0, 0)], &[(0, 1, Single)]);
        assert_eq!(ch3cl.symmetry_number(), 3.0);
        let ch2cl2 = build(&[(C, 2, 0), (Cl, 0, 0), (Cl, 0, 0)], &[(0, 1, Single), (0, 2, Single)]);
        assert_eq!(ch2cl2.symmetry_number(), 2.0);
    }

    #[test]
    fn hydrides() {
        assert_eq!(build(&[(O, 2, 0)], &[]).symmetry_number(), 2.0);
        assert_eq!(build(&[(N, 3, 0)], &[]).symmetry_number(), 3.0);
        assert_eq!(build(&[(O, 1, 0), (O, 1, 0)], &[(0, 1, Single)]).symmetry_number(), 2.0);
        assert_eq!(build(&[(H, 0, 0), (H, 0, 0)], &[(0, 1, Single)]).symmetry_number(), 2.0);
    }

    #[test]
    fn double_bonds() {
        let ethylene = build(&[(C, 2, 0), (C, 2, 0)], &[(0, 1, Double)]);
        assert_eq!(ethylene.symmetry_number(), 4.0);
        let formaldehyde = build(&[(C, 2, 0), (O, 0, 0)], &[(0, 1, Double)]);
        assert_eq!(formaldehyde.symmetry_number(), 2.0);
        let propene = build(
            &[(C, 3, 0), (C, 1, 0), (C, 2, 0)],
            &[(0, 1, Single), (1, 2, Double)],
        );
        assert_eq!(propene.symmetry_number(), 3.0);
        let co2 = build(&[(O, 0, 0), (C, 0, 0), (O, 0, 0)], &[(0, 1, Double), (1, 2, Double)]);
        assert_eq!(co2.symmetry_number(), 2.0);
    }

    #[test]
    fn acetylene() {
        let m = build(&[(C, 1, 0), (C, 1, 0)], &[(0, 1, Triple)]);
        assert_eq!(m.symmetry_number(), 2.0);
    }

    #[test]
    fn isolated_rings_count_their_symmetries() {
        let cyclopropane = build(
            &[(C, 2, 0), (C, 2, 0), (C, 2, 0)],
            &[(0, 1, Single), (1, 2, Single), (2, 0, Single)],
        );
        assert_eq!(cyclopropane.symmetry_number(), 6.0);

        let ring: Vec<_> = (0..6).map(|i| (i, (i + 1) % 6)).collect();
        let benzene = build(
            &[(C, 1, 0); 6],
            &ring.iter().map(|&(i, j)| (i, j, BondOrder::Aromatic)).collect::<Vec<_>>(),
        );
        assert_eq!(benzene.symmetry_number(), 12.0);

        // alternating orders keep only every second rotation
        let kekule = build(
            &[(C, 1, 0); 6],
            &ring
                .iter()
                .map(|&(i, j)| (i, j, if i % 2 == 0 { Double } else { Single }))
                .collect::<Vec<_>>(),
        );
        assert_eq!(kekule.symmetry_number(), 6.0);
    }

    #[test]
    fn substituted_and_fused_rings() {
        // chlorocyclopropane: the mirror through C-Cl is not a rotation
        let chloro = build(
            &[(C, 1, 0), (C, 2, 0), (C, 2, 0), (Cl, 0, 0)],
            &[(0, 1, Single), (1, 2, Single), (2, 0, Single), (0, 3, Single)],
        );
        assert_eq!(chloro.symmetry_number(), 1.0);

        // bicyclo[1.1.0]butane: fused, not modelled
        let bicyclo = build(
            &[(C, 1, 0), (C, 1, 0), (C, 2, 0), (C, 2, 0)],
            &[(0, 1, Single), (0, 2, Single), (1, 2, Single), (0, 3, Single), (1, 3, Single)],
        );
        assert_eq!(bicyclo.symmetry_number(), 1.0);
    }

    #[test]
    fn many_methyl_groups_do_not_overflow() {
        // CH3-[C(CH3)2]10-CH3
        let mut atoms = vec![(C, 3, 0)];
        let mut bonds = Vec::new();
        for k in 0..10 {
            let backbone = atoms.len();
            atoms.push((C, 0, 0));
            let previous = if k == 0 { 0 } else { backbone - 3 };
            bonds.push((previous, backbone, Single));
            for _ in 0..2 {
                bonds.push((backbone, atoms.len(), Single));
                atoms.push((C, 3, 0));
            }
        }
        let last = atoms.len() - 3;
        bonds.push((last, atoms.len(), Single));
        atoms.push((C, 3, 0));
        let mol = build(&atoms, &bonds);
        assert_eq!(mol.atom_count(), 32);

        // 22 methyl rotors and the C2 axis through the central bond
        let expected = 3f64.powi(22) * 2.0;
        assert_eq!(mol.symmetry_number(), expected);
    }
}
