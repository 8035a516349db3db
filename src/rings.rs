//! Ring perception: cycle rank and the smallest set of smallest rings.
//!
//! The SSSR is a minimum cycle basis picked greedily from a candidate pool.
//! The pool holds the shortest cycle through every edge left out of a
//! breadth-first spanning forest, plus Horton's candidates (for every vertex
//! `w` and edge `(u, v)`, the cycle closed by the shortest paths `w..u` and
//! `w..v` when those paths meet only at `w`). Candidates are sorted by
//! length, then by the sorted insertion positions of their vertices, and
//! accepted while they are linearly independent over GF(2) as edge sets.
//! Selection stops once the number of rings equals the cycle rank.

use std::collections::VecDeque;

use petgraph::stable_graph::NodeIndex;
use petgraph::unionfind::UnionFind;
use tracing::{debug, instrument};

use crate::error::Result;
use crate::graph::Graph;

impl<V, E> Graph<V, E> {
    /// First Betti number: `|E| - |V| + components`, which is the number
    /// of edges that close a cycle over a spanning forest.
    pub fn cycle_rank(&self) -> usize {
        let mut forest = UnionFind::<usize>::new(self.node_bound());
        let tree_edges = self
            .edges()
            .filter(|&(a, b, _)| forest.union(a.index(), b.index()))
            .count();
        self.edge_count() - tree_edges
    }

    pub fn is_cyclic(&self) -> bool {
        self.cycle_rank() > 0
    }

    /// True if the edge `a - b` lies on some cycle.
    pub fn is_edge_in_cycle(&self, a: NodeIndex, b: NodeIndex) -> Result<bool> {
        self.edge_id(a, b)?;
        Ok(self.shortest_path_avoiding(a, b, Some((a, b))).is_some())
    }

    /// True if any edge at `v` lies on a cycle.
    pub fn is_vertex_in_cycle(&self, v: NodeIndex) -> Result<bool> {
        self.vertex(v)?;
        Ok(self
            .neighbors(v)
            .any(|n| self.shortest_path_avoiding(v, n, Some((v, n))).is_some()))
    }

    /// Minimum cycle basis as rings of vertices.
    ///
    /// Each ring starts at its vertex with the lowest insertion position
    /// and continues towards the lower-positioned of that vertex's two ring
    /// neighbours. Rings are ordered by size, then by their position
    /// sequences. Acyclic and single-vertex graphs give no rings.
    #[instrument(skip_all, name = "sssr", fields(vertices = self.vertex_count(), edges = self.edge_count()))]
    pub fn smallest_set_of_smallest_rings(&self) -> Vec<Vec<NodeIndex>> {
        let expected = self.cycle_rank();
        if expected == 0 {
            return Vec::new();
        }

        let position = self.positions();
        let mut pool = self.extra_edge_cycles();
        pool.extend(self.horton_candidates());

        let mut keyed: Vec<(Vec<usize>, Vec<NodeIndex>)> = pool
            .into_iter()
            .filter(|ring| ring.len() >= 3)
            .map(|ring| {
                let ring = normalize_ring(&ring, &position);
                let mut members: Vec<usize> = ring.iter().map(|v| position[v.index()]).collect();
                members.sort_unstable();
                (members, ring)
            })
            .collect();
        keyed.sort_by(|a, b| {
            a.1.len()
                .cmp(&b.1.len())
                .then_with(|| a.0.cmp(&b.0))
                .then_with(|| ring_positions(&a.1, &position).cmp(&ring_positions(&b.1, &position)))
        });
        keyed.dedup_by(|a, b| a.1 == b.1);
        let candidates = keyed.len();

        let mut basis: Vec<Vec<u64>> = Vec::with_capacity(expected);
        let mut rings = Vec::with_capacity(expected);
        for (_, ring) in keyed {
            if rings.len() == expected {
                break;
            }
            let Some(bits) = self.edge_bits(&ring) else {
                continue;
            };
            if try_add_to_basis(&mut basis, bits) {
                rings.push(ring);
            }
        }

        rings.sort_by(|a, b| {
            a.len()
                .cmp(&b.len())
                .then_with(|| ring_positions(a, &position).cmp(&ring_positions(b, &position)))
        });
        debug!(expected, candidates, found = rings.len(), "perceived rings");
        rings
    }

    /// Shortest cycle through each edge outside a breadth-first spanning
    /// forest.
    fn extra_edge_cycles(&self) -> Vec<Vec<NodeIndex>> {
        let mut in_tree = vec![false; self.edge_bound()];
        let mut visited = vec![false; self.node_bound()];
        for root in self.vertices() {
            if visited[root.index()] {
                continue;
            }
            visited[root.index()] = true;
            let mut queue = VecDeque::from([root]);
            while let Some(current) = queue.pop_front() {
                for next in self.sorted_neighbors(current) {
                    if visited[next.index()] {
                        continue;
                    }
                    visited[next.index()] = true;
                    if let Ok(id) = self.edge_id(current, next) {
                        in_tree[id.index()] = true;
                    }
                    queue.push_back(next);
                }
            }
        }

        self.edges()
            .filter(|&(a, b, _)| {
                self.edge_id(a, b)
                    .map(|id| !in_tree[id.index()])
                    .unwrap_or(false)
            })
            .filter_map(|(a, b, _)| self.shortest_path_avoiding(a, b, Some((a, b))))
            .collect()
    }

    fn horton_candidates(&self) -> Vec<Vec<NodeIndex>> {
        let mut candidates = Vec::new();
        for root in self.vertices() {
            let (dist, pred) = self.bfs_tree(root);
            for (u, v, _) in self.edges() {
                let (Some(du), Some(dv)) = (dist[u.index()], dist[v.index()]) else {
                    continue;
                };
                if du + dv + 1 < 3 {
                    continue;
                }
                let to_u = walk_back(&pred, root, u);
                let to_v = walk_back(&pred, root, v);
                if to_u[1..].iter().any(|x| to_v[1..].contains(x)) {
                    continue;
                }
                let mut ring = to_u;
                ring.extend(to_v[1..].iter().rev());
                candidates.push(ring);
            }
        }
        candidates
    }

    fn bfs_tree(&self, root: NodeIndex) -> (Vec<Option<usize>>, Vec<Option<NodeIndex>>) {
        let mut dist = vec![None; self.node_bound()];
        let mut pred = vec![None; self.node_bound()];
        dist[root.index()] = Some(0);
        let mut queue = VecDeque::from([root]);
        while let Some(current) = queue.pop_front() {
            let d = dist[current.index()].unwrap_or(0);
            for next in self.sorted_neighbors(current) {
                if dist[next.index()].is_none() {
                    dist[next.index()] = Some(d + 1);
                    pred[next.index()] = Some(current);
                    queue.push_back(next);
                }
            }
        }
        (dist, pred)
    }

    /// Ring as a bit set over edge handles. `None` if consecutive ring
    /// members are not bonded.
    fn edge_bits(&self, ring: &[NodeIndex]) -> Option<Vec<u64>> {
        let mut bits = vec![0u64; self.edge_bound().div_ceil(64)];
        for (i, &a) in ring.iter().enumerate() {
            let b = ring[(i + 1) % ring.len()];
            let id = self.edge_id(a, b).ok()?.index();
            bits[id / 64] |= 1u64 << (id % 64);
        }
        Some(bits)
    }
}

/// Path from `root` to `to` following breadth-first predecessors.
fn walk_back(pred: &[Option<NodeIndex>], root: NodeIndex, to: NodeIndex) -> Vec<NodeIndex> {
    let mut path = vec![to];
    let mut node = to;
    while node != root {
        match pred[node.index()] {
            Some(p) => {
                path.push(p);
                node = p;
            }
            None => break,
        }
    }
    path.reverse();
    path
}

fn ring_positions(ring: &[NodeIndex], position: &[usize]) -> Vec<usize> {
    ring.iter().map(|v| position[v.index()]).collect()
}

fn normalize_ring(ring: &[NodeIndex], position: &[usize]) -> Vec<NodeIndex> {
    let Some(start) = (0..ring.len()).min_by_key(|&i| position[ring[i].index()]) else {
        return Vec::new();
    };
    let len = ring.len();
    let mut out: Vec<NodeIndex> = (0..len).map(|i| ring[(start + i) % len]).collect();
    if len > 2 && position[out[1].index()] > position[out[len - 1].index()] {
        out[1..].reverse();
    }
    out
}

/// Reduce `candidate` against the basis; keep it if anything survives.
fn try_add_to_basis(basis: &mut Vec<Vec<u64>>, mut candidate: Vec<u64>) -> bool {
    for row in basis.iter() {
        if let Some(p) = leading_bit(row) {
            if candidate[p / 64] & (1u64 << (p % 64)) != 0 {
                xor_into(&mut candidate, row);
            }
        }
    }
    if candidate.iter().all(|&w| w == 0) {
        return false;
    }
    basis.push(candidate);
    true
}

fn leading_bit(bits: &[u64]) -> Option<usize> {
    bits.iter()
        .enumerate()
        .find(|&(_, &w)| w != 0)
        .map(|(i, &w)| i * 64 + w.trailing_zeros() as usize)
}

fn xor_into(a: &mut [u64], b: &[u64]) {
    for (x, y) in a.iter_mut().zip(b) {
        *x ^= *y;
    }
}
