//! VF2-style graph and subgraph isomorphism.
//!
//! The search runs over an explicit stack of frames, one per assigned query
//! vertex, instead of recursion. The query side's vertices are placed in a
//! fixed order chosen up front: each next vertex is the one with the most
//! already-placed neighbours (ties broken by connectivity values, then by
//! insertion position), so every step after the first in a component is
//! anchored to the mapped frontier. Candidates for an anchored vertex are
//! the target neighbours of its anchor's image; an unanchored vertex (the
//! first of a component) may go to any unmapped target vertex.
//!
//! Vertex and edge labels are compared through [`Equivalent`] or through
//! caller-supplied predicates; the matcher itself knows nothing about what
//! the labels mean.

use std::cmp::Reverse;

use petgraph::stable_graph::NodeIndex;
use tracing::trace;

use crate::error::{GraphError, Result};
use crate::graph::Graph;
use crate::traits::Equivalent;

/// Vertex correspondence as `(vertex of self, vertex of other)` pairs.
pub type VertexMapping = Vec<(NodeIndex, NodeIndex)>;

impl<V, E> Graph<V, E> {
    /// True if some bijection between the vertices of `self` and `other`
    /// preserves adjacency exactly and pairs equivalent labels.
    pub fn is_isomorphic<V2, E2>(&self, other: &Graph<V2, E2>) -> bool
    where
        V: Equivalent<V2>,
        E: Equivalent<E2>,
    {
        self.find_isomorphism(other).is_some()
    }

    pub fn find_isomorphism<V2, E2>(&self, other: &Graph<V2, E2>) -> Option<VertexMapping>
    where
        V: Equivalent<V2>,
        E: Equivalent<E2>,
    {
        self.find_isomorphism_by(other, |a, b| a.equivalent(b), |a, b| a.equivalent(b))
    }

    /// Like [`is_isomorphic`](Self::is_isomorphic), with some pairs pinned
    /// in advance.
    ///
    /// Fails with [`GraphError::InvalidMapping`] if a pinned vertex does not
    /// exist or appears twice. A well-formed but unsatisfiable pin is simply
    /// `Ok(false)`.
    pub fn is_isomorphic_with<V2, E2>(
        &self,
        other: &Graph<V2, E2>,
        initial: &[(NodeIndex, NodeIndex)],
    ) -> Result<bool>
    where
        V: Equivalent<V2>,
        E: Equivalent<E2>,
    {
        Ok(self.find_isomorphism_with(other, initial)?.is_some())
    }

    pub fn find_isomorphism_with<V2, E2>(
        &self,
        other: &Graph<V2, E2>,
        initial: &[(NodeIndex, NodeIndex)],
    ) -> Result<Option<VertexMapping>>
    where
        V: Equivalent<V2>,
        E: Equivalent<E2>,
    {
        let found = full_matches(
            self,
            other,
            |a: &V, b: &V2| a.equivalent(b),
            |a: &E, b: &E2| a.equivalent(b),
            initial,
            Some(1),
        )?;
        Ok(found.into_iter().next())
    }

    /// Full isomorphism with explicit label predicates.
    pub fn find_isomorphism_by<V2, E2>(
        &self,
        other: &Graph<V2, E2>,
        vertex_match: impl Fn(&V, &V2) -> bool,
        edge_match: impl Fn(&E, &E2) -> bool,
    ) -> Option<VertexMapping> {
        full_matches(self, other, vertex_match, edge_match, &[], Some(1))
            .ok()
            .and_then(|found| found.into_iter().next())
    }

    /// Every automorphism-distinct mapping of `self` onto `other`.
    pub fn find_isomorphisms<V2, E2>(&self, other: &Graph<V2, E2>) -> Vec<VertexMapping>
    where
        V: Equivalent<V2>,
        E: Equivalent<E2>,
    {
        full_matches(
            self,
            other,
            |a: &V, b: &V2| a.equivalent(b),
            |a: &E, b: &E2| a.equivalent(b),
            &[],
            None,
        )
        .unwrap_or_default()
    }

    /// True if `pattern` embeds into `self`: every pattern edge must map to
    /// a host edge, but the host may have extra vertices and edges.
    pub fn is_subgraph_isomorphic<PV, PE>(&self, pattern: &Graph<PV, PE>) -> bool
    where
        V: Equivalent<PV>,
        E: Equivalent<PE>,
    {
        sub_matches(
            self,
            pattern,
            |h: &V, p: &PV| h.equivalent(p),
            |h: &E, p: &PE| h.equivalent(p),
            &[],
            Some(1),
        )
        .is_ok_and(|found| !found.is_empty())
    }

    /// Subgraph test with `(host vertex, pattern vertex)` pairs pinned.
    pub fn is_subgraph_isomorphic_with<PV, PE>(
        &self,
        pattern: &Graph<PV, PE>,
        initial: &[(NodeIndex, NodeIndex)],
    ) -> Result<bool>
    where
        V: Equivalent<PV>,
        E: Equivalent<PE>,
    {
        let found = sub_matches(
            self,
            pattern,
            |h: &V, p: &PV| h.equivalent(p),
            |h: &E, p: &PE| h.equivalent(p),
            initial,
            Some(1),
        )?;
        Ok(!found.is_empty())
    }

    /// All embeddings of `pattern` into `self`, as `(host, pattern)` pairs.
    pub fn find_subgraph_isomorphisms<PV, PE>(&self, pattern: &Graph<PV, PE>) -> Vec<VertexMapping>
    where
        V: Equivalent<PV>,
        E: Equivalent<PE>,
    {
        self.find_subgraph_isomorphisms_by(pattern, |h, p| h.equivalent(p), |h, p| h.equivalent(p))
    }

    /// All embeddings of `pattern` into `self` under explicit predicates.
    pub fn find_subgraph_isomorphisms_by<PV, PE>(
        &self,
        pattern: &Graph<PV, PE>,
        vertex_match: impl Fn(&V, &PV) -> bool,
        edge_match: impl Fn(&E, &PE) -> bool,
    ) -> Vec<VertexMapping> {
        sub_matches(self, pattern, vertex_match, edge_match, &[], None).unwrap_or_default()
    }
}

fn full_matches<V, E, V2, E2>(
    this: &Graph<V, E>,
    other: &Graph<V2, E2>,
    vertex_match: impl Fn(&V, &V2) -> bool,
    edge_match: impl Fn(&E, &E2) -> bool,
    initial: &[(NodeIndex, NodeIndex)],
    limit: Option<usize>,
) -> Result<Vec<VertexMapping>> {
    validate_pins(this, other, initial)?;
    if this.vertex_count() != other.vertex_count()
        || this.edge_count() != other.edge_count()
        || degree_sequence(this) != degree_sequence(other)
    {
        return Ok(Vec::new());
    }
    let mut matcher = Matcher::new(this, other, vertex_match, edge_match, Mode::Full);
    if !matcher.pin(initial) {
        return Ok(Vec::new());
    }
    Ok(matcher.search(limit))
}

fn sub_matches<V, E, PV, PE>(
    host: &Graph<V, E>,
    pattern: &Graph<PV, PE>,
    vertex_match: impl Fn(&V, &PV) -> bool,
    edge_match: impl Fn(&E, &PE) -> bool,
    initial: &[(NodeIndex, NodeIndex)],
    limit: Option<usize>,
) -> Result<Vec<VertexMapping>> {
    validate_pins(host, pattern, initial)?;
    if pattern.vertex_count() > host.vertex_count() || pattern.edge_count() > host.edge_count() {
        return Ok(Vec::new());
    }
    let flipped: VertexMapping = initial.iter().map(|&(h, p)| (p, h)).collect();
    let mut matcher = Matcher::new(
        pattern,
        host,
        |p: &PV, h: &V| vertex_match(h, p),
        |p: &PE, h: &E| edge_match(h, p),
        Mode::Subgraph,
    );
    if !matcher.pin(&flipped) {
        return Ok(Vec::new());
    }
    Ok(matcher
        .search(limit)
        .into_iter()
        .map(|m| m.into_iter().map(|(p, h)| (h, p)).collect())
        .collect())
}

fn validate_pins<A, B, C, D>(
    left: &Graph<A, B>,
    right: &Graph<C, D>,
    initial: &[(NodeIndex, NodeIndex)],
) -> Result<()> {
    for (i, &(l, r)) in initial.iter().enumerate() {
        if !left.has_vertex(l) {
            return Err(GraphError::InvalidMapping(format!(
                "vertex {} is not in the first graph",
                l.index()
            )));
        }
        if !right.has_vertex(r) {
            return Err(GraphError::InvalidMapping(format!(
                "vertex {} is not in the second graph",
                r.index()
            )));
        }
        if initial[..i].iter().any(|&(l2, r2)| l2 == l || r2 == r) {
            return Err(GraphError::InvalidMapping(format!(
                "pair ({}, {}) reuses an already pinned vertex",
                l.index(),
                r.index()
            )));
        }
    }
    Ok(())
}

fn degree_sequence<V, E>(g: &Graph<V, E>) -> Vec<usize> {
    let mut degrees: Vec<usize> = g.vertices().map(|v| g.degree(v)).collect();
    degrees.sort_unstable();
    degrees
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Mode {
    /// Bijection; adjacency preserved in both directions.
    Full,
    /// Injection of the query into the target; query edges must exist in
    /// the target, target edges need not exist in the query.
    Subgraph,
}

struct Frame {
    query: NodeIndex,
    candidates: Vec<NodeIndex>,
    next: usize,
    assigned: Option<NodeIndex>,
}

struct Matcher<'a, QV, QE, TV, TE, FV, FE> {
    query: &'a Graph<QV, QE>,
    target: &'a Graph<TV, TE>,
    vertex_match: FV,
    edge_match: FE,
    mode: Mode,
    order: Vec<NodeIndex>,
    q_to_t: Vec<Option<NodeIndex>>,
    t_to_q: Vec<Option<NodeIndex>>,
    // Connectivity values are invariants only for full isomorphism.
    connectivity: Option<(Vec<[u32; 3]>, Vec<[u32; 3]>)>,
}

impl<'a, QV, QE, TV, TE, FV, FE> Matcher<'a, QV, QE, TV, TE, FV, FE>
where
    FV: Fn(&QV, &TV) -> bool,
    FE: Fn(&QE, &TE) -> bool,
{
    fn new(
        query: &'a Graph<QV, QE>,
        target: &'a Graph<TV, TE>,
        vertex_match: FV,
        edge_match: FE,
        mode: Mode,
    ) -> Self {
        let connectivity = (mode == Mode::Full)
            .then(|| (query.connectivity_table(), target.connectivity_table()));
        Self {
            query,
            target,
            vertex_match,
            edge_match,
            mode,
            order: Vec::new(),
            q_to_t: vec![None; query.node_bound()],
            t_to_q: vec![None; target.node_bound()],
            connectivity,
        }
    }

    /// Apply pinned pairs (already validated as existing and distinct),
    /// then fix the placement order of the remaining query vertices.
    /// Returns false if a pin is infeasible.
    fn pin(&mut self, initial: &[(NodeIndex, NodeIndex)]) -> bool {
        for &(q, t) in initial {
            if !self.is_feasible(q, t) {
                return false;
            }
            self.assign(q, t);
        }
        self.order = self.placement_order();
        true
    }

    fn placement_order(&self) -> Vec<NodeIndex> {
        let conn = self.query.connectivity_table();
        let position = self.query.positions();
        let mut placed: Vec<bool> = self.q_to_t.iter().map(Option::is_some).collect();
        let mut remaining: Vec<NodeIndex> = self
            .query
            .vertices()
            .filter(|v| !placed[v.index()])
            .collect();
        let mut order = Vec::with_capacity(remaining.len());

        while !remaining.is_empty() {
            let best = remaining
                .iter()
                .enumerate()
                .min_by_key(|&(_, &v)| {
                    let anchored = self
                        .query
                        .neighbors(v)
                        .filter(|n| placed[n.index()])
                        .count();
                    (Reverse(anchored), Reverse(conn[v.index()]), position[v.index()])
                })
                .map(|(i, _)| i);
            let Some(i) = best else { break };
            let v = remaining.remove(i);
            placed[v.index()] = true;
            order.push(v);
        }
        order
    }

    fn frame_for(&self, q: NodeIndex) -> Frame {
        let anchor = self
            .query
            .sorted_neighbors(q)
            .into_iter()
            .find_map(|n| self.q_to_t[n.index()]);
        let candidates = match anchor {
            Some(t_anchor) => self
                .target
                .sorted_neighbors(t_anchor)
                .into_iter()
                .filter(|t| self.t_to_q[t.index()].is_none())
                .collect(),
            None => self
                .target
                .vertices()
                .filter(|t| self.t_to_q[t.index()].is_none())
                .collect(),
        };
        Frame {
            query: q,
            candidates,
            next: 0,
            assigned: None,
        }
    }

    fn is_feasible(&self, q: NodeIndex, t: NodeIndex) -> bool {
        if self.q_to_t[q.index()].is_some() || self.t_to_q[t.index()].is_some() {
            return false;
        }
        let q_degree = self.query.degree(q);
        let t_degree = self.target.degree(t);
        match self.mode {
            Mode::Full => {
                if q_degree != t_degree {
                    return false;
                }
                if let Some((qc, tc)) = &self.connectivity {
                    if qc[q.index()] != tc[t.index()] {
                        return false;
                    }
                }
            }
            Mode::Subgraph => {
                if t_degree < q_degree {
                    return false;
                }
            }
        }
        if !(self.vertex_match)(&self.query[q], &self.target[t]) {
            return false;
        }

        let mut q_mapped = 0usize;
        for (qn, q_edge) in self.query.incident_edges(q) {
            let Some(tn) = self.q_to_t[qn.index()] else {
                continue;
            };
            q_mapped += 1;
            match self.target.edge(t, tn) {
                Ok(t_edge) => {
                    if !(self.edge_match)(q_edge, t_edge) {
                        return false;
                    }
                }
                Err(_) => return false,
            }
        }

        let t_mapped = self
            .target
            .neighbors(t)
            .filter(|tn| self.t_to_q[tn.index()].is_some())
            .count();
        match self.mode {
            // An edge in the target between mapped vertices must exist in
            // the query too.
            Mode::Full => t_mapped == q_mapped,
            // Room for the query vertex's still-unmapped neighbours.
            Mode::Subgraph => t_degree - t_mapped >= q_degree - q_mapped,
        }
    }

    fn assign(&mut self, q: NodeIndex, t: NodeIndex) {
        self.q_to_t[q.index()] = Some(t);
        self.t_to_q[t.index()] = Some(q);
    }

    fn unassign(&mut self, q: NodeIndex, t: NodeIndex) {
        self.q_to_t[q.index()] = None;
        self.t_to_q[t.index()] = None;
    }

    fn current_mapping(&self) -> VertexMapping {
        self.query
            .vertices()
            .filter_map(|q| self.q_to_t[q.index()].map(|t| (q, t)))
            .collect()
    }

    /// Depth-first search over the frame stack. Stops after `limit`
    /// complete mappings if given.
    fn search(&mut self, limit: Option<usize>) -> Vec<VertexMapping> {
        let mut results = Vec::new();
        if self.order.is_empty() {
            results.push(self.current_mapping());
            return results;
        }

        let mut expanded = 0usize;
        let mut stack = vec![self.frame_for(self.order[0])];
        while let Some(frame) = stack.last_mut() {
            if let Some(t) = frame.assigned.take() {
                self.unassign(frame.query, t);
            }

            let mut chosen = None;
            while frame.next < frame.candidates.len() {
                let t = frame.candidates[frame.next];
                frame.next += 1;
                if self.is_feasible(frame.query, t) {
                    chosen = Some(t);
                    break;
                }
            }

            let Some(t) = chosen else {
                stack.pop();
                continue;
            };
            let q = frame.query;
            frame.assigned = Some(t);
            self.assign(q, t);
            expanded += 1;

            let depth = stack.len();
            if depth == self.order.len() {
                results.push(self.current_mapping());
                if limit.is_some_and(|n| results.len() >= n) {
                    break;
                }
            } else {
                let next = self.frame_for(self.order[depth]);
                stack.push(next);
            }
        }

        trace!(
            mode = ?self.mode,
            expanded,
            found = results.len(),
            "isomorphism search finished"
        );
        results
    }
}
