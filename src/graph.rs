//! Generic undirected graph with labelled vertices and edges.
//!
//! [`Graph`] wraps a petgraph [`StableUnGraph`] so that vertex and edge
//! handles stay valid across removals, and records vertex insertion order
//! separately: every traversal in this crate walks vertices in that order,
//! which keeps results reproducible for identical inputs. At most one edge
//! joins any unordered pair of vertices and self-loops are rejected.
//!
//! Removing a vertex frees its slot and a later insertion may reuse the same
//! handle, exactly as with petgraph's stable graphs.

use std::collections::VecDeque;
use std::fmt;
use std::ops::{Index, IndexMut};

use petgraph::stable_graph::{EdgeIndex, NodeIndex, StableUnGraph};
use petgraph::visit::{EdgeIndexable, EdgeRef, IntoEdgeReferences, NodeIndexable};

use crate::error::{GraphError, Result};

pub struct Graph<V, E> {
    inner: StableUnGraph<V, E>,
    order: Vec<NodeIndex>,
}

impl<V, E> Graph<V, E> {
    pub fn new() -> Self {
        Self {
            inner: StableUnGraph::default(),
            order: Vec::new(),
        }
    }

    pub fn with_capacity(vertices: usize, edges: usize) -> Self {
        Self {
            inner: StableUnGraph::with_capacity(vertices, edges),
            order: Vec::with_capacity(vertices),
        }
    }

    pub fn vertex_count(&self) -> usize {
        self.inner.node_count()
    }

    pub fn edge_count(&self) -> usize {
        self.inner.edge_count()
    }

    pub fn is_empty(&self) -> bool {
        self.order.is_empty()
    }

    pub fn vertices(&self) -> impl Iterator<Item = NodeIndex> + '_ {
        self.order.iter().copied()
    }

    /// Every edge as `(a, b, payload)`, in edge-handle order.
    pub fn edges(&self) -> impl Iterator<Item = (NodeIndex, NodeIndex, &E)> + '_ {
        self.inner
            .edge_references()
            .map(|e| (e.source(), e.target(), e.weight()))
    }

    pub fn has_vertex(&self, v: NodeIndex) -> bool {
        self.inner.contains_node(v)
    }

    pub fn has_edge(&self, a: NodeIndex, b: NodeIndex) -> bool {
        self.has_vertex(a) && self.has_vertex(b) && self.inner.find_edge(a, b).is_some()
    }

    pub fn vertex(&self, v: NodeIndex) -> Result<&V> {
        self.inner
            .node_weight(v)
            .ok_or(GraphError::VertexNotFound { vertex: v })
    }

    pub fn vertex_mut(&mut self, v: NodeIndex) -> Result<&mut V> {
        self.inner
            .node_weight_mut(v)
            .ok_or(GraphError::VertexNotFound { vertex: v })
    }

    pub fn edge(&self, a: NodeIndex, b: NodeIndex) -> Result<&E> {
        let id = self.edge_id(a, b)?;
        Ok(&self.inner[id])
    }

    pub fn edge_mut(&mut self, a: NodeIndex, b: NodeIndex) -> Result<&mut E> {
        let id = self.edge_id(a, b)?;
        Ok(&mut self.inner[id])
    }

    pub fn edge_id(&self, a: NodeIndex, b: NodeIndex) -> Result<EdgeIndex> {
        self.require(a)?;
        self.require(b)?;
        self.inner
            .find_edge(a, b)
            .ok_or(GraphError::EdgeNotFound { a, b })
    }

    pub fn edge_endpoints(&self, e: EdgeIndex) -> Option<(NodeIndex, NodeIndex)> {
        self.inner.edge_endpoints(e)
    }

    pub fn add_vertex(&mut self, vertex: V) -> NodeIndex {
        let v = self.inner.add_node(vertex);
        self.order.push(v);
        v
    }

    /// Fails without modifying the graph if either endpoint is missing, if
    /// the endpoints coincide, or if they are already connected.
    pub fn add_edge(&mut self, a: NodeIndex, b: NodeIndex, edge: E) -> Result<EdgeIndex> {
        for v in [a, b] {
            if !self.has_vertex(v) {
                return Err(GraphError::NotMember { vertex: v });
            }
        }
        if a == b {
            return Err(GraphError::SelfLoop { vertex: a });
        }
        if self.has_edge(a, b) {
            return Err(GraphError::DuplicateEdge { a, b });
        }
        Ok(self.inner.add_edge(a, b, edge))
    }

    /// Add `vertex` joined to `parent` by `edge`. `None` if `parent` is absent.
    pub fn add_leaf(&mut self, parent: NodeIndex, vertex: V, edge: E) -> Option<NodeIndex> {
        if !self.has_vertex(parent) {
            return None;
        }
        let leaf = self.add_vertex(vertex);
        self.inner.add_edge(parent, leaf, edge);
        Some(leaf)
    }

    pub fn remove_vertex(&mut self, v: NodeIndex) -> Result<V> {
        let vertex = self
            .inner
            .remove_node(v)
            .ok_or(GraphError::VertexNotFound { vertex: v })?;
        self.order.retain(|&u| u != v);
        Ok(vertex)
    }

    pub fn remove_edge(&mut self, a: NodeIndex, b: NodeIndex) -> Result<E> {
        let id = self.edge_id(a, b)?;
        self.inner
            .remove_edge(id)
            .ok_or(GraphError::EdgeNotFound { a, b })
    }

    /// Neighbours of `v`; empty if `v` is not a vertex.
    pub fn neighbors(&self, v: NodeIndex) -> impl Iterator<Item = NodeIndex> + '_ {
        self.has_vertex(v)
            .then(|| self.inner.neighbors(v))
            .into_iter()
            .flatten()
    }

    pub fn degree(&self, v: NodeIndex) -> usize {
        self.neighbors(v).count()
    }

    /// Edges incident to `v`, each paired with the vertex at the far end.
    pub fn incident_edges(&self, v: NodeIndex) -> impl Iterator<Item = (NodeIndex, &E)> + '_ {
        self.has_vertex(v)
            .then(|| self.inner.edges(v))
            .into_iter()
            .flatten()
            .map(move |e| {
                let other = if e.source() == v { e.target() } else { e.source() };
                (other, e.weight())
            })
    }

    /// Build a graph with the same topology and handles but transformed
    /// payloads.
    pub fn map<'a, V2, E2>(
        &'a self,
        mut vertex_map: impl FnMut(NodeIndex, &'a V) -> V2,
        mut edge_map: impl FnMut(&'a E) -> E2,
    ) -> Graph<V2, E2> {
        Graph {
            inner: self.inner.map(|v, w| vertex_map(v, w), |_, w| edge_map(w)),
            order: self.order.clone(),
        }
    }

    /// Copy the topology while borrowing the payloads.
    ///
    /// The copy can be restructured freely (vertices and edges removed or
    /// added) without touching `self`; the vertex and edge payloads
    /// themselves are shared. Use `clone()` for a fully independent copy.
    pub fn copy_shallow(&self) -> Graph<&V, &E> {
        self.map(|_, v| v, |e| e)
    }

    /// Keep only the vertices for which `keep` returns true.
    pub fn retain_vertices(&mut self, mut keep: impl FnMut(NodeIndex, &V) -> bool) {
        let doomed: Vec<NodeIndex> = self
            .vertices()
            .filter(|&v| !keep(v, &self.inner[v]))
            .collect();
        for v in doomed {
            self.inner.remove_node(v);
        }
        let inner = &self.inner;
        self.order.retain(|&v| inner.contains_node(v));
    }

    /// Move every vertex and edge of `other` into `self`.
    ///
    /// Returns `(old handle in other, new handle in self)` pairs in the
    /// insertion order of `other`.
    pub fn merge(&mut self, mut other: Graph<V, E>) -> Vec<(NodeIndex, NodeIndex)> {
        let edge_ids: Vec<EdgeIndex> = other.inner.edge_indices().collect();
        let mut edges = Vec::with_capacity(edge_ids.len());
        for id in edge_ids {
            if let Some((a, b)) = other.inner.edge_endpoints(id) {
                if let Some(w) = other.inner.remove_edge(id) {
                    edges.push((a, b, w));
                }
            }
        }

        let mut remap = vec![None; other.inner.node_bound()];
        let mut pairs = Vec::with_capacity(other.order.len());
        for v in std::mem::take(&mut other.order) {
            if let Some(w) = other.inner.remove_node(v) {
                let new = self.add_vertex(w);
                remap[v.index()] = Some(new);
                pairs.push((v, new));
            }
        }
        for (a, b, w) in edges {
            if let (Some(na), Some(nb)) = (remap[a.index()], remap[b.index()]) {
                self.inner.add_edge(na, nb, w);
            }
        }
        pairs
    }

    /// Connected components, each listed in insertion order. Components are
    /// ordered by the insertion position of their first vertex.
    pub fn connected_components(&self) -> Vec<Vec<NodeIndex>> {
        let position = self.positions();
        let mut visited = vec![false; self.node_bound()];
        let mut components = Vec::new();
        for start in self.vertices() {
            if visited[start.index()] {
                continue;
            }
            visited[start.index()] = true;
            let mut component = vec![start];
            let mut queue = VecDeque::from([start]);
            while let Some(current) = queue.pop_front() {
                for neighbor in self.neighbors(current) {
                    if !visited[neighbor.index()] {
                        visited[neighbor.index()] = true;
                        component.push(neighbor);
                        queue.push_back(neighbor);
                    }
                }
            }
            component.sort_by_key(|v| position[v.index()]);
            components.push(component);
        }
        components
    }

    pub fn is_connected(&self) -> bool {
        self.connected_components().len() <= 1
    }

    /// Shortest path from `from` to `to` by breadth-first search, endpoints
    /// included. `None` if the vertices are disconnected or absent.
    pub fn shortest_path(&self, from: NodeIndex, to: NodeIndex) -> Option<Vec<NodeIndex>> {
        self.shortest_path_avoiding(from, to, None)
    }

    pub(crate) fn shortest_path_avoiding(
        &self,
        from: NodeIndex,
        to: NodeIndex,
        skip: Option<(NodeIndex, NodeIndex)>,
    ) -> Option<Vec<NodeIndex>> {
        if !self.has_vertex(from) || !self.has_vertex(to) {
            return None;
        }
        if from == to {
            return Some(vec![from]);
        }
        let is_skipped = |a: NodeIndex, b: NodeIndex| {
            skip.is_some_and(|(x, y)| (a == x && b == y) || (a == y && b == x))
        };
        let mut pred: Vec<Option<NodeIndex>> = vec![None; self.node_bound()];
        let mut visited = vec![false; self.node_bound()];
        visited[from.index()] = true;
        let mut queue = VecDeque::from([from]);
        while let Some(current) = queue.pop_front() {
            for neighbor in self.sorted_neighbors(current) {
                if visited[neighbor.index()] || is_skipped(current, neighbor) {
                    continue;
                }
                visited[neighbor.index()] = true;
                pred[neighbor.index()] = Some(current);
                if neighbor == to {
                    let mut path = vec![to];
                    let mut node = to;
                    while let Some(p) = pred[node.index()] {
                        path.push(p);
                        node = p;
                    }
                    path.reverse();
                    return Some(path);
                }
                queue.push_back(neighbor);
            }
        }
        None
    }

    /// Three rounds of extended connectivity: the degree, the sum of the
    /// neighbours' degrees, and the sum of the neighbours' second values.
    ///
    /// These are isomorphism invariants. Pairs are in insertion order.
    pub fn connectivity_values(&self) -> Vec<(NodeIndex, [u32; 3])> {
        let table = self.connectivity_table();
        self.vertices().map(|v| (v, table[v.index()])).collect()
    }

    /// Connectivity values indexed by vertex handle.
    pub(crate) fn connectivity_table(&self) -> Vec<[u32; 3]> {
        let mut table = vec![[0u32; 3]; self.node_bound()];
        for v in self.vertices() {
            table[v.index()][0] = self.degree(v) as u32;
        }
        for round in 1..3 {
            for v in self.vertices() {
                let sum = self
                    .neighbors(v)
                    .map(|n| table[n.index()][round - 1])
                    .sum();
                table[v.index()][round] = sum;
            }
        }
        table
    }

    /// Insertion position of every vertex, indexed by handle. Vacant slots
    /// hold `usize::MAX`.
    pub(crate) fn positions(&self) -> Vec<usize> {
        let mut position = vec![usize::MAX; self.node_bound()];
        for (i, v) in self.vertices().enumerate() {
            position[v.index()] = i;
        }
        position
    }

    pub(crate) fn sorted_neighbors(&self, v: NodeIndex) -> Vec<NodeIndex> {
        let mut neighbors: Vec<NodeIndex> = self.neighbors(v).collect();
        neighbors.sort_by_key(|n| self.order.iter().position(|u| u == n));
        neighbors
    }

    pub(crate) fn node_bound(&self) -> usize {
        self.inner.node_bound()
    }

    pub(crate) fn edge_bound(&self) -> usize {
        self.inner.edge_bound()
    }

    fn require(&self, v: NodeIndex) -> Result<()> {
        if self.has_vertex(v) {
            Ok(())
        } else {
            Err(GraphError::VertexNotFound { vertex: v })
        }
    }
}

impl<V: Clone, E: Clone> Graph<V, E> {
    /// One graph per connected component. Each piece keeps the vertex
    /// handles it had in `self`.
    pub fn split(&self) -> Vec<Graph<V, E>> {
        let components = self.connected_components();
        if components.len() <= 1 {
            return components.into_iter().map(|_| self.clone()).collect();
        }
        let mut member = vec![usize::MAX; self.node_bound()];
        for (i, component) in components.iter().enumerate() {
            for v in component {
                member[v.index()] = i;
            }
        }
        (0..components.len())
            .map(|i| {
                let mut piece = self.clone();
                piece.retain_vertices(|v, _| member[v.index()] == i);
                piece
            })
            .collect()
    }
}

impl<V: Clone, E: Clone> Clone for Graph<V, E> {
    fn clone(&self) -> Self {
        Self {
            inner: self.inner.clone(),
            order: self.order.clone(),
        }
    }
}

impl<V, E> Default for Graph<V, E> {
    fn default() -> Self {
        Self::new()
    }
}

impl<V, E> Index<NodeIndex> for Graph<V, E> {
    type Output = V;

    fn index(&self, v: NodeIndex) -> &V {
        &self.inner[v]
    }
}

impl<V, E> IndexMut<NodeIndex> for Graph<V, E> {
    fn index_mut(&mut self, v: NodeIndex) -> &mut V {
        &mut self.inner[v]
    }
}

impl<V: fmt::Debug, E: fmt::Debug> fmt::Debug for Graph<V, E> {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let vertices: Vec<(usize, &V)> = self
            .vertices()
            .map(|v| (v.index(), &self.inner[v]))
            .collect();
        let edges: Vec<(usize, usize, &E)> = self
            .edges()
            .map(|(a, b, e)| (a.index(), b.index(), e))
            .collect();
        f.debug_struct("Graph")
            .field("vertices", &vertices)
            .field("edges", &edges)
            .finish()
    }
}
