use petgraph::stable_graph::NodeIndex;
use thiserror::Error;

/// Errors raised by structural queries and mutations.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum GraphError {
    /// The vertex handle does not refer to a vertex of this graph.
    #[error("vertex {} not found", .vertex.index())]
    VertexNotFound { vertex: NodeIndex },

    #[error("no edge between vertices {} and {}", .a.index(), .b.index())]
    EdgeNotFound { a: NodeIndex, b: NodeIndex },

    /// An edge endpoint is not a member of the graph.
    #[error("vertex {} is not a member of the graph", .vertex.index())]
    NotMember { vertex: NodeIndex },

    #[error("vertices {} and {} are already connected", .a.index(), .b.index())]
    DuplicateEdge { a: NodeIndex, b: NodeIndex },

    #[error("edge would connect vertex {} to itself", .vertex.index())]
    SelfLoop { vertex: NodeIndex },

    /// An initial vertex mapping is malformed.
    #[error("invalid mapping: {0}")]
    InvalidMapping(String),

    /// A requested change would produce an impossible structure.
    #[error("invalid structure: {0}")]
    InvalidStructure(String),
}

pub type Result<T> = std::result::Result<T, GraphError>;
