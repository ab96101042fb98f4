//! Connection validation for canvas graphs
//!
//! Rejects self-loops, parallel edges and dangling endpoints. Validation
//! is side-effect free; the store decides what to do with a rejection.

use std::collections::HashSet;

use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, Connection};

/// Reason a candidate connection was not admitted
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ConnectionRejection {
    /// Source and target are the same node
    SelfLoop { node_id: String },
    /// An edge already joins the same pair, in either direction
    Duplicate { existing_edge_id: String },
    /// An endpoint does not reference a node on the canvas
    UnknownEndpoint { node_id: String },
}

impl std::fmt::Display for ConnectionRejection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            Self::SelfLoop { node_id } => {
                write!(f, "Node '{}' cannot connect to itself", node_id)
            }
            Self::Duplicate { existing_edge_id } => {
                write!(f, "Nodes are already connected by edge '{}'", existing_edge_id)
            }
            Self::UnknownEndpoint { node_id } => {
                write!(f, "Connection references unknown node '{}'", node_id)
            }
        }
    }
}

impl std::error::Error for ConnectionRejection {}

/// Validate a candidate connection against the existing edges
///
/// Accepts unless the candidate is a self-loop or an edge already connects
/// the same unordered pair.
pub fn validate_connection(
    existing_edges: &[CanvasEdge],
    candidate: &Connection,
) -> Result<(), ConnectionRejection> {
    if candidate.source == candidate.target {
        return Err(ConnectionRejection::SelfLoop {
            node_id: candidate.source.clone(),
        });
    }

    if let Some(existing) = existing_edges
        .iter()
        .find(|e| candidate.same_pair(&e.source, &e.target))
    {
        return Err(ConnectionRejection::Duplicate {
            existing_edge_id: existing.id.clone(),
        });
    }

    Ok(())
}

/// Validate a candidate connection, also requiring both endpoints to exist
pub fn validate_connection_in(
    graph: &CanvasGraph,
    candidate: &Connection,
) -> Result<(), ConnectionRejection> {
    validate_connection(&graph.edges, candidate)?;
    for endpoint in [&candidate.source, &candidate.target] {
        if !graph.contains_node(endpoint) {
            return Err(ConnectionRejection::UnknownEndpoint {
                node_id: endpoint.clone(),
            });
        }
    }
    Ok(())
}

/// Rebuild the edge list of a loaded graph so every edge satisfies the invariants
///
/// Edges are admitted in order; later edges that would be a self-loop,
/// a duplicate of an earlier edge, or dangle are dropped. Duplicate node
/// IDs keep their first occurrence. Returns the rejections for logging.
pub fn sanitize_graph(graph: &mut CanvasGraph) -> Vec<ConnectionRejection> {
    let mut seen_nodes: HashSet<String> = HashSet::new();
    let nodes: Vec<CanvasNode> = std::mem::take(&mut graph.nodes)
        .into_iter()
        .filter(|n| seen_nodes.insert(n.id.clone()))
        .collect();
    graph.nodes = nodes;

    let mut rejections = Vec::new();
    let candidates = std::mem::take(&mut graph.edges);
    for edge in candidates {
        match validate_connection_in(graph, &edge.connection()) {
            Ok(()) => graph.edges.push(edge),
            Err(rejection) => rejections.push(rejection),
        }
    }
    rejections
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::{NodeData, NodeKind, Position};

    fn node(id: &str) -> CanvasNode {
        CanvasNode::new(id, NodeKind::Generic, Position::default(), NodeData::labeled(id))
    }

    fn graph_with_edge() -> CanvasGraph {
        let mut graph = CanvasGraph::new();
        graph.nodes.extend([node("a"), node("b"), node("c")]);
        graph.edges.push(CanvasEdge::new("e1", "a", "b"));
        graph
    }

    #[test]
    fn test_rejects_self_loop() {
        let result = validate_connection(&[], &Connection::new("a", "a"));
        assert_eq!(
            result,
            Err(ConnectionRejection::SelfLoop {
                node_id: "a".to_string()
            })
        );
    }

    #[test]
    fn test_rejects_duplicate_in_either_direction() {
        let graph = graph_with_edge();

        let same = validate_connection(&graph.edges, &Connection::new("a", "b"));
        assert!(matches!(same, Err(ConnectionRejection::Duplicate { .. })));

        let reversed = validate_connection(&graph.edges, &Connection::new("b", "a"));
        assert!(matches!(reversed, Err(ConnectionRejection::Duplicate { .. })));
    }

    #[test]
    fn test_accepts_new_pair() {
        let graph = graph_with_edge();
        assert!(validate_connection(&graph.edges, &Connection::new("b", "c")).is_ok());
        assert!(validate_connection_in(&graph, &Connection::new("a", "c")).is_ok());
    }

    #[test]
    fn test_rejects_unknown_endpoint() {
        let graph = graph_with_edge();
        let result = validate_connection_in(&graph, &Connection::new("a", "ghost"));
        assert_eq!(
            result,
            Err(ConnectionRejection::UnknownEndpoint {
                node_id: "ghost".to_string()
            })
        );
    }

    #[test]
    fn test_sanitize_graph() {
        let mut graph = graph_with_edge();
        graph.nodes.push(node("a"));
        graph.edges.push(CanvasEdge::new("e2", "b", "a"));
        graph.edges.push(CanvasEdge::new("e3", "c", "c"));
        graph.edges.push(CanvasEdge::new("e4", "c", "gone"));
        graph.edges.push(CanvasEdge::new("e5", "b", "c"));

        let rejections = sanitize_graph(&mut graph);

        assert_eq!(rejections.len(), 3);
        assert_eq!(graph.nodes.len(), 3);
        let ids: Vec<&str> = graph.edges.iter().map(|e| e.id.as_str()).collect();
        assert_eq!(ids, vec!["e1", "e5"]);
    }
}
