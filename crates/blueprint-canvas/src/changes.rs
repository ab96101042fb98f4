//! Incremental change sets emitted by the canvas UI
//!
//! A batch of changes is applied in order to one collection. A batch is
//! significant when it adds or removes something; position and selection
//! updates are cosmetic and never reach the undo history.

use serde::{Deserialize, Serialize};

use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, EdgeId, NodeId, Position};
use crate::validation::validate_connection_in;

/// A structural change to the node collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum NodeChange {
    Add {
        item: CanvasNode,
    },
    Remove {
        id: NodeId,
    },
    /// Drag update
    Position {
        id: NodeId,
        position: Option<Position>,
        #[serde(default)]
        dragging: bool,
    },
    Select {
        id: NodeId,
        selected: bool,
    },
}

/// A structural change to the edge collection
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum EdgeChange {
    Add { item: CanvasEdge },
    Remove { id: EdgeId },
    Select { id: EdgeId, selected: bool },
}

/// Something that may or may not be a significant change
pub trait Significance {
    /// Whether this change must be captured in undo history
    fn is_significant(&self) -> bool;
}

impl Significance for NodeChange {
    fn is_significant(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::Remove { .. })
    }
}

impl Significance for EdgeChange {
    fn is_significant(&self) -> bool {
        matches!(self, Self::Add { .. } | Self::Remove { .. })
    }
}

/// Classify a batch: significant if any change in it is
pub fn is_significant_batch<C: Significance>(changes: &[C]) -> bool {
    changes.iter().any(Significance::is_significant)
}

/// Outcome of applying a change batch
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub struct ChangeSummary {
    /// Number of changes that modified the graph
    pub applied: usize,
    /// Number of changes dropped (unknown IDs, rejected edges)
    pub dropped: usize,
    /// Whether the batch was classified as significant
    pub significant: bool,
}

/// Apply node changes to a working copy of the graph
///
/// Removing a node also removes its incident edges.
pub fn apply_node_changes(graph: &mut CanvasGraph, changes: &[NodeChange]) -> ChangeSummary {
    let mut summary = ChangeSummary {
        significant: is_significant_batch(changes),
        ..ChangeSummary::default()
    };

    for change in changes {
        let applied = match change {
            NodeChange::Add { item } => {
                if graph.contains_node(&item.id) {
                    log::debug!("Ignoring add of existing node '{}'", item.id);
                    false
                } else {
                    graph.nodes.push(item.clone());
                    true
                }
            }
            NodeChange::Remove { id } => graph.remove_node_cascade(id).is_some(),
            NodeChange::Position { id, position, .. } => match graph.find_node_mut(id) {
                Some(node) => {
                    if let Some(position) = position {
                        node.position = *position;
                    }
                    true
                }
                None => false,
            },
            NodeChange::Select { id, selected } => match graph.find_node_mut(id) {
                Some(node) => {
                    node.selected = *selected;
                    true
                }
                None => false,
            },
        };
        if applied {
            summary.applied += 1;
        } else {
            summary.dropped += 1;
        }
    }

    summary
}

/// Apply edge changes to a working copy of the graph
///
/// Added edges go through the same validation as user connections and
/// are dropped when rejected.
pub fn apply_edge_changes(graph: &mut CanvasGraph, changes: &[EdgeChange]) -> ChangeSummary {
    let mut summary = ChangeSummary {
        significant: is_significant_batch(changes),
        ..ChangeSummary::default()
    };

    for change in changes {
        let applied = match change {
            EdgeChange::Add { item } => {
                if graph.edges.iter().any(|e| e.id == item.id) {
                    false
                } else {
                    match validate_connection_in(graph, &item.connection()) {
                        Ok(()) => {
                            graph.edges.push(item.clone());
                            true
                        }
                        Err(rejection) => {
                            log::debug!("Dropping edge '{}': {}", item.id, rejection);
                            false
                        }
                    }
                }
            }
            EdgeChange::Remove { id } => {
                let before = graph.edges.len();
                graph.edges.retain(|e| &e.id != id);
                graph.edges.len() != before
            }
            EdgeChange::Select { id, selected } => match graph.find_edge_mut(id) {
                Some(edge) => {
                    edge.selected = *selected;
                    true
                }
                None => false,
            },
        };
        if applied {
            summary.applied += 1;
        } else {
            summary.dropped += 1;
        }
    }

    summary
}
