//! The canonical canvas state for one editing session
//!
//! `GraphStore` owns the node and edge collections, the project identity
//! and the undo timeline. Every significant mutation captures a history
//! snapshot and writes the editor snapshot to the persistence backend,
//! if one is attached.
//!
//! Illegal edits are not errors: a rejected connection or an unknown node
//! ID turns the call into a no-op, reported only through the `bool` return.

use crate::changes::{self, ChangeSummary, EdgeChange, NodeChange};
use crate::constants::history::MAX_HISTORY;
use crate::error::Result;
use crate::history::HistoryTimeline;
use crate::persistence::{EditorSnapshot, SnapshotStore};
use crate::types::{CanvasEdge, CanvasGraph, CanvasNode, Connection, NodeData, ProjectIdentity};
use crate::validation::{sanitize_graph, validate_connection_in};

/// Editable canvas with undo/redo history
pub struct GraphStore {
    graph: CanvasGraph,
    identity: ProjectIdentity,
    history: HistoryTimeline,
    persistence: Option<Box<dyn SnapshotStore>>,
}

impl std::fmt::Debug for GraphStore {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("GraphStore")
            .field("nodes", &self.graph.nodes.len())
            .field("edges", &self.graph.edges.len())
            .field("identity", &self.identity)
            .field("history_len", &self.history.len())
            .field("history_index", &self.history.index())
            .field("persistent", &self.persistence.is_some())
            .finish()
    }
}

impl GraphStore {
    /// Create an empty canvas whose timeline holds a single genesis entry
    pub fn new() -> Result<Self> {
        Self::with_graph(CanvasGraph::new(), ProjectIdentity::default(), MAX_HISTORY)
    }

    /// Create a canvas starting from the given graph
    ///
    /// The graph is sanitized first so loaded data cannot violate the edge
    /// invariants. The starting state becomes the genesis history entry.
    pub fn with_graph(
        mut graph: CanvasGraph,
        identity: ProjectIdentity,
        max_history: usize,
    ) -> Result<Self> {
        for rejection in sanitize_graph(&mut graph) {
            log::warn!("Dropping invalid edge from initial graph: {}", rejection);
        }
        let history = HistoryTimeline::seeded(&graph, max_history)?;
        Ok(Self {
            graph,
            identity,
            history,
            persistence: None,
        })
    }

    /// Read the persisted editor snapshot once and start a session from it
    ///
    /// Starts from an empty canvas when nothing has been saved or the saved
    /// snapshot cannot be read. The backend stays attached and receives
    /// every later write.
    pub fn restore(persistence: Box<dyn SnapshotStore>) -> Result<Self> {
        let (graph, identity) = match persistence.load() {
            Ok(Some(snapshot)) => snapshot.into_parts(),
            Ok(None) => (CanvasGraph::new(), ProjectIdentity::default()),
            Err(e) => {
                log::warn!("Ignoring unreadable editor snapshot, starting empty: {}", e);
                (CanvasGraph::new(), ProjectIdentity::default())
            }
        };
        log::info!(
            "Restored canvas '{}' with {} nodes and {} edges",
            identity.project_name,
            graph.nodes.len(),
            graph.edges.len()
        );
        let mut store = Self::with_graph(graph, identity, MAX_HISTORY)?;
        store.persistence = Some(persistence);
        Ok(store)
    }

    /// Attach a persistence backend without reading from it
    pub fn attach_persistence(&mut self, persistence: Box<dyn SnapshotStore>) {
        self.persistence = Some(persistence);
        self.persist();
    }

    /// Current graph
    pub fn graph(&self) -> &CanvasGraph {
        &self.graph
    }

    pub fn nodes(&self) -> &[CanvasNode] {
        &self.graph.nodes
    }

    pub fn edges(&self) -> &[CanvasEdge] {
        &self.graph.edges
    }

    pub fn identity(&self) -> &ProjectIdentity {
        &self.identity
    }

    pub fn history(&self) -> &HistoryTimeline {
        &self.history
    }

    /// Apply a batch of node changes atomically
    ///
    /// Captures history only when the batch adds or removes a node.
    pub fn apply_node_changes(&mut self, changes: &[NodeChange]) -> ChangeSummary {
        let mut working = self.graph.clone();
        let summary = changes::apply_node_changes(&mut working, changes);
        self.graph = working;

        let drag_finished = changes
            .iter()
            .any(|c| matches!(c, NodeChange::Position { dragging: false, .. }));
        self.after_batch(summary, drag_finished);
        summary
    }

    /// Apply a batch of edge changes atomically
    pub fn apply_edge_changes(&mut self, changes: &[EdgeChange]) -> ChangeSummary {
        let mut working = self.graph.clone();
        let summary = changes::apply_edge_changes(&mut working, changes);
        self.graph = working;
        self.after_batch(summary, false);
        summary
    }

    /// Connect two nodes
    ///
    /// Returns false when the connection is a self-loop, duplicates an
    /// existing pair, or references a missing node.
    pub fn connect(&mut self, candidate: Connection) -> bool {
        if let Err(rejection) = validate_connection_in(&self.graph, &candidate) {
            log::debug!("Connection rejected: {}", rejection);
            return false;
        }
        self.graph.edges.push(CanvasEdge::from_connection(&candidate));
        self.record();
        true
    }

    /// Add a node
    ///
    /// Returns false if a node with the same ID already exists.
    pub fn add_node(&mut self, node: CanvasNode) -> bool {
        if self.graph.contains_node(&node.id) {
            log::debug!("Node '{}' already exists", node.id);
            return false;
        }
        self.graph.nodes.push(node);
        self.record();
        true
    }

    /// Delete a node and every edge touching it
    pub fn delete_node(&mut self, id: &str) -> bool {
        match self.graph.remove_node_cascade(id) {
            Some(_) => {
                self.record();
                true
            }
            None => false,
        }
    }

    /// Replace a node's data payload
    pub fn update_node_data(&mut self, id: &str, data: NodeData) -> bool {
        let Some(node) = self.graph.find_node_mut(id) else {
            return false;
        };
        if node.data == data {
            return false;
        }
        node.data = data;
        self.record();
        true
    }

    pub fn set_project_name(&mut self, name: impl Into<String>) {
        self.identity.project_name = name.into();
        self.persist();
    }

    pub fn set_project_id(&mut self, id: Option<String>) {
        self.identity.project_id = id;
        self.persist();
    }

    /// Reset the canvas and project identity
    ///
    /// The timeline is re-seeded with one empty genesis entry, so
    /// `can_undo()` is false afterwards.
    pub fn clear_canvas(&mut self) -> Result<()> {
        self.graph = CanvasGraph::new();
        self.identity = ProjectIdentity::default();
        self.history.reset(&self.graph)?;
        self.persist();
        Ok(())
    }

    /// Capture the current graph as a new history entry
    pub fn push_history(&mut self) -> Result<()> {
        self.history.push(&self.graph)
    }

    /// Step back one history entry
    ///
    /// Returns false at the oldest entry.
    pub fn undo(&mut self) -> Result<bool> {
        match self.history.undo() {
            Some(graph) => {
                self.graph = graph?;
                self.persist();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    /// Step forward one history entry
    ///
    /// Returns false at the newest entry.
    pub fn redo(&mut self) -> Result<bool> {
        match self.history.redo() {
            Some(graph) => {
                self.graph = graph?;
                self.persist();
                Ok(true)
            }
            None => Ok(false),
        }
    }

    pub fn can_undo(&self) -> bool {
        self.history.can_undo()
    }

    pub fn can_redo(&self) -> bool {
        self.history.can_redo()
    }

    /// Capture the editor state as a persistable snapshot
    pub fn snapshot(&self) -> EditorSnapshot {
        EditorSnapshot::capture(&self.graph, &self.identity)
    }

    fn after_batch(&mut self, summary: ChangeSummary, drag_finished: bool) {
        if summary.applied == 0 {
            return;
        }
        if summary.significant {
            self.record();
        } else if drag_finished {
            self.persist();
        }
    }

    /// Significant mutation: snapshot into history, then persist
    fn record(&mut self) {
        if let Err(e) = self.push_history() {
            log::warn!("Failed to capture history snapshot: {}", e);
        }
        self.persist();
    }

    fn persist(&self) {
        let Some(persistence) = &self.persistence else {
            return;
        };
        if let Err(e) = persistence.save(&self.snapshot()) {
            log::warn!("Failed to persist editor snapshot: {}", e);
        }
    }
}
